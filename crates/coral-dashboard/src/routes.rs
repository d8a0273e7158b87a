//! Dashboard routes.

use coral_pages::{Route, RouterOptions};

/// Document title template.
pub const DASHBOARD_TITLE: &str = "{{title}} | Kala Web Interface";

/// Route ids templates switch on.
pub mod ids {
	pub const JOBS: &str = "jobs";
	pub const METRICS: &str = "metrics";
}

/// Routes in matching order. The dashboard is served under `/webui/`, which
/// shows the job list.
pub fn dashboard_routes() -> Vec<Route> {
	vec![
		Route::new(ids::JOBS, "Jobs", "/webui/"),
		Route::new(ids::JOBS, "Jobs", "/jobs/"),
		Route::new(ids::METRICS, "Metrics", "/metrics/"),
	]
}

/// Router options for the dashboard: its routes, its title and hash mode.
pub fn dashboard_router_options() -> RouterOptions {
	RouterOptions::new(dashboard_routes())
		.with_title(DASHBOARD_TITLE)
		.use_hash(true)
}

#[cfg(test)]
mod tests {
	use super::*;
	use coral_pages::router::RouteTable;
	use rstest::rstest;

	#[rstest]
	#[case("/webui/", Some(ids::JOBS))]
	#[case("/jobs/", Some(ids::JOBS))]
	#[case("/metrics", Some(ids::METRICS))]
	#[case("/jobs/42", None)]
	fn test_routes(#[case] href: &str, #[case] expected: Option<&str>) {
		// Arrange
		let table = RouteTable::new(dashboard_routes()).unwrap();

		// Act
		let route = table.resolve(href, None);

		// Assert
		assert_eq!(route.as_ref().map(|r| r.id()), expected);
	}
}
