//! Scheduler API client.
//!
//! [`JobsApi`] is the contract the action layer is written against;
//! [`HttpJobsApi`] implements it over HTTP against `<base>/api/v1/`.
//!
//! ```no_run
//! use coral_dashboard::api::{HttpJobsApi, JobsApi};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() {
//!     let api = HttpJobsApi::new("http://127.0.0.1:8000/").unwrap();
//!     let jobs = api.list_jobs().await.unwrap();
//!     println!("{} jobs", jobs.len());
//! }
//! ```

use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use serde::Deserialize;
use thiserror::Error;
use url::Url;

use crate::models::{Job, JobStat, Metrics};

/// API path prefix under the service base URL.
pub const API_PREFIX: &str = "api/v1/";

/// Errors talking to the scheduler.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ApiError {
	/// Transport or decoding failure.
	#[error("request failed: {0}")]
	Http(#[from] reqwest::Error),
	/// The base URL or an endpoint could not be built.
	#[error("invalid URL: {0}")]
	Url(#[from] url::ParseError),
	/// The service answered with a non-success status.
	#[error("scheduler returned {status}: {message}")]
	Status {
		/// HTTP status code.
		status: u16,
		/// Error text from the response body, if any.
		message: String,
	},
}

/// Operations the dashboard performs against the scheduler.
///
/// Futures are not `Send`; the dashboard runs on a single-threaded executor.
#[async_trait(?Send)]
pub trait JobsApi {
	/// Every job keyed by id.
	async fn list_jobs(&self) -> Result<BTreeMap<String, Job>, ApiError>;

	/// One job.
	async fn get_job(&self, id: &str) -> Result<Job, ApiError>;

	/// Creates a job and returns its id.
	async fn create_job(&self, job: &Job) -> Result<String, ApiError>;

	/// Deletes a job.
	async fn delete_job(&self, id: &str) -> Result<(), ApiError>;

	/// Re-enables a disabled job.
	async fn enable_job(&self, id: &str) -> Result<(), ApiError>;

	/// Stops scheduling a job.
	async fn disable_job(&self, id: &str) -> Result<(), ApiError>;

	/// Runs a job now.
	async fn run_job(&self, id: &str) -> Result<(), ApiError>;

	/// Scheduler-wide counters.
	async fn get_metrics(&self) -> Result<Metrics, ApiError>;

	/// Past executions of a job.
	async fn get_job_stats(&self, id: &str) -> Result<Vec<JobStat>, ApiError>;
}

#[derive(Deserialize)]
struct ListJobsResponse {
	jobs: Option<BTreeMap<String, Job>>,
}

#[derive(Deserialize)]
struct JobResponse {
	job: Job,
}

#[derive(Deserialize)]
struct AddJobResponse {
	id: String,
}

#[derive(Deserialize)]
struct StatsResponse {
	#[serde(rename = "Stats")]
	stats: Metrics,
}

#[derive(Deserialize)]
struct JobStatsResponse {
	job_stats: Option<Vec<JobStat>>,
}

#[derive(Deserialize)]
struct ErrorBody {
	error: String,
}

/// [`JobsApi`] over HTTP.
#[derive(Debug, Clone)]
pub struct HttpJobsApi {
	client: Client,
	base: Url,
}

impl HttpJobsApi {
	/// Client for the service at `base`, e.g. `http://127.0.0.1:8000/`.
	pub fn new(base: &str) -> Result<Self, ApiError> {
		let client = Client::builder().timeout(Duration::from_secs(30)).build()?;
		Self::with_client(client, base)
	}

	/// Uses a preconfigured client.
	pub fn with_client(client: Client, base: &str) -> Result<Self, ApiError> {
		let mut base = Url::parse(base)?;
		if !base.path().ends_with('/') {
			let path = format!("{}/", base.path());
			base.set_path(&path);
		}
		Ok(Self {
			client,
			base: base.join(API_PREFIX)?,
		})
	}

	/// Root of the versioned API.
	pub fn base(&self) -> &Url {
		&self.base
	}

	/// Absolute URL of an endpoint relative to the API root.
	pub fn endpoint(&self, path: &str) -> Result<Url, ApiError> {
		Ok(self.base.join(path)?)
	}

	async fn send(&self, request: RequestBuilder) -> Result<Response, ApiError> {
		let response = request.send().await?;
		let status = response.status();
		if status.is_success() {
			return Ok(response);
		}
		let text = response.text().await.unwrap_or_default();
		let message = serde_json::from_str::<ErrorBody>(&text)
			.map(|body| body.error)
			.unwrap_or(text);
		tracing::warn!(status = status.as_u16(), %message, "scheduler request failed");
		Err(ApiError::Status {
			status: status.as_u16(),
			message,
		})
	}

	async fn post_action(&self, action: &str, id: &str) -> Result<(), ApiError> {
		let url = self.endpoint(&format!("job/{action}/{id}/"))?;
		self.send(self.client.post(url)).await?;
		Ok(())
	}
}

#[async_trait(?Send)]
impl JobsApi for HttpJobsApi {
	async fn list_jobs(&self) -> Result<BTreeMap<String, Job>, ApiError> {
		let url = self.endpoint("job/")?;
		let body: ListJobsResponse = self.send(self.client.get(url)).await?.json().await?;
		Ok(body.jobs.unwrap_or_default())
	}

	async fn get_job(&self, id: &str) -> Result<Job, ApiError> {
		let url = self.endpoint(&format!("job/{id}/"))?;
		let body: JobResponse = self.send(self.client.get(url)).await?.json().await?;
		Ok(body.job)
	}

	async fn create_job(&self, job: &Job) -> Result<String, ApiError> {
		let url = self.endpoint("job/")?;
		let body: AddJobResponse = self.send(self.client.post(url).json(job)).await?.json().await?;
		tracing::debug!(id = %body.id, name = %job.name, "job created");
		Ok(body.id)
	}

	async fn delete_job(&self, id: &str) -> Result<(), ApiError> {
		let url = self.endpoint(&format!("job/{id}/"))?;
		self.send(self.client.delete(url)).await?;
		Ok(())
	}

	async fn enable_job(&self, id: &str) -> Result<(), ApiError> {
		self.post_action("enable", id).await
	}

	async fn disable_job(&self, id: &str) -> Result<(), ApiError> {
		self.post_action("disable", id).await
	}

	async fn run_job(&self, id: &str) -> Result<(), ApiError> {
		self.post_action("start", id).await
	}

	async fn get_metrics(&self) -> Result<Metrics, ApiError> {
		let url = self.endpoint("stats/")?;
		let body: StatsResponse = self.send(self.client.get(url)).await?.json().await?;
		Ok(body.stats)
	}

	async fn get_job_stats(&self, id: &str) -> Result<Vec<JobStat>, ApiError> {
		let url = self.endpoint(&format!("job/{id}/executions/"))?;
		let body: JobStatsResponse = self.send(self.client.get(url)).await?.json().await?;
		Ok(body.job_stats.unwrap_or_default())
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	#[rstest]
	#[case("http://127.0.0.1:8000", "http://127.0.0.1:8000/api/v1/")]
	#[case("http://127.0.0.1:8000/", "http://127.0.0.1:8000/api/v1/")]
	#[case("https://example.com/kala", "https://example.com/kala/api/v1/")]
	fn test_base_url(#[case] base: &str, #[case] expected: &str) {
		// Act
		let api = HttpJobsApi::new(base).unwrap();

		// Assert
		assert_eq!(api.base().as_str(), expected);
	}

	#[rstest]
	#[case("job/", "http://localhost/api/v1/job/")]
	#[case("job/enable/42/", "http://localhost/api/v1/job/enable/42/")]
	#[case("stats/", "http://localhost/api/v1/stats/")]
	fn test_endpoints(#[case] path: &str, #[case] expected: &str) {
		// Arrange
		let api = HttpJobsApi::new("http://localhost").unwrap();

		// Act
		let url = api.endpoint(path).unwrap();

		// Assert
		assert_eq!(url.as_str(), expected);
	}

	#[rstest]
	fn test_invalid_base_is_rejected() {
		// Act
		let result = HttpJobsApi::new("not a url");

		// Assert
		assert!(matches!(result, Err(ApiError::Url(_))));
	}
}
