//! The dashboard store.
//!
//! State shape:
//!
//! ```json
//! {"jobs": {"<id>": Job}, "jobDetail": Job | null, "metrics": Metrics | {},
//!  "loading": false, "createErr": {"field": "...", "message": "..."} | null}
//! ```

use coral_pages::{Runtime, Store};
use serde_json::{Map, Value, json};

/// Setter names.
pub mod setters {
	pub const START_LOADING: &str = "startLoading";
	pub const STOP_LOADING: &str = "stopLoading";
	/// `(jobs)`: replaces every job and stops loading.
	pub const SET_JOBS: &str = "setJobs";
	/// `(job)`: inserts or replaces one job.
	pub const SET_JOB: &str = "setJob";
	/// `(id)`
	pub const SHOW_JOB_DETAIL: &str = "showJobDetail";
	pub const CLEAR_JOB_DETAIL: &str = "clearJobDetail";
	/// `(id, disabled)`
	pub const SET_JOB_DISABLED: &str = "setJobDisabled";
	/// `(id)`
	pub const DELETE_JOB: &str = "deleteJob";
	/// `(metrics)`: also stops loading.
	pub const SET_METRICS: &str = "setMetrics";
	/// `(field, message)`, or no arguments to clear.
	pub const SET_CREATE_ERR: &str = "setCreateErr";
}

/// Getter names.
pub mod getters {
	/// Number of known jobs.
	pub const JOB_COUNT: &str = "jobCount";
}

/// The store's initial state.
pub fn initial_state() -> Value {
	json!({
		"jobs": {},
		"jobDetail": null,
		"metrics": {},
		"loading": false,
		"createErr": null,
	})
}

fn arg_str(args: &[Value], index: usize) -> Option<&str> {
	args.get(index).and_then(Value::as_str)
}

fn jobs_mut(state: &mut Value) -> Option<&mut Map<String, Value>> {
	if !state["jobs"].is_object() {
		state["jobs"] = json!({});
	}
	state["jobs"].as_object_mut()
}

fn detail_is(state: &Value, id: &str) -> bool {
	state["jobDetail"]["id"].as_str() == Some(id)
}

/// Builds the dashboard store.
pub fn dashboard_store(runtime: &Runtime) -> Store {
	Store::builder(initial_state())
		.setter(setters::START_LOADING, |state, _| state["loading"] = json!(true))
		.setter(setters::STOP_LOADING, |state, _| state["loading"] = json!(false))
		.setter(setters::SET_JOBS, |state, args| {
			state["jobs"] = args
				.first()
				.filter(|jobs| jobs.is_object())
				.cloned()
				.unwrap_or_else(|| json!({}));
			state["loading"] = json!(false);
		})
		.setter(setters::SET_JOB, |state, args| {
			let Some(job) = args.first() else {
				return;
			};
			let Some(id) = job["id"].as_str().map(str::to_string) else {
				return;
			};
			if detail_is(state, &id) {
				state["jobDetail"] = job.clone();
			}
			if let Some(jobs) = jobs_mut(state) {
				jobs.insert(id, job.clone());
			}
		})
		.setter(setters::SHOW_JOB_DETAIL, |state, args| {
			let detail = arg_str(args, 0)
				.and_then(|id| state["jobs"].get(id))
				.cloned()
				.unwrap_or(Value::Null);
			state["jobDetail"] = detail;
		})
		.setter(setters::CLEAR_JOB_DETAIL, |state, _| state["jobDetail"] = Value::Null)
		.setter(setters::SET_JOB_DISABLED, |state, args| {
			let Some(id) = arg_str(args, 0).map(str::to_string) else {
				return;
			};
			let disabled = args.get(1).and_then(Value::as_bool).unwrap_or(false);
			if let Some(job) = state["jobs"].get_mut(&id).and_then(Value::as_object_mut) {
				job.insert("disabled".to_string(), json!(disabled));
			}
			if detail_is(state, &id) {
				state["jobDetail"]["disabled"] = json!(disabled);
			}
		})
		.setter(setters::DELETE_JOB, |state, args| {
			let Some(id) = arg_str(args, 0).map(str::to_string) else {
				return;
			};
			if let Some(jobs) = state["jobs"].as_object_mut() {
				jobs.remove(&id);
			}
			if detail_is(state, &id) {
				state["jobDetail"] = Value::Null;
			}
		})
		.setter(setters::SET_METRICS, |state, args| {
			state["metrics"] = args.first().cloned().unwrap_or_else(|| json!({}));
			state["loading"] = json!(false);
		})
		.setter(setters::SET_CREATE_ERR, |state, args| {
			state["createErr"] = match arg_str(args, 0) {
				Some(field) => json!({
					"field": field,
					"message": arg_str(args, 1).unwrap_or_default(),
				}),
				None => Value::Null,
			};
		})
		.getter(getters::JOB_COUNT, |state, _| {
			json!(state["jobs"].as_object().map_or(0, Map::len))
		})
		.build(runtime)
}
