//! User actions.
//!
//! Each action raises the loading flag, calls the scheduler, and writes the
//! outcome into the store through its setters. When the call fails the flag
//! is lowered and the error is returned; the store keeps its previous data.

use std::future::Future;

use coral_pages::{PagesError, Store};
use serde::Serialize;
use serde_json::{Value, json};
use thiserror::Error;

use crate::api::{ApiError, JobsApi};
use crate::form::{FormError, JobForm};
use crate::models::Job;
use crate::store::setters;

/// Errors from the action layer.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ActionError {
	/// The scheduler call failed.
	#[error(transparent)]
	Api(#[from] ApiError),
	/// The submitted form was rejected.
	#[error("invalid form: {0}")]
	Form(#[from] FormError),
	/// A store operation failed.
	#[error(transparent)]
	Store(#[from] PagesError),
	/// The job is not in the store.
	#[error("unknown job: {0}")]
	UnknownJob(String),
	/// A model could not be converted for the store.
	#[error("could not encode {0}")]
	Encode(String),
}

/// Result of a successful create-job submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submission {
	/// Id assigned by the scheduler.
	pub id: String,
	/// The form asked to be cleared.
	pub reset: bool,
}

/// Binds a [`JobsApi`] to the dashboard store.
#[derive(Debug)]
pub struct Actions<A> {
	api: A,
	store: Store,
}

fn to_value<T: Serialize>(what: &str, value: &T) -> Result<Value, ActionError> {
	serde_json::to_value(value).map_err(|e| ActionError::Encode(format!("{what}: {e}")))
}

impl<A: JobsApi> Actions<A> {
	/// Creates the action layer.
	pub fn new(api: A, store: Store) -> Self {
		Self { api, store }
	}

	/// The API client.
	pub fn api(&self) -> &A {
		&self.api
	}

	/// The store actions write to.
	pub fn store(&self) -> &Store {
		&self.store
	}

	fn dispatch(&self, setter: &str, args: &[Value]) -> Result<(), ActionError> {
		Ok(self.store.dispatch(setter, args)?)
	}

	/// Runs `call` with the loading flag raised; lowers it again on failure.
	async fn loading<T, F>(&self, call: F) -> Result<T, ActionError>
	where
		F: Future<Output = Result<T, ApiError>>,
	{
		self.dispatch(setters::START_LOADING, &[])?;
		match call.await {
			Ok(value) => Ok(value),
			Err(err) => {
				tracing::warn!(error = %err, "scheduler call failed");
				self.dispatch(setters::STOP_LOADING, &[])?;
				Err(err.into())
			}
		}
	}

	async fn store_job(&self, id: &str) -> Result<(), ActionError> {
		let job = self.loading(self.api.get_job(id)).await?;
		self.dispatch(setters::SET_JOB, &[to_value("job", &job)?])?;
		self.dispatch(setters::STOP_LOADING, &[])
	}

	/// Loads every job.
	pub async fn get_jobs(&self) -> Result<(), ActionError> {
		let jobs = self.loading(self.api.list_jobs()).await?;
		tracing::debug!(count = jobs.len(), "jobs loaded");
		self.dispatch(setters::SET_JOBS, &[to_value("jobs", &jobs)?])
	}

	/// Loads scheduler metrics.
	pub async fn get_metrics(&self) -> Result<(), ActionError> {
		let metrics = self.loading(self.api.get_metrics()).await?;
		self.dispatch(setters::SET_METRICS, &[to_value("metrics", &metrics)?])
	}

	/// Enables a job.
	pub async fn enable_job(&self, id: &str) -> Result<(), ActionError> {
		self.loading(self.api.enable_job(id)).await?;
		self.dispatch(setters::SET_JOB_DISABLED, &[json!(id), json!(false)])?;
		self.dispatch(setters::STOP_LOADING, &[])
	}

	/// Disables a job.
	pub async fn disable_job(&self, id: &str) -> Result<(), ActionError> {
		self.loading(self.api.disable_job(id)).await?;
		self.dispatch(setters::SET_JOB_DISABLED, &[json!(id), json!(true)])?;
		self.dispatch(setters::STOP_LOADING, &[])
	}

	/// Enables a disabled job or disables an enabled one, based on the store.
	pub async fn toggle_job_disabled(&self, id: &str) -> Result<(), ActionError> {
		let disabled = self.store.snapshot(true)["jobs"]
			.get(id)
			.map(|job| job["disabled"].as_bool().unwrap_or(false))
			.ok_or_else(|| ActionError::UnknownJob(id.to_string()))?;
		if disabled {
			self.enable_job(id).await
		} else {
			self.disable_job(id).await
		}
	}

	/// Runs a job now and refreshes it.
	pub async fn run_job(&self, id: &str) -> Result<(), ActionError> {
		self.loading(self.api.run_job(id)).await?;
		self.store_job(id).await
	}

	/// Deletes a job.
	pub async fn delete_job(&self, id: &str) -> Result<(), ActionError> {
		self.loading(self.api.delete_job(id)).await?;
		self.dispatch(setters::DELETE_JOB, &[json!(id)])?;
		self.dispatch(setters::STOP_LOADING, &[])
	}

	/// Creates a job, stores it and returns its id.
	pub async fn create_job(&self, job: &Job) -> Result<String, ActionError> {
		let id = self.loading(self.api.create_job(job)).await?;
		self.store_job(&id).await?;
		Ok(id)
	}

	/// Parses create-job form entries and creates the job.
	///
	/// A rejected field is recorded with `setCreateErr` before the error is returned.
	pub async fn submit_create_job<K, V>(&self, entries: &[(K, V)]) -> Result<Submission, ActionError>
	where
		K: AsRef<str>,
		V: AsRef<str>,
	{
		let form = match JobForm::from_entries(entries) {
			Ok(form) => form,
			Err(err) => {
				self.dispatch(
					setters::SET_CREATE_ERR,
					&[json!(err.field), json!(err.message)],
				)?;
				return Err(err.into());
			}
		};
		self.dispatch(setters::SET_CREATE_ERR, &[])?;
		let id = self.create_job(&form.job).await?;
		Ok(Submission {
			id,
			reset: form.reset,
		})
	}

	/// Reloads the data a route shows. Routes without data are a no-op.
	pub async fn refresh(&self, route_id: &str) -> Result<(), ActionError> {
		match route_id {
			"jobs" => self.get_jobs().await,
			"metrics" => self.get_metrics().await,
			other => {
				tracing::debug!(route = other, "nothing to refresh");
				Ok(())
			}
		}
	}
}
