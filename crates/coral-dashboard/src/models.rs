//! Wire types of the scheduler API.
//!
//! Field names follow the service's JSON: jobs use snake_case, metrics and
//! execution records use PascalCase. Unset timestamps arrive as the zero
//! time (`0001-01-01T00:00:00Z`); [`known`] filters them out.

use std::collections::BTreeMap;

use chrono::{DateTime, Datelike, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Returns the timestamp unless it is the zero time.
pub fn known(at: Option<DateTime<Utc>>) -> Option<DateTime<Utc>> {
	at.filter(|at| at.year() > 1)
}

/// Where a job runs. Sent as an integer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum JobType {
	/// A shell command on the scheduler host.
	#[default]
	Local,
	/// An HTTP request to a remote endpoint.
	Remote,
}

impl From<JobType> for u8 {
	fn from(job_type: JobType) -> Self {
		match job_type {
			JobType::Local => 0,
			JobType::Remote => 1,
		}
	}
}

impl TryFrom<u8> for JobType {
	type Error = String;

	fn try_from(value: u8) -> Result<Self, Self::Error> {
		match value {
			0 => Ok(Self::Local),
			1 => Ok(Self::Remote),
			other => Err(format!("unknown job type {other}")),
		}
	}
}

/// Run bookkeeping kept by the scheduler.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct JobMetadata {
	pub success_count: u64,
	pub last_success: Option<DateTime<Utc>>,
	pub error_count: u64,
	pub last_error: Option<DateTime<Utc>>,
	pub last_attempted_run: Option<DateTime<Utc>>,
	pub number_of_finished_runs: u64,
}

/// Request settings of a remote job.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RemoteProperties {
	pub url: String,
	pub method: String,
	pub body: String,
	pub headers: Option<BTreeMap<String, Vec<String>>>,
	/// Seconds; 0 means no timeout.
	pub timeout: i64,
	pub expected_response_codes: Option<Vec<u16>>,
}

/// A scheduled job.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Job {
	pub name: String,
	pub id: String,
	pub command: String,
	pub owner: String,
	pub disabled: bool,
	pub dependent_jobs: Option<Vec<String>>,
	pub parent_jobs: Option<Vec<String>>,
	pub on_failure_job: String,
	/// ISO 8601 repeating interval, e.g. `R2/2017-06-04T19:25:16.828696-07:00/PT10S`.
	pub schedule: String,
	pub retries: u32,
	pub epsilon: String,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub next_run_at: Option<DateTime<Utc>>,
	pub resume_at_next_scheduled_time: bool,
	pub metadata: JobMetadata,
	#[serde(rename = "type")]
	pub job_type: JobType,
	pub remote_properties: RemoteProperties,
	pub is_done: bool,
}

impl Job {
	/// True for HTTP jobs.
	pub fn is_remote(&self) -> bool {
		self.job_type == JobType::Remote
	}

	/// Next scheduled run, if one is known.
	pub fn next_run(&self) -> Option<DateTime<Utc>> {
		known(self.next_run_at)
	}
}

/// Scheduler-wide counters.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct Metrics {
	pub active_jobs: i64,
	pub disabled_jobs: i64,
	pub jobs: i64,
	pub error_count: u64,
	pub success_count: u64,
	pub next_run_at: Option<DateTime<Utc>>,
	pub last_attempted_run: Option<DateTime<Utc>>,
	pub created_at: Option<DateTime<Utc>>,
}

/// One execution of a job.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct JobStat {
	pub job_id: String,
	pub ran_at: Option<DateTime<Utc>>,
	pub number_of_retries: u32,
	pub success: bool,
	/// Nanoseconds.
	pub execution_duration: i64,
}

impl JobStat {
	/// How long the run took.
	pub fn duration(&self) -> Duration {
		Duration::nanoseconds(self.execution_duration)
	}
}
