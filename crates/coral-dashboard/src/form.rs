//! The create-job form.
//!
//! Entries arrive as submitted `(name, value)` pairs. Remote-job fields
//! (`url`, `method`, `body`, `timeout`, `headers`,
//! `expected_response_codes`) go into [`RemoteProperties`].
//!
//! [`RemoteProperties`]: crate::models::RemoteProperties

use std::collections::BTreeMap;

use thiserror::Error;

use crate::models::{Job, JobType};

/// A rejected form field.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{field}: {message}")]
pub struct FormError {
	/// Form field name.
	pub field: String,
	/// What is wrong with it.
	pub message: String,
}

impl FormError {
	fn new(field: &str, message: impl Into<String>) -> Self {
		Self {
			field: field.to_string(),
			message: message.into(),
		}
	}
}

/// A parsed create-job submission.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct JobForm {
	/// The job to create.
	pub job: Job,
	/// The form asked to be cleared after a successful submission.
	pub reset: bool,
}

fn parse_int<T: std::str::FromStr + Default>(field: &str, value: &str) -> Result<T, FormError> {
	if value.trim().is_empty() {
		return Ok(T::default());
	}
	value
		.trim()
		.parse()
		.map_err(|_| FormError::new(field, format!("expected a whole number, got {value:?}")))
}

impl JobForm {
	/// Parses and validates form entries.
	pub fn from_entries<K, V>(entries: &[(K, V)]) -> Result<Self, FormError>
	where
		K: AsRef<str>,
		V: AsRef<str>,
	{
		let mut form = Self::default();
		for (name, value) in entries {
			form.apply(name.as_ref(), value.as_ref())?;
		}
		form.validate()?;
		Ok(form)
	}

	fn apply(&mut self, name: &str, value: &str) -> Result<(), FormError> {
		let job = &mut self.job;
		let remote = &mut job.remote_properties;
		match name {
			"jobname" => job.name = value.trim().to_string(),
			"type" => {
				let raw: u8 = parse_int(name, value)?;
				job.job_type =
					JobType::try_from(raw).map_err(|message| FormError::new(name, message))?;
			}
			"retries" => job.retries = parse_int(name, value)?,
			"timeout" => remote.timeout = parse_int(name, value)?,
			"resume_at_next_scheduled_time" => job.resume_at_next_scheduled_time = value == "on",
			"doReset" => self.reset = !value.is_empty(),
			"headers" if !value.trim().is_empty() => {
				let headers: BTreeMap<String, Vec<String>> = serde_json::from_str(value)
					.map_err(|e| FormError::new(name, format!("expected a JSON object of string lists: {e}")))?;
				remote.headers = Some(headers);
			}
			"expected_response_codes" if !value.trim().is_empty() => {
				let codes = value
					.split(',')
					.map(str::trim)
					.filter(|code| !code.is_empty())
					.map(|code| parse_int::<u16>(name, code))
					.collect::<Result<Vec<_>, _>>()?;
				remote.expected_response_codes = Some(codes);
			}
			_ if value.is_empty() => {}
			"url" => remote.url = value.to_string(),
			"method" => remote.method = value.to_string(),
			"body" => remote.body = value.to_string(),
			"command" => job.command = value.to_string(),
			"owner" => job.owner = value.to_string(),
			"schedule" => job.schedule = value.to_string(),
			"epsilon" => job.epsilon = value.to_string(),
			"on_failure_job" => job.on_failure_job = value.to_string(),
			other => tracing::trace!(field = other, "ignoring form field"),
		}
		Ok(())
	}

	fn validate(&self) -> Result<(), FormError> {
		if self.job.name.is_empty() {
			return Err(FormError::new("name", "This field is required."));
		}
		if self.job.job_type == JobType::Local && self.job.command.trim().is_empty() {
			return Err(FormError::new("command", "a local job needs a command"));
		}
		Ok(())
	}
}
