//! Job poller
//!
//! Turns the data repository's fire-and-poll job API into a single awaitable result: the job's
//! status endpoint is polled at a fixed interval until it leaves the `running` state.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{info, trace, warn};

use crate::{
	client::Client,
	config::{AccessConfig, Service},
	error::{ConfigError, Error, Result},
	request::RequestDescriptor,
};

const JOBS_PATH: &str = "/api/repository/v1/jobs";

/// Status code reported for a failed job that did not carry one.
const DEFAULT_FAILURE_STATUS: u16 = 500;

/// Endpoints of one job, built per poll invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobHandle {
	pub job_id: String,
	pub status_url: String,
	pub result_url: String,
}

impl JobHandle {
	pub fn new(repository_base: &str, job_id: impl Into<String>) -> Self {
		let job_id = job_id.into();
		let status_url = format!(
			"{repository_base}{JOBS_PATH}/{}",
			urlencoding::encode(&job_id)
		);
		let result_url = format!("{status_url}/result");

		Self {
			job_id,
			status_url,
			result_url,
		}
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobStatus {
	Running,
	Succeeded,
	Failed,
}

impl FromStr for JobStatus {
	type Err = String;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s {
			"running" => Ok(Self::Running),
			"succeeded" => Ok(Self::Succeeded),
			"failed" => Ok(Self::Failed),
			other => Err(other.to_string()),
		}
	}
}

impl fmt::Display for JobStatus {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(match self {
			Self::Running => "running",
			Self::Succeeded => "succeeded",
			Self::Failed => "failed",
		})
	}
}

#[derive(Debug, Deserialize)]
struct StatusReport {
	job_status: String,
	#[serde(default)]
	status_code: Option<u16>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
	pub id: String,
	pub name: String,
	#[serde(flatten)]
	pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParquetExport {
	pub manifest: String,
	#[serde(flatten)]
	pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportFormat {
	pub parquet: ParquetExport,
	#[serde(flatten)]
	pub extra: Map<String, Value>,
}

/// Result resource of a succeeded export job, decorated with a link into the workspace import UI.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobResult {
	pub snapshot: Snapshot,
	pub format: ExportFormat,
	#[serde(
		rename = "terraImportLink",
		default,
		skip_serializing_if = "Option::is_none"
	)]
	pub terra_import_link: Option<String>,
	#[serde(flatten)]
	pub extra: Map<String, Value>,
}

impl Client {
	/// Poll a data repository job until it terminates.
	///
	/// Polls are unbounded unless `max_poll_attempts` is configured. Dropping the returned future
	/// abandons the job locally; the remote job keeps running.
	pub async fn wait_for_job(&self, job_id: &str) -> Result<JobResult> {
		let job = JobHandle::new(&self.config().base_url(Service::DataRepository)?, job_id);
		let mut attempts = 0u32;

		loop {
			attempts += 1;

			let report: StatusReport = self
				.fetch_json(RequestDescriptor::get(&job.status_url).build()?)
				.await?;

			match report.job_status.parse::<JobStatus>() {
				Ok(JobStatus::Running) => {
					if let Some(max) = self.config().max_poll_attempts {
						if attempts >= max {
							warn!("Giving up on job <id='{}'> after {attempts} polls", job.job_id);
							return Err(Error::PollAttemptsExhausted {
								job_id: job.job_id,
								attempts,
							});
						}
					}

					trace!("Job <id='{}'> still running (poll #{attempts})", job.job_id);
					tokio::time::sleep(self.config().poll_interval()).await;
				}
				Ok(JobStatus::Succeeded) => {
					info!("Job <id='{}'> succeeded after {attempts} polls", job.job_id);
					return self.fetch_job_result(&job).await;
				}
				Ok(JobStatus::Failed) => {
					let status_code = report.status_code.unwrap_or(DEFAULT_FAILURE_STATUS);
					warn!("Job <id='{}'> failed with status {status_code}", job.job_id);
					self.reporter().report(&job.status_url, status_code);
					return Err(Error::JobFailed {
						status_url: job.status_url,
						status_code,
					});
				}
				Err(status) => {
					return Err(Error::UnrecognizedJobStatus {
						job_id: job.job_id,
						status,
					});
				}
			}
		}
	}

	async fn fetch_job_result(&self, job: &JobHandle) -> Result<JobResult> {
		let mut result: JobResult = self
			.fetch_json(RequestDescriptor::get(&job.result_url).build()?)
			.await?;

		result.terra_import_link = Some(import_link(self.config(), &result)?);

		Ok(result)
	}
}

/// Link into the workspace UI that imports the exported snapshot.
pub fn import_link(config: &AccessConfig, result: &JobResult) -> Result<String, ConfigError> {
	let terra = config.terra_url.trim_end_matches('/');
	if terra.is_empty() {
		return Err(ConfigError::MissingBaseUrl("terra"));
	}

	Ok(format!(
		"{terra}/#import-data?url={}&snapshotId={}&format=tdrexport&snapshotName={}&tdrmanifest={}&tdrSyncPermissions=false",
		config.origin,
		result.snapshot.id,
		result.snapshot.name,
		urlencoding::encode(&result.format.parquet.manifest),
	))
}
