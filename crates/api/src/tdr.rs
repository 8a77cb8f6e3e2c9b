//! Data repository snapshots and exports.

use duos_access::{Client, JobResult, RequestDescriptor, Result, Service};
use serde_json::Value;

fn repository_url(client: &Client, path: &str) -> Result<String> {
	client.url(Service::DataRepository, &format!("/api/repository/v1{path}"))
}

pub use list_snapshots_by_dataset_ids::exec as list_snapshots_by_dataset_ids;
pub mod list_snapshots_by_dataset_ids {
	use super::*;

	/// Snapshots linked to the given DUOS dataset identifiers (not dataset ids).
	pub async fn exec(client: &Client, identifiers: &[&str]) -> Result<Value> {
		let request = identifiers.iter().fold(
			RequestDescriptor::get(repository_url(client, "/snapshots")?),
			|request, identifier| request.query("duosDatasetIds", identifier),
		);

		client.fetch_json(request.build()?).await
	}
}

pub use prepare_export::exec as prepare_export;
pub mod prepare_export {
	use super::*;

	/// Start an export job for a snapshot, poll it with `wait_for_job`.
	pub async fn exec(client: &Client, snapshot_id: &str) -> Result<Value> {
		client
			.fetch_json(
				RequestDescriptor::get(repository_url(
					client,
					&format!("/snapshots/{snapshot_id}/export"),
				)?)
				.build()?,
			)
			.await
	}
}

pub use wait_for_job::exec as wait_for_job;
pub mod wait_for_job {
	use super::*;

	pub async fn exec(client: &Client, job_id: &str) -> Result<JobResult> {
		client.wait_for_job(job_id).await
	}
}
