//! Datasets.

use duos_access::{Client, Part, Payload, RequestDescriptor, Result};
use serde_json::Value;
use tracing::debug;

use crate::{api_url, status_of};

pub use get_datasets::exec as get_datasets;
pub mod get_datasets {
	use super::*;

	pub async fn exec(client: &Client) -> Result<Vec<Value>> {
		client
			.fetch_json(RequestDescriptor::get(api_url(client, "/api/dataset/v2")?).build()?)
			.await
	}
}

pub use get_by_ids::exec as get_by_ids;
pub mod get_by_ids {
	use super::*;

	pub async fn exec(client: &Client, ids: &[u64]) -> Result<Vec<Value>> {
		let request = ids.iter().fold(
			RequestDescriptor::get(api_url(client, "/api/dataset/batch")?),
			|request, id| request.query("ids", id),
		);

		client.fetch_json(request.build()?).await
	}
}

pub use autocomplete::exec as autocomplete;
pub mod autocomplete {
	use super::*;

	pub async fn exec(client: &Client, query: &str) -> Result<Vec<Value>> {
		client
			.fetch_json(
				RequestDescriptor::get(api_url(client, "/api/dataset/autocomplete")?)
					.query("query", query)
					.build()?,
			)
			.await
	}
}

pub use search_index::exec as search_index;
pub mod search_index {
	use super::*;

	/// Run a raw search index query.
	pub async fn exec(client: &Client, query: &Value) -> Result<Value> {
		client
			.fetch_json(
				RequestDescriptor::post(api_url(client, "/api/dataset/search/index")?)
					.json(query)
					.build()?,
			)
			.await
	}
}

pub use validate_name::exec as validate_name;
pub mod validate_name {
	use super::*;

	const NOT_FOUND: u16 = 404;

	/// Id of the dataset already registered under `name`, if any.
	///
	/// A missing dataset is the expected outcome, so neither a 404 nor a failed request is an
	/// error here.
	pub async fn exec(client: &Client, name: &str) -> Result<Option<u64>> {
		let request = RequestDescriptor::get(api_url(client, "/api/dataset/validate")?)
			.query("name", name)
			.build()?;

		match client.request_lenient(request).await {
			Ok(res) if res.status() == NOT_FOUND => Ok(None),
			Ok(res) => Ok(res.json().ok()),
			Err(e) => {
				debug!("Dataset name validation failed, treating '{name}' as unused: {e}");
				Ok(None)
			}
		}
	}
}

pub use delete::exec as delete;
pub mod delete {
	use super::*;

	pub async fn exec(client: &Client, dataset_id: u64) -> Result<u16> {
		status_of(
			client,
			RequestDescriptor::delete(api_url(client, &format!("/api/dataset/{dataset_id}"))?)
				.build()?,
		)
		.await
	}
}

pub use register::exec as register;
pub mod register {
	use super::*;

	/// A file attached to a registration, sent as its own multipart field.
	#[derive(Debug, Clone, PartialEq, Eq)]
	pub struct Attachment {
		pub field: String,
		pub file_name: String,
		pub content_type: Option<String>,
		pub data: Vec<u8>,
	}

	/// Register a dataset from its registration form and attached files.
	pub async fn exec(
		client: &Client,
		registration: &Value,
		attachments: Vec<Attachment>,
	) -> Result<Value> {
		let mut parts = vec![Part::text("dataset", registration.to_string())
			.content_type("application/json")];

		parts.extend(attachments.into_iter().map(|attachment| {
			let part = Part::bytes(attachment.field, attachment.data).file_name(attachment.file_name);
			match attachment.content_type {
				Some(content_type) => part.content_type(content_type),
				None => part,
			}
		}));

		client
			.fetch_json(
				RequestDescriptor::post(api_url(client, "/api/dataset/v3")?)
					.multipart(parts)
					.build()?,
			)
			.await
	}
}

pub use download::exec as download;
pub mod download {
	use super::*;

	const FALLBACK_FILE_NAME: &str = "datasets.txt";

	#[derive(Debug, Clone, PartialEq, Eq)]
	pub struct Download {
		pub file_name: String,
		pub content: Vec<u8>,
	}

	/// Export the given datasets. Without an explicit `file_name` the name announced by the
	/// server is used.
	pub async fn exec(
		client: &Client,
		dataset_ids: &[u64],
		file_name: Option<String>,
	) -> Result<Download> {
		let res = client
			.request_strict(
				RequestDescriptor::post(api_url(client, "/api/dataset/download")?)
					.json(dataset_ids)
					.streaming()
					.build()?,
			)
			.await?;

		let file_name = file_name
			.or_else(|| res.file_name())
			.unwrap_or_else(|| FALLBACK_FILE_NAME.to_string());

		// Exports come back either raw or wrapped as `{"datasets": "<contents>"}`
		let content = match res.into_payload() {
			Payload::Json(Value::Object(mut body)) => match body.remove("datasets") {
				Some(Value::String(contents)) => contents.into_bytes(),
				Some(other) => other.to_string().into_bytes(),
				None => Value::Object(body).to_string().into_bytes(),
			},
			Payload::Json(other) => other.to_string().into_bytes(),
			Payload::Binary(bytes) => bytes,
			Payload::Empty => Vec::new(),
		};

		Ok(Download { file_name, content })
	}
}
