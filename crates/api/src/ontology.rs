//! Ontology service.

use duos_access::{Client, RequestDescriptor, Result, Service};
use serde_json::Value;

pub use translate::exec as translate;
pub mod translate {
	use super::*;

	/// Render a structured data use into a readable paragraph.
	pub async fn exec(client: &Client, body: &Value) -> Result<Value> {
		client
			.fetch_json(
				RequestDescriptor::post(client.url(Service::Ontology, "/translate/paragraph")?)
					.json(body)
					.build()?,
			)
			.await
	}
}
