//! Data Access Committees.

use duos_access::{Client, RequestDescriptor, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{api_url, status_of};

/// Body sent when creating or updating a committee.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DacRequest {
	#[serde(skip_serializing_if = "Option::is_none")]
	pub dac_id: Option<u64>,
	pub name: String,
	pub description: String,
	pub email: String,
}

pub use list::exec as list;
pub mod list {
	use super::*;

	pub async fn exec(client: &Client, with_users: Option<bool>) -> Result<Response> {
		let mut request = RequestDescriptor::get(api_url(client, "/api/dac")?);
		if let Some(with_users) = with_users {
			request = request.query("withUsers", with_users);
		}

		client.fetch_json(request.build()?).await
	}

	pub type Response = Vec<Value>;
}

pub use create::exec as create;
pub mod create {
	use super::*;

	pub async fn exec(client: &Client, name: &str, description: &str, email: &str) -> Result<Value> {
		let dac = DacRequest {
			dac_id: None,
			name: name.to_string(),
			description: description.to_string(),
			email: email.to_string(),
		};

		client
			.fetch_json(
				RequestDescriptor::post(api_url(client, "/api/dac")?)
					.json(&dac)
					.build()?,
			)
			.await
	}
}

pub use update::exec as update;
pub mod update {
	use super::*;

	pub async fn exec(
		client: &Client,
		dac_id: u64,
		name: &str,
		description: &str,
		email: &str,
	) -> Result<Value> {
		let dac = DacRequest {
			dac_id: Some(dac_id),
			name: name.to_string(),
			description: description.to_string(),
			email: email.to_string(),
		};

		client
			.fetch_json(
				RequestDescriptor::put(api_url(client, "/api/dac")?)
					.json(&dac)
					.build()?,
			)
			.await
	}
}

pub use delete::exec as delete;
pub mod delete {
	use super::*;

	/// The response has no body, only the status is returned.
	pub async fn exec(client: &Client, dac_id: u64) -> Result<u16> {
		status_of(
			client,
			RequestDescriptor::delete(api_url(client, &format!("/api/dac/{dac_id}"))?).build()?,
		)
		.await
	}
}

pub use get::exec as get;
pub mod get {
	use super::*;

	pub async fn exec(client: &Client, dac_id: u64) -> Result<Value> {
		client
			.fetch_json(RequestDescriptor::get(api_url(client, &format!("/api/dac/{dac_id}"))?).build()?)
			.await
	}
}

pub use datasets::exec as datasets;
pub mod datasets {
	use super::*;

	pub async fn exec(client: &Client, dac_id: u64) -> Result<Vec<Value>> {
		client
			.fetch_json(
				RequestDescriptor::get(api_url(client, &format!("/api/dac/{dac_id}/datasets"))?)
					.build()?,
			)
			.await
	}
}

pub use autocomplete_users::exec as autocomplete_users;
pub mod autocomplete_users {
	use super::*;

	pub async fn exec(client: &Client, term: &str) -> Result<Vec<Value>> {
		let term = urlencoding::encode(term);
		client
			.fetch_json(
				RequestDescriptor::get(api_url(client, &format!("/api/dac/users/{term}"))?)
					.build()?,
			)
			.await
	}
}

fn membership_url(client: &Client, dac_id: u64, role: &str, user_id: u64) -> Result<String> {
	api_url(client, &format!("/api/dac/{dac_id}/{role}/{user_id}"))
}

pub use add_member::exec as add_member;
pub mod add_member {
	use super::*;

	pub async fn exec(client: &Client, dac_id: u64, user_id: u64) -> Result<u16> {
		status_of(
			client,
			RequestDescriptor::post(membership_url(client, dac_id, "member", user_id)?).build()?,
		)
		.await
	}
}

pub use remove_member::exec as remove_member;
pub mod remove_member {
	use super::*;

	pub async fn exec(client: &Client, dac_id: u64, user_id: u64) -> Result<u16> {
		status_of(
			client,
			RequestDescriptor::delete(membership_url(client, dac_id, "member", user_id)?).build()?,
		)
		.await
	}
}

pub use add_chair::exec as add_chair;
pub mod add_chair {
	use super::*;

	pub async fn exec(client: &Client, dac_id: u64, user_id: u64) -> Result<u16> {
		status_of(
			client,
			RequestDescriptor::post(membership_url(client, dac_id, "chair", user_id)?).build()?,
		)
		.await
	}
}

pub use remove_chair::exec as remove_chair;
pub mod remove_chair {
	use super::*;

	pub async fn exec(client: &Client, dac_id: u64, user_id: u64) -> Result<u16> {
		status_of(
			client,
			RequestDescriptor::delete(membership_url(client, dac_id, "chair", user_id)?).build()?,
		)
		.await
	}
}
