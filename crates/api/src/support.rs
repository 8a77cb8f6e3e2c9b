//! Support tickets, filed with the ticketing service.
//!
//! Requests to the ticketing service never carry the session credential.

use duos_access::{Client, RequestDescriptor, ResponseEnvelope, Result, Service};
use serde::{Deserialize, Serialize};
use serde_json::Value;

// Field ids of the support ticket form. Changing any of these silently drops the value.
const TICKET_FORM_ID: u64 = 360_000_669_472;
const TYPE_FIELD: u64 = 360_012_744_452;
const DESCRIPTION_FIELD: u64 = 360_007_369_412;
const NAME_FIELD: u64 = 360_012_744_292;
const EMAIL_FIELD: u64 = 360_012_782_111;
const CONTACT_EMAIL_FIELD: u64 = 360_018_545_031;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Ticket {
	pub request: TicketRequest,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct TicketRequest {
	pub requester: Requester,
	pub subject: String,
	pub custom_fields: Vec<CustomField>,
	pub comment: Comment,
	pub ticket_form_id: u64,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Requester {
	pub name: String,
	pub email: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct CustomField {
	pub id: u64,
	pub value: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Comment {
	pub body: String,
	pub uploads: Vec<String>,
}

/// What the user filled in on the support form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TicketForm {
	pub name: String,
	pub kind: String,
	pub email: String,
	pub subject: String,
	pub description: String,
	/// Tokens of previously uploaded attachments
	pub attachments: Vec<String>,
	/// Page the ticket was submitted from
	pub url: String,
}

pub use create_ticket::exec as create_ticket;
pub mod create_ticket {
	use super::*;

	#[must_use]
	pub fn exec(form: TicketForm) -> Ticket {
		let TicketForm {
			name,
			kind,
			email,
			subject,
			description,
			attachments,
			url,
		} = form;

		Ticket {
			request: TicketRequest {
				custom_fields: vec![
					CustomField {
						id: TYPE_FIELD,
						value: kind,
					},
					CustomField {
						id: DESCRIPTION_FIELD,
						value: description.clone(),
					},
					CustomField {
						id: NAME_FIELD,
						value: name.clone(),
					},
					CustomField {
						id: EMAIL_FIELD,
						value: email.clone(),
					},
					CustomField {
						id: CONTACT_EMAIL_FIELD,
						value: email.clone(),
					},
				],
				requester: Requester { name, email },
				subject,
				comment: Comment {
					body: format!("{description}\n\n------------------\nSubmitted from: {url}"),
					uploads: attachments,
				},
				ticket_form_id: TICKET_FORM_ID,
			},
		}
	}
}

pub use create_support_request::exec as create_support_request;
pub mod create_support_request {
	use super::*;

	/// File a ticket. The response is handed back whatever its status.
	pub async fn exec(client: &Client, ticket: &Ticket) -> Result<ResponseEnvelope> {
		client
			.request_lenient(
				RequestDescriptor::post(client.url(Service::Ticketing, "/api/v2/requests.json")?)
					.json(ticket)
					.without_auth()
					.build()?,
			)
			.await
	}
}

pub use upload_attachment::exec as upload_attachment;
pub mod upload_attachment {
	use super::*;

	#[derive(Deserialize)]
	struct Response {
		#[serde(default)]
		upload: Value,
	}

	/// Upload a file, returning the `upload` object whose `token` goes into
	/// [`TicketForm::attachments`].
	pub async fn exec(client: &Client, data: Vec<u8>) -> Result<Value> {
		let res = client
			.request_lenient(
				RequestDescriptor::post(client.url(Service::Ticketing, "/api/v2/uploads")?)
					.query("filename", "Attachment")
					.bytes(data, Some("application/binary".to_string()))
					.without_auth()
					.build()?,
			)
			.await?;

		Ok(res.json::<Response>()?.upload)
	}
}
