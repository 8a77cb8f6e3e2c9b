use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;

use crate::error::{Error, Result};

/// A completed HTTP exchange as produced by a [`Transport`](crate::Transport). The body has been
/// read from the wire exactly once and is not yet decoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
	pub status: u16,
	pub url: String,
	pub headers: Vec<(String, String)>,
	pub body: Vec<u8>,
}

impl RawResponse {
	pub fn new(status: u16, url: impl Into<String>) -> Self {
		Self {
			status,
			url: url.into(),
			headers: Vec::new(),
			body: Vec::new(),
		}
	}

	#[must_use]
	pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
		self.headers.push((name.into(), value.into()));
		self
	}

	#[must_use]
	pub fn with_json(self, value: &Value) -> Self {
		let mut res = self.with_header("content-type", "application/json");
		res.body = value.to_string().into_bytes();
		res
	}

	#[must_use]
	pub fn with_body(mut self, body: impl Into<Vec<u8>>) -> Self {
		self.body = body.into();
		self
	}

	fn content_type(&self) -> Option<&str> {
		find_header(&self.headers, "content-type")
	}
}

/// Decoded response body.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
	Json(Value),
	Binary(Vec<u8>),
	Empty,
}

/// The decoded wrapper around one HTTP response. Consuming accessors hand the decoded body onward,
/// so a body cannot be decoded twice.
#[derive(Debug, Clone, PartialEq)]
pub struct ResponseEnvelope {
	status: u16,
	url: String,
	headers: Vec<(String, String)>,
	payload: Payload,
}

impl ResponseEnvelope {
	/// Decoding never fails: a body labelled JSON that does not parse is kept as raw bytes, and
	/// [`json`](Self::json) reports the decode error to callers that ask for it.
	pub(crate) fn decode(raw: RawResponse) -> Self {
		let payload = if raw.body.is_empty() {
			Payload::Empty
		} else {
			match raw.content_type().map(is_json) {
				Some(true) => match serde_json::from_slice(&raw.body) {
					Ok(value) => Payload::Json(value),
					Err(e) => {
						debug!("Body of {} is labelled JSON but does not parse: {e}", raw.url);
						Payload::Binary(raw.body)
					}
				},
				Some(false) => Payload::Binary(raw.body),
				// Untyped bodies are JSON when they parse as JSON
				None => serde_json::from_slice(&raw.body)
					.map_or_else(|_| Payload::Binary(raw.body), Payload::Json),
			}
		};

		Self {
			status: raw.status,
			url: raw.url,
			headers: raw.headers,
			payload,
		}
	}

	#[must_use]
	pub const fn status(&self) -> u16 {
		self.status
	}

	#[must_use]
	pub const fn is_success(&self) -> bool {
		self.status >= 200 && self.status < 300
	}

	#[must_use]
	pub fn url(&self) -> &str {
		&self.url
	}

	#[must_use]
	pub fn headers(&self) -> &[(String, String)] {
		&self.headers
	}

	#[must_use]
	pub fn header(&self, name: &str) -> Option<&str> {
		find_header(&self.headers, name)
	}

	#[must_use]
	pub const fn payload(&self) -> &Payload {
		&self.payload
	}

	#[must_use]
	pub fn into_payload(self) -> Payload {
		self.payload
	}

	/// Deserialize the body. An empty body deserializes from `null`, so `()` and `Option<T>`
	/// targets accept it.
	pub fn json<T: DeserializeOwned>(self) -> Result<T> {
		let Self { url, payload, .. } = self;

		let decoded = match payload {
			Payload::Json(value) => serde_json::from_value(value),
			Payload::Empty => serde_json::from_value(Value::Null),
			Payload::Binary(bytes) => serde_json::from_slice(&bytes),
		};

		decoded.map_err(|source| Error::Decode { url, source })
	}

	#[must_use]
	pub fn bytes(self) -> Vec<u8> {
		match self.payload {
			Payload::Binary(bytes) => bytes,
			Payload::Json(value) => value.to_string().into_bytes(),
			Payload::Empty => Vec::new(),
		}
	}

	/// File name announced by a `Content-Disposition` header.
	#[must_use]
	pub fn file_name(&self) -> Option<String> {
		self.header("content-disposition")?
			.split(';')
			.map(str::trim)
			.find_map(|param| param.strip_prefix("filename="))
			.map(|name| name.trim_matches('"').to_string())
			.filter(|name| !name.is_empty())
	}
}

fn is_json(content_type: &str) -> bool {
	content_type
		.split(';')
		.next()
		.is_some_and(|mime| mime.trim().ends_with("json"))
}

fn find_header<'a>(headers: &'a [(String, String)], name: &str) -> Option<&'a str> {
	headers
		.iter()
		.find(|(key, _)| key.eq_ignore_ascii_case(name))
		.map(|(_, value)| value.as_str())
}
