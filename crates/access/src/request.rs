use std::fmt;

use serde::Serialize;
use url::Url;

use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
	Get,
	Post,
	Put,
	Delete,
}

impl Method {
	#[must_use]
	pub const fn as_str(self) -> &'static str {
		match self {
			Self::Get => "GET",
			Self::Post => "POST",
			Self::Put => "PUT",
			Self::Delete => "DELETE",
		}
	}
}

impl fmt::Display for Method {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

impl From<Method> for reqwest::Method {
	fn from(method: Method) -> Self {
		match method {
			Method::Get => Self::GET,
			Method::Post => Self::POST,
			Method::Put => Self::PUT,
			Method::Delete => Self::DELETE,
		}
	}
}

/// Which of the client's transports carries the request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Channel {
	Primary,
	/// Uploads and downloads of binary payloads
	Binary,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Body {
	Empty,
	Json(serde_json::Value),
	Form(Vec<(String, String)>),
	Multipart(Vec<Part>),
	Bytes {
		data: Vec<u8>,
		content_type: Option<String>,
	},
}

/// One field of a multipart body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Part {
	pub name: String,
	pub file_name: Option<String>,
	pub content_type: Option<String>,
	pub data: Vec<u8>,
}

impl Part {
	pub fn text(name: impl Into<String>, value: impl Into<String>) -> Self {
		Self {
			name: name.into(),
			file_name: None,
			content_type: None,
			data: value.into().into_bytes(),
		}
	}

	pub fn bytes(name: impl Into<String>, data: impl Into<Vec<u8>>) -> Self {
		Self {
			name: name.into(),
			file_name: None,
			content_type: None,
			data: data.into(),
		}
	}

	#[must_use]
	pub fn file_name(mut self, file_name: impl Into<String>) -> Self {
		self.file_name = Some(file_name.into());
		self
	}

	#[must_use]
	pub fn content_type(mut self, content_type: impl Into<String>) -> Self {
		self.content_type = Some(content_type.into());
		self
	}
}

/// A fully described outbound request. Built fresh for every call and never mutated afterwards;
/// the session credential is attached by the client at dispatch time, not here.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestDescriptor {
	method: Method,
	url: String,
	headers: Vec<(String, String)>,
	body: Body,
	authenticated: bool,
	channel: Channel,
}

impl RequestDescriptor {
	pub fn builder(method: Method, url: impl Into<String>) -> DescriptorBuilder {
		DescriptorBuilder {
			method,
			url: url.into(),
			query: Vec::new(),
			headers: Vec::new(),
			body: Body::Empty,
			authenticated: true,
			streaming: false,
			error: None,
		}
	}

	pub fn get(url: impl Into<String>) -> DescriptorBuilder {
		Self::builder(Method::Get, url)
	}

	pub fn post(url: impl Into<String>) -> DescriptorBuilder {
		Self::builder(Method::Post, url)
	}

	pub fn put(url: impl Into<String>) -> DescriptorBuilder {
		Self::builder(Method::Put, url)
	}

	pub fn delete(url: impl Into<String>) -> DescriptorBuilder {
		Self::builder(Method::Delete, url)
	}

	#[must_use]
	pub const fn method(&self) -> Method {
		self.method
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
		self.headers
			.iter()
			.find(|(key, _)| key.eq_ignore_ascii_case(name))
			.map(|(_, value)| value.as_str())
	}

	#[must_use]
	pub const fn body(&self) -> &Body {
		&self.body
	}

	/// Whether the session credential is attached when dispatched.
	#[must_use]
	pub const fn is_authenticated(&self) -> bool {
		self.authenticated
	}

	#[must_use]
	pub const fn channel(&self) -> Channel {
		self.channel
	}
}

#[derive(Debug)]
#[must_use]
pub struct DescriptorBuilder {
	method: Method,
	url: String,
	query: Vec<(String, String)>,
	headers: Vec<(String, String)>,
	body: Body,
	authenticated: bool,
	streaming: bool,
	error: Option<String>,
}

impl DescriptorBuilder {
	pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
		self.headers.push((name.into(), value.into()));
		self
	}

	/// Append a query parameter; repeated keys are kept in order.
	pub fn query(mut self, key: impl Into<String>, value: impl ToString) -> Self {
		self.query.push((key.into(), value.to_string()));
		self
	}

	pub fn json<T: Serialize + ?Sized>(mut self, value: &T) -> Self {
		match serde_json::to_value(value) {
			Ok(value) => self.body = Body::Json(value),
			Err(e) => self.error = Some(format!("failed to serialize JSON body: {e}")),
		}
		self
	}

	pub fn form(mut self, fields: impl IntoIterator<Item = (String, String)>) -> Self {
		self.body = Body::Form(fields.into_iter().collect());
		self
	}

	pub fn multipart(mut self, parts: Vec<Part>) -> Self {
		self.body = Body::Multipart(parts);
		self
	}

	pub fn bytes(mut self, data: impl Into<Vec<u8>>, content_type: Option<String>) -> Self {
		self.body = Body::Bytes {
			data: data.into(),
			content_type,
		};
		self
	}

	/// Send without the session credential.
	pub fn without_auth(mut self) -> Self {
		self.authenticated = false;
		self
	}

	/// Route over the binary transport even without a binary body (downloads).
	pub fn streaming(mut self) -> Self {
		self.streaming = true;
		self
	}

	pub fn build(self) -> Result<RequestDescriptor> {
		let Self {
			method,
			url,
			query,
			headers,
			body,
			authenticated,
			streaming,
			error,
		} = self;

		if let Some(reason) = error {
			return Err(Error::InvalidRequest(reason));
		}

		let url = if query.is_empty() {
			url
		} else {
			let mut parsed = Url::parse(&url)
				.map_err(|e| Error::InvalidRequest(format!("invalid url '{url}': {e}")))?;
			parsed.query_pairs_mut().extend_pairs(&query);
			parsed.into()
		};

		let channel = if streaming || matches!(body, Body::Multipart(_) | Body::Bytes { .. }) {
			Channel::Binary
		} else {
			Channel::Primary
		};

		Ok(RequestDescriptor {
			method,
			url,
			headers,
			body,
			authenticated,
			channel,
		})
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	use serde_json::json;

	#[test]
	fn query_pairs_are_appended_in_order() {
		let request = RequestDescriptor::get("https://api.example.org/api/dataset/batch")
			.query("ids", 1)
			.query("ids", 2)
			.build()
			.unwrap();

		assert_eq!(
			request.url(),
			"https://api.example.org/api/dataset/batch?ids=1&ids=2"
		);
		assert_eq!(request.channel(), Channel::Primary);
		assert!(request.is_authenticated());
	}

	#[test]
	fn binary_bodies_use_the_binary_channel() {
		let upload = RequestDescriptor::post("https://api.example.org/api/dataset/v3")
			.multipart(vec![Part::text("dataset", "{}")])
			.build()
			.unwrap();
		assert_eq!(upload.channel(), Channel::Binary);

		let download = RequestDescriptor::post("https://api.example.org/api/dataset/download")
			.json(&json!({ "datasetIds": [1] }))
			.streaming()
			.build()
			.unwrap();
		assert_eq!(download.channel(), Channel::Binary);
	}

	#[test]
	fn query_on_unparseable_url_fails() {
		assert!(matches!(
			RequestDescriptor::get("/relative").query("a", "b").build(),
			Err(Error::InvalidRequest(_))
		));
	}

	#[test]
	fn header_lookup_ignores_case() {
		let request = RequestDescriptor::get("https://api.example.org")
			.header("Accept", "application/json")
			.without_auth()
			.build()
			.unwrap();

		assert_eq!(request.header("accept"), Some("application/json"));
		assert!(!request.is_authenticated());
	}
}
