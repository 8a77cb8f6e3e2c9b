use std::{fmt, sync::Arc, time::Duration};

use async_trait::async_trait;
use reqwest::header::{HeaderValue, AUTHORIZATION, CONTENT_LENGTH, CONTENT_TYPE};
use tracing::{debug, trace};

use crate::{
	config::AccessConfig,
	error::TransportError,
	request::{Body, Method, Part, RequestDescriptor},
	response::RawResponse,
	session::Credential,
};

/// Status assumed for interception and reporting when a request yields no response at all.
pub const MISSING_RESPONSE_STATUS: u16 = 502;

/// Moves one request over the wire and reads its body exactly once.
#[async_trait]
pub trait Transport: Send + Sync {
	async fn send(
		&self,
		request: &RequestDescriptor,
		credential: Option<&Credential>,
	) -> Result<RawResponse, TransportError>;
}

/// Observer run for every completed request on an [`Intercepted`] transport.
pub trait ResponseHook: Send + Sync {
	/// `status` is [`MISSING_RESPONSE_STATUS`] when the transport failed.
	fn on_response(&self, request: &RequestDescriptor, status: u16);
}

/// `reqwest` backed transport.
#[derive(Debug, Clone)]
pub struct HttpTransport {
	client: reqwest::Client,
}

impl HttpTransport {
	pub fn new(config: &AccessConfig) -> Result<Self, reqwest::Error> {
		let mut builder = reqwest::Client::builder();

		if let Some(timeout) = config.connect_timeout_ms {
			builder = builder.connect_timeout(Duration::from_millis(timeout));
		}

		if let Some(timeout) = config.request_timeout_ms {
			builder = builder.timeout(Duration::from_millis(timeout));
		}

		Ok(Self {
			client: builder.build()?,
		})
	}

	/// Binary transfers are not bound by the request timeout.
	pub fn for_binary(config: &AccessConfig) -> Result<Self, reqwest::Error> {
		let mut builder = reqwest::Client::builder();

		if let Some(timeout) = config.connect_timeout_ms {
			builder = builder.connect_timeout(Duration::from_millis(timeout));
		}

		Ok(Self {
			client: builder.build()?,
		})
	}

	#[must_use]
	pub const fn with_client(client: reqwest::Client) -> Self {
		Self { client }
	}
}

#[async_trait]
impl Transport for HttpTransport {
	async fn send(
		&self,
		request: &RequestDescriptor,
		credential: Option<&Credential>,
	) -> Result<RawResponse, TransportError> {
		let mut req = self
			.client
			.request(request.method().into(), request.url());

		for (name, value) in request.headers() {
			req = req.header(name.as_str(), value.as_str());
		}

		if let Some(credential) = credential {
			req = req.header(AUTHORIZATION, credential.authorization());
		}

		req = match request.body() {
			Body::Empty if matches!(request.method(), Method::Post | Method::Put) => {
				req.header(CONTENT_LENGTH, HeaderValue::from(0))
			}
			Body::Empty => req,
			Body::Json(value) => req.json(value),
			Body::Form(fields) => req.form(fields),
			Body::Multipart(parts) => req.multipart(multipart_form(parts)?),
			Body::Bytes { data, content_type } => {
				trace!("Attaching {} byte body", data.len());
				let req = req.body(data.clone());
				match content_type {
					Some(content_type) => req.header(CONTENT_TYPE, content_type.as_str()),
					None => req,
				}
			}
		};

		let res = req.send().await?;

		let status = res.status().as_u16();
		debug!(
			"{} {} -> {} ({})",
			request.method(),
			request.url(),
			status,
			res.status().canonical_reason().unwrap_or_default()
		);

		let headers = res
			.headers()
			.iter()
			.map(|(name, value)| {
				(
					name.as_str().to_string(),
					String::from_utf8_lossy(value.as_bytes()).into_owned(),
				)
			})
			.collect();

		let body = res.bytes().await?.to_vec();
		trace!("Body received: {} bytes", body.len());

		Ok(RawResponse {
			status,
			url: request.url().to_string(),
			headers,
			body,
		})
	}
}

fn multipart_form(parts: &[Part]) -> Result<reqwest::multipart::Form, TransportError> {
	let mut form = reqwest::multipart::Form::new();

	for part in parts {
		let mut field = reqwest::multipart::Part::bytes(part.data.clone());

		if let Some(file_name) = &part.file_name {
			field = field.file_name(file_name.clone());
		}

		if let Some(content_type) = &part.content_type {
			field = field.mime_str(content_type)?;
		}

		form = form.part(part.name.clone(), field);
	}

	Ok(form)
}

/// Wraps a transport so every completed request, successful or not, passes through the hooks.
#[derive(Clone)]
pub struct Intercepted {
	inner: Arc<dyn Transport>,
	hooks: Vec<Arc<dyn ResponseHook>>,
}

impl Intercepted {
	pub fn new(inner: Arc<dyn Transport>) -> Self {
		Self {
			inner,
			hooks: Vec::new(),
		}
	}

	#[must_use]
	pub fn with_hook(mut self, hook: Arc<dyn ResponseHook>) -> Self {
		self.hooks.push(hook);
		self
	}
}

impl fmt::Debug for Intercepted {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Intercepted")
			.field("hooks", &self.hooks.len())
			.finish_non_exhaustive()
	}
}

#[async_trait]
impl Transport for Intercepted {
	async fn send(
		&self,
		request: &RequestDescriptor,
		credential: Option<&Credential>,
	) -> Result<RawResponse, TransportError> {
		let res = self.inner.send(request, credential).await;

		let status = res
			.as_ref()
			.map_or(MISSING_RESPONSE_STATUS, |raw| raw.status);

		for hook in &self.hooks {
			hook.on_response(request, status);
		}

		res
	}
}
