//! Scripted collaborators for exercising a [`Client`] without a network.
//!
//! Enabled for this crate's own tests and, through the `testing` feature, for downstream crates.

use std::{
	collections::{HashMap, VecDeque},
	sync::Arc,
};

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;
use tokio::{sync::Notify, time::Instant};

use crate::{
	client::Client,
	config::AccessConfig,
	error::TransportError,
	interceptor::Navigator,
	report::DiagnosticSink,
	request::{Body, Channel, Method, RequestDescriptor},
	response::RawResponse,
	session::{Credential, Session},
	transport::Transport,
};

/// Configuration pointing every service at a distinct `example.org` host.
#[must_use]
pub fn test_config() -> AccessConfig {
	AccessConfig {
		api_url: "https://api.example.org".to_string(),
		ontology_url: "https://ontology.example.org".to_string(),
		ticketing_url: "https://support.example.org".to_string(),
		tdr_url: "https://data.example.org".to_string(),
		terra_url: "https://app.example.org".to_string(),
		origin: "https://duos.example.org".to_string(),
		..AccessConfig::default()
	}
}

#[derive(Debug, Clone)]
enum Reply {
	Response(RawResponse),
	Failure(String),
}

/// A request as seen by the [`ScriptedTransport`].
#[derive(Debug, Clone)]
pub struct RecordedRequest {
	pub method: Method,
	pub url: String,
	pub authorization: Option<String>,
	pub body: Body,
	pub channel: Channel,
	pub at: Instant,
}

/// Transport answering from per `(method, url)` queues of scripted replies.
///
/// Requests without a queued reply fail as if the network were unreachable.
#[derive(Debug, Default)]
pub struct ScriptedTransport {
	replies: Mutex<HashMap<(Method, String), VecDeque<Reply>>>,
	requests: Mutex<Vec<RecordedRequest>>,
}

impl ScriptedTransport {
	fn push(&self, method: Method, url: impl Into<String>, reply: Reply) -> &Self {
		self.replies
			.lock()
			.entry((method, url.into()))
			.or_default()
			.push_back(reply);
		self
	}

	pub fn reply(&self, method: Method, url: impl Into<String>, response: RawResponse) -> &Self {
		self.push(method, url, Reply::Response(response))
	}

	pub fn reply_status(&self, method: Method, url: impl Into<String>, status: u16) -> &Self {
		let url = url.into();
		let response = RawResponse::new(status, url.clone());
		self.reply(method, url, response)
	}

	pub fn reply_json(
		&self,
		method: Method,
		url: impl Into<String>,
		status: u16,
		body: &Value,
	) -> &Self {
		let url = url.into();
		let response = RawResponse::new(status, url.clone()).with_json(body);
		self.reply(method, url, response)
	}

	pub fn fail(&self, method: Method, url: impl Into<String>, reason: impl Into<String>) -> &Self {
		self.push(method, url, Reply::Failure(reason.into()))
	}

	#[must_use]
	pub fn requests(&self) -> Vec<RecordedRequest> {
		self.requests.lock().clone()
	}

	#[must_use]
	pub fn count(&self, method: Method, url: &str) -> usize {
		self.requests
			.lock()
			.iter()
			.filter(|req| req.method == method && req.url == url)
			.count()
	}
}

#[async_trait]
impl Transport for ScriptedTransport {
	async fn send(
		&self,
		request: &RequestDescriptor,
		credential: Option<&Credential>,
	) -> Result<RawResponse, TransportError> {
		self.requests.lock().push(RecordedRequest {
			method: request.method(),
			url: request.url().to_string(),
			authorization: credential.map(Credential::authorization),
			body: request.body().clone(),
			channel: request.channel(),
			at: Instant::now(),
		});

		let reply = self
			.replies
			.lock()
			.get_mut(&(request.method(), request.url().to_string()))
			.and_then(VecDeque::pop_front);

		match reply {
			Some(Reply::Response(response)) => Ok(response),
			Some(Reply::Failure(reason)) => Err(TransportError::Other(reason)),
			None => Err(TransportError::Other(format!(
				"no scripted reply for {} {}",
				request.method(),
				request.url()
			))),
		}
	}
}

/// Sink keeping every submitted message.
#[derive(Debug, Default)]
pub struct RecordingSink {
	messages: Mutex<Vec<String>>,
	submitted: Notify,
}

impl RecordingSink {
	#[must_use]
	pub fn messages(&self) -> Vec<String> {
		self.messages.lock().clone()
	}

	/// Wait until at least `count` messages were submitted.
	pub async fn wait_for(&self, count: usize) -> Vec<String> {
		loop {
			let submitted = self.submitted.notified();
			{
				let messages = self.messages.lock();
				if messages.len() >= count {
					return messages.clone();
				}
			}
			submitted.await;
		}
	}
}

#[async_trait]
impl DiagnosticSink for RecordingSink {
	async fn submit(&self, message: String) -> Result<(), TransportError> {
		self.messages.lock().push(message);
		self.submitted.notify_waiters();
		Ok(())
	}
}

/// Sink whose endpoint is always unreachable.
#[derive(Debug, Clone, Copy, Default)]
pub struct FailingSink;

#[async_trait]
impl DiagnosticSink for FailingSink {
	async fn submit(&self, _message: String) -> Result<(), TransportError> {
		Err(TransportError::Other("diagnostics endpoint unavailable".to_string()))
	}
}

/// Navigator keeping every location it was sent to.
#[derive(Debug)]
pub struct RecordingNavigator {
	current: Mutex<String>,
	navigations: Mutex<Vec<String>>,
}

impl RecordingNavigator {
	pub fn new(current_path: impl Into<String>) -> Self {
		Self {
			current: Mutex::new(current_path.into()),
			navigations: Mutex::new(Vec::new()),
		}
	}

	#[must_use]
	pub fn navigations(&self) -> Vec<String> {
		self.navigations.lock().clone()
	}
}

impl Navigator for RecordingNavigator {
	fn current_path(&self) -> String {
		self.current.lock().clone()
	}

	fn navigate(&self, location: &str) {
		self.navigations.lock().push(location.to_string());
		*self.current.lock() = location.to_string();
	}
}

/// A client wired to scripted collaborators on both channels.
pub struct Harness {
	pub client: Client,
	pub transport: Arc<ScriptedTransport>,
	pub sink: Arc<RecordingSink>,
	pub navigator: Arc<RecordingNavigator>,
}

impl Harness {
	/// Signed in with a bearer token `token`, on route `/dataset_catalog`.
	#[must_use]
	pub fn new() -> Self {
		Self::with_config(test_config())
	}

	#[must_use]
	#[allow(clippy::missing_panics_doc)]
	pub fn with_config(config: AccessConfig) -> Self {
		let transport = Arc::new(ScriptedTransport::default());
		let sink = Arc::new(RecordingSink::default());
		let navigator = Arc::new(RecordingNavigator::new("/dataset_catalog"));

		let scripted: Arc<dyn Transport> = transport.clone();
		let client = Client::builder(config)
			.session(Arc::new(Session::signed_in(Credential::bearer("token"))))
			.navigator(navigator.clone())
			.sink(sink.clone())
			.transport(Arc::clone(&scripted))
			.binary_transport(scripted)
			.build()
			.expect("scripted transports never fail to build");

		Self {
			client,
			transport,
			sink,
			navigator,
		}
	}

	/// Give detached report tasks a chance to run.
	pub async fn settle(&self) {
		for _ in 0..8 {
			tokio::task::yield_now().await;
		}
	}
}

impl Default for Harness {
	fn default() -> Self {
		Self::new()
	}
}
