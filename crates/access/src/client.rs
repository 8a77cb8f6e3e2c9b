//! Dispatch core
//!
//! Every outbound request goes through [`Client::dispatch`], under one of two failure policies:
//! - [`Policy::Strict`] rejects any response with a status of 400 or above;
//! - [`Policy::Lenient`] hands every response back and leaves status branching to the caller.
//!
//! Regardless of policy, each dispatch holds the busy indicator for its whole duration, ends the
//! session on a 401, and reports failures to the diagnostics sink on a detached task.

use std::{fmt, sync::Arc};

use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::{
	busy::BusyIndicator,
	config::{AccessConfig, Service},
	error::{Error, Result},
	interceptor::{Navigator, RouteNavigator, SessionInterceptor, UNAUTHORIZED},
	report::{DiagnosticSink, ErrorReporter, HttpSink, TracingSink},
	request::{Channel, RequestDescriptor},
	response::ResponseEnvelope,
	session::Session,
	transport::{HttpTransport, Intercepted, ResponseHook, Transport, MISSING_RESPONSE_STATUS},
};


/// Failure sensitivity of a dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Policy {
	/// Reject on any status of 400 or above
	Strict,
	/// Reject only when no response was produced
	Lenient,
}

impl Policy {
	const fn rejects(self, status: u16) -> bool {
		matches!(self, Self::Strict) && status >= 400
	}

	const fn reports(self, status: u16) -> bool {
		match self {
			Self::Strict => status >= 400,
			Self::Lenient => status >= 500,
		}
	}
}

pub struct Client {
	config: AccessConfig,
	session: Arc<Session>,
	interceptor: Arc<SessionInterceptor>,
	reporter: ErrorReporter,
	busy: BusyIndicator,
	primary: Intercepted,
	binary: Intercepted,
}

impl Client {
	pub fn builder(config: AccessConfig) -> ClientBuilder {
		ClientBuilder {
			config,
			session: None,
			navigator: None,
			sink: None,
			primary: None,
			binary: None,
		}
	}

	/// Client with `reqwest` transports and the configured diagnostics sink.
	pub fn new(config: AccessConfig) -> Result<Self> {
		Self::builder(config).build()
	}

	pub async fn dispatch(
		&self,
		request: RequestDescriptor,
		policy: Policy,
	) -> Result<ResponseEnvelope> {
		let _busy = self.busy.acquire();

		// Read at dispatch time so a request never carries a stale credential
		let credential = if request.is_authenticated() {
			self.session.credential()
		} else {
			None
		};

		let transport = match request.channel() {
			Channel::Primary => &self.primary,
			Channel::Binary => &self.binary,
		};

		debug!(
			"Dispatching {} {} <policy={policy:?}>",
			request.method(),
			request.url()
		);

		let raw = match transport.send(&request, credential.as_ref()).await {
			Ok(raw) => raw,
			Err(source) => {
				warn!("No response from {}: {source}", request.url());
				self.reporter.report(request.url(), MISSING_RESPONSE_STATUS);
				return Err(Error::Transport {
					url: request.url().to_string(),
					source,
				});
			}
		};

		let status = raw.status;

		if status == UNAUTHORIZED {
			self.interceptor.invalidate();
		}

		if policy.reports(status) {
			self.reporter.report(request.url(), status);
		}

		if policy.rejects(status) {
			warn!("{} {} failed with status {status}", request.method(), request.url());
			return Err(Error::Status {
				status,
				url: request.url().to_string(),
			});
		}

		Ok(ResponseEnvelope::decode(raw))
	}

	pub async fn request_strict(&self, request: RequestDescriptor) -> Result<ResponseEnvelope> {
		self.dispatch(request, Policy::Strict).await
	}

	pub async fn request_lenient(&self, request: RequestDescriptor) -> Result<ResponseEnvelope> {
		self.dispatch(request, Policy::Lenient).await
	}

	/// Strict dispatch decoding the body as `T`.
	pub async fn fetch_json<T: DeserializeOwned>(&self, request: RequestDescriptor) -> Result<T> {
		self.request_strict(request).await?.json()
	}

	/// `{service base}{path}`, resolved against the configuration on every call.
	pub fn url(&self, service: Service, path: &str) -> Result<String> {
		Ok(format!("{}{path}", self.config.base_url(service)?))
	}

	#[must_use]
	pub const fn config(&self) -> &AccessConfig {
		&self.config
	}

	#[must_use]
	pub const fn session(&self) -> &Arc<Session> {
		&self.session
	}

	#[must_use]
	pub const fn interceptor(&self) -> &Arc<SessionInterceptor> {
		&self.interceptor
	}

	#[must_use]
	pub const fn reporter(&self) -> &ErrorReporter {
		&self.reporter
	}

	#[must_use]
	pub const fn busy(&self) -> &BusyIndicator {
		&self.busy
	}
}

impl fmt::Debug for Client {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Client")
			.field("config", &self.config)
			.field("session", &self.session)
			.field("busy", &self.busy)
			.finish_non_exhaustive()
	}
}

#[must_use]
pub struct ClientBuilder {
	config: AccessConfig,
	session: Option<Arc<Session>>,
	navigator: Option<Arc<dyn Navigator>>,
	sink: Option<Arc<dyn DiagnosticSink>>,
	primary: Option<Arc<dyn Transport>>,
	binary: Option<Arc<dyn Transport>>,
}

impl ClientBuilder {
	/// Share an existing session instead of starting from an empty one.
	pub fn session(mut self, session: Arc<Session>) -> Self {
		self.session = Some(session);
		self
	}

	pub fn navigator(mut self, navigator: Arc<dyn Navigator>) -> Self {
		self.navigator = Some(navigator);
		self
	}

	pub fn sink(mut self, sink: Arc<dyn DiagnosticSink>) -> Self {
		self.sink = Some(sink);
		self
	}

	pub fn transport(mut self, transport: Arc<dyn Transport>) -> Self {
		self.primary = Some(transport);
		self
	}

	pub fn binary_transport(mut self, transport: Arc<dyn Transport>) -> Self {
		self.binary = Some(transport);
		self
	}

	pub fn build(self) -> Result<Client> {
		let Self {
			config,
			session,
			navigator,
			sink,
			primary,
			binary,
		} = self;

		let session = session.unwrap_or_default();
		let navigator = navigator.unwrap_or_else(|| Arc::new(RouteNavigator::new("/")));

		let primary = match primary {
			Some(transport) => transport,
			None => Arc::new(HttpTransport::new(&config).map_err(Error::HttpClient)?),
		};

		let binary = match binary {
			Some(transport) => transport,
			None => Arc::new(HttpTransport::for_binary(&config).map_err(Error::HttpClient)?),
		};

		let sink: Arc<dyn DiagnosticSink> = match (sink, &config.error_sink_url) {
			(Some(sink), _) => sink,
			(None, Some(url)) => Arc::new(HttpSink::new(reqwest::Client::new(), url.clone())),
			(None, None) => Arc::new(TracingSink),
		};

		let interceptor = Arc::new(SessionInterceptor::new(
			Arc::clone(&session),
			navigator,
			config.login_path.clone(),
		));

		// One hook instance on both transports, so both converge on the same latch
		let hook: Arc<dyn ResponseHook> = interceptor.clone();
		let primary = Intercepted::new(primary).with_hook(Arc::clone(&hook));
		let binary = Intercepted::new(binary).with_hook(hook);

		Ok(Client {
			config,
			session,
			interceptor,
			reporter: ErrorReporter::new(sink),
			busy: BusyIndicator::new(),
			primary,
			binary,
		})
	}
}
