use std::{fmt, sync::Arc};

use async_trait::async_trait;
use serde_json::{json, Value};
use tokio::{runtime::Handle, task::JoinHandle};
use tracing::{error, warn};

use crate::error::TransportError;

/// Destination for diagnostic messages.
#[async_trait]
pub trait DiagnosticSink: Send + Sync {
	async fn submit(&self, message: String) -> Result<(), TransportError>;
}

/// Posts `{"message": ...}` to a remote logging endpoint.
#[derive(Debug, Clone)]
pub struct HttpSink {
	client: reqwest::Client,
	url: String,
}

impl HttpSink {
	pub fn new(client: reqwest::Client, url: impl Into<String>) -> Self {
		Self {
			client,
			url: url.into(),
		}
	}
}

#[async_trait]
impl DiagnosticSink for HttpSink {
	async fn submit(&self, message: String) -> Result<(), TransportError> {
		self.client
			.post(&self.url)
			.json(&json!({ "message": message }))
			.send()
			.await
			.and_then(reqwest::Response::error_for_status)?;

		Ok(())
	}
}

/// Sink used when no remote endpoint is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

#[async_trait]
impl DiagnosticSink for TracingSink {
	async fn submit(&self, message: String) -> Result<(), TransportError> {
		error!("{message}");
		Ok(())
	}
}

/// Best effort, fire-and-forget error reporting. Never fails and never blocks its caller.
#[derive(Clone)]
pub struct ErrorReporter {
	sink: Arc<dyn DiagnosticSink>,
}

impl ErrorReporter {
	pub fn new(sink: Arc<dyn DiagnosticSink>) -> Self {
		Self { sink }
	}

	/// Submit a report on a detached task.
	///
	/// The returned handle may be dropped; it only exists so a caller can observe completion.
	/// Returns `None` when there is no runtime to run the task on.
	#[allow(clippy::must_use_candidate)]
	pub fn report(&self, url: &str, status: u16) -> Option<JoinHandle<()>> {
		let message = format_report(url, status);

		let Ok(runtime) = Handle::try_current() else {
			warn!("No async runtime available, dropping error report: {message}");
			return None;
		};

		let sink = Arc::clone(&self.sink);
		Some(runtime.spawn(async move {
			if let Err(e) = sink.submit(message).await {
				warn!("Failed to submit error report: {e}");
			}
		}))
	}
}

impl fmt::Debug for ErrorReporter {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("ErrorReporter").finish_non_exhaustive()
	}
}

/// `Error fetching response: "<url>"Status: <status>`, with the URL JSON encoded.
#[must_use]
pub fn format_report(url: &str, status: u16) -> String {
	format!(
		"Error fetching response: {}Status: {status}",
		Value::from(url)
	)
}

#[cfg(test)]
mod tests {
	use super::*;

	use crate::testing::{FailingSink, RecordingSink};

	use tracing_test::traced_test;

	#[test]
	fn message_format() {
		assert_eq!(
			format_report("https://api.example.org/api/dac?withUsers=true", 500),
			r#"Error fetching response: "https://api.example.org/api/dac?withUsers=true"Status: 500"#
		);
	}

	#[tokio::test]
	async fn report_reaches_the_sink() {
		let sink = Arc::new(RecordingSink::default());
		let reporter = ErrorReporter::new(Arc::clone(&sink) as Arc<dyn DiagnosticSink>);

		reporter
			.report("https://api.example.org/api/dac", 503)
			.unwrap()
			.await
			.unwrap();

		assert_eq!(
			sink.messages(),
			vec![format_report("https://api.example.org/api/dac", 503)]
		);
	}

	#[tokio::test]
	#[traced_test]
	async fn sink_failures_are_swallowed() {
		let reporter = ErrorReporter::new(Arc::new(FailingSink));

		reporter
			.report("https://api.example.org/api/dac", 500)
			.unwrap()
			.await
			.unwrap();

		assert!(logs_contain("Failed to submit error report"));
	}

	#[test]
	fn no_runtime_drops_the_report() {
		let reporter = ErrorReporter::new(Arc::new(TracingSink));
		assert!(reporter.report("https://api.example.org", 500).is_none());
	}
}
