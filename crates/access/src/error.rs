use std::path::Path;

use thiserror::Error;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum Error {
	/// The request never produced a response (network unreachable, timeout, body read failure).
	#[error("transport failure <url='{url}'>: {source}")]
	Transport {
		url: String,
		#[source]
		source: TransportError,
	},
	/// The strict policy rejected a response with a status of 400 or above.
	#[error("request failed with status {status} <url='{url}'>")]
	Status { status: u16, url: String },
	#[error("failed to decode response body <url='{url}'>: {source}")]
	Decode {
		url: String,
		#[source]
		source: serde_json::Error,
	},
	#[error("invalid request: {0}")]
	InvalidRequest(String),
	#[error(transparent)]
	Config(#[from] ConfigError),
	#[error("failed to build HTTP client: {0}")]
	HttpClient(#[source] reqwest::Error),

	#[error("job <id='{job_id}'> reported unrecognized status '{status}'")]
	UnrecognizedJobStatus { job_id: String, status: String },
	#[error("job failed with status {status_code} <status_url='{status_url}'>")]
	JobFailed { status_url: String, status_code: u16 },
	#[error("job <id='{job_id}'> still running after {attempts} status polls")]
	PollAttemptsExhausted { job_id: String, attempts: u32 },
}

impl Error {
	/// HTTP status carried by this error, if any.
	#[must_use]
	pub const fn status(&self) -> Option<u16> {
		match self {
			Self::Status { status, .. } => Some(*status),
			_ => None,
		}
	}

	#[must_use]
	pub const fn is_transport(&self) -> bool {
		matches!(self, Self::Transport { .. })
	}
}

#[derive(Debug, Error)]
pub enum TransportError {
	#[error(transparent)]
	Network(#[from] reqwest::Error),
	#[error("{0}")]
	Other(String),
}

#[derive(Debug, Error)]
pub enum ConfigError {
	#[error("failed to read config file <path='{}'>: {source}", path.display())]
	Read {
		path: Box<Path>,
		#[source]
		source: std::io::Error,
	},
	#[error("failed to parse config file <path='{}'>: {source}", path.display())]
	Parse {
		path: Box<Path>,
		#[source]
		source: serde_json::Error,
	},
	#[error("invalid value for '{key}': {reason}")]
	InvalidValue { key: &'static str, reason: String },
	#[error("no base url configured for the {0} service")]
	MissingBaseUrl(&'static str),
}
