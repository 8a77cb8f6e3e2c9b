//! Client configuration
//!
//! Service base URLs, the session-loss redirect target, the diagnostics sink and the job polling
//! cadence. Loaded from a JSON file and optionally overridden by `DUOS_*` environment variables.

use std::{fmt, fs, path::Path, time::Duration};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use url::Url;

use crate::error::ConfigError;

/// Environment name in which the core API and ontology service are served from the same origin.
pub const LOCAL_ENV: &str = "local";

const DEFAULT_TICKETING_URL: &str = "https://broadinstitute.zendesk.com";
const DEFAULT_LOGIN_PATH: &str = "/home";
const DEFAULT_POLL_INTERVAL_MS: u64 = 1000;

/// Backend services reachable through the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Service {
	Api,
	Ontology,
	Ticketing,
	DataRepository,
}

impl Service {
	const fn name(self) -> &'static str {
		match self {
			Self::Api => "api",
			Self::Ontology => "ontology",
			Self::Ticketing => "ticketing",
			Self::DataRepository => "data repository",
		}
	}
}

impl fmt::Display for Service {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.name())
	}
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct AccessConfig {
	/// Deployment environment name, `local` switches to same-origin requests
	pub env: String,

	/// Core REST API base URL
	pub api_url: String,

	/// Ontology service base URL
	pub ontology_url: String,

	/// Ticketing service base URL
	pub ticketing_url: String,

	/// Data repository base URL
	pub tdr_url: String,

	/// Workspace UI that receives data repository imports
	pub terra_url: String,

	/// Origin of the application itself
	pub origin: String,

	/// Login entry point used after the session is lost
	pub login_path: String,

	/// Remote diagnostics endpoint, reports are only logged when absent
	pub error_sink_url: Option<String>,

	/// Delay between two job status polls
	pub poll_interval_ms: u64,

	/// Upper bound on job status polls, unbounded when absent
	pub max_poll_attempts: Option<u32>,

	pub connect_timeout_ms: Option<u64>,
	pub request_timeout_ms: Option<u64>,
}

impl Default for AccessConfig {
	fn default() -> Self {
		Self {
			env: "dev".to_string(),
			api_url: String::new(),
			ontology_url: String::new(),
			ticketing_url: DEFAULT_TICKETING_URL.to_string(),
			tdr_url: String::new(),
			terra_url: String::new(),
			origin: String::new(),
			login_path: DEFAULT_LOGIN_PATH.to_string(),
			error_sink_url: None,
			poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
			max_poll_attempts: None,
			connect_timeout_ms: None,
			request_timeout_ms: None,
		}
	}
}

impl AccessConfig {
	/// Load configuration from a JSON file, then apply environment overrides.
	pub fn load_from(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
		let path = path.as_ref();

		info!("Loading client config from {}", path.display());
		let json = fs::read_to_string(path).map_err(|source| ConfigError::Read {
			path: path.into(),
			source,
		})?;

		let mut config: Self = serde_json::from_str(&json).map_err(|source| ConfigError::Parse {
			path: path.into(),
			source,
		})?;

		config.apply_env()?;
		config.validate()?;

		Ok(config)
	}

	/// Override fields from `DUOS_*` process environment variables.
	pub fn apply_env(&mut self) -> Result<(), ConfigError> {
		self.apply_vars(std::env::vars())
	}

	pub fn apply_vars(
		&mut self,
		vars: impl IntoIterator<Item = (String, String)>,
	) -> Result<(), ConfigError> {
		for (key, value) in vars {
			match key.as_str() {
				"DUOS_ENV" => self.env = value,
				"DUOS_API_URL" => self.api_url = value,
				"DUOS_ONTOLOGY_URL" => self.ontology_url = value,
				"DUOS_TICKETING_URL" => self.ticketing_url = value,
				"DUOS_TDR_URL" => self.tdr_url = value,
				"DUOS_TERRA_URL" => self.terra_url = value,
				"DUOS_ORIGIN" => self.origin = value,
				"DUOS_LOGIN_PATH" => self.login_path = value,
				"DUOS_ERROR_SINK_URL" => self.error_sink_url = Some(value),
				"DUOS_POLL_INTERVAL_MS" => {
					self.poll_interval_ms = parse_number("poll_interval_ms", &value)?;
				}
				"DUOS_MAX_POLL_ATTEMPTS" => {
					self.max_poll_attempts = Some(parse_number("max_poll_attempts", &value)?);
				}
				"DUOS_CONNECT_TIMEOUT_MS" => {
					self.connect_timeout_ms = Some(parse_number("connect_timeout_ms", &value)?);
				}
				"DUOS_REQUEST_TIMEOUT_MS" => {
					self.request_timeout_ms = Some(parse_number("request_timeout_ms", &value)?);
				}
				_ => continue,
			}
			debug!("Applied config override from {key}");
		}

		Ok(())
	}

	/// Every non-empty URL must parse.
	pub fn validate(&self) -> Result<(), ConfigError> {
		let urls = [
			("api_url", self.api_url.as_str()),
			("ontology_url", self.ontology_url.as_str()),
			("ticketing_url", self.ticketing_url.as_str()),
			("tdr_url", self.tdr_url.as_str()),
			("terra_url", self.terra_url.as_str()),
			("origin", self.origin.as_str()),
		];

		for (key, value) in urls {
			if !value.is_empty() {
				Url::parse(value).map_err(|e| ConfigError::InvalidValue {
					key,
					reason: e.to_string(),
				})?;
			}
		}

		if let Some(sink) = &self.error_sink_url {
			Url::parse(sink).map_err(|e| ConfigError::InvalidValue {
				key: "error_sink_url",
				reason: e.to_string(),
			})?;
		}

		if self.poll_interval_ms == 0 {
			return Err(ConfigError::InvalidValue {
				key: "poll_interval_ms",
				reason: "must be greater than zero".to_string(),
			});
		}

		if self.max_poll_attempts == Some(0) {
			return Err(ConfigError::InvalidValue {
				key: "max_poll_attempts",
				reason: "must be greater than zero when set".to_string(),
			});
		}

		Ok(())
	}

	#[must_use]
	pub fn is_local(&self) -> bool {
		self.env == LOCAL_ENV
	}

	/// Base URL for a service, without a trailing slash.
	pub fn base_url(&self, service: Service) -> Result<String, ConfigError> {
		let base = match service {
			Service::Api if self.is_local() => &self.origin,
			Service::Ontology if self.is_local() => &self.origin,
			Service::Api => &self.api_url,
			Service::Ontology => &self.ontology_url,
			Service::Ticketing => &self.ticketing_url,
			Service::DataRepository => &self.tdr_url,
		};

		if base.is_empty() {
			return Err(ConfigError::MissingBaseUrl(service.name()));
		}

		Ok(base.trim_end_matches('/').to_string())
	}

	#[must_use]
	pub const fn poll_interval(&self) -> Duration {
		Duration::from_millis(self.poll_interval_ms)
	}
}

fn parse_number<T: std::str::FromStr>(key: &'static str, value: &str) -> Result<T, ConfigError>
where
	T::Err: fmt::Display,
{
	value
		.trim()
		.parse()
		.map_err(|e: T::Err| ConfigError::InvalidValue {
			key,
			reason: e.to_string(),
		})
}

#[cfg(test)]
mod tests {
	use super::*;

	use std::io::Write;

	fn vars(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
		pairs
			.iter()
			.map(|(k, v)| ((*k).to_string(), (*v).to_string()))
			.collect()
	}

	#[test]
	fn local_env_resolves_api_and_ontology_to_origin() {
		let config = AccessConfig {
			env: LOCAL_ENV.to_string(),
			api_url: "https://consent.example.org".to_string(),
			ontology_url: "https://ontology.example.org".to_string(),
			tdr_url: "https://tdr.example.org/".to_string(),
			origin: "http://localhost:3000".to_string(),
			..Default::default()
		};

		assert_eq!(config.base_url(Service::Api).unwrap(), "http://localhost:3000");
		assert_eq!(
			config.base_url(Service::Ontology).unwrap(),
			"http://localhost:3000"
		);
		assert_eq!(
			config.base_url(Service::DataRepository).unwrap(),
			"https://tdr.example.org"
		);
	}

	#[test]
	fn missing_base_url_is_an_error() {
		let config = AccessConfig::default();

		assert!(matches!(
			config.base_url(Service::Api),
			Err(ConfigError::MissingBaseUrl("api"))
		));
		assert_eq!(
			config.base_url(Service::Ticketing).unwrap(),
			DEFAULT_TICKETING_URL
		);
	}

	#[test]
	fn env_overrides() {
		let mut config = AccessConfig::default();
		config
			.apply_vars(vars(&[
				("DUOS_API_URL", "https://api.example.org"),
				("DUOS_MAX_POLL_ATTEMPTS", "30"),
				("DUOS_POLL_INTERVAL_MS", "250"),
				("HOME", "/root"),
			]))
			.unwrap();

		assert_eq!(config.api_url, "https://api.example.org");
		assert_eq!(config.max_poll_attempts, Some(30));
		assert_eq!(config.poll_interval(), Duration::from_millis(250));

		assert!(matches!(
			config.apply_vars(vars(&[("DUOS_POLL_INTERVAL_MS", "soon")])),
			Err(ConfigError::InvalidValue {
				key: "poll_interval_ms",
				..
			})
		));
	}

	#[test]
	fn load_from_file() {
		let mut file = tempfile::NamedTempFile::new().unwrap();
		write!(
			file,
			r#"{{"api_url": "https://api.example.org", "tdr_url": "https://tdr.example.org", "max_poll_attempts": 5}}"#
		)
		.unwrap();

		let config = AccessConfig::load_from(file.path()).unwrap();

		assert_eq!(config.tdr_url, "https://tdr.example.org");
		assert_eq!(config.max_poll_attempts, Some(5));
		assert_eq!(config.login_path, DEFAULT_LOGIN_PATH);
		assert_eq!(config.poll_interval_ms, DEFAULT_POLL_INTERVAL_MS);
	}

	#[test]
	fn zero_poll_cap_fails_validation() {
		let mut config = AccessConfig {
			max_poll_attempts: Some(0),
			..Default::default()
		};

		assert!(matches!(
			config.validate(),
			Err(ConfigError::InvalidValue {
				key: "max_poll_attempts",
				..
			})
		));

		config.max_poll_attempts = Some(1);
		assert!(config.validate().is_ok());
	}

	#[test]
	fn invalid_url_fails_validation() {
		let config = AccessConfig {
			api_url: "not a url".to_string(),
			..Default::default()
		};

		assert!(matches!(
			config.validate(),
			Err(ConfigError::InvalidValue { key: "api_url", .. })
		));
	}
}
