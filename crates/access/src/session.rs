use std::fmt;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Opaque bearer credential minted by the identity provider.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credential {
	pub token_type: String,
	pub access_token: String,
}

impl Credential {
	pub fn bearer(access_token: impl Into<String>) -> Self {
		Self {
			token_type: "Bearer".to_string(),
			access_token: access_token.into(),
		}
	}

	#[must_use]
	pub fn authorization(&self) -> String {
		format!("{} {}", self.token_type, self.access_token)
	}
}

impl fmt::Debug for Credential {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Credential")
			.field("token_type", &self.token_type)
			.field("access_token", &"<redacted>")
			.finish()
	}
}

#[derive(Debug, Default)]
struct State {
	credential: Option<Credential>,
	// Latched by the first invalidation, released by the next sign in
	invalidated: bool,
}

/// Session context shared by the client, its transports and the interceptor.
///
/// Every read observes the latest credential, and invalidation happens under the write lock, so
/// concurrent invalidations collapse into exactly one transition.
#[derive(Debug, Default)]
pub struct Session {
	state: RwLock<State>,
}

impl Session {
	#[must_use]
	pub fn new() -> Self {
		Self::default()
	}

	#[must_use]
	pub fn signed_in(credential: Credential) -> Self {
		let session = Self::new();
		session.sign_in(credential);
		session
	}

	pub fn sign_in(&self, credential: Credential) {
		let mut state = self.state.write();
		state.credential = Some(credential);
		state.invalidated = false;
		debug!("Session credential installed");
	}

	/// Current credential, read at dispatch time.
	#[must_use]
	pub fn credential(&self) -> Option<Credential> {
		self.state.read().credential.clone()
	}

	#[must_use]
	pub fn is_valid(&self) -> bool {
		let state = self.state.read();
		state.credential.is_some() && !state.invalidated
	}

	#[must_use]
	pub fn is_invalidated(&self) -> bool {
		self.state.read().invalidated
	}

	/// Drop the credential and latch the session as invalidated.
	///
	/// Returns `true` only for the call that performed the transition; later calls leave the state
	/// untouched until the next [`sign_in`](Self::sign_in).
	pub fn clear_session(&self) -> bool {
		let mut state = self.state.write();
		if state.invalidated {
			return false;
		}

		state.credential = None;
		state.invalidated = true;
		info!("Session cleared");

		true
	}

	/// Explicit sign out; same transition as [`clear_session`](Self::clear_session).
	pub fn sign_out(&self) -> bool {
		self.clear_session()
	}
}
