use std::{fmt, sync::Arc};

use parking_lot::RwLock;
use tokio::sync::watch;
use tracing::{debug, info};

use crate::{request::RequestDescriptor, session::Session, transport::ResponseHook};

pub const UNAUTHORIZED: u16 = 401;

/// The application's routing surface, used for the one-time redirect after session loss.
pub trait Navigator: Send + Sync {
	fn current_path(&self) -> String;

	fn navigate(&self, location: &str);
}

/// Navigator that tracks the current route and publishes redirects on a watch channel, for hosts
/// that drive their own routing.
#[derive(Debug)]
pub struct RouteNavigator {
	current: RwLock<String>,
	redirect: watch::Sender<Option<String>>,
}

impl RouteNavigator {
	pub fn new(current_path: impl Into<String>) -> Self {
		let (redirect, _) = watch::channel(None);
		Self {
			current: RwLock::new(current_path.into()),
			redirect,
		}
	}

	pub fn set_current_path(&self, path: impl Into<String>) {
		*self.current.write() = path.into();
	}

	pub fn redirects(&self) -> watch::Receiver<Option<String>> {
		self.redirect.subscribe()
	}
}

impl Navigator for RouteNavigator {
	fn current_path(&self) -> String {
		self.current.read().clone()
	}

	fn navigate(&self, location: &str) {
		info!("Redirecting to {location}");
		self.redirect.send_replace(Some(location.to_string()));
		*self.current.write() = location.to_string();
	}
}

/// Ends the session on the first 401 observed anywhere and sends the user to the login entry
/// point, once, with the current path as return target.
pub struct SessionInterceptor {
	session: Arc<Session>,
	navigator: Arc<dyn Navigator>,
	login_path: String,
}

impl SessionInterceptor {
	pub fn new(
		session: Arc<Session>,
		navigator: Arc<dyn Navigator>,
		login_path: impl Into<String>,
	) -> Self {
		Self {
			session,
			navigator,
			login_path: login_path.into(),
		}
	}

	/// Clear the session and redirect. Safe to call any number of times, concurrently: only the
	/// call that actually clears the session navigates.
	pub fn invalidate(&self) -> bool {
		if !self.session.clear_session() {
			debug!("Session already invalidated, skipping redirect");
			return false;
		}

		self.navigator.navigate(&self.login_target());

		true
	}

	#[must_use]
	pub fn login_target(&self) -> String {
		format!(
			"{}?redirectTo={}",
			self.login_path,
			self.navigator.current_path()
		)
	}

	#[must_use]
	pub fn session(&self) -> &Arc<Session> {
		&self.session
	}
}

impl fmt::Debug for SessionInterceptor {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("SessionInterceptor")
			.field("session", &self.session)
			.field("login_path", &self.login_path)
			.finish_non_exhaustive()
	}
}

impl ResponseHook for SessionInterceptor {
	fn on_response(&self, request: &RequestDescriptor, status: u16) {
		if status == UNAUTHORIZED {
			info!("Received 401 from {}, invalidating session", request.url());
			self.invalidate();
		}
	}
}
