//!
//! # DUOS Access
//!
//! Request infrastructure shared by every DUOS service call. A [`Client`] owns the session, the
//! transports and the diagnostics channel, and every call goes through one of its two dispatch
//! policies:
//! - strict dispatch rejects any response with a status of 400 or above;
//! - lenient dispatch hands back whatever the server answered and rejects only when no response
//!   came back at all.
//!
//! On top of that:
//! - the first 401 seen on any channel ends the session and redirects to the login entry point,
//!   exactly once;
//! - failed requests are reported to a diagnostics sink on a detached task;
//! - data repository jobs are polled to completion with [`Client::wait_for_job`].
//!

#![warn(
	clippy::all,
	clippy::pedantic,
	clippy::correctness,
	clippy::perf,
	clippy::style,
	clippy::suspicious,
	clippy::complexity,
	clippy::nursery,
	clippy::unwrap_used,
	unused_qualifications,
	rust_2018_idioms,
	trivial_casts,
	trivial_numeric_casts,
	unused_allocation,
	clippy::unnecessary_cast,
	clippy::cast_lossless,
	clippy::cast_possible_truncation,
	clippy::cast_possible_wrap,
	clippy::cast_precision_loss,
	clippy::cast_sign_loss,
	clippy::dbg_macro,
	clippy::deprecated_cfg_attr,
	clippy::separated_literal_suffix,
	deprecated
)]
#![forbid(deprecated_in_future)]
#![allow(clippy::missing_errors_doc, clippy::module_name_repetitions)]

mod busy;
mod client;
mod config;
mod error;
mod interceptor;
mod job;
mod report;
mod request;
mod response;
mod session;
mod transport;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use busy::{BusyGuard, BusyIndicator};
pub use client::{Client, ClientBuilder, Policy};
pub use config::{AccessConfig, Service, LOCAL_ENV};
pub use error::{ConfigError, Error, Result, TransportError};
pub use interceptor::{Navigator, RouteNavigator, SessionInterceptor, UNAUTHORIZED};
pub use job::{
	import_link, ExportFormat, JobHandle, JobResult, JobStatus, ParquetExport, Snapshot,
};
pub use report::{format_report, DiagnosticSink, ErrorReporter, HttpSink, TracingSink};
pub use request::{Body, Channel, DescriptorBuilder, Method, Part, RequestDescriptor};
pub use response::{Payload, RawResponse, ResponseEnvelope};
pub use session::{Credential, Session};
pub use transport::{HttpTransport, Intercepted, ResponseHook, Transport, MISSING_RESPONSE_STATUS};
