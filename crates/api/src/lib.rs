//! Resource facades for the DUOS services.
//!
//! Each call builds one request and hands it to a [`duos_access::Client`], which owns dispatch
//! policy, session handling and error reporting. Calls are grouped per resource and invoked as
//! `resource::operation(&client, ...)`.

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
	clippy::dbg_macro,
	deprecated
)]
#![forbid(deprecated_in_future)]
#![allow(clippy::missing_errors_doc, clippy::module_name_repetitions)]

use duos_access::{Client, RequestDescriptor, Result, Service};

pub mod dac;
pub mod dataset;
pub mod ontology;
pub mod support;
pub mod tdr;

/// Core API url for `path`.
fn api_url(client: &Client, path: &str) -> Result<String> {
	client.url(Service::Api, path)
}

/// Strict dispatch returning only the response status, for calls whose body carries nothing.
async fn status_of(client: &Client, request: RequestDescriptor) -> Result<u16> {
	Ok(client.request_strict(request).await?.status())
}
