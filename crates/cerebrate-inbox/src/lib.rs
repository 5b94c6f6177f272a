//! Inbox subsystem for Cerebrate.
//!
//! Peer instances and anonymous visitors submit requests (data exchanges,
//! account registrations). Each request kind is handled by a processor keyed by
//! (scope, action); accepted requests trigger the processor's side effect,
//! unresolved ones show up as notifications for the users who may resolve them.

#![deny(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![forbid(unsafe_code)]

pub mod handler;
pub mod notification;
pub mod prelude;
pub mod processor;
pub mod processors;
pub mod service;
pub mod store;

use std::sync::Arc;

use cerebrate_core::config::Config;
use cerebrate_core::flood::FloodProtection;
use cerebrate_core::request::PeerClient;
use cerebrate_types::directory::{BroodRegistry, UserDirectory};
use cerebrate_types::inbox_adapter::InboxAdapter;

pub use processor::{ActionResult, InboxRequest, ProcessorRegistry, RequestProcessor, Submitter};
pub use service::Inbox;
pub use store::InboxStore;

use crate::prelude::*;

/// Build the inbox with every built-in processor registered
pub fn init(
	config: &Config,
	adapter: Arc<dyn InboxAdapter>,
	users: Arc<dyn UserDirectory>,
	broods: Arc<dyn BroodRegistry>,
	peer: Arc<dyn PeerClient>,
	flood: Arc<FloodProtection>,
) -> ClResult<Inbox> {
	let mut registry = ProcessorRegistry::new();
	processors::register_processors(&mut registry, config, peer, flood)?;
	Ok(Inbox::new(InboxStore::new(adapter, users, broods), registry))
}

// vim: ts=4
