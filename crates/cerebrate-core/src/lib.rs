//! Core infrastructure for Cerebrate.
//!
//! Holds the application state shared by the feature crates, the runtime
//! configuration, request extractors, the outbound peer client, and the
//! per-user settings subsystem.

#![deny(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![forbid(unsafe_code)]

pub mod app;
pub mod config;
pub mod extensions;
pub mod extract;
pub mod flood;
pub mod prelude;
pub mod request;
pub mod settings;
pub mod user_settings;

pub use app::{Adapters, App, AppState};
pub use config::Config;
pub use extract::{Auth, OptionalRequestId};

pub fn register_settings(
	registry: &mut settings::SettingsRegistry,
) -> cerebrate_types::error::ClResult<()> {
	user_settings::register_settings(registry)
}

// vim: ts=4
