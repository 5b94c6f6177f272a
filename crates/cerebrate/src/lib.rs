//! Cerebrate instance manager.
//!
//! Wires the inbox and user settings subsystems to their storage adapters and
//! serves them over HTTP. Authentication is expected to happen in front of the
//! router: a layer added through [`AppBuilder::wrap_router`] places an
//! [`Auth`](cerebrate_core::extract::Auth) into the request extensions.

#![deny(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![forbid(unsafe_code)]

pub use cerebrate_core::settings;
pub use cerebrate_inbox as inbox;
pub use cerebrate_types::{directory, error, inbox_adapter, setting_adapter, types};

pub mod app;
pub mod middleware;
pub mod prelude;
pub mod routes;

pub use crate::app::{App, AppBuilder};

// vim: ts=4
