//! Shared types, adapter traits, and core utilities for Cerebrate.
//!
//! The adapter traits declared here are the only way the feature crates reach
//! persistent storage. Keeping them in a separate crate lets storage adapters
//! compile in parallel with the feature crates.

pub mod directory;
pub mod error;
pub mod inbox_adapter;
pub mod prelude;
pub mod setting_adapter;
pub mod types;

// vim: ts=4
