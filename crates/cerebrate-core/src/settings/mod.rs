//! Per-user settings subsystem
//!
//! # Architecture
//!
//! - **Types** (`types.rs`): setting definitions, kinds, and the registry
//! - **Provider** (`provider.rs`): merges stored values with the declared schema
//! - **Service** (`service.rs`): validated reads/writes and the bookmark editor
//! - **Handler** (`handler.rs`): HTTP API endpoints
//!
//! Values are stored as opaque strings per (user, name). The declared kind of
//! a setting decides how the string is read back; structured settings such as
//! the bookmark list hold JSON text.

pub mod handler;
pub mod provider;
pub mod service;
pub mod types;

pub use provider::{SettingNotice, UserSettingsProvider};
pub use service::{Bookmark, UserSettingsBundle, UserSettingsService, BOOKMARK_SETTING_NAME};
pub use types::{
	FrozenSettingsRegistry, SettingDefinition, SettingDefinitionBuilder, SettingKind, SettingValue,
	SettingsRegistry,
};

// vim: ts=4
