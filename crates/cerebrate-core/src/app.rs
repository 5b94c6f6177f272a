//! App state type

use std::sync::Arc;

use crate::config::Config;
use crate::extensions::Extensions;
use crate::flood::FloodProtection;
use crate::prelude::*;
use crate::request::PeerClient;
use crate::settings::provider::UserSettingsProvider;
use crate::settings::service::UserSettingsService;

use cerebrate_types::directory::{BroodRegistry, UserDirectory};
use cerebrate_types::inbox_adapter::InboxAdapter;
use cerebrate_types::setting_adapter::UserSettingAdapter;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub struct AppState {
	pub config: Config,
	pub peer: Arc<dyn PeerClient>,
	pub flood: Arc<FloodProtection>,

	pub inbox_adapter: Arc<dyn InboxAdapter>,
	pub setting_adapter: Arc<dyn UserSettingAdapter>,
	pub user_directory: Arc<dyn UserDirectory>,
	pub brood_registry: Arc<dyn BroodRegistry>,

	// Settings subsystem
	pub settings: Arc<UserSettingsService>,
	pub settings_provider: Arc<UserSettingsProvider>,

	// Type-erased extension map for feature-specific state
	pub extensions: Extensions,
}

impl AppState {
	/// Get a registered extension by type. Returns error if not found.
	pub fn ext<T: Send + Sync + 'static>(&self) -> ClResult<&T> {
		self.extensions.get::<T>().ok_or_else(|| {
			Error::Internal(format!("Extension {} not registered", std::any::type_name::<T>()))
		})
	}
}

pub type App = Arc<AppState>;

#[derive(Default)]
pub struct Adapters {
	pub inbox_adapter: Option<Arc<dyn InboxAdapter>>,
	pub setting_adapter: Option<Arc<dyn UserSettingAdapter>>,
	pub user_directory: Option<Arc<dyn UserDirectory>>,
	pub brood_registry: Option<Arc<dyn BroodRegistry>>,
}

// vim: ts=4
