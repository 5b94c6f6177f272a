//! App builder - constructs and runs the Cerebrate application

use axum::Router;
use std::{net::SocketAddr, sync::Arc};

use crate::prelude::*;
use crate::routes;
pub use cerebrate_core::app::{Adapters, App, AppState, VERSION};
use cerebrate_core::config::Config;
use cerebrate_core::extensions::Extensions;
use cerebrate_core::flood::FloodProtection;
use cerebrate_core::request::{HttpPeerClient, PeerClient};
use cerebrate_core::settings::{SettingsRegistry, UserSettingsProvider, UserSettingsService};
use cerebrate_types::directory::{BroodRegistry, UserDirectory};
use cerebrate_types::inbox_adapter::InboxAdapter;
use cerebrate_types::setting_adapter::UserSettingAdapter;

/// Type alias for router wrappers (authentication, tracing, ...)
type RouterWrapper = Box<dyn FnOnce(Router) -> Router + Send>;

pub struct AppBuilder {
	config: Config,
	adapters: Adapters,
	peer: Option<Arc<dyn PeerClient>>,
	wrappers: Vec<RouterWrapper>,
}

impl AppBuilder {
	pub fn new() -> Self {
		// A second builder in the same process keeps the first subscriber
		let _ = tracing_subscriber::fmt()
			.with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
			.with_target(false)
			.try_init();
		AppBuilder {
			config: Config::default(),
			adapters: Adapters::default(),
			peer: None,
			wrappers: Vec::new(),
		}
	}

	// Opts
	pub fn config(&mut self, config: Config) -> &mut Self {
		self.config = config;
		self
	}

	pub fn listen(&mut self, listen: impl Into<Box<str>>) -> &mut Self {
		self.config.listen = listen.into();
		self
	}

	/// Override the outbound client used to reach peer instances
	pub fn peer_client(&mut self, peer: Arc<dyn PeerClient>) -> &mut Self {
		self.peer = Some(peer);
		self
	}

	/// Apply `f` to the finished router. Authentication middleware goes here.
	pub fn wrap_router<F>(&mut self, f: F) -> &mut Self
	where
		F: FnOnce(Router) -> Router + Send + 'static,
	{
		self.wrappers.push(Box::new(f));
		self
	}

	// Adapters
	pub fn inbox_adapter(&mut self, inbox_adapter: Arc<dyn InboxAdapter>) -> &mut Self {
		self.adapters.inbox_adapter = Some(inbox_adapter);
		self
	}

	pub fn setting_adapter(&mut self, setting_adapter: Arc<dyn UserSettingAdapter>) -> &mut Self {
		self.adapters.setting_adapter = Some(setting_adapter);
		self
	}

	pub fn user_directory(&mut self, user_directory: Arc<dyn UserDirectory>) -> &mut Self {
		self.adapters.user_directory = Some(user_directory);
		self
	}

	pub fn brood_registry(&mut self, brood_registry: Arc<dyn BroodRegistry>) -> &mut Self {
		self.adapters.brood_registry = Some(brood_registry);
		self
	}

	/// Build the shared application state
	pub fn build(&mut self) -> ClResult<App> {
		let Some(inbox_adapter) = self.adapters.inbox_adapter.clone() else {
			error!("FATAL: No inbox adapter configured");
			return Err(Error::Internal("No inbox adapter configured".to_string()));
		};
		let Some(setting_adapter) = self.adapters.setting_adapter.clone() else {
			error!("FATAL: No setting adapter configured");
			return Err(Error::Internal("No setting adapter configured".to_string()));
		};
		let Some(user_directory) = self.adapters.user_directory.clone() else {
			error!("FATAL: No user directory configured");
			return Err(Error::Internal("No user directory configured".to_string()));
		};
		let Some(brood_registry) = self.adapters.brood_registry.clone() else {
			error!("FATAL: No brood registry configured");
			return Err(Error::Internal("No brood registry configured".to_string()));
		};
		let config = self.config.clone();

		// Settings subsystem
		let mut settings_registry = SettingsRegistry::new();
		cerebrate_core::register_settings(&mut settings_registry)?;
		info!("Registered {} settings", settings_registry.len());

		let settings_provider = Arc::new(UserSettingsProvider::new(settings_registry.freeze()));
		let settings = Arc::new(UserSettingsService::new(
			settings_provider.clone(),
			setting_adapter.clone(),
			config.security.restrictions.allowed_bookmark_domains.clone(),
		));
		if !config.security.restrictions.allowed_bookmark_domains.is_empty() {
			info!(
				"Bookmarks restricted to: {}",
				config.security.restrictions.allowed_bookmark_domains.join(", ")
			);
		}

		// Outbound peer client and registration limiter
		let peer: Arc<dyn PeerClient> = match &self.peer {
			Some(peer) => peer.clone(),
			None => {
				// rustls has no default provider once several backends are linked.
				// Err means one is already installed.
				let _ = rustls::crypto::CryptoProvider::install_default(
					rustls::crypto::aws_lc_rs::default_provider(),
				);
				Arc::new(HttpPeerClient::new(config.peer.timeout())?)
			}
		};
		let flood = Arc::new(FloodProtection::new(config.security.registration.flood_protection));

		// Inbox
		let inbox = cerebrate_inbox::init(
			&config,
			inbox_adapter.clone(),
			user_directory.clone(),
			brood_registry.clone(),
			peer.clone(),
			flood.clone(),
		)?;
		info!("Inbox initialized with {} request processors", inbox.list_processors().len());

		let mut extensions = Extensions::new();
		extensions.insert(inbox);

		Ok(Arc::new(AppState {
			config,
			peer,
			flood,
			inbox_adapter,
			setting_adapter,
			user_directory,
			brood_registry,
			settings,
			settings_provider,
			extensions,
		}))
	}

	/// Build the state and the complete router, wrappers applied
	pub fn build_router(&mut self) -> ClResult<(App, Router)> {
		let app = self.build()?;
		let mut router = routes::init(app.clone());
		for wrap in self.wrappers.drain(..) {
			router = wrap(router);
		}
		Ok((app, router))
	}

	pub async fn run(mut self) -> ClResult<()> {
		info!("Cerebrate V{}", VERSION);

		let (app, router) = self.build_router()?;
		let listen = app.config.listen.clone();

		let listener = tokio::net::TcpListener::bind(listen.as_ref()).await?;
		info!("Listening on HTTP {}", listen);
		axum::serve(listener, router.into_make_service_with_connect_info::<SocketAddr>()).await?;

		Ok(())
	}
}

impl Default for AppBuilder {
	fn default() -> Self {
		Self::new()
	}
}

// vim: ts=4
