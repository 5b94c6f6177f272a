//! Built-in request processors
//!
//! - data_exchange: Synchronisation/DataExchange, a peer asks to exchange a record
//! - registration: User/Registration, self-registration of an account

pub mod data_exchange;
pub mod registration;

use std::sync::Arc;

use cerebrate_core::config::Config;
use cerebrate_core::flood::FloodProtection;
use cerebrate_core::request::PeerClient;

use crate::prelude::*;
use crate::processor::ProcessorRegistry;

/// Register every built-in processor
pub fn register_processors(
	registry: &mut ProcessorRegistry,
	config: &Config,
	peer: Arc<dyn PeerClient>,
	flood: Arc<FloodProtection>,
) -> ClResult<()> {
	registry.register(Arc::new(data_exchange::DataExchangeProcessor::new(peer)))?;
	registry.register(Arc::new(registration::RegistrationProcessor::new(
		config.security.registration.self_registration,
		flood,
	)))?;
	Ok(())
}

// vim: ts=4
