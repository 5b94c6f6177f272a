//! Runtime configuration
//!
//! Loaded once at start-up from a YAML file. Key names follow the
//! `security.restrictions.*` / `security.registration.*` layout used by the
//! instance's admin documentation, so existing config files keep working.

use serde::{Deserialize, Deserializer};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::prelude::*;

pub const DEFAULT_CONFIG_PATH: &str = "./config.yaml";

/// Upper bound for outbound peer calls. Must stay well below the inbox claim timeout.
pub const MAX_PEER_TIMEOUT_SECS: u64 = 120;

/// How clients reach the server
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ServerMode {
	/// Direct connections, the socket peer is the client
	#[default]
	Standalone,
	/// Behind a reverse proxy that sets `X-Forwarded-For`
	Proxy,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
	pub listen: Box<str>,
	pub mode: ServerMode,
	pub db_dir: PathBuf,
	pub security: SecurityConfig,
	pub peer: PeerConfig,
}

impl Default for Config {
	fn default() -> Self {
		Self {
			listen: "127.0.0.1:8080".into(),
			mode: ServerMode::Standalone,
			db_dir: PathBuf::from("./data"),
			security: SecurityConfig::default(),
			peer: PeerConfig::default(),
		}
	}
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SecurityConfig {
	pub restrictions: RestrictionsConfig,
	pub registration: RegistrationConfig,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RestrictionsConfig {
	/// Hosts bookmarks may point to. Empty means unrestricted.
	#[serde(deserialize_with = "deserialize_domain_list")]
	pub allowed_bookmark_domains: Vec<Box<str>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RegistrationConfig {
	#[serde(rename = "self-registration")]
	pub self_registration: bool,
	#[serde(rename = "floodProtection")]
	pub flood_protection: bool,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PeerConfig {
	/// Capped at `MAX_PEER_TIMEOUT_SECS`
	pub timeout_secs: u64,
}

impl Default for PeerConfig {
	fn default() -> Self {
		Self { timeout_secs: 10 }
	}
}

impl PeerConfig {
	pub fn timeout(&self) -> Duration {
		Duration::from_secs(self.timeout_secs.clamp(1, MAX_PEER_TIMEOUT_SECS))
	}
}

/// Split a comma-separated host list, trimming blanks
pub fn parse_domain_list(s: &str) -> Vec<Box<str>> {
	s.split(',').map(str::trim).filter(|d| !d.is_empty()).map(Box::from).collect()
}

fn deserialize_domain_list<'de, D>(deserializer: D) -> Result<Vec<Box<str>>, D::Error>
where
	D: Deserializer<'de>,
{
	#[derive(Deserialize)]
	#[serde(untagged)]
	enum Repr {
		Csv(String),
		List(Vec<String>),
	}

	Ok(match Option::<Repr>::deserialize(deserializer)? {
		None => Vec::new(),
		Some(Repr::Csv(s)) => parse_domain_list(&s),
		Some(Repr::List(list)) => {
			list.iter().map(|d| d.trim()).filter(|d| !d.is_empty()).map(Box::from).collect()
		}
	})
}

impl Config {
	pub fn from_yaml(yaml: &str) -> ClResult<Self> {
		serde_yaml::from_str(yaml).map_err(|e| Error::ConfigError(format!("invalid config: {}", e)))
	}

	/// Load config from `path`. A missing file yields the defaults.
	pub fn load(path: impl AsRef<Path>) -> ClResult<Self> {
		let path = path.as_ref();
		match std::fs::read_to_string(path) {
			Ok(yaml) => {
				info!("Loading config from {}", path.display());
				Self::from_yaml(&yaml)
			}
			Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
				warn!("Config file {} not found, using defaults", path.display());
				Ok(Self::default())
			}
			Err(err) => Err(Error::Io(err)),
		}
	}

	/// Load from `CEREBRATE_CONFIG` (or the default path) and apply env overrides
	pub fn from_env() -> ClResult<Self> {
		let path = std::env::var("CEREBRATE_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_PATH.into());
		let mut config = Self::load(path)?;
		if config.peer.timeout_secs > MAX_PEER_TIMEOUT_SECS {
			warn!(
				"peer.timeout_secs {} exceeds the maximum, using {}",
				config.peer.timeout_secs, MAX_PEER_TIMEOUT_SECS
			);
		}
		if let Ok(listen) = std::env::var("LISTEN") {
			config.listen = listen.into();
		}
		if let Ok(db_dir) = std::env::var("DB_DIR") {
			config.db_dir = PathBuf::from(db_dir);
		}
		Ok(config)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_parse_domain_list() {
		let domains = parse_domain_list(" example.com, intranet.local ,,");
		assert_eq!(domains, vec![Box::from("example.com"), Box::from("intranet.local")]);
		assert!(parse_domain_list("").is_empty());
	}

	#[test]
	fn test_config_from_yaml() {
		let config = Config::from_yaml(
			"listen: 0.0.0.0:80
security:
  restrictions:
    allowed_bookmark_domains: \"example.com, a.org\"
  registration:
    self-registration: true
    floodProtection: true
peer:
  timeout_secs: 3
",
		)
		.unwrap();
		assert_eq!(config.listen.as_ref(), "0.0.0.0:80");
		assert_eq!(config.security.restrictions.allowed_bookmark_domains.len(), 2);
		assert!(config.security.registration.self_registration);
		assert!(config.security.registration.flood_protection);
		assert_eq!(config.peer.timeout(), Duration::from_secs(3));
	}

	#[test]
	fn test_config_defaults() {
		let config = Config::from_yaml("{}").unwrap();
		assert!(config.security.restrictions.allowed_bookmark_domains.is_empty());
		assert!(!config.security.registration.self_registration);
		assert_eq!(config.peer.timeout_secs, 10);
		assert_eq!(config.mode, ServerMode::Standalone);
	}

	#[test]
	fn test_peer_timeout_is_capped() {
		let config = Config::from_yaml("peer:\n  timeout_secs: 100000\n").unwrap();
		assert_eq!(config.peer.timeout(), Duration::from_secs(MAX_PEER_TIMEOUT_SECS));

		let config = Config::from_yaml("peer:\n  timeout_secs: 0\n").unwrap();
		assert_eq!(config.peer.timeout(), Duration::from_secs(1));
	}

	#[test]
	fn test_proxy_mode() {
		let config = Config::from_yaml("mode: proxy\n").unwrap();
		assert_eq!(config.mode, ServerMode::Proxy);
		assert!(Config::from_yaml("mode: sideways\n").is_err());
	}

	#[test]
	fn test_domain_list_accepts_sequence() {
		let config = Config::from_yaml(
			"security:
  restrictions:
    allowed_bookmark_domains: [\"example.com\", \" \"]
",
		)
		.unwrap();
		assert_eq!(config.security.restrictions.allowed_bookmark_domains.len(), 1);
	}
}

// vim: ts=4
