//! Settings schema provider
//!
//! Merges stored per-user values with the declared settings into the
//! hierarchical structure the settings page renders, and derives notices
//! about values that need the user's attention.

use serde::Serialize;
use serde_with::skip_serializing_none;
use std::collections::BTreeMap;

use super::types::{FrozenSettingsRegistry, SettingDefinition, SettingKind, SettingValue};
use crate::prelude::*;

/// Stored setting values of one user: name -> raw value
pub type StoredValues = BTreeMap<Box<str>, Box<str>>;

/// One declared setting together with the user's effective value
#[skip_serializing_none]
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfiguredSetting {
	pub key: Box<str>,
	pub name: Box<str>,
	pub description: Box<str>,
	pub kind: SettingKind,
	pub default: Option<SettingValue>,
	/// Stored value if it decodes, else the default
	pub value: Option<SettingValue>,
	pub is_default: bool,
	pub optional: bool,
	pub deprecated: Option<Box<str>>,
	pub internal: bool,
	/// Why the stored value was rejected
	pub error: Option<Box<str>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SettingsGroup {
	pub name: Box<str>,
	pub settings: Vec<ConfiguredSetting>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SettingsSection {
	pub name: Box<str>,
	pub groups: Vec<SettingsGroup>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SettingNotice {
	pub key: Box<str>,
	pub severity: Severity,
	pub message: Box<str>,
}

pub struct UserSettingsProvider {
	registry: FrozenSettingsRegistry,
}

impl UserSettingsProvider {
	pub fn new(registry: FrozenSettingsRegistry) -> Self {
		Self { registry }
	}

	pub fn definition(&self, key: &str) -> Option<&SettingDefinition> {
		self.registry.get(key)
	}

	pub fn definitions(&self) -> impl Iterator<Item = &SettingDefinition> {
		self.registry.list()
	}

	/// Interpret a raw stored value for `key`
	pub fn decode(&self, key: &str, raw: &str) -> ClResult<SettingValue> {
		let def = self
			.registry
			.get(key)
			.ok_or_else(|| Error::ValidationError(format!("Unknown setting: {}", key)))?;
		def.decode(raw)
	}

	fn configure(&self, def: &SettingDefinition, values: &StoredValues) -> ConfiguredSetting {
		let (value, is_default, error) = match values.get(def.key.as_str()) {
			Some(raw) => match def.decode(raw) {
				Ok(value) => (Some(value), false, None),
				Err(err) => (def.default.clone(), true, Some(err.to_string().into())),
			},
			None => (def.default.clone(), true, None),
		};

		ConfiguredSetting {
			key: def.key.as_str().into(),
			name: def.name.as_str().into(),
			description: def.description.as_str().into(),
			kind: def.kind.clone(),
			default: def.default.clone(),
			value,
			is_default,
			optional: def.optional,
			deprecated: def.deprecated.as_deref().map(Box::from),
			internal: def.internal,
			error,
		}
	}

	/// Sections and groups in declaration order, each setting carrying its effective value
	pub fn get_settings_configuration(&self, values: &StoredValues) -> Vec<SettingsSection> {
		let mut sections: Vec<SettingsSection> = Vec::new();

		for def in self.registry.list() {
			let configured = self.configure(def, values);

			let section = match sections.iter().position(|s| *s.name == *def.section) {
				Some(idx) => &mut sections[idx],
				None => {
					sections.push(SettingsSection { name: def.section.as_str().into(), groups: Vec::new() });
					let last = sections.len() - 1;
					&mut sections[last]
				}
			};

			match section.groups.iter_mut().find(|g| *g.name == *def.group) {
				Some(group) => group.settings.push(configured),
				None => section.groups.push(SettingsGroup {
					name: def.group.as_str().into(),
					settings: vec![configured],
				}),
			}
		}

		sections
	}

	/// Key -> setting view of a configuration
	pub fn flatten_settings_configuration(
		&self,
		config: &[SettingsSection],
	) -> BTreeMap<Box<str>, ConfiguredSetting> {
		config
			.iter()
			.flat_map(|section| section.groups.iter())
			.flat_map(|group| group.settings.iter())
			.map(|setting| (setting.key.clone(), setting.clone()))
			.collect()
	}

	pub fn get_notices_from_settings_configuration(
		&self,
		config: &[SettingsSection],
		values: &StoredValues,
	) -> Vec<SettingNotice> {
		let mut notices = Vec::new();

		let settings = config.iter().flat_map(|s| s.groups.iter()).flat_map(|g| g.settings.iter());
		for setting in settings {
			let stored = values.contains_key(&setting.key);

			if let Some(error) = &setting.error {
				notices.push(SettingNotice {
					key: setting.key.clone(),
					severity: Severity::Danger,
					message: format!("Stored value is invalid and was ignored: {}", error).into(),
				});
			}
			if let (true, Some(note)) = (stored, &setting.deprecated) {
				notices.push(SettingNotice {
					key: setting.key.clone(),
					severity: Severity::Warning,
					message: format!("This setting is deprecated. {}", note).into(),
				});
			}
			if setting.value.is_none() && !setting.optional {
				notices.push(SettingNotice {
					key: setting.key.clone(),
					severity: Severity::Warning,
					message: "This setting has no default and should be configured".into(),
				});
			}
		}

		for key in values.keys() {
			if self.registry.get(key).is_none() {
				notices.push(SettingNotice {
					key: key.clone(),
					severity: Severity::Warning,
					message: "Stored setting is not recognised and has no effect".into(),
				});
			}
		}

		notices
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::settings::types::{SettingDefinition, SettingsRegistry};

	fn provider() -> UserSettingsProvider {
		let mut registry = SettingsRegistry::new();
		let defs = [
			SettingDefinition::builder("ui.theme")
				.description("Theme")
				.location("Appearance", "Theme")
				.kind(SettingKind::Select { options: vec!["light".into(), "dark".into()] })
				.default(SettingValue::String("light".into())),
			SettingDefinition::builder("ui.sidebar.expanded")
				.description("Expanded sidebar")
				.location("Appearance", "Sidebar")
				.kind(SettingKind::Boolean)
				.default(SettingValue::Bool(true)),
			SettingDefinition::builder("ui.sidebar.legacy")
				.description("Old flag")
				.location("Appearance", "Sidebar")
				.kind(SettingKind::Boolean)
				.default(SettingValue::Bool(false))
				.deprecated("Use ui.sidebar.expanded"),
			SettingDefinition::builder("notify.email")
				.description("Notification address")
				.location("Notifications", "Email"),
		];
		for def in defs {
			registry.register(def.build().unwrap()).unwrap();
		}
		UserSettingsProvider::new(registry.freeze())
	}

	fn values(pairs: &[(&str, &str)]) -> StoredValues {
		pairs.iter().map(|(k, v)| (Box::from(*k), Box::from(*v))).collect()
	}

	#[test]
	fn test_configuration_hierarchy() {
		let config = provider().get_settings_configuration(&StoredValues::new());
		let names: Vec<&str> = config.iter().map(|s| s.name.as_ref()).collect();
		assert_eq!(names, vec!["Appearance", "Notifications"]);
		assert_eq!(config[0].groups.len(), 2);
		assert_eq!(config[0].groups[1].settings.len(), 2);
	}

	#[test]
	fn test_stored_value_overrides_default() {
		let p = provider();
		let config = p.get_settings_configuration(&values(&[("ui.theme", "dark")]));
		let flat = p.flatten_settings_configuration(&config);
		let theme = &flat["ui.theme"];
		assert_eq!(theme.value, Some(SettingValue::String("dark".into())));
		assert!(!theme.is_default);
		assert!(flat["ui.sidebar.expanded"].is_default);
	}

	#[test]
	fn test_notices() {
		let p = provider();
		let stored = values(&[("ui.theme", "neon"), ("ui.sidebar.legacy", "true"), ("ui.gone", "1")]);
		let config = p.get_settings_configuration(&stored);
		let notices = p.get_notices_from_settings_configuration(&config, &stored);

		let find = |key: &str| notices.iter().find(|n| n.key.as_ref() == key);
		assert_eq!(find("ui.theme").map(|n| n.severity), Some(Severity::Danger));
		assert_eq!(find("ui.sidebar.legacy").map(|n| n.severity), Some(Severity::Warning));
		assert_eq!(find("notify.email").map(|n| n.severity), Some(Severity::Warning));
		assert_eq!(find("ui.gone").map(|n| n.severity), Some(Severity::Warning));
		assert!(find("ui.sidebar.expanded").is_none());
	}

	#[test]
	fn test_decode_unknown_key() {
		assert!(matches!(provider().decode("nope", "1"), Err(Error::ValidationError(_))));
	}
}

// vim: ts=4
