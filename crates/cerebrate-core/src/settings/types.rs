//! Settings types and definitions
//!
//! A setting is declared once at start-up with its kind, default and display
//! metadata. Stored values are opaque strings; the declared kind decides how a
//! stored string is interpreted.

use serde::{Deserialize, Serialize};
use serde_with::skip_serializing_none;
use std::collections::HashMap;
use std::fmt::Debug;

use crate::prelude::*;

/// Type alias for setting validator function
pub type SettingValidator = Box<dyn Fn(&SettingValue) -> ClResult<()> + Send + Sync>;

/// Decoded setting value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)] // No type tag - type inferred from SettingDefinition
pub enum SettingValue {
	Bool(bool), // Must be before Int to avoid bool -> int coercion
	Int(i64),
	String(String),
	Json(serde_json::Value),
}

impl SettingValue {
	/// Get the type name for error messages
	pub fn type_name(&self) -> &'static str {
		match self {
			SettingValue::String(_) => "string",
			SettingValue::Int(_) => "int",
			SettingValue::Bool(_) => "bool",
			SettingValue::Json(_) => "json",
		}
	}

	/// Encode into the opaque string stored in the database
	pub fn encode(&self) -> String {
		match self {
			SettingValue::Bool(b) => b.to_string(),
			SettingValue::Int(i) => i.to_string(),
			SettingValue::String(s) => s.clone(),
			SettingValue::Json(j) => j.to_string(),
		}
	}
}

/// How a stored string is interpreted
#[skip_serializing_none]
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum SettingKind {
	Boolean,
	Integer { min: Option<i64>, max: Option<i64> },
	String,
	Select { options: Vec<Box<str>> },
	Json,
}

impl SettingKind {
	pub fn is_json(&self) -> bool {
		matches!(self, SettingKind::Json)
	}

	/// Interpret a stored string. Returns a user-facing message on failure.
	pub fn decode(&self, raw: &str) -> Result<SettingValue, String> {
		match self {
			SettingKind::Boolean => match raw.trim() {
				"true" | "1" | "on" => Ok(SettingValue::Bool(true)),
				"false" | "0" | "off" | "" => Ok(SettingValue::Bool(false)),
				other => Err(format!("`{}` is not a boolean", other)),
			},
			SettingKind::Integer { min, max } => {
				let n: i64 =
					raw.trim().parse().map_err(|_| format!("`{}` is not an integer", raw))?;
				if let Some(min) = min {
					if n < *min {
						return Err(format!("Value must be at least {}", min));
					}
				}
				if let Some(max) = max {
					if n > *max {
						return Err(format!("Value must be at most {}", max));
					}
				}
				Ok(SettingValue::Int(n))
			}
			SettingKind::String => Ok(SettingValue::String(raw.to_string())),
			SettingKind::Select { options } => {
				if options.iter().any(|o| o.as_ref() == raw) {
					Ok(SettingValue::String(raw.to_string()))
				} else {
					Err(format!("`{}` is not one of: {}", raw, options.join(", ")))
				}
			}
			SettingKind::Json => serde_json::from_str(raw)
				.map(SettingValue::Json)
				.map_err(|_| "Invalid JSON data".to_string()),
		}
	}

	/// Check that a typed default fits this kind
	fn accepts(&self, value: &SettingValue) -> bool {
		match (self, value) {
			(SettingKind::Boolean, SettingValue::Bool(_))
			| (SettingKind::Json, SettingValue::Json(_))
			| (SettingKind::String, SettingValue::String(_)) => true,
			(SettingKind::Integer { .. }, SettingValue::Int(_)) => {
				self.decode(&value.encode()).is_ok()
			}
			(SettingKind::Select { options }, SettingValue::String(s)) => {
				options.iter().any(|o| o.as_ref() == s)
			}
			_ => false,
		}
	}
}

/// Setting definition - defines metadata for each setting
pub struct SettingDefinition {
	/// Dot-separated key (e.g., "ui.sidebar.expanded")
	pub key: String,

	/// Short label shown next to the input
	pub name: String,

	/// Human-readable description
	pub description: String,

	/// Top-level section of the settings page (e.g., "Appearance")
	pub section: String,

	/// Panel inside the section (e.g., "Sidebar")
	pub group: String,

	pub kind: SettingKind,

	/// Optional default value
	/// If None and optional=false, the user is warned until a value is stored
	pub default: Option<SettingValue>,

	/// Whether this setting may stay unconfigured without a notice
	pub optional: bool,

	/// Deprecation note shown as a notice while a value is stored
	pub deprecated: Option<String>,

	/// Managed by dedicated operations (e.g. bookmarks) rather than the generic editor
	pub internal: bool,

	/// Optional validation function, run after the kind decoded the value
	pub validator: Option<SettingValidator>,
}

impl Debug for SettingDefinition {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("SettingDefinition")
			.field("key", &self.key)
			.field("name", &self.name)
			.field("section", &self.section)
			.field("group", &self.group)
			.field("kind", &self.kind)
			.field("default", &self.default)
			.field("optional", &self.optional)
			.field("deprecated", &self.deprecated)
			.field("internal", &self.internal)
			.field("validator", &self.validator.is_some())
			.finish()
	}
}

impl SettingDefinition {
	/// Create a builder for constructing a SettingDefinition
	pub fn builder(key: impl Into<String>) -> SettingDefinitionBuilder {
		SettingDefinitionBuilder::new(key)
	}

	/// Decode a stored string and run the custom validator
	pub fn decode(&self, raw: &str) -> ClResult<SettingValue> {
		let value = self.kind.decode(raw).map_err(|msg| {
			if self.kind.is_json() {
				Error::InvalidFormat(msg)
			} else {
				Error::ValidationError(format!("Setting '{}': {}", self.key, msg))
			}
		})?;
		if let Some(validator) = &self.validator {
			validator(&value)?;
		}
		Ok(value)
	}
}

/// Builder for SettingDefinition with fluent API
pub struct SettingDefinitionBuilder {
	key: String,
	name: Option<String>,
	description: Option<String>,
	section: String,
	group: String,
	kind: SettingKind,
	default: Option<SettingValue>,
	optional: bool,
	deprecated: Option<String>,
	internal: bool,
	validator: Option<SettingValidator>,
}

impl SettingDefinitionBuilder {
	pub fn new(key: impl Into<String>) -> Self {
		Self {
			key: key.into(),
			name: None,
			description: None,
			section: "General".into(),
			group: "General".into(),
			kind: SettingKind::String,
			default: None,
			optional: false,
			deprecated: None,
			internal: false,
			validator: None,
		}
	}

	/// Set the display label (defaults to the key)
	pub fn name(mut self, name: impl Into<String>) -> Self {
		self.name = Some(name.into());
		self
	}

	/// Set the description (required)
	pub fn description(mut self, description: impl Into<String>) -> Self {
		self.description = Some(description.into());
		self
	}

	/// Place the setting in a section and group of the settings page
	pub fn location(mut self, section: impl Into<String>, group: impl Into<String>) -> Self {
		self.section = section.into();
		self.group = group.into();
		self
	}

	pub fn kind(mut self, kind: SettingKind) -> Self {
		self.kind = kind;
		self
	}

	pub fn default(mut self, value: SettingValue) -> Self {
		self.default = Some(value);
		self
	}

	pub fn optional(mut self, optional: bool) -> Self {
		self.optional = optional;
		self
	}

	pub fn deprecated(mut self, note: impl Into<String>) -> Self {
		self.deprecated = Some(note.into());
		self
	}

	pub fn internal(mut self, internal: bool) -> Self {
		self.internal = internal;
		self
	}

	/// Set a validation function
	pub fn validator<F>(mut self, f: F) -> Self
	where
		F: Fn(&SettingValue) -> ClResult<()> + Send + Sync + 'static,
	{
		self.validator = Some(Box::new(f));
		self
	}

	/// Build the SettingDefinition
	pub fn build(self) -> ClResult<SettingDefinition> {
		let description = self
			.description
			.ok_or_else(|| Error::ConfigError("Setting description is required".into()))?;

		if let Some(default) = &self.default {
			if !self.kind.accepts(default) {
				return Err(Error::ConfigError(format!(
					"Default value of setting '{}' ({}) does not match its kind",
					self.key,
					default.type_name()
				)));
			}
		}

		if let SettingKind::Select { options } = &self.kind {
			if options.is_empty() {
				return Err(Error::ConfigError(format!(
					"Select setting '{}' has no options",
					self.key
				)));
			}
		}

		Ok(SettingDefinition {
			name: self.name.unwrap_or_else(|| self.key.clone()),
			key: self.key,
			description,
			section: self.section,
			group: self.group,
			kind: self.kind,
			default: self.default,
			optional: self.optional,
			deprecated: self.deprecated,
			internal: self.internal,
			validator: self.validator,
		})
	}
}

/// Mutable registry used during app initialization
pub struct SettingsRegistry {
	definitions: HashMap<String, SettingDefinition>,
	order: Vec<String>,
}

impl SettingsRegistry {
	pub fn new() -> Self {
		Self { definitions: HashMap::new(), order: Vec::new() }
	}

	/// Register a new setting definition
	pub fn register(&mut self, def: SettingDefinition) -> ClResult<()> {
		if self.definitions.contains_key(&def.key) {
			return Err(Error::ConfigError(format!("Setting '{}' is already registered", def.key)));
		}

		tracing::debug!("Registering setting: {}", def.key);
		self.order.push(def.key.clone());
		self.definitions.insert(def.key.clone(), def);
		Ok(())
	}

	/// Freeze the registry (make it immutable)
	pub fn freeze(self) -> FrozenSettingsRegistry {
		tracing::info!("Freezing settings registry with {} definitions", self.definitions.len());
		FrozenSettingsRegistry { definitions: self.definitions, order: self.order }
	}

	pub fn len(&self) -> usize {
		self.definitions.len()
	}

	pub fn is_empty(&self) -> bool {
		self.definitions.is_empty()
	}
}

impl Default for SettingsRegistry {
	fn default() -> Self {
		Self::new()
	}
}

/// Immutable registry, shared read-only by every request
pub struct FrozenSettingsRegistry {
	definitions: HashMap<String, SettingDefinition>,
	order: Vec<String>,
}

impl FrozenSettingsRegistry {
	/// Get a setting definition by key
	/// First tries exact match, then tries wildcard pattern "<first_element>.*"
	pub fn get(&self, key: &str) -> Option<&SettingDefinition> {
		if let Some(def) = self.definitions.get(key) {
			return Some(def);
		}

		if let Some(dot_pos) = key.find('.') {
			let wildcard_key = format!("{}.*", &key[..dot_pos]);
			if let Some(def) = self.definitions.get(&wildcard_key) {
				return Some(def);
			}
		}

		None
	}

	/// List all registered settings in registration order
	pub fn list(&self) -> impl Iterator<Item = &SettingDefinition> {
		self.order.iter().filter_map(|key| self.definitions.get(key))
	}

	pub fn len(&self) -> usize {
		self.definitions.len()
	}

	pub fn is_empty(&self) -> bool {
		self.definitions.is_empty()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_boolean_decode() {
		let kind = SettingKind::Boolean;
		assert_eq!(kind.decode("true"), Ok(SettingValue::Bool(true)));
		assert_eq!(kind.decode("0"), Ok(SettingValue::Bool(false)));
		assert!(kind.decode("maybe").is_err());
	}

	#[test]
	fn test_integer_range() {
		let kind = SettingKind::Integer { min: Some(10), max: Some(500) };
		assert_eq!(kind.decode("20"), Ok(SettingValue::Int(20)));
		assert!(kind.decode("5").is_err());
		assert!(kind.decode("501").is_err());
		assert!(kind.decode("abc").is_err());
	}

	#[test]
	fn test_select_decode() {
		let kind = SettingKind::Select { options: vec!["default".into(), "darkly".into()] };
		assert_eq!(kind.decode("darkly"), Ok(SettingValue::String("darkly".into())));
		assert!(kind.decode("neon").is_err());
	}

	#[test]
	fn test_json_decode_error_is_invalid_format() {
		let def = SettingDefinition::builder("ui.bookmarks")
			.description("Bookmarks")
			.kind(SettingKind::Json)
			.build()
			.unwrap();
		assert!(matches!(def.decode("{not json"), Err(Error::InvalidFormat(_))));
		assert!(def.decode("[]").is_ok());
	}

	#[test]
	fn test_builder_requires_description() {
		let res = SettingDefinition::builder("ui.x").build();
		assert!(matches!(res, Err(Error::ConfigError(_))));
	}

	#[test]
	fn test_builder_rejects_mismatched_default() {
		let res = SettingDefinition::builder("ui.x")
			.description("x")
			.kind(SettingKind::Boolean)
			.default(SettingValue::Int(3))
			.build();
		assert!(matches!(res, Err(Error::ConfigError(_))));
	}

	#[test]
	fn test_registry_rejects_duplicates_and_keeps_order() {
		let mut registry = SettingsRegistry::new();
		for key in ["b.one", "a.two"] {
			registry
				.register(SettingDefinition::builder(key).description(key).build().unwrap())
				.unwrap();
		}
		let dup = SettingDefinition::builder("b.one").description("dup").build().unwrap();
		assert!(registry.register(dup).is_err());

		let frozen = registry.freeze();
		let keys: Vec<&str> = frozen.list().map(|d| d.key.as_str()).collect();
		assert_eq!(keys, vec!["b.one", "a.two"]);
	}

	#[test]
	fn test_wildcard_lookup() {
		let mut registry = SettingsRegistry::new();
		registry
			.register(SettingDefinition::builder("app.*").description("apps").build().unwrap())
			.unwrap();
		let frozen = registry.freeze();
		assert!(frozen.get("app.calendar.view").is_some());
		assert!(frozen.get("ui.calendar").is_none());
	}
}

// vim: ts=4
