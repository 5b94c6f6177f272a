//! User interface settings registration

use crate::prelude::*;
use crate::settings::{
	SettingDefinition, SettingKind, SettingValue, SettingsRegistry, BOOKMARK_SETTING_NAME,
};

pub const THEMES: &[&str] =
	&["default", "darkly", "flatly", "minty", "pulse", "superhero", "vapor"];

/// Register all user settings
pub fn register_settings(registry: &mut SettingsRegistry) -> ClResult<()> {
	registry.register(
		SettingDefinition::builder("ui.bsTheme")
			.name("Theme")
			.description("Colour theme of the user interface")
			.location("Appearance", "Theme")
			.kind(SettingKind::Select { options: THEMES.iter().map(|t| Box::from(*t)).collect() })
			.default(SettingValue::String("default".into()))
			.build()?,
	)?;

	registry.register(
		SettingDefinition::builder("ui.sidebar.expanded")
			.name("Expanded sidebar")
			.description("Show the sidebar expanded by default")
			.location("Appearance", "Sidebar")
			.kind(SettingKind::Boolean)
			.default(SettingValue::Bool(true))
			.build()?,
	)?;

	registry.register(
		SettingDefinition::builder("ui.sidebar.include_bookmarks")
			.name("Show bookmarks")
			.description("List your bookmarks in the sidebar")
			.location("Appearance", "Sidebar")
			.kind(SettingKind::Boolean)
			.default(SettingValue::Bool(false))
			.build()?,
	)?;

	registry.register(
		SettingDefinition::builder("ui.sidebar.hide_default_bookmarks")
			.name("Hide default bookmarks")
			.description("Hide the bookmarks provided by the instance")
			.location("Appearance", "Sidebar")
			.kind(SettingKind::Boolean)
			.default(SettingValue::Bool(false))
			.deprecated("Instance bookmarks are now always shown below your own.")
			.build()?,
	)?;

	registry.register(
		SettingDefinition::builder("ui.table.page_size")
			.name("Rows per page")
			.description("Number of rows shown per page in tables")
			.location("Appearance", "Tables")
			.kind(SettingKind::Integer { min: Some(10), max: Some(500) })
			.default(SettingValue::Int(20))
			.build()?,
	)?;

	registry.register(
		SettingDefinition::builder(BOOKMARK_SETTING_NAME)
			.name("Bookmarks")
			.description("Your bookmarked pages")
			.location("Bookmarks", "Bookmarks")
			.kind(SettingKind::Json)
			.default(SettingValue::Json(serde_json::Value::Array(Vec::new())))
			.internal(true)
			.validator(|value| match value {
				SettingValue::Json(serde_json::Value::Array(_) | serde_json::Value::Object(_)) => {
					Ok(())
				}
				_ => Err(Error::InvalidFormat("Bookmarks must be a list".into())),
			})
			.build()?,
	)?;

	Ok(())
}


// vim: ts=4
