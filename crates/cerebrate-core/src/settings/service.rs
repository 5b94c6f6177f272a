//! Per-user settings store with schema validation and the bookmark editor

use serde::{Deserialize, Serialize};
use serde_with::skip_serializing_none;
use std::collections::BTreeMap;
use std::sync::Arc;

use cerebrate_types::directory::User;
use cerebrate_types::setting_adapter::{UserSetting, UserSettingAdapter};

use super::provider::{
	ConfiguredSetting, SettingNotice, SettingsSection, StoredValues, UserSettingsProvider,
};
use super::types::SettingValue;
use crate::prelude::*;

pub const BOOKMARK_SETTING_NAME: &str = "ui.bookmarks";

/// Read-modify-write attempts before a bookmark edit gives up with `Error::Conflict`
const BOOKMARK_WRITE_ATTEMPTS: usize = 5;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bookmark {
	#[serde(default)]
	pub label: Box<str>,
	#[serde(default)]
	pub name: Box<str>,
	pub url: Box<str>,
}

/// Bookmark as submitted by the settings page
#[derive(Debug, Clone, Deserialize)]
pub struct BookmarkRequest {
	#[serde(default)]
	pub bookmark_label: Box<str>,
	pub bookmark_name: Box<str>,
	pub bookmark_url: Box<str>,
}

impl From<BookmarkRequest> for Bookmark {
	fn from(req: BookmarkRequest) -> Self {
		Bookmark { label: req.bookmark_label, name: req.bookmark_name, url: req.bookmark_url }
	}
}

/// Merged view of a user's settings
#[skip_serializing_none]
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSettingsBundle {
	/// name -> stored raw value
	pub settings: StoredValues,
	pub settings_provider: Option<Vec<SettingsSection>>,
	pub settings_flattened: Option<BTreeMap<Box<str>, ConfiguredSetting>>,
	pub notices: Option<Vec<SettingNotice>>,
}

/// `true` for a local path or an absolute http(s) URL
pub fn valid_uri(uri: &str) -> bool {
	match url::Url::parse(uri) {
		Ok(url) => matches!(url.scheme(), "http" | "https") && url.host_str().is_some(),
		Err(url::ParseError::RelativeUrlWithoutBase) => {
			if uri.trim().is_empty()
				|| uri.starts_with("//")
				|| uri.chars().any(|c| c.is_whitespace() || c.is_control())
			{
				return false;
			}
			url::Url::parse("http://localhost/")
				.and_then(|base| base.join(uri))
				.is_ok()
		}
		Err(_) => false,
	}
}

/// Decode a stored bookmark list; a single object counts as a one-element list
pub fn decode_bookmarks(raw: &str) -> ClResult<Vec<Bookmark>> {
	if raw.trim().is_empty() {
		return Ok(Vec::new());
	}
	let value: serde_json::Value =
		serde_json::from_str(raw).map_err(|_| Error::InvalidFormat("Invalid JSON data".into()))?;
	let list = match value {
		serde_json::Value::Null => return Ok(Vec::new()),
		serde_json::Value::Array(_) => value,
		serde_json::Value::Object(_) => serde_json::Value::Array(vec![value]),
		_ => return Err(Error::InvalidFormat("Bookmarks must be a list".into())),
	};
	serde_json::from_value(list).map_err(|e| Error::InvalidFormat(format!("Invalid bookmark: {}", e)))
}

fn encode_bookmarks(bookmarks: &[Bookmark]) -> ClResult<String> {
	Ok(serde_json::to_string(bookmarks)?)
}

pub struct UserSettingsService {
	provider: Arc<UserSettingsProvider>,
	adapter: Arc<dyn UserSettingAdapter>,
	allowed_bookmark_domains: Vec<Box<str>>,
}

impl UserSettingsService {
	pub fn new(
		provider: Arc<UserSettingsProvider>,
		adapter: Arc<dyn UserSettingAdapter>,
		allowed_bookmark_domains: Vec<Box<str>>,
	) -> Self {
		Self { provider, adapter, allowed_bookmark_domains }
	}

	pub fn provider(&self) -> &UserSettingsProvider {
		&self.provider
	}

	/// Admins may act on anyone's settings, other users only on their own
	pub fn authorize(&self, actor: &User, user_id: UserId) -> ClResult<()> {
		if actor.id == user_id || actor.is_admin() {
			Ok(())
		} else {
			warn!("User {} tried to access settings of user {}", actor.id, user_id);
			Err(Error::PermissionDenied)
		}
	}

	pub async fn get_settings_for_user(&self, user_id: UserId) -> ClResult<Vec<UserSetting>> {
		self.adapter.list_user_settings(user_id).await
	}

	pub async fn get_setting_by_name(
		&self,
		user_id: UserId,
		name: &str,
	) -> ClResult<Option<UserSetting>> {
		self.adapter.read_user_setting(user_id, name).await
	}

	pub async fn get_settings_from_provider_for_user(
		&self,
		user_id: UserId,
		full: bool,
	) -> ClResult<UserSettingsBundle> {
		let settings: StoredValues = self
			.adapter
			.list_user_settings(user_id)
			.await?
			.into_iter()
			.map(|s| (s.name, s.value))
			.collect();

		if !full {
			return Ok(UserSettingsBundle {
				settings,
				settings_provider: None,
				settings_flattened: None,
				notices: None,
			});
		}

		let config = self.provider.get_settings_configuration(&settings);
		let flattened = self.provider.flatten_settings_configuration(&config);
		let notices = self.provider.get_notices_from_settings_configuration(&config, &settings);
		Ok(UserSettingsBundle {
			settings,
			settings_provider: Some(config),
			settings_flattened: Some(flattened),
			notices: Some(notices),
		})
	}

	fn domain_allowed(&self, uri: &str) -> bool {
		if self.allowed_bookmark_domains.is_empty() {
			return true;
		}
		match url::Url::parse(uri) {
			Ok(url) => url.host_str().is_some_and(|host| {
				self.allowed_bookmark_domains.iter().any(|d| d.eq_ignore_ascii_case(host))
			}),
			// local paths stay on this instance
			Err(url::ParseError::RelativeUrlWithoutBase) => true,
			Err(_) => false,
		}
	}

	fn check_bookmarks(&self, bookmarks: &[Bookmark]) -> ClResult<()> {
		for bookmark in bookmarks {
			if !valid_uri(&bookmark.url) {
				return Err(Error::ValidationError(format!("Invalid bookmark URL `{}`", bookmark.url)));
			}
			if !self.domain_allowed(&bookmark.url) {
				return Err(Error::DomainNotAllowed { allowed: self.allowed_bookmark_domains.clone() });
			}
		}
		Ok(())
	}

	/// Check a value against the declared setting before it is stored
	pub fn validate_user_setting(&self, name: &str, value: &str) -> ClResult<()> {
		if name == BOOKMARK_SETTING_NAME {
			let bookmarks = decode_bookmarks(value)?;
			return self.check_bookmarks(&bookmarks);
		}
		self.provider.decode(name, value).map(|_| ())
	}

	/// Bring a validated value into the stored shape (bookmarks are always a list)
	fn normalize(&self, name: &str, value: &str) -> ClResult<String> {
		if name == BOOKMARK_SETTING_NAME {
			return encode_bookmarks(&decode_bookmarks(value)?);
		}
		Ok(value.to_string())
	}

	/// First write of a setting. Fails with `Error::Conflict` if it already exists.
	pub async fn create_setting(
		&self,
		user_id: UserId,
		name: &str,
		value: &str,
	) -> ClResult<UserSetting> {
		self.validate_user_setting(name, value)?;
		let value = self.normalize(name, value)?;
		let setting = self.adapter.create_user_setting(user_id, name, &value).await?;
		info!("Setting '{}' created for user {}", name, user_id);
		Ok(setting)
	}

	/// Overwrite an existing setting. Fails with `Error::NotFound` if absent.
	pub async fn edit_setting(
		&self,
		user_id: UserId,
		name: &str,
		value: &str,
	) -> ClResult<UserSetting> {
		self.validate_user_setting(name, value)?;
		let value = self.normalize(name, value)?;
		let setting = self.adapter.update_user_setting(user_id, name, &value, None).await?;
		info!("Setting '{}' updated for user {}", name, user_id);
		Ok(setting)
	}

	/// Create or overwrite
	pub async fn set_setting(
		&self,
		user_id: UserId,
		name: &str,
		value: &str,
	) -> ClResult<UserSetting> {
		match self.create_setting(user_id, name, value).await {
			Err(Error::Conflict(_)) => self.edit_setting(user_id, name, value).await,
			res => res,
		}
	}

	pub async fn delete_setting(&self, user_id: UserId, name: &str) -> ClResult<bool> {
		let deleted = self.adapter.delete_user_setting(user_id, name).await?;
		if deleted {
			info!("Setting '{}' deleted for user {}", name, user_id);
		}
		Ok(deleted)
	}

	/// Append a bookmark.
	///
	/// Returns `Ok(None)` without storing anything when the bookmark's host is
	/// not on the allow-list.
	pub async fn save_bookmark(
		&self,
		user_id: UserId,
		bookmark: Bookmark,
	) -> ClResult<Option<UserSetting>> {
		if !valid_uri(&bookmark.url) {
			return Err(Error::ValidationError(format!("Invalid bookmark URL `{}`", bookmark.url)));
		}
		if !self.domain_allowed(&bookmark.url) {
			warn!("Bookmark `{}` of user {} rejected: domain not allowed", bookmark.url, user_id);
			return Ok(None);
		}

		for _ in 0..BOOKMARK_WRITE_ATTEMPTS {
			let res = match self.adapter.read_user_setting(user_id, BOOKMARK_SETTING_NAME).await? {
				None => {
					let value = encode_bookmarks(std::slice::from_ref(&bookmark))?;
					self.adapter.create_user_setting(user_id, BOOKMARK_SETTING_NAME, &value).await
				}
				Some(setting) => {
					let mut bookmarks = decode_bookmarks(&setting.value)?;
					bookmarks.push(bookmark.clone());
					let value = encode_bookmarks(&bookmarks)?;
					self.adapter
						.update_user_setting(
							user_id,
							BOOKMARK_SETTING_NAME,
							&value,
							Some(setting.version),
						)
						.await
				}
			};
			match res {
				Ok(setting) => {
					info!("Bookmark `{}` saved for user {}", bookmark.url, user_id);
					return Ok(Some(setting));
				}
				Err(Error::Conflict(_)) => debug!("Bookmark write of user {} raced, retrying", user_id),
				Err(err) => return Err(err),
			}
		}

		warn!("Bookmark write of user {} kept losing races", user_id);
		Err(Error::Conflict("bookmarks were modified concurrently".into()))
	}

	/// Remove every bookmark matching both `name` and `url`.
	///
	/// Returns `Ok(None)` when the user has no bookmarks at all.
	pub async fn delete_bookmark(
		&self,
		user_id: UserId,
		name: &str,
		url: &str,
	) -> ClResult<Option<UserSetting>> {
		for _ in 0..BOOKMARK_WRITE_ATTEMPTS {
			let Some(setting) =
				self.adapter.read_user_setting(user_id, BOOKMARK_SETTING_NAME).await?
			else {
				return Ok(None);
			};

			let mut bookmarks = decode_bookmarks(&setting.value)?;
			bookmarks.retain(|b| !(*b.name == *name && *b.url == *url));
			let value = encode_bookmarks(&bookmarks)?;

			match self
				.adapter
				.update_user_setting(user_id, BOOKMARK_SETTING_NAME, &value, Some(setting.version))
				.await
			{
				Ok(setting) => {
					info!("Bookmark `{}` removed for user {}", url, user_id);
					return Ok(Some(setting));
				}
				Err(Error::Conflict(_)) => debug!("Bookmark write of user {} raced, retrying", user_id),
				Err(err) => return Err(err),
			}
		}

		warn!("Bookmark write of user {} kept losing races", user_id);
		Err(Error::Conflict("bookmarks were modified concurrently".into()))
	}

	/// Decoded value of a setting, falling back to its default
	pub async fn get_value(&self, user_id: UserId, name: &str) -> ClResult<Option<SettingValue>> {
		let def = self
			.provider
			.definition(name)
			.ok_or_else(|| Error::ValidationError(format!("Unknown setting: {}", name)))?;
		match self.adapter.read_user_setting(user_id, name).await? {
			Some(setting) => def.decode(&setting.value).map(Some),
			None => Ok(def.default.clone()),
		}
	}
}


// vim: ts=4
