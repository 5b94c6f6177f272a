//! Adapter that persists per-user key/value settings.

use async_trait::async_trait;
use serde::Serialize;
use std::fmt::Debug;

use crate::prelude::*;
use crate::types::serialize_timestamp_iso;

/// One stored setting row. `value` is opaque; structured settings hold JSON text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSetting {
	pub id: i64,
	pub user_id: UserId,
	pub name: Box<str>,
	pub value: Box<str>,
	/// Incremented on every write, used for optimistic concurrency
	pub version: i64,
	#[serde(serialize_with = "serialize_timestamp_iso")]
	pub created: Timestamp,
	#[serde(serialize_with = "serialize_timestamp_iso")]
	pub modified: Timestamp,
}

#[async_trait]
pub trait UserSettingAdapter: Debug + Send + Sync {
	async fn list_user_settings(&self, user_id: UserId) -> ClResult<Vec<UserSetting>>;

	async fn read_user_setting(
		&self,
		user_id: UserId,
		name: &str,
	) -> ClResult<Option<UserSetting>>;

	/// Fails with `Error::Conflict` if (user_id, name) already exists
	async fn create_user_setting(
		&self,
		user_id: UserId,
		name: &str,
		value: &str,
	) -> ClResult<UserSetting>;

	/// Overwrite an existing value.
	///
	/// Fails with `Error::NotFound` if the row does not exist and with
	/// `Error::Conflict` if `expected_version` is given and does not match.
	async fn update_user_setting(
		&self,
		user_id: UserId,
		name: &str,
		value: &str,
		expected_version: Option<i64>,
	) -> ClResult<UserSetting>;

	/// Returns whether a row was deleted
	async fn delete_user_setting(&self, user_id: UserId, name: &str) -> ClResult<bool>;
}

// vim: ts=4
