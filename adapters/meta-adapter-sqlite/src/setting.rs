//! Per-user settings store
//!
//! Every write bumps `version`, which callers use for optimistic concurrency.

use sqlx::{sqlite::SqliteRow, Row, SqlitePool};

use crate::utils::*;
use cerebrate_types::prelude::*;
use cerebrate_types::setting_adapter::UserSetting;

const SETTING_COLUMNS: &str = "id, user_id, name, value, version, created, modified";

fn setting_from_row(row: &SqliteRow) -> Result<UserSetting, sqlx::Error> {
	Ok(UserSetting {
		id: row.try_get("id")?,
		user_id: UserId(row.try_get("user_id")?),
		name: row.try_get::<Box<str>, _>("name")?,
		value: row.try_get::<Box<str>, _>("value")?,
		version: row.try_get("version")?,
		created: Timestamp(row.try_get("created")?),
		modified: Timestamp(row.try_get("modified")?),
	})
}

pub(crate) async fn list(db: &SqlitePool, user_id: UserId) -> ClResult<Vec<UserSetting>> {
	let rows = sqlx::query(&format!(
		"SELECT {} FROM user_settings WHERE user_id = ? ORDER BY name",
		SETTING_COLUMNS
	))
	.bind(user_id.0)
	.fetch_all(db)
	.await
	.inspect_err(inspect)
	.map_err(|_| Error::DbError)?;

	collect_res(rows.iter().map(setting_from_row))
}

pub(crate) async fn read(
	db: &SqlitePool,
	user_id: UserId,
	name: &str,
) -> ClResult<Option<UserSetting>> {
	let res = sqlx::query(&format!(
		"SELECT {} FROM user_settings WHERE user_id = ? AND name = ?",
		SETTING_COLUMNS
	))
	.bind(user_id.0)
	.bind(name)
	.fetch_one(db)
	.await;

	match map_res(res, |row| setting_from_row(&row)) {
		Ok(setting) => Ok(Some(setting)),
		Err(Error::NotFound) => Ok(None),
		Err(err) => Err(err),
	}
}

pub(crate) async fn create(
	db: &SqlitePool,
	user_id: UserId,
	name: &str,
	value: &str,
) -> ClResult<UserSetting> {
	let now = Timestamp::now();
	let row = sqlx::query(&format!(
		"INSERT INTO user_settings (user_id, name, value, version, created, modified) \
		VALUES (?, ?, ?, 1, ?, ?) RETURNING {}",
		SETTING_COLUMNS
	))
	.bind(user_id.0)
	.bind(name)
	.bind(value)
	.bind(now.0)
	.bind(now.0)
	.fetch_one(db)
	.await
	.map_err(|err| map_write_err(err, &format!("Setting '{}'", name)))?;

	setting_from_row(&row).inspect_err(inspect).map_err(|_| Error::DbError)
}

pub(crate) async fn update(
	db: &SqlitePool,
	user_id: UserId,
	name: &str,
	value: &str,
	expected_version: Option<i64>,
) -> ClResult<UserSetting> {
	let row = sqlx::query(&format!(
		"UPDATE user_settings SET value = ?, version = version + 1, modified = ? \
		WHERE user_id = ? AND name = ? AND (? IS NULL OR version = ?) RETURNING {}",
		SETTING_COLUMNS
	))
	.bind(value)
	.bind(Timestamp::now().0)
	.bind(user_id.0)
	.bind(name)
	.bind(expected_version)
	.bind(expected_version)
	.fetch_optional(db)
	.await
	.inspect_err(inspect)
	.map_err(|_| Error::DbError)?;

	if let Some(row) = row {
		return setting_from_row(&row).inspect_err(inspect).map_err(|_| Error::DbError);
	}

	match read(db, user_id, name).await? {
		None => Err(Error::NotFound),
		Some(current) => {
			debug!(
				"Setting {} of user {} is at version {}, expected {:?}",
				name, user_id, current.version, expected_version
			);
			Err(Error::Conflict(format!("Setting '{}' was modified concurrently", name)))
		}
	}
}

pub(crate) async fn delete(db: &SqlitePool, user_id: UserId, name: &str) -> ClResult<bool> {
	let res = sqlx::query("DELETE FROM user_settings WHERE user_id = ? AND name = ?")
		.bind(user_id.0)
		.bind(name)
		.execute(db)
		.await
		.inspect_err(inspect)
		.map_err(|_| Error::DbError)?;

	Ok(res.rows_affected() > 0)
}

// vim: ts=4
