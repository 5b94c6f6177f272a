//! SQLite-backed metadata adapter for Cerebrate.
//!
//! One database file holds the inbox, per-user settings, and the user and
//! brood tables the inbox consults during validation.

#![forbid(unsafe_code)]

mod inbox;
mod schema;
mod setting;
mod user;
mod utils;

use async_trait::async_trait;
use sqlx::sqlite::{self, SqlitePool};
use std::{fmt::Debug, path::Path};

use cerebrate_types::{
	directory::{Brood, BroodRegistry, CreateUser, User, UserDirectory},
	inbox_adapter::{CreateInboxEntry, InboxAdapter, InboxEntry, InboxTransition, ListInboxOptions},
	prelude::*,
	setting_adapter::{UserSetting, UserSettingAdapter},
};

use crate::schema::init_db;

/// Database file created inside the configured directory
pub const DB_FILE_NAME: &str = "meta.db";

#[derive(Debug)]
pub struct MetaAdapterSqlite {
	db: SqlitePool,
}

impl MetaAdapterSqlite {
	/// Open (or create) `meta.db` inside `db_dir`, creating the directory if needed
	pub async fn new(db_dir: impl AsRef<Path>) -> ClResult<Self> {
		let db_dir = db_dir.as_ref();
		tokio::fs::create_dir_all(db_dir).await?;
		let file = db_dir.join(DB_FILE_NAME);

		let opts = sqlite::SqliteConnectOptions::new()
			.filename(&file)
			.create_if_missing(true)
			.journal_mode(sqlite::SqliteJournalMode::Wal);
		let db = sqlite::SqlitePoolOptions::new()
			.max_connections(5)
			.connect_with(opts)
			.await
			.inspect_err(|err| warn!("DbError: {:#?}", err))
			.map_err(|_| Error::DbError)?;

		init_db(&db)
			.await
			.inspect_err(|err| warn!("DbError: {:#?}", err))
			.map_err(|_| Error::DbError)?;

		info!("Metadata database opened at {}", file.display());
		Ok(Self { db })
	}

	/// Register a peer instance
	pub async fn create_brood(
		&self,
		name: &str,
		url: &str,
		organisation_id: Option<i64>,
		trusted: bool,
	) -> ClResult<Brood> {
		user::create_brood(&self.db, name, url, organisation_id, trusted).await
	}
}

#[async_trait]
impl InboxAdapter for MetaAdapterSqlite {
	async fn create_inbox_entry(&self, entry: &CreateInboxEntry) -> ClResult<InboxEntry> {
		inbox::create(&self.db, entry).await
	}

	async fn read_inbox_entry(&self, id: &str) -> ClResult<InboxEntry> {
		inbox::read(&self.db, id).await
	}

	async fn list_inbox_entries(&self, opts: &ListInboxOptions) -> ClResult<Vec<InboxEntry>> {
		inbox::list(&self.db, opts).await
	}

	async fn transition_inbox_entry(
		&self,
		id: &str,
		transition: &InboxTransition<'_>,
	) -> ClResult<bool> {
		inbox::transition(&self.db, id, transition).await
	}
}

#[async_trait]
impl UserSettingAdapter for MetaAdapterSqlite {
	async fn list_user_settings(&self, user_id: UserId) -> ClResult<Vec<UserSetting>> {
		setting::list(&self.db, user_id).await
	}

	async fn read_user_setting(
		&self,
		user_id: UserId,
		name: &str,
	) -> ClResult<Option<UserSetting>> {
		setting::read(&self.db, user_id, name).await
	}

	async fn create_user_setting(
		&self,
		user_id: UserId,
		name: &str,
		value: &str,
	) -> ClResult<UserSetting> {
		setting::create(&self.db, user_id, name, value).await
	}

	async fn update_user_setting(
		&self,
		user_id: UserId,
		name: &str,
		value: &str,
		expected_version: Option<i64>,
	) -> ClResult<UserSetting> {
		setting::update(&self.db, user_id, name, value, expected_version).await
	}

	async fn delete_user_setting(&self, user_id: UserId, name: &str) -> ClResult<bool> {
		setting::delete(&self.db, user_id, name).await
	}
}

#[async_trait]
impl UserDirectory for MetaAdapterSqlite {
	async fn get_user(&self, id: UserId) -> ClResult<User> {
		user::read(&self.db, id).await
	}

	async fn find_user_by_username(&self, username: &str) -> ClResult<Option<User>> {
		user::find_by_username(&self.db, username).await
	}

	async fn create_user(&self, user: &CreateUser) -> ClResult<User> {
		user::create(&self.db, user).await
	}
}

#[async_trait]
impl BroodRegistry for MetaAdapterSqlite {
	async fn find_brood_by_url(&self, url: &str) -> ClResult<Option<Brood>> {
		user::find_brood_by_url(&self.db, url).await
	}
}

// vim: ts=4
