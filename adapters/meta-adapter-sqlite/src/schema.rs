//! Database schema initialization
//!
//! Creates tables and indexes and seeds the built-in roles.

use sqlx::SqlitePool;

/// Initialize the database schema with all required tables and indexes
pub(crate) async fn init_db(db: &SqlitePool) -> Result<(), sqlx::Error> {
	let mut tx = db.begin().await?;

	// Roles
	//*******
	sqlx::query(
		"CREATE TABLE IF NOT EXISTS roles (
		id integer NOT NULL,
		name text NOT NULL,
		perm_admin boolean NOT NULL DEFAULT 0,
		perm_org_admin boolean NOT NULL DEFAULT 0,
		perm_community_admin boolean NOT NULL DEFAULT 0,
		PRIMARY KEY(id)
	)",
	)
	.execute(&mut *tx)
	.await?;

	sqlx::query(
		"INSERT OR IGNORE INTO roles (id, name, perm_admin, perm_org_admin, perm_community_admin)
		VALUES (1, 'Admin', 1, 1, 1), (2, 'Org Admin', 0, 1, 0), (3, 'User', 0, 0, 0)",
	)
	.execute(&mut *tx)
	.await?;

	// Users
	//*******
	sqlx::query(
		"CREATE TABLE IF NOT EXISTS users (
		id integer NOT NULL,
		username text NOT NULL,
		email text,
		first_name text,
		last_name text,
		password_hash text,
		organisation_id integer,
		role_id integer,
		disabled boolean NOT NULL DEFAULT 0,
		created integer NOT NULL,
		PRIMARY KEY(id AUTOINCREMENT),
		UNIQUE(username)
	)",
	)
	.execute(&mut *tx)
	.await?;

	// Broods
	//********
	sqlx::query(
		"CREATE TABLE IF NOT EXISTS broods (
		id integer NOT NULL,
		name text NOT NULL,
		url text NOT NULL,
		organisation_id integer,
		trusted boolean NOT NULL DEFAULT 0,
		PRIMARY KEY(id AUTOINCREMENT)
	)",
	)
	.execute(&mut *tx)
	.await?;
	sqlx::query("CREATE INDEX IF NOT EXISTS idx_broods_url ON broods(url)")
		.execute(&mut *tx)
		.await?;

	// Inbox
	//*******
	sqlx::query(
		"CREATE TABLE IF NOT EXISTS inbox (
		id text NOT NULL,
		scope text NOT NULL,
		action text NOT NULL,
		title text NOT NULL,
		origin text NOT NULL,
		comment text,
		data json,
		severity integer NOT NULL DEFAULT 1,
		user_id integer,
		status char(1) NOT NULL DEFAULT 'P',
		claim text,
		resolved_by integer,
		created integer NOT NULL,
		modified integer NOT NULL,
		PRIMARY KEY(id)
	)",
	)
	.execute(&mut *tx)
	.await?;
	sqlx::query("CREATE INDEX IF NOT EXISTS idx_inbox_user ON inbox(user_id, created)")
		.execute(&mut *tx)
		.await?;

	// User settings
	//***************
	sqlx::query(
		"CREATE TABLE IF NOT EXISTS user_settings (
		id integer NOT NULL,
		user_id integer NOT NULL,
		name text NOT NULL,
		value text NOT NULL,
		version integer NOT NULL DEFAULT 1,
		created integer NOT NULL,
		modified integer NOT NULL,
		PRIMARY KEY(id AUTOINCREMENT),
		UNIQUE(user_id, name)
	)",
	)
	.execute(&mut *tx)
	.await?;

	tx.commit().await?;

	Ok(())
}

// vim: ts=4
