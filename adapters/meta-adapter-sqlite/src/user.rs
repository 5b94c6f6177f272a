//! User directory and peer (brood) registry lookups

use sqlx::{sqlite::SqliteRow, Row, SqlitePool};

use crate::utils::*;
use cerebrate_types::directory::{Brood, CreateUser, Role, User};
use cerebrate_types::prelude::*;

const USER_SELECT: &str = "SELECT u.id, u.username, u.email, u.organisation_id, u.disabled, \
	r.id AS role_id, r.name AS role_name, r.perm_admin, r.perm_org_admin, r.perm_community_admin \
	FROM users u LEFT JOIN roles r ON r.id = u.role_id";

fn user_from_row(row: &SqliteRow) -> Result<User, sqlx::Error> {
	// Users without a known role get no permissions
	let role = match row.try_get::<Option<i64>, _>("role_id")? {
		Some(id) => Role {
			id,
			name: row.try_get::<Box<str>, _>("role_name")?,
			perm_admin: row.try_get("perm_admin")?,
			perm_org_admin: row.try_get("perm_org_admin")?,
			perm_community_admin: row.try_get("perm_community_admin")?,
		},
		None => Role::default(),
	};

	Ok(User {
		id: UserId(row.try_get("id")?),
		username: row.try_get::<Box<str>, _>("username")?,
		email: row.try_get::<Option<Box<str>>, _>("email")?,
		organisation_id: row.try_get("organisation_id")?,
		role,
		disabled: row.try_get("disabled")?,
	})
}

fn brood_from_row(row: &SqliteRow) -> Result<Brood, sqlx::Error> {
	Ok(Brood {
		id: row.try_get("id")?,
		name: row.try_get::<Box<str>, _>("name")?,
		url: row.try_get::<Box<str>, _>("url")?,
		organisation_id: row.try_get("organisation_id")?,
		trusted: row.try_get("trusted")?,
	})
}

pub(crate) async fn read(db: &SqlitePool, id: UserId) -> ClResult<User> {
	let res = sqlx::query(&format!("{} WHERE u.id = ?", USER_SELECT))
		.bind(id.0)
		.fetch_one(db)
		.await;

	map_res(res, |row| user_from_row(&row))
}

pub(crate) async fn find_by_username(db: &SqlitePool, username: &str) -> ClResult<Option<User>> {
	let row = sqlx::query(&format!("{} WHERE u.username = ?", USER_SELECT))
		.bind(username)
		.fetch_optional(db)
		.await
		.inspect_err(inspect)
		.map_err(|_| Error::DbError)?;

	row.map(|row| user_from_row(&row))
		.transpose()
		.inspect_err(inspect)
		.map_err(|_| Error::DbError)
}

pub(crate) async fn create(db: &SqlitePool, user: &CreateUser) -> ClResult<User> {
	let res = sqlx::query(
		"INSERT INTO users (username, email, first_name, last_name, password_hash, \
		organisation_id, role_id, disabled, created) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?) \
		RETURNING id",
	)
	.bind(user.username.as_ref())
	.bind(user.email.as_ref())
	.bind(user.first_name.as_ref())
	.bind(user.last_name.as_ref())
	.bind(user.password_hash.as_ref())
	.bind(user.organisation_id)
	.bind(user.role_id)
	.bind(user.disabled)
	.bind(Timestamp::now().0)
	.fetch_one(db)
	.await
	.map_err(|err| map_write_err(err, &format!("User '{}'", user.username)))?;

	let id: i64 = res.try_get("id").inspect_err(inspect).map_err(|_| Error::DbError)?;
	read(db, UserId(id)).await
}

pub(crate) async fn create_brood(
	db: &SqlitePool,
	name: &str,
	url: &str,
	organisation_id: Option<i64>,
	trusted: bool,
) -> ClResult<Brood> {
	let row = sqlx::query(
		"INSERT INTO broods (name, url, organisation_id, trusted) VALUES (?, ?, ?, ?) \
		RETURNING id, name, url, organisation_id, trusted",
	)
	.bind(name)
	.bind(url)
	.bind(organisation_id)
	.bind(trusted)
	.fetch_one(db)
	.await
	.map_err(|err| map_write_err(err, &format!("Brood '{}'", name)))?;

	brood_from_row(&row).inspect_err(inspect).map_err(|_| Error::DbError)
}

pub(crate) async fn find_brood_by_url(db: &SqlitePool, url: &str) -> ClResult<Option<Brood>> {
	let row = sqlx::query(
		"SELECT id, name, url, organisation_id, trusted FROM broods WHERE url = ? ORDER BY id LIMIT 1",
	)
	.bind(url)
	.fetch_optional(db)
	.await
	.inspect_err(inspect)
	.map_err(|_| Error::DbError)?;

	row.map(|row| brood_from_row(&row))
		.transpose()
		.inspect_err(inspect)
		.map_err(|_| Error::DbError)
}

// vim: ts=4
