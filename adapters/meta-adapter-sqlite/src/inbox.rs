//! Inbox entry storage
//!
//! Status changes go through a single conditional UPDATE so that concurrent
//! claims on one entry resolve to exactly one winner.

use sqlx::{sqlite::SqliteRow, Row, SqlitePool};

use crate::utils::*;
use cerebrate_types::inbox_adapter::*;
use cerebrate_types::prelude::*;
use cerebrate_types::types::Severity;

const ENTRY_COLUMNS: &str = "id, scope, action, title, origin, comment, data, severity, user_id, \
	status, resolved_by, created, modified";

fn entry_from_row(row: &SqliteRow) -> Result<InboxEntry, sqlx::Error> {
	let status: String = row.try_get("status")?;
	let status = status
		.chars()
		.next()
		.and_then(InboxStatus::from_char)
		.ok_or_else(|| decode_err(format!("invalid inbox status {:?}", status)))?;

	let data = match row.try_get::<Option<String>, _>("data")? {
		Some(json) => serde_json::from_str(&json).map_err(|err| decode_err(err.to_string()))?,
		None => serde_json::Value::Null,
	};

	Ok(InboxEntry {
		id: row.try_get::<Box<str>, _>("id")?,
		scope: row.try_get::<Box<str>, _>("scope")?,
		action: row.try_get::<Box<str>, _>("action")?,
		title: row.try_get::<Box<str>, _>("title")?,
		origin: row.try_get::<Box<str>, _>("origin")?,
		comment: row.try_get::<Option<Box<str>>, _>("comment")?,
		data,
		severity: Severity::from_i64(row.try_get("severity")?).unwrap_or_default(),
		user_id: row.try_get::<Option<i64>, _>("user_id")?.map(UserId),
		status,
		resolved_by: row.try_get::<Option<i64>, _>("resolved_by")?.map(UserId),
		created: Timestamp(row.try_get("created")?),
		modified: Timestamp(row.try_get("modified")?),
	})
}

pub(crate) async fn create(db: &SqlitePool, entry: &CreateInboxEntry) -> ClResult<InboxEntry> {
	let data = serde_json::to_string(&entry.data).map_err(|_| Error::DbError)?;
	let res = sqlx::query(&format!(
		"INSERT INTO inbox (id, scope, action, title, origin, comment, data, severity, user_id, \
		status, created, modified) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, 'P', ?, ?) \
		RETURNING {}",
		ENTRY_COLUMNS
	))
	.bind(entry.id.as_ref())
	.bind(entry.scope.as_ref())
	.bind(entry.action.as_ref())
	.bind(entry.title.as_ref())
	.bind(entry.origin.as_ref())
	.bind(entry.comment.as_deref())
	.bind(data)
	.bind(entry.severity.as_i64())
	.bind(entry.user_id.map(|u| u.0))
	.bind(entry.created.0)
	.bind(entry.created.0)
	.fetch_one(db)
	.await
	.map_err(|err| map_write_err(err, "Inbox entry"))?;

	entry_from_row(&res).inspect_err(inspect).map_err(|_| Error::DbError)
}

pub(crate) async fn read(db: &SqlitePool, id: &str) -> ClResult<InboxEntry> {
	let res = sqlx::query(&format!("SELECT {} FROM inbox WHERE id = ?", ENTRY_COLUMNS))
		.bind(id)
		.fetch_one(db)
		.await;

	map_res(res, |row| entry_from_row(&row))
}

pub(crate) async fn list(db: &SqlitePool, opts: &ListInboxOptions) -> ClResult<Vec<InboxEntry>> {
	let mut query = sqlx::QueryBuilder::<sqlx::Sqlite>::new(format!(
		"SELECT {} FROM inbox WHERE true",
		ENTRY_COLUMNS
	));

	match (opts.user_id, opts.include_unassigned) {
		(Some(user_id), true) => {
			query.push(" AND (user_id = ").push_bind(user_id.0).push(" OR user_id IS NULL)");
		}
		(Some(user_id), false) => {
			query.push(" AND user_id = ").push_bind(user_id.0);
		}
		(None, _) => {}
	}
	if let Some(statuses) = &opts.status {
		query.push(" AND status IN (");
		let mut separated = query.separated(", ");
		for status in statuses {
			separated.push_bind(status.as_char().to_string());
		}
		separated.push_unseparated(")");
	}
	if let Some(scope) = &opts.scope {
		query.push(" AND scope = ").push_bind(scope.as_ref());
	}
	if let Some(action) = &opts.action {
		query.push(" AND action = ").push_bind(action.as_ref());
	}
	query.push(" ORDER BY created, rowid");

	let rows = query
		.build()
		.fetch_all(db)
		.await
		.inspect_err(inspect)
		.map_err(|_| Error::DbError)?;

	collect_res(rows.iter().map(entry_from_row))
}

pub(crate) async fn transition(
	db: &SqlitePool,
	id: &str,
	transition: &InboxTransition<'_>,
) -> ClResult<bool> {
	let mut query = sqlx::QueryBuilder::<sqlx::Sqlite>::new("UPDATE inbox SET status = ");
	query
		.push_bind(transition.to.as_char().to_string())
		.push(", modified = ")
		.push_bind(Timestamp::now().0)
		.push(", claim = ")
		.push_bind(transition.claim)
		.push(", resolved_by = coalesce(")
		.push_bind(transition.resolved_by.map(|u| u.0))
		.push(", resolved_by) WHERE id = ")
		.push_bind(id)
		.push(" AND (status IN (");
	let mut separated = query.separated(", ");
	for status in transition.from {
		separated.push_bind(status.as_char().to_string());
	}
	// An empty `from` list still needs a valid IN clause
	if transition.from.is_empty() {
		separated.push("NULL");
	}
	query.push(")");
	if let Some(stale_before) = transition.stale_before {
		query
			.push(" OR (status = ")
			.push_bind(InboxStatus::Processing.as_char().to_string())
			.push(" AND modified < ")
			.push_bind(stale_before.0)
			.push(")");
	}
	query.push(")");
	if let Some(holding) = transition.holding {
		query.push(" AND claim = ").push_bind(holding);
	}

	let res = query
		.build()
		.execute(db)
		.await
		.inspect_err(inspect)
		.map_err(|_| Error::DbError)?;

	if res.rows_affected() > 0 {
		return Ok(true);
	}

	// Distinguish "lost the race" from "no such entry"
	let exists = sqlx::query("SELECT 1 FROM inbox WHERE id = ?")
		.bind(id)
		.fetch_optional(db)
		.await
		.inspect_err(inspect)
		.map_err(|_| Error::DbError)?;
	match exists {
		Some(_) => Ok(false),
		None => Err(Error::NotFound),
	}
}

// vim: ts=4
