//! Adapter that persists inbox entries (queued data-exchange and registration requests).

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_with::skip_serializing_none;
use std::fmt::Debug;

use crate::prelude::*;
use crate::types::{serialize_timestamp_iso, Severity};

/// Inbox entry status codes
pub mod status {
	/// Waiting for review
	pub const PENDING: char = 'P';

	/// Claimed by a `process` call that is applying its side effect
	pub const PROCESSING: char = 'W';

	/// Accepted, side effect applied
	pub const ACCEPTED: char = 'A';

	/// Discarded without side effect
	pub const DISCARDED: char = 'D';
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InboxStatus {
	#[serde(rename = "P")]
	Pending,
	#[serde(rename = "W")]
	Processing,
	#[serde(rename = "A")]
	Accepted,
	#[serde(rename = "D")]
	Discarded,
}

impl InboxStatus {
	pub fn as_char(self) -> char {
		match self {
			InboxStatus::Pending => status::PENDING,
			InboxStatus::Processing => status::PROCESSING,
			InboxStatus::Accepted => status::ACCEPTED,
			InboxStatus::Discarded => status::DISCARDED,
		}
	}

	pub fn from_char(c: char) -> Option<Self> {
		match c {
			status::PENDING => Some(InboxStatus::Pending),
			status::PROCESSING => Some(InboxStatus::Processing),
			status::ACCEPTED => Some(InboxStatus::Accepted),
			status::DISCARDED => Some(InboxStatus::Discarded),
			_ => None,
		}
	}

	pub fn is_resolved(self) -> bool {
		matches!(self, InboxStatus::Accepted | InboxStatus::Discarded)
	}
}

#[skip_serializing_none]
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InboxEntry {
	pub id: Box<str>,
	pub scope: Box<str>,
	pub action: Box<str>,
	pub title: Box<str>,
	pub origin: Box<str>,
	pub comment: Option<Box<str>>,
	pub data: serde_json::Value,
	pub severity: Severity,
	pub user_id: Option<UserId>,
	pub status: InboxStatus,
	pub resolved_by: Option<UserId>,
	#[serde(serialize_with = "serialize_timestamp_iso")]
	pub created: Timestamp,
	#[serde(serialize_with = "serialize_timestamp_iso")]
	pub modified: Timestamp,
}

impl InboxEntry {
	pub fn is_resolved(&self) -> bool {
		self.status.is_resolved()
	}
}

/// Validated data for a new inbox entry
#[derive(Debug, Clone)]
pub struct CreateInboxEntry {
	pub id: Box<str>,
	pub scope: Box<str>,
	pub action: Box<str>,
	pub title: Box<str>,
	pub origin: Box<str>,
	pub comment: Option<Box<str>>,
	pub data: serde_json::Value,
	pub severity: Severity,
	pub user_id: Option<UserId>,
	pub created: Timestamp,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListInboxOptions {
	pub user_id: Option<UserId>,
	/// Also return entries not assigned to any user
	#[serde(default)]
	pub include_unassigned: bool,
	pub status: Option<Vec<InboxStatus>>,
	pub scope: Option<Box<str>>,
	pub action: Option<Box<str>>,
}

/// Conditional status change applied by `InboxAdapter::transition_inbox_entry`
#[derive(Debug, Clone, Copy)]
pub struct InboxTransition<'a> {
	pub from: &'a [InboxStatus],
	pub to: InboxStatus,
	pub resolved_by: Option<UserId>,
	/// Also match `Processing` entries last modified before this
	pub stale_before: Option<Timestamp>,
	/// Only match an entry holding this claim token
	pub holding: Option<&'a str>,
	/// Claim token stored with the new state. `None` clears it.
	pub claim: Option<&'a str>,
}

impl<'a> InboxTransition<'a> {
	pub fn new(from: &'a [InboxStatus], to: InboxStatus) -> Self {
		Self { from, to, resolved_by: None, stale_before: None, holding: None, claim: None }
	}

	pub fn resolved_by(mut self, user_id: UserId) -> Self {
		self.resolved_by = Some(user_id);
		self
	}

	pub fn stale_before(mut self, stale_before: Timestamp) -> Self {
		self.stale_before = Some(stale_before);
		self
	}

	pub fn holding(mut self, token: &'a str) -> Self {
		self.holding = Some(token);
		self
	}

	pub fn claim(mut self, token: &'a str) -> Self {
		self.claim = Some(token);
		self
	}
}

#[async_trait]
pub trait InboxAdapter: Debug + Send + Sync {
	async fn create_inbox_entry(&self, entry: &CreateInboxEntry) -> ClResult<InboxEntry>;

	/// Fails with `Error::NotFound` for unknown ids
	async fn read_inbox_entry(&self, id: &str) -> ClResult<InboxEntry>;

	/// Ordered by creation time ascending, insertion order breaking ties
	async fn list_inbox_entries(&self, opts: &ListInboxOptions) -> ClResult<Vec<InboxEntry>>;

	/// Atomically apply `transition` to entry `id`.
	///
	/// Returns `false` (and changes nothing) when the entry is not in one of the
	/// `from` states, or does not hold the expected claim token.
	async fn transition_inbox_entry(
		&self,
		id: &str,
		transition: &InboxTransition<'_>,
	) -> ClResult<bool>;
}

// vim: ts=4
