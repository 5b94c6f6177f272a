//! Inbox entry store
//!
//! Validates and persists entries, and serialises their resolution through
//! conditional status transitions so a side effect is applied at most once.

use std::sync::Arc;

use cerebrate_types::directory::{Brood, BroodRegistry, User, UserDirectory};
use cerebrate_types::error::FieldErrors;
use cerebrate_types::inbox_adapter::{
	CreateInboxEntry, InboxAdapter, InboxEntry, InboxStatus, InboxTransition, ListInboxOptions,
};
use cerebrate_core::config::MAX_PEER_TIMEOUT_SECS;

use crate::prelude::*;

/// A `Processing` claim older than this may be taken over by another caller.
/// Kept well above `MAX_PEER_TIMEOUT_SECS` so a running side effect is never overtaken.
pub const CLAIM_TIMEOUT_SECS: i64 = 300;

const _: () = assert!(CLAIM_TIMEOUT_SECS.unsigned_abs() > 2 * MAX_PEER_TIMEOUT_SECS);

const PENDING: &[InboxStatus] = &[InboxStatus::Pending];
const PROCESSING: &[InboxStatus] = &[InboxStatus::Processing];

/// Entry data as produced by a request processor
#[derive(Debug, Clone)]
pub struct NewInboxEntry {
	pub scope: Box<str>,
	pub action: Box<str>,
	pub title: Box<str>,
	pub origin: Box<str>,
	pub comment: Option<Box<str>>,
	pub data: serde_json::Value,
	pub severity: Severity,
	pub user_id: Option<UserId>,
}

pub struct InboxStore {
	adapter: Arc<dyn InboxAdapter>,
	users: Arc<dyn UserDirectory>,
	broods: Arc<dyn BroodRegistry>,
}

impl InboxStore {
	pub fn new(
		adapter: Arc<dyn InboxAdapter>,
		users: Arc<dyn UserDirectory>,
		broods: Arc<dyn BroodRegistry>,
	) -> Self {
		Self { adapter, users, broods }
	}

	pub fn users(&self) -> &dyn UserDirectory {
		self.users.as_ref()
	}

	/// Persist a new entry after checking required fields and the assigned user
	pub async fn create_entry(&self, entry: NewInboxEntry) -> ClResult<InboxEntry> {
		let mut errors = FieldErrors::new();
		for (field, value) in [
			("scope", &entry.scope),
			("action", &entry.action),
			("title", &entry.title),
			("origin", &entry.origin),
		] {
			if value.trim().is_empty() {
				errors
					.entry(field.into())
					.or_default()
					.push(format!("The field `{}` is required", field).into());
			}
		}

		if let Some(user_id) = entry.user_id {
			match self.users.get_user(user_id).await {
				Ok(_) => {}
				Err(Error::NotFound) => errors
					.entry("user_id".into())
					.or_default()
					.push("The provided `user_id` does not exist".into()),
				Err(err) => return Err(err),
			}
		}

		if !errors.is_empty() {
			warn!("Rejected inbox entry {}/{}: {:?}", entry.scope, entry.action, errors);
			return Err(Error::FieldValidation(errors));
		}

		let create = CreateInboxEntry {
			id: uuid::Uuid::new_v4().to_string().into(),
			scope: entry.scope,
			action: entry.action,
			title: entry.title,
			origin: entry.origin,
			comment: entry.comment,
			data: entry.data,
			severity: entry.severity,
			user_id: entry.user_id,
			created: Timestamp::now(),
		};
		let created = self.adapter.create_inbox_entry(&create).await?;
		info!("Inbox entry {} created ({}/{})", created.id, created.scope, created.action);
		Ok(created)
	}

	pub async fn read_entry(&self, id: &str) -> ClResult<InboxEntry> {
		self.adapter.read_inbox_entry(id).await
	}

	/// Entries assigned to `user`, plus unassigned ones for admins, oldest first
	pub async fn get_notifications_for_user(&self, user: &User) -> ClResult<Vec<InboxEntry>> {
		let opts = ListInboxOptions {
			user_id: Some(user.id),
			include_unassigned: user.is_admin(),
			..Default::default()
		};
		self.adapter.list_inbox_entries(&opts).await
	}

	/// Brood registered under `origin`, with or without a trailing slash
	pub async fn find_origin_brood(&self, origin: &str) -> ClResult<Option<Brood>> {
		let origin = origin.trim_matches('/');
		match self.broods.find_brood_by_url(origin).await? {
			Some(brood) => Ok(Some(brood)),
			None => self.broods.find_brood_by_url(&format!("{}/", origin)).await,
		}
	}

	/// Cross-check the origin of a request submitted by `user` against the registered broods.
	///
	/// Returns human-readable problems; an empty list means the origin is acceptable.
	pub async fn check_user_belongs_to_brood_owner_org(
		&self,
		user: &User,
		origin: &str,
		data: &serde_json::Value,
	) -> ClResult<Vec<String>> {
		let mut errors = Vec::new();

		let Some(brood) = self.find_origin_brood(origin).await? else {
			let claimed = data
				.get("cerebrateURL")
				.and_then(|u| u.as_str())
				.unwrap_or_else(|| origin.trim_matches('/'));
			errors.push(format!("Unknown brood `{}`", claimed));
			return Ok(errors);
		};

		if !brood.trusted {
			errors.push(format!("Brood `{}` is not trusted", brood.name));
		}

		if let Some(org_id) = brood.organisation_id {
			if !user.is_admin() && user.organisation_id != Some(org_id) {
				errors.push(format!(
					"User `{}` is not part of the brood's organisation",
					user.username
				));
			}
		}

		Ok(errors)
	}

	/// Take an entry into `Processing`. Returns the claim token, `None` when someone
	/// else holds or resolved the entry.
	pub async fn claim(&self, id: &str) -> ClResult<Option<Box<str>>> {
		let token = uuid::Uuid::new_v4().simple().to_string();
		let stale_before = Timestamp::now().add_seconds(-CLAIM_TIMEOUT_SECS);
		let claimed = self
			.adapter
			.transition_inbox_entry(
				id,
				&InboxTransition::new(PENDING, InboxStatus::Processing)
					.stale_before(stale_before)
					.claim(&token),
			)
			.await?;
		Ok(claimed.then_some(token.into()))
	}

	/// Put a claimed entry back to `Pending` so it can be retried.
	/// `false` means the claim was taken over.
	pub async fn release(&self, id: &str, claim: &str) -> ClResult<bool> {
		self.adapter
			.transition_inbox_entry(
				id,
				&InboxTransition::new(PROCESSING, InboxStatus::Pending).holding(claim),
			)
			.await
	}

	/// Mark a claimed entry accepted. `false` means the claim was taken over.
	pub async fn accept(&self, id: &str, claim: &str, resolved_by: UserId) -> ClResult<bool> {
		let accepted = self
			.adapter
			.transition_inbox_entry(
				id,
				&InboxTransition::new(PROCESSING, InboxStatus::Accepted)
					.resolved_by(resolved_by)
					.holding(claim),
			)
			.await?;
		if accepted {
			info!("Inbox entry {} accepted by user {}", id, resolved_by);
		}
		Ok(accepted)
	}

	/// Mark a pending entry discarded. `false` means it was not pending anymore.
	pub async fn discard(&self, id: &str, resolved_by: UserId) -> ClResult<bool> {
		let discarded = self
			.adapter
			.transition_inbox_entry(
				id,
				&InboxTransition::new(PENDING, InboxStatus::Discarded).resolved_by(resolved_by),
			)
			.await?;
		if discarded {
			info!("Inbox entry {} discarded by user {}", id, resolved_by);
		}
		Ok(discarded)
	}
}

// vim: ts=4
