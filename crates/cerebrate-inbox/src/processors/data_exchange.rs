//! Synchronisation/DataExchange: a peer instance asks to exchange a record

use async_trait::async_trait;
use std::sync::Arc;

use cerebrate_core::request::PeerClient;
use cerebrate_types::directory::User;
use cerebrate_types::error::FieldErrors;
use cerebrate_types::inbox_adapter::InboxEntry;

use crate::prelude::*;
use crate::processor::{ActionResult, InboxRequest, RequestProcessor, Submitter};
use crate::store::{InboxStore, NewInboxEntry};

pub const SCOPE: &str = "Synchronisation";
pub const ACTION: &str = "DataExchange";

/// Path on the peer that is told about an accepted exchange
pub const ACCEPTED_ENDPOINT: &str = "/inbox/dataExchangeAccepted";

pub struct DataExchangeProcessor {
	peer: Arc<dyn PeerClient>,
}

impl DataExchangeProcessor {
	pub fn new(peer: Arc<dyn PeerClient>) -> Self {
		Self { peer }
	}
}

/// Display name of the record carried in the payload
fn record_name(data: &serde_json::Value) -> &str {
	["recordName", "name", "uuid"]
		.iter()
		.find_map(|field| data.get(*field).and_then(|v| v.as_str()))
		.unwrap_or("unnamed")
}

#[async_trait]
impl RequestProcessor for DataExchangeProcessor {
	fn scope(&self) -> &'static str {
		SCOPE
	}

	fn action(&self) -> &'static str {
		ACTION
	}

	fn description(&self) -> &'static str {
		"Handle exchange of data between two cerebrate instances"
	}

	async fn validate(
		&self,
		store: &InboxStore,
		submitter: &Submitter,
		request: &InboxRequest,
	) -> ClResult<()> {
		let Some(user) = &submitter.user else {
			return Err(Error::Unauthorized);
		};
		let mut errors = FieldErrors::new();

		if request.data_str("cerebrateURL").is_none_or(|u| u.trim().is_empty()) {
			errors
				.entry("cerebrateURL".into())
				.or_default()
				.push("The field `cerebrateURL` is required".into());
		}

		if !request.origin.trim().is_empty() {
			let problems = store
				.check_user_belongs_to_brood_owner_org(user, &request.origin, &request.data)
				.await?;
			if !problems.is_empty() {
				errors
					.entry("origin".into())
					.or_default()
					.extend(problems.into_iter().map(Box::from));
			}
		}

		if errors.is_empty() {
			Ok(())
		} else {
			warn!("Rejected data exchange request from {}: {:?}", request.origin, errors);
			Err(Error::FieldValidation(errors))
		}
	}

	async fn build_entry(
		&self,
		_store: &InboxStore,
		_submitter: &Submitter,
		request: InboxRequest,
	) -> ClResult<NewInboxEntry> {
		let title = format!("Data exchange requested for record `{}`", record_name(&request.data));
		Ok(NewInboxEntry {
			scope: SCOPE.into(),
			action: ACTION.into(),
			title: title.into(),
			origin: request.origin,
			comment: request.comment,
			data: request.data,
			severity: request.severity.unwrap_or_default(),
			user_id: request.user_id,
		})
	}

	async fn accept(
		&self,
		store: &InboxStore,
		actor: &User,
		entry: &InboxEntry,
		input: &serde_json::Value,
	) -> ClResult<ActionResult> {
		let name = record_name(&entry.data);
		let failure = ActionResult::failure(format!("Could not exchange record `{}`.", name));

		let Some(brood) = store.find_origin_brood(&entry.origin).await? else {
			warn!("Data exchange {} refers to unknown brood {}", entry.id, entry.origin);
			return Ok(failure);
		};

		let url = format!("{}{}", brood.url.trim_end_matches('/'), ACCEPTED_ENDPOINT);
		let body = serde_json::json!({
			"id": entry.id,
			"data": entry.data,
			"acceptedBy": actor.username,
			"comment": input.get("comment"),
		});

		match self.peer.post_json(&url, &body).await {
			Ok(res) if res.is_success() => {
				info!("Record `{}` exchanged with {}", name, brood.name);
				Ok(ActionResult::success(format!("Record `{}` exchanged", name), res.body))
			}
			Ok(res) => {
				warn!("Brood {} refused data exchange {}: HTTP {}", brood.name, entry.id, res.status);
				match res.message() {
					Some(msg) => Ok(ActionResult::failure(format!("{} {}", failure.message, msg))),
					None => Ok(failure),
				}
			}
			// peer unreachable: leave the entry open for another attempt
			Err(Error::Timeout | Error::NetworkError(_)) => Ok(failure),
			Err(err) => Err(err),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_record_name() {
		assert_eq!(record_name(&serde_json::json!({ "recordName": "Org A", "name": "x" })), "Org A");
		assert_eq!(record_name(&serde_json::json!({ "name": "x" })), "x");
		assert_eq!(record_name(&serde_json::json!({})), "unnamed");
	}
}

// vim: ts=4
