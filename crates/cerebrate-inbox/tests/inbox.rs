//! Inbox lifecycle tests: creation, resolution, notifications

mod common;

use std::sync::Arc;
use std::time::Duration;

use cerebrate_core::flood::FloodProtection;
use cerebrate_inbox::processors::data_exchange;
use cerebrate_inbox::store::CLAIM_TIMEOUT_SECS;
use cerebrate_inbox::{InboxRequest, Submitter};
use cerebrate_types::error::Error;
use cerebrate_types::inbox_adapter::InboxStatus;
use cerebrate_types::types::{Severity, UserId};

use common::*;

fn exchange_request(owner: Option<UserId>) -> InboxRequest {
	InboxRequest {
		origin: PEER_URL.into(),
		comment: Some("Sharing our contact list".into()),
		data: serde_json::json!({ "cerebrateURL": PEER_URL, "recordName": "Contacts" }),
		severity: Some(Severity::Warning),
		user_id: owner,
		..InboxRequest::default()
	}
}

async fn create_exchange(f: &Fixture, owner: Option<UserId>) -> String {
	let created = f
		.inbox
		.create_request(
			data_exchange::SCOPE,
			data_exchange::ACTION,
			&submitted_by(&f.alice),
			exchange_request(owner),
		)
		.await
		.unwrap();
	assert!(created.success);
	created.entry.id.to_string()
}

#[tokio::test]
async fn test_unknown_processor_is_rejected() {
	let f = fixture();
	let res =
		f.inbox.create_request("Nope", "Nothing", &submitted_by(&f.alice), exchange_request(None)).await;
	assert!(matches!(res, Err(Error::UnknownProcessor { .. })));
	assert!(f.adapter.entries.lock().is_empty());
}

#[tokio::test]
async fn test_invalid_requests_are_not_persisted() {
	let f = fixture();

	let mut missing_url = exchange_request(None);
	missing_url.data = serde_json::json!({ "recordName": "x" });
	let alice = submitted_by(&f.alice);
	let res =
		f.inbox.create_request(data_exchange::SCOPE, data_exchange::ACTION, &alice, missing_url).await;
	match res {
		Err(Error::FieldValidation(errors)) => assert!(errors.contains_key("cerebrateURL")),
		other => panic!("unexpected {:?}", other),
	}

	let mut unknown_brood = exchange_request(None);
	unknown_brood.origin = "https://stranger.example.net".into();
	let res =
		f.inbox.create_request(data_exchange::SCOPE, data_exchange::ACTION, &alice, unknown_brood).await;
	match res {
		Err(Error::FieldValidation(errors)) => {
			let origin = &errors["origin"];
			assert!(origin[0].starts_with("Unknown brood"));
		}
		other => panic!("unexpected {:?}", other),
	}

	let res = f
		.inbox
		.create_request(
			data_exchange::SCOPE,
			data_exchange::ACTION,
			&alice,
			exchange_request(Some(UserId(99))),
		)
		.await;
	match res {
		Err(Error::FieldValidation(errors)) => assert!(errors.contains_key("user_id")),
		other => panic!("unexpected {:?}", other),
	}

	assert!(f.adapter.entries.lock().is_empty());
}

#[tokio::test]
async fn test_brood_organisation_checked_against_submitter() {
	let f = fixture();
	let outsider = submitted_by(&f.outsider);

	// Naming an admin as owner does not lend the submitter admin rights
	for owner in [None, Some(f.admin.id), Some(f.outsider.id)] {
		let res = f
			.inbox
			.create_request(
				data_exchange::SCOPE,
				data_exchange::ACTION,
				&outsider,
				exchange_request(owner),
			)
			.await;
		match res {
			Err(Error::FieldValidation(errors)) => {
				assert!(errors["origin"][0].contains("not part of the brood's organisation"));
			}
			other => panic!("unexpected {:?}", other),
		}
	}

	let res = f
		.inbox
		.create_request(
			data_exchange::SCOPE,
			data_exchange::ACTION,
			&Submitter::default(),
			exchange_request(None),
		)
		.await;
	assert!(matches!(res, Err(Error::Unauthorized)));
	assert!(f.adapter.entries.lock().is_empty());

	// Admins may submit on behalf of any organisation
	let res = f
		.inbox
		.create_request(
			data_exchange::SCOPE,
			data_exchange::ACTION,
			&submitted_by(&f.admin),
			exchange_request(Some(f.outsider.id)),
		)
		.await;
	assert!(res.is_ok());
}

#[tokio::test]
async fn test_create_builds_title_and_notification() {
	let f = fixture();
	let id = create_exchange(&f, Some(f.alice.id)).await;

	let entry = f.inbox.get_entry(&f.alice, &id).await.unwrap();
	assert_eq!(&*entry.title, "Data exchange requested for record `Contacts`");
	assert_eq!(entry.status, InboxStatus::Pending);

	let notifications = f.inbox.collect_notifications(&f.alice).await.unwrap();
	assert_eq!(notifications.len(), 1);
	assert_eq!(&*notifications[0].link.id, id.as_str());
	assert_eq!(notifications[0].severity_variant, "warning");
	assert_eq!(notifications[0].message.as_deref(), Some("Sharing our contact list"));

	assert!(f.inbox.collect_notifications(&f.bob).await.unwrap().is_empty());
	assert!(matches!(f.inbox.get_entry(&f.bob, &id).await, Err(Error::PermissionDenied)));
}

#[tokio::test]
async fn test_notifications_ordered_by_creation() {
	let f = fixture();
	let first = create_exchange(&f, Some(f.alice.id)).await;
	let second = create_exchange(&f, Some(f.alice.id)).await;
	let unassigned = create_exchange(&f, None).await;

	let ids: Vec<String> = f
		.inbox
		.get_notifications_for_user(&f.alice)
		.await
		.unwrap()
		.iter()
		.map(|e| e.id.to_string())
		.collect();
	assert_eq!(ids, vec![first.clone(), second.clone()]);

	// admins also see unassigned entries
	let admin_ids: Vec<String> = f
		.inbox
		.collect_notifications(&f.admin)
		.await
		.unwrap()
		.iter()
		.map(|n| n.link.id.to_string())
		.collect();
	assert_eq!(admin_ids, vec![unassigned]);
}

#[tokio::test]
async fn test_process_accepts_once() {
	let f = fixture();
	let id = create_exchange(&f, Some(f.alice.id)).await;

	let result = f.inbox.process_entry(&f.alice, &id, &serde_json::Value::Null).await.unwrap();
	assert!(result.success, "{}", result.message);
	assert_eq!(result.message, "Record `Contacts` exchanged");
	assert_eq!(f.peer.calls(), 1);
	assert_eq!(f.peer.urls.lock()[0], format!("{}/inbox/dataExchangeAccepted", PEER_URL));

	let entry = f.inbox.get_entry(&f.alice, &id).await.unwrap();
	assert_eq!(entry.status, InboxStatus::Accepted);
	assert_eq!(entry.resolved_by, Some(f.alice.id));
	assert!(f.inbox.collect_notifications(&f.alice).await.unwrap().is_empty());

	// idempotent: no error, no second side effect, no state change
	let again = f.inbox.process_entry(&f.alice, &id, &serde_json::Value::Null).await.unwrap();
	assert!(!again.success);
	assert!(!f.inbox.discard_entry(&f.alice, &id).await.unwrap());
	assert_eq!(f.peer.calls(), 1);
	assert_eq!(f.inbox.get_entry(&f.alice, &id).await.unwrap().status, InboxStatus::Accepted);
}

#[tokio::test]
async fn test_peer_failure_leaves_entry_open() {
	let f = fixture_with(FakePeer::new(None, Duration::ZERO), true, FloodProtection::new(false));
	let id = create_exchange(&f, Some(f.alice.id)).await;

	let result = f.inbox.process_entry(&f.alice, &id, &serde_json::Value::Null).await.unwrap();
	assert!(!result.success);
	assert_eq!(result.message, "Could not exchange record `Contacts`.");
	assert_eq!(f.inbox.get_entry(&f.alice, &id).await.unwrap().status, InboxStatus::Pending);

	f.peer.set_status(Some(409));
	let result = f.inbox.process_entry(&f.alice, &id, &serde_json::Value::Null).await.unwrap();
	assert!(!result.success);
	assert_eq!(f.inbox.get_entry(&f.alice, &id).await.unwrap().status, InboxStatus::Pending);

	f.peer.set_status(Some(200));
	let result = f.inbox.process_entry(&f.alice, &id, &serde_json::Value::Null).await.unwrap();
	assert!(result.success);
	assert_eq!(f.peer.calls(), 3);
}

#[tokio::test]
async fn test_discard_is_idempotent() {
	let f = fixture();
	let id = create_exchange(&f, Some(f.alice.id)).await;

	assert!(f.inbox.discard_entry(&f.alice, &id).await.unwrap());
	assert!(!f.inbox.discard_entry(&f.alice, &id).await.unwrap());
	assert!(!f.inbox.discard_entry(&f.admin, &id).await.unwrap());

	let entry = f.inbox.get_entry(&f.alice, &id).await.unwrap();
	assert_eq!(entry.status, InboxStatus::Discarded);

	let result = f.inbox.process_entry(&f.alice, &id, &serde_json::Value::Null).await.unwrap();
	assert!(!result.success);
	assert_eq!(f.peer.calls(), 0);
}

#[tokio::test]
async fn test_only_owner_or_admin_may_resolve() {
	let f = fixture();
	let id = create_exchange(&f, Some(f.alice.id)).await;

	assert!(matches!(
		f.inbox.process_entry(&f.bob, &id, &serde_json::Value::Null).await,
		Err(Error::PermissionDenied)
	));
	assert!(matches!(f.inbox.discard_entry(&f.bob, &id).await, Err(Error::PermissionDenied)));
	assert!(f.inbox.discard_entry(&f.admin, &id).await.unwrap());

	assert!(matches!(f.inbox.discard_entry(&f.admin, "missing").await, Err(Error::NotFound)));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_process_applies_side_effect_once() {
	let f = Arc::new(fixture_with(
		FakePeer::new(Some(200), Duration::from_millis(50)),
		true,
		FloodProtection::new(false),
	));
	let id = create_exchange(&f, Some(f.alice.id)).await;

	let mut handles = Vec::new();
	for _ in 0..4 {
		let f = f.clone();
		let id = id.clone();
		handles.push(tokio::spawn(async move {
			let actor = f.alice.clone();
			f.inbox.process_entry(&actor, &id, &serde_json::Value::Null).await
		}));
	}

	let mut successes = 0;
	for handle in handles {
		if handle.await.unwrap().unwrap().success {
			successes += 1;
		}
	}
	assert_eq!(successes, 1);
	assert_eq!(f.peer.calls(), 1);
	assert_eq!(f.inbox.get_entry(&f.alice, &id).await.unwrap().status, InboxStatus::Accepted);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_process_and_discard() {
	let f = Arc::new(fixture_with(
		FakePeer::new(Some(200), Duration::from_millis(50)),
		true,
		FloodProtection::new(false),
	));
	let id = create_exchange(&f, Some(f.alice.id)).await;

	let (fp, idp) = (f.clone(), id.clone());
	let process = tokio::spawn(async move {
		fp.inbox.process_entry(&fp.alice, &idp, &serde_json::Value::Null).await
	});
	let (fd, idd) = (f.clone(), id.clone());
	let discard = tokio::spawn(async move { fd.inbox.discard_entry(&fd.admin, &idd).await });

	let processed = process.await.unwrap().unwrap().success;
	let discarded = discard.await.unwrap().unwrap();
	assert!(processed ^ discarded, "exactly one resolution must win");

	let status = f.inbox.get_entry(&f.alice, &id).await.unwrap().status;
	if processed {
		assert_eq!(status, InboxStatus::Accepted);
		assert_eq!(f.peer.calls(), 1);
	} else {
		assert_eq!(status, InboxStatus::Discarded);
	}
}

#[tokio::test]
async fn test_taken_over_claim_cannot_resolve() {
	let f = fixture();
	let id = create_exchange(&f, Some(f.alice.id)).await;
	let store = f.inbox.store();

	let first = store.claim(&id).await.unwrap().unwrap();
	assert!(store.claim(&id).await.unwrap().is_none());

	// The first holder stalls past the claim timeout and is overtaken
	f.adapter.age(&id, CLAIM_TIMEOUT_SECS + 1);
	let second = store.claim(&id).await.unwrap().unwrap();
	assert_ne!(first, second);

	assert!(!store.release(&id, &first).await.unwrap());
	assert!(!store.accept(&id, &first, f.alice.id).await.unwrap());
	assert_eq!(f.inbox.get_entry(&f.alice, &id).await.unwrap().status, InboxStatus::Processing);

	assert!(store.accept(&id, &second, f.admin.id).await.unwrap());
	let entry = f.inbox.get_entry(&f.alice, &id).await.unwrap();
	assert_eq!(entry.status, InboxStatus::Accepted);
	assert_eq!(entry.resolved_by, Some(f.admin.id));
}

#[test]
fn test_processor_listing() {
	let f = fixture();
	let list = f.inbox.list_processors();
	let keys: Vec<(&str, &str)> = list.iter().map(|p| (p.scope, p.action)).collect();
	assert_eq!(keys, vec![("Synchronisation", "DataExchange"), ("User", "Registration")]);
}

// vim: ts=4
