//! In-memory collaborators for inbox tests

#![allow(dead_code)]

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::net::IpAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use cerebrate_core::config::Config;
use cerebrate_core::flood::FloodProtection;
use cerebrate_core::request::{PeerClient, PeerResponse};
use cerebrate_inbox::{Inbox, Submitter};
use cerebrate_types::directory::{Brood, BroodRegistry, CreateUser, Role, User, UserDirectory};
use cerebrate_types::error::{ClResult, Error};
use cerebrate_types::inbox_adapter::{
	CreateInboxEntry, InboxAdapter, InboxEntry, InboxStatus, InboxTransition, ListInboxOptions,
};
use cerebrate_types::types::{Timestamp, UserId};

#[derive(Debug, Default)]
pub struct MemInbox {
	pub entries: Mutex<Vec<InboxEntry>>,
	pub claims: Mutex<HashMap<Box<str>, Box<str>>>,
}

impl MemInbox {
	/// Backdate the last modification of entry `id`
	pub fn age(&self, id: &str, seconds: i64) {
		let mut entries = self.entries.lock();
		if let Some(entry) = entries.iter_mut().find(|e| &*e.id == id) {
			entry.modified = entry.modified.add_seconds(-seconds);
		}
	}
}

#[async_trait]
impl InboxAdapter for MemInbox {
	async fn create_inbox_entry(&self, entry: &CreateInboxEntry) -> ClResult<InboxEntry> {
		let created = InboxEntry {
			id: entry.id.clone(),
			scope: entry.scope.clone(),
			action: entry.action.clone(),
			title: entry.title.clone(),
			origin: entry.origin.clone(),
			comment: entry.comment.clone(),
			data: entry.data.clone(),
			severity: entry.severity,
			user_id: entry.user_id,
			status: InboxStatus::Pending,
			resolved_by: None,
			created: entry.created,
			modified: entry.created,
		};
		self.entries.lock().push(created.clone());
		Ok(created)
	}

	async fn read_inbox_entry(&self, id: &str) -> ClResult<InboxEntry> {
		self.entries.lock().iter().find(|e| &*e.id == id).cloned().ok_or(Error::NotFound)
	}

	async fn list_inbox_entries(&self, opts: &ListInboxOptions) -> ClResult<Vec<InboxEntry>> {
		let mut list: Vec<InboxEntry> = self
			.entries
			.lock()
			.iter()
			.filter(|e| match e.user_id {
				Some(uid) => opts.user_id.is_none_or(|u| u == uid),
				None => opts.user_id.is_none() || opts.include_unassigned,
			})
			.filter(|e| opts.status.as_ref().is_none_or(|s| s.contains(&e.status)))
			.cloned()
			.collect();
		list.sort_by_key(|e| e.created);
		Ok(list)
	}

	async fn transition_inbox_entry(
		&self,
		id: &str,
		transition: &InboxTransition<'_>,
	) -> ClResult<bool> {
		let mut entries = self.entries.lock();
		let mut claims = self.claims.lock();
		let entry = entries.iter_mut().find(|e| &*e.id == id).ok_or(Error::NotFound)?;
		let stale = transition.stale_before.is_some_and(|ts| {
			entry.status == InboxStatus::Processing && entry.modified < ts
		});
		if !transition.from.contains(&entry.status) && !stale {
			return Ok(false);
		}
		if let Some(holding) = transition.holding {
			if claims.get(id).map(|c| &**c) != Some(holding) {
				return Ok(false);
			}
		}
		entry.status = transition.to;
		entry.modified = Timestamp::now();
		if transition.resolved_by.is_some() {
			entry.resolved_by = transition.resolved_by;
		}
		match transition.claim {
			Some(token) => claims.insert(id.into(), token.into()),
			None => claims.remove(id),
		};
		Ok(true)
	}
}

#[derive(Debug, Default)]
pub struct MemUsers {
	pub users: Mutex<Vec<User>>,
	pub created: Mutex<Vec<CreateUser>>,
}

impl MemUsers {
	pub fn with(users: Vec<User>) -> Self {
		Self { users: Mutex::new(users), created: Mutex::new(Vec::new()) }
	}
}

#[async_trait]
impl UserDirectory for MemUsers {
	async fn get_user(&self, id: UserId) -> ClResult<User> {
		self.users.lock().iter().find(|u| u.id == id).cloned().ok_or(Error::NotFound)
	}

	async fn find_user_by_username(&self, username: &str) -> ClResult<Option<User>> {
		Ok(self.users.lock().iter().find(|u| &*u.username == username).cloned())
	}

	async fn create_user(&self, create: &CreateUser) -> ClResult<User> {
		let mut users = self.users.lock();
		if users.iter().any(|u| u.username == create.username) {
			return Err(Error::Conflict("username taken".into()));
		}
		let user = User {
			id: UserId(users.len() as i64 + 100),
			username: create.username.clone(),
			email: Some(create.email.clone()),
			organisation_id: create.organisation_id,
			role: Role::default(),
			disabled: create.disabled,
		};
		users.push(user.clone());
		self.created.lock().push(create.clone());
		Ok(user)
	}
}

#[derive(Debug, Default)]
pub struct MemBroods {
	pub broods: Vec<Brood>,
}

#[async_trait]
impl BroodRegistry for MemBroods {
	async fn find_brood_by_url(&self, url: &str) -> ClResult<Option<Brood>> {
		Ok(self.broods.iter().find(|b| &*b.url == url).cloned())
	}
}

/// Peer answering with a fixed status after an optional delay
#[derive(Debug)]
pub struct FakePeer {
	pub status: Mutex<Option<u16>>,
	pub delay: Duration,
	pub calls: AtomicUsize,
	pub urls: Mutex<Vec<String>>,
}

impl FakePeer {
	/// `None` simulates a timeout
	pub fn new(status: Option<u16>, delay: Duration) -> Self {
		Self {
			status: Mutex::new(status),
			delay,
			calls: AtomicUsize::new(0),
			urls: Mutex::new(Vec::new()),
		}
	}

	pub fn calls(&self) -> usize {
		self.calls.load(Ordering::SeqCst)
	}

	pub fn set_status(&self, status: Option<u16>) {
		*self.status.lock() = status;
	}
}

#[async_trait]
impl PeerClient for FakePeer {
	async fn post_json(&self, url: &str, _body: &serde_json::Value) -> ClResult<PeerResponse> {
		self.calls.fetch_add(1, Ordering::SeqCst);
		self.urls.lock().push(url.to_string());
		if !self.delay.is_zero() {
			tokio::time::sleep(self.delay).await;
		}
		let status = *self.status.lock();
		match status {
			Some(status) => {
				Ok(PeerResponse { status, body: serde_json::json!({ "message": "peer says hi" }) })
			}
			None => Err(Error::Timeout),
		}
	}
}

pub const PEER_URL: &str = "https://peer.example.org";

pub fn user_in_org(id: i64, username: &str, admin: bool, organisation_id: i64) -> User {
	User {
		id: UserId(id),
		username: username.into(),
		email: Some(format!("{}@example.org", username).into()),
		organisation_id: Some(organisation_id),
		role: Role { id: if admin { 1 } else { 2 }, perm_admin: admin, ..Role::default() },
		disabled: false,
	}
}

pub fn user(id: i64, username: &str, admin: bool) -> User {
	user_in_org(id, username, admin, 1)
}

/// Authenticated submitter on the local network
pub fn submitted_by(user: &User) -> Submitter {
	Submitter::user(user.clone(), Some(IpAddr::from([10, 0, 0, 50])))
}

/// Anonymous submitter from `addr`
pub fn anonymous(addr: &str) -> Submitter {
	Submitter::anonymous(addr.parse().unwrap())
}

pub struct Fixture {
	pub inbox: Inbox,
	pub adapter: Arc<MemInbox>,
	pub users: Arc<MemUsers>,
	pub peer: Arc<FakePeer>,
	pub admin: User,
	pub alice: User,
	pub bob: User,
	/// Member of another organisation than the registered brood
	pub outsider: User,
}

pub fn fixture_with(peer: FakePeer, self_registration: bool, flood: FloodProtection) -> Fixture {
	let admin = user(1, "admin", true);
	let alice = user(2, "alice", false);
	let bob = user(3, "bob", false);
	let outsider = user_in_org(4, "outsider", false, 2);

	let mut config = Config::default();
	config.security.registration.self_registration = self_registration;

	let adapter = Arc::new(MemInbox::default());
	let users = Arc::new(MemUsers::with(vec![
		admin.clone(),
		alice.clone(),
		bob.clone(),
		outsider.clone(),
	]));
	let broods = Arc::new(MemBroods {
		broods: vec![Brood {
			id: 1,
			name: "Peer".into(),
			url: format!("{}/", PEER_URL).into(),
			organisation_id: Some(1),
			trusted: true,
		}],
	});
	let peer = Arc::new(peer);

	let inbox = cerebrate_inbox::init(
		&config,
		adapter.clone(),
		users.clone(),
		broods,
		peer.clone(),
		Arc::new(flood),
	)
	.unwrap();

	Fixture { inbox, adapter, users, peer, admin, alice, bob, outsider }
}

pub fn fixture() -> Fixture {
	fixture_with(FakePeer::new(Some(200), Duration::ZERO), true, FloodProtection::new(false))
}

// vim: ts=4
