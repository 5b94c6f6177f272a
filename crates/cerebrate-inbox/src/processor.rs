//! Request processors and their registry
//!
//! A processor owns one (scope, action) request kind: how an incoming request is
//! validated and turned into an inbox entry, and what accepting it does. The
//! create/process/discard flow around those hooks is shared by all processors.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::net::IpAddr;
use std::sync::Arc;

use cerebrate_types::directory::User;
use cerebrate_types::inbox_adapter::InboxEntry;

use crate::prelude::*;
use crate::store::{InboxStore, NewInboxEntry};

/// Incoming request data
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InboxRequest {
	pub title: Option<Box<str>>,
	#[serde(default)]
	pub origin: Box<str>,
	pub comment: Option<Box<str>>,
	#[serde(default)]
	pub data: serde_json::Value,
	pub severity: Option<Severity>,
	pub user_id: Option<UserId>,
}

impl InboxRequest {
	/// String field of the payload
	pub fn data_str(&self, field: &str) -> Option<&str> {
		self.data.get(field).and_then(|v| v.as_str())
	}
}

/// Who sent a request, as established by the HTTP layer rather than the payload
#[derive(Debug, Clone, Default)]
pub struct Submitter {
	/// Authenticated user. `None` on anonymous endpoints.
	pub user: Option<User>,
	pub addr: Option<IpAddr>,
}

impl Submitter {
	pub fn user(user: User, addr: Option<IpAddr>) -> Self {
		Self { user: Some(user), addr }
	}

	pub fn anonymous(addr: IpAddr) -> Self {
		Self { user: None, addr: Some(addr) }
	}
}

#[derive(Debug, Clone, Serialize)]
pub struct CreateResult {
	pub success: bool,
	pub entry: InboxEntry,
}

/// Outcome of accepting a request. Expected business failures are `success: false`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionResult {
	pub success: bool,
	pub message: String,
	pub saved_result: serde_json::Value,
}

impl ActionResult {
	pub fn success(message: impl Into<String>, saved_result: serde_json::Value) -> Self {
		Self { success: true, message: message.into(), saved_result }
	}

	pub fn failure(message: impl Into<String>) -> Self {
		Self { success: false, message: message.into(), saved_result: serde_json::Value::Null }
	}
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProcessorInfo {
	pub scope: &'static str,
	pub action: &'static str,
	pub description: &'static str,
}

#[async_trait]
pub trait RequestProcessor: Send + Sync {
	fn scope(&self) -> &'static str;
	fn action(&self) -> &'static str;
	fn description(&self) -> &'static str;

	/// Reject malformed or inadmissible requests, typically with `Error::FieldValidation`
	async fn validate(
		&self,
		store: &InboxStore,
		submitter: &Submitter,
		request: &InboxRequest,
	) -> ClResult<()>;

	/// Shape a validated request into entry data
	async fn build_entry(
		&self,
		store: &InboxStore,
		submitter: &Submitter,
		request: InboxRequest,
	) -> ClResult<NewInboxEntry> {
		let _ = (store, submitter);
		Ok(NewInboxEntry {
			scope: self.scope().into(),
			action: self.action().into(),
			title: request.title.unwrap_or_default(),
			origin: request.origin,
			comment: request.comment,
			data: request.data,
			severity: request.severity.unwrap_or_default(),
			user_id: request.user_id,
		})
	}

	/// Apply the side effect of accepting `entry`. Runs while the entry is claimed.
	async fn accept(
		&self,
		store: &InboxStore,
		actor: &User,
		entry: &InboxEntry,
		input: &serde_json::Value,
	) -> ClResult<ActionResult>;

	/// Called after this caller discarded `entry`
	async fn on_discard(&self, store: &InboxStore, entry: &InboxEntry) -> ClResult<()> {
		let _ = (store, entry);
		Ok(())
	}

	/// Validate and persist. Nothing is stored when validation fails.
	async fn create(
		&self,
		store: &InboxStore,
		submitter: &Submitter,
		request: InboxRequest,
	) -> ClResult<CreateResult> {
		self.validate(store, submitter, &request).await?;
		let entry = self.build_entry(store, submitter, request).await?;
		let entry = store.create_entry(entry).await?;
		Ok(CreateResult { success: true, entry })
	}

	/// Accept entry `id`. At most one concurrent caller applies the side effect;
	/// the others, and calls on resolved entries, get `success: false` and change nothing.
	async fn process(
		&self,
		store: &InboxStore,
		actor: &User,
		id: &str,
		input: &serde_json::Value,
	) -> ClResult<ActionResult> {
		let Some(claim) = store.claim(id).await? else {
			// absent entries still surface as NotFound
			let entry = store.read_entry(id).await?;
			debug!("Inbox entry {} not claimable (status {:?})", id, entry.status);
			return Ok(ActionResult::failure(if entry.is_resolved() {
				"Request already resolved"
			} else {
				"Request is being processed"
			}));
		};

		let entry = store.read_entry(id).await?;
		let result = match self.accept(store, actor, &entry, input).await {
			Ok(result) => result,
			Err(err) => {
				store.release(id, &claim).await?;
				return Err(err);
			}
		};

		if result.success {
			if !store.accept(id, &claim, actor.id).await? {
				warn!("Inbox entry {} was taken over while being processed", id);
			}
		} else {
			info!("Inbox entry {} not accepted: {}", id, result.message);
			store.release(id, &claim).await?;
		}
		Ok(result)
	}

	/// Resolve entry `id` without side effect. Returns whether this call resolved it.
	async fn discard(&self, store: &InboxStore, actor: &User, id: &str) -> ClResult<bool> {
		if !store.discard(id, actor.id).await? {
			// absent entries still surface as NotFound
			store.read_entry(id).await?;
			return Ok(false);
		}
		let entry = store.read_entry(id).await?;
		self.on_discard(store, &entry).await?;
		Ok(true)
	}
}

/// (scope, action) -> processor, fixed after start-up
#[derive(Default)]
pub struct ProcessorRegistry {
	processors: HashMap<(Box<str>, Box<str>), Arc<dyn RequestProcessor>>,
}

impl ProcessorRegistry {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn register(&mut self, processor: Arc<dyn RequestProcessor>) -> ClResult<()> {
		let key: (Box<str>, Box<str>) = (processor.scope().into(), processor.action().into());
		if self.processors.contains_key(&key) {
			return Err(Error::ConfigError(format!(
				"Processor {}/{} is already registered",
				key.0, key.1
			)));
		}
		info!("Registered request processor {}/{}", key.0, key.1);
		self.processors.insert(key, processor);
		Ok(())
	}

	pub fn get_processor(&self, scope: &str, action: &str) -> ClResult<Arc<dyn RequestProcessor>> {
		self.processors.get(&(Box::from(scope), Box::from(action))).cloned().ok_or_else(|| {
			error!("No request processor registered for {}/{}", scope, action);
			Error::UnknownProcessor { scope: scope.into(), action: action.into() }
		})
	}

	/// Registered processors ordered by scope, then action
	pub fn list(&self) -> Vec<ProcessorInfo> {
		let mut list: Vec<ProcessorInfo> = self
			.processors
			.values()
			.map(|p| ProcessorInfo {
				scope: p.scope(),
				action: p.action(),
				description: p.description(),
			})
			.collect();
		list.sort_by(|a, b| (a.scope, a.action).cmp(&(b.scope, b.action)));
		list
	}

	pub fn len(&self) -> usize {
		self.processors.len()
	}

	pub fn is_empty(&self) -> bool {
		self.processors.is_empty()
	}
}

// vim: ts=4
