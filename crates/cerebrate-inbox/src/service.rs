//! Inbox operations with caller authorisation

use cerebrate_types::directory::User;
use cerebrate_types::inbox_adapter::InboxEntry;

use crate::notification::{collect_notifications, NotificationDescriptor};
use crate::prelude::*;
use crate::processor::{
	ActionResult, CreateResult, InboxRequest, ProcessorInfo, ProcessorRegistry, Submitter,
};
use crate::store::InboxStore;

pub struct Inbox {
	store: InboxStore,
	processors: ProcessorRegistry,
}

impl Inbox {
	pub fn new(store: InboxStore, processors: ProcessorRegistry) -> Self {
		Self { store, processors }
	}

	pub fn store(&self) -> &InboxStore {
		&self.store
	}

	pub fn list_processors(&self) -> Vec<ProcessorInfo> {
		self.processors.list()
	}

	/// Owners may resolve their entries; admins any entry, including unassigned ones
	fn authorize(actor: &User, entry: &InboxEntry) -> ClResult<()> {
		if actor.is_admin() || entry.user_id == Some(actor.id) {
			Ok(())
		} else {
			warn!("User {} denied access to inbox entry {}", actor.id, entry.id);
			Err(Error::PermissionDenied)
		}
	}

	/// Route a submitted request to its processor
	pub async fn create_request(
		&self,
		scope: &str,
		action: &str,
		submitter: &Submitter,
		request: InboxRequest,
	) -> ClResult<CreateResult> {
		let processor = self.processors.get_processor(scope, action)?;
		processor.create(&self.store, submitter, request).await
	}

	pub async fn get_entry(&self, actor: &User, id: &str) -> ClResult<InboxEntry> {
		let entry = self.store.read_entry(id).await?;
		Self::authorize(actor, &entry)?;
		Ok(entry)
	}

	pub async fn process_entry(
		&self,
		actor: &User,
		id: &str,
		input: &serde_json::Value,
	) -> ClResult<ActionResult> {
		let entry = self.get_entry(actor, id).await?;
		if entry.is_resolved() {
			return Ok(ActionResult::failure("Request already resolved"));
		}
		let processor = self.processors.get_processor(&entry.scope, &entry.action)?;
		processor.process(&self.store, actor, id, input).await
	}

	/// Returns whether this call resolved the entry
	pub async fn discard_entry(&self, actor: &User, id: &str) -> ClResult<bool> {
		let entry = self.get_entry(actor, id).await?;
		if entry.is_resolved() {
			debug!("Inbox entry {} already resolved, discard is a no-op", id);
			return Ok(false);
		}
		let processor = self.processors.get_processor(&entry.scope, &entry.action)?;
		processor.discard(&self.store, actor, id).await
	}

	pub async fn get_notifications_for_user(&self, user: &User) -> ClResult<Vec<InboxEntry>> {
		self.store.get_notifications_for_user(user).await
	}

	pub async fn collect_notifications(&self, user: &User) -> ClResult<Vec<NotificationDescriptor>> {
		let entries = self.store.get_notifications_for_user(user).await?;
		Ok(collect_notifications(&entries))
	}
}

// vim: ts=4
