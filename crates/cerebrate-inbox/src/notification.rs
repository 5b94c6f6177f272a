//! Notification descriptors for unresolved inbox entries

use serde::Serialize;
use serde_with::skip_serializing_none;

use cerebrate_types::inbox_adapter::InboxEntry;
use cerebrate_types::types::serialize_timestamp_iso;

use crate::prelude::*;

pub const NOTIFICATION_ICON: &str = "envelope";
pub const NOTIFICATION_SIDEBAR_ID: &str = "inbox";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NotificationLink {
	pub target: &'static str,
	pub action: &'static str,
	pub id: Box<str>,
}

#[skip_serializing_none]
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationDescriptor {
	pub title: Box<str>,
	pub message: Option<Box<str>>,
	pub link: NotificationLink,
	pub icon: &'static str,
	#[serde(serialize_with = "serialize_timestamp_iso")]
	pub timestamp: Timestamp,
	pub severity_variant: &'static str,
	pub display_as_modal: bool,
	pub sidebar_id: &'static str,
}

impl From<&InboxEntry> for NotificationDescriptor {
	fn from(entry: &InboxEntry) -> Self {
		NotificationDescriptor {
			title: entry.title.clone(),
			message: entry.comment.clone(),
			link: NotificationLink { target: "inbox", action: "process", id: entry.id.clone() },
			icon: NOTIFICATION_ICON,
			timestamp: entry.created,
			severity_variant: entry.severity.variant(),
			display_as_modal: true,
			sidebar_id: NOTIFICATION_SIDEBAR_ID,
		}
	}
}

/// Descriptors for the unresolved entries, order preserved
pub fn collect_notifications(entries: &[InboxEntry]) -> Vec<NotificationDescriptor> {
	entries.iter().filter(|e| !e.is_resolved()).map(NotificationDescriptor::from).collect()
}


// vim: ts=4
