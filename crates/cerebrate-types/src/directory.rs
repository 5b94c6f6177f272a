//! Read interfaces to the user directory and the peer ("brood") registry.
//!
//! The inbox and settings subsystems only ever look users and broods up by key,
//! so both are injected as narrow traits instead of reaching into other stores.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_with::skip_serializing_none;
use std::fmt::Debug;

use crate::prelude::*;

/// Role flags attached to a user
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Role {
	pub id: i64,
	pub name: Box<str>,
	pub perm_admin: bool,
	pub perm_org_admin: bool,
	pub perm_community_admin: bool,
}

#[skip_serializing_none]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
	pub id: UserId,
	pub username: Box<str>,
	pub email: Option<Box<str>>,
	pub organisation_id: Option<i64>,
	pub role: Role,
	pub disabled: bool,
}

impl User {
	pub fn is_admin(&self) -> bool {
		self.role.perm_admin
	}
}

/// Data needed to create a user (e.g. from an accepted self-registration)
#[derive(Debug, Clone)]
pub struct CreateUser {
	pub username: Box<str>,
	pub email: Box<str>,
	pub first_name: Box<str>,
	pub last_name: Box<str>,
	pub password_hash: Box<str>,
	pub organisation_id: Option<i64>,
	pub role_id: Option<i64>,
	pub disabled: bool,
}

/// A registered peer instance
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Brood {
	pub id: i64,
	pub name: Box<str>,
	pub url: Box<str>,
	pub organisation_id: Option<i64>,
	pub trusted: bool,
}

#[async_trait]
pub trait UserDirectory: Debug + Send + Sync {
	/// Fails with `Error::NotFound` for unknown ids
	async fn get_user(&self, id: UserId) -> ClResult<User>;

	async fn find_user_by_username(&self, username: &str) -> ClResult<Option<User>>;

	/// Fails with `Error::Conflict` when the username is already taken
	async fn create_user(&self, user: &CreateUser) -> ClResult<User>;
}

#[async_trait]
pub trait BroodRegistry: Debug + Send + Sync {
	/// Exact match on the stored url
	async fn find_brood_by_url(&self, url: &str) -> ClResult<Option<Brood>>;
}

// vim: ts=4
