//! User/Registration: self-registration of a new account, reviewed by an admin

use async_trait::async_trait;
use serde::Deserialize;
use std::sync::Arc;

use cerebrate_core::flood::FloodProtection;
use cerebrate_types::directory::{CreateUser, User};
use cerebrate_types::error::FieldErrors;
use cerebrate_types::inbox_adapter::InboxEntry;

use crate::prelude::*;
use crate::processor::{ActionResult, InboxRequest, RequestProcessor, Submitter};
use crate::store::{InboxStore, NewInboxEntry};

pub const SCOPE: &str = "User";
pub const ACTION: &str = "Registration";

const BCRYPT_COST: u32 = 10;
const MIN_PASSWORD_LENGTH: usize = 12;
const MAX_USERNAME_LENGTH: usize = 64;
const NO_COMMENT: &str = "-no comment-";

pub struct RegistrationProcessor {
	self_registration: bool,
	flood: Arc<FloodProtection>,
}

impl RegistrationProcessor {
	pub fn new(self_registration: bool, flood: Arc<FloodProtection>) -> Self {
		Self { self_registration, flood }
	}
}

/// Account data kept in the entry until an admin accepts it
#[derive(Debug, Deserialize)]
struct PendingAccount {
	username: Box<str>,
	email: Box<str>,
	first_name: Box<str>,
	last_name: Box<str>,
	password_hash: Box<str>,
}

/// Choices an admin may make when accepting
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct AcceptOptions {
	organisation_id: Option<i64>,
	role_id: Option<i64>,
	disabled: bool,
}

fn valid_username(username: &str) -> bool {
	!username.is_empty()
		&& username.len() <= MAX_USERNAME_LENGTH
		&& username.chars().all(|c| c.is_ascii_alphanumeric() || "._@+-".contains(c))
}

fn valid_email(email: &str) -> bool {
	match email.split_once('@') {
		Some((local, domain)) => {
			!local.is_empty()
				&& !domain.contains('@')
				&& domain.contains('.')
				&& !domain.starts_with('.')
				&& !domain.ends_with('.')
				&& !email.chars().any(char::is_whitespace)
		}
		None => false,
	}
}

async fn hash_password(password: String) -> ClResult<Box<str>> {
	tokio::task::spawn_blocking(move || bcrypt::hash(password, BCRYPT_COST))
		.await
		.map_err(|e| Error::Internal(format!("password hashing task failed: {}", e)))?
		.map(Box::from)
		.map_err(|e| Error::Internal(format!("password hashing failed: {}", e)))
}

#[async_trait]
impl RequestProcessor for RegistrationProcessor {
	fn scope(&self) -> &'static str {
		SCOPE
	}

	fn action(&self) -> &'static str {
		ACTION
	}

	fn description(&self) -> &'static str {
		"Handle user account creation requests"
	}

	async fn validate(
		&self,
		store: &InboxStore,
		submitter: &Submitter,
		request: &InboxRequest,
	) -> ClResult<()> {
		if !self.self_registration {
			warn!("Self-registration attempt from {:?} while registration is closed", submitter.addr);
			return Err(Error::Unauthorized);
		}
		match submitter.addr {
			Some(addr) => self.flood.check(addr)?,
			None if self.flood.is_enabled() => {
				return Err(Error::Internal("registration without client address".into()));
			}
			None => {}
		}

		let mut errors = FieldErrors::new();
		let mut add = |field: &str, msg: &str| {
			errors.entry(field.into()).or_default().push(msg.into());
		};

		for field in ["username", "email", "first_name", "last_name", "password"] {
			if request.data_str(field).is_none_or(|v| v.trim().is_empty()) {
				add(field, "This field is required");
			}
		}
		if let Some(username) = request.data_str("username").filter(|u| !u.is_empty()) {
			if !valid_username(username) {
				add("username", "Usernames may only contain letters, digits and . _ @ + -");
			} else if store.users().find_user_by_username(username).await?.is_some() {
				add("username", "This username is already taken");
			}
		}
		if let Some(email) = request.data_str("email").filter(|e| !e.is_empty()) {
			if !valid_email(email) {
				add("email", "Invalid email address");
			}
		}
		if let Some(password) = request.data_str("password").filter(|p| !p.is_empty()) {
			if password.chars().count() < MIN_PASSWORD_LENGTH {
				add("password", "The password must be at least 12 characters long");
			}
		}

		if errors.is_empty() {
			Ok(())
		} else {
			warn!("Rejected registration request from {:?}: {:?}", submitter.addr, errors);
			Err(Error::FieldValidation(errors))
		}
	}

	async fn build_entry(
		&self,
		_store: &InboxStore,
		submitter: &Submitter,
		request: InboxRequest,
	) -> ClResult<NewInboxEntry> {
		let field = |name: &str| request.data_str(name).unwrap_or_default().trim().to_string();
		let username = field("username");
		let password = request.data_str("password").unwrap_or_default().to_string();
		let password_hash = hash_password(password).await?;

		// the clear-text password never reaches storage
		let data = serde_json::json!({
			"username": username,
			"email": field("email"),
			"first_name": field("first_name"),
			"last_name": field("last_name"),
			"password_hash": password_hash,
		});

		let comment =
			request.comment.filter(|c| !c.trim().is_empty()).unwrap_or_else(|| NO_COMMENT.into());
		Ok(NewInboxEntry {
			scope: SCOPE.into(),
			action: ACTION.into(),
			title: format!("User account creation requested for `{}`", username).into(),
			origin: match submitter.addr {
				Some(addr) => addr.to_string().into(),
				None => request.origin,
			},
			comment: Some(comment),
			data,
			severity: request.severity.unwrap_or_default(),
			user_id: None,
		})
	}

	async fn accept(
		&self,
		store: &InboxStore,
		actor: &User,
		entry: &InboxEntry,
		input: &serde_json::Value,
	) -> ClResult<ActionResult> {
		let account: PendingAccount = serde_json::from_value(entry.data.clone()).map_err(|e| {
			Error::Internal(format!("corrupt registration entry {}: {}", entry.id, e))
		})?;
		let opts: AcceptOptions = if input.is_null() {
			AcceptOptions::default()
		} else {
			serde_json::from_value(input.clone())
				.map_err(|e| Error::ValidationError(format!("Invalid options: {}", e)))?
		};

		let create = CreateUser {
			username: account.username.clone(),
			email: account.email,
			first_name: account.first_name,
			last_name: account.last_name,
			password_hash: account.password_hash,
			organisation_id: opts.organisation_id.or(actor.organisation_id),
			role_id: opts.role_id,
			disabled: opts.disabled,
		};

		match store.users().create_user(&create).await {
			Ok(user) => {
				info!("User {} created from registration {}", user.username, entry.id);
				let saved = serde_json::to_value(&user)?;
				Ok(ActionResult::success(format!("User `{}` created", user.username), saved))
			}
			Err(Error::Conflict(_)) => Ok(ActionResult::failure(format!(
				"Could not create user `{}`: the username is already taken",
				account.username
			))),
			Err(err) => Err(err),
		}
	}
}


// vim: ts=4
