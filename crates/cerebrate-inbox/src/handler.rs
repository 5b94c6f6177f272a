//! Inbox handlers

use axum::{
	body::Bytes,
	extract::{Path, State},
	http::StatusCode,
	Json,
};
use serde::{Deserialize, Serialize};

use cerebrate_core::extract::{Auth, ClientAddr, OptionalRequestId};
use cerebrate_types::inbox_adapter::InboxEntry;
use cerebrate_types::types::ApiResponse;

use crate::notification::NotificationDescriptor;
use crate::prelude::*;
use crate::processor::{ActionResult, InboxRequest, ProcessorInfo, Submitter};
use crate::processors::registration;
use crate::service::Inbox;

/// GET /inbox - Notifications of the caller
pub async fn list_notifications(
	State(app): State<App>,
	Auth(auth): Auth,
	OptionalRequestId(req_id): OptionalRequestId,
) -> ClResult<(StatusCode, Json<ApiResponse<Vec<NotificationDescriptor>>>)> {
	let inbox = app.ext::<Inbox>()?;
	let notifications = inbox.collect_notifications(&auth).await?;

	let total = notifications.len();
	let response = ApiResponse::with_pagination(notifications, 0, total, total)
		.with_req_id(req_id.unwrap_or_default());
	Ok((StatusCode::OK, Json(response)))
}

/// GET /inbox/processors - Registered request kinds
pub async fn list_processors(
	State(app): State<App>,
	Auth(_auth): Auth,
	OptionalRequestId(req_id): OptionalRequestId,
) -> ClResult<(StatusCode, Json<ApiResponse<Vec<ProcessorInfo>>>)> {
	let inbox = app.ext::<Inbox>()?;
	let response = ApiResponse::new(inbox.list_processors()).with_req_id(req_id.unwrap_or_default());
	Ok((StatusCode::OK, Json(response)))
}

/// GET /inbox/{id}
pub async fn get_entry(
	State(app): State<App>,
	Auth(auth): Auth,
	Path(id): Path<String>,
	OptionalRequestId(req_id): OptionalRequestId,
) -> ClResult<(StatusCode, Json<ApiResponse<InboxEntry>>)> {
	let inbox = app.ext::<Inbox>()?;
	let entry = inbox.get_entry(&auth, &id).await?;
	let response = ApiResponse::new(entry).with_req_id(req_id.unwrap_or_default());
	Ok((StatusCode::OK, Json(response)))
}

/// POST /inbox/{id}/process - Accept a request. The optional body is passed to the processor.
pub async fn process_entry(
	State(app): State<App>,
	Auth(auth): Auth,
	Path(id): Path<String>,
	OptionalRequestId(req_id): OptionalRequestId,
	body: Bytes,
) -> ClResult<(StatusCode, Json<ApiResponse<ActionResult>>)> {
	let input =
		if body.is_empty() { serde_json::Value::Null } else { serde_json::from_slice(&body)? };

	let inbox = app.ext::<Inbox>()?;
	let result = inbox.process_entry(&auth, &id, &input).await?;
	let response = ApiResponse::new(result).with_req_id(req_id.unwrap_or_default());
	Ok((StatusCode::OK, Json(response)))
}

#[derive(Serialize)]
pub struct DiscardResponse {
	pub discarded: bool,
}

/// POST /inbox/{id}/discard
pub async fn discard_entry(
	State(app): State<App>,
	Auth(auth): Auth,
	Path(id): Path<String>,
	OptionalRequestId(req_id): OptionalRequestId,
) -> ClResult<(StatusCode, Json<ApiResponse<DiscardResponse>>)> {
	let inbox = app.ext::<Inbox>()?;
	let discarded = inbox.discard_entry(&auth, &id).await?;
	let response =
		ApiResponse::new(DiscardResponse { discarded }).with_req_id(req_id.unwrap_or_default());
	Ok((StatusCode::OK, Json(response)))
}

/// POST /inbox/requests/{scope}/{action} - Submit a request
pub async fn submit_request(
	State(app): State<App>,
	Auth(auth): Auth,
	ClientAddr(addr): ClientAddr,
	Path((scope, action)): Path<(String, String)>,
	OptionalRequestId(req_id): OptionalRequestId,
	Json(request): Json<InboxRequest>,
) -> ClResult<(StatusCode, Json<ApiResponse<InboxEntry>>)> {
	let inbox = app.ext::<Inbox>()?;
	let username = auth.username.clone();
	let submitter = Submitter::user(auth, Some(addr));
	let created = inbox.create_request(&scope, &action, &submitter, request).await?;
	info!("User {} submitted {}/{} request {}", username, scope, action, created.entry.id);

	let response = ApiResponse::new(created.entry).with_req_id(req_id.unwrap_or_default());
	Ok((StatusCode::CREATED, Json(response)))
}

#[derive(Deserialize)]
pub struct RegisterRequest {
	pub username: String,
	pub email: String,
	pub first_name: String,
	pub last_name: String,
	pub password: String,
	#[serde(default)]
	pub comment: Option<Box<str>>,
}

#[derive(Serialize)]
pub struct RegisterResponse {
	pub success: bool,
	pub message: &'static str,
}

/// POST /users/register - Anonymous self-registration, queued for admin review
pub async fn register(
	State(app): State<App>,
	ClientAddr(addr): ClientAddr,
	OptionalRequestId(req_id): OptionalRequestId,
	Json(req): Json<RegisterRequest>,
) -> ClResult<(StatusCode, Json<ApiResponse<RegisterResponse>>)> {
	let request = InboxRequest {
		comment: req.comment,
		data: serde_json::json!({
			"username": req.username,
			"email": req.email,
			"first_name": req.first_name,
			"last_name": req.last_name,
			"password": req.password,
		}),
		..InboxRequest::default()
	};

	let inbox = app.ext::<Inbox>()?;
	inbox
		.create_request(
			registration::SCOPE,
			registration::ACTION,
			&Submitter::anonymous(addr),
			request,
		)
		.await?;

	let response = ApiResponse::new(RegisterResponse {
		success: true,
		message: "Your registration request has been sent and is awaiting review",
	})
	.with_req_id(req_id.unwrap_or_default());
	Ok((StatusCode::CREATED, Json(response)))
}

// vim: ts=4
