//! User settings handlers

use axum::{
	extract::{Path, State},
	http::StatusCode,
	Json,
};
use serde::{Deserialize, Serialize};

use cerebrate_types::setting_adapter::UserSetting;
use cerebrate_types::types::ApiResponse;

use super::service::{BookmarkRequest, UserSettingsBundle};
use crate::extract::{Auth, OptionalRequestId};
use crate::prelude::*;

/// GET /users/settings - Full settings bundle of the caller
pub async fn get_settings(
	State(app): State<App>,
	Auth(auth): Auth,
	OptionalRequestId(req_id): OptionalRequestId,
) -> ClResult<(StatusCode, Json<ApiResponse<UserSettingsBundle>>)> {
	let bundle = app.settings.get_settings_from_provider_for_user(auth.id, true).await?;
	let response = ApiResponse::new(bundle).with_req_id(req_id.unwrap_or_default());
	Ok((StatusCode::OK, Json(response)))
}

/// GET /users/{user_id}/settings - Full settings bundle of another user (admins only)
pub async fn get_user_settings(
	State(app): State<App>,
	Auth(auth): Auth,
	Path(user_id): Path<i64>,
	OptionalRequestId(req_id): OptionalRequestId,
) -> ClResult<(StatusCode, Json<ApiResponse<UserSettingsBundle>>)> {
	let user_id = UserId(user_id);
	app.settings.authorize(&auth, user_id)?;
	// make sure the target exists
	app.user_directory.get_user(user_id).await?;

	let bundle = app.settings.get_settings_from_provider_for_user(user_id, true).await?;
	let response = ApiResponse::new(bundle).with_req_id(req_id.unwrap_or_default());
	Ok((StatusCode::OK, Json(response)))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateSettingRequest {
	pub value: String,
	/// Target user, defaults to the caller
	pub user_id: Option<UserId>,
}

/// PUT /users/settings/{name} - Create or overwrite a setting
pub async fn update_setting(
	State(app): State<App>,
	Auth(auth): Auth,
	Path(name): Path<String>,
	OptionalRequestId(req_id): OptionalRequestId,
	Json(req): Json<UpdateSettingRequest>,
) -> ClResult<(StatusCode, Json<ApiResponse<UserSetting>>)> {
	let user_id = req.user_id.unwrap_or(auth.id);
	app.settings.authorize(&auth, user_id)?;

	let setting = app.settings.set_setting(user_id, &name, &req.value).await?;
	info!("User {} set setting {} of user {}", auth.username, name, user_id);

	let response = ApiResponse::new(setting).with_req_id(req_id.unwrap_or_default());
	Ok((StatusCode::OK, Json(response)))
}

/// DELETE /users/settings/{name}
pub async fn delete_setting(
	State(app): State<App>,
	Auth(auth): Auth,
	Path(name): Path<String>,
) -> ClResult<StatusCode> {
	if app.settings.delete_setting(auth.id, &name).await? {
		Ok(StatusCode::NO_CONTENT)
	} else {
		Err(Error::NotFound)
	}
}

#[derive(Serialize)]
pub struct BookmarkResponse {
	pub saved: bool,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub setting: Option<UserSetting>,
}

/// POST /users/settings/bookmarks - Append a bookmark
pub async fn save_bookmark(
	State(app): State<App>,
	Auth(auth): Auth,
	OptionalRequestId(req_id): OptionalRequestId,
	Json(req): Json<BookmarkRequest>,
) -> ClResult<(StatusCode, Json<ApiResponse<BookmarkResponse>>)> {
	let setting = app.settings.save_bookmark(auth.id, req.into()).await?;
	let (status, saved) = if setting.is_some() {
		(StatusCode::CREATED, true)
	} else {
		(StatusCode::OK, false)
	};

	let response = ApiResponse::new(BookmarkResponse { saved, setting })
		.with_req_id(req_id.unwrap_or_default());
	Ok((status, Json(response)))
}

#[derive(Deserialize)]
pub struct DeleteBookmarkRequest {
	pub bookmark_name: String,
	pub bookmark_url: String,
}

/// DELETE /users/settings/bookmarks - Remove matching bookmarks
pub async fn delete_bookmark(
	State(app): State<App>,
	Auth(auth): Auth,
	OptionalRequestId(req_id): OptionalRequestId,
	Json(req): Json<DeleteBookmarkRequest>,
) -> ClResult<(StatusCode, Json<ApiResponse<BookmarkResponse>>)> {
	let setting =
		app.settings.delete_bookmark(auth.id, &req.bookmark_name, &req.bookmark_url).await?;

	let response = ApiResponse::new(BookmarkResponse { saved: setting.is_some(), setting })
		.with_req_id(req_id.unwrap_or_default());
	Ok((StatusCode::OK, Json(response)))
}

// vim: ts=4
