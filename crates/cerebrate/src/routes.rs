//! HTTP route table

use axum::{
	middleware,
	routing::{get, post, put},
	Router,
};

use cerebrate_core::settings::handler as settings;
use cerebrate_inbox::handler as inbox;

use crate::middleware::request_id;
use crate::prelude::*;

pub fn init(app: App) -> Router {
	let inbox_router = Router::new()
		.route("/api/inbox", get(inbox::list_notifications))
		.route("/api/inbox/processors", get(inbox::list_processors))
		.route("/api/inbox/requests/{scope}/{action}", post(inbox::submit_request))
		.route("/api/inbox/{id}", get(inbox::get_entry))
		.route("/api/inbox/{id}/process", post(inbox::process_entry))
		.route("/api/inbox/{id}/discard", post(inbox::discard_entry))
		.route("/api/users/register", post(inbox::register));

	let settings_router = Router::new()
		.route("/api/users/settings", get(settings::get_settings))
		.route(
			"/api/users/settings/bookmarks",
			post(settings::save_bookmark).delete(settings::delete_bookmark),
		)
		.route(
			"/api/users/settings/{name}",
			put(settings::update_setting).delete(settings::delete_setting),
		)
		.route("/api/users/{user_id}/settings", get(settings::get_user_settings));

	Router::new()
		.merge(inbox_router)
		.merge(settings_router)
		.layer(middleware::from_fn(request_id))
		.with_state(app)
}

// vim: ts=4
