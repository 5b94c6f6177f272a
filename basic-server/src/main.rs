//! Cerebrate server with every adapter backed by one SQLite database.
//!
//! Sessions are handled by a reverse proxy in front of this server, which
//! forwards the authenticated user's id in `X-Auth-User-Id`.

use axum::{
	extract::{Request, State},
	middleware::{self, Next},
	response::{IntoResponse, Response},
};
use std::sync::Arc;

use cerebrate::AppBuilder;
use cerebrate_core::config::Config;
use cerebrate_core::extract::Auth;
use cerebrate_meta_adapter_sqlite::MetaAdapterSqlite;
use cerebrate_types::directory::UserDirectory;
use cerebrate_types::prelude::*;

const AUTH_USER_HEADER: &str = "x-auth-user-id";

/// Resolve the user id set by the authenticating proxy
async fn proxy_auth(
	State(users): State<Arc<dyn UserDirectory>>,
	mut req: Request,
	next: Next,
) -> Response {
	let user_id = req
		.headers()
		.get(AUTH_USER_HEADER)
		.and_then(|value| value.to_str().ok())
		.and_then(|value| value.trim().parse::<i64>().ok());

	if let Some(user_id) = user_id {
		match users.get_user(UserId(user_id)).await {
			Ok(user) => {
				req.extensions_mut().insert(Auth(user));
			}
			Err(Error::NotFound) => warn!("Proxy sent unknown user id {}", user_id),
			Err(err) => return err.into_response(),
		}
	}
	next.run(req).await
}

#[tokio::main]
async fn main() -> ClResult<()> {
	let mut builder = AppBuilder::new();
	let config = Config::from_env()?;
	let adapter = Arc::new(MetaAdapterSqlite::new(&config.db_dir).await?);
	let users: Arc<dyn UserDirectory> = adapter.clone();

	builder
		.config(config)
		.inbox_adapter(adapter.clone())
		.setting_adapter(adapter.clone())
		.user_directory(users.clone())
		.brood_registry(adapter)
		.wrap_router(move |router| router.layer(middleware::from_fn_with_state(users, proxy_auth)));
	builder.run().await
}

// vim: ts=4
