//! Request-scoped middleware

use axum::{
	extract::Request,
	http::{HeaderName, HeaderValue},
	middleware::Next,
	response::Response,
};

use cerebrate_core::extract::RequestId;

pub static REQUEST_ID_HEADER: HeaderName = HeaderName::from_static("x-request-id");

/// Longest client-supplied request id that is passed through unchanged
const MAX_REQUEST_ID_LENGTH: usize = 64;

/// Attach a request id to the request and echo it in the response.
///
/// A well-formed `X-Request-Id` from the client is kept, otherwise a new one is generated.
pub async fn request_id(mut req: Request, next: Next) -> Response {
	let req_id = req
		.headers()
		.get(&REQUEST_ID_HEADER)
		.and_then(|value| value.to_str().ok())
		.filter(|id| {
			!id.is_empty()
				&& id.len() <= MAX_REQUEST_ID_LENGTH
				&& id.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
		})
		.map_or_else(|| uuid::Uuid::new_v4().simple().to_string(), str::to_string);

	req.extensions_mut().insert(RequestId(req_id.clone()));
	let mut res = next.run(req).await;
	if let Ok(value) = HeaderValue::from_str(&req_id) {
		res.headers_mut().insert(REQUEST_ID_HEADER.clone(), value);
	}
	res
}

// vim: ts=4
