//! Error type shared by every Cerebrate crate.

use std::collections::BTreeMap;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;

pub type ClResult<T> = std::result::Result<T, Error>;

/// Field name -> validation messages
pub type FieldErrors = BTreeMap<Box<str>, Vec<Box<str>>>;

#[derive(Debug)]
pub enum Error {
	NotFound,
	PermissionDenied,
	Unauthorized,
	DbError,
	/// Lost an optimistic-concurrency race
	Conflict(String),
	RateLimited,
	Timeout,

	// input validation
	ValidationError(String),
	FieldValidation(FieldErrors),
	InvalidFormat(String),
	DomainNotAllowed { allowed: Vec<Box<str>> },

	/// No processor registered for a (scope, action) pair
	UnknownProcessor { scope: Box<str>, action: Box<str> },

	ConfigError(String),
	NetworkError(String),
	Internal(String),

	// externals
	Io(std::io::Error),
}

impl Error {
	/// Build a single-field validation error
	pub fn field(field: &str, message: impl Into<Box<str>>) -> Self {
		let mut errors = FieldErrors::new();
		errors.insert(field.into(), vec![message.into()]);
		Error::FieldValidation(errors)
	}

	fn code(&self) -> &'static str {
		match self {
			Error::NotFound => "E-NOT-FOUND",
			Error::PermissionDenied => "E-PERMISSION-DENIED",
			Error::Unauthorized => "E-UNAUTHORIZED",
			Error::Conflict(_) => "E-CONFLICT",
			Error::RateLimited => "E-RATE-LIMITED",
			Error::Timeout => "E-TIMEOUT",
			Error::ValidationError(_) | Error::FieldValidation(_) => "E-VALIDATION",
			Error::InvalidFormat(_) => "E-INVALID-FORMAT",
			Error::DomainNotAllowed { .. } => "E-DOMAIN-NOT-ALLOWED",
			Error::UnknownProcessor { .. } => "E-UNKNOWN-PROCESSOR",
			Error::NetworkError(_) => "E-NETWORK",
			Error::DbError
			| Error::ConfigError(_)
			| Error::Internal(_)
			| Error::Io(_) => "E-INTERNAL",
		}
	}

	fn status(&self) -> StatusCode {
		match self {
			Error::NotFound => StatusCode::NOT_FOUND,
			Error::PermissionDenied => StatusCode::FORBIDDEN,
			Error::Unauthorized => StatusCode::UNAUTHORIZED,
			Error::Conflict(_) => StatusCode::CONFLICT,
			Error::RateLimited => StatusCode::TOO_MANY_REQUESTS,
			Error::Timeout => StatusCode::GATEWAY_TIMEOUT,
			Error::ValidationError(_)
			| Error::FieldValidation(_)
			| Error::InvalidFormat(_)
			| Error::DomainNotAllowed { .. } => StatusCode::UNPROCESSABLE_ENTITY,
			Error::NetworkError(_) => StatusCode::SERVICE_UNAVAILABLE,
			Error::DbError
			| Error::UnknownProcessor { .. }
			| Error::ConfigError(_)
			| Error::Internal(_)
			| Error::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
		}
	}
}

impl std::fmt::Display for Error {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			Error::NotFound => write!(f, "not found"),
			Error::PermissionDenied => write!(f, "permission denied"),
			Error::Unauthorized => write!(f, "unauthorized"),
			Error::DbError => write!(f, "database error"),
			Error::Conflict(msg) => write!(f, "conflict: {}", msg),
			Error::RateLimited => write!(f, "rate limited"),
			Error::Timeout => write!(f, "timeout"),
			Error::ValidationError(msg) => write!(f, "validation error: {}", msg),
			Error::FieldValidation(errors) => {
				write!(f, "validation error:")?;
				for (field, messages) in errors {
					write!(f, " {}: {};", field, messages.join(", "))?;
				}
				Ok(())
			}
			Error::InvalidFormat(msg) => write!(f, "invalid format: {}", msg),
			Error::DomainNotAllowed { allowed } => write!(
				f,
				"Invalid domain for bookmark. The only domains allowed are: {}",
				allowed.join(", ")
			),
			Error::UnknownProcessor { scope, action } => {
				write!(f, "no request processor registered for {}/{}", scope, action)
			}
			Error::ConfigError(msg) => write!(f, "configuration error: {}", msg),
			Error::NetworkError(msg) => write!(f, "network error: {}", msg),
			Error::Internal(msg) => write!(f, "internal error: {}", msg),
			Error::Io(err) => write!(f, "io error: {}", err),
		}
	}
}

impl std::error::Error for Error {}

impl From<std::io::Error> for Error {
	fn from(err: std::io::Error) -> Self {
		Self::Io(err)
	}
}

impl From<serde_json::Error> for Error {
	fn from(err: serde_json::Error) -> Self {
		Self::InvalidFormat(err.to_string())
	}
}

impl IntoResponse for Error {
	fn into_response(self) -> Response {
		let status = self.status();
		let code = self.code();

		// Internal details stay in the log, not in the response
		let message = if status.is_server_error() {
			tracing::error!("request failed: {}", self);
			"Internal server error".to_string()
		} else {
			self.to_string()
		};

		let details = match &self {
			Error::FieldValidation(errors) => serde_json::json!({ "fields": errors }),
			Error::DomainNotAllowed { allowed } => serde_json::json!({ "allowed": allowed }),
			_ => serde_json::Value::Null,
		};

		let body = serde_json::json!({
			"error": {
				"code": code,
				"message": message,
				"details": details,
			}
		});

		(status, Json(body)).into_response()
	}
}


// vim: ts=4
