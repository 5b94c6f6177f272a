//! Custom extractors for Cerebrate-specific request data

use axum::extract::{ConnectInfo, FromRequestParts};
use axum::http::request::Parts;
use std::net::{IpAddr, SocketAddr};

use crate::config::ServerMode;
use crate::prelude::*;
use cerebrate_types::directory::User;

// Auth //
//******//
/// Authenticated user, placed into request extensions by the session middleware
#[derive(Debug, Clone)]
pub struct Auth(pub User);

impl<S> FromRequestParts<S> for Auth
where
	S: Send + Sync,
{
	type Rejection = Error;

	async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
		match parts.extensions.get::<Auth>().cloned() {
			Some(auth) if auth.0.disabled => Err(Error::PermissionDenied),
			Some(auth) => Ok(auth),
			None => Err(Error::Unauthorized),
		}
	}
}

// OptionalAuth //
//***************//
/// Optional auth extractor that doesn't fail if auth is missing
#[derive(Debug, Clone)]
pub struct OptionalAuth(pub Option<User>);

impl<S> FromRequestParts<S> for OptionalAuth
where
	S: Send + Sync,
{
	type Rejection = Error;

	async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
		let auth = parts.extensions.get::<Auth>().cloned().map(|a| a.0);
		Ok(OptionalAuth(auth))
	}
}

// RequestId //
//***********//
/// Request ID for tracing and debugging
#[derive(Clone, Debug)]
pub struct RequestId(pub String);

/// Optional Request ID extractor - always succeeds, returns None if not available
#[derive(Clone, Debug)]
pub struct OptionalRequestId(pub Option<String>);

impl<S> FromRequestParts<S> for OptionalRequestId
where
	S: Send + Sync,
{
	type Rejection = Error;

	async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
		let req_id = parts.extensions.get::<RequestId>().map(|r| r.0.clone());
		Ok(OptionalRequestId(req_id))
	}
}

// ClientAddr //
//************//
/// Address of the requesting client
#[derive(Clone, Copy, Debug)]
pub struct ClientAddr(pub IpAddr);

/// First `X-Forwarded-For` hop
fn forwarded_for(parts: &Parts) -> Option<IpAddr> {
	parts
		.headers
		.get("x-forwarded-for")
		.and_then(|h| h.to_str().ok())
		.and_then(|h| h.split(',').next())
		.and_then(|ip| ip.trim().parse::<IpAddr>().ok())
}

/// Client IP for `mode`. Forwarding headers are only trusted behind a proxy,
/// anything else is the socket peer.
pub fn client_ip(parts: &Parts, mode: ServerMode) -> Option<IpAddr> {
	let peer = || {
		parts.extensions.get::<ConnectInfo<SocketAddr>>().map(|ConnectInfo(addr)| addr.ip())
	};
	match mode {
		ServerMode::Standalone => peer(),
		ServerMode::Proxy => forwarded_for(parts).or_else(peer),
	}
}

impl FromRequestParts<App> for ClientAddr {
	type Rejection = Error;

	async fn from_request_parts(parts: &mut Parts, state: &App) -> Result<Self, Self::Rejection> {
		client_ip(parts, state.config.mode)
			.map(ClientAddr)
			.ok_or_else(|| Error::Internal("client address not available".into()))
	}
}


// vim: ts=4
