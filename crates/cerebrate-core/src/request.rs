//! Outbound HTTP client for calls to peer instances (broods)

use async_trait::async_trait;
use http_body_util::{BodyExt, Full};
use hyper::body::Bytes;
use hyper_rustls::{HttpsConnector, HttpsConnectorBuilder};
use hyper_util::client::legacy::connect::HttpConnector;
use hyper_util::client::legacy::Client;
use hyper_util::rt::TokioExecutor;
use std::fmt::Debug;
use std::time::Duration;

use crate::prelude::*;

/// Status and decoded body of a peer response
#[derive(Debug, Clone)]
pub struct PeerResponse {
	pub status: u16,
	pub body: serde_json::Value,
}

impl PeerResponse {
	pub fn is_success(&self) -> bool {
		(200..300).contains(&self.status)
	}

	/// `message` field of a JSON body, if any
	pub fn message(&self) -> Option<&str> {
		self.body.get("message").and_then(|m| m.as_str())
	}
}

#[async_trait]
pub trait PeerClient: Debug + Send + Sync {
	/// POST a JSON document. Non-2xx answers are returned, not turned into errors.
	///
	/// Fails with `Error::Timeout` or `Error::NetworkError` when no answer arrives.
	async fn post_json(&self, url: &str, body: &serde_json::Value) -> ClResult<PeerResponse>;
}

pub struct HttpPeerClient {
	client: Client<HttpsConnector<HttpConnector>, Full<Bytes>>,
	timeout: Duration,
}

impl HttpPeerClient {
	pub fn new(timeout: Duration) -> ClResult<Self> {
		let connector = HttpsConnectorBuilder::new()
			.with_native_roots()
			.map_err(|e| Error::ConfigError(format!("TLS error: {}", e)))?
			.https_or_http()
			.enable_http1()
			.build();
		let client = Client::builder(TokioExecutor::new()).build(connector);
		Ok(Self { client, timeout })
	}
}

impl Debug for HttpPeerClient {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("HttpPeerClient").field("timeout", &self.timeout).finish()
	}
}

#[async_trait]
impl PeerClient for HttpPeerClient {
	async fn post_json(&self, url: &str, body: &serde_json::Value) -> ClResult<PeerResponse> {
		let payload = serde_json::to_vec(body)?;
		let request = hyper::Request::builder()
			.method(hyper::Method::POST)
			.uri(url)
			.header("Content-Type", "application/json")
			.header("Accept", "application/json")
			.body(Full::new(Bytes::from(payload)))
			.map_err(|e| Error::NetworkError(format!("Request build error: {}", e)))?;

		let exchange = async {
			let response = self
				.client
				.request(request)
				.await
				.map_err(|e| Error::NetworkError(format!("{}", e)))?;
			let status = response.status().as_u16();
			let bytes = response
				.into_body()
				.collect()
				.await
				.map_err(|e| Error::NetworkError(format!("{}", e)))?
				.to_bytes();
			// Peers may answer with an empty or non-JSON body
			let body = serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null);
			Ok::<_, Error>(PeerResponse { status, body })
		};

		match tokio::time::timeout(self.timeout, exchange).await {
			Ok(Ok(res)) => {
				debug!("POST {} -> {}", url, res.status);
				Ok(res)
			}
			Ok(Err(err)) => {
				error!("POST {} failed: {}", url, err);
				Err(err)
			}
			Err(_) => {
				error!("POST {} timed out after {:?}", url, self.timeout);
				Err(Error::Timeout)
			}
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_peer_response_helpers() {
		let res = PeerResponse { status: 201, body: serde_json::json!({ "message": "ok" }) };
		assert!(res.is_success());
		assert_eq!(res.message(), Some("ok"));

		let res = PeerResponse { status: 409, body: serde_json::Value::Null };
		assert!(!res.is_success());
		assert_eq!(res.message(), None);
	}
}

// vim: ts=4
