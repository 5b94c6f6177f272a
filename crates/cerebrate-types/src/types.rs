//! Common types used throughout Cerebrate.

use serde::{Deserialize, Serialize, Serializer};
use serde_with::skip_serializing_none;
use std::time::SystemTime;

// UserId //
//********//
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub i64);

impl std::fmt::Display for UserId {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		write!(f, "{}", self.0)
	}
}

// Timestamp //
//***********//
/// Unix timestamp in seconds
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Timestamp(pub i64);

impl Timestamp {
	pub fn now() -> Timestamp {
		let res = SystemTime::now().duration_since(SystemTime::UNIX_EPOCH).unwrap_or_default();
		Timestamp(i64::try_from(res.as_secs()).unwrap_or(i64::MAX))
	}

	pub fn add_seconds(&self, seconds: i64) -> Timestamp {
		Timestamp(self.0.saturating_add(seconds))
	}

	/// RFC 3339 representation, falls back to the raw number for out-of-range values
	pub fn to_iso_string(&self) -> String {
		match chrono::DateTime::from_timestamp(self.0, 0) {
			Some(dt) => dt.to_rfc3339_opts(chrono::SecondsFormat::Secs, true),
			None => self.0.to_string(),
		}
	}
}

impl std::fmt::Display for Timestamp {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		write!(f, "{}", self.0)
	}
}

impl Serialize for Timestamp {
	fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
	where
		S: Serializer,
	{
		serializer.serialize_i64(self.0)
	}
}

impl<'de> Deserialize<'de> for Timestamp {
	fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
	where
		D: serde::Deserializer<'de>,
	{
		Ok(Timestamp(i64::deserialize(deserializer)?))
	}
}

pub fn serialize_timestamp_iso<S>(ts: &Timestamp, serializer: S) -> Result<S::Ok, S::Error>
where
	S: Serializer,
{
	serializer.serialize_str(&ts.to_iso_string())
}

pub fn serialize_timestamp_iso_opt<S>(
	ts: &Option<Timestamp>,
	serializer: S,
) -> Result<S::Ok, S::Error>
where
	S: Serializer,
{
	match ts {
		Some(ts) => serializer.serialize_str(&ts.to_iso_string()),
		None => serializer.serialize_none(),
	}
}

// Severity //
//**********//
/// Urgency of an inbox entry or settings notice. Stored as 0..=3.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Severity {
	Primary,
	#[default]
	Info,
	Warning,
	Danger,
}

impl Severity {
	pub fn as_i64(self) -> i64 {
		match self {
			Severity::Primary => 0,
			Severity::Info => 1,
			Severity::Warning => 2,
			Severity::Danger => 3,
		}
	}

	pub fn from_i64(value: i64) -> Option<Self> {
		match value {
			0 => Some(Severity::Primary),
			1 => Some(Severity::Info),
			2 => Some(Severity::Warning),
			3 => Some(Severity::Danger),
			_ => None,
		}
	}

	/// Display variant used by the notification surface
	pub fn variant(self) -> &'static str {
		match self {
			Severity::Primary => "primary",
			Severity::Info => "info",
			Severity::Warning => "warning",
			Severity::Danger => "danger",
		}
	}
}

impl Serialize for Severity {
	fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
	where
		S: Serializer,
	{
		serializer.serialize_str(self.variant())
	}
}

impl<'de> Deserialize<'de> for Severity {
	fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
	where
		D: serde::Deserializer<'de>,
	{
		#[derive(Deserialize)]
		#[serde(untagged)]
		enum Repr {
			Int(i64),
			Str(String),
		}

		match Repr::deserialize(deserializer)? {
			Repr::Int(n) => Severity::from_i64(n)
				.ok_or_else(|| serde::de::Error::custom(format!("invalid severity {}", n))),
			Repr::Str(s) => match s.as_str() {
				"primary" => Ok(Severity::Primary),
				"info" => Ok(Severity::Info),
				"warning" => Ok(Severity::Warning),
				"danger" => Ok(Severity::Danger),
				_ => Err(serde::de::Error::custom(format!("invalid severity '{}'", s))),
			},
		}
	}
}

// ApiResponse //
//*************//
#[skip_serializing_none]
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
	pub offset: usize,
	pub limit: usize,
	pub total: usize,
}

/// Envelope for every JSON API response
#[skip_serializing_none]
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiResponse<T> {
	pub data: T,
	pub pagination: Option<Pagination>,
	pub req_id: Option<String>,
	#[serde(serialize_with = "serialize_timestamp_iso")]
	pub time: Timestamp,
}

impl<T> ApiResponse<T> {
	pub fn new(data: T) -> Self {
		Self { data, pagination: None, req_id: None, time: Timestamp::now() }
	}

	pub fn with_pagination(data: T, offset: usize, limit: usize, total: usize) -> Self {
		Self {
			data,
			pagination: Some(Pagination { offset, limit, total }),
			req_id: None,
			time: Timestamp::now(),
		}
	}

	pub fn with_req_id(mut self, req_id: impl Into<String>) -> Self {
		let req_id = req_id.into();
		if !req_id.is_empty() {
			self.req_id = Some(req_id);
		}
		self
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_severity_variants() {
		assert_eq!(Severity::Primary.variant(), "primary");
		assert_eq!(Severity::Info.variant(), "info");
		assert_eq!(Severity::Warning.variant(), "warning");
		assert_eq!(Severity::Danger.variant(), "danger");
		assert_eq!(Severity::from_i64(2), Some(Severity::Warning));
		assert_eq!(Severity::from_i64(4), None);
	}

	#[test]
	fn test_severity_deserialize_int_or_string() {
		let s: Severity = serde_json::from_str("3").unwrap();
		assert_eq!(s, Severity::Danger);
		let s: Severity = serde_json::from_str("\"primary\"").unwrap();
		assert_eq!(s, Severity::Primary);
		assert!(serde_json::from_str::<Severity>("\"urgent\"").is_err());
	}

	#[test]
	fn test_timestamp_iso() {
		assert_eq!(Timestamp(0).to_iso_string(), "1970-01-01T00:00:00Z");
	}

	#[test]
	fn test_api_response_skips_empty_req_id() {
		let resp = ApiResponse::new(1).with_req_id("");
		assert!(resp.req_id.is_none());
		let json = serde_json::to_value(&resp).unwrap();
		assert!(json.get("reqId").is_none());
		assert!(json.get("pagination").is_none());
	}
}

// vim: ts=4
