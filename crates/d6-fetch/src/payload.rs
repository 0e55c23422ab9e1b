//! Response payload
//!
//! The server answers a data request with a JSON object naming the view to
//! render it with, or with a raw HTML string. Fields read by the pipeline:
//! - `d6`: view name
//! - `d6u`: canonical URL (e.g. after a redirect)
//! - `ttl`: cache lifetime in milliseconds

use serde::Serialize;
use serde_json::Value;
use std::time::Duration;

pub const VIEW_FIELD: &str = "d6";
pub const URL_FIELD: &str = "d6u";
pub const TTL_FIELD: &str = "ttl";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResponsePayload {
    /// URL the request was issued for (without the data marker)
    pub request_url: String,
    /// HTTP status, 0 when no response arrived
    pub status: u16,
    /// Decoded JSON, or the raw text as a JSON string
    pub data: Value,
    /// Transport or decoding failure
    pub error: Option<String>,
}

impl ResponsePayload {
    /// Wrap already-decoded data
    pub fn from_value(request_url: &str, data: Value) -> Self {
        Self {
            request_url: request_url.to_string(),
            status: 200,
            data,
            error: None,
        }
    }

    /// Decode a response body. Never fails: text that is neither HTML nor
    /// JSON is kept verbatim and the payload is tagged with the error.
    pub fn decode(request_url: &str, status: u16, text: &str) -> Self {
        if text.trim_start().starts_with('<') {
            return Self {
                request_url: request_url.to_string(),
                status,
                data: Value::String(text.to_string()),
                error: None,
            };
        }

        match serde_json::from_str::<Value>(text) {
            Ok(data) => Self {
                request_url: request_url.to_string(),
                status,
                data,
                error: None,
            },
            Err(e) => Self {
                request_url: request_url.to_string(),
                status,
                data: Value::String(text.to_string()),
                error: Some(format!("Invalid JSON: {}", e)),
            },
        }
    }

    /// A request that never produced a response
    pub fn transport_failure(request_url: &str, status: u16, message: &str) -> Self {
        Self {
            request_url: request_url.to_string(),
            status,
            data: Value::String(String::new()),
            error: Some(message.to_string()),
        }
    }

    pub fn view_name(&self) -> Option<&str> {
        self.data.get(VIEW_FIELD).and_then(Value::as_str)
    }

    pub fn redirect_url(&self) -> Option<&str> {
        self.data
            .get(URL_FIELD)
            .and_then(Value::as_str)
            .filter(|url| !url.is_empty())
    }

    /// Milliseconds, given as an integer or a float
    pub fn ttl(&self) -> Option<Duration> {
        let value = self.data.get(TTL_FIELD)?;
        if let Some(ms) = value.as_u64() {
            return (ms > 0).then(|| Duration::from_millis(ms));
        }
        value
            .as_f64()
            .filter(|ms| ms.is_finite() && *ms > 0.0)
            .and_then(|ms| Duration::try_from_secs_f64(ms / 1000.0).ok())
    }

    /// The payload itself, when it is a literal HTML string
    pub fn html(&self) -> Option<&str> {
        self.data
            .as_str()
            .filter(|text| text.trim_start().starts_with('<'))
    }

    pub fn is_success(&self) -> bool {
        self.error.is_none() && (200..300).contains(&self.status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_decode_json() {
        let payload = ResponsePayload::decode(
            "http://a.com/u",
            200,
            r#"{"d6":"profile","d6u":"http://a.com/users/1","ttl":500,"name":"Ann"}"#,
        );

        assert!(payload.is_success());
        assert_eq!(payload.view_name(), Some("profile"));
        assert_eq!(payload.redirect_url(), Some("http://a.com/users/1"));
        assert_eq!(payload.ttl(), Some(Duration::from_millis(500)));
        assert_eq!(payload.data["name"], json!("Ann"));
        assert_eq!(payload.html(), None);
    }

    #[test]
    fn test_decode_raw_html() {
        let payload = ResponsePayload::decode("http://a.com/u", 200, "  <p>hi</p>");
        assert!(payload.error.is_none());
        assert_eq!(payload.html(), Some("  <p>hi</p>"));
        assert_eq!(payload.view_name(), None);
    }

    #[test]
    fn test_decode_json_string_of_html() {
        let payload = ResponsePayload::decode("http://a.com/u", 200, r#""<b>x</b>""#);
        assert_eq!(payload.html(), Some("<b>x</b>"));
    }

    #[test]
    fn test_decode_malformed_body() {
        let payload = ResponsePayload::decode("http://a.com/u", 500, "Internal error");
        assert!(payload.error.as_deref().unwrap().starts_with("Invalid JSON"));
        assert_eq!(payload.data, json!("Internal error"));
        assert_eq!(payload.status, 500);
        assert!(!payload.is_success());
    }

    #[test]
    fn test_error_status_keeps_json() {
        let payload = ResponsePayload::decode("http://a.com/u", 404, r#"{"d6":"missing"}"#);
        assert!(payload.error.is_none());
        assert!(!payload.is_success());
        assert_eq!(payload.view_name(), Some("missing"));
    }

    #[test]
    fn test_transport_failure() {
        let payload = ResponsePayload::transport_failure("http://a.com/u", 0, "connection refused");
        assert_eq!(payload.error.as_deref(), Some("connection refused"));
        assert_eq!(payload.view_name(), None);
        assert_eq!(payload.html(), None);
    }

    #[test]
    fn test_zero_ttl_ignored() {
        let payload = ResponsePayload::from_value("http://a.com/u", json!({"ttl": 0}));
        assert_eq!(payload.ttl(), None);
    }

    #[test]
    fn test_float_ttl_accepted() {
        let payload = ResponsePayload::decode("http://a.com/u", 200, r#"{"ttl": 1e4}"#);
        assert_eq!(payload.ttl(), Some(Duration::from_secs(10)));

        let payload = ResponsePayload::from_value("http://a.com/u", json!({"ttl": 500.0}));
        assert_eq!(payload.ttl(), Some(Duration::from_millis(500)));

        let payload = ResponsePayload::from_value("http://a.com/u", json!({"ttl": -5.5}));
        assert_eq!(payload.ttl(), None);
    }
}
