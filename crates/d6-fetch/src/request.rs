//! Data request and raw response

use serde::{Deserialize, Serialize};

use d6_navigation::append_marker;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Method {
    Get,
    Post,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
        }
    }
}

impl std::fmt::Display for Method {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FetchRequest {
    pub url: String,
    pub method: Method,
    pub body: Option<String>,
    pub headers: Vec<(String, String)>,
}

impl FetchRequest {
    /// A data request for `url`: marked, and POST exactly when a body is given
    pub fn data(url: &str, body: Option<String>) -> Self {
        let mut headers = vec![(
            "x-requested-with".to_string(),
            "XMLHttpRequest".to_string(),
        )];
        let method = if body.is_some() {
            headers.push((
                "content-type".to_string(),
                "application/x-www-form-urlencoded".to_string(),
            ));
            Method::Post
        } else {
            Method::Get
        };

        Self {
            url: append_marker(url, 1),
            method,
            body,
            headers,
        }
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// What the transport observed, before decoding
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    /// HTTP status, 0 when no response arrived
    pub status: u16,
    pub text: String,
    /// Transport-level failure message
    pub error: Option<String>,
}

impl RawResponse {
    pub fn ok(status: u16, text: &str) -> Self {
        Self {
            status,
            text: text.to_string(),
            error: None,
        }
    }

    pub fn failed(message: &str) -> Self {
        Self {
            status: 0,
            text: String::new(),
            error: Some(message.to_string()),
        }
    }
}
