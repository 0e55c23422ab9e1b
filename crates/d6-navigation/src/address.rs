//! URL normalization
//!
//! Data requests are marked with a reserved query parameter so the server
//! answers with view data instead of a full page:
//! - `d6=1`: a data request issued by the gateway
//! - `d6=r`: a server-side redirect of a data request
//! - `d6=<millis>`: a POST freshness token (form last-changed time)

use url::Url;

use crate::error::NavigationError;
use crate::Result;

/// Name of the reserved data-request query parameter
pub const DATA_PARAM: &str = "d6";

/// Drop everything from the first `#`
pub fn remove_fragment(url: &str) -> &str {
    match url.find('#') {
        Some(idx) => &url[..idx],
        None => url,
    }
}

/// Append `d6=<token>` to the query string
pub fn append_marker(url: &str, token: impl std::fmt::Display) -> String {
    let separator = if url.contains('?') { '&' } else { '?' };
    format!("{url}{separator}{DATA_PARAM}={token}")
}

/// Remove the data-request and redirect markers, keeping freshness tokens
pub fn strip_data_marker(url: &str) -> String {
    filter_query(url, |value| value == "1" || value == "r")
}

/// Remove every marker, including POST freshness tokens
pub fn strip_markers(url: &str) -> String {
    filter_query(url, |value| {
        value == "r" || (!value.is_empty() && value.bytes().all(|b| b.is_ascii_digit()))
    })
}

/// Key under which responses for `url` are cached
pub fn cache_key(url: &str) -> String {
    strip_data_marker(remove_fragment(url))
}

/// The address a response is displayed under
pub fn canonical_url(url: &str) -> String {
    strip_markers(remove_fragment(url))
}

/// Resolve a possibly relative href against the page location
pub fn resolve_url(location: &str, href: &str) -> Result<Url> {
    let base = Url::parse(location)
        .map_err(|e| NavigationError::InvalidUrl(format!("{location}: {e}")))?;
    base.join(href.trim())
        .map_err(|e| NavigationError::InvalidUrl(format!("{href}: {e}")))
}

/// Same scheme, host and port as the page location
pub fn is_same_domain(url: &str, location: &str) -> bool {
    match (Url::parse(url), Url::parse(location)) {
        (Ok(url), Ok(location)) => {
            let origin = url.origin();
            origin.is_tuple() && origin == location.origin()
        }
        _ => false,
    }
}

/// Same origin and path, ignoring query and fragment
pub fn same_path(a: &str, b: &str) -> bool {
    match (Url::parse(a), Url::parse(b)) {
        (Ok(a), Ok(b)) => a.origin() == b.origin() && a.path() == b.path(),
        _ => path_part(a) == path_part(b),
    }
}

fn path_part(url: &str) -> &str {
    let url = remove_fragment(url);
    match url.find('?') {
        Some(idx) => &url[..idx],
        None => url,
    }
}

/// Rebuild the query without `d6=<value>` pairs whose value matches
fn filter_query(url: &str, drop_value: impl Fn(&str) -> bool) -> String {
    let (rest, fragment) = match url.find('#') {
        Some(idx) => url.split_at(idx),
        None => (url, ""),
    };
    let Some((path, query)) = rest.split_once('?') else {
        return url.to_string();
    };

    let kept: Vec<&str> = query
        .split('&')
        .filter(|pair| match pair.split_once('=') {
            Some((name, value)) => !(name == DATA_PARAM && drop_value(value)),
            None => true,
        })
        .collect();

    if kept.is_empty() || kept == [""] {
        format!("{path}{fragment}")
    } else {
        format!("{path}?{}{fragment}", kept.join("&"))
    }
}
