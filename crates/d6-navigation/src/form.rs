//! Form serialization
//!
//! Named fields are encoded in document order as
//! `application/x-www-form-urlencoded` pairs:
//! - unchecked checkboxes and radios are omitted
//! - multi-selects contribute one pair per selected option
//! - of several submit buttons only the clicked one is included

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use url::form_urlencoded::byte_serialize;

use crate::address::{append_marker, remove_fragment};
use crate::error::NavigationError;
use crate::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    /// Text-like inputs, hidden inputs and textareas
    Text,
    Checkbox,
    Radio,
    Submit,
    /// Non-submitting button
    Button,
    Select,
    SelectMultiple,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    Single(String),
    Multiple(Vec<String>),
    Unset,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FormField {
    pub name: String,
    pub kind: FieldKind,
    pub value: String,
    pub checked: bool,
    /// Selected option values of a multi-select
    pub selected: Vec<String>,
}

impl FormField {
    fn new(name: &str, kind: FieldKind, value: &str) -> Self {
        Self {
            name: name.to_string(),
            kind,
            value: value.to_string(),
            checked: false,
            selected: Vec::new(),
        }
    }

    pub fn text(name: &str, value: &str) -> Self {
        Self::new(name, FieldKind::Text, value)
    }

    pub fn checkbox(name: &str, value: &str, checked: bool) -> Self {
        Self {
            checked,
            ..Self::new(name, FieldKind::Checkbox, value)
        }
    }

    pub fn radio(name: &str, value: &str, checked: bool) -> Self {
        Self {
            checked,
            ..Self::new(name, FieldKind::Radio, value)
        }
    }

    pub fn submit(name: &str, value: &str) -> Self {
        Self::new(name, FieldKind::Submit, value)
    }

    pub fn button(name: &str, value: &str) -> Self {
        Self::new(name, FieldKind::Button, value)
    }

    pub fn select(name: &str, value: &str) -> Self {
        Self::new(name, FieldKind::Select, value)
    }

    pub fn select_multiple(name: &str, selected: &[&str]) -> Self {
        Self {
            selected: selected.iter().map(|s| s.to_string()).collect(),
            ..Self::new(name, FieldKind::SelectMultiple, "")
        }
    }

    /// The value a submission would carry
    pub fn value(&self) -> FieldValue {
        match self.kind {
            FieldKind::Checkbox | FieldKind::Radio if !self.checked => FieldValue::Unset,
            FieldKind::SelectMultiple => FieldValue::Multiple(self.selected.clone()),
            _ => FieldValue::Single(self.value.clone()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FormMethod {
    #[default]
    Get,
    Post,
}

impl std::str::FromStr for FormMethod {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "get" | "" => Ok(FormMethod::Get),
            "post" => Ok(FormMethod::Post),
            _ => Err(format!("Unknown form method: {}", s)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Form {
    /// Action attribute, possibly relative
    pub action: String,
    pub method: FormMethod,
    pub fields: Vec<FormField>,
    /// Selector of the region to update instead of the whole page
    pub target: Option<String>,
    /// View to render with instead of the one the response names
    pub view: Option<String>,
    last_changed: Option<DateTime<Utc>>,
    clicked_button: Option<usize>,
}

impl Form {
    pub fn new(action: &str, method: FormMethod) -> Self {
        Self {
            action: action.to_string(),
            method,
            fields: Vec::new(),
            target: None,
            view: None,
            last_changed: None,
            clicked_button: None,
        }
    }

    pub fn with_field(mut self, field: FormField) -> Self {
        self.fields.push(field);
        self
    }

    pub fn with_target(mut self, selector: &str) -> Self {
        self.target = Some(selector.to_string());
        self
    }

    pub fn with_view(mut self, view: &str) -> Self {
        self.view = Some(view.to_string());
        self
    }

    pub fn last_changed(&self) -> Option<DateTime<Utc>> {
        self.last_changed
    }

    pub fn clicked_button(&self) -> Option<usize> {
        self.clicked_button
    }

    /// Record that a field changed
    pub fn mark_changed(&mut self, at: DateTime<Utc>) {
        self.last_changed = Some(at);
    }

    /// Record which submit button was clicked; a different button than last
    /// time also counts as a change
    pub fn click_button(&mut self, index: usize, at: DateTime<Utc>) -> Result<()> {
        match self.fields.get(index) {
            Some(field) if field.kind == FieldKind::Submit => {}
            _ => return Err(NavigationError::NotSubmitButton(index)),
        }

        if self.clicked_button != Some(index) {
            self.clicked_button = Some(index);
            self.mark_changed(at);
        }
        Ok(())
    }

    /// Encoded `name=value` pairs in field order
    pub fn encode_fields(&self) -> Vec<String> {
        let mut pairs = Vec::new();

        for (index, field) in self.fields.iter().enumerate() {
            if field.name.is_empty() {
                continue;
            }
            if field.kind == FieldKind::Submit && self.clicked_button != Some(index) {
                continue;
            }

            match field.value() {
                // A radio with nothing to send is skipped entirely
                FieldValue::Single(value) if field.kind == FieldKind::Radio && value.is_empty() => {}
                FieldValue::Single(value) => pairs.push(encode_pair(&field.name, &value)),
                FieldValue::Multiple(values) => {
                    pairs.extend(values.iter().map(|v| encode_pair(&field.name, v)));
                }
                FieldValue::Unset => {}
            }
        }

        pairs
    }

    /// Build the request URL and body for submitting to `action_url`.
    ///
    /// GET appends the fields to the query string. POST sends them as the
    /// body and tags the URL with the last-changed time (or `now`) so a
    /// changed form is never answered from an earlier submission's cache.
    pub fn submission(&self, action_url: &str, now: DateTime<Utc>) -> (String, Option<String>) {
        let url = remove_fragment(action_url);
        let data = self.encode_fields().join("&");

        match self.method {
            FormMethod::Get if data.is_empty() => (url.to_string(), None),
            FormMethod::Get => {
                let separator = if url.contains('?') { '&' } else { '?' };
                (format!("{url}{separator}{data}"), None)
            }
            FormMethod::Post => {
                let token = self.last_changed.unwrap_or(now).timestamp_millis();
                (append_marker(url, token), Some(data))
            }
        }
    }
}

fn encode_pair(name: &str, value: &str) -> String {
    format!(
        "{}={}",
        byte_serialize(name.as_bytes()).collect::<String>(),
        byte_serialize(value.as_bytes()).collect::<String>()
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(ms: i64) -> DateTime<Utc> {
        Utc.timestamp_millis_opt(ms).unwrap()
    }

    #[test]
    fn test_get_keeps_field_order() {
        let form = Form::new("/search", FormMethod::Get)
            .with_field(FormField::text("q", "a"))
            .with_field(FormField::text("q", "b"));

        let (url, body) = form.submission("http://a.com/search", at(1));
        assert_eq!(url, "http://a.com/search?q=a&q=b");
        assert!(body.is_none());
    }

    #[test]
    fn test_get_appends_to_existing_query() {
        let form = Form::new("/search?lang=en", FormMethod::Get)
            .with_field(FormField::text("q", "rust lang"));

        let (url, _) = form.submission("http://a.com/search?lang=en#results", at(1));
        assert_eq!(url, "http://a.com/search?lang=en&q=rust+lang");
    }

    #[test]
    fn test_unchecked_and_nameless_fields_omitted() {
        let form = Form::new("/f", FormMethod::Get)
            .with_field(FormField::radio("color", "red", false))
            .with_field(FormField::radio("color", "blue", true))
            .with_field(FormField::radio("size", "", true))
            .with_field(FormField::checkbox("news", "yes", false))
            .with_field(FormField::checkbox("terms", "ok", true))
            .with_field(FormField::text("", "ignored"));

        assert_eq!(form.encode_fields(), vec!["color=blue", "terms=ok"]);
    }

    #[test]
    fn test_only_clicked_submit_included() {
        let mut form = Form::new("/f", FormMethod::Get)
            .with_field(FormField::text("title", "x"))
            .with_field(FormField::submit("action", "save"))
            .with_field(FormField::submit("action", "delete"))
            .with_field(FormField::button("helper", "1"));

        assert_eq!(form.encode_fields(), vec!["title=x", "helper=1"]);

        form.click_button(2, at(5)).unwrap();
        assert_eq!(
            form.encode_fields(),
            vec!["title=x", "action=delete", "helper=1"]
        );
        assert_eq!(form.last_changed(), Some(at(5)));

        // Clicking the same button again is not a change
        form.click_button(2, at(9)).unwrap();
        assert_eq!(form.last_changed(), Some(at(5)));

        assert_eq!(
            form.click_button(0, at(10)),
            Err(NavigationError::NotSubmitButton(0))
        );
    }

    #[test]
    fn test_multi_select_and_escaping() {
        let form = Form::new("/f", FormMethod::Get)
            .with_field(FormField::select_multiple("tags", &["a&b", "c"]))
            .with_field(FormField::select("sort", "new"));

        assert_eq!(
            form.encode_fields(),
            vec!["tags=a%26b", "tags=c", "sort=new"]
        );
    }

    #[test]
    fn test_post_body_and_freshness_token() {
        let mut form = Form::new("/save", FormMethod::Post)
            .with_field(FormField::text("name", "Ann"));
        form.mark_changed(at(1_700_000_000_000));

        let (url, body) = form.submission("http://a.com/save", at(1));
        assert_eq!(url, "http://a.com/save?d6=1700000000000");
        assert_eq!(body.as_deref(), Some("name=Ann"));

        // An untouched form is stamped with the submission time
        let untouched = Form::new("/save", FormMethod::Post);
        let (url, body) = untouched.submission("http://a.com/save", at(42));
        assert_eq!(url, "http://a.com/save?d6=42");
        assert_eq!(body.as_deref(), Some(""));
    }

    #[test]
    fn test_method_parse() {
        assert_eq!("POST".parse::<FormMethod>().unwrap(), FormMethod::Post);
        assert_eq!("".parse::<FormMethod>().unwrap(), FormMethod::Get);
        assert!("put".parse::<FormMethod>().is_err());
    }
}
