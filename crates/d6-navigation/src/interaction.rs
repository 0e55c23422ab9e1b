//! Page interactions and the decision to intercept them

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::address::{is_same_domain, remove_fragment, resolve_url};
use crate::form::Form;
use crate::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MouseButton {
    Left,
    Middle,
    Right,
    Other(u16),
}

impl MouseButton {
    /// Map a DOM `event.which` value; a missing or zero value is a left click
    pub fn from_which(which: Option<u16>) -> Self {
        match which.unwrap_or(0) {
            0 | 1 => MouseButton::Left,
            2 => MouseButton::Middle,
            3 => MouseButton::Right,
            n => MouseButton::Other(n),
        }
    }
}

/// An anchor as seen by the interceptor
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Link {
    pub href: String,
    pub classes: Vec<String>,
    /// Selector of the region to update instead of the whole page
    pub target: Option<String>,
    /// View to render with instead of the one the response names
    pub view: Option<String>,
}

impl Link {
    pub fn new(href: &str) -> Self {
        Self {
            href: href.to_string(),
            ..Self::default()
        }
    }

    pub fn with_class(mut self, class: &str) -> Self {
        self.classes.push(class.to_string());
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

    pub fn has_class(&self, class: &str) -> bool {
        self.classes.iter().any(|c| c == class)
    }

    fn options(&self) -> LoadOptions {
        LoadOptions {
            target: self.target.clone(),
            view: self.view.clone(),
        }
    }
}

#[derive(Debug, Clone)]
pub enum Interaction {
    Click { link: Link, button: MouseButton },
    Hover { link: Link },
    Submit { form: Form },
    /// Back/forward; the page location already points at the popped entry
    HistoryPop,
}

/// Partial-update settings carried from the element that started a load
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadOptions {
    pub target: Option<String>,
    pub view: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadRequest {
    /// Absolute URL without fragment; POSTs carry their freshness token
    pub url: String,
    pub body: Option<String>,
    pub options: LoadOptions,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IgnoreReason {
    /// Leaves the site; the browser handles it
    CrossDomain,
    /// Middle/right clicks keep their native behavior
    NotLeftClick,
    /// The link opted out of interception
    NoPrefetch,
    /// Hovering a link to the page already shown
    CurrentPage,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    Load(LoadRequest),
    Prefetch(String),
    Ignore(IgnoreReason),
}

pub struct Interceptor {
    no_prefetch_class: String,
}

impl Interceptor {
    pub fn new(no_prefetch_class: &str) -> Self {
        Self {
            no_prefetch_class: no_prefetch_class.to_string(),
        }
    }

    pub fn no_prefetch_class(&self) -> &str {
        &self.no_prefetch_class
    }

    /// Decide what to do with an interaction on the page at `location`
    pub fn decide(&self, interaction: &Interaction, location: &str) -> Result<Decision> {
        match interaction {
            Interaction::Click { link, button } => {
                if *button != MouseButton::Left {
                    return Ok(Decision::Ignore(IgnoreReason::NotLeftClick));
                }
                if link.has_class(&self.no_prefetch_class) {
                    return Ok(Decision::Ignore(IgnoreReason::NoPrefetch));
                }
                let url = resolve_url(location, &link.href)?;
                let url = remove_fragment(url.as_str()).to_string();
                if !is_same_domain(&url, location) {
                    return Ok(Decision::Ignore(IgnoreReason::CrossDomain));
                }
                Ok(Decision::Load(LoadRequest {
                    url,
                    body: None,
                    options: link.options(),
                }))
            }
            Interaction::Hover { link } => {
                if link.has_class(&self.no_prefetch_class) {
                    return Ok(Decision::Ignore(IgnoreReason::NoPrefetch));
                }
                let url = resolve_url(location, &link.href)?;
                let url = remove_fragment(url.as_str()).to_string();
                let current = resolve_url(location, "")?;
                if url == remove_fragment(current.as_str()) {
                    return Ok(Decision::Ignore(IgnoreReason::CurrentPage));
                }
                if !is_same_domain(&url, location) {
                    return Ok(Decision::Ignore(IgnoreReason::CrossDomain));
                }
                Ok(Decision::Prefetch(url))
            }
            Interaction::Submit { form } => {
                let action = resolve_url(location, &form.action)?;
                if !is_same_domain(action.as_str(), location) {
                    return Ok(Decision::Ignore(IgnoreReason::CrossDomain));
                }
                let (url, body) = form.submission(action.as_str(), Utc::now());
                Ok(Decision::Load(LoadRequest {
                    url,
                    body,
                    options: LoadOptions {
                        target: form.target.clone(),
                        view: form.view.clone(),
                    },
                }))
            }
            Interaction::HistoryPop => {
                let url = resolve_url(location, "")?;
                Ok(Decision::Load(LoadRequest {
                    url: remove_fragment(url.as_str()).to_string(),
                    body: None,
                    options: LoadOptions::default(),
                }))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::form::{FormField, FormMethod};

    const LOCATION: &str = "http://a.com/home";

    fn interceptor() -> Interceptor {
        Interceptor::new("_NOPREFETCH")
    }

    fn click(link: Link) -> Interaction {
        Interaction::Click {
            link,
            button: MouseButton::Left,
        }
    }

    #[test]
    fn test_left_click_same_domain_loads() {
        let decision = interceptor()
            .decide(&click(Link::new("/about#team")), LOCATION)
            .unwrap();

        assert_eq!(
            decision,
            Decision::Load(LoadRequest {
                url: "http://a.com/about".to_string(),
                body: None,
                options: LoadOptions::default(),
            })
        );
    }

    #[test]
    fn test_click_carries_target_and_view() {
        let link = Link::new("/list?page=2")
            .with_target("#results")
            .with_view("results");
        let decision = interceptor().decide(&click(link), LOCATION).unwrap();

        match decision {
            Decision::Load(request) => {
                assert_eq!(request.options.target.as_deref(), Some("#results"));
                assert_eq!(request.options.view.as_deref(), Some("results"));
            }
            other => panic!("Expected Load, got {:?}", other),
        }
    }

    #[test]
    fn test_click_ignored_cases() {
        let interceptor = interceptor();

        let decision = interceptor
            .decide(&click(Link::new("http://b.com/x")), LOCATION)
            .unwrap();
        assert_eq!(decision, Decision::Ignore(IgnoreReason::CrossDomain));

        let middle = Interaction::Click {
            link: Link::new("/x"),
            button: MouseButton::from_which(Some(2)),
        };
        assert_eq!(
            interceptor.decide(&middle, LOCATION).unwrap(),
            Decision::Ignore(IgnoreReason::NotLeftClick)
        );

        let opted_out = click(Link::new("/x").with_class("_NOPREFETCH"));
        assert_eq!(
            interceptor.decide(&opted_out, LOCATION).unwrap(),
            Decision::Ignore(IgnoreReason::NoPrefetch)
        );
    }

    #[test]
    fn test_hover_prefetches_other_pages() {
        let interceptor = interceptor();
        let hover = |href: &str| Interaction::Hover {
            link: Link::new(href),
        };

        assert_eq!(
            interceptor.decide(&hover("/next"), LOCATION).unwrap(),
            Decision::Prefetch("http://a.com/next".to_string())
        );
        assert_eq!(
            interceptor.decide(&hover("/home#top"), LOCATION).unwrap(),
            Decision::Ignore(IgnoreReason::CurrentPage)
        );
        assert_eq!(
            interceptor.decide(&hover("https://b.com/"), LOCATION).unwrap(),
            Decision::Ignore(IgnoreReason::CrossDomain)
        );
    }

    #[test]
    fn test_hover_on_bare_origin_matches_root_link() {
        let interceptor = interceptor();
        let hover = Interaction::Hover {
            link: Link::new("/"),
        };

        assert_eq!(
            interceptor.decide(&hover, "http://a.com").unwrap(),
            Decision::Ignore(IgnoreReason::CurrentPage)
        );
    }

    #[test]
    fn test_submit_get_form() {
        let form = Form::new("/search", FormMethod::Get)
            .with_field(FormField::text("q", "a"))
            .with_field(FormField::text("q", "b"));

        let decision = interceptor()
            .decide(&Interaction::Submit { form }, LOCATION)
            .unwrap();
        assert_eq!(
            decision,
            Decision::Load(LoadRequest {
                url: "http://a.com/search?q=a&q=b".to_string(),
                body: None,
                options: LoadOptions::default(),
            })
        );
    }

    #[test]
    fn test_submit_cross_domain_ignored() {
        let form = Form::new("https://elsewhere.com/post", FormMethod::Post);
        let decision = interceptor()
            .decide(&Interaction::Submit { form }, LOCATION)
            .unwrap();
        assert_eq!(decision, Decision::Ignore(IgnoreReason::CrossDomain));
    }

    #[test]
    fn test_history_pop_reloads_location() {
        let decision = interceptor()
            .decide(&Interaction::HistoryPop, "http://a.com/back?x=1#frag")
            .unwrap();
        match decision {
            Decision::Load(request) => assert_eq!(request.url, "http://a.com/back?x=1"),
            other => panic!("Expected Load, got {:?}", other),
        }
    }

    #[test]
    fn test_invalid_location() {
        assert!(interceptor()
            .decide(&click(Link::new("/x")), "not a url")
            .is_err());
    }
}
