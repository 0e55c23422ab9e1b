//! Renderer
//!
//! Commits a resolved payload to the page. Literal HTML payloads are written
//! as they are; anything else goes through a view picked from (in order) the
//! load's view override, the payload's view name, or the error view. With no
//! such view registered the page is handed to a full browser navigation.

use std::sync::Arc;

use d6_fetch::ResponsePayload;
use d6_navigation::{canonical_url, resolve_url, HistoryAction, LoadOptions};

use crate::markup::{extract_body, extract_scripts, extract_title};
use crate::page::{Page, Region, ScriptExecutor};
use crate::views::ViewRegistry;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderOutcome {
    /// Content was written to the page
    Rendered {
        /// Canonical URL of what is now shown
        url: String,
        region: Region,
        /// History change applied, full-page renders only
        history: Option<HistoryAction>,
    },
    /// No usable view; the browser was sent to `url`
    HardNavigation { url: String, view: String },
}

impl RenderOutcome {
    pub fn is_rendered(&self) -> bool {
        matches!(self, RenderOutcome::Rendered { .. })
    }

    pub fn url(&self) -> &str {
        match self {
            RenderOutcome::Rendered { url, .. } | RenderOutcome::HardNavigation { url, .. } => url,
        }
    }
}

pub struct Renderer {
    views: ViewRegistry,
    page: Arc<dyn Page>,
    scripts: Arc<dyn ScriptExecutor>,
    error_view: String,
}

impl Renderer {
    pub fn new(
        views: ViewRegistry,
        page: Arc<dyn Page>,
        scripts: Arc<dyn ScriptExecutor>,
        error_view: &str,
    ) -> Self {
        Self {
            views,
            page,
            scripts,
            error_view: error_view.to_string(),
        }
    }

    pub fn views(&self) -> &ViewRegistry {
        &self.views
    }

    pub fn page(&self) -> &Arc<dyn Page> {
        &self.page
    }

    /// Canonical URL of a response: the server's redirect target if it gave
    /// one, otherwise the URL that was requested, with markers removed
    pub fn response_url(payload: &ResponsePayload, request_url: &str) -> String {
        let url = match payload.redirect_url() {
            Some(redirect) => resolve_url(request_url, redirect)
                .map(|u| u.to_string())
                .unwrap_or_else(|_| redirect.to_string()),
            None => request_url.to_string(),
        };
        canonical_url(&url)
    }

    /// Render `payload`, fetched from `request_url`, into the page
    pub fn render(
        &self,
        payload: &ResponsePayload,
        request_url: &str,
        options: &LoadOptions,
    ) -> RenderOutcome {
        let url = Self::response_url(payload, request_url);
        let region = Region::from_target(options.target.as_deref());

        let html = match payload.html() {
            Some(html) => html.to_string(),
            None => {
                let view = options
                    .view
                    .as_deref()
                    .or_else(|| payload.view_name())
                    .unwrap_or(&self.error_view);

                match self.views.render(view, &payload.data) {
                    Some(html) => html,
                    None => {
                        tracing::warn!(
                            view = %view,
                            url = %url,
                            status = payload.status,
                            "No view for response, navigating"
                        );
                        self.page.assign_location(&url);
                        return RenderOutcome::HardNavigation {
                            url,
                            view: view.to_string(),
                        };
                    }
                }
            }
        };

        self.write_html(&html, &region);

        let history = if region.is_body() {
            let action = HistoryAction::for_destination(&url, &self.page.location());
            match &action {
                HistoryAction::Push(url) => self.page.push_history(url),
                HistoryAction::Replace(url) => self.page.replace_history(url),
            }
            Some(action)
        } else {
            None
        };

        tracing::info!(url = %url, region = %region, "Rendered");

        RenderOutcome::Rendered {
            url,
            region,
            history,
        }
    }

    /// Write HTML into a region: title first, then the script-free markup,
    /// then the scripts in document order
    pub fn write_html(&self, html: &str, region: &Region) {
        if let Some(title) = extract_title(html) {
            self.page.set_title(&title);
        }

        let (html, scripts) = extract_scripts(html);

        match region {
            Region::Body => {
                let content = extract_body(&html).unwrap_or(&html);
                self.page.set_html(region, content);
                self.page.scroll_to_top();
            }
            Region::Target(_) => self.page.set_html(region, &html),
        }

        for script in &scripts {
            self.scripts.execute(script);
        }
        if !scripts.is_empty() {
            tracing::debug!(count = scripts.len(), region = %region, "Executed page scripts");
        }

        self.page.content_ready(region);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::page::MemoryPage;
    use serde_json::json;

    fn renderer(location: &str) -> (Renderer, Arc<MemoryPage>) {
        let page = Arc::new(MemoryPage::new(location));
        let views = ViewRegistry::new();
        views.register("profile", |ctx| {
            format!("<h1>Hi {}</h1>", ctx["name"].as_str().unwrap_or(""))
        });
        views.register("error0", |ctx| {
            format!("<p>Error: {}</p>", ctx.as_str().unwrap_or("unknown"))
        });
        (
            Renderer::new(views, page.clone(), page.clone(), "error0"),
            page,
        )
    }

    #[test]
    fn test_render_named_view() {
        let (renderer, page) = renderer("http://a.com/home");
        let payload =
            ResponsePayload::from_value("http://a.com/u/ann", json!({"d6": "profile", "name": "Ann"}));

        let outcome = renderer.render(&payload, "http://a.com/u/ann", &LoadOptions::default());

        assert_eq!(page.body(), "<h1>Hi Ann</h1>");
        assert_eq!(page.title(), None);
        assert_eq!(
            outcome,
            RenderOutcome::Rendered {
                url: "http://a.com/u/ann".to_string(),
                region: Region::Body,
                history: Some(HistoryAction::Push("http://a.com/u/ann".to_string())),
            }
        );
        assert_eq!(page.location(), "http://a.com/u/ann");

        let doc = page.snapshot();
        assert_eq!(doc.scroll_resets, 1);
        assert_eq!(doc.ready, vec![Region::Body]);
    }

    #[test]
    fn test_unknown_view_navigates() {
        let (renderer, page) = renderer("http://a.com/home");
        let payload = ResponsePayload::from_value(
            "http://a.com/x",
            json!({"d6": "nope", "d6u": "/moved?d6=r"}),
        );

        let outcome = renderer.render(&payload, "http://a.com/x", &LoadOptions::default());

        assert_eq!(
            outcome,
            RenderOutcome::HardNavigation {
                url: "http://a.com/moved".to_string(),
                view: "nope".to_string(),
            }
        );
        assert_eq!(page.assigned_location().as_deref(), Some("http://a.com/moved"));
        assert_eq!(page.body(), "");
        assert!(page.history().is_empty());
    }

    #[test]
    fn test_missing_view_name_uses_error_view() {
        let (renderer, page) = renderer("http://a.com/home");
        let payload = ResponsePayload::from_value("http://a.com/x", json!("boom"));

        assert!(renderer
            .render(&payload, "http://a.com/x", &LoadOptions::default())
            .is_rendered());
        assert_eq!(page.body(), "<p>Error: boom</p>");
    }

    #[test]
    fn test_failed_transport_without_error_view_navigates() {
        let page = Arc::new(MemoryPage::new("http://a.com/home"));
        let renderer = Renderer::new(ViewRegistry::new(), page.clone(), page.clone(), "error0");
        let payload = ResponsePayload::transport_failure("http://a.com/x", 0, "refused");

        let outcome = renderer.render(&payload, "http://a.com/x", &LoadOptions::default());
        assert!(!outcome.is_rendered());
        assert_eq!(outcome.url(), "http://a.com/x");
        assert_eq!(page.assigned_location().as_deref(), Some("http://a.com/x"));
    }

    #[test]
    fn test_literal_html_document() {
        let (renderer, page) = renderer("http://a.com/list?page=1");
        let html = concat!(
            "<html><head><title>Page 2</title></head>",
            "<body><ul><li>b</li></ul><script>init(2);</script></body></html>"
        );
        let payload = ResponsePayload::decode("http://a.com/list?page=2", 200, html);

        let outcome = renderer.render(&payload, "http://a.com/list?page=2", &LoadOptions::default());

        assert_eq!(page.title().as_deref(), Some("Page 2"));
        assert_eq!(page.body(), "<ul><li>b</li></ul>");
        assert_eq!(page.executed_scripts(), vec!["init(2);"]);
        match outcome {
            RenderOutcome::Rendered { history, .. } => assert_eq!(
                history,
                Some(HistoryAction::Replace("http://a.com/list?page=2".to_string()))
            ),
            other => panic!("Expected Rendered, got {:?}", other),
        }
    }

    #[test]
    fn test_malformed_body_rendered_as_text() {
        let (renderer, page) = renderer("http://a.com/home");
        let payload = ResponsePayload::decode("http://a.com/x", 500, "Internal error");

        renderer.render(&payload, "http://a.com/x", &LoadOptions::default());
        assert_eq!(page.body(), "<p>Error: Internal error</p>");
    }

    #[test]
    fn test_target_region_with_view_override() {
        let (renderer, page) = renderer("http://a.com/home");
        let payload = ResponsePayload::from_value(
            "http://a.com/u/bo",
            json!({"d6": "something-else", "name": "Bo"}),
        );
        let options = LoadOptions {
            target: Some("#card".to_string()),
            view: Some("profile".to_string()),
        };

        let outcome = renderer.render(&payload, "http://a.com/u/bo", &options);

        assert_eq!(page.region("#card").as_deref(), Some("<h1>Hi Bo</h1>"));
        assert_eq!(page.body(), "");
        assert!(page.history().is_empty());
        assert_eq!(page.location(), "http://a.com/home");
        assert_eq!(page.snapshot().scroll_resets, 0);
        assert_eq!(
            outcome,
            RenderOutcome::Rendered {
                url: "http://a.com/u/bo".to_string(),
                region: Region::Target("#card".to_string()),
                history: None,
            }
        );
    }

    #[test]
    fn test_scripts_run_after_insert_in_order() {
        let (renderer, page) = renderer("http://a.com/");
        renderer.write_html(
            "<div>a</div><script>one()</script><script>two()</script>",
            &Region::Body,
        );

        assert_eq!(page.body(), "<div>a</div>");
        assert_eq!(page.executed_scripts(), vec!["one()", "two()"]);
    }

    #[test]
    fn test_response_url_strips_markers() {
        let payload = ResponsePayload::from_value("http://a.com/save?d6=99", json!({}));
        assert_eq!(
            Renderer::response_url(&payload, "http://a.com/save?d6=99"),
            "http://a.com/save"
        );
    }
}
