//! View registry
//!
//! Maps view names to render functions. Registration merges: a new view
//! replaces one of the same name, nothing is ever removed.

use parking_lot::RwLock;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

/// Render function from response data to HTML
pub type View = Arc<dyn Fn(&Value) -> String + Send + Sync>;

pub struct ViewRegistry {
    views: Arc<RwLock<HashMap<String, View>>>,
}

impl ViewRegistry {
    pub fn new() -> Self {
        Self {
            views: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    pub fn register<F>(&self, name: &str, view: F)
    where
        F: Fn(&Value) -> String + Send + Sync + 'static,
    {
        let replaced = self
            .views
            .write()
            .insert(name.to_string(), Arc::new(view))
            .is_some();

        tracing::debug!(view = %name, replaced, "Registered view");
    }

    /// Merge a batch of views. Returns how many were added or replaced.
    pub fn extend<I>(&self, views: I) -> usize
    where
        I: IntoIterator<Item = (String, View)>,
    {
        let mut map = self.views.write();
        let mut count = 0;
        for (name, view) in views {
            map.insert(name, view);
            count += 1;
        }

        tracing::debug!(count, total = map.len(), "Merged views");

        count
    }

    pub fn get(&self, name: &str) -> Option<View> {
        self.views.read().get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.views.read().contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.views.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Registered view names, sorted
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.views.read().keys().cloned().collect();
        names.sort();
        names
    }

    /// Render `context` with the named view, if registered
    pub fn render(&self, name: &str, context: &Value) -> Option<String> {
        // Cloned out so the view runs without the registry lock
        let view = self.get(name)?;
        Some(view(context))
    }
}

impl Default for ViewRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for ViewRegistry {
    fn clone(&self) -> Self {
        Self {
            views: Arc::clone(&self.views),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_register_and_render() {
        let registry = ViewRegistry::new();
        registry.register("profile", |ctx| {
            format!("<h1>Hi {}</h1>", ctx["name"].as_str().unwrap_or(""))
        });

        let html = registry.render("profile", &json!({"name": "Ann"}));
        assert_eq!(html.as_deref(), Some("<h1>Hi Ann</h1>"));
        assert!(registry.render("missing", &json!({})).is_none());
    }

    #[test]
    fn test_register_overwrites() {
        let registry = ViewRegistry::new();
        registry.register("home", |_| "old".to_string());
        registry.register("home", |_| "new".to_string());

        assert_eq!(registry.len(), 1);
        assert_eq!(registry.render("home", &Value::Null).as_deref(), Some("new"));
    }

    #[test]
    fn test_extend_merges() {
        let registry = ViewRegistry::new();
        registry.register("a", |_| "a1".to_string());

        let a: View = Arc::new(|_: &Value| "a2".to_string());
        let b: View = Arc::new(|_: &Value| "b".to_string());
        let batch = vec![("a".to_string(), a), ("b".to_string(), b)];
        assert_eq!(registry.extend(batch), 2);

        assert_eq!(registry.names(), vec!["a", "b"]);
        assert_eq!(registry.render("a", &Value::Null).as_deref(), Some("a2"));
    }

    #[test]
    fn test_clone_shares_views() {
        let registry = ViewRegistry::new();
        let shared = registry.clone();
        registry.register("x", |_| String::new());
        assert!(shared.contains("x"));
    }
}
