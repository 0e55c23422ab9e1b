//! Page surface
//!
//! The renderer only touches the page through [`Page`] and runs extracted
//! scripts through [`ScriptExecutor`]. Hosts bind these to a real document;
//! [`MemoryPage`] keeps everything in memory.

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};

use d6_navigation::HistoryAction;

/// Where rendered HTML goes
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Region {
    /// The whole document body
    Body,
    /// The element matched by a selector
    Target(String),
}

impl Region {
    pub fn from_target(target: Option<&str>) -> Self {
        match target {
            Some(selector) => Region::Target(selector.to_string()),
            None => Region::Body,
        }
    }

    pub fn is_body(&self) -> bool {
        matches!(self, Region::Body)
    }
}

impl std::fmt::Display for Region {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Region::Body => write!(f, "body"),
            Region::Target(selector) => write!(f, "{}", selector),
        }
    }
}

pub trait Page: Send + Sync {
    /// Current document URL
    fn location(&self) -> String;
    fn set_title(&self, title: &str);
    fn set_html(&self, region: &Region, html: &str);
    fn scroll_to_top(&self);
    /// Add `class` to every element matching `selector` (may be a list)
    fn add_class(&self, selector: &str, class: &str);
    fn remove_class(&self, selector: &str, class: &str);
    /// Add a history entry and move the location to `url`
    fn push_history(&self, url: &str);
    /// Overwrite the current history entry and move the location to `url`
    fn replace_history(&self, url: &str);
    /// Full browser navigation
    fn assign_location(&self, url: &str);

    /// New content is in place; hosts re-bind handlers here
    fn content_ready(&self, _region: &Region) {}
}

pub trait ScriptExecutor: Send + Sync {
    fn execute(&self, script: &str);
}

/// Everything a [`MemoryPage`] has recorded
#[derive(Debug, Clone, Default)]
pub struct MemoryDocument {
    pub location: String,
    pub title: Option<String>,
    pub body: String,
    /// Target region selector → last HTML written to it
    pub regions: HashMap<String, String>,
    /// Selector → classes currently applied
    pub classes: HashMap<String, BTreeSet<String>>,
    pub history: Vec<HistoryAction>,
    pub scroll_resets: usize,
    /// Set once a full browser navigation was requested
    pub assigned: Option<String>,
    pub scripts: Vec<String>,
    pub ready: Vec<Region>,
}

/// In-memory page, also usable as its own script executor
pub struct MemoryPage {
    doc: RwLock<MemoryDocument>,
}

impl MemoryPage {
    pub fn new(location: &str) -> Self {
        Self {
            doc: RwLock::new(MemoryDocument {
                location: location.to_string(),
                ..MemoryDocument::default()
            }),
        }
    }

    pub fn snapshot(&self) -> MemoryDocument {
        self.doc.read().clone()
    }

    pub fn title(&self) -> Option<String> {
        self.doc.read().title.clone()
    }

    pub fn body(&self) -> String {
        self.doc.read().body.clone()
    }

    pub fn region(&self, selector: &str) -> Option<String> {
        self.doc.read().regions.get(selector).cloned()
    }

    pub fn has_class(&self, selector: &str, class: &str) -> bool {
        self.doc
            .read()
            .classes
            .get(selector)
            .is_some_and(|classes| classes.contains(class))
    }

    pub fn history(&self) -> Vec<HistoryAction> {
        self.doc.read().history.clone()
    }

    pub fn assigned_location(&self) -> Option<String> {
        self.doc.read().assigned.clone()
    }

    pub fn executed_scripts(&self) -> Vec<String> {
        self.doc.read().scripts.clone()
    }

    /// Simulate the user moving through history
    pub fn set_location(&self, url: &str) {
        self.doc.write().location = url.to_string();
    }
}

fn selectors(list: &str) -> impl Iterator<Item = &str> {
    list.split(',').map(str::trim).filter(|s| !s.is_empty())
}

impl Page for MemoryPage {
    fn location(&self) -> String {
        self.doc.read().location.clone()
    }

    fn set_title(&self, title: &str) {
        self.doc.write().title = Some(title.to_string());
    }

    fn set_html(&self, region: &Region, html: &str) {
        let mut doc = self.doc.write();
        match region {
            Region::Body => doc.body = html.to_string(),
            Region::Target(selector) => {
                doc.regions.insert(selector.clone(), html.to_string());
            }
        }
    }

    fn scroll_to_top(&self) {
        self.doc.write().scroll_resets += 1;
    }

    fn add_class(&self, selector: &str, class: &str) {
        let mut doc = self.doc.write();
        for selector in selectors(selector) {
            doc.classes
                .entry(selector.to_string())
                .or_default()
                .insert(class.to_string());
        }
    }

    fn remove_class(&self, selector: &str, class: &str) {
        let mut doc = self.doc.write();
        for selector in selectors(selector) {
            if let Some(classes) = doc.classes.get_mut(selector) {
                classes.remove(class);
            }
        }
    }

    fn push_history(&self, url: &str) {
        let mut doc = self.doc.write();
        doc.history.push(HistoryAction::Push(url.to_string()));
        doc.location = url.to_string();
    }

    fn replace_history(&self, url: &str) {
        let mut doc = self.doc.write();
        doc.history.push(HistoryAction::Replace(url.to_string()));
        doc.location = url.to_string();
    }

    fn assign_location(&self, url: &str) {
        let mut doc = self.doc.write();
        doc.assigned = Some(url.to_string());
        doc.location = url.to_string();
    }

    fn content_ready(&self, region: &Region) {
        self.doc.write().ready.push(region.clone());
    }
}

impl ScriptExecutor for MemoryPage {
    fn execute(&self, script: &str) {
        self.doc.write().scripts.push(script.to_string());
    }
}
