//! History stack updates after an in-page render

use serde::{Deserialize, Serialize};

use crate::address::same_path;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "url")]
pub enum HistoryAction {
    /// New history entry
    Push(String),
    /// Same page with a different query: overwrite the current entry
    Replace(String),
}

impl HistoryAction {
    /// Decide how to record a render of `destination` while at `current`
    pub fn for_destination(destination: &str, current: &str) -> Self {
        if same_path(destination, current) {
            HistoryAction::Replace(destination.to_string())
        } else {
            HistoryAction::Push(destination.to_string())
        }
    }

    pub fn url(&self) -> &str {
        match self {
            HistoryAction::Push(url) | HistoryAction::Replace(url) => url,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_for_new_path() {
        let action = HistoryAction::for_destination("http://a.com/b", "http://a.com/a");
        assert_eq!(action, HistoryAction::Push("http://a.com/b".to_string()));
    }

    #[test]
    fn test_replace_when_only_query_differs() {
        let action =
            HistoryAction::for_destination("http://a.com/list?page=2", "http://a.com/list?page=1");
        assert_eq!(
            action,
            HistoryAction::Replace("http://a.com/list?page=2".to_string())
        );
        assert_eq!(action.url(), "http://a.com/list?page=2");
    }
}
