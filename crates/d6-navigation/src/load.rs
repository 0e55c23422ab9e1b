//! Authoritative load state
//!
//! ```text
//! Idle
//!   ↓ begin (click / submit / history pop)
//! Loading(sequence, url, started_at)
//!   ↓ begin again          → Loading(sequence + 1, ...)
//!   ↓ finish(current)      → Idle
//! ```
//!
//! Every load gets a fresh sequence number. Only the holder of the current
//! number may render; older loads finish silently.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NavigationPhase {
    /// No navigation in progress
    Idle,
    /// Waiting on the authoritative load
    Loading,
}

impl NavigationPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            NavigationPhase::Idle => "idle",
            NavigationPhase::Loading => "loading",
        }
    }
}

impl std::fmt::Display for NavigationPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Identifies one navigation attempt
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadTicket {
    pub sequence: u64,
    /// Canonical URL being loaded
    pub url: String,
    pub started_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoadState {
    phase: NavigationPhase,
    sequence: u64,
    url: Option<String>,
    started_at: Option<DateTime<Utc>>,
}

impl LoadState {
    pub fn new() -> Self {
        Self {
            phase: NavigationPhase::Idle,
            sequence: 0,
            url: None,
            started_at: None,
        }
    }

    /// Make `url` the authoritative load, superseding any earlier one
    pub fn begin(&mut self, url: &str) -> LoadTicket {
        let started_at = Utc::now();
        self.sequence += 1;

        if self.phase == NavigationPhase::Loading {
            tracing::debug!(
                superseded = ?self.url,
                sequence = self.sequence,
                "Superseding in-progress load"
            );
        }

        self.phase = NavigationPhase::Loading;
        self.url = Some(url.to_string());
        self.started_at = Some(started_at);

        LoadTicket {
            sequence: self.sequence,
            url: url.to_string(),
            started_at,
        }
    }

    pub fn is_current(&self, sequence: u64) -> bool {
        self.phase == NavigationPhase::Loading && self.sequence == sequence
    }

    /// Return to idle if `sequence` is still authoritative
    pub fn finish(&mut self, sequence: u64) -> bool {
        if !self.is_current(sequence) {
            return false;
        }
        self.phase = NavigationPhase::Idle;
        true
    }

    pub fn phase(&self) -> NavigationPhase {
        self.phase
    }

    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    /// Most recently loaded URL
    pub fn url(&self) -> Option<&str> {
        self.url.as_deref()
    }

    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        self.started_at
    }
}

impl Default for LoadState {
    fn default() -> Self {
        Self::new()
    }
}
