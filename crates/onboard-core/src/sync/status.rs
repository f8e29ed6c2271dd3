//! Sync status reporting
//!
//! `DrainReport` describes one drain cycle. `StatusView` is the badge state
//! a host renders, derived purely from the queue length and the online flag.

use std::fmt;

use serde::Serialize;

/// Outcome of a drain cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DrainStatus {
    /// Skipped: no connectivity, items remain queued
    Offline,
    /// Outbox is empty
    AllSynced,
    /// At least one item is still queued
    SomeQueued,
}

impl fmt::Display for DrainStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DrainStatus::Offline => f.write_str("Offline – queued"),
            DrainStatus::AllSynced => f.write_str("All synced"),
            DrainStatus::SomeQueued => f.write_str("Some queued"),
        }
    }
}

/// Counts from one drain cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DrainReport {
    pub status: DrainStatus,
    /// Requests issued
    pub attempted: usize,
    pub delivered: usize,
    pub failed: usize,
    /// Items left in the outbox afterwards
    pub remaining: usize,
}

impl DrainReport {
    pub fn offline(remaining: usize) -> Self {
        Self {
            status: DrainStatus::Offline,
            attempted: 0,
            delivered: 0,
            failed: 0,
            remaining,
        }
    }

    pub fn is_synced(&self) -> bool {
        self.status == DrainStatus::AllSynced
    }
}

/// Everything a host needs to draw its status badges
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StatusView {
    pub online: bool,
    pub queued: usize,
    pub sync: DrainStatus,
}

impl StatusView {
    /// Derive the view from current store contents and connectivity
    pub fn project(online: bool, queued: usize) -> Self {
        let sync = if queued == 0 {
            DrainStatus::AllSynced
        } else if online {
            DrainStatus::SomeQueued
        } else {
            DrainStatus::Offline
        };
        Self {
            online,
            queued,
            sync,
        }
    }

    pub fn online_badge(&self) -> &'static str {
        if self.online {
            "Online"
        } else {
            "Offline"
        }
    }

    pub fn queue_badge(&self) -> String {
        format!("Queued: {}", self.queued)
    }

    /// Whether the sync badge should render as healthy
    pub fn is_ok(&self) -> bool {
        self.sync == DrainStatus::AllSynced
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_projection() {
        let view = StatusView::project(true, 0);
        assert_eq!(view.sync, DrainStatus::AllSynced);
        assert_eq!(view.online_badge(), "Online");
        assert_eq!(view.queue_badge(), "Queued: 0");
        assert!(view.is_ok());

        let view = StatusView::project(true, 2);
        assert_eq!(view.sync, DrainStatus::SomeQueued);
        assert!(!view.is_ok());

        let view = StatusView::project(false, 1);
        assert_eq!(view.sync, DrainStatus::Offline);
        assert_eq!(view.online_badge(), "Offline");
        assert_eq!(view.sync.to_string(), "Offline – queued");
    }

    #[test]
    fn test_drain_report_offline() {
        let report = DrainReport::offline(3);
        assert_eq!(report.status, DrainStatus::Offline);
        assert_eq!(report.attempted, 0);
        assert_eq!(report.remaining, 3);
        assert!(!report.is_synced());
    }

    #[test]
    fn test_status_json() {
        let json = serde_json::to_value(StatusView::project(false, 1)).unwrap();
        assert_eq!(json["sync"], "offline");
        assert_eq!(json["queued"], 1);
    }
}
