//! Failover records.
//!
//! Every completed failover is kept in a bounded, newest-last history.

use crate::core::{now, Timestamp};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Default number of failover events retained.
pub const DEFAULT_HISTORY_LIMIT: usize = 100;

/// A completed failover.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FailoverEvent {
    /// Event ID
    pub id: String,
    /// Region taken out of service
    pub from: String,
    /// Region that took over
    pub to: String,
    /// When the failover started
    pub started_at: Timestamp,
    /// When the target was confirmed healthy
    pub completed_at: Timestamp,
    /// Duration of failover (ms)
    pub duration_ms: u64,
}

impl FailoverEvent {
    /// Record a failover that started at `started_at` and completes now.
    pub fn completed(from: &str, to: &str, started_at: Timestamp) -> Self {
        let completed_at = now();
        let duration_ms = (completed_at - started_at).num_milliseconds().max(0) as u64;
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            from: from.to_string(),
            to: to.to_string(),
            started_at,
            completed_at,
            duration_ms,
        }
    }
}

/// Bounded failover history.
#[derive(Debug)]
pub struct FailoverHistory {
    events: VecDeque<FailoverEvent>,
    limit: usize,
}

impl FailoverHistory {
    /// Create a history keeping at most `limit` events.
    pub fn new(limit: usize) -> Self {
        Self {
            events: VecDeque::with_capacity(limit.min(16)),
            limit: limit.max(1),
        }
    }

    /// Append an event, evicting the oldest if full.
    pub fn record(&mut self, event: FailoverEvent) {
        if self.events.len() >= self.limit {
            self.events.pop_front();
        }
        self.events.push_back(event);
    }

    /// All retained events, oldest first.
    pub fn events(&self) -> Vec<FailoverEvent> {
        self.events.iter().cloned().collect()
    }

}

impl Default for FailoverHistory {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_LIMIT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_fields() {
        let event = FailoverEvent::completed("us-east-1", "us-west-2", now());
        assert_eq!(event.from, "us-east-1");
        assert_eq!(event.to, "us-west-2");
        assert!(event.completed_at >= event.started_at);
        assert!(!event.id.is_empty());
    }

    #[test]
    fn test_history_is_bounded() {
        let mut history = FailoverHistory::new(2);
        history.record(FailoverEvent::completed("a", "b", now()));
        history.record(FailoverEvent::completed("b", "c", now()));
        history.record(FailoverEvent::completed("c", "a", now()));

        let events = history.events();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].from, "b");
        assert_eq!(events[1].from, "c");
    }
}
