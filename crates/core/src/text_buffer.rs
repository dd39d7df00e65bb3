//! Local undo ring for an in-progress text buffer
//!
//! Separate from the document history: while a text entity is being typed
//! into, its content lives in a local buffer. Snapshots are taken when input
//! resumes after a quiet period, decided by [`should_snapshot`] over explicit
//! timestamps so behavior is deterministic under test.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

/// Whether input arriving at `now` starts a new snapshot.
pub fn should_snapshot(last_input: Option<Instant>, now: Instant, debounce: Duration) -> bool {
    match last_input {
        None => true,
        Some(last) => now.saturating_duration_since(last) >= debounce,
    }
}

#[derive(Debug, Clone)]
pub struct TextBufferHistory {
    snapshots: VecDeque<String>,
    cursor: usize,
    capacity: usize,
    debounce: Duration,
    last_input: Option<Instant>,
}

impl TextBufferHistory {
    pub fn new(initial: impl Into<String>, capacity: usize, debounce: Duration) -> Self {
        let mut snapshots = VecDeque::with_capacity(capacity.max(2));
        snapshots.push_back(initial.into());
        Self { snapshots, cursor: 0, capacity: capacity.max(2), debounce, last_input: None }
    }

    pub fn current(&self) -> &str {
        self.snapshots.get(self.cursor).map(String::as_str).unwrap_or_default()
    }

    /// Record buffer `content` typed at `now`.
    ///
    /// Bursts of input inside the debounce window amend the newest snapshot;
    /// input after a pause pushes a new one. The initial content is never
    /// amended. Any redo tail is dropped.
    pub fn record(&mut self, content: &str, now: Instant) {
        if content == self.current() {
            self.last_input = Some(now);
            return;
        }

        self.snapshots.truncate(self.cursor + 1);
        if self.cursor == 0 || should_snapshot(self.last_input, now, self.debounce) {
            if self.snapshots.len() == self.capacity {
                self.snapshots.pop_front();
            }
            self.snapshots.push_back(content.to_owned());
            self.cursor = self.snapshots.len() - 1;
        } else if let Some(newest) = self.snapshots.back_mut() {
            *newest = content.to_owned();
        }
        self.last_input = Some(now);
    }

    pub fn undo(&mut self) -> Option<&str> {
        if self.cursor == 0 {
            return None;
        }
        self.cursor -= 1;
        // Typing after an undo always starts a fresh snapshot
        self.last_input = None;
        Some(self.current())
    }

    pub fn redo(&mut self) -> Option<&str> {
        if self.cursor + 1 >= self.snapshots.len() {
            return None;
        }
        self.cursor += 1;
        self.last_input = None;
        Some(self.current())
    }

    pub fn can_undo(&self) -> bool {
        self.cursor > 0
    }

    pub fn can_redo(&self) -> bool {
        self.cursor + 1 < self.snapshots.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DEBOUNCE: Duration = Duration::from_millis(500);

    #[test]
    fn snapshot_check_is_pure() {
        let start = Instant::now();
        assert!(should_snapshot(None, start, DEBOUNCE));
        assert!(!should_snapshot(Some(start), start + Duration::from_millis(499), DEBOUNCE));
        assert!(should_snapshot(Some(start), start + DEBOUNCE, DEBOUNCE));
    }

    #[test]
    fn burst_then_pause_gives_two_steps() {
        let start = Instant::now();
        let mut history = TextBufferHistory::new("", 50, DEBOUNCE);
        history.record("H", start);
        history.record("He", start + Duration::from_millis(100));
        history.record("Hel", start + Duration::from_millis(200));
        history.record("Hello", start + Duration::from_millis(900));

        assert_eq!(history.undo(), Some("Hel"));
        assert_eq!(history.undo(), Some(""));
        assert_eq!(history.undo(), None);
        assert_eq!(history.redo(), Some("Hel"));
        assert_eq!(history.redo(), Some("Hello"));
        assert!(!history.can_redo());
    }

    #[test]
    fn typing_after_undo_drops_redo_and_keeps_original() {
        let start = Instant::now();
        let mut history = TextBufferHistory::new("orig", 50, DEBOUNCE);
        history.record("orig!", start);
        history.undo();
        history.record("other", start + Duration::from_millis(10));

        assert!(!history.can_redo());
        assert_eq!(history.undo(), Some("orig"));
    }

    #[test]
    fn unchanged_input_does_not_overwrite_initial_text() {
        let start = Instant::now();
        let mut history = TextBufferHistory::new("orig", 50, DEBOUNCE);
        history.record("orig", start);
        history.record("orig!", start + Duration::from_millis(10));

        assert_eq!(history.undo(), Some("orig"));
        assert_eq!(history.redo(), Some("orig!"));
    }

    #[test]
    fn capacity_evicts_oldest() {
        let start = Instant::now();
        let mut history = TextBufferHistory::new("0", 3, DEBOUNCE);
        for step in 1..=5u64 {
            history.record(&step.to_string(), start + DEBOUNCE * step as u32);
        }
        assert_eq!(history.undo(), Some("4"));
        assert_eq!(history.undo(), Some("3"));
        assert_eq!(history.undo(), None);
    }
}
