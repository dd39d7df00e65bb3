//! Whole-list snapshot undo/redo
//!
//! Every mutating store operation records the list as it was *before* the
//! change. Undo swaps the current list with the newest snapshot; redo swaps
//! it back. Gesture batches (a drag that writes through on every pointer
//! move) record a single snapshot for the whole gesture, and only once the
//! gesture actually writes.

/// Undo/redo stacks of full-list snapshots.
#[derive(Debug, Clone)]
pub struct History<T> {
    undo: Vec<Vec<T>>,
    redo: Vec<Vec<T>>,
    limit: usize,
    batching: bool,
    /// Batch start state, pushed on the first record inside the batch
    pending: Option<Vec<T>>,
}

impl<T: Clone + PartialEq> History<T> {
    pub fn new(limit: usize) -> Self {
        Self {
            undo: Vec::new(),
            redo: Vec::new(),
            limit: limit.max(1),
            batching: false,
            pending: None,
        }
    }

    /// Record `current` as the state to return to, and invalidate redo.
    ///
    /// Inside a batch only the first call records, and it records the
    /// state the batch started from.
    pub fn record(&mut self, current: &[T]) {
        if self.batching {
            if let Some(start) = self.pending.take() {
                self.push_undo(start);
                self.redo.clear();
            }
            return;
        }
        self.push_undo(current.to_vec());
        self.redo.clear();
    }

    /// Start coalescing subsequent records into one snapshot of `current`.
    ///
    /// Nothing is pushed and redo survives until the batch records.
    pub fn begin_batch(&mut self, current: &[T]) {
        if self.batching {
            return;
        }
        self.pending = Some(current.to_vec());
        self.batching = true;
    }

    /// Close the batch; drops the snapshot if nothing actually changed.
    pub fn end_batch(&mut self, current: &[T]) {
        if !self.batching {
            return;
        }
        self.batching = false;
        if self.pending.take().is_some() {
            return;
        }
        if self.undo.last().is_some_and(|snapshot| snapshot.as_slice() == current) {
            self.undo.pop();
        }
    }

    /// Restore the newest snapshot into `current`. Returns false when empty.
    pub fn undo(&mut self, current: &mut Vec<T>) -> bool {
        self.batching = false;
        self.pending = None;
        let Some(snapshot) = self.undo.pop() else {
            return false;
        };
        self.redo.push(std::mem::replace(current, snapshot));
        true
    }

    pub fn redo(&mut self, current: &mut Vec<T>) -> bool {
        self.batching = false;
        self.pending = None;
        let Some(snapshot) = self.redo.pop() else {
            return false;
        };
        let previous = std::mem::replace(current, snapshot);
        self.push_undo(previous);
        true
    }

    pub fn can_undo(&self) -> bool {
        !self.undo.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo.is_empty()
    }

    pub fn peek_undo(&self) -> Option<&[T]> {
        self.undo.last().map(Vec::as_slice)
    }

    /// Drop the newest undo snapshot without touching redo.
    pub fn pop_undo(&mut self) -> Option<Vec<T>> {
        self.undo.pop()
    }

    pub fn clear(&mut self) {
        self.undo.clear();
        self.redo.clear();
        self.batching = false;
        self.pending = None;
    }

    fn push_undo(&mut self, snapshot: Vec<T>) {
        if self.undo.len() == self.limit {
            self.undo.remove(0);
        }
        self.undo.push(snapshot);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn push(history: &mut History<u32>, list: &mut Vec<u32>, value: u32) {
        history.record(list);
        list.push(value);
    }

    #[test]
    fn undo_all_then_redo_all() {
        let mut history = History::new(100);
        let mut list = Vec::new();
        for value in 1..=4 {
            push(&mut history, &mut list, value);
        }

        while history.undo(&mut list) {}
        assert!(list.is_empty());
        assert!(!history.can_undo());

        while history.redo(&mut list) {}
        assert_eq!(list, vec![1, 2, 3, 4]);
        assert!(!history.can_redo());
    }

    #[test]
    fn new_change_clears_redo() {
        let mut history = History::new(10);
        let mut list = Vec::new();
        push(&mut history, &mut list, 1);
        history.undo(&mut list);
        assert!(history.can_redo());

        push(&mut history, &mut list, 2);
        assert!(!history.can_redo());
        assert_eq!(list, vec![2]);
    }

    #[test]
    fn limit_drops_oldest_snapshot() {
        let mut history = History::new(2);
        let mut list = Vec::new();
        for value in 1..=3 {
            push(&mut history, &mut list, value);
        }
        assert!(history.undo(&mut list));
        assert!(history.undo(&mut list));
        assert!(!history.undo(&mut list));
        assert_eq!(list, vec![1]);
    }

    #[test]
    fn batch_records_one_snapshot() {
        let mut history = History::new(10);
        let mut list = vec![0];
        history.begin_batch(&list);
        for value in 1..5 {
            history.record(&list);
            list[0] = value;
        }
        history.end_batch(&list);

        assert!(history.undo(&mut list));
        assert_eq!(list, vec![0]);
        assert!(!history.can_undo());
    }

    #[test]
    fn unchanged_batch_leaves_no_entry() {
        let mut history = History::new(10);
        let list = vec![7];
        history.begin_batch(&list);
        history.end_batch(&list);
        assert!(!history.can_undo());
    }

    #[test]
    fn empty_batch_keeps_redo() {
        let mut history = History::new(10);
        let mut list = Vec::new();
        push(&mut history, &mut list, 1);
        push(&mut history, &mut list, 2);
        history.undo(&mut list);

        history.begin_batch(&list);
        history.end_batch(&list);
        assert!(history.can_redo());
        assert!(history.redo(&mut list));
        assert_eq!(list, vec![1, 2]);
    }

    #[test]
    fn batch_that_writes_clears_redo() {
        let mut history = History::new(10);
        let mut list = Vec::new();
        push(&mut history, &mut list, 1);
        history.undo(&mut list);

        history.begin_batch(&list);
        push(&mut history, &mut list, 5);
        push(&mut history, &mut list, 6);
        history.end_batch(&list);

        assert!(!history.can_redo());
        assert!(history.undo(&mut list));
        assert!(list.is_empty());
        assert!(!history.can_undo());
    }
}
