//! Bounded rolling history of processed records

use std::collections::VecDeque;

use crate::types::ProcessedRecord;

/// Fixed-capacity FIFO of the most recent records, oldest first.
///
/// Insertion order is the only order; records are never re-sorted by
/// timestamp or any other key.
#[derive(Debug, Clone)]
pub struct HistoryBuffer {
    records: VecDeque<ProcessedRecord>,
    capacity: usize,
}

impl HistoryBuffer {
    /// A capacity of zero is treated as one.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            records: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Append a record, evicting the oldest when full.
    pub fn push(&mut self, record: ProcessedRecord) {
        if self.records.len() == self.capacity {
            self.records.pop_front();
        }
        self.records.push_back(record);
    }

    /// Owned copy, oldest first.
    pub fn snapshot(&self) -> Vec<ProcessedRecord> {
        self.records.iter().cloned().collect()
    }

    pub fn latest(&self) -> Option<&ProcessedRecord> {
        self.records.back()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
