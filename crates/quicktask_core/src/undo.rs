use crate::model::{Operation, StoredTask, TaskId};

/// How to reverse one applied operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UndoEntry {
    pub operation: Operation,
    /// Tasks the operation put in the store, to be taken out again.
    pub introduced: Vec<TaskId>,
    /// Tasks the operation took out or replaced, to be put back under their ids.
    pub displaced: Vec<StoredTask>,
}

/// Holds at most the most recent reversible operation.
#[derive(Debug, Default, Clone)]
pub struct UndoLog {
    slot: Option<UndoEntry>,
}

impl UndoLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, entry: UndoEntry) {
        self.slot = Some(entry);
    }

    pub fn take(&mut self) -> Option<UndoEntry> {
        self.slot.take()
    }

    pub fn clear(&mut self) {
        self.slot = None;
    }

    pub fn is_empty(&self) -> bool {
        self.slot.is_none()
    }
}
