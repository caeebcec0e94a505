pub mod json_store;

use crate::error::AppError;
use crate::model::StoredTask;
use crate::store::Category;
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, PoisonError};

pub use json_store::JsonStore;

/// Where category lists are written to and read back from.
pub trait StorageGateway: Send {
    fn save_list(&mut self, category: Category, items: &[StoredTask]) -> Result<(), AppError>;

    fn load_list(&self, category: Category) -> Result<Vec<StoredTask>, AppError>;
}

#[derive(Debug, Default)]
struct MemoryState {
    lists: BTreeMap<Category, Vec<StoredTask>>,
    saves: Vec<Category>,
    failing: bool,
}

/// Keeps lists in memory. Clones share state, so a test can hand one to
/// `Logic` and inspect what was written through another.
#[derive(Debug, Default, Clone)]
pub struct MemoryGateway {
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_list(self, category: Category, items: Vec<StoredTask>) -> Self {
        self.lock().lists.insert(category, items);
        self
    }

    /// Makes every following save fail with a storage error.
    pub fn set_failing(&self, failing: bool) {
        self.lock().failing = failing;
    }

    pub fn list(&self, category: Category) -> Vec<StoredTask> {
        self.lock().lists.get(&category).cloned().unwrap_or_default()
    }

    /// Categories in the order they were saved.
    pub fn saves(&self) -> Vec<Category> {
        self.lock().saves.clone()
    }

    pub fn clear_saves(&self) {
        self.lock().saves.clear();
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl StorageGateway for MemoryGateway {
    fn save_list(&mut self, category: Category, items: &[StoredTask]) -> Result<(), AppError> {
        let mut state = self.lock();
        if state.failing {
            return Err(AppError::io(format!("cannot write {category}")));
        }
        state.lists.insert(category, items.to_vec());
        state.saves.push(category);
        Ok(())
    }

    fn load_list(&self, category: Category) -> Result<Vec<StoredTask>, AppError> {
        Ok(self.list(category))
    }
}
