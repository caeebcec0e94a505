use crate::error::AppError;
use crate::model::{StoredTask, Task, TaskId, TaskKind, ViewType};
use serde::{Deserialize, Serialize};
use std::cmp::Reverse;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use time::OffsetDateTime;

/// The lists a task can be filed under. Only `Pending` and `Completed` are
/// canonical; the rest are derived from them and the clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Pending,
    Floating,
    Deadline,
    Event,
    Completed,
    Expired,
    ThisWeek,
}

impl Category {
    pub const ALL: [Category; 7] = [
        Category::Pending,
        Category::Floating,
        Category::Deadline,
        Category::Event,
        Category::Completed,
        Category::Expired,
        Category::ThisWeek,
    ];

    pub const CANONICAL: [Category; 2] = [Category::Pending, Category::Completed];

    pub fn key(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Floating => "floating",
            Self::Deadline => "deadline",
            Self::Event => "event",
            Self::Completed => "completed",
            Self::Expired => "expired",
            Self::ThisWeek => "this_week",
        }
    }

    pub fn contains(self, task: &Task, now: OffsetDateTime) -> bool {
        match self {
            Self::Pending => task.is_pending(),
            Self::Floating => task.is_pending() && task.kind() == TaskKind::Floating,
            Self::Deadline => task.is_pending() && task.kind() == TaskKind::Deadline,
            Self::Event => task.is_pending() && task.kind() == TaskKind::Event,
            Self::Completed => task.completed,
            Self::Expired => task.is_expired(now),
            Self::ThisWeek => task.is_this_week(now),
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Every task, keyed by id. Category and view membership is derived on read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskStore {
    tasks: BTreeMap<TaskId, Task>,
    next_id: u64,
}

impl Default for TaskStore {
    fn default() -> Self {
        Self {
            tasks: BTreeMap::new(),
            next_id: 1,
        }
    }
}

impl TaskStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuilds a store from persisted lists.
    pub fn from_stored<I>(items: I) -> Result<Self, AppError>
    where
        I: IntoIterator<Item = StoredTask>,
    {
        let mut store = Self::new();
        let mut pending_names = BTreeSet::new();

        for StoredTask { id, task } in items {
            if store.tasks.contains_key(&id) {
                return Err(AppError::invalid_data(format!("task id {id} appears twice")));
            }
            if task.is_pending() && !pending_names.insert(task.name.clone()) {
                return Err(AppError::invalid_data(format!(
                    "pending task '{}' appears twice",
                    task.name
                )));
            }
            store.restore(id, task);
        }

        Ok(store)
    }

    pub fn insert(&mut self, task: Task) -> TaskId {
        let id = TaskId(self.next_id);
        self.next_id += 1;
        self.tasks.insert(id, task);
        id
    }

    /// Puts a task back under an id it held before.
    pub fn restore(&mut self, id: TaskId, task: Task) {
        self.next_id = self.next_id.max(id.0 + 1);
        self.tasks.insert(id, task);
    }

    pub fn remove(&mut self, id: TaskId) -> Option<Task> {
        self.tasks.remove(&id)
    }

    pub fn get(&self, id: TaskId) -> Option<&Task> {
        self.tasks.get(&id)
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn clear(&mut self) {
        self.tasks.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = (TaskId, &Task)> {
        self.tasks.iter().map(|(id, task)| (*id, task))
    }

    pub fn pending(&self) -> impl Iterator<Item = (TaskId, &Task)> {
        self.iter().filter(|(_, task)| task.is_pending())
    }

    pub fn find_pending(&self, name: &str) -> Option<TaskId> {
        self.pending()
            .find(|(_, task)| task.name == name)
            .map(|(id, _)| id)
    }

    pub fn pending_with_tag(&self, tag: &str) -> Vec<TaskId> {
        self.pending()
            .filter(|(_, task)| task.tags.contains(tag))
            .map(|(id, _)| id)
            .collect()
    }

    pub fn category(&self, category: Category, now: OffsetDateTime) -> Vec<StoredTask> {
        let ids = self.ordered(|task| category.contains(task, now));
        self.stored(&ids)
    }

    pub fn view_ids(&self, view: &ViewType, now: OffsetDateTime) -> Vec<TaskId> {
        let tomorrow = now.date().next_day();
        match view {
            ViewType::All => self.ordered(|task| Category::Pending.contains(task, now)),
            ViewType::General => self.ordered(|task| Category::Floating.contains(task, now)),
            ViewType::Deadlines => self.ordered(|task| Category::Deadline.contains(task, now)),
            ViewType::Events => self.ordered(|task| Category::Event.contains(task, now)),
            ViewType::Archive => self.ordered(|task| Category::Completed.contains(task, now)),
            ViewType::Expired => self.ordered(|task| Category::Expired.contains(task, now)),
            ViewType::Week => self.ordered(|task| Category::ThisWeek.contains(task, now)),
            ViewType::Today => {
                self.ordered(|task| task.is_pending() && task.falls_on(now.date(), now))
            }
            ViewType::Tomorrow => self.ordered(|task| {
                task.is_pending() && tomorrow.is_some_and(|day| task.falls_on(day, now))
            }),
            ViewType::Priority(priority) => {
                self.ordered(|task| task.is_pending() && task.priority == *priority)
            }
            ViewType::Tags(tags) => self.ordered(|task| {
                task.is_pending() && task.tags.iter().any(|tag| tags.contains(tag))
            }),
            ViewType::Help => Vec::new(),
        }
    }

    pub fn stored(&self, ids: &[TaskId]) -> Vec<StoredTask> {
        ids.iter()
            .filter_map(|id| {
                self.get(*id).map(|task| StoredTask {
                    id: *id,
                    task: task.clone(),
                })
            })
            .collect()
    }

    /// Search results: highest priority first, then most recently added.
    pub fn order_by_relevance(&self, ids: &mut [TaskId]) {
        ids.sort_by_key(|id| {
            let priority = self.get(*id).map(|task| task.priority);
            (Reverse(priority), Reverse(*id))
        });
    }

    /// Dated tasks by instant, then floating ones; ties by priority then age.
    fn ordered<F>(&self, keep: F) -> Vec<TaskId>
    where
        F: Fn(&Task) -> bool,
    {
        let mut selected: Vec<(TaskId, &Task)> =
            self.iter().filter(|(_, task)| keep(task)).collect();
        selected.sort_by_key(|(id, task)| {
            let anchor = task.schedule.anchor();
            (anchor.is_none(), anchor, Reverse(task.priority), *id)
        });
        selected.into_iter().map(|(id, _)| id).collect()
    }
}
