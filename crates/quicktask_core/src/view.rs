use crate::model::{StoredTask, TaskId, ViewType};
use crate::search;
use crate::store::TaskStore;
use time::OffsetDateTime;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewKind {
    Category(ViewType),
    Search(String),
}

impl ViewKind {
    pub fn title(&self) -> String {
        match self {
            Self::Category(view) => view.title(),
            Self::Search(phrase) => format!("search: {phrase}"),
        }
    }
}

/// One row of the active view, numbered as the caller saw it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewRow {
    pub index: usize,
    pub stored: StoredTask,
}

/// What the caller last rendered; numbered references resolve against `ids`.
/// The ids stay as captured until the next capture, so a task removed since
/// leaves a gap instead of shifting the numbers after it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActiveView {
    pub kind: ViewKind,
    pub ids: Vec<TaskId>,
}

impl ActiveView {
    pub fn capture(kind: ViewKind, store: &TaskStore, now: OffsetDateTime) -> Self {
        let ids = match &kind {
            ViewKind::Category(view) => store.view_ids(view, now),
            ViewKind::Search(phrase) => {
                let mut ids = search::search(
                    phrase,
                    store.pending().map(|(id, task)| (id, task.name.as_str())),
                );
                store.order_by_relevance(&mut ids);
                ids
            }
        };
        Self { kind, ids }
    }

    pub fn all(store: &TaskStore, now: OffsetDateTime) -> Self {
        Self::capture(ViewKind::Category(ViewType::All), store, now)
    }

    /// Maps a 1-based index to a task id.
    pub fn resolve(&self, index: i64) -> Option<TaskId> {
        let position = usize::try_from(index).ok()?.checked_sub(1)?;
        self.ids.get(position).copied()
    }

    /// Captured tasks still in the store, keeping their original numbers.
    pub fn rows(&self, store: &TaskStore) -> Vec<ViewRow> {
        self.ids
            .iter()
            .enumerate()
            .filter_map(|(position, &id)| {
                store.get(id).map(|task| ViewRow {
                    index: position + 1,
                    stored: StoredTask {
                        id,
                        task: task.clone(),
                    },
                })
            })
            .collect()
    }
}
