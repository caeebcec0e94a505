use crate::clock::Clock;
use crate::error::{AppError, LogicError};
use crate::model::{Operation, StoredTask, Target, Task, TaskChange, TaskId, ViewType};
use crate::parser::{CommandParser, ParseContext};
use crate::storage::StorageGateway;
use crate::store::{Category, TaskStore};
use crate::tags::{TagCount, TagRegistry};
use crate::undo::{UndoEntry, UndoLog};
use crate::view::{ActiveView, ViewKind, ViewRow};
use std::collections::{BTreeMap, BTreeSet};
use time::OffsetDateTime;
use tracing::{debug, info, warn};

/// Outcome of a successfully applied operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Status {
    Viewed(ViewType),
    Help,
    Added(String),
    AddedExpired(String),
    Deleted(Vec<String>),
    Updated(String),
    UpdatedExpired(String),
    Done(String),
    Searched { phrase: String, matches: usize },
    Undone(&'static str),
    Saved,
    Cleared,
}

impl Status {
    pub fn code(&self) -> &'static str {
        match self {
            Self::Viewed(_) => "viewed",
            Self::Help => "help",
            Self::Added(_) => "added",
            Self::AddedExpired(_) => "added_expired",
            Self::Deleted(_) => "deleted",
            Self::Updated(_) => "updated",
            Self::UpdatedExpired(_) => "updated_expired",
            Self::Done(_) => "done",
            Self::Searched { .. } => "searched",
            Self::Undone(_) => "undone",
            Self::Saved => "saved",
            Self::Cleared => "cleared",
        }
    }

    pub fn message(&self) -> String {
        match self {
            Self::Viewed(view) => format!("Showing {}", view.title()),
            Self::Help => "Showing help".to_string(),
            Self::Added(name) => format!("Added task: {name}"),
            Self::AddedExpired(name) => format!("Added task: {name} (already expired)"),
            Self::Deleted(names) if names.len() == 1 => format!("Deleted task: {}", names[0]),
            Self::Deleted(names) => format!("Deleted {} task(s)", names.len()),
            Self::Updated(name) => format!("Updated task: {name}"),
            Self::UpdatedExpired(name) => format!("Updated task: {name} (now expired)"),
            Self::Done(name) => format!("Completed task: {name}"),
            Self::Searched { phrase, matches } => {
                format!("Found {matches} task(s) matching '{phrase}'")
            }
            Self::Undone(operation) => format!("Undid last {operation}"),
            Self::Saved => "Saved all lists".to_string(),
            Self::Cleared => "Cleared all tasks".to_string(),
        }
    }
}

/// Everything a renderer needs after an operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    pub now: OffsetDateTime,
    pub categories: BTreeMap<Category, Vec<StoredTask>>,
    pub tags: Vec<TagCount>,
    pub view_title: String,
    pub view: Vec<ViewRow>,
}

/// Applies operations to the store, tag registry and undo log as one step
/// each, then writes the lists that changed.
pub struct Logic {
    store: TaskStore,
    tags: TagRegistry,
    undo: UndoLog,
    active: ActiveView,
    parser: CommandParser,
    gateway: Box<dyn StorageGateway>,
    clock: Box<dyn Clock>,
    expired_seen: BTreeSet<TaskId>,
    /// Lists as last written; a list missing here is rewritten on the next save.
    saved: BTreeMap<Category, Vec<StoredTask>>,
}

impl Logic {
    pub fn new(gateway: Box<dyn StorageGateway>, clock: Box<dyn Clock>) -> Self {
        let store = TaskStore::new();
        let now = clock.now();
        Self {
            active: ActiveView::all(&store, now),
            store,
            tags: TagRegistry::new(),
            undo: UndoLog::new(),
            parser: CommandParser::new(),
            gateway,
            clock,
            expired_seen: BTreeSet::new(),
            saved: Category::ALL
                .into_iter()
                .map(|category| (category, Vec::new()))
                .collect(),
        }
    }

    /// Builds the store from the pending and completed lists. The derived lists
    /// on disk are only read to know what the next save has to rewrite.
    pub fn load(gateway: Box<dyn StorageGateway>, clock: Box<dyn Clock>) -> Result<Self, AppError> {
        let mut items = Vec::new();
        let mut saved = BTreeMap::new();
        for category in Category::ALL {
            if !Category::CANONICAL.contains(&category) {
                match gateway.load_list(category) {
                    Ok(list) => {
                        saved.insert(category, list);
                    }
                    Err(err) => {
                        debug!(category = %category, error = %err, "derived list unreadable");
                    }
                }
                continue;
            }

            let list = gateway.load_list(category)?;
            if let Some(misfiled) = list
                .iter()
                .find(|stored| (category == Category::Completed) != stored.task.completed)
            {
                return Err(AppError::invalid_data(format!(
                    "task '{}' is filed under {category}",
                    misfiled.task.name
                )));
            }
            saved.insert(category, list.clone());
            items.extend(list);
        }

        let store = TaskStore::from_stored(items)?;
        let mut tags = TagRegistry::new();
        for (_, task) in store.pending() {
            tags.add_all(&task.tags);
        }

        let now = clock.now();
        let mut logic = Self::new(gateway, clock);
        logic.active = ActiveView::all(&store, now);
        logic.expired_seen = expired_ids(&store, now);
        logic.store = store;
        logic.tags = tags;
        logic.saved = saved;
        info!(tasks = logic.store.len(), "loaded tasks");
        Ok(logic)
    }

    pub fn with_parser(mut self, parser: CommandParser) -> Self {
        self.parser = parser;
        self
    }

    pub fn now(&self) -> OffsetDateTime {
        self.clock.now()
    }

    pub fn store(&self) -> &TaskStore {
        &self.store
    }

    pub fn tags(&self) -> &TagRegistry {
        &self.tags
    }

    pub fn active_view(&self) -> &ActiveView {
        &self.active
    }

    pub fn can_undo(&self) -> bool {
        !self.undo.is_empty()
    }

    /// Parses and applies one command line.
    pub fn execute(&mut self, line: &str) -> Result<Status, AppError> {
        let now = self.clock.now();
        let operation = self.parser.parse(
            line,
            &ParseContext {
                now,
                tags: &self.tags,
            },
        );
        self.apply(operation, now)
    }

    pub fn apply(&mut self, operation: Operation, now: OffsetDateTime) -> Result<Status, AppError> {
        if let Operation::Error(kind) = operation {
            return Err(kind.into());
        }

        let operation_name = operation.name();
        let (status, undo) = match operation.clone() {
            Operation::View(ViewType::Help) => (Status::Help, None),
            Operation::View(view) => {
                self.active =
                    ActiveView::capture(ViewKind::Category(view.clone()), &self.store, now);
                (Status::Viewed(view), None)
            }
            Operation::Add(task) => self.add(task, now)?,
            Operation::DeleteByIndex(index) => {
                let id = self.resolve_index(index)?;
                self.delete(vec![id])
            }
            Operation::DeleteByName(name) => {
                let id = self
                    .store
                    .find_pending(&name)
                    .ok_or(LogicError::TaskNotFound(name))?;
                self.delete(vec![id])
            }
            Operation::DeleteByTag(tag) => {
                if !self.tags.contains(&tag) {
                    return Err(LogicError::TagNotFound(tag).into());
                }
                let ids = self.store.pending_with_tag(&tag);
                self.delete(ids)
            }
            Operation::Update { target, change } => self.update(target, change, now)?,
            Operation::DoneByIndex(index) => {
                let id = self.resolve_index(index)?;
                self.done(id)?
            }
            Operation::DoneByName(name) => {
                let id = self
                    .store
                    .find_pending(&name)
                    .ok_or(LogicError::TaskNotFound(name))?;
                self.done(id)?
            }
            Operation::Search(phrase) => {
                self.active =
                    ActiveView::capture(ViewKind::Search(phrase.clone()), &self.store, now);
                let matches = self.active.ids.len();
                (Status::Searched { phrase, matches }, None)
            }
            Operation::Undo => (self.undo()?, None),
            Operation::Save => (Status::Saved, None),
            Operation::Clear => {
                self.store.clear();
                self.tags.clear();
                self.undo.clear();
                self.active = ActiveView::all(&self.store, now);
                (Status::Cleared, None)
            }
            Operation::Error(kind) => return Err(kind.into()),
        };

        if let Some(delta) = undo {
            self.undo.record(UndoEntry {
                operation,
                introduced: delta.introduced,
                displaced: delta.displaced,
            });
        }
        self.expired_seen = expired_ids(&self.store, now);
        info!(operation = operation_name, status = status.code(), "applied operation");

        let force = matches!(status, Status::Saved | Status::Cleared);
        self.persist(now, force)?;
        Ok(status)
    }

    /// Re-evaluates the time-derived lists, writes the ones that changed and
    /// returns tasks that expired since the last call. The active view is left
    /// as the caller last saw it.
    pub fn refresh(&mut self) -> Vec<StoredTask> {
        let now = self.clock.now();
        self.refresh_at(now)
    }

    pub fn refresh_at(&mut self, now: OffsetDateTime) -> Vec<StoredTask> {
        let expired = expired_ids(&self.store, now);
        let newly: Vec<TaskId> = expired.difference(&self.expired_seen).copied().collect();
        self.expired_seen = expired;
        if let Err(err) = self.persist(now, false) {
            warn!(error = %err, "refresh could not save every list");
        }

        debug!(newly_expired = newly.len(), "refreshed views");
        self.store.stored(&newly)
    }

    pub fn snapshot(&self) -> Snapshot {
        let now = self.clock.now();
        Snapshot {
            now,
            categories: self.category_lists(now),
            tags: self.tags.snapshot(),
            view_title: self.active.kind.title(),
            view: self.active.rows(&self.store),
        }
    }

    fn add(
        &mut self,
        task: Task,
        now: OffsetDateTime,
    ) -> Result<(Status, Option<Delta>), AppError> {
        if self.store.find_pending(&task.name).is_some() {
            return Err(LogicError::DuplicateName(task.name).into());
        }

        let status = if task.is_expired(now) {
            Status::AddedExpired(task.name.clone())
        } else {
            Status::Added(task.name.clone())
        };
        if task.is_pending() {
            self.tags.add_all(&task.tags);
        }
        let id = self.store.insert(task);

        Ok((
            status,
            Some(Delta {
                introduced: vec![id],
                displaced: Vec::new(),
            }),
        ))
    }

    fn delete(&mut self, ids: Vec<TaskId>) -> (Status, Option<Delta>) {
        let displaced: Vec<StoredTask> = ids.into_iter().filter_map(|id| self.detach(id)).collect();
        let names = displaced
            .iter()
            .map(|stored| stored.task.name.clone())
            .collect();

        (
            Status::Deleted(names),
            Some(Delta {
                introduced: Vec::new(),
                displaced,
            }),
        )
    }

    fn done(&mut self, id: TaskId) -> Result<(Status, Option<Delta>), AppError> {
        let task = self.task(id)?;
        if task.completed {
            return Err(LogicError::DoneInvalid(task.name.clone()).into());
        }

        let mut completed = task.clone();
        completed.completed = true;
        let name = completed.name.clone();
        let displaced = self.replace(id, completed);

        Ok((
            Status::Done(name),
            Some(Delta {
                introduced: vec![id],
                displaced,
            }),
        ))
    }

    fn update(
        &mut self,
        target: Target,
        change: TaskChange,
        now: OffsetDateTime,
    ) -> Result<(Status, Option<Delta>), AppError> {
        let id = match target {
            Target::Index(index) => self.resolve_index(index)?,
            Target::Name(name) => self
                .store
                .find_pending(&name)
                .ok_or(LogicError::TaskNotFound(name))?,
        };
        let task = self.task(id)?;
        if task.completed {
            return Err(LogicError::UpdateCompleted(task.name.clone()).into());
        }

        let mut updated = task.clone();
        change.apply_to(&mut updated);
        if updated.name != task.name && self.store.find_pending(&updated.name).is_some() {
            return Err(LogicError::DuplicateName(updated.name).into());
        }

        let status = if updated.is_expired(now) {
            Status::UpdatedExpired(updated.name.clone())
        } else {
            Status::Updated(updated.name.clone())
        };
        let displaced = self.replace(id, updated);

        Ok((
            status,
            Some(Delta {
                introduced: vec![id],
                displaced,
            }),
        ))
    }

    fn undo(&mut self) -> Result<Status, AppError> {
        let entry = self.undo.take().ok_or(LogicError::NothingToUndo)?;
        for id in &entry.introduced {
            self.detach(*id);
        }
        for stored in entry.displaced {
            self.attach(stored.id, stored.task);
        }
        Ok(Status::Undone(entry.operation.name()))
    }

    fn resolve_index(&self, index: i64) -> Result<TaskId, AppError> {
        self.active
            .resolve(index)
            .filter(|id| self.store.get(*id).is_some())
            .ok_or_else(|| LogicError::InvalidIndex(index).into())
    }

    fn task(&self, id: TaskId) -> Result<&Task, AppError> {
        self.store
            .get(id)
            .ok_or_else(|| AppError::invalid_data(format!("task id {id} vanished")))
    }

    fn attach(&mut self, id: TaskId, task: Task) {
        if task.is_pending() {
            self.tags.add_all(&task.tags);
        }
        self.store.restore(id, task);
    }

    fn detach(&mut self, id: TaskId) -> Option<StoredTask> {
        let task = self.store.remove(id)?;
        if task.is_pending() {
            self.tags.remove_all(&task.tags);
        }
        Some(StoredTask { id, task })
    }

    fn replace(&mut self, id: TaskId, task: Task) -> Vec<StoredTask> {
        let displaced = self.detach(id).into_iter().collect();
        self.attach(id, task);
        displaced
    }

    fn category_lists(&self, now: OffsetDateTime) -> BTreeMap<Category, Vec<StoredTask>> {
        Category::ALL
            .into_iter()
            .map(|category| (category, self.store.category(category, now)))
            .collect()
    }

    /// Saves every list that differs from what was last written, or all of
    /// them when forced. Memory is not rolled back when a save fails; the list
    /// stays dirty and is retried by the next save.
    fn persist(&mut self, now: OffsetDateTime, force: bool) -> Result<(), AppError> {
        let mut first_error = None;

        for (category, items) in self.category_lists(now) {
            if !force && self.saved.get(&category) == Some(&items) {
                continue;
            }
            match self.gateway.save_list(category, &items) {
                Ok(()) => {
                    self.saved.insert(category, items);
                }
                Err(err) => {
                    warn!(category = %category, error = %err, "failed to save list");
                    first_error.get_or_insert(AppError::storage(format!(
                        "{category}: {}",
                        err.message()
                    )));
                }
            }
        }

        match first_error {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

struct Delta {
    introduced: Vec<TaskId>,
    displaced: Vec<StoredTask>,
}

fn expired_ids(store: &TaskStore, now: OffsetDateTime) -> BTreeSet<TaskId> {
    store
        .pending()
        .filter(|(_, task)| task.is_expired(now))
        .map(|(id, _)| id)
        .collect()
}
