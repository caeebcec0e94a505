use crate::error::ParseErrorKind;
use crate::model::{Priority, Schedule, Task};
use std::collections::BTreeSet;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewType {
    All,
    General,
    Deadlines,
    Events,
    Archive,
    Expired,
    Week,
    Today,
    Tomorrow,
    Help,
    Priority(Priority),
    Tags(BTreeSet<String>),
}

impl ViewType {
    pub fn title(&self) -> String {
        match self {
            Self::All => "pending".to_string(),
            Self::General => "general".to_string(),
            Self::Deadlines => "deadlines".to_string(),
            Self::Events => "events".to_string(),
            Self::Archive => "archive".to_string(),
            Self::Expired => "expired".to_string(),
            Self::Week => "this week".to_string(),
            Self::Today => "today".to_string(),
            Self::Tomorrow => "tomorrow".to_string(),
            Self::Help => "help".to_string(),
            Self::Priority(priority) => format!("{} priority", priority.label()),
            Self::Tags(tags) => tags
                .iter()
                .map(|tag| format!("#{tag}"))
                .collect::<Vec<_>>()
                .join(" "),
        }
    }
}

/// How `set` and friends pick the task they act on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    Index(i64),
    Name(String),
}

/// Fields replaced by an update; `None` leaves the field untouched.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct TaskChange {
    pub name: Option<String>,
    pub schedule: Option<Schedule>,
    pub priority: Option<Priority>,
}

impl TaskChange {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.schedule.is_none() && self.priority.is_none()
    }

    pub fn apply_to(&self, task: &mut Task) {
        if let Some(name) = &self.name {
            task.name = name.clone();
        }
        if let Some(schedule) = self.schedule {
            task.schedule = schedule;
        }
        if let Some(priority) = self.priority {
            task.priority = priority;
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operation {
    View(ViewType),
    Add(Task),
    DeleteByIndex(i64),
    DeleteByName(String),
    DeleteByTag(String),
    Update { target: Target, change: TaskChange },
    DoneByIndex(i64),
    DoneByName(String),
    Search(String),
    Undo,
    Save,
    Clear,
    Error(ParseErrorKind),
}

impl Operation {
    pub fn name(&self) -> &'static str {
        match self {
            Self::View(_) => "view",
            Self::Add(_) => "add",
            Self::DeleteByIndex(_) | Self::DeleteByName(_) | Self::DeleteByTag(_) => "delete",
            Self::Update { .. } => "update",
            Self::DoneByIndex(_) | Self::DoneByName(_) => "done",
            Self::Search(_) => "search",
            Self::Undo => "undo",
            Self::Save => "save",
            Self::Clear => "clear",
            Self::Error(_) => "error",
        }
    }
}
