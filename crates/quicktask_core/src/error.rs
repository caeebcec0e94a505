use std::fmt;
use thiserror::Error;

/// Why a raw command line could not be turned into an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ParseErrorKind {
    #[error("no such command")]
    NoSuchCommand,
    #[error("no such view")]
    BadViewType,
    #[error("date is not in a recognised format")]
    BadDateFormat,
    #[error("nothing to act on")]
    EmptyTarget,
    #[error("tag name is empty")]
    EmptyTag,
    #[error("set expects a target followed by \"name\", [date] or !")]
    BadUpdateFormat,
    #[error("event starts after it ends")]
    InvalidEventRange,
}

impl ParseErrorKind {
    pub fn code(self) -> &'static str {
        match self {
            Self::NoSuchCommand => "no_such_command",
            Self::BadViewType => "bad_view_type",
            Self::BadDateFormat => "bad_date_format",
            Self::EmptyTarget => "empty_target",
            Self::EmptyTag => "empty_tag",
            Self::BadUpdateFormat => "bad_update_format",
            Self::InvalidEventRange => "invalid_event_range",
        }
    }
}

/// Rejections raised by the orchestrator before anything is mutated.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LogicError {
    #[error("index {0} is not in the current view")]
    InvalidIndex(i64),
    #[error("no pending task named '{0}'")]
    TaskNotFound(String),
    #[error("a pending task named '{0}' already exists")]
    DuplicateName(String),
    #[error("no pending task is tagged #{0}")]
    TagNotFound(String),
    #[error("task '{0}' is already done")]
    DoneInvalid(String),
    #[error("completed task '{0}' cannot be changed")]
    UpdateCompleted(String),
    #[error("nothing to undo")]
    NothingToUndo,
}

impl LogicError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidIndex(_) => "invalid_index",
            Self::TaskNotFound(_) => "task_not_found",
            Self::DuplicateName(_) => "duplicate_name",
            Self::TagNotFound(_) => "tag_not_found",
            Self::DoneInvalid(_) => "done_invalid",
            Self::UpdateCompleted(_) => "update_completed",
            Self::NothingToUndo => "nothing_to_undo",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppError {
    Parse(ParseErrorKind),
    Logic(LogicError),
    Storage(String),
    InvalidInput(String),
    InvalidData(String),
    Io(String),
}

impl AppError {
    pub fn invalid_input<M: Into<String>>(message: M) -> Self {
        Self::InvalidInput(message.into())
    }

    pub fn invalid_data<M: Into<String>>(message: M) -> Self {
        Self::InvalidData(message.into())
    }

    pub fn io<M: Into<String>>(message: M) -> Self {
        Self::Io(message.into())
    }

    pub fn storage<M: Into<String>>(message: M) -> Self {
        Self::Storage(message.into())
    }

    pub fn code(&self) -> &'static str {
        match self {
            Self::Parse(kind) => kind.code(),
            Self::Logic(err) => err.code(),
            Self::Storage(_) => "storage_error",
            Self::InvalidInput(_) => "invalid_input",
            Self::InvalidData(_) => "invalid_data",
            Self::Io(_) => "io_error",
        }
    }

    pub fn message(&self) -> String {
        match self {
            Self::Parse(kind) => kind.to_string(),
            Self::Logic(err) => err.to_string(),
            Self::Storage(message)
            | Self::InvalidInput(message)
            | Self::InvalidData(message)
            | Self::Io(message) => message.clone(),
        }
    }
}

impl From<ParseErrorKind> for AppError {
    fn from(kind: ParseErrorKind) -> Self {
        Self::Parse(kind)
    }
}

impl From<LogicError> for AppError {
    fn from(err: LogicError) -> Self {
        Self::Logic(err)
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} - {}", self.code(), self.message())
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Parse(kind) => Some(kind),
            Self::Logic(err) => Some(err),
            _ => None,
        }
    }
}
