use crate::date;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use time::{Date, OffsetDateTime};

/// Insertion-ordered handle assigned by the store. Larger ids are more recent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(pub u64);

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(
    Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    #[default]
    Low,
    Medium,
    High,
}

impl Priority {
    /// One `!` is medium, anything longer is high.
    pub fn from_bangs(count: usize) -> Self {
        match count {
            0 => Self::Low,
            1 => Self::Medium,
            _ => Self::High,
        }
    }

    pub fn from_keyword(word: &str) -> Option<Self> {
        match word {
            "low" => Some(Self::Low),
            "medium" => Some(Self::Medium),
            "high" => Some(Self::High),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskKind {
    Floating,
    Deadline,
    Event,
}

impl TaskKind {
    pub fn label(self) -> &'static str {
        match self {
            Self::Floating => "floating",
            Self::Deadline => "deadline",
            Self::Event => "event",
        }
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Schedule {
    #[default]
    Floating,
    Deadline {
        #[serde(with = "rfc3339")]
        due: OffsetDateTime,
    },
    Event {
        #[serde(with = "rfc3339")]
        start: OffsetDateTime,
        #[serde(with = "rfc3339")]
        end: OffsetDateTime,
    },
}

impl Schedule {
    pub fn kind(&self) -> TaskKind {
        match self {
            Self::Floating => TaskKind::Floating,
            Self::Deadline { .. } => TaskKind::Deadline,
            Self::Event { .. } => TaskKind::Event,
        }
    }

    /// Instant used for ordering views: the deadline or the event start.
    pub fn anchor(&self) -> Option<OffsetDateTime> {
        match *self {
            Self::Floating => None,
            Self::Deadline { due } => Some(due),
            Self::Event { start, .. } => Some(start),
        }
    }

    /// Instant after which the task counts as expired.
    pub fn relevant_end(&self) -> Option<OffsetDateTime> {
        match *self {
            Self::Floating => None,
            Self::Deadline { due } => Some(due),
            Self::Event { end, .. } => Some(end),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub name: String,
    #[serde(default)]
    pub schedule: Schedule,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default)]
    pub tags: BTreeSet<String>,
    #[serde(default)]
    pub completed: bool,
}

impl Task {
    pub fn new<N: Into<String>>(name: N) -> Self {
        Self {
            name: name.into(),
            schedule: Schedule::Floating,
            priority: Priority::Low,
            tags: BTreeSet::new(),
            completed: false,
        }
    }

    pub fn with_schedule(mut self, schedule: Schedule) -> Self {
        self.schedule = schedule;
        self
    }

    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags.extend(tags.into_iter().map(Into::into));
        self
    }

    pub fn kind(&self) -> TaskKind {
        self.schedule.kind()
    }

    pub fn is_pending(&self) -> bool {
        !self.completed
    }

    pub fn is_expired(&self, now: OffsetDateTime) -> bool {
        self.is_pending()
            && self
                .schedule
                .relevant_end()
                .is_some_and(|end| end < now)
    }

    /// Pending, not expired, and touching the ISO week that contains `now`.
    pub fn is_this_week(&self, now: OffsetDateTime) -> bool {
        if !self.is_pending() || self.is_expired(now) {
            return false;
        }

        match self.schedule {
            Schedule::Floating => false,
            Schedule::Deadline { due } => date::same_week(due, now),
            Schedule::Event { start, end } => {
                date::same_week(start, now) || date::same_week(end, now) || start <= now
            }
        }
    }

    /// Whether the task is due on, or spans, the given calendar day in `now`'s offset.
    pub fn falls_on(&self, day: Date, now: OffsetDateTime) -> bool {
        let offset = now.offset();
        match self.schedule {
            Schedule::Floating => false,
            Schedule::Deadline { due } => due.to_offset(offset).date() == day,
            Schedule::Event { start, end } => {
                start.to_offset(offset).date() <= day && day <= end.to_offset(offset).date()
            }
        }
    }
}

/// A task together with the id the store gave it; the unit of persistence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredTask {
    pub id: TaskId,
    pub task: Task,
}

mod rfc3339 {
    use serde::{Deserialize, Deserializer, Serializer};
    use time::OffsetDateTime;
    use time::format_description::well_known::Rfc3339;

    pub fn serialize<S: Serializer>(
        value: &OffsetDateTime,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        let text = value
            .format(&Rfc3339)
            .map_err(serde::ser::Error::custom)?;
        serializer.serialize_str(&text)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<OffsetDateTime, D::Error> {
        let text = String::deserialize(deserializer)?;
        OffsetDateTime::parse(&text, &Rfc3339).map_err(serde::de::Error::custom)
    }
}
