mod operation;
mod task;

pub use operation::{Operation, Target, TaskChange, ViewType};
pub use task::{Priority, Schedule, StoredTask, Task, TaskId, TaskKind};
