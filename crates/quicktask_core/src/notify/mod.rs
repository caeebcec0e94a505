use crate::error::AppError;
use crate::model::{Priority, Task};

#[cfg(target_os = "linux")]
mod linux;
#[cfg(target_os = "linux")]
pub use linux::LinuxNotifier;

#[cfg(windows)]
mod windows;
#[cfg(windows)]
pub use windows::WindowsNotifier;

const DISABLE_ENV_VAR: &str = "QUICKTASK_DISABLE_NOTIFICATIONS";

/// Told about each task the moment it expires.
pub trait Notifier: Send {
    fn notify(&self, task: &Task) -> Result<(), AppError>;
}

pub struct NoopNotifier;

impl Notifier for NoopNotifier {
    fn notify(&self, _task: &Task) -> Result<(), AppError> {
        Ok(())
    }
}

/// Text of a desktop notification for an expired task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpiryNotice {
    pub title: String,
    pub body: String,
}

impl ExpiryNotice {
    pub fn for_task(task: &Task) -> Self {
        let title = match task.priority {
            Priority::High => "quicktask: high priority task expired",
            _ => "quicktask: task expired",
        };
        let mut body = format!("'{}' has expired", task.name);
        if !task.tags.is_empty() {
            let tags: Vec<String> = task.tags.iter().map(|tag| format!("#{tag}")).collect();
            body.push_str(&format!(" ({})", tags.join(" ")));
        }
        Self {
            title: title.to_string(),
            body,
        }
    }
}

/// The desktop notifier, or a no-op one when notifications are switched off
/// by config or by `QUICKTASK_DISABLE_NOTIFICATIONS`, or the platform has none.
pub fn notifier_from_env(enabled: bool) -> Box<dyn Notifier> {
    if !enabled || std::env::var_os(DISABLE_ENV_VAR).is_some() {
        return Box::new(NoopNotifier);
    }
    platform_notifier().unwrap_or_else(|| Box::new(NoopNotifier))
}

pub fn platform_notifier() -> Option<Box<dyn Notifier>> {
    #[cfg(target_os = "linux")]
    return Some(Box::new(LinuxNotifier));

    #[cfg(windows)]
    return Some(Box::new(WindowsNotifier));

    #[cfg(not(any(target_os = "linux", windows)))]
    None
}

#[cfg(test)]
mod tests {
    use super::{ExpiryNotice, notifier_from_env};
    use crate::model::{Priority, Task};

    #[test]
    fn disabled_notifier_accepts_everything() {
        let notifier = notifier_from_env(false);
        assert!(notifier.notify(&Task::new("quiet")).is_ok());
    }

    #[test]
    fn notice_names_the_task_and_its_tags() {
        let notice = ExpiryNotice::for_task(&Task::new("pay rent").with_tags(["home", "bills"]));
        assert_eq!(notice.title, "quicktask: task expired");
        assert_eq!(notice.body, "'pay rent' has expired (#bills #home)");

        let urgent = ExpiryNotice::for_task(&Task::new("file taxes").with_priority(Priority::High));
        assert_eq!(urgent.title, "quicktask: high priority task expired");
        assert_eq!(urgent.body, "'file taxes' has expired");
    }
}
