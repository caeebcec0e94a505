use crate::error::AppError;
use crate::model::Task;
use crate::notify::{ExpiryNotice, Notifier};
use notify_rust::Notification;

pub struct LinuxNotifier;

impl Notifier for LinuxNotifier {
    fn notify(&self, task: &Task) -> Result<(), AppError> {
        let notice = ExpiryNotice::for_task(task);
        Notification::new()
            .appname("quicktask")
            .summary(&notice.title)
            .body(&notice.body)
            .show()
            .map(|_| ())
            .map_err(|err| AppError::io(format!("desktop notification failed: {err}")))
    }
}
