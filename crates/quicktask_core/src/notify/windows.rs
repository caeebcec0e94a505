use crate::error::AppError;
use crate::model::Task;
use crate::notify::{ExpiryNotice, Notifier};
use tauri_winrt_notification::Toast;

pub struct WindowsNotifier;

impl Notifier for WindowsNotifier {
    fn notify(&self, task: &Task) -> Result<(), AppError> {
        let notice = ExpiryNotice::for_task(task);
        Toast::new(Toast::POWERSHELL_APP_ID)
            .title(&notice.title)
            .text1(&notice.body)
            .show()
            .map_err(|err| AppError::io(format!("toast notification failed: {err}")))
    }
}
