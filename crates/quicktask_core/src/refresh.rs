use crate::error::AppError;
use crate::logic::Logic;
use crate::model::{StoredTask, TaskId};
use crate::notify::Notifier;
use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::{debug, warn};

pub type SharedLogic = Arc<Mutex<Logic>>;

pub fn shared(logic: Logic) -> SharedLogic {
    Arc::new(Mutex::new(logic))
}

/// Locks the shared state, taking the guard back from a poisoned lock.
pub fn lock(logic: &SharedLogic) -> MutexGuard<'_, Logic> {
    logic.lock().unwrap_or_else(PoisonError::into_inner)
}

#[derive(Debug, Default)]
pub struct NotificationOutcome {
    pub tasks: Vec<StoredTask>,
    pub failures: Vec<NotificationFailure>,
}

#[derive(Debug)]
pub struct NotificationFailure {
    pub task_id: TaskId,
    pub error: AppError,
}

/// One refresh pass: re-evaluates the clock-driven lists and notifies about
/// tasks that have just expired.
pub fn refresh_and_notify(logic: &SharedLogic, notifier: &dyn Notifier) -> NotificationOutcome {
    let expired = lock(logic).refresh();
    let mut outcome = NotificationOutcome::default();

    for stored in expired {
        match notifier.notify(&stored.task) {
            Ok(()) => outcome.tasks.push(stored),
            Err(error) => {
                warn!(task = %stored.task.name, error = %error, "notification failed");
                outcome.failures.push(NotificationFailure {
                    task_id: stored.id,
                    error,
                });
            }
        }
    }

    outcome
}

/// Runs [`refresh_and_notify`] on a background thread every `interval` until
/// stopped or dropped.
pub struct Refresher {
    stop: Option<Sender<()>>,
    handle: Option<JoinHandle<()>>,
}

impl Refresher {
    pub fn spawn(logic: SharedLogic, interval: Duration, notifier: Box<dyn Notifier>) -> Self {
        let (stop, stopped) = mpsc::channel::<()>();
        let handle = thread::spawn(move || {
            loop {
                match stopped.recv_timeout(interval) {
                    Err(RecvTimeoutError::Timeout) => {}
                    Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                }
                let outcome = refresh_and_notify(&logic, notifier.as_ref());
                debug!(
                    notified = outcome.tasks.len(),
                    failed = outcome.failures.len(),
                    "refresh tick"
                );
            }
        });

        Self {
            stop: Some(stop),
            handle: Some(handle),
        }
    }

    pub fn stop(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        if let Some(stop) = self.stop.take() {
            let _ = stop.send(());
        }
        if let Some(handle) = self.handle.take()
            && handle.join().is_err()
        {
            warn!("refresher thread panicked");
        }
    }
}

impl Drop for Refresher {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::{Refresher, lock, refresh_and_notify, shared};
    use crate::clock::FixedClock;
    use crate::error::AppError;
    use crate::logic::Logic;
    use crate::model::Task;
    use crate::notify::Notifier;
    use crate::storage::MemoryGateway;
    use std::sync::{Arc, Mutex};
    use std::time::{Duration, Instant};
    use time::macros::datetime;

    #[derive(Default, Clone)]
    struct RecordingNotifier {
        seen: Arc<Mutex<Vec<String>>>,
        fail: bool,
    }

    impl Notifier for RecordingNotifier {
        fn notify(&self, task: &Task) -> Result<(), AppError> {
            if self.fail {
                return Err(AppError::io("no notification daemon"));
            }
            self.seen.lock().unwrap().push(task.name.clone());
            Ok(())
        }
    }

    fn logic_with(clock: &FixedClock, lines: &[&str]) -> Logic {
        let mut logic = Logic::new(Box::new(MemoryGateway::new()), Box::new(clock.clone()));
        for line in lines {
            logic.execute(line).unwrap();
        }
        logic
    }

    #[test]
    fn notifies_each_expiry_once() {
        let clock = FixedClock::new(datetime!(2026-10-14 10:00 UTC));
        let logic = shared(logic_with(&clock, &["add report on 14 oct 2026", "add idle"]));
        let notifier = RecordingNotifier::default();

        assert!(refresh_and_notify(&logic, &notifier).tasks.is_empty());

        clock.set(datetime!(2026-10-15 00:00 UTC));
        let outcome = refresh_and_notify(&logic, &notifier);
        assert_eq!(outcome.tasks.len(), 1);
        assert!(refresh_and_notify(&logic, &notifier).tasks.is_empty());
        assert_eq!(*notifier.seen.lock().unwrap(), vec!["report".to_string()]);
    }

    #[test]
    fn failed_notifications_are_reported() {
        let clock = FixedClock::new(datetime!(2026-10-14 10:00 UTC));
        let logic = shared(logic_with(&clock, &["add report on 14 oct 2026"]));
        let notifier = RecordingNotifier {
            fail: true,
            ..RecordingNotifier::default()
        };

        clock.set(datetime!(2026-10-16 00:00 UTC));
        let outcome = refresh_and_notify(&logic, &notifier);
        assert!(outcome.tasks.is_empty());
        assert_eq!(outcome.failures.len(), 1);
        assert_eq!(outcome.failures[0].error.code(), "io_error");
    }

    #[test]
    fn background_thread_ticks_until_stopped() {
        let clock = FixedClock::new(datetime!(2026-10-14 10:00 UTC));
        let logic = shared(logic_with(&clock, &["add report on 14 oct 2026"]));
        let notifier = RecordingNotifier::default();
        let seen = notifier.seen.clone();

        let refresher =
            Refresher::spawn(logic.clone(), Duration::from_millis(10), Box::new(notifier));
        clock.set(datetime!(2026-10-15 00:00 UTC));

        let deadline = Instant::now() + Duration::from_secs(5);
        while seen.lock().unwrap().is_empty() && Instant::now() < deadline {
            std::thread::sleep(Duration::from_millis(5));
        }
        refresher.stop();

        assert_eq!(*seen.lock().unwrap(), vec!["report".to_string()]);
        assert!(lock(&logic).execute("view expired").is_ok());
        assert_eq!(lock(&logic).active_view().ids.len(), 1);
    }
}
