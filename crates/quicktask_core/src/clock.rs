use std::sync::{Arc, Mutex, PoisonError};
use time::{Duration, OffsetDateTime, UtcOffset};

pub trait Clock: Send + Sync {
    fn now(&self) -> OffsetDateTime;
}

/// Wall clock pinned to one UTC offset.
///
/// The local offset is looked up once; `time` refuses to read it once other
/// threads exist, so this must be built before the refresher starts.
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    offset: UtcOffset,
}

impl SystemClock {
    pub fn local() -> Self {
        Self {
            offset: UtcOffset::current_local_offset().unwrap_or(UtcOffset::UTC),
        }
    }

    pub fn with_offset(offset: UtcOffset) -> Self {
        Self { offset }
    }
}

impl Clock for SystemClock {
    fn now(&self) -> OffsetDateTime {
        OffsetDateTime::now_utc().to_offset(self.offset)
    }
}

/// A clock that only moves when told to. Clones share the same instant.
#[derive(Debug, Clone)]
pub struct FixedClock {
    instant: Arc<Mutex<OffsetDateTime>>,
}

impl FixedClock {
    pub fn new(instant: OffsetDateTime) -> Self {
        Self {
            instant: Arc::new(Mutex::new(instant)),
        }
    }

    pub fn set(&self, instant: OffsetDateTime) {
        *self.instant.lock().unwrap_or_else(PoisonError::into_inner) = instant;
    }

    pub fn advance(&self, by: Duration) {
        let mut guard = self.instant.lock().unwrap_or_else(PoisonError::into_inner);
        *guard += by;
    }
}

impl Clock for FixedClock {
    fn now(&self) -> OffsetDateTime {
        *self.instant.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::{Clock, FixedClock, SystemClock};
    use time::Duration;
    use time::macros::{datetime, offset};

    #[test]
    fn fixed_clock_clones_share_time() {
        let clock = FixedClock::new(datetime!(2026-10-14 10:00 UTC));
        let handle = clock.clone();
        handle.advance(Duration::hours(3));
        assert_eq!(clock.now(), datetime!(2026-10-14 13:00 UTC));

        handle.set(datetime!(2027-01-01 00:00 UTC));
        assert_eq!(clock.now(), datetime!(2027-01-01 00:00 UTC));
    }

    #[test]
    fn system_clock_reports_its_offset() {
        let clock = SystemClock::with_offset(offset!(+02:00));
        assert_eq!(clock.now().offset(), offset!(+02:00));
    }
}
