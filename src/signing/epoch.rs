//! Epoch-second clock.

use std::time::{SystemTime, UNIX_EPOCH};

use thiserror::Error;

/// The system clock reads earlier than the Unix epoch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("system clock is set before 1970-01-01T00:00:00Z")]
pub struct ClockError;

/// Current UTC time in whole seconds since 1970-01-01T00:00:00Z.
pub fn epoch_now() -> Result<i64, ClockError> {
    epoch_at(SystemTime::now())
}

fn epoch_at(time: SystemTime) -> Result<i64, ClockError> {
    time.duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .map_err(|_| ClockError)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_epoch_is_after_2020() {
        // 2020-01-01T00:00:00Z
        assert!(epoch_now().unwrap() > 1_577_836_800);
    }

    #[test]
    fn test_clock_before_epoch_is_an_error() {
        let before = UNIX_EPOCH - Duration::from_secs(1);
        assert_eq!(epoch_at(before), Err(ClockError));
        assert_eq!(epoch_at(UNIX_EPOCH), Ok(0));
    }
}
