//! Cadence — advisory countdown until the next expected notification.
//!
//! The value is display information only. Delivery is driven entirely by
//! the peripheral's own send cadence.

use crate::mode::Mode;
use crate::time::Timestamp;

/// Seconds until the next notification is expected.
///
/// Returns 0 when nothing has been received yet or when the nominal
/// interval has already elapsed. Partial seconds round up, so a reading
/// that just arrived in realtime mode yields 1. A `last_seen_at` in the
/// future counts as zero elapsed time.
#[must_use]
pub fn next_update_in(last_seen_at: Option<Timestamp>, mode: Mode, now: Timestamp) -> u64 {
    let Some(last_seen_at) = last_seen_at else {
        return 0;
    };

    let elapsed_ms = (now - last_seen_at).num_milliseconds().max(0);
    let interval_ms = i64::try_from(mode.interval().as_millis()).unwrap_or(i64::MAX);
    let remaining_ms = interval_ms.saturating_sub(elapsed_ms);
    if remaining_ms <= 0 {
        return 0;
    }

    u64::try_from(remaining_ms).map_or(0, |ms| ms.div_ceil(1000))
}
