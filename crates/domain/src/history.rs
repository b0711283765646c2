//! Reading history — bounded rolling window of the most recent readings.

use std::collections::VecDeque;

use serde::Serialize;

use crate::reading::{MoistureState, Reading};

/// Number of readings retained when no capacity is configured.
pub const DEFAULT_HISTORY_CAPACITY: usize = 120;

/// Fixed-capacity, arrival-ordered buffer of readings.
///
/// Appends go to the tail; once full, the oldest reading is evicted from
/// the head. Readings are never reordered.
#[derive(Debug, Clone)]
pub struct ReadingHistory {
    capacity: usize,
    readings: VecDeque<Reading>,
}

impl Default for ReadingHistory {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_CAPACITY)
    }
}

impl ReadingHistory {
    /// Create an empty history holding at most `capacity` readings.
    ///
    /// A zero capacity is raised to one so that [`latest`](Self::latest)
    /// always reflects the last append.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            readings: VecDeque::with_capacity(capacity),
        }
    }

    /// Append a reading, evicting the oldest ones beyond capacity.
    pub fn append(&mut self, reading: Reading) {
        self.readings.push_back(reading);
        while self.readings.len() > self.capacity {
            self.readings.pop_front();
        }
    }

    /// The most recently appended reading.
    #[must_use]
    pub fn latest(&self) -> Option<&Reading> {
        self.readings.back()
    }

    /// Owned, point-in-time copy of the readings in arrival order.
    ///
    /// Later appends and evictions do not affect the returned vector.
    #[must_use]
    pub fn snapshot(&self) -> Vec<Reading> {
        self.readings.iter().cloned().collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.readings.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.readings.is_empty()
    }

    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Drop every reading, keeping the capacity.
    pub fn clear(&mut self) {
        self.readings.clear();
    }

    /// Aggregate figures over the retained readings.
    #[must_use]
    pub fn stats(&self) -> HistoryStats {
        let mut stats = HistoryStats {
            count: self.readings.len(),
            ..HistoryStats::default()
        };

        let mut sum = 0.0;
        let mut with_temperature = 0_u32;
        for reading in &self.readings {
            if reading.moisture() == MoistureState::Wet {
                stats.wet_count += 1;
            }
            let Some(t) = reading.temperature_celsius() else {
                continue;
            };
            stats.min_celsius = Some(stats.min_celsius.map_or(t, |min| min.min(t)));
            stats.max_celsius = Some(stats.max_celsius.map_or(t, |max| max.max(t)));
            sum += t;
            with_temperature += 1;
        }
        if with_temperature > 0 {
            stats.mean_celsius = Some(sum / f64::from(with_temperature));
        }

        stats
    }
}

/// Summary of a [`ReadingHistory`], for status displays.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct HistoryStats {
    pub count: usize,
    pub wet_count: usize,
    pub min_celsius: Option<f64>,
    pub max_celsius: Option<f64>,
    pub mean_celsius: Option<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeDelta;

    use crate::time::{Timestamp, now};

    fn reading(base: Timestamp, offset_secs: i64, temp: Option<f64>) -> Reading {
        Reading::new(
            base + TimeDelta::seconds(offset_secs),
            MoistureState::Dry,
            temp,
        )
    }

    #[test]
    fn should_start_empty() {
        let history = ReadingHistory::default();
        assert!(history.is_empty());
        assert!(history.latest().is_none());
        assert_eq!(history.capacity(), DEFAULT_HISTORY_CAPACITY);
    }

    #[test]
    fn should_return_latest_appended_reading() {
        let base = now();
        let mut history = ReadingHistory::new(3);
        history.append(reading(base, 0, Some(1.0)));
        history.append(reading(base, 1, Some(2.0)));
        assert_eq!(history.latest().unwrap().temperature_celsius(), Some(2.0));
    }

    #[test]
    fn should_keep_last_n_readings_in_arrival_order() {
        let base = now();
        let capacity = 5;
        let mut history = ReadingHistory::new(capacity);
        let appended: Vec<_> = (0..12)
            .map(|i| reading(base, i, Some(f64::from(u8::try_from(i).unwrap()))))
            .collect();
        for r in &appended {
            history.append(r.clone());
        }

        let snapshot = history.snapshot();
        assert_eq!(snapshot.len(), capacity);
        assert_eq!(snapshot, &appended[appended.len() - capacity..]);
    }

    #[test]
    fn should_preserve_arrival_order_over_timestamp_order() {
        let base = now();
        let mut history = ReadingHistory::new(4);
        history.append(reading(base, 10, Some(1.0)));
        history.append(reading(base, 5, Some(2.0)));
        let temps: Vec<_> = history
            .snapshot()
            .iter()
            .map(Reading::temperature_celsius)
            .collect();
        assert_eq!(temps, [Some(1.0), Some(2.0)]);
    }

    #[test]
    fn should_not_alter_snapshot_after_eviction() {
        let base = now();
        let mut history = ReadingHistory::new(2);
        history.append(reading(base, 0, Some(1.0)));
        history.append(reading(base, 1, Some(2.0)));
        let snapshot = history.snapshot();

        history.append(reading(base, 2, Some(3.0)));
        history.append(reading(base, 3, Some(4.0)));

        assert_eq!(snapshot[0].temperature_celsius(), Some(1.0));
        assert_eq!(snapshot[1].temperature_celsius(), Some(2.0));
    }

    #[test]
    fn should_raise_zero_capacity_to_one() {
        let base = now();
        let mut history = ReadingHistory::new(0);
        history.append(reading(base, 0, None));
        history.append(reading(base, 1, Some(7.0)));
        assert_eq!(history.len(), 1);
        assert_eq!(history.latest().unwrap().temperature_celsius(), Some(7.0));
    }

    #[test]
    fn should_clear_readings() {
        let mut history = ReadingHistory::new(2);
        history.append(reading(now(), 0, None));
        history.clear();
        assert!(history.is_empty());
        assert_eq!(history.capacity(), 2);
    }

    #[test]
    fn should_summarize_temperatures_skipping_absent_values() {
        let base = now();
        let mut history = ReadingHistory::new(10);
        history.append(reading(base, 0, Some(18.0)));
        history.append(reading(base, 1, None));
        history.append(reading(base, 2, Some(24.0)));
        history.append(Reading::new(base, MoistureState::Wet, Some(21.0)));

        let stats = history.stats();
        assert_eq!(stats.count, 4);
        assert_eq!(stats.wet_count, 1);
        assert_eq!(stats.min_celsius, Some(18.0));
        assert_eq!(stats.max_celsius, Some(24.0));
        assert!((stats.mean_celsius.unwrap() - 21.0).abs() < 1e-9);
    }

    #[test]
    fn should_report_no_temperature_stats_when_all_absent() {
        let mut history = ReadingHistory::new(2);
        history.append(reading(now(), 0, None));
        let stats = history.stats();
        assert_eq!(stats.count, 1);
        assert_eq!(stats.mean_celsius, None);
    }
}
