//! Terminal presentation of session events and status.

use moistlink_domain::alert::DeliveryOutcome;
use moistlink_domain::connection::SessionStatus;
use moistlink_domain::event::SessionEvent;
use moistlink_domain::history::HistoryStats;
use moistlink_domain::reading::Reading;
use moistlink_domain::time::Timestamp;

use crate::config::{OutputFormat, TemperatureUnit};

const TIME_FORMAT: &str = "%H:%M:%S";

/// Renders events and status lines in the configured unit and format.
#[derive(Debug, Clone, Copy)]
pub struct Renderer {
    unit: TemperatureUnit,
    format: OutputFormat,
}

impl Renderer {
    #[must_use]
    pub fn new(unit: TemperatureUnit, format: OutputFormat) -> Self {
        Self { unit, format }
    }

    /// One line for a session event.
    #[must_use]
    pub fn event(&self, event: &SessionEvent) -> String {
        if self.format == OutputFormat::Json {
            return to_json(event);
        }
        match event {
            SessionEvent::StateChanged { from, to } => format!("state: {from} -> {to}"),
            SessionEvent::ModeChanged { mode } => format!("mode: {mode}"),
            SessionEvent::ReadingReceived { reading } => self.reading(reading),
            SessionEvent::AlertRaised { reading, delivery } => format!(
                "alert: wet at {} ({})",
                time(reading.observed_at()),
                delivery_label(*delivery)
            ),
            SessionEvent::DecodeFailed { payload, reason } => {
                format!("ignored payload {payload:?}: {reason}")
            }
        }
    }

    /// One line for a reading.
    #[must_use]
    pub fn reading(&self, reading: &Reading) -> String {
        if self.format == OutputFormat::Json {
            return to_json(reading);
        }
        let moisture = reading.moisture().to_string();
        format!(
            "{}  {moisture:<7}  {}",
            time(reading.observed_at()),
            self.temperature(reading.temperature_celsius())
        )
    }

    /// Status summary printed on demand.
    #[must_use]
    pub fn status(
        &self,
        status: &SessionStatus,
        stats: &HistoryStats,
        next_update_in: u64,
    ) -> String {
        if self.format == OutputFormat::Json {
            return to_json(&serde_json::json!({
                "status": status,
                "next_update_in_secs": next_update_in,
                "history": stats,
            }));
        }
        let last_seen = status.last_seen_at.map_or_else(|| "never".to_owned(), time);
        format!(
            "state: {}\nmode: {}\nlast reading: {last_seen}\nnext update in: {next_update_in}s\n\
             readings: {} ({} wet)\ntemperature: min {} / mean {} / max {}",
            status.state,
            status.mode,
            stats.count,
            stats.wet_count,
            self.temperature(stats.min_celsius),
            self.temperature(stats.mean_celsius),
            self.temperature(stats.max_celsius),
        )
    }

    fn temperature(&self, celsius: Option<f64>) -> String {
        match (celsius, self.unit) {
            (None, _) => "--".to_owned(),
            (Some(c), TemperatureUnit::Celsius) => format!("{c:.1} °C"),
            (Some(c), TemperatureUnit::Fahrenheit) => format!("{:.1} °F", to_fahrenheit(c)),
        }
    }
}

#[must_use]
pub fn to_fahrenheit(celsius: f64) -> f64 {
    celsius * 9.0 / 5.0 + 32.0
}

fn time(at: Timestamp) -> String {
    at.format(TIME_FORMAT).to_string()
}

fn delivery_label(delivery: DeliveryOutcome) -> &'static str {
    match delivery {
        DeliveryOutcome::Notified => "notified",
        DeliveryOutcome::Prompted => "prompted",
        DeliveryOutcome::Dropped => "not delivered",
    }
}

fn to_json<T: serde::Serialize + ?Sized>(value: &T) -> String {
    serde_json::to_string(value).unwrap_or_else(|err| format!(r#"{{"error":"{err}"}}"#))
}
