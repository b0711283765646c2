//! Telemetry decoder for notification payloads.
//!
//! Pure functions operating on raw `&[u8]` slices — no BLE dependency needed.
//! The peripheral sends short ASCII strings in one of two formats, told
//! apart without configuration:
//!
//! | Format | Example | Selected when |
//! |--------|---------|---------------|
//! | Keyed | `MOISTURE:Wet;TEMP:24.3` | payload contains `MOISTURE` |
//! | Positional | `dry,19` | payload contains `,` |
//!
//! Formats are tried in table order; the first whose predicate accepts the
//! payload owns it, even if its parser then rejects it. New formats are
//! added by appending to [`WIRE_FORMATS`].

use crate::error::DecodeError;
use crate::reading::{MoistureState, Reading};
use crate::time::Timestamp;

/// A decoded payload that has not been stamped with an arrival time yet.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Telemetry {
    pub moisture: MoistureState,
    pub temperature_celsius: Option<f64>,
}

impl Telemetry {
    /// Stamp the telemetry with the time the notification arrived.
    #[must_use]
    pub fn observed_at(self, ts: Timestamp) -> Reading {
        Reading::new(ts, self.moisture, self.temperature_celsius)
    }
}

/// One supported wire format: a predicate selecting payloads and the parser
/// applied to them.
pub struct WireFormat {
    pub name: &'static str,
    pub matches: fn(&str) -> bool,
    pub parse: fn(&str) -> Result<Telemetry, DecodeError>,
}

/// Known formats, in the order they are tried.
pub const WIRE_FORMATS: &[WireFormat] = &[
    WireFormat {
        name: "keyed",
        matches: is_keyed,
        parse: parse_keyed,
    },
    WireFormat {
        name: "positional",
        matches: is_positional,
        parse: parse_positional,
    },
];

const MOISTURE_KEY: &str = "MOISTURE";
const TEMP_KEY: &str = "TEMP";

/// Decode a raw notification payload.
///
/// # Errors
///
/// Returns [`DecodeError::InvalidUtf8`] for non-UTF-8 bytes,
/// [`DecodeError::UnrecognizedFormat`] when no format accepts the payload,
/// or the selected format's parse error.
pub fn decode(raw: &[u8]) -> Result<Telemetry, DecodeError> {
    let payload = std::str::from_utf8(raw)
        .map_err(|_| DecodeError::InvalidUtf8)?
        .trim();

    WIRE_FORMATS
        .iter()
        .find(|format| (format.matches)(payload))
        .ok_or(DecodeError::UnrecognizedFormat)
        .and_then(|format| (format.parse)(payload))
}

fn is_keyed(payload: &str) -> bool {
    payload.contains(MOISTURE_KEY)
}

fn is_positional(payload: &str) -> bool {
    payload.contains(',')
}

/// Parse `MOISTURE:<token>;TEMP:<number>`. Keys are case-insensitive and
/// may appear in any order; `TEMP` is optional.
fn parse_keyed(payload: &str) -> Result<Telemetry, DecodeError> {
    let mut moisture = None;
    let mut temperature = None;

    for field in payload.split(';') {
        let Some((key, value)) = field.split_once(':') else {
            continue;
        };
        let key = key.trim();
        if key.eq_ignore_ascii_case(MOISTURE_KEY) {
            moisture = Some(MoistureState::from_token(value));
        } else if key.eq_ignore_ascii_case(TEMP_KEY) {
            temperature = parse_temperature(value);
        }
    }

    Ok(Telemetry {
        moisture: moisture.ok_or(DecodeError::MissingField(MOISTURE_KEY))?,
        temperature_celsius: temperature,
    })
}

/// Parse `<token>,<number>`.
#[allow(clippy::unnecessary_wraps)]
fn parse_positional(payload: &str) -> Result<Telemetry, DecodeError> {
    let mut fields = payload.split(',');
    let moisture = fields
        .next()
        .map_or(MoistureState::Unknown, MoistureState::from_token);
    let temperature_celsius = fields.next().and_then(parse_temperature);

    Ok(Telemetry {
        moisture,
        temperature_celsius,
    })
}

fn parse_temperature(raw: &str) -> Option<f64> {
    raw.trim().parse::<f64>().ok().filter(|t| t.is_finite())
}
