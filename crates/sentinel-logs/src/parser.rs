//! Line parsing.
//!
//! Wire layout: `YYYY-MM-DD HH:MM:SS LEVEL free text message`. The first three
//! whitespace separators delimit date, time and level; everything after the
//! third separator is the message, kept verbatim.

use chrono::{NaiveDateTime, Timelike};

use crate::error::ParseError;
use crate::types::{LogRecord, WIRE_TIMESTAMP_FORMAT};

const FIELD_COUNT: usize = 4;

/// Byte offsets of the separators in `YYYY-MM-DD HH:MM:SS`.
const TIMESTAMP_LAYOUT: &[u8; 19] = b"0000-00-00 00:00:00";

/// Parses a single line (without its terminator) into a [`LogRecord`].
///
/// Pure and stateless; safe to call from any number of tasks at once.
///
/// # Errors
///
/// Returns [`ParseError::MalformedFields`] when fewer than four fields are
/// present and [`ParseError::InvalidTimestamp`] when the date and time do
/// not match the fixed layout or name an impossible instant.
pub fn parse(line: &str) -> Result<LogRecord, ParseError> {
    let fields: Vec<&str> = line.splitn(FIELD_COUNT, char::is_whitespace).collect();
    let [date, time, level, message] = fields[..] else {
        return Err(ParseError::MalformedFields {
            found: fields.len(),
        });
    };

    let timestamp = parse_timestamp(date, time)?;

    Ok(LogRecord {
        timestamp,
        level: level.to_string(),
        message: message.to_string(),
    })
}

fn parse_timestamp(date: &str, time: &str) -> Result<NaiveDateTime, ParseError> {
    let raw = format!("{date} {time}");
    let invalid = || ParseError::InvalidTimestamp(raw.clone());

    // chrono tolerates missing leading zeros; the wire format does not.
    if !matches_layout(raw.as_bytes()) {
        return Err(invalid());
    }

    let timestamp = NaiveDateTime::parse_from_str(&raw, WIRE_TIMESTAMP_FORMAT)
        .map_err(|_| invalid())?;

    // Leap seconds come back as nanosecond overflow.
    if timestamp.nanosecond() >= 1_000_000_000 {
        return Err(invalid());
    }

    Ok(timestamp)
}

fn matches_layout(raw: &[u8]) -> bool {
    raw.len() == TIMESTAMP_LAYOUT.len()
        && raw
            .iter()
            .zip(TIMESTAMP_LAYOUT)
            .all(|(&byte, &expected)| match expected {
                b'0' => byte.is_ascii_digit(),
                sep => byte == sep,
            })
}
