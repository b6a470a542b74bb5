//! # Durations
//!
//! Two textual duration forms appear in packages:
//! - ISO 8601 durations (`PT1H30M`, `P1DT2H`) in SCORM 2004, LOM and cmi5
//! - CMI timespans (`0000:30:00.00`) in SCORM 1.2 `maxtimeallowed` and AICC
//!
//! Calendar units are approximated: a year is 365 days and a month 30 days.

use crate::PackageError;
use serde::Serializer;
use std::time::Duration;

const SECONDS_PER_MINUTE: u64 = 60;
const SECONDS_PER_HOUR: u64 = 3_600;
const SECONDS_PER_DAY: u64 = 86_400;

/// Parse an ISO 8601 duration (`PnYnMnWnDTnHnMnS`).
///
/// Only the seconds component may carry a fraction.
pub fn parse_iso8601(value: &str) -> Result<Duration, PackageError> {
    let invalid = || PackageError::InvalidDuration(value.to_string());
    let trimmed = value.trim();

    let body = trimmed
        .strip_prefix('P')
        .or_else(|| trimmed.strip_prefix('p'))
        .ok_or_else(invalid)?;

    let (date_part, time_part) = match body.find(['T', 't']) {
        Some(index) => {
            let time = &body[index + 1..];
            if time.is_empty() {
                return Err(invalid());
            }
            (&body[..index], Some(time))
        }
        None => (body, None),
    };
    if date_part.is_empty() && time_part.is_none() {
        return Err(invalid());
    }

    let mut seconds: u64 = 0;
    let mut nanos: u32 = 0;

    let date_units: [(char, u64); 4] = [
        ('Y', 365 * SECONDS_PER_DAY),
        ('M', 30 * SECONDS_PER_DAY),
        ('W', 7 * SECONDS_PER_DAY),
        ('D', SECONDS_PER_DAY),
    ];
    for (amount, factor) in components(date_part, &date_units).ok_or_else(invalid)? {
        let whole = amount.whole().ok_or_else(invalid)?;
        seconds = whole
            .checked_mul(factor)
            .and_then(|s| seconds.checked_add(s))
            .ok_or_else(invalid)?;
    }

    if let Some(time_part) = time_part {
        let time_units: [(char, u64); 3] = [
            ('H', SECONDS_PER_HOUR),
            ('M', SECONDS_PER_MINUTE),
            ('S', 1),
        ];
        for (amount, factor) in components(time_part, &time_units).ok_or_else(invalid)? {
            if factor == 1 {
                seconds = seconds.checked_add(amount.integer).ok_or_else(invalid)?;
                nanos = amount.nanos;
            } else {
                let whole = amount.whole().ok_or_else(invalid)?;
                seconds = whole
                    .checked_mul(factor)
                    .and_then(|s| seconds.checked_add(s))
                    .ok_or_else(invalid)?;
            }
        }
    }

    Ok(Duration::new(seconds, nanos))
}

/// A parsed numeric component: integer part plus optional fraction in nanoseconds.
#[derive(Debug, Clone, Copy)]
struct Amount {
    integer: u64,
    nanos: u32,
}

impl Amount {
    fn whole(self) -> Option<u64> {
        (self.nanos == 0).then_some(self.integer)
    }
}

/// Split `part` into `(amount, factor)` pairs. Designators must appear in the
/// order given by `units`, at most once each.
fn components(part: &str, units: &[(char, u64)]) -> Option<Vec<(Amount, u64)>> {
    let mut out = Vec::new();
    let mut next_unit = 0;
    let mut number = String::new();

    for ch in part.chars() {
        if ch.is_ascii_digit() || ch == '.' || ch == ',' {
            number.push(if ch == ',' { '.' } else { ch });
            continue;
        }
        let designator = ch.to_ascii_uppercase();
        let position = units[next_unit..]
            .iter()
            .position(|(unit, _)| *unit == designator)?;
        let (_, factor) = units[next_unit + position];
        next_unit += position + 1;

        out.push((parse_amount(&number)?, factor));
        number.clear();
    }

    // Trailing digits without a designator.
    if !number.is_empty() {
        return None;
    }
    Some(out)
}

fn parse_amount(number: &str) -> Option<Amount> {
    if number.is_empty() {
        return None;
    }
    let (integer, fraction) = match number.split_once('.') {
        Some((i, f)) => (i, f),
        None => (number, ""),
    };
    if integer.is_empty() && fraction.is_empty() {
        return None;
    }
    let integer = if integer.is_empty() {
        0
    } else {
        integer.parse::<u64>().ok()?
    };
    Some(Amount {
        integer,
        nanos: fraction_to_nanos(fraction)?,
    })
}

fn fraction_to_nanos(fraction: &str) -> Option<u32> {
    if fraction.is_empty() {
        return Some(0);
    }
    if !fraction.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    let digits: String = fraction.chars().chain(std::iter::repeat('0')).take(9).collect();
    digits.parse::<u32>().ok()
}

/// Parse a CMI timespan (`HHHH:MM:SS[.SS]`).
pub fn parse_timespan(value: &str) -> Result<Duration, PackageError> {
    let invalid = || PackageError::InvalidDuration(value.to_string());
    let parts: Vec<&str> = value.trim().split(':').collect();
    let [hours, minutes, seconds] = parts.as_slice() else {
        return Err(invalid());
    };

    let hours: u64 = hours.trim().parse().map_err(|_| invalid())?;
    let minutes: u64 = minutes.trim().parse().map_err(|_| invalid())?;
    let seconds = parse_amount(seconds.trim()).ok_or_else(invalid)?;
    if minutes >= 60 || seconds.integer >= 60 {
        return Err(invalid());
    }

    let total = hours
        .checked_mul(SECONDS_PER_HOUR)
        .and_then(|s| s.checked_add(minutes * SECONDS_PER_MINUTE))
        .and_then(|s| s.checked_add(seconds.integer))
        .ok_or_else(invalid)?;
    Ok(Duration::new(total, seconds.nanos))
}

/// Render a duration as an ISO 8601 time duration (`PT1H30M`, `PT0S`).
#[must_use]
pub fn format_iso8601(duration: Duration) -> String {
    let total = duration.as_secs();
    let hours = total / SECONDS_PER_HOUR;
    let minutes = (total % SECONDS_PER_HOUR) / SECONDS_PER_MINUTE;
    let seconds = total % SECONDS_PER_MINUTE;
    let nanos = duration.subsec_nanos();

    let mut out = String::from("PT");
    if hours > 0 {
        out.push_str(&format!("{}H", hours));
    }
    if minutes > 0 {
        out.push_str(&format!("{}M", minutes));
    }
    if nanos > 0 {
        let fraction = format!("{:09}", nanos);
        out.push_str(&format!("{}.{}S", seconds, fraction.trim_end_matches('0')));
    } else if seconds > 0 || (hours == 0 && minutes == 0) {
        out.push_str(&format!("{}S", seconds));
    }
    out
}

/// Serde helper: serialize an optional duration as an ISO 8601 string.
pub(crate) fn serialize_opt<S: Serializer>(
    duration: &Option<Duration>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    match duration {
        Some(d) => serializer.serialize_some(&format_iso8601(*d)),
        None => serializer.serialize_none(),
    }
}

// =============================================================================
// TESTS
// =============================================================================
