//! Field parsers. Each returns the reason a value was rejected instead of
//! substituting a default.

use chrono::{NaiveDate, NaiveDateTime};

use crate::error::ValidationReason;

/// Parse a non-negative finite decimal. A lone comma is read as the
/// decimal separator (`"100,5"` -> 100.5).
pub fn parse_weight(raw: &str) -> Result<f64, ValidationReason> {
    let value = parse_decimal(raw)?;
    if value < 0.0 {
        return Err(ValidationReason::Negative(raw.to_string()));
    }
    // Turn -0.0 into 0.0.
    Ok(value + 0.0)
}

/// Parse a non-negative whole number of reps. `"5.0"` is accepted,
/// `"5.5"` is not.
pub fn parse_reps(raw: &str) -> Result<u32, ValidationReason> {
    if let Ok(reps) = raw.parse::<u32>() {
        return Ok(reps);
    }
    let value = parse_decimal(raw)?;
    if value < 0.0 {
        return Err(ValidationReason::Negative(raw.to_string()));
    }
    if value.fract() != 0.0 || value > f64::from(u32::MAX) {
        return Err(ValidationReason::NonNumeric(raw.to_string()));
    }
    Ok(value as u32)
}

/// Try `formats` in order; each is attempted as a date-time (keeping the
/// date) and as a plain date. The first format that parses wins.
pub fn parse_date<S: AsRef<str>>(raw: &str, formats: &[S]) -> Result<NaiveDate, ValidationReason> {
    formats
        .iter()
        .find_map(|format| {
            let format = format.as_ref();
            NaiveDateTime::parse_from_str(raw, format)
                .map(|dt| dt.date())
                .or_else(|_| NaiveDate::parse_from_str(raw, format))
                .ok()
        })
        .ok_or_else(|| ValidationReason::UnparseableDate(raw.to_string()))
}

/// Parse a workout length into minutes. Accepts plain minutes (`"65"`),
/// clock time (`"01:05:00"`, `"1:05"`) and unit notation (`"1h 5min"`).
pub fn parse_duration(raw: &str) -> Result<f64, ValidationReason> {
    if let Ok(minutes) = parse_decimal(raw) {
        if minutes < 0.0 {
            return Err(ValidationReason::Negative(raw.to_string()));
        }
        return Ok(minutes + 0.0);
    }
    let minutes = if raw.contains(':') {
        parse_clock(raw)
    } else {
        parse_unit_notation(raw)
    };
    minutes.ok_or_else(|| ValidationReason::UnparseableDuration(raw.to_string()))
}

/// `H:MM` or `H:MM:SS`.
fn parse_clock(raw: &str) -> Option<f64> {
    let parts: Vec<u32> = raw
        .split(':')
        .map(|part| part.trim().parse::<u32>().ok())
        .collect::<Option<_>>()?;
    match parts.as_slice() {
        [h, m] if *m < 60 => Some(f64::from(*h) * 60.0 + f64::from(*m)),
        [h, m, s] if *m < 60 && *s < 60 => {
            Some(f64::from(*h) * 60.0 + f64::from(*m) + f64::from(*s) / 60.0)
        }
        _ => None,
    }
}

/// Amount/unit pairs such as `1h 5min`, `90 min` or `1h5m30s`.
fn parse_unit_notation(raw: &str) -> Option<f64> {
    let mut rest = raw.trim();
    let mut total = 0.0;
    let mut seen = false;

    while !rest.is_empty() {
        let amount_end = rest
            .find(|c: char| !(c.is_ascii_digit() || c == '.'))
            .unwrap_or(rest.len());
        if amount_end == 0 {
            return None;
        }
        let amount: f64 = rest[..amount_end].parse().ok()?;
        rest = rest[amount_end..].trim_start();

        let unit_end = rest
            .find(|c: char| !c.is_ascii_alphabetic())
            .unwrap_or(rest.len());
        let minutes_per_unit = match rest[..unit_end].to_ascii_lowercase().as_str() {
            "h" | "hr" | "hrs" | "hour" | "hours" => 60.0,
            "m" | "min" | "mins" | "minute" | "minutes" => 1.0,
            "s" | "sec" | "secs" | "second" | "seconds" => 1.0 / 60.0,
            _ => return None,
        };
        total += amount * minutes_per_unit;
        seen = true;
        rest = rest[unit_end..].trim_start_matches(|c: char| c.is_whitespace() || c == ',');
    }

    seen.then_some(total)
}

fn parse_decimal(raw: &str) -> Result<f64, ValidationReason> {
    let normalized = if raw.contains(',') && !raw.contains('.') && raw.matches(',').count() == 1 {
        raw.replace(',', ".")
    } else {
        raw.to_string()
    };
    match normalized.parse::<f64>() {
        Ok(value) if value.is_finite() => Ok(value),
        _ => Err(ValidationReason::NonNumeric(raw.to_string())),
    }
}
