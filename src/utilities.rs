//! Internal utility functions.
//!
//! Helpers for timestamp conversion and the human-readable formatting used in
//! summary labels.

use chrono::{DateTime, TimeDelta, Utc};

use crate::error::VvizError;

/// Turn a microsecond offset from the Unix epoch into a UTC instant.
pub fn micros_to_datetime(micros: i128, entity: &str) -> Result<DateTime<Utc>, VvizError> {
    i64::try_from(micros)
        .ok()
        .and_then(DateTime::from_timestamp_micros)
        .ok_or_else(|| VvizError::TimestampOutOfRange {
            entity: entity.to_string(),
            micros,
        })
}

/// `start + delta`, or [`VvizError::TimestampOutOfRange`] past the
/// representable range.
pub fn add_delta(
    start: DateTime<Utc>,
    delta: TimeDelta,
    entity: &str,
) -> Result<DateTime<Utc>, VvizError> {
    start
        .checked_add_signed(delta)
        .ok_or_else(|| VvizError::TimestampOutOfRange {
            entity: entity.to_string(),
            micros: i128::from(start.timestamp_micros())
                + i128::from(delta.num_microseconds().unwrap_or(i64::MAX)),
        })
}

/// Turn a microsecond count into a [`TimeDelta`], saturating at the
/// representable range.
pub fn micros_to_delta(micros: i128) -> TimeDelta {
    let clamped = micros.clamp(i64::MIN as i128 / 1000, i64::MAX as i128 / 1000);
    TimeDelta::microseconds(clamped as i64)
}

/// A [`TimeDelta`] as fractional seconds.
pub fn delta_seconds(delta: TimeDelta) -> f64 {
    delta.num_seconds() as f64 + delta.subsec_nanos() as f64 / 1e9
}

/// Arithmetic mean; `None` for an empty input.
pub fn mean(values: impl IntoIterator<Item = f64>) -> Option<f64> {
    let (sum, count) = values
        .into_iter()
        .fold((0.0_f64, 0_usize), |(sum, count), value| (sum + value, count + 1));
    (count > 0).then(|| sum / count as f64)
}

/// Format a quantity with decimal (×1000) unit prefixes, e.g. `832.0Kb`.
pub fn format_bits(value: f64, suffix: &str) -> String {
    let mut scaled = value;
    for unit in ["", "K", "M", "G", "T"] {
        if scaled.abs() < 1000.0 {
            return format!("{scaled:3.1}{unit}{suffix}");
        }
        scaled /= 1000.0;
    }
    format!("{scaled:.1}P{suffix}")
}

/// Format an instant on the analysis timeline as `MM:SS.mmm`, or
/// `HH:MM:SS.mmm` when the overall span exceeds an hour.
pub fn format_clock(timestamp: DateTime<Utc>, total: TimeDelta) -> String {
    if total > TimeDelta::hours(1) {
        timestamp.format("%H:%M:%S%.3f").to_string()
    } else {
        timestamp.format("%M:%S%.3f").to_string()
    }
}

/// Format a length of time as `H:MM:SS.mmm`.
pub fn format_delta(delta: TimeDelta) -> String {
    let millis = delta.num_milliseconds();
    let sign = if millis < 0 { "-" } else { "" };
    let millis = millis.unsigned_abs();
    let hours = millis / 3_600_000;
    let minutes = (millis / 60_000) % 60;
    let seconds = (millis / 1000) % 60;
    let fraction = millis % 1000;
    format!("{sign}{hours}:{minutes:02}:{seconds:02}.{fraction:03}")
}

#[cfg(test)]
mod tests {
    use chrono::TimeDelta;

    use super::{format_bits, format_clock, format_delta, mean, micros_to_datetime};

    #[test]
    fn bits_use_decimal_prefixes() {
        assert_eq!(format_bits(35520.0, "b"), "35.5Kb");
        assert_eq!(format_bits(832000.0, "b"), "832.0Kb");
        assert_eq!(format_bits(12.0, "bps"), "12.0bps");
        assert_eq!(format_bits(4.2e12, "b"), "4.2Tb");
    }

    #[test]
    fn clock_switches_to_hours_for_long_spans() {
        let instant = micros_to_datetime(3_725_040_000, "test").unwrap();
        assert_eq!(format_clock(instant, TimeDelta::seconds(10)), "02:05.040");
        assert_eq!(format_clock(instant, TimeDelta::hours(2)), "01:02:05.040");
    }

    #[test]
    fn delta_formatting() {
        assert_eq!(format_delta(TimeDelta::milliseconds(420)), "0:00:00.420");
        assert_eq!(format_delta(TimeDelta::seconds(15)), "0:00:15.000");
    }

    #[test]
    fn mean_of_nothing_is_none() {
        assert_eq!(mean(Vec::new()), None);
        assert_eq!(mean([1.0, 2.0, 6.0]), Some(3.0));
    }
}
