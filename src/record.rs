//! Typed field access on raw JSON records.
//!
//! Probe output is kept as loosely-typed JSON objects until an entity parses
//! the fields it needs. These helpers turn a missing or mis-shaped value into a
//! [`VvizError::MissingField`] / [`VvizError::InvalidField`] naming the record
//! and the field.

use serde_json::{Map, Value};

use crate::error::VvizError;
use crate::rational::Rational;

/// One raw key/value record from probe output.
pub type Record = Map<String, Value>;

pub(crate) fn required<'a>(
    record: &'a Record,
    field: &str,
    entity: &str,
) -> Result<&'a Value, VvizError> {
    match record.get(field) {
        Some(Value::Null) | None => Err(VvizError::MissingField {
            entity: entity.to_string(),
            field: field.to_string(),
        }),
        Some(value) => Ok(value),
    }
}

fn invalid(entity: &str, field: &str, reason: impl Into<String>) -> VvizError {
    VvizError::InvalidField {
        entity: entity.to_string(),
        field: field.to_string(),
        reason: reason.into(),
    }
}

pub(crate) fn required_i64(record: &Record, field: &str, entity: &str) -> Result<i64, VvizError> {
    let value = required(record, field, entity)?;
    value
        .as_i64()
        .ok_or_else(|| invalid(entity, field, format!("expected an integer, got {value}")))
}

/// An unsigned integer given either as a JSON number or as a numeric string
/// (ffprobe quotes `pkt_size`).
pub(crate) fn required_u64_lenient(
    record: &Record,
    field: &str,
    entity: &str,
) -> Result<u64, VvizError> {
    let value = required(record, field, entity)?;
    let parsed = match value {
        Value::Number(number) => number.as_u64(),
        Value::String(text) => text.trim().parse::<u64>().ok(),
        _ => None,
    };
    parsed.ok_or_else(|| {
        invalid(
            entity,
            field,
            format!("expected an unsigned integer, got {value}"),
        )
    })
}

pub(crate) fn required_u32(record: &Record, field: &str, entity: &str) -> Result<u32, VvizError> {
    let value = required_u64_lenient(record, field, entity)?;
    u32::try_from(value).map_err(|_| invalid(entity, field, format!("{value} does not fit in 32 bits")))
}

pub(crate) fn required_str<'a>(
    record: &'a Record,
    field: &str,
    entity: &str,
) -> Result<&'a str, VvizError> {
    let value = required(record, field, entity)?;
    value
        .as_str()
        .ok_or_else(|| invalid(entity, field, format!("expected a string, got {value}")))
}

/// A boolean flag given as `0`/`1` or `true`/`false`.
pub(crate) fn required_flag(record: &Record, field: &str, entity: &str) -> Result<bool, VvizError> {
    let value = required(record, field, entity)?;
    match value {
        Value::Bool(flag) => Ok(*flag),
        Value::Number(number) => match number.as_u64() {
            Some(0) => Ok(false),
            Some(1) => Ok(true),
            _ => Err(invalid(entity, field, format!("expected 0 or 1, got {number}"))),
        },
        other => Err(invalid(entity, field, format!("expected 0 or 1, got {other}"))),
    }
}

pub(crate) fn required_rational(
    record: &Record,
    field: &str,
    entity: &str,
) -> Result<Rational, VvizError> {
    let text = required_str(record, field, entity)?;
    text.parse::<Rational>()
        .map_err(|error| invalid(entity, field, error.to_string()))
}
