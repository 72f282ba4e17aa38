//! Durations and byte sizes

use super::expected;
use crate::error::{ComposeError, ComposeResult};
use regex::Regex;
use serde_yaml::Value;

const NANOSECOND: u64 = 1;
const MICROSECOND: u64 = 1_000 * NANOSECOND;
const MILLISECOND: u64 = 1_000 * MICROSECOND;
const SECOND: u64 = 1_000 * MILLISECOND;
const MINUTE: u64 = 60 * SECOND;
const HOUR: u64 = 60 * MINUTE;

/// Number, optional space, optional decimal unit prefix, optional `i` and `b`
const SIZE_PATTERN: &str = r"^(\d+(?:\.\d+)?) ?([kKmMgGtTpP])?[iI]?[bB]?$";

/// Parse a duration such as `1m30s`, `1.5h` or `-300ms` into nanoseconds.
///
/// Units are `ns`, `us` (or `µs`), `ms`, `s`, `m` and `h`. Every number needs
/// a unit except a bare `0`.
pub fn parse_duration(input: &str) -> Result<i64, String> {
    let invalid = || format!("invalid duration {:?}", input);

    let (negative, mut rest) = match input.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, input.strip_prefix('+').unwrap_or(input)),
    };

    if rest == "0" {
        return Ok(0);
    }
    if rest.is_empty() {
        return Err(invalid());
    }

    let mut total: u64 = 0;
    while !rest.is_empty() {
        let whole_len = rest.bytes().take_while(u8::is_ascii_digit).count();
        let whole = &rest[..whole_len];
        rest = &rest[whole_len..];

        let mut fraction = "";
        if let Some(after_dot) = rest.strip_prefix('.') {
            let fraction_len = after_dot.bytes().take_while(u8::is_ascii_digit).count();
            fraction = &after_dot[..fraction_len];
            rest = &after_dot[fraction_len..];
        }
        if whole.is_empty() && fraction.is_empty() {
            return Err(invalid());
        }

        let unit_len = rest
            .find(|c: char| c == '.' || c.is_ascii_digit())
            .unwrap_or(rest.len());
        let unit = match &rest[..unit_len] {
            "ns" => NANOSECOND,
            "us" | "µs" | "μs" => MICROSECOND,
            "ms" => MILLISECOND,
            "s" => SECOND,
            "m" => MINUTE,
            "h" => HOUR,
            "" => return Err(format!("missing unit in duration {:?}", input)),
            other => return Err(format!("unknown unit {:?} in duration {:?}", other, input)),
        };
        rest = &rest[unit_len..];

        let whole: u64 = if whole.is_empty() {
            0
        } else {
            whole.parse().map_err(|_| invalid())?
        };
        let mut value = whole.checked_mul(unit).ok_or_else(invalid)?;

        if !fraction.is_empty() {
            // Digits beyond nanosecond precision cannot change the result
            let digits = &fraction[..fraction.len().min(18)];
            let numerator: u64 = digits.parse().map_err(|_| invalid())?;
            let scale = 10f64.powi(digits.len() as i32);
            let partial = (numerator as f64 * (unit as f64 / scale)) as u64;
            value = value.checked_add(partial).ok_or_else(invalid)?;
        }

        total = total.checked_add(value).ok_or_else(invalid)?;
    }

    if total > i64::MAX as u64 {
        return Err(invalid());
    }
    let total = total as i64;
    Ok(if negative { -total } else { total })
}

/// Parse a human readable size such as `64M` or `1.5gb` into bytes.
///
/// Units are decimal: `k` is 1000, `m` is 1000^2 and so on up to `p`.
pub fn parse_size(input: &str) -> Result<i64, String> {
    let invalid = || format!("invalid size {:?}", input);
    let pattern = Regex::new(SIZE_PATTERN).map_err(|err| err.to_string())?;
    let captures = pattern.captures(input).ok_or_else(invalid)?;

    let number: f64 = captures[1].parse().map_err(|_| invalid())?;
    let multiplier = match captures.get(2).map(|unit| unit.as_str().to_ascii_lowercase()) {
        None => 1.0,
        Some(unit) => match unit.as_str() {
            "k" => 1e3,
            "m" => 1e6,
            "g" => 1e9,
            "t" => 1e12,
            "p" => 1e15,
            _ => return Err(invalid()),
        },
    };

    let bytes = number * multiplier;
    if bytes >= i64::MAX as f64 {
        return Err(invalid());
    }
    Ok(bytes as i64)
}

/// Duration string to nanoseconds; negative durations are rejected
pub fn duration(value: &Value) -> ComposeResult<i64> {
    let spec = value
        .as_str()
        .ok_or_else(|| ComposeError::coercion("duration should be a string"))?;
    let nanos = parse_duration(spec).map_err(ComposeError::coercion)?;
    if nanos < 0 {
        return Err(ComposeError::validation(format!(
            "{} should not be negative",
            spec
        )));
    }
    Ok(nanos)
}

/// Duration string to whole seconds, truncated toward zero
pub fn stop_grace_period(value: &Value) -> ComposeResult<i64> {
    Ok(duration(value)? / SECOND as i64)
}

/// Size string to bytes
pub fn shm_size(value: &Value) -> ComposeResult<i64> {
    let spec = value
        .as_str()
        .ok_or_else(|| ComposeError::coercion("size should be a string"))?;
    parse_size(spec).map_err(ComposeError::coercion)
}

/// Byte count given either as an integer or as a size string
pub fn size_or_bytes(value: &Value) -> ComposeResult<i64> {
    match value {
        Value::Number(n) => n
            .as_i64()
            .filter(|bytes| *bytes >= 0)
            .ok_or_else(|| ComposeError::coercion(format!("{} is not a valid size", n))),
        Value::String(spec) => parse_size(spec).map_err(ComposeError::coercion),
        other => Err(expected("an integer or a string", other)),
    }
}
