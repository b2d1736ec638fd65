//! Human-readable durations for configuration values.
//!
//! Accepts `<digits><unit>` with unit one of `ms`, `s`, `m`, `h`, `d`, `w`,
//! e.g. `"15m"`, `"30d"`.

use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DurationParseError {
    #[error("invalid duration `{0}`: expected <number><ms|s|m|h|d|w>")]
    Format(String),

    #[error("duration `{0}` is out of range")]
    Overflow(String),
}

pub fn parse_duration(input: &str) -> Result<Duration, DurationParseError> {
    let trimmed = input.trim();
    let split = trimmed
        .find(|c: char| !c.is_ascii_digit())
        .ok_or_else(|| DurationParseError::Format(input.to_string()))?;
    let (digits, unit) = trimmed.split_at(split);

    if digits.is_empty() {
        return Err(DurationParseError::Format(input.to_string()));
    }
    let value: u64 = digits
        .parse()
        .map_err(|_| DurationParseError::Overflow(input.to_string()))?;

    let millis_per_unit: u64 = match unit {
        "ms" => 1,
        "s" => 1_000,
        "m" => 60_000,
        "h" => 3_600_000,
        "d" => 86_400_000,
        "w" => 604_800_000,
        _ => return Err(DurationParseError::Format(input.to_string())),
    };

    value
        .checked_mul(millis_per_unit)
        .map(Duration::from_millis)
        .ok_or_else(|| DurationParseError::Overflow(input.to_string()))
}
