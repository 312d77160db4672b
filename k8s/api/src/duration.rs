//! Parsing for Gateway API `Duration` strings.
//!
//! The Gateway API inherits Go's `time.ParseDuration` format ("15s",
//! "1h30m", "250ms", ...). Values are parsed into a `std::time::Duration`;
//! negative durations are rejected since no Gateway API field accepts one.

use std::time::Duration;

#[derive(Debug, thiserror::Error, Eq, PartialEq)]
#[non_exhaustive]
pub enum ParseError {
    #[error("invalid unit: {}", EXPECTED_UNITS)]
    InvalidUnit,

    #[error("missing a unit: {}", EXPECTED_UNITS)]
    NoUnit,

    #[error("negative durations are not supported")]
    Negative,

    #[error("invalid floating-point number: {0}")]
    NotANumber(#[from] std::num::ParseFloatError),
}

const EXPECTED_UNITS: &str = "expected one of 'ns', 'us', '\u{00b5}s', 'ms', 's', 'm', or 'h'";

fn unit_base(unit: &str) -> Result<Duration, ParseError> {
    const MINUTE: Duration = Duration::from_secs(60);
    match unit {
        "ns" => Ok(Duration::from_nanos(1)),
        // U+00B5 is the "micro sign" while U+03BC is "Greek letter mu"
        "us" | "\u{00b5}s" | "\u{03bc}s" => Ok(Duration::from_micros(1)),
        "ms" => Ok(Duration::from_millis(1)),
        "s" => Ok(Duration::from_secs(1)),
        "m" => Ok(MINUTE),
        "h" => Ok(MINUTE * 60),
        _ => Err(ParseError::InvalidUnit),
    }
}

/// Parses a Go-format duration string such as `15s` or `1h2m3s4ms`.
pub fn parse(mut s: &str) -> Result<Duration, ParseError> {
    if s.starts_with('-') {
        return Err(ParseError::Negative);
    }
    s = s.trim_start_matches('+');

    if s == "0" {
        return Ok(Duration::ZERO);
    }

    let mut total = Duration::ZERO;
    while !s.is_empty() {
        let unit_start = s
            .find(|c: char| c.is_alphabetic())
            .ok_or(ParseError::NoUnit)?;
        let (val, rest) = s.split_at(unit_start);
        let val = val.parse::<f64>()?;
        let unit = match rest.find(|c: char| !c.is_alphabetic()) {
            Some(next_numeric_start) => {
                let (unit, rest) = rest.split_at(next_numeric_start);
                s = rest;
                unit
            }
            None => {
                s = "";
                rest
            }
        };
        total += unit_base(unit)?.mul_f64(val);
    }

    Ok(total)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_the_same_as_go() {
        const MINUTE: Duration = Duration::from_secs(60);
        const HOUR: Duration = Duration::from_secs(60 * 60);
        let cases: &[(&str, Duration)] = &[
            ("0", Duration::ZERO),
            ("5s", Duration::from_secs(5)),
            ("30s", Duration::from_secs(30)),
            ("1478s", Duration::from_secs(1478)),
            ("+5s", Duration::from_secs(5)),
            ("5.6s", Duration::from_secs(5) + Duration::from_millis(600)),
            ("5.s", Duration::from_secs(5)),
            (".5s", Duration::from_millis(500)),
            ("1.004s", Duration::from_secs(1) + Duration::from_millis(4)),
            ("10ns", Duration::from_nanos(10)),
            ("11us", Duration::from_micros(11)),
            ("12µs", Duration::from_micros(12)),
            ("13ms", Duration::from_millis(13)),
            ("15m", 15 * MINUTE),
            ("16h", 16 * HOUR),
            ("3h30m", 3 * HOUR + 30 * MINUTE),
            (
                "10.5s4m",
                4 * MINUTE + Duration::from_secs(10) + Duration::from_millis(500),
            ),
            (
                "1h2m3s4ms5us6ns",
                HOUR + 2 * MINUTE
                    + Duration::from_secs(3)
                    + Duration::from_millis(4)
                    + Duration::from_micros(5)
                    + Duration::from_nanos(6),
            ),
            ("52763797000ns", Duration::from_nanos(52763797000)),
            ("0.3333333333333333333h", 20 * MINUTE),
        ];

        for (input, expected) in cases {
            assert_eq!(parse(input).unwrap(), *expected, "input: {input}");
        }
    }

    #[test]
    fn rejects_invalid_durations() {
        assert_eq!(parse("-5s"), Err(ParseError::Negative));
        assert_eq!(parse("5"), Err(ParseError::NoUnit));
        assert_eq!(parse("5d"), Err(ParseError::InvalidUnit));
        assert!(matches!(parse("s"), Err(ParseError::NotANumber(_))));
    }
}
