//! Token expiry durations.
//!
//! Expiry strings follow the `pulsar tokens` convention: whole days (`7d`)
//! and 365-day years (`2y`) on top of the usual `h`/`m`/`s`/`ms`/`us`/`ns`
//! duration syntax (`1h30m`, `1.5h`, `-10s`).

use crate::error::{JwtError, Result};
use chrono::Duration;
use regex::Regex;
use std::sync::LazyLock;

static DAYS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[1-9][0-9]*d$").expect("valid day pattern"));
static YEARS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[1-9][0-9]*y$").expect("valid year pattern"));

const DAYS_PER_YEAR: i64 = 365;

/// Parse a token expiry duration.
///
/// The input is trimmed and lower-cased. Day and year suffixes are tried
/// first, anything else goes through [`parse_duration`].
pub fn parse_expiry(input: &str) -> Result<Duration> {
    let normalized = input.trim().to_lowercase();

    match parse_period(&normalized) {
        Ok(duration) => Ok(duration),
        Err(_) => parse_duration(&normalized),
    }
}

/// Parse the `<n>d` / `<n>y` forms only.
///
/// Like [`parse_duration`], the result must fit in an `i64` count of
/// nanoseconds, so `292y` is the longest accepted period.
pub fn parse_period(input: &str) -> Result<Duration> {
    let days = if DAYS.is_match(input) {
        count(input)?
    } else if YEARS.is_match(input) {
        count(input)?
            .checked_mul(DAYS_PER_YEAR)
            .ok_or_else(|| invalid(input))?
    } else {
        return Err(invalid(input));
    };

    Duration::try_days(days)
        .filter(|duration| duration.num_nanoseconds().is_some())
        .ok_or_else(|| invalid(input))
}

fn count(input: &str) -> Result<i64> {
    input[..input.len() - 1]
        .parse()
        .map_err(|_| invalid(input))
}

/// Parse a duration such as `300ms`, `-1.5h` or `2h45m`.
///
/// A signed sequence of decimal numbers, each with an optional fraction and
/// a unit suffix. Valid units are `ns`, `us` (or `µs`), `ms`, `s`, `m`, `h`.
/// The total must fit in an `i64` count of nanoseconds.
pub fn parse_duration(input: &str) -> Result<Duration> {
    let (negative, mut rest) = match input.as_bytes().first() {
        Some(b'-') => (true, &input[1..]),
        Some(b'+') => (false, &input[1..]),
        _ => (false, input),
    };

    if rest == "0" {
        return Ok(Duration::zero());
    }
    if rest.is_empty() {
        return Err(invalid(input));
    }

    let mut total: u128 = 0;
    while !rest.is_empty() {
        let (component, remaining) = parse_component(rest).ok_or_else(|| invalid(input))?;
        total = total
            .checked_add(component)
            .filter(|t| *t <= i64::MAX as u128)
            .ok_or_else(|| invalid(input))?;
        rest = remaining;
    }

    let nanos = i64::try_from(total).map_err(|_| invalid(input))?;
    Ok(Duration::nanoseconds(if negative { -nanos } else { nanos }))
}

/// Parse one `<number><unit>` component, returning nanoseconds and the rest.
fn parse_component(input: &str) -> Option<(u128, &str)> {
    let int_len = leading_digits(input);
    let (int_part, rest) = input.split_at(int_len);

    let (frac_part, rest) = match rest.strip_prefix('.') {
        Some(after_dot) => after_dot.split_at(leading_digits(after_dot)),
        None => ("", rest),
    };

    if int_part.is_empty() && frac_part.is_empty() {
        return None;
    }

    let unit_len = rest
        .find(|c: char| c == '.' || c.is_ascii_digit())
        .unwrap_or(rest.len());
    let (unit, rest) = rest.split_at(unit_len);
    let unit_nanos = unit_nanos(unit)?;

    let whole: u128 = if int_part.is_empty() {
        0
    } else {
        int_part.parse::<u64>().ok()?.into()
    };
    let mut nanos = whole.checked_mul(unit_nanos)?;

    // Digits past nanosecond precision cannot change the result.
    let frac_digits = &frac_part[..frac_part.len().min(18)];
    if !frac_digits.is_empty() {
        let frac: u128 = frac_digits.parse().ok()?;
        let scale = 10u128.pow(frac_digits.len() as u32);
        nanos = nanos.checked_add(frac * unit_nanos / scale)?;
    }

    Some((nanos, rest))
}

fn leading_digits(input: &str) -> usize {
    input
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(input.len())
}

fn unit_nanos(unit: &str) -> Option<u128> {
    let nanos = match unit {
        "ns" => 1,
        "us" | "µs" | "μs" => 1_000,
        "ms" => 1_000_000,
        "s" => 1_000_000_000,
        "m" => 60 * 1_000_000_000,
        "h" => 3_600 * 1_000_000_000,
        _ => return None,
    };
    Some(nanos)
}

fn invalid(input: &str) -> JwtError {
    JwtError::InvalidDuration(input.to_string())
}
