//! Time utilities: parsing CLI timestamps, formatting durations.

use crate::errors::{AppError, AppResult};
use chrono::{NaiveDateTime, NaiveTime};

pub fn parse_time(t: &str) -> AppResult<NaiveTime> {
    NaiveTime::parse_from_str(t, "%H:%M").map_err(|_| AppError::InvalidTime(t.to_string()))
}

/// Accepts `YYYY-MM-DD HH:MM`, `YYYY-MM-DDTHH:MM` and both with `:SS`.
pub fn parse_datetime(s: &str) -> AppResult<NaiveDateTime> {
    const FORMATS: [&str; 4] = [
        "%Y-%m-%d %H:%M",
        "%Y-%m-%dT%H:%M",
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%dT%H:%M:%S",
    ];
    FORMATS
        .iter()
        .find_map(|f| NaiveDateTime::parse_from_str(s.trim(), f).ok())
        .ok_or_else(|| AppError::InvalidDate(s.to_string()))
}

pub fn fmt_datetime(dt: &NaiveDateTime) -> String {
    dt.format("%a %Y-%m-%d %H:%M").to_string()
}

/// `5400` → `"01h 30m"`; seconds are shown only when present.
pub fn format_seconds(secs: i64) -> String {
    let sign = if secs < 0 { "-" } else { "" };
    let s = secs.abs();
    let (h, m, rest) = (s / 3600, (s % 3600) / 60, s % 60);
    if rest == 0 {
        format!("{}{:02}h {:02}m", sign, h, m)
    } else {
        format!("{}{:02}h {:02}m {:02}s", sign, h, m, rest)
    }
}

/// Parse `"45s"`, `"30m"`, `"2h"`, `"1h30m"` or a bare number of seconds.
pub fn parse_duration(s: &str) -> AppResult<i64> {
    let s = s.trim();
    if let Ok(n) = s.parse::<i64>() {
        return if n >= 0 {
            Ok(n)
        } else {
            Err(AppError::Validation(format!("negative duration: {}", s)))
        };
    }

    let mut total = 0i64;
    let mut digits = String::new();
    for c in s.chars() {
        if c.is_ascii_digit() {
            digits.push(c);
            continue;
        }
        let unit = match c {
            'h' => 3600,
            'm' => 60,
            's' => 1,
            _ => return Err(AppError::InvalidTime(format!("invalid duration: {}", s))),
        };
        let n: i64 = digits
            .parse()
            .map_err(|_| AppError::InvalidTime(format!("invalid duration: {}", s)))?;
        total = n
            .checked_mul(unit)
            .and_then(|secs| total.checked_add(secs))
            .ok_or_else(|| AppError::Validation(format!("duration out of range: {}", s)))?;
        digits.clear();
    }

    if !digits.is_empty() || s.is_empty() {
        return Err(AppError::InvalidTime(format!("invalid duration: {}", s)));
    }
    Ok(total)
}
