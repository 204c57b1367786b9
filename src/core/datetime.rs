//! Turns free-form date/time fragments scraped from venue pages into local
//! timestamps.
//!
//! Fragments mix day, month (number or Polish name), year and `HH:MM` in any
//! order. The first integer up to 31 is taken as the day, so month-first
//! dates such as `03/04/2026` resolve to the 3rd of April. Venues that print
//! month-first need their own calendar fixtures.

use chrono::{DateTime, Datelike, Local, NaiveDate, NaiveDateTime, TimeZone};
use regex::Regex;
use std::sync::LazyLock;

use crate::domain::venue::Venue;

const DELIMITERS: [char; 10] = [' ', '\n', '\t', 'T', '-', '.', '/', '_', '\'', ','];

static TIME_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([0-1]?[0-9]|2[0-3])(:[0-5][0-9])+$").expect("time pattern is valid")
});

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
struct Fields {
    day: u32,
    month: u32,
    year: i32,
    hour: u32,
    minute: u32,
}

/// Month number for a Polish month name or abbreviation, `0` when unknown.
/// Only the first three characters matter.
pub fn month_from_name(token: &str) -> u32 {
    let prefix: String = token.chars().take(3).collect::<String>().to_lowercase();
    match prefix.as_str() {
        "sty" => 1,
        "lut" => 2,
        "mar" => 3,
        "kwi" => 4,
        "maj" => 5,
        "cze" => 6,
        "lip" => 7,
        "sie" => 8,
        "wrz" => 9,
        "paz" | "paź" => 10,
        "lis" => 11,
        "gru" => 12,
        _ => 0,
    }
}

fn scan(raw: &str) -> Fields {
    let mut f = Fields::default();

    for token in raw.split(|c| DELIMITERS.contains(&c)).filter(|t| !t.is_empty()) {
        if let Ok(n) = token.parse::<u32>() {
            if f.day == 0 && n <= 31 && !(f.year != 0 && f.month == 0) {
                f.day = n;
            } else if f.month == 0 && n <= 31 {
                f.month = n;
            } else if f.year == 0 && n > 2000 {
                f.year = n as i32;
            }
        } else if f.day != 0 && f.month == 0 {
            f.month = month_from_name(token);
        } else if TIME_PATTERN.is_match(token) {
            let mut parts = token.split(':');
            f.hour = parts.next().and_then(|p| p.parse().ok()).unwrap_or(0);
            f.minute = parts.next().and_then(|p| p.parse().ok()).unwrap_or(0);
        }
    }

    f
}

/// Resolves `raw` against `now` without touching the time zone.
///
/// Without an explicit year the current one is assumed, moved forward by one
/// when the month already passed: listings only ever look ahead. Returns
/// `None` when the pieces do not form a real calendar date.
pub fn resolve(raw: &str, now: NaiveDateTime) -> Option<NaiveDateTime> {
    let mut f = scan(raw);

    if f.year == 0 {
        f.year = now.year();
        if f.month < now.month() {
            f.year += 1;
        }
    }

    NaiveDate::from_ymd_opt(f.year, f.month, f.day)?.and_hms_opt(f.hour, f.minute, 0)
}

pub fn parse_showing_time_at(
    raw: &str,
    venue: Venue,
    now: NaiveDateTime,
) -> Option<DateTime<Local>> {
    let resolved = resolve(raw, now).and_then(|naive| Local.from_local_datetime(&naive).earliest());
    if resolved.is_none() {
        tracing::debug!("⏱️ {}: could not resolve a date from {:?}", venue, raw);
    }
    resolved
}

pub fn parse_showing_time(raw: &str, venue: Venue) -> Option<DateTime<Local>> {
    parse_showing_time_at(raw, venue, Local::now().naive_local())
}
