use std::collections::HashSet;
use std::sync::LazyLock;

use chrono::{DateTime, Local, NaiveDate, TimeZone};
use regex::Regex;
use url::Url;

static URL_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?i)https?://[^\s\])}>"']+"#).unwrap());

// 2025-06-30, 2025-06-30 23:59, 2025-06-30T23:59:59
static ISO_DATE_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(\d{4})-(\d{1,2})-(\d{1,2})(?:[T ](\d{1,2}):(\d{2})(?::(\d{2}))?)?").unwrap()
});
// 30.06.2025 and 30/06/2025, day first
static DMY_DATE_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d{1,2})[./](\d{1,2})[./](\d{4})").unwrap());

// checked in priority order
const EXPIRY_KEYS: &[&str] = &["exp", "expires", "expiry", "end", "validto", "valid_to", "until"];

/// Scans free text for http/https URL tokens, first-seen order, deduplicated.
pub fn extract_urls(text: &str) -> Vec<String> {
    let mut seen: HashSet<&str> = HashSet::new();
    let mut found: Vec<String> = Vec::new();
    for m in URL_REGEX.find_iter(text) {
        let candidate = m.as_str();
        if seen.insert(candidate) {
            found.push(candidate.to_string());
        }
    }
    found
}

/// Best-effort expiry timestamp from a stream URL's query parameters.
pub fn guess_expiry(url: &str) -> Option<DateTime<Local>> {
    let parsed = Url::parse(url).ok()?;
    let pairs: Vec<(String, String)> = parsed
        .query_pairs()
        .map(|(key, value)| (key.to_string(), value.to_string()))
        .collect();
    for key in EXPIRY_KEYS {
        let Some((_, raw)) = pairs.iter().find(|(k, _)| k == key) else {
            continue;
        };
        if raw.is_empty() {
            continue;
        }
        if let Some(expiry) = parse_expiry_value(raw) {
            return Some(expiry);
        }
    }
    None
}

fn parse_expiry_value(raw: &str) -> Option<DateTime<Local>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if raw.bytes().all(|b| b.is_ascii_digit()) {
        let mut timestamp: i64 = raw.parse().ok()?;
        if timestamp > 10_000_000_000 {
            // magnitude says milliseconds
            timestamp /= 1000;
        }
        return Local.timestamp_opt(timestamp, 0).single();
    }
    parse_embedded_date(raw)
}

/// Permissive date extraction, tolerates non-date text around the value.
fn parse_embedded_date(raw: &str) -> Option<DateTime<Local>> {
    parse_iso_date(raw).or_else(|| parse_dmy_date(raw))
}

fn parse_iso_date(raw: &str) -> Option<DateTime<Local>> {
    let caps = ISO_DATE_REGEX.captures(raw)?;
    let year: i32 = caps[1].parse().ok()?;
    let month: u32 = caps[2].parse().ok()?;
    let day: u32 = caps[3].parse().ok()?;
    let hour: u32 = caps.get(4).map_or(Some(0), |m| m.as_str().parse().ok())?;
    let minute: u32 = caps.get(5).map_or(Some(0), |m| m.as_str().parse().ok())?;
    let second: u32 = caps.get(6).map_or(Some(0), |m| m.as_str().parse().ok())?;
    to_local_datetime(year, month, day, hour, minute, second)
}

fn parse_dmy_date(raw: &str) -> Option<DateTime<Local>> {
    let caps = DMY_DATE_REGEX.captures(raw)?;
    let day: u32 = caps[1].parse().ok()?;
    let month: u32 = caps[2].parse().ok()?;
    let year: i32 = caps[3].parse().ok()?;
    to_local_datetime(year, month, day, 0, 0, 0)
}

fn to_local_datetime(
    year: i32,
    month: u32,
    day: u32,
    hour: u32,
    minute: u32,
    second: u32,
) -> Option<DateTime<Local>> {
    let date = NaiveDate::from_ymd_opt(year, month, day)?;
    let datetime = date.and_hms_opt(hour, minute, second)?;
    Local.from_local_datetime(&datetime).single()
}
