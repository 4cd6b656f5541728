// src/utils/time.rs

use std::sync::LazyLock;

use regex::Regex;

static ELAPSED_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d+):([0-5]\d)$").expect("elapsed-time pattern is valid"));

/// Formats a number of seconds as `m:ss`.
pub fn format_elapsed(seconds: u32) -> String {
    format!("{}:{:02}", seconds / 60, seconds % 60)
}

/// Parses a stored `m:ss` string back into seconds.
///
/// Returns `None` for anything that [`format_elapsed`] could not have produced.
pub fn parse_elapsed(text: &str) -> Option<u32> {
    let caps = ELAPSED_RE.captures(text.trim())?;
    let minutes: u32 = caps[1].parse().ok()?;
    let seconds: u32 = caps[2].parse().ok()?;
    minutes.checked_mul(60)?.checked_add(seconds)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_minutes_and_padded_seconds() {
        assert_eq!(format_elapsed(734), "12:14");
        assert_eq!(format_elapsed(5), "0:05");
        assert_eq!(format_elapsed(0), "0:00");
        assert_eq!(format_elapsed(3600), "60:00");
    }

    #[test]
    fn parses_what_it_formats() {
        assert_eq!(parse_elapsed("12:14"), Some(734));
        assert_eq!(parse_elapsed(" 0:05 "), Some(5));
        assert_eq!(parse_elapsed("1:75"), None);
        assert_eq!(parse_elapsed("abc"), None);
        assert_eq!(parse_elapsed(""), None);
    }
}
