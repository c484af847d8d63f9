use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, Result};

/// Parse a rotation interval such as `30m`, `1h 30m` or `5 minutes`.
///
/// Whitespace between a number and its unit is dropped before handing the
/// string to `humantime`, so "30 minutes" reads the same as "30minutes".
pub fn parse_duration(duration_str: &str) -> Result<Duration> {
    let normalized = join_units(duration_str.trim());
    humantime::Duration::from_str(&normalized)
        .map(|d| d.into())
        .with_context(|| format!("Invalid duration format: {}", duration_str))
}

fn join_units(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut tokens = input.split_whitespace().peekable();

    while let Some(token) = tokens.next() {
        out.push_str(token);
        let is_number = token.chars().all(|c| c.is_ascii_digit() || c == '.');
        let next_is_unit = tokens
            .peek()
            .is_some_and(|next| next.chars().all(|c| c.is_ascii_alphabetic()));
        if !(is_number && next_is_unit) && tokens.peek().is_some() {
            out.push(' ');
        }
    }

    out
}

/// Compact human form used in status output, e.g. `1h30m`.
pub fn format_duration(duration: Duration) -> String {
    let seconds = duration.as_secs();
    if seconds == 0 {
        format!("{}ms", duration.as_millis())
    } else if seconds < 60 {
        format!("{}s", seconds)
    } else if seconds < 3600 {
        let minutes = seconds / 60;
        let secs = seconds % 60;
        if secs == 0 {
            format!("{}m", minutes)
        } else {
            format!("{}m{}s", minutes, secs)
        }
    } else {
        let hours = seconds / 3600;
        let minutes = (seconds % 3600) / 60;
        if minutes == 0 {
            format!("{}h", hours)
        } else {
            format!("{}h{}m", hours, minutes)
        }
    }
}
