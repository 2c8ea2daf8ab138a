//! Time utilities: local wall-clock parsing and formatting.

use anyhow::Result;
use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};

/// Parse a wall-clock time like "09:30" on `date`.
pub fn parse_hhmm_on(date: NaiveDate, hhmm: &str) -> Result<NaiveDateTime> {
    let time = NaiveTime::parse_from_str(hhmm.trim(), "%H:%M")
        .map_err(|e| anyhow::anyhow!("invalid time '{hhmm}' (expected HH:MM): {e}"))?;
    Ok(date.and_time(time))
}

/// Helper: "HH:MM", with a "+1d" suffix when `dt` falls after `date`.
pub fn format_hhmm(date: NaiveDate, dt: NaiveDateTime) -> String {
    let days = (dt.date() - date).num_days();
    match days {
        0 => dt.format("%H:%M").to_string(),
        d => format!("{}{:+}d", dt.format("%H:%M"), d),
    }
}

pub fn minutes(m: i64) -> Duration {
    Duration::minutes(m)
}

#[cfg(test)]
pub(crate) fn test_day() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 2, 21).unwrap()
}

/// Wall-clock time on the fixed test day.
#[cfg(test)]
pub(crate) fn at(h: u32, m: u32) -> NaiveDateTime {
    test_day().and_hms_opt(h, m, 0).unwrap()
}
