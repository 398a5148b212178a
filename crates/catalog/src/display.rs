//! Presentation helpers for timestamps and sizes.

use std::fmt::{self, Display};
use std::str::FromStr;

use chrono::{DateTime, Utc};
use humansize::{format_size as humanize, BINARY};
use serde::{Deserialize, Serialize};

use crate::error::CatalogError;

/// How timestamps are rendered.
#[derive(
    Debug,
    Default,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
)]
#[serde(rename_all = "kebab-case")]
pub enum DateDisplay {
    /// "3 days ago"
    #[default]
    Relative,
    /// "2023-10-01 12:00"
    Absolute,
    /// RFC 3339
    Iso,
}

impl Display for DateDisplay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Relative => write!(f, "relative"),
            Self::Absolute => write!(f, "absolute"),
            Self::Iso => write!(f, "iso"),
        }
    }
}

impl FromStr for DateDisplay {
    type Err = CatalogError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "relative" => Ok(Self::Relative),
            "absolute" => Ok(Self::Absolute),
            "iso" => Ok(Self::Iso),
            s => Err(CatalogError::config(format!(
                "invalid date display '{s}' (expected relative, \
                absolute or iso)"
            ))),
        }
    }
}

fn plural(n: i64, unit: &str) -> String {
    if n == 1 {
        format!("1 {unit} ago")
    } else {
        format!("{n} {unit}s ago")
    }
}

/// Formats `date` relative to `now`.
pub fn format_relative(
    date: DateTime<Utc>,
    now: DateTime<Utc>,
) -> String {
    let delta = now.signed_duration_since(date);

    if delta.num_seconds() < 0 {
        return date.format("%Y-%m-%d %H:%M").to_string();
    }

    match delta.num_seconds() {
        0..=59 => "just now".into(),
        60..=3599 => plural(delta.num_minutes(), "minute"),
        3600..=86_399 => plural(delta.num_hours(), "hour"),
        _ => match delta.num_days() {
            d @ 0..=29 => plural(d, "day"),
            d @ 30..=364 => plural(d / 30, "month"),
            d => plural(d / 365, "year"),
        },
    }
}

/// Formats an optional timestamp; unknown timestamps render as `-`.
pub fn format_date(
    date: Option<DateTime<Utc>>,
    display: DateDisplay,
    now: DateTime<Utc>,
) -> String {
    let Some(date) = date else {
        return "-".into();
    };

    match display {
        DateDisplay::Relative => format_relative(date, now),
        DateDisplay::Absolute => {
            date.format("%Y-%m-%d %H:%M").to_string()
        }
        DateDisplay::Iso => date.to_rfc3339(),
    }
}

/// Formats a size in bytes using binary units.
#[inline]
pub fn format_size(size: u64) -> String {
    humanize(size, BINARY)
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone};

    use super::*;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn date_display_from_str() {
        let parse = |s: &str| s.parse::<DateDisplay>().unwrap();
        assert_eq!(parse("relative"), DateDisplay::Relative);
        assert_eq!(parse("absolute"), DateDisplay::Absolute);
        assert_eq!(parse("iso"), DateDisplay::Iso);
        assert!("locale".parse::<DateDisplay>().is_err());
        assert_eq!(DateDisplay::Iso.to_string(), "iso");
    }

    #[test]
    fn relative_dates() {
        let now = now();
        let ago = |d: Duration| format_relative(now - d, now);

        assert_eq!(ago(Duration::seconds(10)), "just now");
        assert_eq!(ago(Duration::minutes(1)), "1 minute ago");
        assert_eq!(ago(Duration::minutes(5)), "5 minutes ago");
        assert_eq!(ago(Duration::hours(3)), "3 hours ago");
        assert_eq!(ago(Duration::days(1)), "1 day ago");
        assert_eq!(ago(Duration::days(65)), "2 months ago");
        assert_eq!(ago(Duration::days(800)), "2 years ago");
        assert_eq!(
            format_relative(now + Duration::days(1), now),
            "2024-06-02 12:00"
        );
    }

    #[test]
    fn format_optional_dates() {
        let now = now();
        assert_eq!(format_date(None, DateDisplay::Iso, now), "-");
        assert_eq!(
            format_date(Some(now), DateDisplay::Absolute, now),
            "2024-06-01 12:00"
        );
        assert_eq!(
            format_date(Some(now), DateDisplay::Iso, now),
            "2024-06-01T12:00:00+00:00"
        );
    }

    #[test]
    fn sizes() {
        assert_eq!(format_size(0), "0 B");
        assert_eq!(format_size(2048), "2 KiB");
    }
}
