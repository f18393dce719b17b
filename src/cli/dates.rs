use std::fmt::Display;

use anyhow::{anyhow, bail, Result};
use chrono::{DateTime, NaiveDate, TimeZone};
use chrono_english::parse_date_string;
use clap::ValueEnum;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum DateStyle {
    #[default]
    Uk,
    Us,
}

impl From<DateStyle> for chrono_english::Dialect {
    fn from(value: DateStyle) -> Self {
        match value {
            DateStyle::Uk => Self::Uk,
            DateStyle::Us => Self::Us,
        }
    }
}

impl Display for DateStyle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DateStyle::Uk => write!(f, "uk"),
            DateStyle::Us => write!(f, "us"),
        }
    }
}

impl DateStyle {
    fn numeric_format(self) -> &'static str {
        match self {
            DateStyle::Uk => "%d/%m/%Y",
            DateStyle::Us => "%m/%d/%Y",
        }
    }

    fn example(self) -> &'static str {
        match self {
            DateStyle::Uk => "23/04/2016 13:15",
            DateStyle::Us => "04/23/2016 13:15",
        }
    }
}

/// Parses user entered dates such as "yesterday", "1 hour ago", "13:15", "16/03/2025 12:00"
/// relative to `now`.
///
/// The date has to come before the time. `chrono_english` drops a date written after the time
/// and falls back to today, so a numeric date that doesn't survive parsing is an error.
pub fn parse_when<Tz: TimeZone>(value: &str, now: DateTime<Tz>, style: DateStyle) -> Result<DateTime<Tz>>
where
    Tz::Offset: Copy,
{
    let parsed = parse_date_string(value, now, style.into())
        .map_err(|e| anyhow!("Can't understand date \"{value}\": {e}"))?;
    if let Some(written) = written_date(value, style) {
        if parsed.date_naive() != written {
            bail!(
                "\"{value}\" reads as {} instead of {written}. Put the date first, as in \"{}\"",
                parsed.date_naive(),
                style.example()
            );
        }
    }
    Ok(parsed)
}

/// Numeric date spelled out in `value`, if there is one.
fn written_date(value: &str, style: DateStyle) -> Option<NaiveDate> {
    value
        .split_whitespace()
        .find_map(|word| NaiveDate::parse_from_str(word, style.numeric_format()).ok())
}
