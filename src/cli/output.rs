use std::fmt::Write;

use anyhow::Result;
use chrono::Duration;

use crate::{
    tracker::color::ActivityColor,
    utils::time::{date_to_label, format_duration},
};

use super::session::{BreakdownEntry, CatalogEntry, Reply};

/// Turns a reply into what is printed. JSON replies are single line so they can be piped.
pub fn render(reply: &Reply, json: bool) -> Result<String> {
    if json {
        return Ok(serde_json::to_string(reply)?);
    }

    let mut out = String::new();
    match reply {
        Reply::Began { id, activity_type } => write!(out, "began {activity_type} {id}")?,
        Reply::Ended {
            id,
            activity_type,
            duration,
        } => write!(
            out,
            "ended {activity_type} {id} after {}",
            format_duration(*duration)
        )?,
        Reply::NotEngaged { activity_type } => write!(out, "{activity_type} isn't going on")?,
        Reply::Added { id, activity_type } => write!(out, "added {activity_type} {id}")?,
        Reply::Reclassified { id, activity_type } => {
            write!(out, "{id} is now {activity_type}")?
        }
        Reply::Catalog { entries } | Reply::Types { entries } => {
            write_lines(&mut out, entries.iter().map(catalog_line))?
        }
        Reply::Status { entries } if entries.is_empty() => write!(out, "nothing is going on")?,
        Reply::Status { entries } => write_lines(
            &mut out,
            entries.iter().map(|entry| {
                format!(
                    "{}\t{}\tsince {}\t{}",
                    entry.id,
                    paint(&entry.activity_type, entry.color),
                    entry.since,
                    format_duration(entry.duration)
                )
            }),
        )?,
        Reply::Total {
            day,
            activity_type,
            duration,
        } => {
            if let Some(day) = day {
                write!(out, "{}\t", date_to_label(*day))?;
            }
            if let Some(activity_type) = activity_type {
                write!(out, "{activity_type}\t")?;
            }
            write!(out, "{}", format_duration(*duration))?;
        }
        Reply::Breakdown {
            day,
            total,
            entries,
        } => {
            let label = day.map(date_to_label).unwrap_or_else(|| "all".into());
            write_breakdown(&mut out, &label, *total, entries)?;
        }
        Reply::Days { days } => {
            for (i, day) in days.iter().enumerate() {
                if i > 0 {
                    out.push('\n');
                }
                write_breakdown(&mut out, &date_to_label(day.day), day.total, &day.entries)?;
            }
        }
    }
    Ok(out)
}

fn write_breakdown(
    out: &mut String,
    label: &str,
    total: Duration,
    entries: &[BreakdownEntry],
) -> std::fmt::Result {
    write!(out, "{label}\t{}", format_duration(total))?;
    for entry in entries {
        write!(
            out,
            "\n{label}\t{:.0}%\t{}\t{}",
            entry.share,
            format_duration(entry.breakdown.duration),
            paint(&entry.breakdown.activity_type, entry.color)
        )?;
    }
    Ok(())
}

fn catalog_line(entry: &CatalogEntry) -> String {
    match entry.color {
        Some(color) => format!("{}\t{color}", paint(&entry.activity_type, Some(color))),
        None => entry.activity_type.to_string(),
    }
}

fn paint(text: &str, color: Option<ActivityColor>) -> String {
    match color {
        Some(color) => color.terminal().paint(text).to_string(),
        None => text.to_string(),
    }
}

fn write_lines(out: &mut String, lines: impl Iterator<Item = String>) -> std::fmt::Result {
    for (i, line) in lines.enumerate() {
        if i > 0 {
            out.push('\n');
        }
        out.write_str(&line)?;
    }
    Ok(())
}
