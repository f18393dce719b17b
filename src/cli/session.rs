//! A tracking session driven by one command per input line. The session owns the [Tracker] and is
//! the only place it gets mutated from, including while `watch` is re-querying it.

use std::{fmt::Display, io::Write, sync::Arc, time::Duration};

use anyhow::{bail, Context, Result};
use chrono::{DateTime, FixedOffset, NaiveDate, TimeZone, Utc};
use clap::{Parser, Subcommand};
use serde::Serialize;
use tokio::select;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument};

use crate::tracker::{
    collection::{ActivitySet, ActivityView, TypeBreakdown},
    color::ActivityColor,
    record::RecordId,
    Toggle, Tracker,
};

use super::{
    dates::{parse_when, DateStyle},
    input::LineSource,
    output::render,
};

#[derive(Parser, Debug)]
#[command(no_binary_name = true, name = "session", disable_version_flag = true)]
struct SessionLine {
    #[command(subcommand)]
    command: SessionCommand,
}

#[derive(Subcommand, Debug, PartialEq)]
pub enum SessionCommand {
    #[command(about = "Begin an activity if it isn't going on, end it otherwise")]
    Toggle { activity_type: String },
    #[command(about = "Begin an activity now")]
    Begin { activity_type: String },
    #[command(about = "End an ongoing activity now")]
    End { activity_type: String },
    #[command(about = "Add an activity that already happened. Leave out --to if it's still going on")]
    Add {
        activity_type: String,
        #[arg(
            long,
            help = "Start of the activity. Examples are \"1 hour ago\", \"13:15\", \"16/03/2025 12:00\". The date goes before the time"
        )]
        from: String,
        #[arg(long, help = "End of the activity")]
        to: Option<String>,
    },
    #[command(about = "Change the type of a recorded activity")]
    Reclassify { id: RecordId, activity_type: String },
    #[command(about = "List recognized activity types")]
    Catalog,
    #[command(about = "List activity types that have been recorded")]
    Types,
    #[command(about = "Show ongoing activities")]
    Status,
    #[command(about = "Total time spent")]
    Total {
        #[arg(long = "type", help = "Only count this type")]
        activity_type: Option<String>,
        #[command(flatten)]
        scope: ScopeArgs,
    },
    #[command(about = "Time spent per activity type")]
    Breakdown {
        #[command(flatten)]
        scope: ScopeArgs,
    },
    #[command(about = "Time spent per activity type for every day since the first activity")]
    Days {
        #[arg(long, value_delimiter = ',', help = "Only count these types")]
        only: Vec<String>,
    },
    #[command(about = "Show ongoing activities repeatedly")]
    Watch {
        #[arg(long, default_value_t = 1, help = "Seconds between updates")]
        every: u64,
        #[arg(long, default_value_t = 10, help = "Number of updates")]
        ticks: u32,
    },
    #[command(about = "End the session", alias = "exit")]
    Quit,
}

#[derive(clap::Args, Debug, Clone, Default, PartialEq)]
pub struct ScopeArgs {
    #[arg(long, help = "Only count activities that started on this day")]
    day: Option<String>,
    #[arg(long, value_delimiter = ',', help = "Only count these types")]
    only: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct CatalogEntry {
    pub activity_type: Arc<str>,
    pub color: Option<ActivityColor>,
}

#[derive(Debug, Serialize)]
pub struct OngoingEntry {
    pub id: RecordId,
    pub activity_type: Arc<str>,
    pub since: String,
    #[serde(rename = "duration_ms", with = "crate::tracker::collection::duration_ms")]
    pub duration: chrono::Duration,
    pub color: Option<ActivityColor>,
}

#[derive(Debug, Serialize)]
pub struct BreakdownEntry {
    #[serde(flatten)]
    pub breakdown: TypeBreakdown,
    pub share: f64,
    pub color: Option<ActivityColor>,
}

#[derive(Debug, Serialize)]
pub struct DayReport {
    pub day: NaiveDate,
    pub starts_at: DateTime<FixedOffset>,
    #[serde(rename = "total_ms", with = "crate::tracker::collection::duration_ms")]
    pub total: chrono::Duration,
    pub entries: Vec<BreakdownEntry>,
}

/// Result of a command, independent of how it is shown.
#[derive(Debug, Serialize)]
#[serde(tag = "reply", rename_all = "snake_case")]
pub enum Reply {
    Began {
        id: RecordId,
        activity_type: Arc<str>,
    },
    Ended {
        id: RecordId,
        activity_type: Arc<str>,
        #[serde(rename = "duration_ms", with = "crate::tracker::collection::duration_ms")]
        duration: chrono::Duration,
    },
    NotEngaged {
        activity_type: String,
    },
    Added {
        id: RecordId,
        activity_type: Arc<str>,
    },
    Reclassified {
        id: RecordId,
        activity_type: Arc<str>,
    },
    Catalog {
        entries: Vec<CatalogEntry>,
    },
    Types {
        entries: Vec<CatalogEntry>,
    },
    Status {
        entries: Vec<OngoingEntry>,
    },
    Total {
        day: Option<NaiveDate>,
        activity_type: Option<String>,
        #[serde(rename = "duration_ms", with = "crate::tracker::collection::duration_ms")]
        duration: chrono::Duration,
    },
    Breakdown {
        day: Option<NaiveDate>,
        #[serde(rename = "total_ms", with = "crate::tracker::collection::duration_ms")]
        total: chrono::Duration,
        entries: Vec<BreakdownEntry>,
    },
    Days {
        days: Vec<DayReport>,
    },
}

/// What a line of input turned into.
#[derive(Debug)]
pub enum Parsed {
    Command(SessionCommand),
    /// Help or usage text to show instead of running anything.
    Message(String),
}

pub struct Session<Tz: TimeZone> {
    tracker: Tracker,
    tz: Tz,
    date_style: DateStyle,
    json: bool,
}

impl<Tz> Session<Tz>
where
    Tz: TimeZone,
    Tz::Offset: Copy + Display,
{
    pub fn new(tracker: Tracker, tz: Tz, date_style: DateStyle, json: bool) -> Self {
        Self {
            tracker,
            tz,
            date_style,
            json,
        }
    }

    pub fn tracker(&self) -> &Tracker {
        &self.tracker
    }

    /// Reads commands until input ends, `quit` is entered or `shutdown` is cancelled. A failing
    /// command is reported and the session goes on.
    pub async fn run(
        mut self,
        mut lines: impl LineSource,
        out: &mut impl Write,
        shutdown: CancellationToken,
    ) -> Result<Tracker> {
        loop {
            let line = select! {
                _ = shutdown.cancelled() => {
                    info!("Session interrupted");
                    break;
                }
                line = lines.next_line() => line?,
            };
            let Some(line) = line else {
                debug!("Input ended");
                break;
            };
            if line.trim().is_empty() {
                continue;
            }

            match parse_line(&line) {
                Ok(Parsed::Command(SessionCommand::Quit)) => break,
                Ok(Parsed::Command(SessionCommand::Watch { every, ticks })) => {
                    self.watch(Duration::from_secs(every), ticks, out, &shutdown)
                        .await?;
                }
                Ok(Parsed::Command(command)) => match self.execute(command) {
                    Ok(reply) => writeln!(out, "{}", render(&reply, self.json)?)?,
                    Err(e) => {
                        error!("Command \"{line}\" failed {e:?}");
                        writeln!(out, "error: {e}")?;
                    }
                },
                Ok(Parsed::Message(message)) => writeln!(out, "{message}")?,
                Err(e) => writeln!(out, "error: {e}")?,
            }
            out.flush()?;
        }
        Ok(self.tracker)
    }

    /// Prints the ongoing activities `ticks` times. Durations are measured again on every tick.
    async fn watch(
        &self,
        every: Duration,
        ticks: u32,
        out: &mut impl Write,
        shutdown: &CancellationToken,
    ) -> Result<()> {
        for tick in 0..ticks {
            writeln!(out, "{}", render(&self.status(), self.json)?)?;
            out.flush()?;
            if tick + 1 == ticks {
                break;
            }
            select! {
                _ = shutdown.cancelled() => break,
                _ = self.tracker.clock().sleep(every) => {}
            }
        }
        Ok(())
    }

    #[instrument(skip(self))]
    pub fn execute(&mut self, command: SessionCommand) -> Result<Reply> {
        let reply = match command {
            SessionCommand::Toggle { activity_type } => {
                match self.tracker.toggle_activity(&activity_type)? {
                    Toggle::Began(id) => self.began(id)?,
                    Toggle::Ended(id) => self.ended(id)?,
                }
            }
            SessionCommand::Begin { activity_type } => {
                let id = self.tracker.begin_activity(&activity_type)?;
                self.began(id)?
            }
            SessionCommand::End { activity_type } => match self.tracker.end_activity(&activity_type) {
                Some(id) => self.ended(id)?,
                None => Reply::NotEngaged { activity_type },
            },
            SessionCommand::Add {
                activity_type,
                from,
                to,
            } => {
                let start = self.parse_when(&from)?;
                let end = to.map(|to| self.parse_when(&to)).transpose()?;
                let id = self.tracker.record_activity(
                    &activity_type,
                    start.to_utc(),
                    end.map(|v| v.to_utc()),
                )?;
                Reply::Added {
                    id,
                    activity_type: self.record_type(id)?,
                }
            }
            SessionCommand::Reclassify { id, activity_type } => {
                self.tracker.reclassify(id, &activity_type)?;
                Reply::Reclassified {
                    id,
                    activity_type: self.record_type(id)?,
                }
            }
            SessionCommand::Catalog => Reply::Catalog {
                entries: self.catalog_entries(self.tracker.catalog().iter().cloned()),
            },
            SessionCommand::Types => Reply::Types {
                entries: self.catalog_entries(self.tracker.history().distinct_types()),
            },
            SessionCommand::Status => self.status(),
            SessionCommand::Total {
                activity_type,
                scope,
            } => {
                let (day, view) = self.scope(&scope)?;
                let duration = match &activity_type {
                    Some(activity_type) => view.duration_for_type(activity_type),
                    None => view.total_duration(),
                };
                Reply::Total {
                    day,
                    activity_type,
                    duration,
                }
            }
            SessionCommand::Breakdown { scope } => {
                let (day, view) = self.scope(&scope)?;
                let now = view.now();
                Reply::Breakdown {
                    day,
                    total: view.total_duration_at(now),
                    entries: self.breakdown_entries(&view, now),
                }
            }
            SessionCommand::Days { only } => {
                let only = only.iter().map(String::as_str).collect::<Vec<_>>();
                let filter = (!only.is_empty()).then_some(only.as_slice());
                let now = self.tracker.clock().time();
                let days = self
                    .tracker
                    .group_by_day_in(&self.tz, filter)?
                    .into_iter()
                    .map(|bucket| DayReport {
                        day: bucket.day(),
                        starts_at: bucket.midnight(&self.tz).fixed_offset(),
                        total: bucket.total_duration_at(now),
                        entries: self.breakdown_entries(&bucket, now),
                    })
                    .collect();
                Reply::Days { days }
            }
            SessionCommand::Watch { .. } | SessionCommand::Quit => {
                bail!("watch and quit are handled by the session loop")
            }
        };
        Ok(reply)
    }

    fn status(&self) -> Reply {
        let history = self.tracker.history();
        let now = history.now();
        let entries = history
            .ongoing()
            .into_iter()
            .map(|record| OngoingEntry {
                id: record.id(),
                activity_type: record.activity_type().clone(),
                since: record
                    .start()
                    .with_timezone(&self.tz)
                    .format("%Y-%m-%d %H:%M:%S")
                    .to_string(),
                duration: record.duration_at(now),
                color: self.tracker.color_for(record.activity_type()),
            })
            .collect();
        Reply::Status { entries }
    }

    fn began(&self, id: RecordId) -> Result<Reply> {
        Ok(Reply::Began {
            id,
            activity_type: self.record_type(id)?,
        })
    }

    fn ended(&self, id: RecordId) -> Result<Reply> {
        let duration = self
            .tracker
            .record(id)
            .map(|record| record.duration_at(self.tracker.clock().time()))
            .unwrap_or_else(chrono::Duration::zero);
        Ok(Reply::Ended {
            id,
            activity_type: self.record_type(id)?,
            duration,
        })
    }

    fn record_type(&self, id: RecordId) -> Result<Arc<str>> {
        self.tracker
            .record(id)
            .map(|record| record.activity_type().clone())
            .with_context(|| format!("Record {id} disappeared"))
    }

    fn parse_when(&self, value: &str) -> Result<DateTime<Tz>> {
        let now = self.tracker.clock().time().with_timezone(&self.tz);
        parse_when(value, now, self.date_style)
    }

    /// Records the `total` and `breakdown` commands look at.
    fn scope(&self, scope: &ScopeArgs) -> Result<(Option<NaiveDate>, ActivityView<'_>)> {
        let only = scope.only.iter().map(String::as_str).collect::<Vec<_>>();
        let filter = (!only.is_empty()).then_some(only.as_slice());
        let Some(day) = &scope.day else {
            let view = match filter {
                Some(types) => self.tracker.only(types),
                None => self.tracker.history(),
            };
            return Ok((None, view));
        };

        let day = self.parse_when(day)?.date_naive();
        match self.tracker.day_in(&self.tz, day, filter)? {
            Some(bucket) => Ok((Some(day), bucket.into_view())),
            None => bail!("{day} is outside of the recorded days"),
        }
    }

    fn catalog_entries(&self, types: impl IntoIterator<Item = Arc<str>>) -> Vec<CatalogEntry> {
        types
            .into_iter()
            .map(|activity_type| CatalogEntry {
                color: self.tracker.color_for(&activity_type),
                activity_type,
            })
            .collect()
    }

    fn breakdown_entries(
        &self,
        view: &impl ActivitySet,
        now: DateTime<Utc>,
    ) -> Vec<BreakdownEntry> {
        view.breakdown_by_type_at(now)
            .into_iter()
            .map(|breakdown| BreakdownEntry {
                share: *breakdown.share(),
                color: self.tracker.color_for(&breakdown.activity_type),
                breakdown,
            })
            .collect()
    }
}

/// Splits a line into words, keeping double quoted text together.
fn split_line(line: &str) -> Result<Vec<String>> {
    let mut words = vec![];
    let mut current = String::new();
    let mut quoted = false;
    let mut has_word = false;
    for c in line.chars() {
        match c {
            '"' => {
                quoted = !quoted;
                has_word = true;
            }
            c if c.is_whitespace() && !quoted => {
                if has_word {
                    words.push(std::mem::take(&mut current));
                    has_word = false;
                }
            }
            c => {
                current.push(c);
                has_word = true;
            }
        }
    }
    if quoted {
        bail!("Unclosed quote in \"{line}\"");
    }
    if has_word {
        words.push(current);
    }
    Ok(words)
}

pub fn parse_line(line: &str) -> Result<Parsed> {
    let words = split_line(line)?;
    match SessionLine::try_parse_from(words) {
        Ok(parsed) => Ok(Parsed::Command(parsed.command)),
        Err(e) => match e.kind() {
            clap::error::ErrorKind::DisplayHelp
            | clap::error::ErrorKind::DisplayHelpOnMissingArgumentOrSubcommand => {
                Ok(Parsed::Message(e.render().to_string()))
            }
            _ => Err(e.into()),
        },
    }
}
