use std::{fmt::Display, str::FromStr, sync::Arc};

use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};
use serde::Serialize;

use crate::utils::time::day_of;

/// Opaque identifier of a record, unique within the tracker that created it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct RecordId(u64);

impl RecordId {
    pub(crate) fn new(value: u64) -> Self {
        Self(value)
    }
}

impl Display for RecordId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

impl FromStr for RecordId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim_start_matches('#').parse().map(RecordId)
    }
}

/// One span of engagement in an activity type. An absent `end` means the activity is still going
/// on and its duration grows with the clock.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActivityRecord {
    id: RecordId,
    activity_type: Arc<str>,
    start: DateTime<Utc>,
    end: Option<DateTime<Utc>>,
}

impl ActivityRecord {
    pub fn new(
        id: RecordId,
        activity_type: Arc<str>,
        start: DateTime<Utc>,
        end: Option<DateTime<Utc>>,
    ) -> Self {
        Self {
            id,
            activity_type,
            start,
            end,
        }
    }

    pub fn id(&self) -> RecordId {
        self.id
    }

    pub fn activity_type(&self) -> &Arc<str> {
        &self.activity_type
    }

    pub fn start(&self) -> DateTime<Utc> {
        self.start
    }

    pub fn end(&self) -> Option<DateTime<Utc>> {
        self.end
    }

    pub fn is_ongoing(&self) -> bool {
        self.end.is_none()
    }

    /// Stamps `now` as the end of the activity. Ending is done once: an already ended record keeps
    /// its end and `false` is returned.
    pub fn end_at(&mut self, now: DateTime<Utc>) -> bool {
        if self.end.is_some() {
            return false;
        }
        self.end = Some(now);
        true
    }

    pub fn change_type(&mut self, new_type: Arc<str>) {
        self.activity_type = new_type;
    }

    /// Time spent in the activity as of `now`. Ongoing records are measured up to `now`, so calling
    /// this again later yields a longer duration. Never negative.
    pub fn duration_at(&self, now: DateTime<Utc>) -> Duration {
        let end = self.end.unwrap_or(now);
        (end - self.start).max(Duration::zero())
    }

    /// Calendar day the record starts on, in the given time zone.
    pub fn start_day<Tz: TimeZone>(&self, tz: &Tz) -> NaiveDate {
        day_of(self.start.with_timezone(tz))
    }
}
