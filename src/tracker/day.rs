use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Offset, TimeZone, Utc};

use crate::utils::clock::Clock;

use super::{
    collection::{ActivitySet, ActivityView},
    record::ActivityRecord,
};

/// Records that started on one calendar day.
pub struct DayBucket<'a> {
    day: NaiveDate,
    activities: ActivityView<'a>,
}

impl<'a> DayBucket<'a> {
    pub(crate) fn new(day: NaiveDate, clock: &'a dyn Clock) -> Self {
        Self {
            day,
            activities: ActivityView::empty(clock),
        }
    }

    pub fn day(&self) -> NaiveDate {
        self.day
    }

    /// First instant of the day in `tz`. When a daylight saving jump skips midnight that's the
    /// instant clocks jump to.
    pub fn midnight<Tz: TimeZone>(&self, tz: &Tz) -> DateTime<Tz> {
        let local = self.day.and_time(NaiveTime::MIN);
        if let Some(midnight) = tz.from_local_datetime(&local).earliest() {
            return midnight;
        }
        // Local midnight falls in a gap. Reading it with the offset in force before the gap lands
        // on the end of the gap.
        let before = tz.offset_from_utc_datetime(&(local - Duration::days(1))).fix();
        tz.from_utc_datetime(&(local - before))
    }

    pub(crate) fn push(&mut self, record: &'a ActivityRecord) {
        self.activities.push(record);
    }

    /// Drops the day identity, keeping the records.
    pub fn into_view(self) -> ActivityView<'a> {
        self.activities
    }
}

impl ActivitySet for DayBucket<'_> {
    fn records(&self) -> impl Iterator<Item = &ActivityRecord> {
        self.activities.records()
    }

    fn now(&self) -> DateTime<Utc> {
        self.activities.now()
    }

    fn len(&self) -> usize {
        self.activities.len()
    }
}
