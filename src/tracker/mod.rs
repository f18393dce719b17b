//! The tracking core. A [Tracker] owns every [ActivityRecord] of a session and answers
//! aggregate questions about them: time per type, time per day and which activities are going on.

pub mod collection;
pub mod color;
pub mod day;
pub mod error;
pub mod record;

use std::sync::Arc;

use chrono::{DateTime, Local, NaiveDate, TimeZone, Utc};
use tracing::{debug, info, instrument, warn};

use crate::utils::{
    clock::{Clock, DefaultClock},
    time::{day_of, next_day},
};

use collection::{ActivityCollection, ActivityView};
use color::ActivityColor;
use day::DayBucket;
use error::TrackerError;
use record::{ActivityRecord, RecordId};

pub const DEFAULT_CATALOG: [&str; 6] = [
    "reading",
    "writing",
    "coding",
    "exercise",
    "resting",
    "socializing",
];

#[derive(Debug, Clone)]
pub struct TrackerConfig {
    /// Recognized activity types. The order decides which color a type gets.
    pub catalog: Vec<String>,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            catalog: DEFAULT_CATALOG.iter().map(|v| v.to_string()).collect(),
        }
    }
}

/// What [Tracker::toggle_activity] ended up doing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Toggle {
    Began(RecordId),
    Ended(RecordId),
}

pub struct Tracker {
    catalog: Vec<Arc<str>>,
    activities: ActivityCollection,
    clock: Box<dyn Clock>,
}

impl Tracker {
    pub fn new(config: TrackerConfig) -> Result<Self, TrackerError> {
        Self::with_clock(config, Box::new(DefaultClock))
    }

    pub fn with_clock(config: TrackerConfig, clock: Box<dyn Clock>) -> Result<Self, TrackerError> {
        let mut catalog: Vec<Arc<str>> = vec![];
        for activity_type in config.catalog {
            let activity_type = activity_type.trim();
            if activity_type.is_empty() || catalog.iter().any(|v| &**v == activity_type) {
                continue;
            }
            catalog.push(activity_type.into());
        }
        if catalog.is_empty() {
            return Err(TrackerError::EmptyCatalog);
        }
        debug!("Tracker catalog {catalog:?}");
        Ok(Self {
            catalog,
            activities: ActivityCollection::new(),
            clock,
        })
    }

    pub fn catalog(&self) -> &[Arc<str>] {
        &self.catalog
    }

    pub fn clock(&self) -> &dyn Clock {
        self.clock.as_ref()
    }

    pub fn activities(&self) -> &ActivityCollection {
        &self.activities
    }

    pub fn record(&self, id: RecordId) -> Option<&ActivityRecord> {
        self.activities.get(id)
    }

    /// Starts an activity of the given type now. Only one activity of a type can go on at a time.
    #[instrument(skip(self))]
    pub fn begin_activity(&mut self, activity_type: &str) -> Result<RecordId, TrackerError> {
        if let Some(ongoing) = self.ongoing_record_for(activity_type) {
            warn!("{activity_type} is already going on since {}", ongoing.start());
            return Err(TrackerError::AlreadyEngaged(ongoing.activity_type().clone()));
        }
        let now = self.clock.time();
        let interned = self.intern(activity_type);
        let id = self.activities.push(interned, now, None);
        info!("Began {activity_type} {id}");
        Ok(id)
    }

    /// Ends the ongoing activity of the given type. Returns `None` when nothing of that type is
    /// going on.
    #[instrument(skip(self))]
    pub fn end_activity(&mut self, activity_type: &str) -> Option<RecordId> {
        let Some(id) = self.ongoing_record_for(activity_type).map(ActivityRecord::id) else {
            warn!("Nothing to end, {activity_type} isn't going on");
            return None;
        };
        let now = self.clock.time();
        let record = self.activities.get_mut(id)?;
        record.end_at(now);
        info!("Ended {activity_type} {id} after {}", record.duration_at(now));
        Some(id)
    }

    pub fn toggle_activity(&mut self, activity_type: &str) -> Result<Toggle, TrackerError> {
        match self.end_activity_if_engaged(activity_type) {
            Some(id) => Ok(Toggle::Ended(id)),
            None => self.begin_activity(activity_type).map(Toggle::Began),
        }
    }

    fn end_activity_if_engaged(&mut self, activity_type: &str) -> Option<RecordId> {
        if self.is_engaged_in(activity_type) {
            self.end_activity(activity_type)
        } else {
            None
        }
    }

    /// Adds an activity that happened in the past. Leaving out `end` adds it as still going on.
    #[instrument(skip(self))]
    pub fn record_activity(
        &mut self,
        activity_type: &str,
        start: DateTime<Utc>,
        end: Option<DateTime<Utc>>,
    ) -> Result<RecordId, TrackerError> {
        if end.is_some_and(|end| end < start) {
            return Err(TrackerError::EndBeforeStart);
        }
        let interned = self.intern(activity_type);
        let id = self.activities.push(interned, start, end);
        info!("Recorded {activity_type} {id}");
        Ok(id)
    }

    #[instrument(skip(self))]
    pub fn reclassify(&mut self, id: RecordId, new_type: &str) -> Result<(), TrackerError> {
        let new_type = self.intern(new_type);
        let record = self
            .activities
            .get_mut(id)
            .ok_or(TrackerError::UnknownRecord(id))?;
        info!("Reclassified {id} from {} to {new_type}", record.activity_type());
        record.change_type(new_type);
        Ok(())
    }

    /// Catalog entries are shared instead of allocating a new string per record.
    fn intern(&self, activity_type: &str) -> Arc<str> {
        self.catalog
            .iter()
            .find(|v| &***v == activity_type)
            .cloned()
            .unwrap_or_else(|| activity_type.into())
    }

    /// Every record, in the order they were added.
    pub fn history(&self) -> ActivityView<'_> {
        ActivityView::new(self.activities.iter(), self.clock())
    }

    /// Records of the given types only.
    pub fn only(&self, types: &[&str]) -> ActivityView<'_> {
        ActivityView::new(
            self.activities
                .iter()
                .filter(|record| accepts(types, record)),
            self.clock(),
        )
    }

    pub fn ongoing_record_for(&self, activity_type: &str) -> Option<&ActivityRecord> {
        self.activities
            .iter()
            .find(|record| record.is_ongoing() && &**record.activity_type() == activity_type)
    }

    pub fn is_engaged_in(&self, activity_type: &str) -> bool {
        self.ongoing_record_for(activity_type).is_some()
    }

    /// Color of a type by its catalog position. Types outside the catalog, or past its sixth
    /// entry, have none.
    pub fn color_for(&self, activity_type: &str) -> Option<ActivityColor> {
        self.catalog
            .iter()
            .position(|v| &**v == activity_type)
            .and_then(ActivityColor::from_position)
    }

    pub fn first_activity_start(&self) -> Result<DateTime<Utc>, TrackerError> {
        self.activities
            .earliest_start()
            .ok_or(TrackerError::EmptyHistory)
    }

    /// [Tracker::group_by_day_in] using the local time zone.
    pub fn group_by_day(
        &self,
        only: Option<&[&str]>,
    ) -> Result<Vec<DayBucket<'_>>, TrackerError> {
        self.group_by_day_in(&Local, only)
    }

    /// Splits records into consecutive calendar days, from the day of the earliest record up to
    /// today. Days without records get an empty bucket. The first day is always taken from the
    /// whole history, so different type filters produce buckets for the same days.
    #[instrument(skip(self, tz, only))]
    pub fn group_by_day_in<Tz: TimeZone>(
        &self,
        tz: &Tz,
        only: Option<&[&str]>,
    ) -> Result<Vec<DayBucket<'_>>, TrackerError> {
        let first_day = day_of(self.first_activity_start()?.with_timezone(tz));
        let today = day_of(self.clock.time().with_timezone(tz));

        let mut buckets = vec![DayBucket::new(first_day, self.clock())];
        for record in self.activities.iter() {
            if only.is_some_and(|types| !accepts(types, record)) {
                continue;
            }
            let index = (record.start_day(tz) - first_day).num_days() as usize;
            self.extend_days(&mut buckets, index);
            buckets[index].push(record);
        }

        let until_today = (today - first_day).num_days();
        if until_today > 0 {
            self.extend_days(&mut buckets, until_today as usize);
        }

        debug!(
            "Grouped {} records into {} days starting {first_day}",
            self.activities.len(),
            buckets.len()
        );
        Ok(buckets)
    }

    /// Bucket for a single day. `None` when the day is outside of the grouped range.
    pub fn day_in<Tz: TimeZone>(
        &self,
        tz: &Tz,
        day: NaiveDate,
        only: Option<&[&str]>,
    ) -> Result<Option<DayBucket<'_>>, TrackerError> {
        Ok(self
            .group_by_day_in(tz, only)?
            .into_iter()
            .find(|bucket| bucket.day() == day))
    }

    /// Appends days until a bucket exists at `index`.
    fn extend_days<'a>(&'a self, buckets: &mut Vec<DayBucket<'a>>, index: usize) {
        while buckets.len() <= index {
            let last = buckets[buckets.len() - 1].day();
            buckets.push(DayBucket::new(next_day(last), self.clock()));
        }
    }
}

fn accepts(types: &[&str], record: &ActivityRecord) -> bool {
    types.iter().any(|v| *v == &**record.activity_type())
}

#[cfg(test)]
mod tests {
    use chrono::{DateTime, Duration, FixedOffset, NaiveDate, TimeZone, Utc};

    use crate::utils::{
        clock::{Clock, ManualClock},
        logging::TEST_LOGGING,
    };

    use super::{
        collection::ActivitySet, color::ActivityColor, error::TrackerError, Toggle, Tracker,
        TrackerConfig,
    };

    fn at(day: u32, hour: u32, minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2016, 4, day, hour, minute, 0).unwrap()
    }

    fn date(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2016, 4, day).unwrap()
    }

    fn tracker_at(now: DateTime<Utc>) -> (Tracker, ManualClock) {
        *TEST_LOGGING;
        let clock = ManualClock::new(now);
        let tracker = Tracker::with_clock(TrackerConfig::default(), Box::new(clock.clone())).unwrap();
        (tracker, clock)
    }

    /// Reading and writing on the 23rd, reading again on the 24th.
    fn two_days(now: DateTime<Utc>) -> (Tracker, ManualClock) {
        let (mut tracker, clock) = tracker_at(now);
        tracker
            .record_activity("reading", at(23, 13, 15), Some(at(23, 14, 15)))
            .unwrap();
        tracker
            .record_activity("writing", at(23, 19, 35), Some(at(23, 21, 22)))
            .unwrap();
        tracker
            .record_activity("reading", at(24, 9, 35), Some(at(24, 11, 22)))
            .unwrap();
        (tracker, clock)
    }

    #[test]
    fn groups_records_by_day() {
        let (tracker, _) = two_days(at(24, 23, 0));

        let days = tracker.group_by_day_in(&Utc, None).unwrap();

        assert_eq!(days.len(), 2);
        assert_eq!(days[0].day(), date(23));
        assert_eq!(days[0].len(), 2);
        assert_eq!(days[0].total_duration().num_milliseconds(), 10_020_000);
        assert_eq!(days[1].day(), date(24));
        assert_eq!(days[1].len(), 1);
        assert_eq!(days[1].total_duration().num_milliseconds(), 6_420_000);
    }

    #[test]
    fn days_reach_today_without_gaps() {
        let (mut tracker, _) = two_days(at(30, 8, 0));
        tracker
            .record_activity("coding", at(27, 10, 0), Some(at(27, 11, 0)))
            .unwrap();

        let days = tracker.group_by_day_in(&Utc, None).unwrap();

        assert_eq!(days.first().unwrap().day(), date(23));
        assert_eq!(days.last().unwrap().day(), date(30));
        for pair in days.windows(2) {
            assert_eq!(pair[1].day() - pair[0].day(), Duration::days(1));
        }
        let empty = days.iter().filter(|day| day.is_empty()).count();
        assert_eq!(empty, 5);
        assert_eq!(days[4].day(), date(27));
        assert_eq!(days[4].len(), 1);
    }

    #[test]
    fn every_record_lands_in_its_own_day_once() {
        let (mut tracker, _) = two_days(at(26, 8, 0));
        // Out of chronological order on purpose.
        tracker
            .record_activity("coding", at(23, 8, 0), Some(at(23, 9, 0)))
            .unwrap();

        let days = tracker.group_by_day_in(&Utc, None).unwrap();

        let placed: usize = days.iter().map(|day| day.len()).sum();
        assert_eq!(placed, tracker.activities().len());
        for day in &days {
            for record in day.records() {
                assert_eq!(record.start_day(&Utc), day.day());
            }
        }
        let first_day_types = days[0].distinct_types();
        assert_eq!(
            first_day_types.iter().map(|v| &**v).collect::<Vec<_>>(),
            vec!["reading", "writing", "coding"]
        );
    }

    #[test]
    fn filtered_days_stay_aligned_with_history() {
        let (tracker, _) = two_days(at(25, 8, 0));

        let writing = tracker.group_by_day_in(&Utc, Some(&["writing"][..])).unwrap();
        let reading = tracker.group_by_day_in(&Utc, Some(&["reading"][..])).unwrap();
        let nothing = tracker.group_by_day_in(&Utc, Some(&["sleeping"][..])).unwrap();

        assert_eq!(writing.len(), 3);
        assert_eq!(writing[0].day(), date(23));
        assert_eq!(writing[0].len(), 1);
        assert!(writing[1].is_empty());
        assert_eq!(reading.len(), 3);
        assert_eq!(reading[1].duration_for_type("reading"), Duration::minutes(107));
        assert_eq!(nothing.len(), 3);
        assert!(nothing.iter().all(|day| day.is_empty()));
    }

    #[test]
    fn days_follow_the_time_zone() {
        let (tracker, _) = two_days(at(24, 12, 0));
        let west = FixedOffset::west_opt(10 * 3600).unwrap();

        // 09:35 UTC on the 24th is still the 23rd ten hours west.
        let days = tracker.group_by_day_in(&west, None).unwrap();

        assert_eq!(days[0].day(), date(23));
        assert_eq!(days[0].len(), 3);
        assert_eq!(days.len(), 2);
        assert!(days[1].is_empty());
    }

    #[test]
    fn empty_history_is_an_error() {
        let (tracker, _) = tracker_at(at(24, 12, 0));

        assert_eq!(
            tracker.group_by_day_in(&Utc, None).err(),
            Some(TrackerError::EmptyHistory)
        );
        assert_eq!(tracker.first_activity_start(), Err(TrackerError::EmptyHistory));
    }

    #[test]
    fn single_day_lookup() {
        let (tracker, _) = two_days(at(26, 12, 0));

        let day = tracker.day_in(&Utc, date(24), None).unwrap().unwrap();
        assert_eq!(day.len(), 1);
        assert!(tracker.day_in(&Utc, date(25), None).unwrap().unwrap().is_empty());
        assert!(tracker.day_in(&Utc, date(22), None).unwrap().is_none());
        assert!(tracker.day_in(&Utc, date(27), None).unwrap().is_none());
    }

    #[test]
    fn begin_and_end_activity() {
        let (mut tracker, clock) = tracker_at(at(24, 12, 0));

        let id = tracker.begin_activity("writing").unwrap();
        assert!(tracker.is_engaged_in("writing"));
        assert!(tracker.history().is_engaged_in("writing"));

        clock.advance(Duration::minutes(30));
        assert_eq!(tracker.history().total_duration(), Duration::minutes(30));

        assert_eq!(tracker.end_activity("writing"), Some(id));
        assert!(!tracker.is_engaged_in("writing"));
        let frozen = tracker.record(id).unwrap().duration_at(clock.time());

        clock.advance(Duration::hours(2));
        assert_eq!(tracker.record(id).unwrap().duration_at(clock.time()), frozen);
        assert_eq!(tracker.history().duration_for_type("writing"), Duration::minutes(30));
    }

    #[test]
    fn ongoing_duration_keeps_growing() {
        let (mut tracker, clock) = tracker_at(at(24, 12, 0));
        tracker.begin_activity("reading").unwrap();

        let mut previous = tracker.history().total_duration();
        for _ in 0..3 {
            clock.advance(Duration::seconds(1));
            let next = tracker.history().total_duration();
            assert!(next >= previous);
            previous = next;
        }
        assert_eq!(previous, Duration::seconds(3));
    }

    #[test]
    fn second_begin_is_rejected() {
        let (mut tracker, _) = tracker_at(at(24, 12, 0));
        tracker.begin_activity("reading").unwrap();

        assert_eq!(
            tracker.begin_activity("reading"),
            Err(TrackerError::AlreadyEngaged("reading".into()))
        );
        assert_eq!(tracker.history().ongoing().len(), 1);
        assert!(tracker.begin_activity("writing").is_ok());
    }

    #[test]
    fn ending_idle_type_does_nothing() {
        let (mut tracker, _) = two_days(at(24, 12, 0));
        assert_eq!(tracker.end_activity("reading"), None);
        assert_eq!(tracker.end_activity("juggling"), None);
    }

    #[test]
    fn toggle_switches_state() {
        let (mut tracker, clock) = tracker_at(at(24, 12, 0));

        let Toggle::Began(id) = tracker.toggle_activity("coding").unwrap() else {
            panic!("coding should have begun");
        };
        clock.advance(Duration::minutes(5));
        assert_eq!(tracker.toggle_activity("coding").unwrap(), Toggle::Ended(id));
        assert!(matches!(
            tracker.toggle_activity("coding").unwrap(),
            Toggle::Began(next) if next != id
        ));
    }

    #[test]
    fn reclassify_moves_time_between_types() {
        let (mut tracker, _) = two_days(at(24, 12, 0));
        let id = tracker.history().records().next().unwrap().id();

        tracker.reclassify(id, "coding").unwrap();

        let history = tracker.history();
        assert_eq!(history.duration_for_type("coding"), Duration::hours(1));
        assert_eq!(history.duration_for_type("reading"), Duration::minutes(107));
        assert_eq!(&*history.distinct_types()[0], "coding");
    }

    #[test]
    fn reclassify_unknown_record() {
        let (mut tracker, _) = two_days(at(24, 12, 0));
        let id = "#99".parse().unwrap();
        assert_eq!(tracker.reclassify(id, "coding"), Err(TrackerError::UnknownRecord(id)));
    }

    #[test]
    fn record_with_reversed_interval_is_rejected() {
        let (mut tracker, _) = tracker_at(at(24, 12, 0));
        assert_eq!(
            tracker.record_activity("reading", at(23, 14, 0), Some(at(23, 13, 0))),
            Err(TrackerError::EndBeforeStart)
        );
        assert!(tracker.activities().is_empty());
    }

    #[test]
    fn catalog_colors_are_stable_across_scopes() {
        let (tracker, _) = two_days(at(24, 12, 0));

        assert_eq!(tracker.color_for("reading"), Some(ActivityColor::Rose));
        assert_eq!(tracker.color_for("writing"), Some(ActivityColor::Mint));
        assert_eq!(tracker.color_for("juggling"), None);

        // Positional colors shift with the scope, catalog colors don't.
        let writing_only = tracker.only(&["writing"]);
        assert_eq!(writing_only.positional_color_for("writing"), Some(ActivityColor::Rose));
        assert_eq!(tracker.color_for("writing"), Some(ActivityColor::Mint));
    }

    #[test]
    fn catalog_beyond_six_has_no_color() {
        let config = TrackerConfig {
            catalog: ["a", "b", "c", "d", "e", "f", "g", "a", " "]
                .iter()
                .map(|v| v.to_string())
                .collect(),
        };
        let tracker = Tracker::with_clock(config, Box::new(ManualClock::new(at(24, 12, 0)))).unwrap();

        assert_eq!(tracker.catalog().len(), 7);
        assert_eq!(tracker.color_for("f"), Some(ActivityColor::Aqua));
        assert_eq!(tracker.color_for("g"), None);
    }

    #[test]
    fn empty_catalog_is_rejected() {
        let config = TrackerConfig { catalog: vec![] };
        assert!(matches!(
            Tracker::with_clock(config, Box::new(ManualClock::new(at(24, 12, 0)))),
            Err(TrackerError::EmptyCatalog)
        ));
    }

    #[test]
    fn breakdown_partitions_total() {
        let (mut tracker, clock) = two_days(at(24, 12, 0));
        tracker.begin_activity("coding").unwrap();
        clock.advance(Duration::minutes(20));

        let history = tracker.history();
        let breakdown = history.breakdown_by_type();
        let total = history.total_duration();

        let sum = breakdown
            .iter()
            .fold(Duration::zero(), |acc, entry| acc + entry.duration);
        assert_eq!(sum, total);
        assert_eq!(total, Duration::minutes(60 + 107 + 107 + 20));
    }
}
