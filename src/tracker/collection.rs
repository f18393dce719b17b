//! Aggregations over groups of [ActivityRecord]s.
//!
//! The master [ActivityCollection] owns every record. Anything narrower (a type filter, a single
//! day) is an [ActivityView] that borrows the master records, so they're never copied and a view
//! can't outlive a mutation of the tracker. All aggregate queries live on [ActivitySet] and work
//! the same way on every scope.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

use crate::utils::{
    clock::Clock,
    percentage::{duration_percentage, Percentage},
};

use super::{
    color::ActivityColor,
    record::{ActivityRecord, RecordId},
};

/// Time spent in one type next to the time spent in every type of the same scope, so a share can
/// be computed without another pass over the records.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TypeBreakdown {
    pub activity_type: Arc<str>,
    #[serde(rename = "duration_ms", with = "duration_ms")]
    pub duration: Duration,
    #[serde(rename = "total_ms", with = "duration_ms")]
    pub total: Duration,
}

impl TypeBreakdown {
    pub fn share(&self) -> Percentage {
        duration_percentage(self.duration, self.total)
    }
}

/// Queries shared by every scope of records.
pub trait ActivitySet {
    /// Records of the scope in collection order.
    fn records(&self) -> impl Iterator<Item = &ActivityRecord>;

    /// Instant ongoing records are measured up to.
    fn now(&self) -> DateTime<Utc>;

    fn len(&self) -> usize {
        self.records().count()
    }

    fn is_empty(&self) -> bool {
        self.records().next().is_none()
    }

    /// Types appearing in the scope, each once, in order of first occurrence.
    fn distinct_types(&self) -> Vec<Arc<str>> {
        let mut types: Vec<Arc<str>> = vec![];
        for record in self.records() {
            if !types.contains(record.activity_type()) {
                types.push(record.activity_type().clone());
            }
        }
        types
    }

    fn total_duration(&self) -> Duration {
        self.total_duration_at(self.now())
    }

    /// Total with ongoing records measured up to `now`.
    fn total_duration_at(&self, now: DateTime<Utc>) -> Duration {
        self.records()
            .fold(Duration::zero(), |total, record| total + record.duration_at(now))
    }

    fn duration_for_type(&self, activity_type: &str) -> Duration {
        self.duration_for_type_at(activity_type, self.now())
    }

    fn duration_for_type_at(&self, activity_type: &str, now: DateTime<Utc>) -> Duration {
        self.records()
            .filter(|record| &**record.activity_type() == activity_type)
            .fold(Duration::zero(), |total, record| total + record.duration_at(now))
    }

    /// One entry per distinct type, in [ActivitySet::distinct_types] order.
    fn breakdown_by_type(&self) -> Vec<TypeBreakdown> {
        self.breakdown_by_type_at(self.now())
    }

    /// Breakdown where the entries and the total they carry are all measured up to `now`, so the
    /// entries always sum to the total.
    fn breakdown_by_type_at(&self, now: DateTime<Utc>) -> Vec<TypeBreakdown> {
        let total = self.total_duration_at(now);
        self.distinct_types()
            .into_iter()
            .map(|activity_type| TypeBreakdown {
                duration: self.duration_for_type_at(&activity_type, now),
                activity_type,
                total,
            })
            .collect()
    }

    /// First ongoing record of the type in collection order. Well formed data holds at most one.
    fn currently_ongoing(&self, activity_type: &str) -> Option<&ActivityRecord> {
        self.records()
            .find(|record| record.is_ongoing() && &**record.activity_type() == activity_type)
    }

    fn is_engaged_in(&self, activity_type: &str) -> bool {
        self.currently_ongoing(activity_type).is_some()
    }

    fn ongoing(&self) -> Vec<&ActivityRecord> {
        self.records().filter(|record| record.is_ongoing()).collect()
    }

    /// Color by the type's position among this scope's distinct types. The same type can get a
    /// different color in another scope; [Tracker::color_for](super::Tracker::color_for) is stable.
    fn positional_color_for(&self, activity_type: &str) -> Option<ActivityColor> {
        self.distinct_types()
            .iter()
            .position(|v| &**v == activity_type)
            .and_then(ActivityColor::from_position)
    }
}

/// The collection of record. Keeps records in insertion order and hands out ids.
#[derive(Debug, Default)]
pub struct ActivityCollection {
    records: Vec<ActivityRecord>,
    next_id: u64,
}

impl ActivityCollection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a new record and returns its id.
    pub fn push(
        &mut self,
        activity_type: Arc<str>,
        start: DateTime<Utc>,
        end: Option<DateTime<Utc>>,
    ) -> RecordId {
        let id = RecordId::new(self.next_id);
        self.next_id += 1;
        self.records
            .push(ActivityRecord::new(id, activity_type, start, end));
        id
    }

    pub fn get(&self, id: RecordId) -> Option<&ActivityRecord> {
        self.records.iter().find(|record| record.id() == id)
    }

    pub fn get_mut(&mut self, id: RecordId) -> Option<&mut ActivityRecord> {
        self.records.iter_mut().find(|record| record.id() == id)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ActivityRecord> {
        self.records.iter()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Earliest start across every record, which isn't necessarily the first one inserted.
    pub fn earliest_start(&self) -> Option<DateTime<Utc>> {
        self.records.iter().map(ActivityRecord::start).min()
    }
}

/// A borrowed scope over some of the master records.
pub struct ActivityView<'a> {
    records: Vec<&'a ActivityRecord>,
    clock: &'a dyn Clock,
}

impl<'a> ActivityView<'a> {
    pub fn new(records: impl IntoIterator<Item = &'a ActivityRecord>, clock: &'a dyn Clock) -> Self {
        Self {
            records: records.into_iter().collect(),
            clock,
        }
    }

    pub fn empty(clock: &'a dyn Clock) -> Self {
        Self {
            records: vec![],
            clock,
        }
    }

    pub(crate) fn push(&mut self, record: &'a ActivityRecord) {
        self.records.push(record);
    }
}

impl ActivitySet for ActivityView<'_> {
    fn records(&self) -> impl Iterator<Item = &ActivityRecord> {
        self.records.iter().map(|record| &**record)
    }

    fn now(&self) -> DateTime<Utc> {
        self.clock.time()
    }

    fn len(&self) -> usize {
        self.records.len()
    }
}

pub(crate) mod duration_ms {
    use chrono::Duration;
    use serde::Serializer;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_i64(duration.num_milliseconds())
    }
}
