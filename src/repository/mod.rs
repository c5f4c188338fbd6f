mod builder;
mod entities;
mod footpaths;
mod source;

pub use builder::*;
pub use entities::*;

use crate::{
    raptor::Raptor,
    shared::{Cell, Coordinate, Time},
};
use std::{collections::HashMap, sync::Arc};

/// The immutable transit network: stops, trips, calendars, patterns and footpaths.
///
/// Built once per timetable snapshot by [`RepositoryBuilder`] and only read
/// afterwards, so it can be shared by reference between concurrent queries.
#[derive(Debug, Clone, Default)]
pub struct Repository {
    pub stops: Box<[Stop]>,
    pub trips: Box<[Trip]>,
    pub services: Box<[Service]>,
    pub patterns: Box<[Pattern]>,
    /// All trip visits, each trip owning a contiguous [`Slice`].
    pub stop_visits: Box<[StopVisit]>,

    pub(crate) config: BuildConfig,
    pub(crate) issues: Box<[BuildIssue]>,

    // Lookups
    pub(crate) stop_lookup: HashMap<Arc<str>, u32>,
    pub(crate) trip_lookup: HashMap<Arc<str>, u32>,
    pub(crate) cell_to_stops: HashMap<Cell, Box<[u32]>>,
    pub(crate) stop_to_patterns: Box<[Box<[u32]>]>,
    pub(crate) trip_to_pattern: Box<[u32]>,
    pub(crate) stop_to_footpaths: Box<[Box<[Footpath]>]>,
}

impl Repository {
    pub fn builder() -> RepositoryBuilder {
        RepositoryBuilder::new()
    }

    pub fn config(&self) -> &BuildConfig {
        &self.config
    }

    /// Records that were skipped while building.
    pub fn issues(&self) -> &[BuildIssue] {
        &self.issues
    }

    /// Get a stop with the given external id.
    pub fn stop_by_id(&self, id: &str) -> Option<&Stop> {
        let stop_idx = self.stop_lookup.get(id)?;
        Some(&self.stops[*stop_idx as usize])
    }

    /// Get a trip with the given external id.
    pub fn trip_by_id(&self, id: &str) -> Option<&Trip> {
        let trip_idx = self.trip_lookup.get(id)?;
        Some(&self.trips[*trip_idx as usize])
    }

    /// Returns the visits of a trip ordered by sequence.
    #[inline(always)]
    pub fn visits_by_trip_idx(&self, trip_idx: u32) -> &[StopVisit] {
        let trip = &self.trips[trip_idx as usize];
        &self.stop_visits[trip.visits.range()]
    }

    /// The pattern a trip was grouped into.
    pub fn pattern_by_trip_idx(&self, trip_idx: u32) -> Option<&Pattern> {
        let pattern_idx = self.trip_to_pattern.get(trip_idx as usize)?;
        self.patterns.get(*pattern_idx as usize)
    }

    /// Patterns serving a stop.
    pub fn patterns_by_stop_idx(&self, stop_idx: u32) -> Vec<&Pattern> {
        self.pattern_idxs_by_stop_idx(stop_idx)
            .iter()
            .map(|pattern_idx| &self.patterns[*pattern_idx as usize])
            .collect()
    }

    #[inline(always)]
    pub(crate) fn pattern_idxs_by_stop_idx(&self, stop_idx: u32) -> &[u32] {
        self.stop_to_patterns
            .get(stop_idx as usize)
            .map(|patterns| patterns.as_ref())
            .unwrap_or_default()
    }

    /// Walking edges leaving a stop.
    #[inline(always)]
    pub fn footpaths_by_stop_idx(&self, stop_idx: u32) -> &[Footpath] {
        self.stop_to_footpaths
            .get(stop_idx as usize)
            .map(|footpaths| footpaths.as_ref())
            .unwrap_or_default()
    }

    pub fn stop_idx_has_patterns(&self, stop_idx: u32) -> bool {
        !self.pattern_idxs_by_stop_idx(stop_idx).is_empty()
    }

    pub fn departure_time(&self, trip_idx: u32, position: usize) -> Time {
        self.visits_by_trip_idx(trip_idx)[position].departure_time
    }

    pub fn arrival_time(&self, trip_idx: u32, position: usize) -> Time {
        self.visits_by_trip_idx(trip_idx)[position].arrival_time
    }

    /// Starts a journey query between two coordinates.
    pub fn router(&'_ self, from: Coordinate, to: Coordinate) -> Raptor<'_> {
        Raptor::new(self, from, to)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::{Distance, ServiceDate};

    fn date(value: u32) -> ServiceDate {
        ServiceDate::from_yyyymmdd(value).unwrap()
    }

    fn time(value: &str) -> Time {
        Time::from_hms(value).unwrap()
    }

    fn visits(stops: &[(&str, u32, &str)]) -> Vec<TripVisit> {
        stops
            .iter()
            .map(|(stop, seq, at)| TripVisit::new(*stop, *seq, time(at), time(at)))
            .collect()
    }

    fn network() -> RepositoryBuilder {
        let mut builder = RepositoryBuilder::new();
        builder.add_stop("A", "Alpha", Coordinate::new(32.000, 34.800));
        builder.add_stop("B", "Bravo", Coordinate::new(32.010, 34.800));
        builder.add_stop("C", "Charlie", Coordinate::new(32.020, 34.800));
        builder.add_stop("D", "Delta", Coordinate::new(32.0005, 34.800));
        builder.add_service(
            "weekdays",
            [true, true, true, true, true, false, false],
            date(20250101),
            date(20251231),
        );
        builder.add_service(
            "sunday",
            [false, false, false, false, false, false, true],
            date(20250101),
            date(20251231),
        );
        builder
    }

    #[test]
    fn groups_trips_by_exact_sequence() {
        let mut builder = network();
        builder.add_trip(
            "t1",
            "weekdays",
            "1",
            visits(&[("A", 1, "08:10:00"), ("B", 2, "08:20:00"), ("C", 3, "08:30:00")]),
        );
        builder.add_trip(
            "t2",
            "weekdays",
            "1",
            visits(&[("A", 1, "08:00:00"), ("B", 2, "08:10:00"), ("C", 3, "08:20:00")]),
        );
        // Same stops, different sequence numbers: a different pattern.
        builder.add_trip(
            "t3",
            "weekdays",
            "1",
            visits(&[("A", 2, "09:00:00"), ("B", 3, "09:10:00"), ("C", 4, "09:20:00")]),
        );
        builder.add_trip(
            "t4",
            "sunday",
            "2",
            visits(&[("C", 1, "10:00:00"), ("A", 2, "10:30:00")]),
        );
        let repository = builder.build();

        assert_eq!(repository.patterns.len(), 3);
        let t1 = repository.trip_by_id("t1").unwrap().index;
        let t2 = repository.trip_by_id("t2").unwrap().index;
        let t3 = repository.trip_by_id("t3").unwrap().index;
        let pattern = repository.pattern_by_trip_idx(t1).unwrap();
        assert_eq!(pattern.index, repository.pattern_by_trip_idx(t2).unwrap().index);
        assert_ne!(pattern.index, repository.pattern_by_trip_idx(t3).unwrap().index);

        // Sorted by departure at the first stop.
        let monday: Vec<_> = pattern
            .trips_on(chrono::Weekday::Mon)
            .iter()
            .map(|trip| trip.trip_idx)
            .collect();
        assert_eq!(monday, vec![t2, t1]);
        assert!(pattern.trips_on(chrono::Weekday::Sun).is_empty());
    }

    #[test]
    fn pattern_trips_match_pattern_stops() {
        let mut builder = network();
        builder.add_trip(
            "t1",
            "weekdays",
            "1",
            visits(&[("A", 1, "08:10:00"), ("B", 2, "08:20:00")]),
        );
        builder.add_trip(
            "t2",
            "sunday",
            "1",
            visits(&[("B", 1, "08:10:00"), ("C", 2, "08:20:00")]),
        );
        builder.add_trip(
            "t3",
            "sunday",
            "1",
            visits(&[("A", 1, "08:10:00"), ("B", 2, "08:20:00")]),
        );
        let repository = builder.build();
        for pattern in repository.patterns.iter() {
            for day in pattern.trips.iter() {
                for pattern_trip in day.iter() {
                    let stops: Vec<_> = repository
                        .visits_by_trip_idx(pattern_trip.trip_idx)
                        .iter()
                        .map(|visit| visit.stop_idx)
                        .collect();
                    assert_eq!(stops.as_slice(), pattern.stops.as_ref());
                }
            }
        }
    }

    #[test]
    fn indexes_stops_to_patterns() {
        let mut builder = network();
        builder.add_trip(
            "t1",
            "weekdays",
            "1",
            visits(&[("A", 1, "08:10:00"), ("B", 2, "08:20:00")]),
        );
        builder.add_trip(
            "t2",
            "weekdays",
            "2",
            visits(&[("C", 1, "08:10:00"), ("B", 2, "08:20:00")]),
        );
        let repository = builder.build();
        let b = repository.stop_by_id("B").unwrap().index;
        let a = repository.stop_by_id("A").unwrap().index;
        let d = repository.stop_by_id("D").unwrap().index;
        assert_eq!(repository.patterns_by_stop_idx(b).len(), 2);
        assert_eq!(repository.patterns_by_stop_idx(a).len(), 1);
        assert!(!repository.stop_idx_has_patterns(d));
        let pattern = repository.patterns_by_stop_idx(a)[0];
        assert_eq!(pattern.position_of(b), Some(1));
        assert_eq!(pattern.position_of(d), None);
    }

    #[test]
    fn rejects_bad_trips() {
        let mut builder = network();
        assert!(builder
            .add_trip(
                "single",
                "weekdays",
                "1",
                visits(&[("A", 1, "08:00:00")]),
            )
            .is_none());
        assert!(builder
            .add_trip(
                "nocal",
                "holidays",
                "1",
                visits(&[("A", 1, "08:00:00"), ("B", 2, "08:10:00")]),
            )
            .is_none());
        assert!(builder
            .add_trip(
                "nostop",
                "weekdays",
                "1",
                visits(&[("A", 1, "08:00:00"), ("X", 2, "08:10:00")]),
            )
            .is_none());
        assert!(builder
            .add_trip(
                "dup",
                "weekdays",
                "1",
                visits(&[("A", 1, "08:00:00"), ("B", 1, "08:10:00")]),
            )
            .is_none());
        let repository = builder.build();
        assert!(repository.trips.is_empty());
        assert_eq!(repository.issues().len(), 4);
        assert!(matches!(repository.issues()[0], BuildIssue::DegenerateTrip { visits: 1, .. }));
        assert!(matches!(repository.issues()[1], BuildIssue::UnknownService { .. }));
        assert!(matches!(repository.issues()[2], BuildIssue::UnknownStop { .. }));
        assert!(matches!(
            repository.issues()[3],
            BuildIssue::DuplicateSequence { sequence: 1, .. }
        ));
    }

    #[test]
    fn duplicate_ids_keep_the_first_record() {
        let mut builder = network();
        let first = builder.stop_idx("B").unwrap();
        let again = builder.add_stop("B", "Bravo again", Coordinate::new(40.0, 10.0));
        assert_eq!(again, first);
        let service = builder.add_service(
            "weekdays",
            [true; 7],
            date(20240101),
            date(20241231),
        );
        assert_eq!(service, Some(0));
        assert_eq!(
            builder.issues(),
            &[
                BuildIssue::DuplicateStop("B".into()),
                BuildIssue::DuplicateService("weekdays".into()),
            ]
        );
        let repository = builder.build();
        assert_eq!(repository.stops.len(), 4);
        assert_eq!(repository.stop_by_id("B").unwrap().name.as_ref(), "Bravo");
    }

    #[test]
    fn builds_footpaths_within_threshold() {
        let mut builder = network();
        builder.add_trip(
            "t1",
            "weekdays",
            "1",
            visits(&[("A", 1, "08:10:00"), ("B", 2, "08:20:00")]),
        );
        let repository = builder.build();
        let a = repository.stop_by_id("A").unwrap().index;
        let d = repository.stop_by_id("D").unwrap().index;
        let c = repository.stop_by_id("C").unwrap().index;

        let footpaths = repository.footpaths_by_stop_idx(a);
        assert!(footpaths.iter().all(|footpath| footpath.to_stop_idx != a));
        let to_d = footpaths.iter().find(|footpath| footpath.to_stop_idx == d).unwrap();
        // ~55.6m at 1.111 m/s
        assert_eq!(to_d.duration.as_seconds(), 50);
        // B is ~1.1km away, C ~2.2km
        assert!(footpaths.iter().all(|footpath| footpath.to_stop_idx != c));
        assert_eq!(footpaths.len(), 1);

        let near = repository
            .footpaths_from_coordinate(&Coordinate::new(32.0, 34.8), Distance::from_meters(100.0));
        assert_eq!(near.len(), 2);
    }
}
