use std::sync::Arc;

use chrono::Weekday;

use crate::shared::{
    geo::Coordinate,
    geohash::Cell,
    time::{Duration, ServiceDate, Time},
};

pub const DAYS_IN_WEEK: usize = 7;

/// A physical point where passengers can board or alight from a vehicle.
#[derive(Debug, Clone)]
pub struct Stop {
    /// The dense internal index used for O(1) array lookups in the repository.
    pub index: u32,
    /// Unique external identifier for the stop.
    pub id: Arc<str>,
    /// Human-readable name (e.g., "Main St & 4th Ave").
    pub name: Arc<str>,
    pub coordinate: Coordinate,
    /// The geohash bucket this stop is indexed under.
    pub cell: Cell,
}

/// One call of a trip at a stop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StopVisit {
    pub stop_idx: u32,
    /// The order of this visit within the trip, unique and ascending per trip.
    pub sequence: u32,
    pub arrival_time: Time,
    pub departure_time: Time,
}

/// Metadata describing a contiguous range within a flat array.
#[derive(Default, Debug, Clone, Copy, PartialEq, Eq)]
pub struct Slice {
    pub start_idx: u32,
    pub count: u32,
}

impl Slice {
    pub fn range(&self) -> std::ops::Range<usize> {
        self.start_idx as usize..(self.start_idx + self.count) as usize
    }
}

/// A specific journey taken by a vehicle through a sequence of stops.
#[derive(Debug, Clone)]
pub struct Trip {
    pub index: u32,
    pub id: Arc<str>,
    /// Pointer to the [`Service`] calendar entry.
    pub service_idx: u32,
    /// Display label of the line or operator, e.g. "29" or "Herzliya - Jerusalem".
    pub line_name: Arc<str>,
    /// Range of this trip's visits inside `Repository::stop_visits`, sorted by sequence.
    pub visits: Slice,
}

/// A calendar entry: the weekdays a service runs on and its validity window.
#[derive(Debug, Clone)]
pub struct Service {
    pub index: u32,
    pub id: Arc<str>,
    /// Indexed by days from Monday.
    pub weekdays: [bool; DAYS_IN_WEEK],
    pub start_date: ServiceDate,
    pub end_date: ServiceDate,
}

impl Service {
    pub fn runs_on(&self, weekday: Weekday) -> bool {
        self.weekdays[weekday.num_days_from_monday() as usize]
    }

    pub fn covers(&self, date: ServiceDate) -> bool {
        self.start_date <= date && date <= self.end_date
    }
}

/// A trip as listed in a pattern's weekday timetable.
#[derive(Debug, Clone)]
pub struct PatternTrip {
    pub trip_idx: u32,
    pub start_date: ServiceDate,
    pub end_date: ServiceDate,
    pub line_name: Arc<str>,
}

impl PatternTrip {
    pub fn is_active(&self, date: ServiceDate) -> bool {
        self.start_date <= date && date <= self.end_date
    }
}

/// A stop of a pattern together with its position in operational order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct PatternStop {
    pub stop_idx: u32,
    pub position: u32,
}

/// All trips sharing one exact ordered sequence of `(stop, sequence)` pairs.
///
/// This is what RAPTOR calls a route. Unlike a GTFS route, every trip of a
/// pattern visits exactly the same stops in the same order, so a position
/// along the pattern is also a position inside each trip's visit list.
#[derive(Debug, Clone)]
pub struct Pattern {
    pub index: u32,
    /// Stops in operational order.
    pub stops: Arc<[u32]>,
    /// The same stops sorted by stop index, for position lookups.
    pub stops_by_idx: Arc<[PatternStop]>,
    /// Per weekday (from Monday) the trips running that day, sorted by
    /// departure at the first stop.
    pub trips: [Arc<[PatternTrip]>; DAYS_IN_WEEK],
}

impl Pattern {
    pub fn trips_on(&self, weekday: Weekday) -> &[PatternTrip] {
        &self.trips[weekday.num_days_from_monday() as usize]
    }

    /// Earliest position of `stop_idx` along the pattern.
    pub fn position_of(&self, stop_idx: u32) -> Option<u32> {
        let idx = self
            .stops_by_idx
            .partition_point(|stop| stop.stop_idx < stop_idx);
        self.stops_by_idx
            .get(idx)
            .filter(|stop| stop.stop_idx == stop_idx)
            .map(|stop| stop.position)
    }
}

/// A walking edge to another stop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Footpath {
    pub to_stop_idx: u32,
    pub duration: Duration,
}
