use tracing::trace;

use crate::{
    raptor::{self, state::SearchState},
    repository::{Footpath, Pattern, Repository},
    shared::{
        geo::{Coordinate, Distance},
        time::{Departure, Time},
    },
};

/// Footpaths from a coordinate to the stops around it.
///
/// Starts at `distance` and doubles it for every attempt that comes back
/// empty, so sparse areas still find a stop.
pub fn nearby_stops(
    repository: &Repository,
    coordinate: &Coordinate,
    distance: Distance,
    attempts: u32,
) -> Vec<Footpath> {
    let mut distance = distance;
    for attempt in 0..attempts.max(1) {
        let footpaths = repository.footpaths_from_coordinate(coordinate, distance);
        if !footpaths.is_empty() {
            return footpaths;
        }
        trace!(
            "No stops within {:.0}m of {coordinate} (attempt {})",
            distance.as_meters(),
            attempt + 1
        );
        distance = distance * 2.0;
    }
    Vec::new()
}

/// Fills `state.active` with the earliest marked position of every pattern
/// serving a marked stop, clears the marked set and returns the patterns to
/// scan in index order.
pub(crate) fn collect_patterns(
    repository: &Repository,
    state: &mut SearchState,
) -> Result<Vec<(u32, u32)>, raptor::Error> {
    state.active.fill(None);
    for stop_idx in state.marked.iter_ones() {
        let stop_idx = stop_idx as u32;
        for pattern_idx in repository.pattern_idxs_by_stop_idx(stop_idx) {
            let pattern = &repository.patterns[*pattern_idx as usize];
            let position = pattern
                .position_of(stop_idx)
                .ok_or(raptor::Error::NotOnPattern {
                    stop_idx,
                    pattern_idx: *pattern_idx,
                })?;
            let active = &mut state.active[*pattern_idx as usize];
            if active.is_none_or(|current| position < current) {
                *active = Some(position);
            }
        }
    }
    state.marked.fill(false);
    Ok(state
        .active
        .iter()
        .enumerate()
        .filter_map(|(pattern_idx, position)| position.map(|p| (pattern_idx as u32, p)))
        .collect())
}

/// Finds the earliest trip of `pattern` leaving the stop at `position` no
/// earlier than `earliest` that runs on the departure's date.
///
/// The weekday list is sorted by departure at the first stop. Trips of one
/// pattern do not overtake each other, so the same order holds at every
/// position and a binary search finds the first candidate.
pub fn find_earliest_trip(
    repository: &Repository,
    pattern: &Pattern,
    position: usize,
    earliest: Time,
    departure: &Departure,
) -> Option<u32> {
    let trips = pattern.trips_on(departure.weekday());
    let start = trips.partition_point(|pattern_trip| {
        repository.departure_time(pattern_trip.trip_idx, position) < earliest
    });
    trips[start..]
        .iter()
        .find(|pattern_trip| {
            pattern_trip.is_active(departure.date)
                && repository.departure_time(pattern_trip.trip_idx, position) >= earliest
        })
        .map(|pattern_trip| pattern_trip.trip_idx)
}
