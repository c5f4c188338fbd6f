use crate::{
    raptor::{
        discovery::find_earliest_trip,
        state::{Label, SearchState, StopRef},
    },
    repository::{Footpath, Repository},
    shared::time::{Departure, Duration},
};

struct Boarded {
    trip_idx: u32,
    stop_idx: u32,
    position: usize,
}

/// Walks `pattern_idx` from `start`, riding the best trip found so far and
/// improving the round's labels along the way.
pub(crate) fn explore_pattern(
    repository: &Repository,
    state: &mut SearchState,
    round: usize,
    (pattern_idx, start): (u32, u32),
    departure: &Departure,
    transfer_time: Duration,
) {
    let pattern = &repository.patterns[pattern_idx as usize];
    let mut boarded: Option<Boarded> = None;

    for (position, stop_idx) in pattern.stops.iter().copied().enumerate().skip(start as usize) {
        // Ride the current trip to this stop.
        let onboard_arrival = boarded.as_ref().map(|trip| {
            let arrival_time = repository.arrival_time(trip.trip_idx, position);
            let label = Label::new_trip(
                trip.stop_idx,
                stop_idx,
                trip.trip_idx,
                repository.departure_time(trip.trip_idx, trip.position),
                arrival_time,
            );
            if state.improve(round, label) {
                state.mark(stop_idx);
            }
            arrival_time
        });

        // Try to catch an earlier trip here.
        let Some(previous) = state.arrival(round - 1, StopRef::Stop(stop_idx)) else {
            continue;
        };
        if onboard_arrival.is_some_and(|arrival_time| previous >= arrival_time) {
            continue;
        }
        let Some(trip_idx) = find_earliest_trip(
            repository,
            pattern,
            position,
            previous + transfer_time,
            departure,
        ) else {
            continue;
        };
        let switch = match &boarded {
            None => true,
            Some(current) => {
                current.trip_idx != trip_idx
                    && repository.departure_time(trip_idx, position)
                        < repository.departure_time(current.trip_idx, position)
            }
        };
        if switch {
            boarded = Some(Boarded {
                trip_idx,
                stop_idx,
                position,
            });
        }
    }
}

/// Lets every stop marked this round walk to the destination.
pub(crate) fn explore_destination(
    state: &mut SearchState,
    round: usize,
    destination: &[Footpath],
) {
    for footpath in destination {
        let stop = StopRef::Stop(footpath.to_stop_idx);
        if !state.marked[footpath.to_stop_idx as usize] {
            continue;
        }
        let Some(departure_time) = state.arrival(round, stop) else {
            continue;
        };
        let label = Label::new_walk(
            stop,
            StopRef::VirtualDestination,
            departure_time,
            departure_time + footpath.duration,
        );
        state.improve(round, label);
    }
}

/// Relaxes the footpaths of every marked stop, one walking hop per round.
pub(crate) fn explore_footpaths(repository: &Repository, state: &mut SearchState, round: usize) {
    // Departures are read up front so a stop improved by walking does not
    // walk on from its new time within the same round.
    let departures: Vec<(u32, _)> = state
        .marked
        .iter_ones()
        .filter_map(|stop_idx| {
            let stop_idx = stop_idx as u32;
            state
                .arrival(round, StopRef::Stop(stop_idx))
                .map(|arrival_time| (stop_idx, arrival_time))
        })
        .collect();

    state.walked.fill(false);
    for (stop_idx, departure_time) in departures {
        for footpath in repository.footpaths_by_stop_idx(stop_idx) {
            let label = Label::new_walk(
                StopRef::Stop(stop_idx),
                StopRef::Stop(footpath.to_stop_idx),
                departure_time,
                departure_time + footpath.duration,
            );
            if state.improve(round, label) {
                state.walked.set(footpath.to_stop_idx as usize, true);
            }
        }
    }
    for stop_idx in state.walked.iter_ones() {
        state.marked.set(stop_idx, true);
    }
}
