use std::sync::Arc;

use serde::Serialize;

use crate::{
    raptor::{
        self,
        state::{Label, LegKind, RoundLabels, StopRef},
    },
    repository::Repository,
    shared::time::{Departure, Time},
};

pub const ORIGIN_NAME: &str = "start stop";
pub const DESTINATION_NAME: &str = "destination stop";
pub const WALKING_NAME: &str = "by foot";

/// A stop passed by a trip leg.
#[derive(Debug, Clone, Serialize)]
pub struct LegStop {
    pub stop_idx: u32,
    pub name: Arc<str>,
    pub arrival_time: Time,
    pub departure_time: Time,
}

#[derive(Debug, Clone)]
pub struct Leg {
    pub from: StopRef,
    pub to: StopRef,
    pub from_name: Arc<str>,
    pub to_name: Arc<str>,
    pub kind: LegKind,
    /// The line name of a trip leg, [`WALKING_NAME`] for walking.
    pub name: Arc<str>,
    pub departure_time: Time,
    pub arrival_time: Time,
    /// Stops from boarding to alighting, empty for walking legs.
    pub stops: Vec<LegStop>,
}

#[derive(Debug, Clone)]
pub struct Itinerary {
    pub legs: Vec<Leg>,
    /// The round the journey was taken from.
    pub round: usize,
    /// When the search that produced it actually started.
    pub departure: Departure,
    /// Days the search was moved forward before a trip could be found.
    pub day_offset: u32,
}

impl Itinerary {
    pub fn departure_time(&self) -> Option<Time> {
        self.legs.first().map(|leg| leg.departure_time)
    }

    pub fn arrival_time(&self) -> Option<Time> {
        self.legs.last().map(|leg| leg.arrival_time)
    }

    pub fn trip_legs(&self) -> impl Iterator<Item = &Leg> {
        self.legs.iter().filter(|leg| leg.kind.is_trip())
    }

    pub fn transfers(&self) -> usize {
        self.trip_legs().count().saturating_sub(1)
    }

    pub fn is_next_day(&self) -> bool {
        self.day_offset > 0
    }
}

/// Walks back from the destination label of `round` to the origin.
///
/// A trip leg always came from the previous round. A walking leg stays in
/// the same round unless its start has no label there. Back to back walks
/// are merged into one leg.
pub(crate) fn reconstruct(
    repository: &Repository,
    rounds: &[RoundLabels],
    round: usize,
) -> Result<Vec<Leg>, raptor::Error> {
    if round >= rounds.len() {
        return Err(raptor::Error::RoundOutOfRange {
            round,
            rounds: rounds.len(),
        });
    }
    let mut legs: Vec<Leg> = Vec::new();
    let mut round = round;
    let mut current = StopRef::VirtualDestination;
    loop {
        let label = *rounds[round]
            .get(current)
            .ok_or(raptor::Error::MissingLabel {
                round,
                stop: current,
            })?;
        match label.kind {
            LegKind::Trip(_) => {
                legs.push(Leg::new(repository, &label));
                round = round.checked_sub(1).ok_or(raptor::Error::MissingLabel {
                    round,
                    stop: label.from,
                })?;
            }
            LegKind::Walking => {
                match legs.last_mut() {
                    Some(next) if next.kind.is_walking() => {
                        next.from = label.from;
                        next.from_name = point_name(repository, label.from);
                        next.departure_time = label.departure_time;
                    }
                    _ => legs.push(Leg::new(repository, &label)),
                }
                if label.from != StopRef::VirtualOrigin && rounds[round].get(label.from).is_none() {
                    round = round.checked_sub(1).ok_or(raptor::Error::MissingLabel {
                        round,
                        stop: label.from,
                    })?;
                }
            }
        }
        if label.from == StopRef::VirtualOrigin {
            break;
        }
        current = label.from;
    }
    legs.reverse();
    Ok(legs)
}

impl Leg {
    fn new(repository: &Repository, label: &Label) -> Self {
        let name = match label.kind {
            LegKind::Trip(trip_idx) => repository.trips[trip_idx as usize].line_name.clone(),
            LegKind::Walking => WALKING_NAME.into(),
        };
        Self {
            from: label.from,
            to: label.to,
            from_name: point_name(repository, label.from),
            to_name: point_name(repository, label.to),
            kind: label.kind,
            name,
            departure_time: label.departure_time,
            arrival_time: label.arrival_time,
            stops: leg_stops(repository, label),
        }
    }
}

fn point_name(repository: &Repository, point: StopRef) -> Arc<str> {
    match point {
        StopRef::Stop(stop_idx) => repository.stops[stop_idx as usize].name.clone(),
        StopRef::VirtualOrigin => ORIGIN_NAME.into(),
        StopRef::VirtualDestination => DESTINATION_NAME.into(),
    }
}

/// The visits of a trip leg from the boarding stop to the first later visit
/// of the alighting stop.
fn leg_stops(repository: &Repository, label: &Label) -> Vec<LegStop> {
    let (LegKind::Trip(trip_idx), StopRef::Stop(from), StopRef::Stop(to)) =
        (label.kind, label.from, label.to)
    else {
        return Vec::new();
    };
    let visits = repository.visits_by_trip_idx(trip_idx);
    let Some(start) = visits.iter().position(|visit| {
        visit.stop_idx == from && visit.departure_time == label.departure_time
    }) else {
        return Vec::new();
    };
    let mut stops = Vec::new();
    for visit in &visits[start..] {
        stops.push(LegStop {
            stop_idx: visit.stop_idx,
            name: repository.stops[visit.stop_idx as usize].name.clone(),
            arrival_time: visit.arrival_time,
            departure_time: visit.departure_time,
        });
        if stops.len() > 1 && visit.stop_idx == to && visit.arrival_time == label.arrival_time {
            break;
        }
    }
    stops
}
