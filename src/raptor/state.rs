use bitvec::prelude::*;

use crate::shared::time::{self, Time};

/// A point a label can start or end at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StopRef {
    Stop(u32),
    /// The query's origin coordinate.
    VirtualOrigin,
    /// The query's destination coordinate.
    VirtualDestination,
}

impl StopRef {
    pub fn stop_idx(&self) -> Option<u32> {
        match self {
            StopRef::Stop(stop_idx) => Some(*stop_idx),
            _ => None,
        }
    }
}

impl From<u32> for StopRef {
    fn from(value: u32) -> Self {
        Self::Stop(value)
    }
}

/// How a label was reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LegKind {
    Trip(u32),
    Walking,
}

impl LegKind {
    pub fn is_trip(&self) -> bool {
        matches!(self, LegKind::Trip(_))
    }

    pub fn is_walking(&self) -> bool {
        matches!(self, LegKind::Walking)
    }
}

/// The best known way of reaching `to` within one round.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Label {
    /// Where the leg was boarded, or where the walk started.
    pub from: StopRef,
    pub to: StopRef,
    pub kind: LegKind,
    pub departure_time: Time,
    pub arrival_time: Time,
}

impl Label {
    pub fn new_trip(
        from: u32,
        to: u32,
        trip_idx: u32,
        departure_time: Time,
        arrival_time: Time,
    ) -> Self {
        Self {
            from: StopRef::Stop(from),
            to: StopRef::Stop(to),
            kind: LegKind::Trip(trip_idx),
            departure_time,
            arrival_time,
        }
    }

    pub fn new_walk(from: StopRef, to: StopRef, departure_time: Time, arrival_time: Time) -> Self {
        Self {
            from,
            to,
            kind: LegKind::Walking,
            departure_time,
            arrival_time,
        }
    }
}

/// The labels of a single round, at most one per stop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoundLabels {
    stops: Box<[Option<Label>]>,
    destination: Option<Label>,
}

impl RoundLabels {
    pub fn new(stop_count: usize) -> Self {
        Self {
            stops: vec![None; stop_count].into(),
            destination: None,
        }
    }

    pub fn get(&self, stop: StopRef) -> Option<&Label> {
        match stop {
            StopRef::Stop(stop_idx) => self.stops.get(stop_idx as usize)?.as_ref(),
            StopRef::VirtualDestination => self.destination.as_ref(),
            StopRef::VirtualOrigin => None,
        }
    }

    pub fn destination(&self) -> Option<&Label> {
        self.destination.as_ref()
    }

    /// Labels of every stop reached in this round, the destination excluded.
    pub fn reached(&self) -> impl Iterator<Item = &Label> {
        self.stops.iter().flatten()
    }

    pub fn is_empty(&self) -> bool {
        self.destination.is_none() && self.reached().next().is_none()
    }

    /// Places `label` at its `to` slot, replacing what was there.
    pub fn set(&mut self, label: Label) {
        match label.to {
            StopRef::Stop(stop_idx) => self.stops[stop_idx as usize] = Some(label),
            StopRef::VirtualDestination => self.destination = Some(label),
            StopRef::VirtualOrigin => debug_assert!(false, "a label can not lead to the origin"),
        }
    }
}

/// Everything a single query mutates. Owned by the query, never shared.
#[derive(Debug)]
pub(crate) struct SearchState {
    pub rounds: Vec<RoundLabels>,
    /// Best arrival per stop over all rounds so far.
    pub best: Box<[Option<Time>]>,
    pub destination_best: Option<Time>,
    /// Stops improved in the current round.
    pub marked: BitVec<usize, Lsb0>,
    /// Stops improved by walking, merged into `marked` after relaxation.
    pub walked: BitVec<usize, Lsb0>,
    /// Earliest marked position per pattern.
    pub active: Box<[Option<u32>]>,
    stop_count: usize,
}

impl SearchState {
    pub fn new(stop_count: usize, pattern_count: usize) -> Self {
        Self {
            rounds: Vec::new(),
            best: vec![None; stop_count].into(),
            destination_best: None,
            marked: bitvec!(usize, Lsb0; 0; stop_count),
            walked: bitvec!(usize, Lsb0; 0; stop_count),
            active: vec![None; pattern_count].into(),
            stop_count,
        }
    }

    pub fn push_round(&mut self) {
        self.rounds.push(RoundLabels::new(self.stop_count));
    }

    pub fn best_arrival(&self, stop: StopRef) -> Time {
        match stop {
            StopRef::Stop(stop_idx) => self.best[stop_idx as usize],
            StopRef::VirtualDestination => self.destination_best,
            StopRef::VirtualOrigin => None,
        }
        .unwrap_or(time::MAX)
    }

    pub fn arrival(&self, round: usize, stop: StopRef) -> Option<Time> {
        self.rounds
            .get(round)?
            .get(stop)
            .map(|label| label.arrival_time)
    }

    /// Stores `label` in `round` if it beats both the best arrival at its
    /// stop and the best arrival at the destination. Marking is left to the
    /// caller.
    pub fn improve(&mut self, round: usize, label: Label) -> bool {
        let arrival_time = label.arrival_time;
        if arrival_time >= self.best_arrival(label.to)
            || arrival_time >= self.best_arrival(StopRef::VirtualDestination)
        {
            return false;
        }
        match label.to {
            StopRef::Stop(stop_idx) => self.best[stop_idx as usize] = Some(arrival_time),
            StopRef::VirtualDestination => self.destination_best = Some(arrival_time),
            StopRef::VirtualOrigin => return false,
        }
        self.rounds[round].set(label);
        true
    }

    pub fn mark(&mut self, stop_idx: u32) {
        self.marked.set(stop_idx as usize, true);
    }
}
