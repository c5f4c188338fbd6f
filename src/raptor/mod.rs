mod cancel;
mod discovery;
mod explorer;
pub mod itinerary;
pub mod state;

pub use cancel::*;
pub use discovery::{find_earliest_trip, nearby_stops};
pub use itinerary::*;
pub use state::{Label, LegKind, RoundLabels, StopRef};

use crate::{
    raptor::{
        cancel::Interrupt,
        discovery::collect_patterns,
        explorer::{explore_destination, explore_footpaths, explore_pattern},
        state::SearchState,
    },
    repository::{Footpath, Repository},
    shared::{
        geo::{Coordinate, Distance, walk_time},
        time::{Departure, Duration, Time},
    },
};
use std::time::Instant;
use thiserror::Error;
use tracing::{debug, trace, warn};

#[derive(Error, Debug)]
pub enum Error {
    #[error("The search was cancelled")]
    Cancelled,
    #[error("The search ran past its deadline")]
    DeadlineExceeded,
    #[error("Round {round} does not exist, the search ran {rounds} rounds")]
    RoundOutOfRange { round: usize, rounds: usize },
    #[error("No label for {stop:?} in round {round}")]
    MissingLabel { round: usize, stop: StopRef },
    #[error("Stop {stop_idx} is indexed to pattern {pattern_idx} but is not on it")]
    NotOnPattern { stop_idx: u32, pattern_idx: u32 },
}

#[derive(Debug, Clone, Copy)]
pub struct Config {
    /// Maximum number of boardings, the search runs rounds `0..=max_transfers`.
    pub max_transfers: usize,
    /// Buffer between arriving at a stop and boarding there.
    pub min_transfer_time: Duration,
    /// Below this the origin and destination are close enough to walk.
    pub walk_only_distance: Distance,
    /// Radius for finding stops around the origin and destination.
    pub max_walk_distance: Distance,
    /// How many times the radius is doubled while no stop is found.
    pub proximity_attempts: u32,
    /// How many following days are tried when nothing departs.
    pub max_day_rollovers: u32,
    /// Time of day a search moved to the next day starts at.
    pub next_day_start: Time,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_transfers: 7,
            min_transfer_time: Duration::from_minutes(2),
            walk_only_distance: Distance::from_meters(200.0),
            max_walk_distance: Distance::from_meters(1000.0),
            proximity_attempts: 2,
            max_day_rollovers: 7,
            next_day_start: Time::from_hms_parts(0, 5, 0),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    Origin,
    Destination,
}

#[derive(Debug)]
pub enum SearchOutcome<'a> {
    /// Origin and destination are closer than the walk only distance.
    WalkDirectly { distance: Distance, duration: Duration },
    /// No stop could be found near one of the endpoints.
    LocationNotServed(Endpoint),
    /// No journey reaches the destination within the searched days.
    NoJourney,
    Found(SearchResult<'a>),
}

/// The labels of a successful search.
#[derive(Debug)]
pub struct SearchResult<'a> {
    repository: &'a Repository,
    rounds: Vec<RoundLabels>,
    departure: Departure,
    day_offset: u32,
}

impl<'a> SearchResult<'a> {
    /// Labels per round, round 0 being reached on foot.
    pub fn rounds(&self) -> &[RoundLabels] {
        &self.rounds
    }

    /// The departure the labels were computed for. Differs from the query
    /// when the search had to move to a later day.
    pub fn departure(&self) -> Departure {
        self.departure
    }

    pub fn day_offset(&self) -> u32 {
        self.day_offset
    }

    pub fn is_next_day(&self) -> bool {
        self.day_offset > 0
    }

    /// Rounds in which the destination was reached.
    pub fn destination_rounds(&self) -> impl Iterator<Item = usize> + '_ {
        self.rounds
            .iter()
            .enumerate()
            .filter(|(_, labels)| labels.destination().is_some())
            .map(|(round, _)| round)
    }

    /// Arrival at the destination in `round`, if it was reached then.
    pub fn arrival_time(&self, round: usize) -> Option<Time> {
        self.rounds
            .get(round)?
            .destination()
            .map(|label| label.arrival_time)
    }

    pub fn reconstruct(&self, round: usize) -> Result<Itinerary, self::Error> {
        let legs = itinerary::reconstruct(self.repository, &self.rounds, round)?;
        Ok(Itinerary {
            legs,
            round,
            departure: self.departure,
            day_offset: self.day_offset,
        })
    }

    /// The earliest arriving journey. Later rounds only ever store a
    /// destination label that beats every earlier one.
    pub fn best(&self) -> Result<Itinerary, self::Error> {
        let round = self
            .destination_rounds()
            .last()
            .ok_or(self::Error::MissingLabel {
                round: self.rounds.len().saturating_sub(1),
                stop: StopRef::VirtualDestination,
            })?;
        self.reconstruct(round)
    }

    /// One journey per round that reached the destination, fewest boardings first.
    pub fn journeys(&self) -> Result<Vec<Itinerary>, self::Error> {
        self.destination_rounds()
            .map(|round| self.reconstruct(round))
            .collect()
    }
}

/// A journey query between two coordinates.
///
/// ```ignore
/// let outcome = repository
///     .router(from, to)
///     .departure_at(Departure::new(time, date))
///     .search()?;
/// ```
pub struct Raptor<'a> {
    repository: &'a Repository,
    from: Coordinate,
    to: Coordinate,
    departure: Departure,
    config: Config,
    interrupt: Interrupt,
}

impl<'a> Raptor<'a> {
    pub fn new(repository: &'a Repository, from: Coordinate, to: Coordinate) -> Self {
        Self {
            repository,
            from,
            to,
            departure: Departure::now(),
            config: Config::default(),
            interrupt: Interrupt::default(),
        }
    }

    pub fn departure_at(mut self, departure: Departure) -> Self {
        self.departure = departure;
        self
    }

    pub fn with_config(mut self, config: Config) -> Self {
        self.config = config;
        self
    }

    pub fn max_transfers(mut self, max_transfers: usize) -> Self {
        self.config.max_transfers = max_transfers;
        self
    }

    pub fn cancel_token(mut self, token: CancelToken) -> Self {
        self.interrupt.token = Some(token);
        self
    }

    pub fn deadline(mut self, deadline: Instant) -> Self {
        self.interrupt.deadline = Some(deadline);
        self
    }

    pub fn timeout(self, timeout: std::time::Duration) -> Self {
        self.deadline(Instant::now() + timeout)
    }

    pub fn search(&self) -> Result<SearchOutcome<'a>, self::Error> {
        let now = Instant::now();
        let distance = self.from.haversine_distance(&self.to);
        if distance < self.config.walk_only_distance {
            return Ok(SearchOutcome::WalkDirectly {
                distance,
                duration: walk_time(distance),
            });
        }

        let origin = self.nearby_stops(&self.from);
        if origin.is_empty() {
            return Ok(SearchOutcome::LocationNotServed(Endpoint::Origin));
        }
        let destination = self.nearby_stops(&self.to);
        if destination.is_empty() {
            return Ok(SearchOutcome::LocationNotServed(Endpoint::Destination));
        }

        let mut departure = self.departure;
        for day_offset in 0..=self.config.max_day_rollovers {
            if let Some(rounds) = self.run(&departure, &origin, &destination)? {
                debug!("Search took {:?}", now.elapsed());
                if rounds.iter().all(|labels| labels.destination().is_none()) {
                    return Ok(SearchOutcome::NoJourney);
                }
                return Ok(SearchOutcome::Found(SearchResult {
                    repository: self.repository,
                    rounds,
                    departure,
                    day_offset,
                }));
            }
            let Some(next) = departure.next_day(self.config.next_day_start) else {
                break;
            };
            warn!(
                "Nothing departs from {} on {}, retrying on {}",
                self.from, departure.date, next.date
            );
            departure = next;
        }
        debug!("Search took {:?}", now.elapsed());
        Ok(SearchOutcome::NoJourney)
    }

    fn nearby_stops(&self, coordinate: &Coordinate) -> Vec<Footpath> {
        nearby_stops(
            self.repository,
            coordinate,
            self.config.max_walk_distance,
            self.config.proximity_attempts,
        )
    }

    /// Runs the rounds for one day. `None` when no trip could be boarded at all.
    fn run(
        &self,
        departure: &Departure,
        origin: &[Footpath],
        destination: &[Footpath],
    ) -> Result<Option<Vec<RoundLabels>>, self::Error> {
        let mut state = SearchState::new(
            self.repository.stops.len(),
            self.repository.patterns.len(),
        );
        state.push_round();
        for footpath in origin {
            let label = Label::new_walk(
                StopRef::VirtualOrigin,
                StopRef::Stop(footpath.to_stop_idx),
                departure.time,
                departure.time + footpath.duration,
            );
            if state.improve(0, label) {
                state.mark(footpath.to_stop_idx);
            }
        }

        for round in 1..=self.config.max_transfers {
            self.interrupt.check()?;
            state.push_round();
            let patterns = collect_patterns(self.repository, &mut state)?;
            trace!("Round {round}: scanning {} patterns", patterns.len());
            for pattern in patterns {
                explore_pattern(
                    self.repository,
                    &mut state,
                    round,
                    pattern,
                    departure,
                    self.config.min_transfer_time,
                );
            }
            explore_destination(&mut state, round, destination);
            explore_footpaths(self.repository, &mut state, round);

            if state.marked.not_any() {
                if round == 1 {
                    return Ok(None);
                }
                trace!("Round {round}: nothing improved, stopping");
                break;
            }
        }
        Ok(Some(state.rounds))
    }
}
