use std::{collections::HashMap, sync::Arc, time::Instant};

use rayon::prelude::*;
use thiserror::Error;
use tracing::{debug, warn};

use crate::{
    repository::{
        DAYS_IN_WEEK, Pattern, PatternStop, PatternTrip, Repository, Service, Slice, Stop,
        StopVisit, Trip,
    },
    shared::{
        geo::{Coordinate, Distance},
        geohash::Cell,
        time::{ServiceDate, Time},
    },
};

#[derive(Debug, Clone, Copy)]
pub struct BuildConfig {
    /// Number of geohash characters used to bucket stops.
    pub geohash_precision: u8,
    /// Stops closer than this are connected by a footpath.
    pub max_walk_distance: Distance,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            geohash_precision: 5,
            max_walk_distance: Distance::from_meters(1000.0),
        }
    }
}

/// Input records that were skipped while building the network.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BuildIssue {
    #[error("Stop {0} was added twice, keeping the first")]
    DuplicateStop(Arc<str>),
    #[error("Service {0} was added twice, keeping the first")]
    DuplicateService(Arc<str>),
    #[error("Service {0} ends before it starts")]
    InvalidService(Arc<str>),
    #[error("Trip {0} was added twice, keeping the first")]
    DuplicateTrip(Arc<str>),
    #[error("Trip {trip} has {visits} stop visits, at least 2 are needed")]
    DegenerateTrip { trip: Arc<str>, visits: usize },
    #[error("Trip {trip} references unknown service {service}")]
    UnknownService { trip: Arc<str>, service: Arc<str> },
    #[error("Trip {trip} references unknown stop {stop}")]
    UnknownStop { trip: Arc<str>, stop: Arc<str> },
    #[error("Trip {trip} visits sequence {sequence} more than once")]
    DuplicateSequence { trip: Arc<str>, sequence: u32 },
    #[error("Trip {trip} has an unreadable stop visit: {reason}")]
    MalformedVisit { trip: Arc<str>, reason: String },
}

/// One stop visit of a trip as delivered by an ingestion source.
#[derive(Debug, Clone)]
pub struct TripVisit {
    pub stop_id: Arc<str>,
    pub sequence: u32,
    pub arrival_time: Time,
    pub departure_time: Time,
}

impl TripVisit {
    pub fn new(
        stop_id: impl Into<Arc<str>>,
        sequence: u32,
        arrival_time: Time,
        departure_time: Time,
    ) -> Self {
        Self {
            stop_id: stop_id.into(),
            sequence,
            arrival_time,
            departure_time,
        }
    }
}

/// Assembles a [`Repository`] from stops, calendars and trips.
///
/// External string ids are mapped to dense indices as records are added.
/// Records that fail validation are skipped and reported as [`BuildIssue`]s,
/// nothing is ever substituted for missing data.
#[derive(Debug, Default)]
pub struct RepositoryBuilder {
    config: BuildConfig,
    stops: Vec<Stop>,
    stop_lookup: HashMap<Arc<str>, u32>,
    services: Vec<Service>,
    service_lookup: HashMap<Arc<str>, u32>,
    trips: Vec<Trip>,
    trip_lookup: HashMap<Arc<str>, u32>,
    stop_visits: Vec<StopVisit>,
    issues: Vec<BuildIssue>,
}

impl RepositoryBuilder {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn with_config(mut self, config: BuildConfig) -> Self {
        self.config = config;
        self
    }

    /// Adds a stop and returns its index.
    pub fn add_stop(
        &mut self,
        id: impl Into<Arc<str>>,
        name: impl Into<Arc<str>>,
        coordinate: Coordinate,
    ) -> u32 {
        let id = id.into();
        if let Some(index) = self.stop_lookup.get(&id).copied() {
            self.issue(BuildIssue::DuplicateStop(id));
            return index;
        }
        let index = self.stops.len() as u32;
        self.stop_lookup.insert(id.clone(), index);
        self.stops.push(Stop {
            index,
            id,
            name: name.into(),
            coordinate,
            cell: Cell::encode(&coordinate, self.config.geohash_precision),
        });
        index
    }

    /// Adds a calendar entry. `weekdays` is indexed from Monday.
    pub fn add_service(
        &mut self,
        id: impl Into<Arc<str>>,
        weekdays: [bool; DAYS_IN_WEEK],
        start_date: ServiceDate,
        end_date: ServiceDate,
    ) -> Option<u32> {
        let id = id.into();
        if let Some(index) = self.service_lookup.get(&id).copied() {
            self.issue(BuildIssue::DuplicateService(id));
            return Some(index);
        }
        if end_date < start_date {
            self.issue(BuildIssue::InvalidService(id));
            return None;
        }
        let index = self.services.len() as u32;
        self.service_lookup.insert(id.clone(), index);
        self.services.push(Service {
            index,
            id,
            weekdays,
            start_date,
            end_date,
        });
        Some(index)
    }

    /// Adds a trip and returns its index, or `None` if it was rejected.
    pub fn add_trip(
        &mut self,
        id: impl Into<Arc<str>>,
        service_id: &str,
        line_name: impl Into<Arc<str>>,
        mut visits: Vec<TripVisit>,
    ) -> Option<u32> {
        let id = id.into();
        if self.trip_lookup.contains_key(&id) {
            self.issue(BuildIssue::DuplicateTrip(id));
            return None;
        }
        if visits.len() < 2 {
            self.issue(BuildIssue::DegenerateTrip {
                trip: id,
                visits: visits.len(),
            });
            return None;
        }
        let Some(service_idx) = self.service_lookup.get(service_id).copied() else {
            self.issue(BuildIssue::UnknownService {
                trip: id,
                service: service_id.into(),
            });
            return None;
        };

        visits.sort_by_key(|visit| visit.sequence);
        if let Some(pair) = visits
            .windows(2)
            .find(|pair| pair[0].sequence == pair[1].sequence)
        {
            let sequence = pair[0].sequence;
            self.issue(BuildIssue::DuplicateSequence { trip: id, sequence });
            return None;
        }

        let mut resolved = Vec::with_capacity(visits.len());
        for visit in visits.into_iter() {
            let Some(stop_idx) = self.stop_lookup.get(&visit.stop_id).copied() else {
                self.issue(BuildIssue::UnknownStop {
                    trip: id,
                    stop: visit.stop_id,
                });
                return None;
            };
            resolved.push(StopVisit {
                stop_idx,
                sequence: visit.sequence,
                arrival_time: visit.arrival_time,
                departure_time: visit.departure_time,
            });
        }

        let index = self.trips.len() as u32;
        let visits = Slice {
            start_idx: self.stop_visits.len() as u32,
            count: resolved.len() as u32,
        };
        self.stop_visits.extend(resolved);
        self.trip_lookup.insert(id.clone(), index);
        self.trips.push(Trip {
            index,
            id,
            service_idx,
            line_name: line_name.into(),
            visits,
        });
        Some(index)
    }

    pub fn stop_idx(&self, id: &str) -> Option<u32> {
        self.stop_lookup.get(id).copied()
    }

    pub fn issues(&self) -> &[BuildIssue] {
        &self.issues
    }

    pub(crate) fn issue(&mut self, issue: BuildIssue) {
        warn!("{issue}");
        self.issues.push(issue);
    }

    pub fn build(self) -> Repository {
        let now = Instant::now();
        let mut repository = Repository {
            config: self.config,
            stops: self.stops.into(),
            stop_lookup: self.stop_lookup,
            services: self.services.into(),
            trips: self.trips.into(),
            trip_lookup: self.trip_lookup,
            stop_visits: self.stop_visits.into(),
            issues: self.issues.into(),
            ..Default::default()
        };
        repository.generate_geo_hash();
        repository.generate_patterns();
        repository.generate_footpaths();
        debug!(
            "Built network with {} stops, {} trips and {} patterns in {:?}",
            repository.stops.len(),
            repository.trips.len(),
            repository.patterns.len(),
            now.elapsed()
        );
        repository
    }
}

impl Repository {
    fn generate_geo_hash(&mut self) {
        debug!("Generating geo spatial hash...");
        let now = Instant::now();
        let mut cells: HashMap<Cell, Vec<u32>> = HashMap::new();
        self.stops.iter().for_each(|stop| {
            cells.entry(stop.cell).or_default().push(stop.index);
        });
        self.cell_to_stops = cells
            .into_iter()
            .map(|(cell, stops)| (cell, stops.into()))
            .collect();
        debug!("Generating geo spatial hash took {:?}", now.elapsed());
    }

    fn generate_patterns(&mut self) {
        // Trips are grouped by their exact (stop, sequence) list. The map hashes
        // the list and confirms a hit with full equality, so two different stop
        // sequences never share a pattern even if their hashes collide.
        debug!("Generating patterns...");
        let now = Instant::now();
        let mut signature_to_pattern: HashMap<Vec<(u32, u32)>, u32> = HashMap::new();
        let mut groups: Vec<(Vec<(u32, u32)>, Vec<u32>)> = Vec::new();
        let mut trip_to_pattern: Vec<u32> = Vec::with_capacity(self.trips.len());
        self.trips.iter().for_each(|trip| {
            let signature: Vec<(u32, u32)> = self.stop_visits[trip.visits.range()]
                .iter()
                .map(|visit| (visit.stop_idx, visit.sequence))
                .collect();
            let pattern_idx = match signature_to_pattern.get(&signature) {
                Some(pattern_idx) => *pattern_idx,
                None => {
                    let pattern_idx = groups.len() as u32;
                    signature_to_pattern.insert(signature.clone(), pattern_idx);
                    groups.push((signature, Vec::new()));
                    pattern_idx
                }
            };
            groups[pattern_idx as usize].1.push(trip.index);
            trip_to_pattern.push(pattern_idx);
        });

        let patterns: Vec<Pattern> = groups
            .into_par_iter()
            .enumerate()
            .map(|(index, (signature, trips))| self.build_pattern(index as u32, signature, trips))
            .collect();

        let mut stop_to_patterns: Vec<Vec<u32>> = vec![Vec::new(); self.stops.len()];
        patterns.iter().for_each(|pattern| {
            let mut seen = pattern.stops_by_idx.iter().map(|s| s.stop_idx).peekable();
            while let Some(stop_idx) = seen.next() {
                // A looping pattern lists a stop more than once, index it only once.
                if seen.peek() != Some(&stop_idx) {
                    stop_to_patterns[stop_idx as usize].push(pattern.index);
                }
            }
        });
        self.patterns = patterns.into();
        self.stop_to_patterns = stop_to_patterns.into_iter().map(|val| val.into()).collect();
        self.trip_to_pattern = trip_to_pattern.into();
        debug!("Generating patterns took {:?}", now.elapsed());
    }

    fn build_pattern(&self, index: u32, signature: Vec<(u32, u32)>, trips: Vec<u32>) -> Pattern {
        let stops: Arc<[u32]> = signature.iter().map(|(stop_idx, _)| *stop_idx).collect();
        let mut stops_by_idx: Vec<PatternStop> = stops
            .iter()
            .enumerate()
            .map(|(position, stop_idx)| PatternStop {
                stop_idx: *stop_idx,
                position: position as u32,
            })
            .collect();
        stops_by_idx.sort();

        let mut days: [Vec<PatternTrip>; DAYS_IN_WEEK] = Default::default();
        trips.iter().for_each(|trip_idx| {
            let trip = &self.trips[*trip_idx as usize];
            debug_assert!(
                self.stop_visits[trip.visits.range()]
                    .iter()
                    .map(|visit| visit.stop_idx)
                    .eq(stops.iter().copied())
            );
            let service = &self.services[trip.service_idx as usize];
            days.iter_mut()
                .enumerate()
                .filter(|(day, _)| service.weekdays[*day])
                .for_each(|(_, list)| {
                    list.push(PatternTrip {
                        trip_idx: trip.index,
                        start_date: service.start_date,
                        end_date: service.end_date,
                        line_name: trip.line_name.clone(),
                    })
                });
        });
        // Stable sort, trips leaving at the same time keep insertion order.
        days.iter_mut().for_each(|list| {
            list.sort_by_key(|pattern_trip| self.first_departure(pattern_trip.trip_idx));
        });

        Pattern {
            index,
            stops,
            stops_by_idx: stops_by_idx.into(),
            trips: days.map(|list| list.into()),
        }
    }

    fn first_departure(&self, trip_idx: u32) -> Time {
        let trip = &self.trips[trip_idx as usize];
        self.stop_visits[trip.visits.start_idx as usize].departure_time
    }
}
