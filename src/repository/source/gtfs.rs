use std::{collections::HashMap, sync::Arc, time::Instant};

use tracing::{debug, warn};

use crate::{
    gtfs::{self, GtfsReader, GtfsStopTime},
    repository::{BuildConfig, BuildIssue, Repository, RepositoryBuilder, TripVisit},
    shared::geo::Coordinate,
};

struct TripInfo {
    service_id: Arc<str>,
    line_name: Arc<str>,
}

impl Repository {
    /// Builds a repository from a GTFS feed with the default [`BuildConfig`].
    pub fn from_gtfs(gtfs: &GtfsReader) -> Result<Self, gtfs::Error> {
        Ok(RepositoryBuilder::new().load_gtfs(gtfs)?.build())
    }

    pub fn from_gtfs_with_config(
        gtfs: &GtfsReader,
        config: BuildConfig,
    ) -> Result<Self, gtfs::Error> {
        Ok(RepositoryBuilder::new()
            .with_config(config)
            .load_gtfs(gtfs)?
            .build())
    }
}

impl RepositoryBuilder {
    /// Feeds every table of `gtfs` into the builder.
    ///
    /// Rows that cannot be used (bad dates, trips without a `trips.txt`
    /// entry) are logged and skipped. A trip with any unreadable stop time
    /// is dropped whole and reported as [`BuildIssue::MalformedVisit`].
    pub fn load_gtfs(mut self, gtfs: &GtfsReader) -> Result<Self, gtfs::Error> {
        self.load_stops(gtfs)?;
        self.load_calendar(gtfs)?;
        let trips = self.load_trips(gtfs)?;
        self.load_stop_times(gtfs, trips)?;
        Ok(self)
    }

    fn load_stops(&mut self, gtfs: &GtfsReader) -> Result<(), gtfs::Error> {
        debug!("Loading stops...");
        let now = Instant::now();
        gtfs.stream_stops(|(_, stop)| {
            self.add_stop(
                stop.stop_id,
                stop.stop_name,
                Coordinate::new(stop.stop_lat, stop.stop_lon),
            );
        })?;
        debug!("Loading stops took {:?}", now.elapsed());
        Ok(())
    }

    fn load_calendar(&mut self, gtfs: &GtfsReader) -> Result<(), gtfs::Error> {
        debug!("Loading calendar...");
        let now = Instant::now();
        gtfs.stream_calendar(|(_, calendar)| {
            match calendar.start().and_then(|start| Ok((start, calendar.end()?))) {
                Ok((start, end)) => {
                    self.add_service(
                        calendar.service_id.as_str(),
                        calendar.weekdays(),
                        start,
                        end,
                    );
                }
                Err(err) => warn!("Skipping service {}: {err}", calendar.service_id),
            }
        })?;
        debug!("Loading calendar took {:?}", now.elapsed());
        Ok(())
    }

    fn load_trips(
        &self,
        gtfs: &GtfsReader,
    ) -> Result<HashMap<Arc<str>, TripInfo>, gtfs::Error> {
        debug!("Loading trips...");
        let now = Instant::now();
        let mut line_names: HashMap<String, Arc<str>> = HashMap::new();
        gtfs.stream_routes(|(_, route)| {
            let line_name: Arc<str> = route.line_name().into();
            line_names.insert(route.route_id, line_name);
        })?;

        let mut trips: HashMap<Arc<str>, TripInfo> = HashMap::new();
        gtfs.stream_trips(|(_, trip)| {
            let Some(line_name) = line_names.get(&trip.route_id) else {
                warn!("Trip {} references unknown route {}", trip.trip_id, trip.route_id);
                return;
            };
            trips.insert(
                trip.trip_id.into(),
                TripInfo {
                    service_id: trip.service_id.into(),
                    line_name: line_name.clone(),
                },
            );
        })?;
        debug!("Loading trips took {:?}", now.elapsed());
        Ok(trips)
    }

    fn load_stop_times(
        &mut self,
        gtfs: &GtfsReader,
        trips: HashMap<Arc<str>, TripInfo>,
    ) -> Result<(), gtfs::Error> {
        debug!("Loading stop times...");
        let now = Instant::now();
        // Trips are added in the order they first appear in stop_times.txt.
        let mut order: Vec<Arc<str>> = Vec::new();
        let mut visits: HashMap<Arc<str>, Result<Vec<TripVisit>, gtfs::Error>> = HashMap::new();
        gtfs.stream_stop_times(|(_, stop_time)| {
            let trip_id: Arc<str> = stop_time.trip_id.as_str().into();
            let entry = visits.entry(trip_id.clone()).or_insert_with(|| {
                order.push(trip_id.clone());
                Ok(Vec::new())
            });
            // A single bad row makes the whole trip unusable.
            let Ok(list) = entry.as_mut() else {
                return;
            };
            match trip_visit(stop_time) {
                Ok(visit) => list.push(visit),
                Err(err) => *entry = Err(err),
            }
        })?;

        for trip_id in order.into_iter() {
            let list = match visits.remove(&trip_id) {
                Some(Ok(list)) => list,
                Some(Err(err)) => {
                    self.issue(BuildIssue::MalformedVisit {
                        trip: trip_id,
                        reason: err.to_string(),
                    });
                    continue;
                }
                None => continue,
            };
            let Some(info) = trips.get(&trip_id) else {
                warn!("Skipping trip {trip_id}: not listed in trips");
                continue;
            };
            self.add_trip(trip_id, &info.service_id, info.line_name.clone(), list);
        }
        debug!("Loading stop times took {:?}", now.elapsed());
        Ok(())
    }
}

fn trip_visit(stop_time: GtfsStopTime) -> Result<TripVisit, gtfs::Error> {
    Ok(TripVisit::new(
        stop_time.stop_id.as_str(),
        stop_time.sequence()?,
        stop_time.arrival()?,
        stop_time.departure()?,
    ))
}
