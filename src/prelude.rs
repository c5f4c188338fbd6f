pub use crate::{
    gtfs::GtfsReader,
    raptor::{
        CancelToken, Config as SearchConfig, Endpoint, Itinerary, Leg, LegKind, Raptor,
        SearchOutcome, SearchResult, StopRef,
    },
    repository::{BuildConfig, BuildIssue, Repository, RepositoryBuilder, TripVisit},
    shared::{Coordinate, Departure, Distance, Duration, ServiceDate, Time},
};
