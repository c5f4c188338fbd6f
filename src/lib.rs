//! Journey planning over a static public transport timetable.
//!
//! A [`repository::Repository`] is built once from a GTFS feed (or through
//! [`repository::RepositoryBuilder`]) and then answers any number of
//! [`raptor::Raptor`] queries, concurrently if needed.
pub mod gtfs;
pub mod prelude;
pub mod raptor;
pub mod repository;
pub mod shared;
