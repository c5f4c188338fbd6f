pub mod geo;
pub mod geohash;
pub mod time;

pub use geo::*;
pub use geohash::{BoundingBox, Cell};
pub use time::{Departure, Duration, ServiceDate, Time};
