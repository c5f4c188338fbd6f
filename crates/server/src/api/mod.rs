mod gtfs;
mod near;
mod routing;
mod stops;

pub use gtfs::*;
pub use near::*;
pub use routing::*;
pub use stops::*;

use axum::http::StatusCode;
use transitnav::shared::Coordinate;

/// Parses `lat,lon`.
pub(crate) fn parse_coordinate(value: &str) -> Result<Coordinate, StatusCode> {
    let (latitude, longitude) = value.split_once(',').ok_or(StatusCode::BAD_REQUEST)?;
    let latitude: f64 = latitude.trim().parse().map_err(|_| StatusCode::BAD_REQUEST)?;
    let longitude: f64 = longitude.trim().parse().map_err(|_| StatusCode::BAD_REQUEST)?;
    if !(-90.0..=90.0).contains(&latitude) || !(-180.0..=180.0).contains(&longitude) {
        return Err(StatusCode::BAD_REQUEST);
    }
    Ok(Coordinate::new(latitude, longitude))
}

#[test]
fn parse_coordinate_test() {
    let coordinate = parse_coordinate("59.33, 18.06").unwrap();
    assert_eq!(coordinate, Coordinate::new(59.33, 18.06));
    assert!(parse_coordinate("59.33").is_err());
    assert!(parse_coordinate("91.0,18.0").is_err());
    assert!(parse_coordinate("a,b").is_err());
}
