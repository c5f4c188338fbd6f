use std::{fmt::Display, str::FromStr};

use crate::shared::geo::Coordinate;

const BASE32: &[u8; 32] = b"0123456789bcdefghjkmnpqrstuvwxyz";
pub const MAX_PRECISION: u8 = 12;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub min_latitude: f64,
    pub max_latitude: f64,
    pub min_longitude: f64,
    pub max_longitude: f64,
}

impl BoundingBox {
    pub fn center(&self) -> Coordinate {
        Coordinate::new(
            (self.min_latitude + self.max_latitude) / 2.0,
            (self.min_longitude + self.max_longitude) / 2.0,
        )
    }

    pub fn contains(&self, coordinate: &Coordinate) -> bool {
        (self.min_latitude..=self.max_latitude).contains(&coordinate.latitude)
            && (self.min_longitude..=self.max_longitude).contains(&coordinate.longitude)
    }
}

/// A geohash cell stored as its interleaved bits.
///
/// Bits are most significant first, five per base32 character, longitude on
/// even bits. Two cells are equal only if both bits and precision match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Cell {
    bits: u64,
    precision: u8,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidGeohash;

impl Cell {
    /// Encodes a coordinate into a cell with `precision` characters, clamped to `1..=12`.
    pub fn encode(coordinate: &Coordinate, precision: u8) -> Self {
        let precision = precision.clamp(1, MAX_PRECISION);
        let (mut lat_min, mut lat_max) = (-90.0, 90.0);
        let (mut lon_min, mut lon_max) = (-180.0, 180.0);
        let mut bits: u64 = 0;
        for i in 0..(precision as u32 * 5) {
            bits <<= 1;
            if i % 2 == 0 {
                let mid = (lon_min + lon_max) / 2.0;
                if coordinate.longitude > mid {
                    bits |= 1;
                    lon_min = mid;
                } else {
                    lon_max = mid;
                }
            } else {
                let mid = (lat_min + lat_max) / 2.0;
                if coordinate.latitude > mid {
                    bits |= 1;
                    lat_min = mid;
                } else {
                    lat_max = mid;
                }
            }
        }
        Self { bits, precision }
    }

    pub const fn precision(&self) -> u8 {
        self.precision
    }

    pub fn bounds(&self) -> BoundingBox {
        let (mut lat_min, mut lat_max) = (-90.0, 90.0);
        let (mut lon_min, mut lon_max) = (-180.0, 180.0);
        let total = self.precision as u32 * 5;
        for i in 0..total {
            let set = (self.bits >> (total - 1 - i)) & 1 == 1;
            if i % 2 == 0 {
                let mid = (lon_min + lon_max) / 2.0;
                if set {
                    lon_min = mid;
                } else {
                    lon_max = mid;
                }
            } else {
                let mid = (lat_min + lat_max) / 2.0;
                if set {
                    lat_min = mid;
                } else {
                    lat_max = mid;
                }
            }
        }
        BoundingBox {
            min_latitude: lat_min,
            max_latitude: lat_max,
            min_longitude: lon_min,
            max_longitude: lon_max,
        }
    }

    /// The 8 surrounding cells followed by the cell itself.
    ///
    /// Neighbors are found by re-encoding the center of the adjacent cell.
    /// Longitude wraps at the antimeridian; at the poles latitude is clamped,
    /// so the result can repeat a cell.
    pub fn neighbors(&self) -> [Cell; 9] {
        let bounds = self.bounds();
        let center = bounds.center();
        let height = bounds.max_latitude - bounds.min_latitude;
        let width = bounds.max_longitude - bounds.min_longitude;
        let offsets: [(f64, f64); 8] = [
            (height, 0.0),
            (-height, 0.0),
            (0.0, width),
            (0.0, -width),
            (height, width),
            (height, -width),
            (-height, width),
            (-height, -width),
        ];
        let mut cells = [*self; 9];
        for (cell, (d_lat, d_lon)) in cells.iter_mut().zip(offsets) {
            let latitude = (center.latitude + d_lat).clamp(-90.0, 90.0);
            let longitude = wrap_longitude(center.longitude + d_lon);
            *cell = Cell::encode(&Coordinate::new(latitude, longitude), self.precision);
        }
        cells
    }
}

fn wrap_longitude(longitude: f64) -> f64 {
    if longitude > 180.0 {
        longitude - 360.0
    } else if longitude < -180.0 {
        longitude + 360.0
    } else {
        longitude
    }
}

impl Display for Cell {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let precision = self.precision as u32;
        for i in 0..precision {
            let idx = (self.bits >> (5 * (precision - 1 - i))) & 0b11111;
            write!(f, "{}", BASE32[idx as usize] as char)?;
        }
        Ok(())
    }
}

impl FromStr for Cell {
    type Err = InvalidGeohash;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() || s.len() > MAX_PRECISION as usize {
            return Err(InvalidGeohash);
        }
        let mut bits: u64 = 0;
        for byte in s.bytes() {
            let idx = BASE32
                .iter()
                .position(|c| *c == byte.to_ascii_lowercase())
                .ok_or(InvalidGeohash)?;
            bits = (bits << 5) | idx as u64;
        }
        Ok(Self {
            bits,
            precision: s.len() as u8,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encode_known_value() {
        // Reference value from the geohash.org examples.
        let cell = Cell::encode(&Coordinate::new(57.64911, 10.40744), 11);
        assert_eq!(cell.to_string(), "u4pruydqqvj");
    }

    #[test]
    fn parse_round_trip() {
        let cell: Cell = "sv8wr".parse().unwrap();
        assert_eq!(cell.to_string(), "sv8wr");
        assert_eq!(cell.precision(), 5);
        assert!("sv8wa".parse::<Cell>().is_err());
    }

    #[test]
    fn bounds_contain_encoded_point() {
        let coordinate = Coordinate::new(32.168997, 34.844180);
        let cell = Cell::encode(&coordinate, 5);
        assert!(cell.bounds().contains(&coordinate));
    }

    #[test]
    fn neighbors_are_distinct_and_adjacent() {
        let cell = Cell::encode(&Coordinate::new(32.072571, 34.789531), 5);
        let neighbors = cell.neighbors();
        assert_eq!(neighbors[8], cell);
        let mut unique = neighbors.to_vec();
        unique.sort();
        unique.dedup();
        assert_eq!(unique.len(), 9);

        let bounds = cell.bounds();
        let north = neighbors[0].bounds();
        assert!((north.min_latitude - bounds.max_latitude).abs() < 1e-9);
        let west = neighbors[3].bounds();
        assert!((west.max_longitude - bounds.min_longitude).abs() < 1e-9);
    }
}
