use serde::{Deserialize, Serialize};
use transitnav::{
    repository::{Footpath, Repository, Stop},
    shared::geo::Coordinate,
};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StopDto {
    pub id: String,
    pub name: String,
    pub coordinate: Coordinate,
}

impl StopDto {
    pub fn from(stop: &Stop) -> Self {
        let id = stop.id.to_string();
        let name = stop.name.to_string();
        let coordinate = stop.coordinate;
        Self {
            id,
            name,
            coordinate,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NearbyStopDto {
    pub stop: StopDto,
    pub walk_seconds: u32,
}

impl NearbyStopDto {
    pub fn from(repository: &Repository, footpath: &Footpath) -> Self {
        Self {
            stop: StopDto::from(&repository.stops[footpath.to_stop_idx as usize]),
            walk_seconds: footpath.duration.as_seconds(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StopDetailsDto {
    pub stop: StopDto,
    pub cell: String,
    /// Line names of every pattern calling here, deduplicated.
    pub lines: Vec<String>,
    pub walkable: Vec<NearbyStopDto>,
}

impl StopDetailsDto {
    pub fn from(repository: &Repository, stop: &Stop) -> Self {
        let mut lines: Vec<String> = repository
            .patterns_by_stop_idx(stop.index)
            .into_iter()
            .flat_map(|pattern| pattern.trips.iter().flat_map(|day| day.iter()))
            .map(|pattern_trip| pattern_trip.line_name.to_string())
            .collect();
        lines.sort();
        lines.dedup();
        let walkable = repository
            .footpaths_by_stop_idx(stop.index)
            .iter()
            .map(|footpath| NearbyStopDto::from(repository, footpath))
            .collect();
        Self {
            stop: StopDto::from(stop),
            cell: stop.cell.to_string(),
            lines,
            walkable,
        }
    }
}
