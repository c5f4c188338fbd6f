use std::time::Instant;

use rayon::prelude::*;
use tracing::debug;

use crate::{
    repository::{Footpath, Repository, Stop},
    shared::{
        geo::{Coordinate, Distance, walk_time},
        geohash::Cell,
    },
};

impl Repository {
    /// Stops bucketed in the cell of `coordinate` or one of its 8 neighbors.
    pub fn candidate_stops(&self, coordinate: &Coordinate) -> Vec<&Stop> {
        let origin = Cell::encode(coordinate, self.config.geohash_precision);
        let mut cells = origin.neighbors().to_vec();
        cells.sort();
        cells.dedup();
        cells
            .iter()
            .filter_map(|cell| self.cell_to_stops.get(cell))
            .flat_map(|stops| stops.iter())
            .map(|stop_idx| &self.stops[*stop_idx as usize])
            .collect()
    }

    /// Walking edges from an arbitrary coordinate to every stop strictly
    /// closer than `distance`.
    ///
    /// Only the 9 cells around the coordinate are searched, so a distance
    /// larger than a cell is capped by the cell size.
    pub fn footpaths_from_coordinate(
        &self,
        coordinate: &Coordinate,
        distance: Distance,
    ) -> Vec<Footpath> {
        let mut footpaths: Vec<Footpath> = self
            .candidate_stops(coordinate)
            .into_iter()
            .filter_map(|stop| {
                let walking_distance = coordinate.haversine_distance(&stop.coordinate);
                (walking_distance < distance).then(|| Footpath {
                    to_stop_idx: stop.index,
                    duration: walk_time(walking_distance),
                })
            })
            .collect();
        footpaths.sort_by_key(|footpath| footpath.to_stop_idx);
        footpaths
    }

    /// Connects every stop to the stops within walking distance of it.
    pub(crate) fn generate_footpaths(&mut self) {
        debug!("Generating stop to walkable stop mapping...");
        let now = Instant::now();
        let distance = self.config.max_walk_distance;
        let stop_to_footpaths: Vec<Box<[Footpath]>> = self
            .stops
            .par_iter()
            .map(|stop| {
                self.footpaths_from_coordinate(&stop.coordinate, distance)
                    .into_iter()
                    .filter(|footpath| footpath.to_stop_idx != stop.index)
                    .collect()
            })
            .collect();
        self.stop_to_footpaths = stop_to_footpaths.into();
        debug!(
            "Generating stop to walkable stop mapping took {:?}",
            now.elapsed()
        );
    }
}
