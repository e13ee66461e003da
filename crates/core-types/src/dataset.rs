//! Bundled ten-city dataset and loaders for user supplied tables.

use std::fs::File;
use std::path::Path;
use std::sync::Arc;

use crate::distance::DistanceMatrix;
use crate::error::TableError;
use crate::location::LocationTable;

const BUNDLED_DISTANCES: &str = include_str!("../data/distance_matrix.csv");
const BUNDLED_LOCATIONS: &str = include_str!("../data/locations.csv");

pub fn bundled_locations() -> Result<LocationTable, TableError> {
    LocationTable::from_csv(BUNDLED_LOCATIONS.as_bytes())
}

pub fn bundled_distances() -> Result<DistanceMatrix, TableError> {
    DistanceMatrix::from_csv(BUNDLED_DISTANCES.as_bytes())
}

/// Location and distance tables that share one index space.
#[derive(Clone, Debug)]
pub struct Dataset {
    pub locations: Arc<LocationTable>,
    pub distances: Arc<DistanceMatrix>,
}

impl Dataset {
    pub fn new(locations: LocationTable, distances: DistanceMatrix) -> Result<Self, TableError> {
        if locations.len() != distances.len() {
            return Err(TableError::SizeMismatch {
                locations: locations.len(),
                distances: distances.len(),
            });
        }
        for (index, (left, right)) in locations
            .names()
            .iter()
            .zip(distances.names())
            .enumerate()
        {
            if left != right {
                return Err(TableError::IndexSpaceMismatch {
                    index,
                    locations: left.clone(),
                    distances: right.clone(),
                });
            }
        }
        Ok(Self {
            locations: Arc::new(locations),
            distances: Arc::new(distances),
        })
    }

    pub fn bundled() -> Result<Self, TableError> {
        Self::new(bundled_locations()?, bundled_distances()?)
    }

    /// Loads either table from disk, falling back to the bundled copy.
    pub fn load(
        locations: Option<&Path>,
        distances: Option<&Path>,
    ) -> Result<Self, TableError> {
        let locations = match locations {
            Some(path) => LocationTable::from_csv(File::open(path)?)?,
            None => bundled_locations()?,
        };
        let distances = match distances {
            Some(path) => DistanceMatrix::from_csv(File::open(path)?)?,
            None => bundled_distances()?,
        };
        Self::new(locations, distances)
    }

    pub fn len(&self) -> usize {
        self.locations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locations.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bundled_tables_share_an_index_space() {
        let dataset = Dataset::bundled().expect("bundled dataset");
        assert_eq!(dataset.len(), 10);
        assert_eq!(dataset.locations.name(0), Some("New York, NY"));
        assert_eq!(dataset.distances.names()[9], "San Jose, CA");
    }

    #[test]
    fn bundled_distances_keep_their_asymmetry() {
        let distances = bundled_distances().unwrap();
        assert_eq!(distances.get(0, 1), Some(4_488_604.0));
        assert_eq!(distances.get(1, 0), Some(4_488_629.0));
        assert!(!distances.asymmetries().is_empty());
    }

    #[test]
    fn mismatched_tables_are_rejected() {
        let locations = LocationTable::from_csv(
            "name,latitude,longitude\nA,0,0\nB,1,1\n".as_bytes(),
        )
        .unwrap();
        let distances = DistanceMatrix::from_csv(",B,A\nB,0,1\nA,1,0\n".as_bytes()).unwrap();
        assert!(matches!(
            Dataset::new(locations, distances),
            Err(TableError::IndexSpaceMismatch { index: 0, .. })
        ));
    }
}
