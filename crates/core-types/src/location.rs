//! Location name → coordinate lookup, in the index order used by routes.

use std::collections::HashMap;
use std::io;

use serde::{Deserialize, Serialize};

use crate::error::TableError;

/// Geographic coordinate in decimal degrees.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinate {
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }
}

#[derive(Debug, Deserialize)]
struct LocationRow {
    name: String,
    latitude: f64,
    longitude: f64,
}

/// Ordered list of location names plus their coordinates.
///
/// The position of a name in [`LocationTable::names`] is the index a solver
/// route refers to.
#[derive(Clone, Debug, PartialEq)]
pub struct LocationTable {
    names: Vec<String>,
    coordinates: HashMap<String, Coordinate>,
}

impl LocationTable {
    pub fn new(
        names: Vec<String>,
        coordinates: HashMap<String, Coordinate>,
    ) -> Result<Self, TableError> {
        if names.is_empty() {
            return Err(TableError::Empty);
        }
        for (idx, name) in names.iter().enumerate() {
            if names[..idx].contains(name) {
                return Err(TableError::DuplicateLocation(name.clone()));
            }
            if !coordinates.contains_key(name) {
                return Err(TableError::MissingCoordinate(name.clone()));
            }
        }
        Ok(Self { names, coordinates })
    }

    /// Reads a `name,latitude,longitude` CSV; row order defines the index space.
    pub fn from_csv<R: io::Read>(reader: R) -> Result<Self, TableError> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::All)
            .from_reader(reader);
        let mut names = Vec::new();
        let mut coordinates = HashMap::new();
        for row in reader.deserialize::<LocationRow>() {
            let row = row?;
            coordinates.insert(
                row.name.clone(),
                Coordinate::new(row.latitude, row.longitude),
            );
            names.push(row.name);
        }
        Self::new(names, coordinates)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn name(&self, index: usize) -> Option<&str> {
        self.names.get(index).map(String::as_str)
    }

    pub fn coordinate(&self, index: usize) -> Option<Coordinate> {
        self.name(index)
            .and_then(|name| self.coordinates.get(name))
            .copied()
    }

    pub fn coordinate_by_name(&self, name: &str) -> Option<Coordinate> {
        self.coordinates.get(name).copied()
    }
}
