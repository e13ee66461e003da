//! Geometry resolution for displayed solutions.
//!
//! Given a route of location indices this produces the closed polyline to draw
//! and the directed distance of every leg, looked up `[from][to]` in the
//! distance table without any symmetrisation.

use serde::Serialize;
use thiserror::Error;
use tsp_core_types::{Coordinate, Dataset};

const METERS_PER_KILOMETER: f64 = 1000.0;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum GeometryError {
    #[error("route refers to unknown location index {index}")]
    UnknownLocation { index: usize },
    #[error("no distance recorded for {from} -> {to}")]
    MissingDistance { from: usize, to: usize },
}

/// One directed leg of a tour.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct RouteEdge {
    pub from: usize,
    pub to: usize,
    pub meters: f64,
}

impl RouteEdge {
    pub fn kilometers(&self) -> f64 {
        meters_to_kilometers(self.meters)
    }
}

/// Renderable form of a route.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct RouteGeometry {
    /// Ordered path; for a non-empty route the first coordinate is repeated at
    /// the end to close the loop.
    pub coordinates: Vec<Coordinate>,
    pub edges: Vec<RouteEdge>,
}

impl RouteGeometry {
    pub fn total_meters(&self) -> f64 {
        self.edges.iter().map(|edge| edge.meters).sum()
    }

    pub fn total_kilometers(&self) -> f64 {
        meters_to_kilometers(self.total_meters())
    }
}

pub fn meters_to_kilometers(meters: f64) -> f64 {
    meters / METERS_PER_KILOMETER
}

#[derive(Clone, Debug)]
pub struct GeometryResolver {
    dataset: Dataset,
}

impl GeometryResolver {
    pub fn new(dataset: Dataset) -> Self {
        Self { dataset }
    }

    pub fn dataset(&self) -> &Dataset {
        &self.dataset
    }

    pub fn resolve(&self, route: &[usize]) -> Result<RouteGeometry, GeometryError> {
        Ok(RouteGeometry {
            coordinates: self.coordinates(route)?,
            edges: self.edges(route)?,
        })
    }

    pub fn coordinates(&self, route: &[usize]) -> Result<Vec<Coordinate>, GeometryError> {
        let mut path = Vec::with_capacity(route.len() + 1);
        for &index in route {
            let coordinate = self
                .dataset
                .locations
                .coordinate(index)
                .ok_or(GeometryError::UnknownLocation { index })?;
            path.push(coordinate);
        }
        if let Some(first) = path.first().copied() {
            path.push(first);
        }
        Ok(path)
    }

    /// Legs `route[i] -> route[(i + 1) % n]`, including the closing leg.
    pub fn edges(&self, route: &[usize]) -> Result<Vec<RouteEdge>, GeometryError> {
        let n = route.len();
        let mut edges = Vec::with_capacity(n);
        for i in 0..n {
            let from = route[i];
            let to = route[(i + 1) % n];
            let meters = self
                .dataset
                .distances
                .get(from, to)
                .ok_or(GeometryError::MissingDistance { from, to })?;
            edges.push(RouteEdge { from, to, meters });
        }
        Ok(edges)
    }

    pub fn location_names<'a>(&'a self, route: &[usize]) -> Vec<&'a str> {
        route
            .iter()
            .map(|&index| self.dataset.locations.name(index).unwrap_or("?"))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tsp_core_types::{DistanceMatrix, LocationTable};

    fn resolver() -> GeometryResolver {
        let locations = LocationTable::from_csv(
            "name,latitude,longitude\nA,0,0\nB,1,1\nC,2,2\n".as_bytes(),
        )
        .unwrap();
        let distances = DistanceMatrix::from_csv(
            ",A,B,C\nA,0,100,300\nB,110,0,200\nC,310,190,0\n".as_bytes(),
        )
        .unwrap();
        GeometryResolver::new(Dataset::new(locations, distances).unwrap())
    }

    #[test]
    fn non_empty_route_closes_the_loop() {
        let geometry = resolver().resolve(&[2, 0, 1]).unwrap();
        assert_eq!(geometry.coordinates.len(), 4);
        assert_eq!(geometry.coordinates.first(), geometry.coordinates.last());
        assert_eq!(geometry.coordinates[0], Coordinate::new(2.0, 2.0));
    }

    #[test]
    fn empty_route_has_no_closing_point() {
        let geometry = resolver().resolve(&[]).unwrap();
        assert!(geometry.coordinates.is_empty());
        assert!(geometry.edges.is_empty());
    }

    #[test]
    fn edges_use_the_directed_entry() {
        let resolver = resolver();
        let forward = resolver.edges(&[0, 1]).unwrap();
        assert_eq!(forward[0].meters, 100.0);
        assert_eq!(forward[1].meters, 110.0);

        let backward = resolver.edges(&[1, 0]).unwrap();
        assert_eq!(backward[0].meters, 110.0);
        assert_ne!(backward[0].meters, (100.0 + 110.0) / 2.0);
    }

    #[test]
    fn closing_leg_is_included_in_the_total() {
        let geometry = resolver().resolve(&[0, 1, 2]).unwrap();
        let legs: Vec<(usize, usize)> = geometry.edges.iter().map(|e| (e.from, e.to)).collect();
        assert_eq!(legs, vec![(0, 1), (1, 2), (2, 0)]);
        assert_eq!(geometry.total_meters(), 100.0 + 200.0 + 310.0);
        assert_eq!(geometry.total_kilometers(), 0.61);
    }

    #[test]
    fn single_stop_route_is_a_zero_length_loop() {
        let geometry = resolver().resolve(&[1]).unwrap();
        assert_eq!(geometry.coordinates.len(), 2);
        assert_eq!(geometry.edges, vec![RouteEdge { from: 1, to: 1, meters: 0.0 }]);
    }

    #[test]
    fn unknown_indices_are_errors() {
        assert_eq!(
            resolver().resolve(&[0, 7]),
            Err(GeometryError::UnknownLocation { index: 7 })
        );
    }
}
