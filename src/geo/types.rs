//! Shared types for the routing pipeline.

use serde::{Deserialize, Serialize};

/// A WGS84 point in degrees.
///
/// No bounds validation happens here; values are whatever the geocoder or
/// the decoded polyline produced.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinate {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// `lon,lat` — the order routing services expect in their URL paths.
    pub fn to_lon_lat(&self) -> String {
        format!("{},{}", self.longitude, self.latitude)
    }
}

/// An ordered, immutable route geometry.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RoutePath {
    points: Vec<Coordinate>,
}

impl RoutePath {
    pub fn new(points: Vec<Coordinate>) -> Self {
        Self { points }
    }

    pub fn points(&self) -> &[Coordinate] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

/// A successfully planned route between two named places.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RoutePlan {
    pub start_name: String,
    pub end_name: String,
    pub start: Coordinate,
    pub end: Coordinate,
    pub path: RoutePath,
    /// Exact haversine length of `path`, in kilometres.
    pub distance_km: f64,
}

/// Result of running every leg of the pipeline for one request.
#[derive(Debug, Clone, PartialEq)]
pub enum RouteOutcome {
    /// Both places resolved and a path was decoded.
    Found(RoutePlan),
    /// A place could not be geocoded. Carries the first unresolved name.
    PlaceNotFound { name: String },
    /// Both places resolved but no usable path came back.
    RouteUnavailable { start: Coordinate, end: Coordinate },
}
