//! Geo — place resolution and route geometry.
//!
//! Submodules:
//! - `client`: `GeoService` trait and the Nominatim/OSRM HTTP client
//! - `pipeline`: geocode → route → decode → distance, failures collapsed
//! - `polyline`: encoded polyline decoder
//! - `distance`: haversine segment sums
//! - `types`: coordinates, paths, route outcomes
//! - `errors`: geo error types

pub mod client;
pub mod distance;
pub mod errors;
pub mod pipeline;
pub mod polyline;
pub mod types;

pub use client::{GeoService, HttpGeoClient};
pub use distance::{haversine_km, round_km, total_distance_km};
pub use errors::GeoError;
pub use pipeline::GeoRoutingPipeline;
pub use polyline::decode_polyline;
pub use types::{Coordinate, RouteOutcome, RoutePath, RoutePlan};
