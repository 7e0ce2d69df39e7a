//! GeoRoutingPipeline — place names in, decoded route and distance out.
//!
//! Every leg swallows its own failures: a geocoding or routing error is
//! logged and reported as "not found", never propagated to the dispatcher.

use std::sync::Arc;

use super::client::GeoService;
use super::distance::total_distance_km;
use super::polyline::decode_polyline;
use super::types::{Coordinate, RouteOutcome, RoutePath, RoutePlan};

/// Resolves places and routes through a [`GeoService`].
#[derive(Clone)]
pub struct GeoRoutingPipeline {
    service: Arc<dyn GeoService>,
}

impl GeoRoutingPipeline {
    pub fn new(service: Arc<dyn GeoService>) -> Self {
        Self { service }
    }

    /// Geocode a free-text place name. `None` on no result or any failure.
    pub async fn resolve_place(&self, name: &str) -> Option<Coordinate> {
        match self.service.geocode(name).await {
            Ok(Some(coord)) => {
                tracing::debug!(
                    place = name,
                    lat = coord.latitude,
                    lon = coord.longitude,
                    "place resolved"
                );
                Some(coord)
            }
            Ok(None) => {
                tracing::info!(place = name, "geocoder returned no result");
                None
            }
            Err(e) => {
                tracing::warn!(place = name, error = %e, "geocoding failed");
                None
            }
        }
    }

    /// Fetch and decode the route between two points. `None` on any failure,
    /// including a malformed geometry.
    pub async fn fetch_route(&self, from: Coordinate, to: Coordinate) -> Option<RoutePath> {
        let encoded = match self.service.route_geometry(from, to).await {
            Ok(Some(encoded)) => encoded,
            Ok(None) => {
                tracing::info!("routing service returned no route");
                return None;
            }
            Err(e) => {
                tracing::warn!(error = %e, "route request failed");
                return None;
            }
        };

        match decode_polyline(&encoded) {
            Ok(path) => {
                tracing::debug!(points = path.len(), "route decoded");
                Some(path)
            }
            Err(e) => {
                tracing::warn!(error = %e, "route geometry could not be decoded");
                None
            }
        }
    }

    /// Run every leg for one request.
    ///
    /// `on_located` fires once both places are resolved, before the route
    /// request, so the caller can show the endpoints while the path loads.
    /// The start place is geocoded first and reported first when both fail.
    pub async fn plan_route<F>(&self, start: &str, end: &str, on_located: F) -> RouteOutcome
    where
        F: FnOnce(Coordinate, Coordinate),
    {
        let start_coord = self.resolve_place(start).await;
        let end_coord = self.resolve_place(end).await;

        let (from, to) = match (start_coord, end_coord) {
            (Some(from), Some(to)) => (from, to),
            (None, _) => {
                return RouteOutcome::PlaceNotFound {
                    name: start.to_string(),
                }
            }
            (_, None) => {
                return RouteOutcome::PlaceNotFound {
                    name: end.to_string(),
                }
            }
        };

        on_located(from, to);

        match self.fetch_route(from, to).await {
            Some(path) => {
                let distance_km = total_distance_km(&path);
                RouteOutcome::Found(RoutePlan {
                    start_name: start.to_string(),
                    end_name: end.to_string(),
                    start: from,
                    end: to,
                    path,
                    distance_km,
                })
            }
            None => RouteOutcome::RouteUnavailable {
                start: from,
                end: to,
            },
        }
    }
}
