//! HTTP clients for the geocoding and routing services.
//!
//! Geocoding speaks the Nominatim search API (`[{ "lat": "..", "lon": ".." }]`),
//! routing speaks the OSRM route API (`{ "routes": [{ "geometry": ".." }] }`
//! with `geometries=polyline`). Both are behind [`GeoService`] so the
//! pipeline can be exercised without a network.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client as HttpClient;
use serde::Deserialize;

use super::errors::GeoError;
use super::types::Coordinate;
use crate::config::GeoConfig;

// ─── Constants ───────────────────────────────────────────────────────────────

/// TCP connection timeout.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

// ─── Service Trait ───────────────────────────────────────────────────────────

/// External geocoding + routing collaborator.
///
/// `Ok(None)` means the service answered but had nothing for the query.
#[async_trait]
pub trait GeoService: Send + Sync {
    /// First match for a free-text place query.
    async fn geocode(&self, query: &str) -> Result<Option<Coordinate>, GeoError>;

    /// Encoded polyline of the first route between two points.
    async fn route_geometry(
        &self,
        from: Coordinate,
        to: Coordinate,
    ) -> Result<Option<String>, GeoError>;
}

// ─── Wire Types ──────────────────────────────────────────────────────────────

/// One Nominatim search hit. Coordinates arrive as strings.
#[derive(Debug, Deserialize)]
struct PlaceHit {
    lat: String,
    lon: String,
}

#[derive(Debug, Deserialize)]
struct RouteResponse {
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    routes: Vec<RouteEntry>,
}

#[derive(Debug, Deserialize)]
struct RouteEntry {
    geometry: String,
}

// ─── HttpGeoClient ───────────────────────────────────────────────────────────

/// Live [`GeoService`] backed by `reqwest`.
pub struct HttpGeoClient {
    http: HttpClient,
    config: GeoConfig,
}

impl HttpGeoClient {
    pub fn new(config: GeoConfig) -> Result<Self, GeoError> {
        let http = HttpClient::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| GeoError::ConnectionFailed {
                endpoint: config.geocode_url.clone(),
                reason: format!("failed to build HTTP client: {e}"),
            })?;

        Ok(Self { http, config })
    }

    /// Route URL for a pair of points: `{root}/{profile}/{lon,lat};{lon,lat}`.
    fn route_url(&self, from: Coordinate, to: Coordinate) -> String {
        format!(
            "{}/{}/{};{}",
            self.config.route_url.trim_end_matches('/'),
            self.config.profile,
            from.to_lon_lat(),
            to.to_lon_lat()
        )
    }

    async fn get_text(
        &self,
        url: &str,
        query: &[(&str, &str)],
    ) -> Result<String, GeoError> {
        let response = self
            .http
            .get(url)
            .query(query)
            .send()
            .await
            .map_err(|e| GeoError::ConnectionFailed {
                endpoint: url.to_string(),
                reason: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GeoError::HttpError {
                status: status.as_u16(),
                body,
            });
        }

        response.text().await.map_err(|e| GeoError::InvalidResponse {
            endpoint: url.to_string(),
            reason: format!("failed to read body: {e}"),
        })
    }
}

#[async_trait]
impl GeoService for HttpGeoClient {
    async fn geocode(&self, query: &str) -> Result<Option<Coordinate>, GeoError> {
        let url = &self.config.geocode_url;
        tracing::debug!(url = %url, query, "geocode request");

        let body = self
            .get_text(url, &[("q", query), ("format", "json"), ("limit", "1")])
            .await?;

        parse_place_hits(url, &body)
    }

    async fn route_geometry(
        &self,
        from: Coordinate,
        to: Coordinate,
    ) -> Result<Option<String>, GeoError> {
        let url = self.route_url(from, to);
        tracing::debug!(url = %url, "route request");

        let body = self
            .get_text(&url, &[("overview", "full"), ("geometries", "polyline")])
            .await?;

        parse_route_geometry(&url, &body)
    }
}

// ─── Response Parsing ────────────────────────────────────────────────────────

/// Pick the first hit out of a Nominatim search body.
fn parse_place_hits(endpoint: &str, body: &str) -> Result<Option<Coordinate>, GeoError> {
    let hits: Vec<PlaceHit> =
        serde_json::from_str(body).map_err(|e| GeoError::InvalidResponse {
            endpoint: endpoint.to_string(),
            reason: format!("failed to parse search results: {e}"),
        })?;

    let Some(first) = hits.into_iter().next() else {
        return Ok(None);
    };

    let parse = |field: &str, value: &str| {
        value
            .trim()
            .parse::<f64>()
            .map_err(|e| GeoError::InvalidResponse {
                endpoint: endpoint.to_string(),
                reason: format!("{field} '{value}' is not a number: {e}"),
            })
    };

    Ok(Some(Coordinate {
        latitude: parse("lat", &first.lat)?,
        longitude: parse("lon", &first.lon)?,
    }))
}

/// Pick the first route geometry out of an OSRM route body.
fn parse_route_geometry(endpoint: &str, body: &str) -> Result<Option<String>, GeoError> {
    let resp: RouteResponse =
        serde_json::from_str(body).map_err(|e| GeoError::InvalidResponse {
            endpoint: endpoint.to_string(),
            reason: format!("failed to parse route response: {e}"),
        })?;

    if let Some(code) = resp.code.as_deref() {
        if code != "Ok" {
            tracing::debug!(code, "route service returned no route");
            return Ok(None);
        }
    }

    Ok(resp.routes.into_iter().next().map(|r| r.geometry))
}
