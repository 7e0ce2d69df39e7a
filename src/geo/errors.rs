//! Geo error types.
//!
//! The routing pipeline never surfaces these to the dispatcher: they are
//! logged at the call site and collapsed into "not found" outcomes.

use thiserror::Error;

/// Errors that can occur while talking to the geocoding/routing services
/// or decoding their responses.
#[derive(Debug, Error)]
pub enum GeoError {
    /// TCP/HTTP connection to the service failed.
    #[error("connection failed to {endpoint}: {reason}")]
    ConnectionFailed { endpoint: String, reason: String },

    /// Non-2xx HTTP response from the service.
    #[error("HTTP {status}: {body}")]
    HttpError { status: u16, body: String },

    /// The service answered with a body we could not interpret.
    #[error("unexpected response from {endpoint}: {reason}")]
    InvalidResponse { endpoint: String, reason: String },

    /// The encoded polyline ended in the middle of a value or contained a
    /// character outside the encoding alphabet.
    #[error("malformed polyline at byte {position}: {reason}")]
    MalformedPolyline { position: usize, reason: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_malformed_polyline_display() {
        let err = GeoError::MalformedPolyline {
            position: 4,
            reason: "truncated value".into(),
        };
        assert_eq!(err.to_string(), "malformed polyline at byte 4: truncated value");
    }
}
