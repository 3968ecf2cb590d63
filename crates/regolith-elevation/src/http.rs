//! Elevation server client.
//!
//! The server answers `GET {base}/{dataset}?x=&z=&width=&height=&stride=`
//! with a JSON array of 16-bit elevations in meters. `x` and `z` are the
//! raster column and row of the window origin.

use std::time::Duration;

use reqwest::blocking::Client;

use crate::{ElevationRequest, ElevationSource, FetchError};

/// Blocking HTTP elevation source, intended to be called from loader threads.
#[derive(Clone, Debug)]
pub struct HttpElevationSource {
    client: Client,
    base_url: String,
}

impl HttpElevationSource {
    /// Create a client for `base_url` with the given per-request timeout.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, FetchError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self::with_client(client, base_url))
    }

    /// Reuse an existing client (shared connection pool).
    pub fn with_client(client: Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { client, base_url }
    }

    /// Endpoint URL for a dataset.
    pub fn endpoint(&self, dataset: &str) -> String {
        format!("{}/{}", self.base_url, dataset)
    }

    /// Base URL without trailing slash.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// The underlying client.
    pub fn client(&self) -> &Client {
        &self.client
    }
}

/// Query parameters for a request, in the order the server documents them.
pub(crate) fn query_pairs(request: &ElevationRequest) -> [(&'static str, u32); 5] {
    [
        ("x", request.x),
        ("z", request.z),
        ("width", request.width),
        ("height", request.height),
        ("stride", request.stride),
    ]
}

impl ElevationSource for HttpElevationSource {
    fn fetch(&self, request: &ElevationRequest) -> Result<Vec<i16>, FetchError> {
        request.validate()?;
        let url = self.endpoint(&request.dataset);
        tracing::trace!(%url, x = request.x, z = request.z, stride = request.stride, "fetching elevation");

        let response = self.client.get(&url).query(&query_pairs(request)).send()?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                status: status.as_u16(),
                url,
            });
        }
        let body = response.text()?;
        Ok(serde_json::from_str(&body)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_strips_trailing_slash() {
        let source =
            HttpElevationSource::with_client(Client::new(), "http://localhost:8080/");
        assert_eq!(source.base_url(), "http://localhost:8080");
        assert_eq!(source.endpoint("mola"), "http://localhost:8080/mola");
    }

    #[test]
    fn test_query_names_origin_x_and_z() {
        let request = ElevationRequest {
            dataset: "lola".into(),
            x: 2880,
            z: 5744,
            width: 2912,
            height: 2896,
            stride: 16,
        };
        assert_eq!(
            query_pairs(&request),
            [
                ("x", 2880),
                ("z", 5744),
                ("width", 2912),
                ("height", 2896),
                ("stride", 16)
            ]
        );
    }

    #[test]
    fn test_decode_rejects_out_of_range_samples() {
        let result: Result<Vec<i16>, _> = serde_json::from_str("[1, 2, 70000]");
        assert!(result.is_err());
    }
}
