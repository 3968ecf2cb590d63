//! Planet catalog: which bodies the server can currently serve.

use regolith_geo::PlanetProfile;

use crate::{FetchError, HttpElevationSource};

/// Client for the server's `available` endpoint.
#[derive(Clone, Debug)]
pub struct PlanetCatalog {
    source: HttpElevationSource,
}

impl PlanetCatalog {
    /// Share the connection pool and base URL of an elevation source.
    pub fn new(source: HttpElevationSource) -> Self {
        Self { source }
    }

    /// Fetch the comma-separated identifier list and resolve it to profiles.
    pub fn fetch_available(&self) -> Result<Vec<PlanetProfile>, FetchError> {
        let url = format!("{}/available", self.source.base_url());
        let response = self.source.client().get(&url).send()?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                status: status.as_u16(),
                url,
            });
        }
        let body = response.text()?;
        Ok(parse_catalog(&body))
    }
}

/// Resolve a comma-separated identifier list to built-in profiles.
///
/// Identifiers without a built-in profile are skipped with a warning.
pub fn parse_catalog(body: &str) -> Vec<PlanetProfile> {
    body.split(',')
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .filter_map(|name| {
            let profile = PlanetProfile::by_name(name);
            if profile.is_none() {
                tracing::warn!(planet = name, "server offers a planet without a known profile");
            }
            profile
        })
        .collect()
}
