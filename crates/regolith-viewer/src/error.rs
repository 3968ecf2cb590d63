use regolith_elevation::FetchError;
use regolith_streaming::LoaderError;

#[derive(Debug, thiserror::Error)]
pub enum ViewerError {
    #[error("no built-in profile for planet {0:?}")]
    UnknownPlanet(String),

    #[error("planet {requested:?} is not offered by the server (available: {available})")]
    PlanetUnavailable { requested: String, available: String },

    #[error("elevation server: {0}")]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Loader(#[from] LoaderError),
}
