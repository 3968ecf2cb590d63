use regolith_elevation::FetchError;

/// Errors produced while turning an elevation window into a mesh.
#[derive(Debug, thiserror::Error)]
pub enum GridError {
    /// The window is empty or not aligned to its stride.
    #[error("grid window {width}x{height} is not a positive multiple of stride {stride}")]
    InvalidWindow { width: u32, height: u32, stride: u32 },

    /// The sample buffer does not match the window dimensions.
    #[error("expected {expected} elevation samples, got {actual}")]
    MalformedGrid { expected: usize, actual: usize },

    /// The single fetch for this window failed.
    #[error(transparent)]
    Fetch(#[from] FetchError),
}
