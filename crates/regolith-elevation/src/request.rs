//! Elevation window requests and the source trait that answers them.

/// Reserved elevation value marking "no data" (outside raster coverage).
pub const NO_DATA: i16 = i16::MIN;

/// A rectangular, strided window of raster samples.
///
/// The window covers pixels `[x, x + width) × [z, z + height)` sampled every
/// `stride` pixels, yielding `(width / stride) × (height / stride)` values in
/// row-major order.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ElevationRequest {
    /// Dataset key of the planet ("mola").
    pub dataset: String,
    /// First pixel column.
    pub x: u32,
    /// First pixel row.
    pub z: u32,
    /// Window width in pixels.
    pub width: u32,
    /// Window height in pixels.
    pub height: u32,
    /// Pixel spacing between consecutive samples.
    pub stride: u32,
}

impl ElevationRequest {
    /// Samples per row.
    pub fn columns(&self) -> usize {
        (self.width / self.stride.max(1)) as usize
    }

    /// Number of sample rows.
    pub fn rows(&self) -> usize {
        (self.height / self.stride.max(1)) as usize
    }

    /// Total number of samples the response must contain.
    pub fn sample_count(&self) -> usize {
        self.columns() * self.rows()
    }

    /// Check that the window is non-empty and aligned to the stride.
    pub fn validate(&self) -> Result<(), FetchError> {
        if self.stride == 0
            || self.width == 0
            || self.height == 0
            || self.width % self.stride != 0
            || self.height % self.stride != 0
        {
            return Err(FetchError::InvalidRequest(format!(
                "{}x{} window is not a positive multiple of stride {}",
                self.width, self.height, self.stride
            )));
        }
        Ok(())
    }
}

/// Anything that can answer an [`ElevationRequest`].
///
/// Implementations perform exactly one attempt per call; retrying is the
/// caller's decision.
pub trait ElevationSource: Send + Sync {
    /// Fetch the row-major samples of `request`.
    fn fetch(&self, request: &ElevationRequest) -> Result<Vec<i16>, FetchError>;
}

/// Errors produced while fetching elevation or catalog data.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    /// Transport-level failure (connection, timeout, TLS).
    #[error("elevation request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The server answered with a non-success status.
    #[error("elevation server returned {status} for {url}")]
    Status { status: u16, url: String },

    /// The response body was not a JSON array of 16-bit samples.
    #[error("malformed elevation response: {0}")]
    Decode(#[from] serde_json::Error),

    /// The request itself cannot be answered.
    #[error("invalid elevation request: {0}")]
    InvalidRequest(String),

    /// The source is not able to serve data right now.
    #[error("elevation source unavailable: {0}")]
    Unavailable(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(width: u32, height: u32, stride: u32) -> ElevationRequest {
        ElevationRequest {
            dataset: "mola".into(),
            x: 0,
            z: 0,
            width,
            height,
            stride,
        }
    }

    #[test]
    fn test_sample_count() {
        let r = request(128, 64, 32);
        assert_eq!(r.columns(), 4);
        assert_eq!(r.rows(), 2);
        assert_eq!(r.sample_count(), 8);
        assert!(r.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_misaligned_window() {
        assert!(request(100, 64, 32).validate().is_err());
        assert!(request(0, 64, 32).validate().is_err());
        assert!(request(64, 64, 0).validate().is_err());
    }
}
