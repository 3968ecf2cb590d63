//! In-memory elevation raster.

use crate::{ElevationRequest, ElevationSource, FetchError, NO_DATA};

/// A full elevation raster held in memory.
///
/// Samples outside the raster answer [`NO_DATA`], the same way the server
/// marks the border of its coverage.
#[derive(Clone, Debug)]
pub struct RasterElevationSource {
    width: u32,
    height: u32,
    samples: Vec<i16>,
}

impl RasterElevationSource {
    /// Wrap a row-major sample buffer.
    ///
    /// # Panics
    ///
    /// Panics if `samples.len() != width * height`.
    pub fn new(width: u32, height: u32, samples: Vec<i16>) -> Self {
        assert_eq!(
            samples.len(),
            width as usize * height as usize,
            "raster buffer does not match {width}x{height}"
        );
        Self {
            width,
            height,
            samples,
        }
    }

    /// Build a raster by evaluating `f(x, z)` for every pixel.
    pub fn from_fn(width: u32, height: u32, mut f: impl FnMut(u32, u32) -> i16) -> Self {
        let mut samples = Vec::with_capacity(width as usize * height as usize);
        for z in 0..height {
            for x in 0..width {
                samples.push(f(x, z));
            }
        }
        Self::new(width, height, samples)
    }

    /// Sample at pixel `(x, z)`, or [`NO_DATA`] outside the raster.
    pub fn get(&self, x: u32, z: u32) -> i16 {
        if x < self.width && z < self.height {
            self.samples[z as usize * self.width as usize + x as usize]
        } else {
            NO_DATA
        }
    }

    /// Raster width in pixels.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Raster height in pixels.
    pub fn height(&self) -> u32 {
        self.height
    }
}

impl ElevationSource for RasterElevationSource {
    fn fetch(&self, request: &ElevationRequest) -> Result<Vec<i16>, FetchError> {
        request.validate()?;
        let mut out = Vec::with_capacity(request.sample_count());
        for row in 0..request.rows() as u32 {
            for col in 0..request.columns() as u32 {
                out.push(self.get(
                    request.x + col * request.stride,
                    request.z + row * request.stride,
                ));
            }
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ramp() -> RasterElevationSource {
        RasterElevationSource::from_fn(8, 4, |x, z| (z * 100 + x) as i16)
    }

    #[test]
    fn test_strided_window_is_row_major() {
        let request = ElevationRequest {
            dataset: "test".into(),
            x: 2,
            z: 0,
            width: 4,
            height: 4,
            stride: 2,
        };
        let samples = ramp().fetch(&request).unwrap();
        assert_eq!(samples, vec![2, 4, 202, 204]);
    }

    #[test]
    fn test_out_of_range_is_no_data() {
        let request = ElevationRequest {
            dataset: "test".into(),
            x: 6,
            z: 2,
            width: 4,
            height: 4,
            stride: 2,
        };
        let samples = ramp().fetch(&request).unwrap();
        assert_eq!(samples, vec![206, NO_DATA, NO_DATA, NO_DATA]);
    }

    #[test]
    fn test_invalid_window_rejected() {
        let request = ElevationRequest {
            dataset: "test".into(),
            x: 0,
            z: 0,
            width: 3,
            height: 4,
            stride: 2,
        };
        assert!(matches!(
            ramp().fetch(&request),
            Err(FetchError::InvalidRequest(_))
        ));
    }
}
