//! Planet profile: the immutable raster and scale constants of one body.

/// Edge length of a terrain chunk in raster pixels.
pub const CHUNK_SIZE_PIXELS: u32 = 2880;

/// Base sampling stride in raster pixels, applied before any LOD factor.
pub const GLOBAL_STRIDE: u32 = 16;

/// Meters represented by one rendering-space unit.
pub const METERS_PER_RENDER_UNIT: f64 = 10_000.0;

/// Immutable description of a planet's elevation raster.
///
/// A profile is built once per selectable planet and replaced wholesale when
/// the user switches planets; nothing mutates it afterwards.
#[derive(Clone, Debug, PartialEq)]
pub struct PlanetProfile {
    /// Catalog identifier as reported by the server ("Mars").
    pub name: String,
    /// Dataset key used in elevation requests ("mola").
    pub dataset: String,
    /// Ground distance covered by one raster pixel, in meters.
    pub meters_per_pixel: f64,
    /// Raster width in pixels (full longitude range).
    pub pixels_width: u32,
    /// Raster height in pixels (full latitude range).
    pub pixels_height: u32,
    /// Reference sphere radius in meters.
    pub radius_meters: f64,
    /// Chunk edge length in pixels.
    pub chunk_size_pixels: u32,
    /// Base sampling stride in pixels.
    pub global_stride: u32,
    /// Meters per rendering unit.
    pub meters_per_render_unit: f64,
}

impl PlanetProfile {
    /// Construct a profile with the default chunking and scale constants.
    ///
    /// # Panics
    ///
    /// Panics if the raster dimensions are not multiples of the chunk size or
    /// if the radius or pixel size is not positive.
    pub fn new(
        name: impl Into<String>,
        dataset: impl Into<String>,
        meters_per_pixel: f64,
        pixels_width: u32,
        pixels_height: u32,
        radius_meters: f64,
    ) -> Self {
        Self::with_chunking(
            name,
            dataset,
            meters_per_pixel,
            pixels_width,
            pixels_height,
            radius_meters,
            CHUNK_SIZE_PIXELS,
            GLOBAL_STRIDE,
        )
    }

    /// Construct a profile with explicit chunk size and global stride.
    ///
    /// # Panics
    ///
    /// Same conditions as [`PlanetProfile::new`], plus `chunk_size_pixels`
    /// must be a positive multiple of `global_stride`.
    #[allow(clippy::too_many_arguments)]
    pub fn with_chunking(
        name: impl Into<String>,
        dataset: impl Into<String>,
        meters_per_pixel: f64,
        pixels_width: u32,
        pixels_height: u32,
        radius_meters: f64,
        chunk_size_pixels: u32,
        global_stride: u32,
    ) -> Self {
        assert!(meters_per_pixel > 0.0, "meters per pixel must be positive");
        assert!(radius_meters > 0.0, "planet radius must be positive, got {radius_meters}");
        assert!(
            global_stride > 0 && chunk_size_pixels % global_stride == 0,
            "chunk size {chunk_size_pixels} must be a multiple of stride {global_stride}"
        );
        assert!(
            pixels_width % chunk_size_pixels == 0 && pixels_height % chunk_size_pixels == 0,
            "raster {pixels_width}x{pixels_height} must be divisible into {chunk_size_pixels}px chunks"
        );
        Self {
            name: name.into(),
            dataset: dataset.into(),
            meters_per_pixel,
            pixels_width,
            pixels_height,
            radius_meters,
            chunk_size_pixels,
            global_stride,
            meters_per_render_unit: METERS_PER_RENDER_UNIT,
        }
    }

    /// Mars, from the MGS MOLA 463 m global mosaic.
    pub fn mars() -> Self {
        Self::new("Mars", "mola", 463.0835744, 46_080, 23_040, 3_396_190.0)
    }

    /// The Moon, from the LRO LOLA 118 m global mosaic.
    pub fn moon() -> Self {
        Self::new("Moon", "lola", 118.4505876, 92_160, 46_080, 1_737_400.0)
    }

    /// Mercury, from the MESSENGER 665 m global mosaic.
    pub fn mercury() -> Self {
        Self::new("Mercury", "messenger", 665.24315270546, 23_040, 11_520, 2_439_400.0)
    }

    /// Look up a built-in profile by catalog identifier (case-insensitive).
    pub fn by_name(name: &str) -> Option<Self> {
        builtin_profiles()
            .into_iter()
            .find(|p| p.name.eq_ignore_ascii_case(name))
    }

    /// Number of chunk columns.
    pub fn chunk_width(&self) -> u32 {
        self.pixels_width / self.chunk_size_pixels
    }

    /// Number of chunk rows.
    pub fn chunk_height(&self) -> u32 {
        self.pixels_height / self.chunk_size_pixels
    }

    /// Ground distance spanned by one chunk edge, in meters.
    pub fn meters_per_chunk(&self) -> f64 {
        self.chunk_size_pixels as f64 * self.meters_per_pixel
    }

    /// Planet radius in rendering units.
    pub fn radius_render_units(&self) -> f64 {
        self.radius_meters / self.meters_per_render_unit
    }

    /// Raster pixels per rendering unit.
    pub fn pixels_per_render_unit(&self) -> f64 {
        1.0 / self.meters_per_pixel * self.meters_per_render_unit
    }

    /// Largest power-of-two LOD factor `f` for which `global_stride * f`
    /// still divides the chunk edge, so every LOD lands on chunk boundaries.
    pub fn max_lod_factor(&self) -> u32 {
        let samples = self.chunk_size_pixels / self.global_stride;
        1 << samples.trailing_zeros()
    }
}

/// All built-in planet profiles, in catalog order.
pub fn builtin_profiles() -> Vec<PlanetProfile> {
    vec![
        PlanetProfile::mars(),
        PlanetProfile::moon(),
        PlanetProfile::mercury(),
    ]
}
