//! Level-of-detail policy.
//!
//! Detail is traded against the number of visible chunks: the more chunks on
//! screen, the coarser each one is sampled, which keeps the total vertex
//! count roughly bounded as the camera pulls away from the surface.

use regolith_geo::PlanetProfile;

/// Largest power of two not exceeding `visible_count` (1 for 0 or 1).
pub fn lod_factor(visible_count: usize) -> u32 {
    if visible_count <= 1 {
        return 1;
    }
    let floor_log2 = usize::BITS - 1 - visible_count.leading_zeros();
    1u32.checked_shl(floor_log2).unwrap_or(1 << 31)
}

/// Pixel stride for the current pass: the profile's global stride scaled by
/// the LOD factor, capped so windows stay aligned to chunk boundaries.
pub fn sample_stride(profile: &PlanetProfile, visible_count: usize) -> u32 {
    profile.global_stride * lod_factor(visible_count).min(profile.max_lod_factor())
}
