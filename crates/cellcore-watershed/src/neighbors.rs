//! Raveled-neighborhood helpers shared by watershed and diffusion.

use cellcore_core::coords::{unravel, Strides};

/// Resolve a raveled neighbor of `index` offset by `delta`, bounds-checked
/// against `len`. `structure[]` entries are raw raveled offsets (spec
/// §4.7); a volume boundary or a malformed structure both surface here as
/// `None` rather than wrapping into an unrelated row.
#[must_use]
pub fn neighbor_index(index: usize, delta: isize, len: usize) -> Option<usize> {
    let n = index as isize + delta;
    if n < 0 {
        return None;
    }
    let n = n as usize;
    if n >= len {
        None
    } else {
        Some(n)
    }
}

/// Euclidean distance between two raveled voxels, decomposed via `strides`
/// (spec §4.7's compactness-penalty helper).
#[must_use]
pub fn euclid(p: usize, q: usize, strides: Strides) -> f64 {
    let (pz, py, px) = unravel(p, strides);
    let (qz, qy, qx) = unravel(q, strides);
    let dz = (pz - qz) as f64;
    let dy = (py - qy) as f64;
    let dx = (px - qx) as f64;
    (dz * dz + dy * dy + dx * dx).sqrt()
}
