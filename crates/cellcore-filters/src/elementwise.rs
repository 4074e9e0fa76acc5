//! Threshold, standardize, min-threshold-in-place, increment-nonzero, and
//! non-zero-coordinate extraction (spec §4.2).
//!
//! All five stream a raster volume in raveled order. `threshold` and
//! `standardize` are fused across the full `{u8,u16,u32,i32,f32,f64}`
//! matrix via the [`Element`] trait rather than a hand-written Cartesian
//! product.

use cellcore_core::{require_compatible, Element, RasterDescriptor, RasterVolume, RasterVolumeMut};
use cellcore_core::{ElementType, Result};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// `out[i] = (image[i] < v) ? 0 : MAX(Out)`, comparison done in `f64`
/// (spec §4.2). Threshold bijectivity: `out[i] == 0 <=> image[i] < v`.
///
/// # Errors
/// Returns [`cellcore_core::Error::ShapeMismatch`] if `image` and `out`
/// disagree on shape.
pub fn threshold<In: Element, Out: Element>(
    image: &RasterVolume<In>,
    v: f64,
    out: &mut RasterVolumeMut<Out>,
) -> Result<()> {
    require_compatible(image.shape(), out.shape())?;
    tracing::debug!(shape = ?image.shape(), v, "threshold");

    let src = image.as_slice();
    let dst = out.as_mut_slice();
    for (s, d) in src.iter().zip(dst.iter_mut()) {
        *d = if s.to_f64() < v { Out::ZERO } else { Out::MAX };
    }
    Ok(())
}

/// Three-pass population standardization: `out = (x - mean) / std`, written
/// as `f32`. `N = Z*Y*X`; uses the population (not sample) standard
/// deviation.
///
/// # Errors
/// Returns [`cellcore_core::Error::ShapeMismatch`] if `image` and `out`
/// disagree on shape.
pub fn standardize<In: Element>(
    image: &RasterVolume<In>,
    out: &mut RasterVolumeMut<f32>,
) -> Result<()> {
    require_compatible(image.shape(), out.shape())?;
    let src = image.as_slice();
    let n = src.len() as f64;
    if n == 0.0 {
        return Ok(());
    }

    let sum: f64 = src.iter().map(|x| x.to_f64()).sum();
    let mean = sum / n;

    let sq_sum: f64 = src.iter().map(|x| (x.to_f64() - mean).powi(2)).sum();
    let std = (sq_sum / n).sqrt();

    tracing::debug!(mean, std, n, "standardize");

    let dst = out.as_mut_slice();
    if std == 0.0 {
        // Degenerate constant image: every voxel is exactly the mean.
        // Dividing by zero would produce NaN/Inf; write zeros instead.
        tracing::warn!("standardize: zero population std, writing all zeros");
        dst.fill(0.0);
        return Ok(());
    }
    for (s, d) in src.iter().zip(dst.iter_mut()) {
        *d = ((s.to_f64() - mean) / std) as f32;
    }
    Ok(())
}

/// Zero out voxels below `v`; voxels at or above `v` are untouched.
/// Documented in-place-safe (operates on a single mutable volume).
pub fn min_threshold_in_place<T: Element>(image: &mut RasterVolumeMut<T>, v: f64) {
    tracing::debug!(v, "min_threshold_in_place");
    for s in image.as_mut_slice() {
        if s.to_f64() < v {
            *s = T::ZERO;
        }
    }
}

/// Add `delta` to every non-zero voxel; zeros are untouched.
pub fn increment_nonzero<T: Element>(image: &mut RasterVolumeMut<T>, delta: f64) {
    tracing::debug!(delta, "increment_nonzero");
    for s in image.as_mut_slice() {
        if *s != T::ZERO {
            *s = T::from_f64(s.to_f64() + delta);
        }
    }
}

/// Stream `image`, appending the raveled index of every non-zero voxel to
/// `out_path` as a native-endian 8-byte signed integer. Returns a 1D `i64`
/// descriptor over the written side file.
///
/// # Errors
/// Returns [`cellcore_core::Error::Io`] if the side file cannot be written.
pub fn nonzero_coords<T: Element>(
    image: &RasterVolume<T>,
    out_path: impl AsRef<Path>,
) -> Result<RasterDescriptor> {
    let out_path: PathBuf = out_path.as_ref().to_path_buf();
    let file = std::fs::File::create(&out_path)?;
    let mut w = BufWriter::new(file);

    let mut count: u64 = 0;
    for (idx, s) in image.as_slice().iter().enumerate() {
        if *s != T::ZERO {
            w.write_all(&(idx as i64).to_ne_bytes())?;
            count += 1;
        }
    }
    w.flush()?;

    tracing::debug!(count, path = %out_path.display(), "nonzero_coords");

    Ok(RasterDescriptor {
        path: out_path,
        offset: 0,
        shape: (1, 1, count),
        element_type: ElementType::I64,
    })
}

#[cfg(feature = "parallel")]
/// Data-parallel variant of [`threshold`], splitting work across
/// independent Z-slabs with `rayon` (spec §5 permits this for elementwise
/// filters only).
///
/// # Errors
/// Returns [`cellcore_core::Error::ShapeMismatch`] if shapes disagree.
pub fn threshold_parallel<In: Element, Out: Element>(
    image: &RasterVolume<In>,
    v: f64,
    out: &mut RasterVolumeMut<Out>,
) -> Result<()> {
    use rayon::prelude::*;

    require_compatible(image.shape(), out.shape())?;
    let (_, y, x) = image.shape();
    let slab = (y * x).max(1) as usize;

    let src = image.as_slice();
    let dst = out.as_mut_slice();
    dst.par_chunks_mut(slab)
        .zip(src.par_chunks(slab))
        .for_each(|(dchunk, schunk)| {
            for (s, d) in schunk.iter().zip(dchunk.iter_mut()) {
                *d = if s.to_f64() < v { Out::ZERO } else { Out::MAX };
            }
        });
    Ok(())
}
