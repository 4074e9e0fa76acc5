//! Mask-constrained isotropic diffusion flooder (spec §4.8).

use crate::neighbors::neighbor_index;
use cellcore_core::{require_compatible, Error, RasterVolumeMut, Result};
use cellcore_heap::{Heapitem, MinHeap};

/// Tuning knobs for [`diffuse`].
#[derive(Debug, Clone, Copy)]
pub struct DiffusionParams {
    /// A pushed value below this is discarded instead of claiming its
    /// voxel, bounding how far the flood can spread.
    pub threshold: f64,
    /// Blend weight applied to the neighbor mean before averaging with the
    /// voxel's own current value.
    pub k: f64,
}

/// Floods `image` outward from `seeds`, constrained by `mask` (`0` =
/// outside the region of interest, `1` = eligible, `2` = currently queued).
///
/// Seed voxels are set to `1.0` and marked claimed (`mask = 2`) before the
/// flood starts, so a seed is never re-pushed by a neighbor expanding back
/// onto it. After the heap empties, every voxel still marked `2` (the
/// in-band "in-queue" flag) is reset to `1` so the mask carries no
/// transient state past this call.
///
/// # Errors
/// Returns [`cellcore_core::Error::ShapeMismatch`] if `mask` and `image`
/// disagree on shape, or [`cellcore_core::Error::SeedOutOfRange`] if any
/// seed index is outside the volume.
pub fn diffuse(
    mask: &mut RasterVolumeMut<u8>,
    image: &mut RasterVolumeMut<f32>,
    seeds: &[usize],
    structure: &[isize],
    params: &DiffusionParams,
) -> Result<()> {
    require_compatible(mask.shape(), image.shape())?;
    let len = mask.len();
    for &s in seeds {
        if s >= len {
            return Err(Error::SeedOutOfRange { index: s, size: len });
        }
    }

    let img = image.as_mut_slice();
    let msk = mask.as_mut_slice();

    let mut heap = MinHeap::new();
    let mut age: i64 = 0;
    for &s in seeds {
        img[s] = 1.0;
        msk[s] = 2;
        heap.push(Heapitem::new(1.0, 0, s, s));
    }

    tracing::debug!(seeds = seeds.len(), threshold = params.threshold, k = params.k, "diffuse");

    let structure_len = structure.len().max(1) as f64;

    while let Some(elem) = heap.pop() {
        let mut sum = 0.0f64;
        for &delta in structure {
            if let Some(n) = neighbor_index(elem.index, delta, len) {
                sum += f64::from(img[n]);
            }
        }
        let mean = sum / structure_len;
        let value = (mean * params.k + f64::from(img[elem.index])) / 2.0;

        if value < params.threshold {
            continue;
        }

        // A seed's own pop computes a `value` pulled down by its still-zero
        // neighbors; never let that lower a voxel below what it already
        // holds, or a seed's 1.0 gets overwritten on its first pop.
        if value > f64::from(img[elem.index]) {
            img[elem.index] = value as f32;
        }

        for &delta in structure {
            let Some(n) = neighbor_index(elem.index, delta, len) else {
                continue;
            };
            if msk[n] != 1 {
                continue;
            }
            msk[n] = 2;
            age += 1;
            heap.push(Heapitem::new(value, age, n, elem.source));
        }
    }
    heap.done();

    for m in msk.iter_mut() {
        if *m == 2 {
            *m = 1;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use tempfile::NamedTempFile;

    fn tmp() -> PathBuf {
        let f = NamedTempFile::new().unwrap();
        let p = f.path().to_path_buf();
        drop(f);
        p
    }

    fn structure_6(strides: [isize; 3]) -> Vec<isize> {
        vec![-strides[0], strides[0], -strides[1], strides[1], -strides[2], strides[2]]
    }

    #[test]
    fn no_mask_leakage_of_in_queue_flag() {
        let shape = (1u64, 1u64, 5u64);
        let strides = cellcore_core::strides_for_shape(shape);

        let img_path = tmp();
        let mut image = RasterVolumeMut::<f32>::create(&img_path, 0, shape).unwrap();
        image.as_mut_slice().fill(0.0);

        let mask_path = tmp();
        let mut mask = RasterVolumeMut::<u8>::create(&mask_path, 0, shape).unwrap();
        mask.as_mut_slice().fill(1);

        let params = DiffusionParams { threshold: 0.0, k: 1.0 };
        diffuse(&mut mask, &mut image, &[0], &structure_6(strides), &params).unwrap();

        assert!(mask.as_slice().iter().all(|&m| m != 2));

        std::fs::remove_file(&img_path).ok();
        std::fs::remove_file(&mask_path).ok();
    }

    #[test]
    fn seed_reaches_max_value_of_one() {
        let shape = (1u64, 1u64, 3u64);
        let strides = cellcore_core::strides_for_shape(shape);

        let img_path = tmp();
        let mut image = RasterVolumeMut::<f32>::create(&img_path, 0, shape).unwrap();
        image.as_mut_slice().fill(0.0);

        let mask_path = tmp();
        let mut mask = RasterVolumeMut::<u8>::create(&mask_path, 0, shape).unwrap();
        mask.as_mut_slice().fill(1);

        let params = DiffusionParams { threshold: 0.0, k: 1.0 };
        diffuse(&mut mask, &mut image, &[1], &structure_6(strides), &params).unwrap();

        let values = image.as_slice();
        let max = values.iter().cloned().fold(f32::MIN, f32::max);
        assert!((max - 1.0).abs() < 1e-6);
        assert!(values.iter().all(|&v| v >= params.threshold as f32));

        std::fs::remove_file(&img_path).ok();
        std::fs::remove_file(&mask_path).ok();
    }

    #[test]
    fn high_threshold_confines_the_flood() {
        let shape = (1u64, 1u64, 5u64);
        let strides = cellcore_core::strides_for_shape(shape);

        let img_path = tmp();
        let mut image = RasterVolumeMut::<f32>::create(&img_path, 0, shape).unwrap();
        image.as_mut_slice().fill(0.0);

        let mask_path = tmp();
        let mut mask = RasterVolumeMut::<u8>::create(&mask_path, 0, shape).unwrap();
        mask.as_mut_slice().fill(1);

        let params = DiffusionParams { threshold: 0.9, k: 1.0 };
        diffuse(&mut mask, &mut image, &[2], &structure_6(strides), &params).unwrap();

        let values = image.as_slice();
        assert!((values[2] - 1.0).abs() < 1e-6);
        // Neighbors fall below the high threshold quickly and get discarded.
        assert!(values[0] < 0.9 || values[0] == 0.0);

        std::fs::remove_file(&img_path).ok();
        std::fs::remove_file(&mask_path).ok();
    }
}
