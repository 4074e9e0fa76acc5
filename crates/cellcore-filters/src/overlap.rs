//! Two-threshold label reconciliation (spec §4.9).
//!
//! The source backs the "keep" set with a dense bit array sized `2^32-1`;
//! we use a `HashSet<i32>` keyed by observed `label_1` value instead,
//! contract-equivalent per spec §9.

use cellcore_core::{require_compatible, RasterVolume, RasterVolumeMut, Result};
use std::collections::HashSet;

/// Keep a `label_1` voxel only if it ever co-occurs with a non-zero
/// `label_0` voxel anywhere in the volume; otherwise zero it.
///
/// `out` may alias `label_1` (documented in-place-safe).
///
/// Overlap conservatism: `out[i]` is always either `0` or `label_1[i]`,
/// never a value that didn't already appear in `label_1`.
///
/// # Errors
/// Returns [`cellcore_core::Error::ShapeMismatch`] if `label_0`, `label_1`,
/// and `out` disagree on shape.
pub fn overlap(
    label_0: &RasterVolume<i32>,
    label_1: &RasterVolume<i32>,
    out: &mut RasterVolumeMut<i32>,
) -> Result<()> {
    require_compatible(label_0.shape(), label_1.shape())?;
    require_compatible(label_1.shape(), out.shape())?;

    let mut keep: HashSet<i32> = HashSet::new();
    for (&a, &b) in label_0.as_slice().iter().zip(label_1.as_slice().iter()) {
        if a != 0 && b != 0 {
            keep.insert(b);
        }
    }

    tracing::debug!(kept = keep.len(), "overlap");

    for (&b, d) in label_1.as_slice().iter().zip(out.as_mut_slice().iter_mut()) {
        *d = if keep.contains(&b) { b } else { 0 };
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

    #[test]
    fn overlap_scenario_from_spec() {
        let l0_path = tmp();
        {
            let mut v = RasterVolumeMut::<i32>::create(&l0_path, 0, (1, 1, 4)).unwrap();
            v.as_mut_slice().copy_from_slice(&[1, 1, 0, 0]);
        }
        let l1_path = tmp();
        {
            let mut v = RasterVolumeMut::<i32>::create(&l1_path, 0, (1, 1, 4)).unwrap();
            v.as_mut_slice().copy_from_slice(&[7, 0, 7, 8]);
        }
        let label_0 = RasterVolume::<i32>::open(&l0_path, 0, (1, 1, 4)).unwrap();
        let label_1 = RasterVolume::<i32>::open(&l1_path, 0, (1, 1, 4)).unwrap();

        let out_path = tmp();
        let mut out = RasterVolumeMut::<i32>::create(&out_path, 0, (1, 1, 4)).unwrap();
        overlap(&label_0, &label_1, &mut out).unwrap();

        assert_eq!(out.as_slice(), &[7, 0, 0, 0]);

        std::fs::remove_file(&l0_path).ok();
        std::fs::remove_file(&l1_path).ok();
        std::fs::remove_file(&out_path).ok();
    }

    proptest::proptest! {
        #[test]
        fn overlap_output_is_always_zero_or_the_original_label_1_value(
            l0 in proptest::collection::vec(0i32..3, 1..64),
            l1 in proptest::collection::vec(0i32..3, 1..64),
        ) {
            let len = l0.len().min(l1.len());
            let l0 = &l0[..len];
            let l1 = &l1[..len];

            let l0_path = tmp();
            {
                let mut v = RasterVolumeMut::<i32>::create(&l0_path, 0, (1, 1, len as u64)).unwrap();
                v.as_mut_slice().copy_from_slice(l0);
            }
            let l1_path = tmp();
            {
                let mut v = RasterVolumeMut::<i32>::create(&l1_path, 0, (1, 1, len as u64)).unwrap();
                v.as_mut_slice().copy_from_slice(l1);
            }
            let label_0 = RasterVolume::<i32>::open(&l0_path, 0, (1, 1, len as u64)).unwrap();
            let label_1 = RasterVolume::<i32>::open(&l1_path, 0, (1, 1, len as u64)).unwrap();

            let out_path = tmp();
            let mut out = RasterVolumeMut::<i32>::create(&out_path, 0, (1, 1, len as u64)).unwrap();
            overlap(&label_0, &label_1, &mut out).unwrap();

            for (&src, &dst) in l1.iter().zip(out.as_slice().iter()) {
                prop_assert!(dst == 0 || dst == src);
            }

            std::fs::remove_file(&l0_path).ok();
            std::fs::remove_file(&l1_path).ok();
            std::fs::remove_file(&out_path).ok();
        }
    }
}
