//! Slice-by-slice 3D label stitching (spec §4.5).

use crate::label2d::label_2d;
use cellcore_core::{require_compatible, RasterVolume, RasterVolumeMut, Result};
use std::collections::HashMap;

/// Labels every slice of `mask` with [`label_2d`] and resolves inter-slice
/// label equivalences into one global `i32` labelling, written to `out`.
/// Returns the high-water-mark label id (`lastLabel`).
///
/// Mirrors spec §4.5's per-pair algorithm exactly: shift `B`'s labels to
/// fresh global ids, build a first-writer-wins forward `lookup` against the
/// already-written slice `A`, remap `B` through it, then record a
/// first-writer-wins reverse correspondence for this layer. After every
/// slice has been processed, reverse-lookup chains are chased to a final
/// per-label resolution and the whole volume is rewritten through it.
///
/// # Errors
/// Returns [`cellcore_core::Error::ShapeMismatch`] if `mask` and `out`
/// disagree on shape.
pub fn stitch_slices(mask: &RasterVolume<u8>, out: &mut RasterVolumeMut<i32>) -> Result<i32> {
    require_compatible(mask.shape(), out.shape())?;
    let (z, y, x) = mask.shape();
    let plane_len = (y * x) as usize;
    if z == 0 {
        return Ok(0);
    }

    let mask_slice = mask.as_slice();
    let out_slice = out.as_mut_slice();

    let bools0: Vec<bool> = mask_slice[0..plane_len].iter().map(|&v| v != 0).collect();
    let (labels0, n0) = label_2d(&bools0, (y, x));
    out_slice[0..plane_len].copy_from_slice(&labels0);
    let mut last_label = n0;

    let mut rev_tables: Vec<HashMap<i32, i32>> = Vec::with_capacity((z as usize).saturating_sub(1));

    for zi in 0..(z as usize).saturating_sub(1) {
        let a_start = zi * plane_len;
        let b_start = (zi + 1) * plane_len;

        let bools_b: Vec<bool> = mask_slice[b_start..b_start + plane_len]
            .iter()
            .map(|&v| v != 0)
            .collect();
        let (labels_b, _) = label_2d(&bools_b, (y, x));

        let mut new_labels_lookup: HashMap<i32, i32> = HashMap::new();
        let mut shifted = vec![0i32; plane_len];
        for (p, &b) in labels_b.iter().enumerate() {
            if b > 0 {
                let g = *new_labels_lookup.entry(b).or_insert_with(|| {
                    last_label += 1;
                    last_label
                });
                shifted[p] = g;
            }
        }

        let mut lookup: HashMap<i32, i32> = HashMap::new();
        for p in 0..plane_len {
            let a = out_slice[a_start + p];
            let sb = shifted[p];
            if a > 0 && sb > 0 {
                lookup.entry(sb).or_insert(a);
            }
        }
        for v in &mut shifted {
            if *v > 0 {
                if let Some(&mapped) = lookup.get(v) {
                    *v = mapped;
                }
            }
        }

        let mut rev: HashMap<i32, i32> = HashMap::new();
        for p in 0..plane_len {
            let a = out_slice[a_start + p];
            let sb = shifted[p];
            if a > 0 && sb > 0 && a != sb {
                rev.entry(a).or_insert(sb);
            }
        }
        rev_tables.push(rev);

        out_slice[b_start..b_start + plane_len].copy_from_slice(&shifted);
    }

    let mut final_map: HashMap<i32, i32> = HashMap::new();
    for (zi, rev) in rev_tables.iter().enumerate() {
        for (&k, &v0) in rev {
            let mut cur = v0;
            let mut zc = zi + 1;
            while zc < rev_tables.len() {
                match rev_tables[zc].get(&cur) {
                    Some(&next) => {
                        cur = next;
                        zc += 1;
                    }
                    None => break,
                }
            }
            final_map.insert(k, cur);
        }
    }

    for v in out_slice.iter_mut() {
        if *v > 0 {
            if let Some(&mapped) = final_map.get(v) {
                *v = mapped;
            }
        }
    }

    tracing::debug!(z, y, x, last_label, "stitch_slices");
    Ok(last_label)
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
    fn all_ones_cube_becomes_one_label() {
        let in_path = tmp();
        {
            let mut v = RasterVolumeMut::<u8>::create(&in_path, 0, (2, 2, 2)).unwrap();
            v.as_mut_slice().fill(1);
        }
        let mask = RasterVolume::<u8>::open(&in_path, 0, (2, 2, 2)).unwrap();

        let out_path = tmp();
        let mut out = RasterVolumeMut::<i32>::create(&out_path, 0, (2, 2, 2)).unwrap();
        let last_label = stitch_slices(&mask, &mut out).unwrap();

        assert!(last_label >= 1);
        let labels = out.as_slice();
        let first = labels[0];
        assert!(first > 0);
        assert!(labels.iter().all(|&l| l == first));

        std::fs::remove_file(&in_path).ok();
        std::fs::remove_file(&out_path).ok();
    }

    #[test]
    fn disjoint_columns_keep_separate_labels_across_slices() {
        let in_path = tmp();
        {
            // Two disconnected 1x1 columns running through 3 slices of a
            // 1x4 plane: foreground at x=0 and x=3, background between.
            let mut v = RasterVolumeMut::<u8>::create(&in_path, 0, (3, 1, 4)).unwrap();
            for z in 0..3 {
                let s = v.as_mut_slice();
                s[z * 4] = 1;
                s[z * 4 + 3] = 1;
            }
        }
        let mask = RasterVolume::<u8>::open(&in_path, 0, (3, 1, 4)).unwrap();

        let out_path = tmp();
        let mut out = RasterVolumeMut::<i32>::create(&out_path, 0, (3, 1, 4)).unwrap();
        stitch_slices(&mask, &mut out).unwrap();

        let labels = out.as_slice();
        for z in 0..3 {
            assert_ne!(labels[z * 4], 0);
            assert_ne!(labels[z * 4 + 3], 0);
            assert_ne!(labels[z * 4], labels[z * 4 + 3]);
        }
        // Each column is its own component end to end.
        assert_eq!(labels[0], labels[4]);
        assert_eq!(labels[4], labels[8]);
        assert_eq!(labels[3], labels[7]);
        assert_eq!(labels[7], labels[11]);

        std::fs::remove_file(&in_path).ok();
        std::fs::remove_file(&out_path).ok();
    }
}
