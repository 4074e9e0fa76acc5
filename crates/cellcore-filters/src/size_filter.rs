//! Size filter / label-by-size (spec §4.3).
//!
//! The source backs its label histogram with a dense array sized `2^32-1`
//! to avoid hashing label ids; spec §9 explicitly allows a hash map instead
//! since labels are "an unordered subset of `[1, MAX)`" and need not be
//! dense. We use `HashMap<i32, u64>` keyed by observed label.

use cellcore_core::{require_compatible, RasterVolume, RasterVolumeMut, Result};
use std::collections::HashMap;

/// Total observed label count plus a map from kept label id to pixel
/// count, returned by [`size_filter`] and [`label_by_size`] (spec §6's
/// "label-count report").
#[derive(Debug, Clone, Default)]
pub struct LabelSizeReport {
    /// Number of distinct non-zero labels observed in pass 1.
    pub total_labels: usize,
    /// Kept label id -> pixel count (labels dropped by the size bounds are
    /// absent, not present with a `0` count).
    pub kept: HashMap<i32, u64>,
}

fn histogram(labels: &RasterVolume<i32>) -> HashMap<i32, u64> {
    let mut areas: HashMap<i32, u64> = HashMap::new();
    for &l in labels.as_slice() {
        if l != 0 {
            *areas.entry(l).or_insert(0) += 1;
        }
    }
    areas
}

/// Keep labels whose pixel count lies in `[min_size, max_size]` (inclusive
/// both ends); everything else becomes background. Idempotent: filtering
/// an already-filtered volume with the same bounds is a no-op.
///
/// # Errors
/// Returns [`cellcore_core::Error::ShapeMismatch`] if `labels` and `out`
/// disagree on shape.
pub fn size_filter(
    labels: &RasterVolume<i32>,
    min_size: u64,
    max_size: u64,
    out: &mut RasterVolumeMut<i32>,
) -> Result<LabelSizeReport> {
    require_compatible(labels.shape(), out.shape())?;

    let areas = histogram(labels);
    let total_labels = areas.len();

    let kept: HashMap<i32, u64> = areas
        .into_iter()
        .filter(|&(_, count)| count >= min_size && count <= max_size)
        .collect();

    tracing::debug!(total_labels, kept = kept.len(), min_size, max_size, "size_filter");

    let dst = out.as_mut_slice();
    for (src, d) in labels.as_slice().iter().zip(dst.iter_mut()) {
        *d = if kept.contains_key(src) { *src } else { 0 };
    }

    Ok(LabelSizeReport { total_labels, kept })
}

/// Like [`size_filter`], but writes the component's own pixel count as its
/// new label value instead of keeping the original label id.
///
/// # Errors
/// Returns [`cellcore_core::Error::ShapeMismatch`] if `labels` and `out`
/// disagree on shape.
pub fn label_by_size(
    labels: &RasterVolume<i32>,
    out: &mut RasterVolumeMut<i32>,
) -> Result<LabelSizeReport> {
    require_compatible(labels.shape(), out.shape())?;

    let areas = histogram(labels);
    let total_labels = areas.len();

    tracing::debug!(total_labels, "label_by_size");

    let dst = out.as_mut_slice();
    for (src, d) in labels.as_slice().iter().zip(dst.iter_mut()) {
        *d = if *src == 0 {
            0
        } else {
            areas.get(src).copied().unwrap_or(0) as i32
        };
    }

    Ok(LabelSizeReport {
        total_labels,
        kept: areas,
    })
}
