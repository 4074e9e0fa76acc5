//! Elementwise filters, size filtering, and overlap reconciliation.
//!
//! These are the "connective tissue" filters spec §1 describes: simple
//! single-pass (or few-pass) streaming operations over one or more raster
//! volumes, none of which carry cross-voxel dependencies — which is also
//! why they're the only filters in the workspace with an (optional,
//! feature-gated) data-parallel entry point (spec §5).

#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]

pub mod elementwise;
pub mod overlap;
pub mod size_filter;

pub use elementwise::{increment_nonzero, min_threshold_in_place, nonzero_coords, standardize, threshold};
pub use overlap::overlap;
pub use size_filter::{label_by_size, size_filter, LabelSizeReport};
