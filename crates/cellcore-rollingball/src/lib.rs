//! Sternberg rolling-ball background subtraction (spec §4.4).
//!
//! A ball of the requested radius is rolled underneath the image surface
//! (shrunk first for large radii, to keep the roll itself cheap) and the
//! envelope it traces out is treated as background and subtracted from the
//! original voxel values.

#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]

mod enlarge;
mod kernel;
mod roll;
mod shrink;
mod subtract;

pub use kernel::Ball;
pub use subtract::{RollingBall, RollingBallParams};
