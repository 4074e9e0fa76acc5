//! Seeded 3D watershed (spec §4.7) and mask-constrained diffusion flooding
//! (spec §4.8), both built on [`cellcore_heap::MinHeap`].

#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]

pub mod diffusion;
mod neighbors;
pub mod watershed;

pub use diffusion::{diffuse, DiffusionParams};
pub use neighbors::{euclid, neighbor_index};
pub use watershed::{watershed, WatershedParams};
