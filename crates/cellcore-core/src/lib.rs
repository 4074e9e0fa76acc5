//! Raster volume descriptors and scoped mmap I/O.
//!
//! This is the one crate in the workspace that is not
//! `#![forbid(unsafe_code)]`: `memmap2`'s `map`/`map_mut` are themselves
//! `unsafe fn`, so someone has to own that boundary. Every other crate in
//! the workspace builds exclusively on the safe [`RasterVolume`] /
//! [`RasterVolumeMut`] windows this crate exposes.

#![deny(rust_2018_idioms)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]

pub mod coords;
pub mod element;
pub mod error;
pub mod raster;

pub use coords::{ravel, strides_for_shape, unravel, Strides};
pub use element::{Element, ElementType};
pub use error::{Error, Result};
pub use raster::{require_compatible, RasterDescriptor, RasterVolume, RasterVolumeMut};
