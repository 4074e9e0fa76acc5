//! Scoped, typed mmap windows over raster volumes.
//!
//! This replaces the "raw typed pointer into mmap memory" pattern spec §9
//! calls out for re-architecture: [`RasterVolume`] and [`RasterVolumeMut`]
//! own the mapping (and the backing `File`) for as long as they're alive and
//! unmap on every exit path — normal return, early `?`, or panic unwind —
//! because that's what `Drop` does.

use crate::element::{Element, ElementType};
use crate::error::{Error, Result};
use memmap2::{Mmap, MmapMut, MmapOptions};
use serde::{Deserialize, Serialize};
use std::fs::OpenOptions;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};

/// Boundary descriptor for a raster volume (spec §6).
///
/// Files are raw little-endian rasters in row-major order with the
/// innermost axis `X`; `offset` is the byte offset of the first element
/// from the file's origin.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RasterDescriptor {
    /// Backing file path.
    pub path: PathBuf,
    /// Byte offset of the first element within the file.
    pub offset: u64,
    /// Shape `(Z, Y, X)`, outermost axis first.
    pub shape: (u64, u64, u64),
    /// Scalar element type.
    pub element_type: ElementType,
}

impl RasterDescriptor {
    /// Total element count `Z * Y * X`.
    #[must_use]
    pub const fn size(&self) -> u64 {
        self.shape.0 * self.shape.1 * self.shape.2
    }

    /// `true` iff `self` and `other` have identical shapes (spec §3's
    /// "compatible" relation).
    #[must_use]
    pub const fn compatible_with(&self, other: &Self) -> bool {
        self.shape.0 == other.shape.0 && self.shape.1 == other.shape.1 && self.shape.2 == other.shape.2
    }
}

/// Ensure two shapes match, or fail with [`Error::ShapeMismatch`].
pub fn require_compatible(expected: (u64, u64, u64), got: (u64, u64, u64)) -> Result<()> {
    if expected == got {
        Ok(())
    } else {
        Err(Error::ShapeMismatch { expected, got })
    }
}

/// `bytemuck::cast_slice` panics if the slice it's given doesn't start at a
/// `T`-aligned byte; `memmap2` only guarantees page alignment, so a caller
/// offset that isn't a multiple of `size_of::<T>()` would otherwise surface
/// as a panic deep inside `as_slice`/`as_mut_slice` instead of a catchable
/// error here at open time.
fn require_aligned_offset<T: Element>(offset: u64) -> Result<()> {
    let align = std::mem::size_of::<T>() as u64;
    if offset % align != 0 {
        return Err(Error::Io(std::io::Error::new(
            std::io::ErrorKind::InvalidInput,
            format!("offset {offset} is not a multiple of element size {align}"),
        )));
    }
    Ok(())
}

/// A read-only scoped window over a raster volume.
///
/// Dropping this releases the mapping; there is no separate "close" call to
/// forget.
pub struct RasterVolume<T: Element> {
    mmap: Mmap,
    shape: (u64, u64, u64),
    byte_offset_in_map: usize,
    _marker: PhantomData<T>,
}

impl<T: Element> RasterVolume<T> {
    /// Open a read-only window of `shape` typed elements starting `offset`
    /// bytes into `path`.
    ///
    /// # Errors
    /// Returns [`Error::Io`] if the file cannot be opened, is shorter than
    /// `offset + shape.volume() * size_of::<T>()`, `offset` isn't a multiple
    /// of `size_of::<T>()`, or the mapping fails.
    pub fn open(path: impl AsRef<Path>, offset: u64, shape: (u64, u64, u64)) -> Result<Self> {
        require_aligned_offset::<T>(offset)?;

        let path = path.as_ref();
        let file = OpenOptions::new().read(true).open(path)?;
        let len = shape.0 * shape.1 * shape.2 * std::mem::size_of::<T>() as u64;

        let actual_len = file.metadata()?.len();
        let needed = offset + len;
        if actual_len < needed {
            return Err(Error::Io(std::io::Error::new(
                std::io::ErrorKind::UnexpectedEof,
                format!(
                    "{} is {actual_len} bytes, need at least {needed} (offset {offset} + {len} bytes of {shape:?})",
                    path.display(),
                ),
            )));
        }

        tracing::debug!(path = %path.display(), offset, ?shape, "opening raster volume (ro)");

        // SAFETY: the mapped file is not concurrently truncated or mutated
        // by another writer for the lifetime of this mapping; this is the
        // documented, unenforced contract from spec §5 ("no intra-process
        // aliasing of write windows on the same byte range").
        let mmap = unsafe {
            MmapOptions::new()
                .offset(offset)
                .len(len as usize)
                .map(&file)?
        };

        Ok(Self {
            mmap,
            shape,
            byte_offset_in_map: 0,
            _marker: PhantomData,
        })
    }

    /// Open from a [`RasterDescriptor`], checking the element type matches.
    ///
    /// # Errors
    /// Returns [`Error::TypeMismatch`] if `desc.element_type` doesn't match
    /// `T`, or any error [`Self::open`] can return.
    pub fn open_descriptor(desc: &RasterDescriptor) -> Result<Self> {
        if desc.element_type != T::ELEMENT_TYPE {
            return Err(Error::TypeMismatch(format!(
                "expected {:?}, descriptor carries {:?}",
                T::ELEMENT_TYPE,
                desc.element_type
            )));
        }
        Self::open(&desc.path, desc.offset, desc.shape)
    }

    /// Shape `(Z, Y, X)`.
    #[must_use]
    pub const fn shape(&self) -> (u64, u64, u64) {
        self.shape
    }

    /// Total element count.
    #[must_use]
    pub const fn len(&self) -> usize {
        (self.shape.0 * self.shape.1 * self.shape.2) as usize
    }

    /// `true` iff the volume has no elements.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Typed view over the mapped elements in raveled order.
    #[must_use]
    pub fn as_slice(&self) -> &[T] {
        bytemuck::cast_slice(&self.mmap[self.byte_offset_in_map..])
    }
}

/// A read/write scoped window over a raster volume.
pub struct RasterVolumeMut<T: Element> {
    mmap: MmapMut,
    shape: (u64, u64, u64),
    byte_offset_in_map: usize,
    _marker: PhantomData<T>,
}

impl<T: Element> RasterVolumeMut<T> {
    /// Open (creating if absent and sizing to fit) a read/write window of
    /// `shape` typed elements starting `offset` bytes into `path`.
    ///
    /// # Errors
    /// Returns [`Error::Io`] on any file or mapping failure, or if `offset`
    /// isn't a multiple of `size_of::<T>()`.
    pub fn create(path: impl AsRef<Path>, offset: u64, shape: (u64, u64, u64)) -> Result<Self> {
        require_aligned_offset::<T>(offset)?;

        let path = path.as_ref();
        let len_elems = shape.0 * shape.1 * shape.2;
        let len_bytes = len_elems * std::mem::size_of::<T>() as u64;
        let needed = offset + len_bytes;

        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(path)?;
        if file.metadata()?.len() < needed {
            file.set_len(needed)?;
        }

        tracing::debug!(path = %path.display(), offset, ?shape, "opening raster volume (rw)");

        // SAFETY: see `RasterVolume::open`; additionally, `set_len` above
        // guarantees the mapped range is backed by real file storage.
        let mmap = unsafe {
            MmapOptions::new()
                .offset(offset)
                .len(len_bytes as usize)
                .map_mut(&file)?
        };

        Ok(Self {
            mmap,
            shape,
            byte_offset_in_map: 0,
            _marker: PhantomData,
        })
    }

    /// Open an existing read/write window from a [`RasterDescriptor`].
    ///
    /// # Errors
    /// Returns [`Error::TypeMismatch`] if `desc.element_type` doesn't match
    /// `T`, or any error [`Self::create`] can return.
    pub fn create_descriptor(desc: &RasterDescriptor) -> Result<Self> {
        if desc.element_type != T::ELEMENT_TYPE {
            return Err(Error::TypeMismatch(format!(
                "expected {:?}, descriptor carries {:?}",
                T::ELEMENT_TYPE,
                desc.element_type
            )));
        }
        Self::create(&desc.path, desc.offset, desc.shape)
    }

    /// Shape `(Z, Y, X)`.
    #[must_use]
    pub const fn shape(&self) -> (u64, u64, u64) {
        self.shape
    }

    /// Total element count.
    #[must_use]
    pub const fn len(&self) -> usize {
        (self.shape.0 * self.shape.1 * self.shape.2) as usize
    }

    /// `true` iff the volume has no elements.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Typed read view.
    #[must_use]
    pub fn as_slice(&self) -> &[T] {
        bytemuck::cast_slice(&self.mmap[self.byte_offset_in_map..])
    }

    /// Typed read/write view.
    #[must_use]
    pub fn as_mut_slice(&mut self) -> &mut [T] {
        bytemuck::cast_slice_mut(&mut self.mmap[self.byte_offset_in_map..])
    }

    /// Flush dirty pages to the backing file.
    ///
    /// # Errors
    /// Returns [`Error::Io`] if the flush syscall fails.
    pub fn flush(&self) -> Result<()> {
        self.mmap.flush().map_err(Error::Io)
    }
}
