//! The fused element-type matrix used by elementwise filters.
//!
//! Instead of hand-writing the Cartesian product of input/output integer
//! types spec §4.2 describes, every supported scalar implements [`Element`]
//! and filters are generic over it.

use bytemuck::Pod;
use serde::{Deserialize, Serialize};

/// Discriminant for a volume's scalar element type, used at the boundary
/// (spec §6's volume descriptor) where the concrete Rust type has been
/// erased.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ElementType {
    /// 8-bit unsigned.
    U8,
    /// 16-bit unsigned.
    U16,
    /// 32-bit unsigned.
    U32,
    /// 32-bit signed (the canonical label type).
    I32,
    /// 64-bit signed (the non-zero-coordinates side-file element type).
    I64,
    /// 32-bit float.
    F32,
    /// 64-bit float.
    F64,
}

impl ElementType {
    /// Size in bytes of one element of this type.
    #[must_use]
    pub const fn size_of(self) -> usize {
        match self {
            Self::U8 => 1,
            Self::U16 => 2,
            Self::U32 | Self::I32 | Self::F32 => 4,
            Self::I64 | Self::F64 => 8,
        }
    }
}

/// A scalar type usable as a raster element.
///
/// `Pod` gives us the `bytemuck` cast from mapped bytes to `&[Self]`;
/// `to_f64`/`from_f64` give filters a single numeric code path instead of
/// one per concrete type, and `MAX` is the saturating value threshold
/// writes on a "kept" voxel (spec §4.2).
pub trait Element: Pod + Copy + PartialOrd + Send + Sync + 'static {
    /// The [`ElementType`] discriminant for this Rust type.
    const ELEMENT_TYPE: ElementType;
    /// The maximum representable value, used by `threshold`'s "else" branch.
    const MAX: Self;
    /// The additive identity, used to detect "non-zero" voxels.
    const ZERO: Self;

    /// Widen to `f64` for arithmetic that must not lose precision for the
    /// supported integer ranges.
    fn to_f64(self) -> f64;
    /// Narrow from `f64`, rounding and saturating into the type's range.
    fn from_f64(v: f64) -> Self;
}

macro_rules! impl_element_int {
    ($ty:ty, $variant:ident) => {
        impl Element for $ty {
            const ELEMENT_TYPE: ElementType = ElementType::$variant;
            const MAX: Self = <$ty>::MAX;
            const ZERO: Self = 0;

            #[inline]
            fn to_f64(self) -> f64 {
                self as f64
            }

            #[inline]
            fn from_f64(v: f64) -> Self {
                v.round().clamp(0.0, <$ty>::MAX as f64) as $ty
            }
        }
    };
}

macro_rules! impl_element_float {
    ($ty:ty, $variant:ident) => {
        impl Element for $ty {
            const ELEMENT_TYPE: ElementType = ElementType::$variant;
            const MAX: Self = <$ty>::MAX;
            const ZERO: Self = 0.0;

            #[inline]
            fn to_f64(self) -> f64 {
                self as f64
            }

            #[inline]
            fn from_f64(v: f64) -> Self {
                v as $ty
            }
        }
    };
}

impl_element_int!(u8, U8);
impl_element_int!(u16, U16);
impl_element_int!(u32, U32);
impl_element_float!(f32, F32);
impl_element_float!(f64, F64);

/// `i64` is not part of the fused threshold/standardize matrix (spec §4.2
/// enumerates `{u8,u16,u32,i32,f32,f64}`), but it is the element type of
/// the non-zero-coordinates side file (spec §6), so it still needs a
/// [`RasterVolume`](crate::raster::RasterVolume) to read/write through.
impl Element for i64 {
    const ELEMENT_TYPE: ElementType = ElementType::I64;
    const MAX: Self = i64::MAX;
    const ZERO: Self = 0;

    #[inline]
    fn to_f64(self) -> f64 {
        self as f64
    }

    #[inline]
    fn from_f64(v: f64) -> Self {
        v.round() as i64
    }
}

// i32 is signed; clamp at 0 on the low end like the unsigned types since
// labels and thresholded images are never negative in this pipeline, but
// keep the full positive range available.
impl Element for i32 {
    const ELEMENT_TYPE: ElementType = ElementType::I32;
    const MAX: Self = i32::MAX;
    const ZERO: Self = 0;

    #[inline]
    fn to_f64(self) -> f64 {
        self as f64
    }

    #[inline]
    fn from_f64(v: f64) -> Self {
        v.round().clamp(0.0, i32::MAX as f64) as i32
    }
}
