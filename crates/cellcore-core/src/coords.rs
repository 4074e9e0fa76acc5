//! Raveled-index and stride helpers shared by the stitcher and watershed.
//!
//! A raveled index linearizes a 3D voxel coordinate as `z*Y*X + y*X + x`
//! (spec GLOSSARY). Strides are the per-axis step sizes in raveled space,
//! outermost axis first.

/// Per-axis strides `[stride_z, stride_y, stride_x]`, outermost first.
pub type Strides = [isize; 3];

/// Compute the strides for a `(Z, Y, X)` shape.
#[must_use]
pub fn strides_for_shape(shape: (u64, u64, u64)) -> Strides {
    let (_, y, x) = (shape.0 as isize, shape.1 as isize, shape.2 as isize);
    [y * x, x, 1]
}

/// Linearize a `(z, y, x)` coordinate given a volume shape.
#[must_use]
pub fn ravel(coord: (u64, u64, u64), shape: (u64, u64, u64)) -> usize {
    ((coord.0 * shape.1 + coord.1) * shape.2 + coord.2) as usize
}

/// Decompose a raveled index back into a `(z, y, x)` coordinate, given the
/// strides for the volume it came from.
///
/// Iteratively divides `p` by each axis stride, outermost first, exactly as
/// spec §4.7 describes for the Euclidean-distance helper.
#[must_use]
pub fn unravel(mut p: usize, strides: Strides) -> (i64, i64, i64) {
    let mut out = [0i64; 3];
    for (axis, &stride) in strides.iter().enumerate() {
        let stride = stride.max(1) as usize;
        out[axis] = (p / stride) as i64;
        p %= stride;
    }
    (out[0], out[1], out[2])
}
