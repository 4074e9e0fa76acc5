//! Min-pooling shrink of a 2D plane (spec §4.4 "Shrink").

/// Shrinks `plane` (`height x width`, row-major) by `factor` using
/// min-pooling over non-overlapping `factor x factor` blocks. The last
/// block in each dimension may run short at the image edge; it's clipped
/// to the image bounds rather than padded.
///
/// Returns `(shrunk, shrunk_width, shrunk_height)`. When `factor == 1` this
/// is a plain copy.
pub fn shrink(plane: &[f32], width: usize, height: usize, factor: u32) -> (Vec<f32>, usize, usize) {
    if factor <= 1 {
        return (plane.to_vec(), width, height);
    }
    let factor = factor as usize;
    let sw = (width + factor - 1) / factor;
    let sh = (height + factor - 1) / factor;

    let mut out = vec![f32::INFINITY; sw * sh];
    for sy in 0..sh {
        let y0 = sy * factor;
        let y1 = (y0 + factor).min(height);
        for sx in 0..sw {
            let x0 = sx * factor;
            let x1 = (x0 + factor).min(width);
            let mut m = f32::INFINITY;
            for y in y0..y1 {
                for x in x0..x1 {
                    let v = plane[y * width + x];
                    if v < m {
                        m = v;
                    }
                }
            }
            out[sy * sw + sx] = m;
        }
    }
    (out, sw, sh)
}
