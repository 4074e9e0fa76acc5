//! Ball kernel construction and shrink-factor/arc-trim selection (spec §4.4).

/// Shrink factor and arc-trim percentage for a given rolling-ball radius,
/// per the selection table in spec §4.4.
fn shrink_and_trim(radius: f64) -> (u32, f64) {
    if radius <= 10.0 {
        (1, 24.0)
    } else if radius <= 30.0 {
        (2, 24.0)
    } else if radius <= 100.0 {
        (4, 32.0)
    } else {
        (8, 40.0)
    }
}

/// A precomputed ball kernel: a `width x width` grid of non-negative
/// heights, `0` outside the ball's circular footprint.
#[derive(Debug, Clone)]
pub struct Ball {
    data: Vec<f32>,
    half_width: i32,
    width: usize,
    shrink_factor: u32,
}

impl Ball {
    /// Builds the kernel for `radius` using the spec's shrink-factor/arc-trim
    /// selection. The kernel itself is built at the (possibly smaller)
    /// shrunk radius; `shrink_factor()` tells callers how much to shrink the
    /// image before rolling this ball across it.
    pub fn new(radius: f64) -> Self {
        let (shrink_factor, arc_trim_percent) = shrink_and_trim(radius);
        let small_radius = (radius / f64::from(shrink_factor)).max(1.0);
        let half_width_f = (small_radius * (1.0 - arc_trim_percent / 100.0)).round();
        let half_width = half_width_f.max(1.0) as i32;
        let width = (2 * half_width + 1) as usize;
        let r_squared = small_radius * small_radius;

        let mut data = vec![0.0f32; width * width];
        for by in 0..width {
            let dy = by as f64 - f64::from(half_width);
            for bx in 0..width {
                let dx = bx as f64 - f64::from(half_width);
                let under = r_squared - dx * dx - dy * dy;
                data[by * width + bx] = if under > 0.0 { under.sqrt() as f32 } else { 0.0 };
            }
        }

        Self {
            data,
            half_width,
            width,
            shrink_factor,
        }
    }

    pub fn data(&self) -> &[f32] {
        &self.data
    }

    pub fn half_width(&self) -> i32 {
        self.half_width
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn shrink_factor(&self) -> u32 {
        self.shrink_factor
    }
}
