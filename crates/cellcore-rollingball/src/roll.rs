//! The rolling-ball pass itself (spec §4.4 "Roll").
//!
//! `pixels` is overwritten in place: each row is absorbed into a rolling
//! cache of `ball.width()` rows as soon as the ball's halo has passed it,
//! then progressively replaced by the background envelope traced out by
//! every ball placement whose footprint touches that row.

use super::kernel::Ball;

pub fn roll_ball(ball: &Ball, pixels: &mut [f32], width: usize, height: usize) {
    let hw = ball.half_width() as isize;
    let w_ball = ball.width();
    let data = ball.data();

    let mut cache = vec![0.0f32; w_ball * width];

    let height_i = height as isize;
    let width_i = width as isize;

    for y in -hw..(height_i + hw) {
        let next_row = y + hw;
        if next_row < height_i {
            let r = next_row as usize;
            let slot = (next_row.rem_euclid(w_ball as isize)) as usize;
            let row_start = r * width;
            cache[slot * width..slot * width + width]
                .copy_from_slice(&pixels[row_start..row_start + width]);
            pixels[row_start..row_start + width].fill(f32::NEG_INFINITY);
        }

        for x in -hw..(width_i + hw) {
            let mut z = f32::INFINITY;
            for byp in 0..w_ball {
                let ypixel = y - hw + byp as isize;
                if ypixel < 0 || ypixel >= height_i {
                    continue;
                }
                let cache_row = (ypixel.rem_euclid(w_ball as isize)) as usize;
                for bxp in 0..w_ball {
                    let xpixel = x - hw + bxp as isize;
                    if xpixel < 0 || xpixel >= width_i {
                        continue;
                    }
                    let bval = data[byp * w_ball + bxp];
                    let v = cache[cache_row * width + xpixel as usize] - bval;
                    if v < z {
                        z = v;
                    }
                }
            }
            if !z.is_finite() {
                continue;
            }

            for byp in 0..w_ball {
                let ypixel = y - hw + byp as isize;
                if ypixel < 0 || ypixel >= height_i {
                    continue;
                }
                for bxp in 0..w_ball {
                    let xpixel = x - hw + bxp as isize;
                    if xpixel < 0 || xpixel >= width_i {
                        continue;
                    }
                    let bval = data[byp * w_ball + bxp];
                    let idx = ypixel as usize * width + xpixel as usize;
                    let candidate = z + bval;
                    if candidate > pixels[idx] {
                        pixels[idx] = candidate;
                    }
                }
            }
        }
    }
}
