//! Contrast-limited adaptive histogram equalization.
//!
//! The image is split into a grid of tiles. Each tile gets its own equalization
//! lookup table built from a clipped histogram; every output pixel blends the
//! tables of its four nearest tiles bilinearly. The clip limit is a plain
//! argument, so the function holds no state between calls.

use image::GrayImage;

use crate::error::{alloc_plane, Result};
use crate::filters::{plane_from_raw, reflect101, saturate_u8};

/// Tiles along each axis.
pub const CLAHE_GRID: u32 = 8;

const HIST_SIZE: usize = 256;

/// Equalize `src` with a `grid` x `grid` tile layout and the given clip limit.
///
/// `clip_limit` is relative to a uniform histogram: each bin is capped at
/// `max(floor(clip_limit * tile_area / 256), 1)`, and the excess is spread over all
/// bins. A limit of zero (or less) disables clipping.
///
/// When the image size is not a multiple of the grid, tile statistics are taken
/// from a copy padded at the bottom and right by mirroring.
///
/// # Errors
///
/// Returns [`crate::Error::ResourceExhaustion`] if scratch buffers cannot be allocated.
pub fn clahe(src: &GrayImage, clip_limit: f64, grid: u32) -> Result<GrayImage> {
    let (w, h) = src.dimensions();
    let grid = grid.max(1);
    let (wu, hu) = (w as usize, h as usize);
    let tiles = grid as usize;

    let padded;
    let (stats, stats_w) = if w % grid == 0 && h % grid == 0 {
        (src.as_raw().as_slice(), wu)
    } else {
        let pw = wu + (tiles - wu % tiles);
        let ph = hu + (tiles - hu % tiles);
        padded = pad_bottom_right(src.as_raw(), wu, hu, pw, ph)?;
        (padded.as_slice(), pw)
    };
    let stats_h = stats.len() / stats_w.max(1);
    let tile_w = stats_w / tiles;
    let tile_h = stats_h / tiles;
    let tile_area = tile_w * tile_h;
    if tile_area == 0 {
        return Ok(src.clone());
    }

    #[allow(clippy::cast_precision_loss)]
    let lut_scale = (HIST_SIZE - 1) as f32 / tile_area as f32;
    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        clippy::cast_precision_loss
    )]
    let clip = if clip_limit > 0.0 {
        ((clip_limit * tile_area as f64 / HIST_SIZE as f64) as usize).max(1)
    } else {
        0
    };

    let mut luts = alloc_plane::<u8>(tiles * tiles * HIST_SIZE)?;
    for ty in 0..tiles {
        for tx in 0..tiles {
            let mut hist = [0usize; HIST_SIZE];
            for y in ty * tile_h..(ty + 1) * tile_h {
                let row = &stats[y * stats_w + tx * tile_w..y * stats_w + (tx + 1) * tile_w];
                for &v in row {
                    hist[v as usize] += 1;
                }
            }
            if clip > 0 {
                clip_histogram(&mut hist, clip);
            }
            let lut = &mut luts[(ty * tiles + tx) * HIST_SIZE..(ty * tiles + tx + 1) * HIST_SIZE];
            let mut sum = 0usize;
            for (entry, &count) in lut.iter_mut().zip(hist.iter()) {
                sum += count;
                #[allow(clippy::cast_precision_loss)]
                {
                    *entry = saturate_u8(sum as f32 * lut_scale);
                }
            }
        }
    }

    let mut out = alloc_plane::<u8>(wu * hu)?;
    let raw = src.as_raw();
    #[allow(clippy::cast_precision_loss)]
    let (inv_tw, inv_th) = (1.0 / tile_w as f32, 1.0 / tile_h as f32);
    let last = tiles - 1;

    for y in 0..hu {
        #[allow(clippy::cast_precision_loss)]
        let tyf = y as f32 * inv_th - 0.5;
        let (ty1, ty2, ya) = neighbours(tyf, last);
        for x in 0..wu {
            #[allow(clippy::cast_precision_loss)]
            let txf = x as f32 * inv_tw - 0.5;
            let (tx1, tx2, xa) = neighbours(txf, last);

            let v = raw[y * wu + x] as usize;
            let at = |ty: usize, tx: usize| f32::from(luts[(ty * tiles + tx) * HIST_SIZE + v]);
            let top = at(ty1, tx1) * (1.0 - xa) + at(ty1, tx2) * xa;
            let bottom = at(ty2, tx1) * (1.0 - xa) + at(ty2, tx2) * xa;
            out[y * wu + x] = saturate_u8(top * (1.0 - ya) + bottom * ya);
        }
    }

    plane_from_raw(w, h, out)
}

/// Indices of the two tiles around fractional tile coordinate `f`, plus the
/// weight of the second.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn neighbours(f: f32, last: usize) -> (usize, usize, f32) {
    let lo = f.floor();
    let weight = f - lo;
    let first = if lo < 0.0 { 0 } else { (lo as usize).min(last) };
    let second = if lo + 1.0 < 0.0 {
        0
    } else {
        ((lo + 1.0) as usize).min(last)
    };
    (first, second, weight)
}

/// Cap every bin at `clip` and hand the excess back evenly, with the remainder
/// going one count at a time to bins spaced across the range.
fn clip_histogram(hist: &mut [usize; HIST_SIZE], clip: usize) {
    let mut clipped = 0usize;
    for bin in hist.iter_mut() {
        if *bin > clip {
            clipped += *bin - clip;
            *bin = clip;
        }
    }

    let batch = clipped / HIST_SIZE;
    let mut residual = clipped - batch * HIST_SIZE;
    for bin in hist.iter_mut() {
        *bin += batch;
    }
    if residual > 0 {
        let step = (HIST_SIZE / residual).max(1);
        let mut i = 0;
        while i < HIST_SIZE && residual > 0 {
            hist[i] += 1;
            i += step;
            residual -= 1;
        }
    }
}

/// Copy a `w` x `h` plane into a `pw` x `ph` one, mirroring into the new
/// right and bottom margins.
fn pad_bottom_right(src: &[u8], w: usize, h: usize, pw: usize, ph: usize) -> Result<Vec<u8>> {
    let mut out = alloc_plane::<u8>(pw * ph)?;
    for y in 0..ph {
        #[allow(clippy::cast_possible_wrap)]
        let sy = reflect101(y as isize, h);
        for x in 0..pw {
            #[allow(clippy::cast_possible_wrap)]
            let sx = reflect101(x as isize, w);
            out[y * pw + x] = src[sy * w + sx];
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Luma;

    fn stddev(img: &GrayImage) -> f32 {
        #[allow(clippy::cast_precision_loss)]
        let n = img.as_raw().len() as f32;
        let mean = img.as_raw().iter().map(|&v| f32::from(v)).sum::<f32>() / n;
        let var = img
            .as_raw()
            .iter()
            .map(|&v| (f32::from(v) - mean).powi(2))
            .sum::<f32>()
            / n;
        var.sqrt()
    }

    #[test]
    fn flat_plane_stays_flat() {
        let src = GrayImage::from_pixel(50, 45, Luma([200]));
        let out = clahe(&src, 5.0, CLAHE_GRID).unwrap();
        assert_eq!(out.dimensions(), (50, 45));
        let first = out.get_pixel(0, 0)[0];
        assert!(out.pixels().all(|p| p[0] == first));
    }

    #[test]
    fn increases_contrast_of_low_contrast_plane() {
        let src = GrayImage::from_fn(64, 64, |x, y| {
            #[allow(clippy::cast_possible_truncation)]
            let v = 100 + ((x + 3 * y) % 11) as u8;
            Luma([v])
        });
        let out = clahe(&src, 4.0, CLAHE_GRID).unwrap();
        assert!(
            stddev(&out) > stddev(&src),
            "expected more contrast: {} vs {}",
            stddev(&out),
            stddev(&src)
        );
    }

    #[test]
    fn higher_clip_limit_gives_at_least_as_much_contrast() {
        let src = GrayImage::from_fn(64, 64, |x, y| {
            #[allow(clippy::cast_possible_truncation)]
            let v = 90 + ((x * 7 + y * 5) % 23) as u8;
            Luma([v])
        });
        let low = clahe(&src, 1.0, CLAHE_GRID).unwrap();
        let high = clahe(&src, 8.0, CLAHE_GRID).unwrap();
        assert!(stddev(&high) >= stddev(&low));
    }

    #[test]
    fn zero_clip_limit_is_plain_equalization() {
        let src = GrayImage::from_fn(16, 16, |x, _| {
            #[allow(clippy::cast_possible_truncation)]
            let v = (x * 16) as u8;
            Luma([v])
        });
        let out = clahe(&src, 0.0, 1).unwrap();
        // with one tile the brightest value maps to the top of the range
        assert_eq!(out.get_pixel(15, 0)[0], 255);
    }

    #[test]
    fn clip_histogram_preserves_total_count() {
        let mut hist = [0usize; HIST_SIZE];
        hist[10] = 500;
        hist[20] = 3;
        clip_histogram(&mut hist, 4);
        assert_eq!(hist.iter().sum::<usize>(), 503);
        assert!(hist[10] <= 4 + 2 + 1);
    }

    #[test]
    fn handles_planes_smaller_than_grid() {
        let src = GrayImage::from_pixel(3, 2, Luma([10]));
        let out = clahe(&src, 2.0, CLAHE_GRID).unwrap();
        assert_eq!(out.dimensions(), (3, 2));
    }
}
