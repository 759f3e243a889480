//! Binary raster operations on `image::GrayImage`.
//!
//! Occupancy maps are single-channel images where any non-zero pixel is
//! occupied. Coordinates passed in are pixel coordinates with pixel `(x, y)`
//! centered on the integer point; fills are inclusive of the boundary.

use std::collections::VecDeque;

use glam::DVec2;
use image::{GrayImage, Luma};

/// Slack on span endpoints so vertices that land on integer coordinates are
/// not lost to rounding.
const SPAN_EPS: f64 = 1e-9;

/// All-zero map.
pub fn blank(width: u32, height: u32) -> GrayImage {
    GrayImage::new(width, height)
}

// ── Filling ────────────────────────────────────────────────────────────────

/// Fills a convex polygon (any winding). Degenerate polygons fill the
/// pixels on their segment or point.
pub fn fill_convex_polygon(img: &mut GrayImage, pts: &[DVec2], value: u8) {
    if pts.is_empty() || pts.iter().any(|p| !p.is_finite()) {
        return;
    }
    let (w, h) = (img.width() as i64, img.height() as i64);
    let y_min = pts.iter().map(|p| p.y).fold(f64::INFINITY, f64::min);
    let y_max = pts.iter().map(|p| p.y).fold(f64::NEG_INFINITY, f64::max);
    let row_lo = ((y_min - SPAN_EPS).ceil() as i64).max(0);
    let row_hi = ((y_max + SPAN_EPS).floor() as i64).min(h - 1);

    for row in row_lo..=row_hi {
        let y = row as f64;
        let mut x_lo = f64::INFINITY;
        let mut x_hi = f64::NEG_INFINITY;
        for i in 0..pts.len() {
            let (p, q) = (pts[i], pts[(i + 1) % pts.len()]);
            let (lo, hi) = (p.y.min(q.y), p.y.max(q.y));
            if y < lo - SPAN_EPS || y > hi + SPAN_EPS {
                continue;
            }
            if (q.y - p.y).abs() < 1e-12 {
                x_lo = x_lo.min(p.x.min(q.x));
                x_hi = x_hi.max(p.x.max(q.x));
            } else {
                let s = ((y - p.y) / (q.y - p.y)).clamp(0.0, 1.0);
                let x = p.x + (q.x - p.x) * s;
                x_lo = x_lo.min(x);
                x_hi = x_hi.max(x);
            }
        }
        if x_lo > x_hi {
            continue;
        }
        let col_lo = ((x_lo - SPAN_EPS).ceil() as i64).max(0);
        let col_hi = ((x_hi + SPAN_EPS).floor() as i64).min(w - 1);
        for col in col_lo..=col_hi {
            img.put_pixel(col as u32, row as u32, Luma([value]));
        }
    }
}

/// Fills every pixel within `radius` of `center`.
pub fn fill_disc(img: &mut GrayImage, center: DVec2, radius: f64, value: u8) {
    if !center.is_finite() || radius < 0.0 {
        return;
    }
    let (w, h) = (img.width() as i64, img.height() as i64);
    let r2 = radius * radius + SPAN_EPS;
    let y0 = ((center.y - radius).ceil() as i64).max(0);
    let y1 = ((center.y + radius).floor() as i64).min(h - 1);
    let x0 = ((center.x - radius).ceil() as i64).max(0);
    let x1 = ((center.x + radius).floor() as i64).min(w - 1);
    for y in y0..=y1 {
        for x in x0..=x1 {
            let d = DVec2::new(x as f64, y as f64) - center;
            if d.length_squared() <= r2 {
                img.put_pixel(x as u32, y as u32, Luma([value]));
            }
        }
    }
}

/// Draws a segment `thickness` pixels wide with round caps. A thickness of
/// one or less draws a single-pixel DDA line.
pub fn draw_thick_segment(img: &mut GrayImage, a: DVec2, b: DVec2, thickness: u32, value: u8) {
    if thickness <= 1 {
        let steps = (b - a).abs().max_element().ceil().max(1.0) as usize;
        for i in 0..=steps {
            let p = a + (b - a) * (i as f64 / steps as f64);
            put_if_inside(img, p.x.round() as i64, p.y.round() as i64, value);
        }
        return;
    }
    let r = thickness as f64 * 0.5;
    if let Some(dir) = (b - a).try_normalize() {
        let n = dir.perp() * r;
        fill_convex_polygon(img, &[a + n, b + n, b - n, a - n], value);
    }
    fill_disc(img, a, r, value);
    fill_disc(img, b, r, value);
}

/// Draws the closed outline through `pts` with thick segments.
pub fn draw_closed_polyline(img: &mut GrayImage, pts: &[DVec2], thickness: u32, value: u8) {
    for i in 0..pts.len() {
        draw_thick_segment(img, pts[i], pts[(i + 1) % pts.len()], thickness, value);
    }
}

fn put_if_inside(img: &mut GrayImage, x: i64, y: i64, value: u8) {
    if x >= 0 && y >= 0 && x < img.width() as i64 && y < img.height() as i64 {
        img.put_pixel(x as u32, y as u32, Luma([value]));
    }
}

// ── Morphology ─────────────────────────────────────────────────────────────

/// Erosion with a `kernel × kernel` square, anchored at its center.
///
/// Pixels outside the image do not take part, so the border alone never
/// erodes a region. A kernel of 1 or less returns a copy.
pub fn erode(img: &GrayImage, kernel: u32) -> GrayImage {
    if kernel <= 1 {
        return img.clone();
    }
    let before = (kernel / 2) as i64;
    let after = kernel as i64 - 1 - before;
    let (w, h) = (img.width() as i64, img.height() as i64);

    // separable: rows, then columns
    let mut rows = GrayImage::new(img.width(), img.height());
    for y in 0..h {
        for x in 0..w {
            let lo = (x - before).max(0);
            let hi = (x + after).min(w - 1);
            let m = (lo..=hi)
                .map(|xx| img.get_pixel(xx as u32, y as u32)[0])
                .min()
                .unwrap_or(0);
            rows.put_pixel(x as u32, y as u32, Luma([m]));
        }
    }
    let mut out = GrayImage::new(img.width(), img.height());
    for y in 0..h {
        let lo = (y - before).max(0);
        let hi = (y + after).min(h - 1);
        for x in 0..w {
            let m = (lo..=hi)
                .map(|yy| rows.get_pixel(x as u32, yy as u32)[0])
                .min()
                .unwrap_or(0);
            out.put_pixel(x as u32, y as u32, Luma([m]));
        }
    }
    out
}

// ── Pixel-wise ops ─────────────────────────────────────────────────────────

pub fn count_nonzero(img: &GrayImage) -> usize {
    img.pixels().filter(|p| p[0] != 0).count()
}

/// `dst |= src`, pixel-wise; sizes must match (extra pixels are ignored).
pub fn union_into(dst: &mut GrayImage, src: &GrayImage) {
    for (d, s) in dst.pixels_mut().zip(src.pixels()) {
        d[0] = d[0].max(s[0]);
    }
}

/// Clears every `dst` pixel that is set in `mask`.
pub fn subtract(dst: &mut GrayImage, mask: &GrayImage) {
    for (d, m) in dst.pixels_mut().zip(mask.pixels()) {
        if m[0] != 0 {
            d[0] = 0;
        }
    }
}

// ── Connected components ───────────────────────────────────────────────────

/// 8-connected labeling of the non-zero pixels of a map.
#[derive(Debug, Clone)]
pub struct Components {
    width: u32,
    height: u32,
    /// Row-major labels; 0 is background, components start at 1.
    labels: Vec<u32>,
    /// `sizes[k - 1]` is the pixel count of component `k`.
    sizes: Vec<usize>,
}

impl Components {
    pub fn count(&self) -> usize {
        self.sizes.len()
    }

    pub fn sizes(&self) -> &[usize] {
        &self.sizes
    }

    pub fn label_at(&self, x: u32, y: u32) -> u32 {
        self.labels[(y * self.width + x) as usize]
    }

    /// `(label, size)` of the biggest component; ties go to the lowest label.
    pub fn largest(&self) -> Option<(u32, usize)> {
        self.sizes
            .iter()
            .enumerate()
            .fold(None, |best: Option<(u32, usize)>, (i, &s)| match best {
                Some((_, bs)) if bs >= s => best,
                _ => Some((i as u32 + 1, s)),
            })
    }

    /// Binary map (255 / 0) of one component.
    pub fn mask(&self, label: u32) -> GrayImage {
        GrayImage::from_fn(self.width, self.height, |x, y| {
            Luma([if self.label_at(x, y) == label { 255 } else { 0 }])
        })
    }
}

/// Labels the 8-connected regions of non-zero pixels, in scan order.
pub fn label_components(img: &GrayImage) -> Components {
    let (w, h) = (img.width(), img.height());
    let mut labels = vec![0u32; (w as usize) * (h as usize)];
    let mut sizes = Vec::new();
    let mut queue = VecDeque::new();

    for y in 0..h {
        for x in 0..w {
            let idx = (y * w + x) as usize;
            if img.get_pixel(x, y)[0] == 0 || labels[idx] != 0 {
                continue;
            }
            let label = sizes.len() as u32 + 1;
            let mut size = 0usize;
            labels[idx] = label;
            queue.push_back((x, y));
            while let Some((cx, cy)) = queue.pop_front() {
                size += 1;
                for dy in -1i64..=1 {
                    for dx in -1i64..=1 {
                        let (nx, ny) = (cx as i64 + dx, cy as i64 + dy);
                        if (dx == 0 && dy == 0) || nx < 0 || ny < 0 || nx >= w as i64 || ny >= h as i64 {
                            continue;
                        }
                        let (nx, ny) = (nx as u32, ny as u32);
                        let nidx = (ny * w + nx) as usize;
                        if labels[nidx] == 0 && img.get_pixel(nx, ny)[0] != 0 {
                            labels[nidx] = label;
                            queue.push_back((nx, ny));
                        }
                    }
                }
            }
            sizes.push(size);
        }
    }

    Components {
        width: w,
        height: h,
        labels,
        sizes,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn square_fill_is_inclusive() {
        let mut img = blank(10, 10);
        let sq = [
            DVec2::new(2.0, 2.0),
            DVec2::new(5.0, 2.0),
            DVec2::new(5.0, 5.0),
            DVec2::new(2.0, 5.0),
        ];
        fill_convex_polygon(&mut img, &sq, 255);
        assert_eq!(count_nonzero(&img), 16);
        assert_eq!(img.get_pixel(5, 5)[0], 255);
        assert_eq!(img.get_pixel(6, 5)[0], 0);
    }

    #[test]
    fn fill_is_clipped_to_image() {
        let mut img = blank(4, 4);
        let big = [
            DVec2::new(-10.0, -10.0),
            DVec2::new(10.0, -10.0),
            DVec2::new(10.0, 10.0),
            DVec2::new(-10.0, 10.0),
        ];
        fill_convex_polygon(&mut img, &big, 1);
        assert_eq!(count_nonzero(&img), 16);
    }

    #[test]
    fn triangle_fill_winding_independent() {
        let tri = [DVec2::new(0.0, 0.0), DVec2::new(6.0, 0.0), DVec2::new(0.0, 6.0)];
        let mut a = blank(8, 8);
        let mut b = blank(8, 8);
        fill_convex_polygon(&mut a, &tri, 255);
        let rev = [tri[2], tri[1], tri[0]];
        fill_convex_polygon(&mut b, &rev, 255);
        assert_eq!(a, b);
        // x + y <= 6 on a 7x7 corner: 7 + 6 + ... + 1
        assert_eq!(count_nonzero(&a), 28);
    }

    #[test]
    fn erosion_shrinks_by_half_kernel() {
        let mut img = blank(20, 20);
        fill_convex_polygon(
            &mut img,
            &[
                DVec2::new(5.0, 5.0),
                DVec2::new(14.0, 5.0),
                DVec2::new(14.0, 14.0),
                DVec2::new(5.0, 14.0),
            ],
            255,
        );
        let eroded = erode(&img, 3);
        assert_eq!(count_nonzero(&eroded), 8 * 8);
        assert_eq!(eroded.get_pixel(6, 6)[0], 255);
        assert_eq!(eroded.get_pixel(5, 5)[0], 0);
        assert_eq!(erode(&img, 1), img);
    }

    #[test]
    fn erosion_ignores_the_border() {
        let mut full = blank(6, 6);
        for p in full.pixels_mut() {
            p[0] = 255;
        }
        assert_eq!(count_nonzero(&erode(&full, 5)), 36);
    }

    #[test]
    fn diagonal_pixels_join_components() {
        let mut img = blank(5, 5);
        img.put_pixel(0, 0, Luma([1]));
        img.put_pixel(1, 1, Luma([1]));
        img.put_pixel(4, 0, Luma([1]));
        img.put_pixel(4, 1, Luma([1]));
        img.put_pixel(3, 2, Luma([1]));
        img.put_pixel(0, 4, Luma([1]));
        let cc = label_components(&img);
        assert_eq!(cc.count(), 3);
        assert_eq!(cc.sizes(), &[2, 3, 1]);
        assert_eq!(cc.largest(), Some((2, 3)));
        assert_eq!(count_nonzero(&cc.mask(2)), 3);
        assert_eq!(label_components(&blank(3, 3)).largest(), None);
    }

    #[test]
    fn thick_segment_covers_its_width() {
        let mut img = blank(20, 20);
        draw_thick_segment(&mut img, DVec2::new(5.0, 10.0), DVec2::new(15.0, 10.0), 4, 255);
        for y in 8..=12 {
            assert_eq!(img.get_pixel(10, y)[0], 255, "row {y}");
        }
        assert_eq!(img.get_pixel(10, 13)[0], 0);
        let mut thin = blank(5, 5);
        draw_thick_segment(&mut thin, DVec2::new(0.0, 0.0), DVec2::new(4.0, 4.0), 1, 9);
        assert_eq!(count_nonzero(&thin), 5);
    }

    #[test]
    fn union_and_subtract() {
        let mut a = blank(2, 1);
        let mut b = blank(2, 1);
        a.put_pixel(0, 0, Luma([255]));
        b.put_pixel(1, 0, Luma([255]));
        union_into(&mut a, &b);
        assert_eq!(count_nonzero(&a), 2);
        subtract(&mut a, &b);
        assert_eq!(count_nonzero(&a), 1);
    }
}
