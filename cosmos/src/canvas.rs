//! Sub-pixel framebuffer the scenes draw into.
//!
//! Coordinates are in braille sub-pixels: one terminal cell is 2 wide and 4
//! tall. Drawing is additive, so overlapping glows brighten each other the
//! way stacked radial gradients do on a 2D canvas with `lighter` compositing.

use crate::color::{clampf, Rgb};

pub const SUBPIXELS_X: usize = 2;
pub const SUBPIXELS_Y: usize = 4;

#[derive(Clone, Debug)]
pub struct Canvas {
    width: usize,
    height: usize,
    pixels: Vec<[f32; 3]>,
}

impl Canvas {
    pub fn new(width: usize, height: usize) -> Self {
        Canvas {
            width,
            height,
            pixels: vec![[0.0; 3]; width * height],
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn resize(&mut self, width: usize, height: usize) {
        self.width = width;
        self.height = height;
        self.pixels.clear();
        self.pixels.resize(width * height, [0.0; 3]);
    }

    pub fn clear(&mut self) {
        for p in self.pixels.iter_mut() {
            *p = [0.0; 3];
        }
    }

    pub fn pixel(&self, x: usize, y: usize) -> [f32; 3] {
        if x >= self.width || y >= self.height {
            return [0.0; 3];
        }
        self.pixels[y * self.width + x]
    }

    /// Perceived brightness of a sub-pixel, 0 for black.
    pub fn luma(&self, x: usize, y: usize) -> f32 {
        let [r, g, b] = self.pixel(x, y);
        0.2126 * r + 0.7152 * g + 0.0722 * b
    }

    /// Composites a flat color over the whole surface ("source-over" fill).
    pub fn blend(&mut self, color: Rgb, alpha: f32) {
        let a = clampf(alpha, 0.0, 1.0);
        if a <= 0.0 {
            return;
        }
        let c = color.to_linear();
        for p in self.pixels.iter_mut() {
            for k in 0..3 {
                p[k] = p[k] * (1.0 - a) + c[k] * a;
            }
        }
    }

    fn add(&mut self, x: i32, y: i32, c: [f32; 3], w: f32) {
        if x < 0 || y < 0 || x as usize >= self.width || y as usize >= self.height {
            return;
        }
        let p = &mut self.pixels[y as usize * self.width + x as usize];
        for k in 0..3 {
            p[k] += c[k] * w;
        }
    }

    /// Radial gradient centred on `(x, y)`: `color * alpha` at the centre,
    /// fully transparent at `radius`.
    pub fn glow(&mut self, x: f32, y: f32, radius: f32, color: Rgb, alpha: f32) {
        if alpha <= 0.0 || radius <= 0.0 {
            return;
        }
        let c = color.to_linear();
        // Tiny glows still light the sub-pixel they sit on.
        let r = radius.max(0.75);
        let x0 = (x - r).floor() as i32;
        let x1 = (x + r).ceil() as i32;
        let y0 = (y - r).floor() as i32;
        let y1 = (y + r).ceil() as i32;
        for yy in y0..=y1 {
            for xx in x0..=x1 {
                let dx = xx as f32 + 0.5 - x;
                let dy = yy as f32 + 0.5 - y;
                let t = (dx * dx + dy * dy).sqrt() / r;
                if t >= 1.0 {
                    continue;
                }
                // linear falloff: 1 at centre, 0.5 at half radius, 0 at the rim
                self.add(xx, yy, c, (1.0 - t) * alpha);
            }
        }
    }

    /// Solid filled circle.
    pub fn disc(&mut self, x: f32, y: f32, radius: f32, color: Rgb, alpha: f32) {
        if alpha <= 0.0 || radius <= 0.0 {
            return;
        }
        let c = color.to_linear();
        let r = radius.max(0.5);
        let x0 = (x - r).floor() as i32;
        let x1 = (x + r).ceil() as i32;
        let y0 = (y - r).floor() as i32;
        let y1 = (y + r).ceil() as i32;
        for yy in y0..=y1 {
            for xx in x0..=x1 {
                let dx = xx as f32 + 0.5 - x;
                let dy = yy as f32 + 0.5 - y;
                if dx * dx + dy * dy <= r * r {
                    self.add(xx, yy, c, alpha);
                }
            }
        }
    }

    /// One sub-pixel wide circle outline.
    pub fn ring(&mut self, cx: f32, cy: f32, radius: f32, color: Rgb, alpha: f32) {
        if alpha <= 0.0 || radius <= 0.0 {
            return;
        }
        let c = color.to_linear();
        let steps = ((radius * std::f32::consts::TAU).ceil() as usize).max(8);
        for i in 0..steps {
            let a = i as f32 / steps as f32 * std::f32::consts::TAU;
            let x = cx + a.cos() * radius;
            let y = cy + a.sin() * radius;
            self.add(x.floor() as i32, y.floor() as i32, c, alpha);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn glow_is_brightest_at_centre_and_dark_outside_radius() {
        let mut c = Canvas::new(20, 20);
        c.glow(10.0, 10.0, 4.0, Rgb::WHITE, 1.0);
        let centre = c.luma(10, 10);
        let edge = c.luma(12, 10);
        assert!(centre > edge);
        assert!(edge > 0.0);
        assert_eq!(c.luma(15, 10), 0.0);
        assert_eq!(c.luma(10, 15), 0.0);
    }

    #[test]
    fn zero_alpha_draws_nothing() {
        let mut c = Canvas::new(8, 8);
        c.glow(4.0, 4.0, 3.0, Rgb::WHITE, 0.0);
        c.disc(4.0, 4.0, 3.0, Rgb::WHITE, -1.0);
        assert!((0..8).all(|y| (0..8).all(|x| c.luma(x, y) == 0.0)));
    }

    #[test]
    fn drawing_off_surface_is_clipped() {
        let mut c = Canvas::new(4, 4);
        c.glow(-10.0, -10.0, 3.0, Rgb::WHITE, 1.0);
        c.disc(100.0, 2.0, 5.0, Rgb::WHITE, 1.0);
        assert!((0..4).all(|y| (0..4).all(|x| c.luma(x, y) == 0.0)));
    }

    #[test]
    fn blend_moves_towards_fill_color() {
        let mut c = Canvas::new(2, 2);
        c.blend(Rgb::WHITE, 1.0);
        assert!((c.luma(0, 0) - 1.0).abs() < 1e-4);
        c.blend(Rgb::BLACK, 0.5);
        assert!((c.luma(1, 1) - 0.5).abs() < 1e-4);
    }
}
