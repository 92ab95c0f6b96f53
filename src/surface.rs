//! CPU raster surface.
//!
//! Premultiplied RGBA8 pixmap plus the small set of byte-loop primitives the
//! renderer needs: gradient fill, soft discs, stamped segments, premul over
//! compositing. Everything is deterministic integer/float math with no
//! platform dependence.

use crate::core::{Canvas, Point};
use crate::error::{AspectraError, AspectraResult};

/// A rendered frame as premultiplied RGBA8 pixels.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Frame {
    pub width: u32,
    pub height: u32,
    /// RGBA8 bytes, tightly packed, row-major, premultiplied alpha.
    pub data: Vec<u8>,
}

impl Frame {
    pub fn canvas(&self) -> Canvas {
        Canvas {
            width: self.width,
            height: self.height,
        }
    }
}

/// Straight-alpha color with float channels in [0,1].
#[derive(Clone, Copy, Debug)]
pub struct Color {
    pub r: f64,
    pub g: f64,
    pub b: f64,
    pub a: f64,
}

impl Color {
    pub fn new(r: f64, g: f64, b: f64, a: f64) -> Self {
        Self { r, g, b, a }
    }

    pub fn with_alpha(self, a: f64) -> Self {
        Self { a, ..self }
    }

    /// HSL to RGB, hue in degrees (any value, wrapped), s/l in [0,1].
    pub fn from_hsl(h: f64, s: f64, l: f64, a: f64) -> Self {
        let h = h.rem_euclid(360.0);
        let s = s.clamp(0.0, 1.0);
        let l = l.clamp(0.0, 1.0);

        let c = (1.0 - (2.0 * l - 1.0).abs()) * s;
        let hp = h / 60.0;
        let x = c * (1.0 - (hp.rem_euclid(2.0) - 1.0).abs());
        let (r1, g1, b1) = match hp as u32 {
            0 => (c, x, 0.0),
            1 => (x, c, 0.0),
            2 => (0.0, c, x),
            3 => (0.0, x, c),
            4 => (x, 0.0, c),
            _ => (c, 0.0, x),
        };
        let m = l - c / 2.0;
        Self::new(r1 + m, g1 + m, b1 + m, a)
    }
}

/// Owned premultiplied RGBA8 raster target.
#[derive(Clone, Debug)]
pub struct Pixmap {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl Pixmap {
    pub fn new(canvas: Canvas) -> AspectraResult<Self> {
        canvas.validate()?;
        Ok(Self {
            width: canvas.width,
            height: canvas.height,
            data: vec![0u8; canvas.pixel_bytes()],
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn clear(&mut self) {
        self.data.fill(0);
    }

    pub fn to_frame(&self) -> Frame {
        Frame {
            width: self.width,
            height: self.height,
            data: self.data.clone(),
        }
    }

    /// Source-over one straight-alpha color onto a single pixel.
    pub fn blend_px(&mut self, x: i64, y: i64, color: Color) {
        if x < 0 || y < 0 || x >= i64::from(self.width) || y >= i64::from(self.height) {
            return;
        }
        let sa = color.a.clamp(0.0, 1.0);
        if sa <= 0.0 {
            return;
        }
        let idx = ((y as usize) * (self.width as usize) + (x as usize)) * 4;

        // Premultiplied source channels.
        let sr = color.r.clamp(0.0, 1.0) * sa;
        let sg = color.g.clamp(0.0, 1.0) * sa;
        let sb = color.b.clamp(0.0, 1.0) * sa;
        let inv = 1.0 - sa;

        let d = &mut self.data[idx..idx + 4];
        let blend = |s: f64, d: u8| -> u8 {
            let v = s + (f64::from(d) / 255.0) * inv;
            (v * 255.0 + 0.5).min(255.0) as u8
        };
        d[0] = blend(sr, d[0]);
        d[1] = blend(sg, d[1]);
        d[2] = blend(sb, d[2]);
        d[3] = blend(sa, d[3]);
    }

    /// Opaque vertical gradient across the full surface.
    pub fn fill_vertical_gradient(&mut self, top: Color, bottom: Color) {
        let h1 = (self.height.max(1) - 1) as f64;
        for y in 0..self.height {
            let t = if h1 <= 0.0 { 0.0 } else { f64::from(y) / h1 };
            let lerp = |a: f64, b: f64| a + (b - a) * t;
            let c = [
                (lerp(top.r, bottom.r).clamp(0.0, 1.0) * 255.0 + 0.5) as u8,
                (lerp(top.g, bottom.g).clamp(0.0, 1.0) * 255.0 + 0.5) as u8,
                (lerp(top.b, bottom.b).clamp(0.0, 1.0) * 255.0 + 0.5) as u8,
                255u8,
            ];
            let row = (y as usize) * (self.width as usize) * 4;
            for px in self.data[row..row + (self.width as usize) * 4].chunks_exact_mut(4) {
                px.copy_from_slice(&c);
            }
        }
    }

    /// Disc with a quadratic falloff from `color.a` at the center to zero at
    /// `radius`.
    pub fn soft_disc(&mut self, center: Point, radius: f64, color: Color) {
        if radius <= 0.0 || color.a <= 0.0 {
            return;
        }
        let x0 = (center.x - radius).floor() as i64;
        let x1 = (center.x + radius).ceil() as i64;
        let y0 = (center.y - radius).floor() as i64;
        let y1 = (center.y + radius).ceil() as i64;

        for y in y0..=y1 {
            for x in x0..=x1 {
                let dx = (x as f64 + 0.5) - center.x;
                let dy = (y as f64 + 0.5) - center.y;
                let d2 = (dx * dx + dy * dy) / (radius * radius);
                if d2 >= 1.0 {
                    continue;
                }
                let falloff = (1.0 - d2) * (1.0 - d2);
                self.blend_px(x, y, color.with_alpha(color.a * falloff));
            }
        }
    }

    /// Stroke a segment by stamping overlapping soft discs along it.
    ///
    /// Stamp spacing is half the stroke radius, so coverage along the
    /// segment is close to uniform and fully deterministic.
    pub fn stroke_segment(&mut self, a: Point, b: Point, width: f64, color: Color) {
        let radius = (width / 2.0).max(0.5);
        let delta = b - a;
        let len = delta.hypot();
        let steps = ((len / (radius * 0.5)).ceil() as usize).max(1);
        // Overlapping stamps multiply coverage; scale per-stamp alpha down
        // to keep the stroke's apparent opacity near `color.a`.
        let stamp = color.with_alpha(color.a * 0.45);
        for i in 0..=steps {
            let t = i as f64 / steps as f64;
            let p = Point::new(a.x + delta.x * t, a.y + delta.y * t);
            self.soft_disc(p, radius, stamp);
        }
    }
}
