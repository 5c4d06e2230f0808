use crate::error::{Error, Result};
use image::{Rgb, RgbImage};
use std::path::Path;

/// Dash pattern as (on, off) lengths in pixels
pub type Dash = (u32, u32);

/// RGB raster with the few primitives charts need
pub struct Canvas {
    image: RgbImage,
}

impl Canvas {
    pub fn new(width: u32, height: u32, background: Rgb<u8>) -> Self {
        Self {
            image: RgbImage::from_pixel(width.max(1), height.max(1), background),
        }
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<Rgb<u8>> {
        (x < self.width() && y < self.height()).then(|| *self.image.get_pixel(x, y))
    }

    fn put(&mut self, x: i64, y: i64, color: Rgb<u8>) {
        if x >= 0 && y >= 0 && (x as u32) < self.width() && (y as u32) < self.height() {
            self.image.put_pixel(x as u32, y as u32, color);
        }
    }

    /// Filled rectangle spanning `[x0, x1] × [y0, y1]` in any corner order
    pub fn fill_rect(&mut self, x0: f64, y0: f64, x1: f64, y1: f64, color: Rgb<u8>) {
        let (left, right) = (x0.min(x1).round() as i64, x0.max(x1).round() as i64);
        let (top, bottom) = (y0.min(y1).round() as i64, y0.max(y1).round() as i64);
        for y in top..=bottom {
            for x in left..=right {
                self.put(x, y, color);
            }
        }
    }

    /// Rectangle outline
    pub fn stroke_rect(&mut self, x0: f64, y0: f64, x1: f64, y1: f64, thickness: u32, color: Rgb<u8>) {
        self.line(x0, y0, x1, y0, thickness, color);
        self.line(x1, y0, x1, y1, thickness, color);
        self.line(x1, y1, x0, y1, thickness, color);
        self.line(x0, y1, x0, y0, thickness, color);
    }

    fn stamp(&mut self, x: f64, y: f64, thickness: u32, color: Rgb<u8>) {
        let t = thickness.max(1) as i64;
        let (cx, cy) = (x.round() as i64, y.round() as i64);
        let lo = -(t - 1) / 2;
        let hi = t / 2;
        for dy in lo..=hi {
            for dx in lo..=hi {
                self.put(cx + dx, cy + dy, color);
            }
        }
    }

    /// Straight line of the given thickness
    pub fn line(&mut self, x0: f64, y0: f64, x1: f64, y1: f64, thickness: u32, color: Rgb<u8>) {
        self.dashed_line(x0, y0, x1, y1, thickness, color, None);
    }

    /// Line with an optional dash pattern
    #[allow(clippy::too_many_arguments)]
    pub fn dashed_line(
        &mut self,
        x0: f64,
        y0: f64,
        x1: f64,
        y1: f64,
        thickness: u32,
        color: Rgb<u8>,
        dash: Option<Dash>,
    ) {
        let (dx, dy) = (x1 - x0, y1 - y0);
        let steps = dx.abs().max(dy.abs()).ceil().max(1.0) as u32;
        for i in 0..=steps {
            if let Some((on, off)) = dash {
                let period = (on + off).max(1);
                if i % period >= on {
                    continue;
                }
            }
            let t = i as f64 / steps as f64;
            self.stamp(x0 + dx * t, y0 + dy * t, thickness, color);
        }
    }

    /// Connected line through the points; `None` breaks the trace
    pub fn polyline(&mut self, points: &[Option<(f64, f64)>], thickness: u32, color: Rgb<u8>) {
        for pair in points.windows(2) {
            if let (Some((x0, y0)), Some((x1, y1))) = (pair[0], pair[1]) {
                self.line(x0, y0, x1, y1, thickness, color);
            }
        }
        // Isolated defined points still show up
        for (i, point) in points.iter().enumerate() {
            let prev = i.checked_sub(1).and_then(|j| points[j]);
            let next = points.get(i + 1).copied().flatten();
            if let (Some((x, y)), None, None) = (point, prev, next) {
                self.stamp(*x, *y, thickness, color);
            }
        }
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        self.image
            .save(path)
            .map_err(|e| Error::Render(format!("Failed to save {}: {}", path.display(), e)))
    }

    pub fn into_image(self) -> RgbImage {
        self.image
    }
}
