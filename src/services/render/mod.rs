//! Raster chart rendering
//!
//! Charts are drawn straight onto an RGB canvas and written as PNG. Layout
//! follows the theme: figure size times dpi gives the pixel size, panel ratios
//! split the plot height, and line widths are given in points (1/72 inch).

pub mod candle;
pub mod canvas;
pub mod kline;
pub mod palette;

pub use candle::{render_candles, CandleDetails};
pub use canvas::Canvas;
pub use kline::render_kline;
pub use palette::Palette;

use crate::models::{ColorScheme, DailyBar, GridStyle, ThemeDescriptor};
use image::Rgb;

/// Output options shared by all renderers
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderOptions {
    /// Multiplier applied to `figsize × dpi`
    pub render_scale: f64,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self { render_scale: 1.0 }
    }
}

/// Pixel metrics derived from a theme and render scale
#[derive(Debug, Clone, Copy)]
pub(crate) struct Metrics {
    pub width: u32,
    pub height: u32,
    /// Pixels per point
    pub px_per_pt: f64,
    pub y_on_right: bool,
    pub grid_dash: Option<(u32, u32)>,
}

impl Metrics {
    pub fn new(theme: &ThemeDescriptor, options: &RenderOptions) -> Self {
        let scale = if options.render_scale > 0.0 { options.render_scale } else { 1.0 };
        let (width, height) = theme.pixel_size(scale);
        let px_per_pt = theme.dpi as f64 * scale / 72.0;
        let dash_on = ((4.0 * px_per_pt).round() as u32).max(2);
        let grid_dash = match theme.grid_style {
            GridStyle::Dashed => Some((dash_on, dash_on)),
            GridStyle::Solid => None,
        };
        Self {
            width,
            height,
            px_per_pt,
            y_on_right: theme.y_on_right,
            grid_dash,
        }
    }

    /// Stroke thickness in pixels for a width in points
    pub fn stroke(&self, points: f64) -> u32 {
        ((points * self.px_per_pt).round() as u32).max(1)
    }

    /// Outer margin, wider on the side carrying the price axis
    pub fn margins(&self, font_size: u32) -> (f64, f64, f64, f64) {
        let base = (self.width.min(self.height) as f64 * 0.03).max(2.0);
        let axis = base + font_size as f64 * self.px_per_pt * 4.0;
        let (left, right) = if self.y_on_right { (base, axis) } else { (axis, base) };
        (left, base, right, base + font_size as f64 * self.px_per_pt * 2.0)
    }
}

/// A rectangular plot area in canvas coordinates
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct Panel {
    pub left: f64,
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
}

impl Panel {
    pub fn width(&self) -> f64 {
        self.right - self.left
    }

    pub fn height(&self) -> f64 {
        self.bottom - self.top
    }

    /// Width of one candle slot
    pub fn slot(&self, count: usize) -> f64 {
        self.width() / count.max(1) as f64
    }

    /// Horizontal centre of row `index` out of `count`
    pub fn x(&self, index: usize, count: usize) -> f64 {
        self.left + self.slot(count) * (index as f64 + 0.5)
    }

    /// Split vertically by relative heights with a gap between panels
    pub fn split(&self, ratios: &[f64], gap: f64) -> Vec<Panel> {
        let total: f64 = ratios.iter().filter(|r| **r > 0.0).sum();
        if total <= 0.0 {
            return vec![*self];
        }
        let usable = (self.height() - gap * ratios.len().saturating_sub(1) as f64).max(0.0);
        let mut top = self.top;
        ratios
            .iter()
            .map(|r| {
                let height = usable * r.max(0.0) / total;
                let panel = Panel {
                    left: self.left,
                    top,
                    right: self.right,
                    bottom: top + height,
                };
                top += height + gap;
                panel
            })
            .collect()
    }
}

/// Linear value-to-pixel mapping for one panel
#[derive(Debug, Clone, Copy)]
pub(crate) struct ValueScale {
    min: f64,
    max: f64,
    top: f64,
    bottom: f64,
}

impl ValueScale {
    /// Scale covering the values with 5% headroom on both ends
    pub fn fit(panel: &Panel, values: impl IntoIterator<Item = f64>) -> Self {
        let (mut min, mut max) = values
            .into_iter()
            .filter(|v| v.is_finite())
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| (lo.min(v), hi.max(v)));
        if !min.is_finite() || !max.is_finite() {
            min = 0.0;
            max = 1.0;
        }
        if (max - min).abs() < f64::EPSILON {
            let pad = if min.abs() > 0.0 { min.abs() * 0.01 } else { 1.0 };
            min -= pad;
            max += pad;
        }
        let pad = (max - min) * 0.05;
        Self::fixed(panel, min - pad, max + pad)
    }

    pub fn fixed(panel: &Panel, min: f64, max: f64) -> Self {
        Self {
            min,
            max,
            top: panel.top,
            bottom: panel.bottom,
        }
    }

    pub fn y(&self, value: f64) -> f64 {
        let span = self.max - self.min;
        if span <= 0.0 {
            return (self.top + self.bottom) / 2.0;
        }
        self.bottom - (value - self.min) / span * (self.bottom - self.top)
    }
}

/// Panel background, grid and the price-side axis
pub(crate) fn draw_panel(canvas: &mut Canvas, panel: &Panel, palette: &Palette, metrics: &Metrics) {
    canvas.fill_rect(panel.left, panel.top, panel.right, panel.bottom, palette.panel);

    let grid = metrics.stroke(0.5);
    for i in 1..5 {
        let y = panel.top + panel.height() * i as f64 / 5.0;
        canvas.dashed_line(panel.left, y, panel.right, y, grid, palette.grid, metrics.grid_dash);
    }
    for i in 1..6 {
        let x = panel.left + panel.width() * i as f64 / 6.0;
        canvas.dashed_line(x, panel.top, x, panel.bottom, grid, palette.grid, metrics.grid_dash);
    }

    let axis = metrics.stroke(0.8);
    canvas.stroke_rect(panel.left, panel.top, panel.right, panel.bottom, axis, palette.axis);

    // Tick marks on the price side
    let tick = 4.0 * metrics.px_per_pt;
    let (x0, x1) = if metrics.y_on_right {
        (panel.right, panel.right + tick)
    } else {
        (panel.left - tick, panel.left)
    };
    for i in 0..=5 {
        let y = panel.top + panel.height() * i as f64 / 5.0;
        canvas.line(x0, y, x1, y, axis, palette.axis);
    }
}

/// Candle bodies and wicks
pub(crate) fn draw_candles(
    canvas: &mut Canvas,
    panel: &Panel,
    scale: &ValueScale,
    bars: &[DailyBar],
    colors: &ColorScheme,
    metrics: &Metrics,
) {
    let count = bars.len();
    let body = (panel.slot(count) * 0.7).max(1.0);
    let wick = metrics.stroke(0.8).min(body as u32).max(1);

    for (i, bar) in bars.iter().enumerate() {
        let color = candle_color(bar, colors);
        let x = panel.x(i, count);
        canvas.line(x, scale.y(bar.high), x, scale.y(bar.low), wick, color);
        canvas.fill_rect(
            x - body / 2.0,
            scale.y(bar.open),
            x + body / 2.0,
            scale.y(bar.close),
            color,
        );
    }
}

pub(crate) fn candle_color(bar: &DailyBar, colors: &ColorScheme) -> Rgb<u8> {
    if bar.is_up() {
        colors.up
    } else {
        colors.down
    }
}

/// Points of an indicator column, `None` where undefined
pub(crate) fn series_points(
    panel: &Panel,
    scale: &ValueScale,
    values: &[Option<f64>],
) -> Vec<Option<(f64, f64)>> {
    let count = values.len();
    values
        .iter()
        .enumerate()
        .map(|(i, v)| v.filter(|v| v.is_finite()).map(|v| (panel.x(i, count), scale.y(v))))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ThemeRegistry;

    #[test]
    fn test_panel_split_ratios() {
        let panel = Panel {
            left: 0.0,
            top: 0.0,
            right: 100.0,
            bottom: 320.0,
        };
        let parts = panel.split(&[6.0, 2.0, 2.0], 10.0);
        assert_eq!(parts.len(), 3);
        assert!((parts[0].height() - 180.0).abs() < 1e-9);
        assert!((parts[1].top - 190.0).abs() < 1e-9);
        assert!((parts[2].bottom - 320.0).abs() < 1e-9);
    }

    #[test]
    fn test_value_scale_orientation() {
        let panel = Panel {
            left: 0.0,
            top: 10.0,
            right: 10.0,
            bottom: 110.0,
        };
        let scale = ValueScale::fixed(&panel, 0.0, 100.0);
        assert_eq!(scale.y(0.0), 110.0);
        assert_eq!(scale.y(100.0), 10.0);

        let flat = ValueScale::fit(&panel, vec![5.0, 5.0]);
        assert!(flat.y(5.0) > 10.0 && flat.y(5.0) < 110.0);
    }

    #[test]
    fn test_metrics_from_theme() {
        let registry = ThemeRegistry::builtin();
        let metrics = Metrics::new(registry.resolve("classic"), &RenderOptions { render_scale: 0.05 });
        assert_eq!((metrics.width, metrics.height), (240, 240));
        assert!(metrics.grid_dash.is_none());
        assert!(!metrics.y_on_right);
        assert!(Metrics::new(registry.resolve("default"), &RenderOptions::default()).grid_dash.is_some());
    }
}
