use super::{draw_candles, draw_panel, Canvas, Metrics, Palette, Panel, RenderOptions, ValueScale};
use crate::error::{Error, Result};
use crate::models::{ColorScheme, DailyBar, ThemeDescriptor};
use std::path::Path;
use tracing::debug;

/// Summary figures of a single candle
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CandleDetails {
    pub open: f64,
    pub close: f64,
    pub high: f64,
    pub low: f64,
    pub volume: f64,
    /// `(high - low) / low`, percent
    pub amplitude_pct: f64,
    /// `close / open - 1`, percent
    pub change_pct: f64,
}

impl CandleDetails {
    pub fn from_bar(bar: &DailyBar) -> Self {
        let amplitude_pct = if bar.low != 0.0 {
            (bar.high - bar.low) / bar.low * 100.0
        } else {
            0.0
        };
        let change_pct = if bar.open != 0.0 {
            (bar.close / bar.open - 1.0) * 100.0
        } else {
            0.0
        };
        Self {
            open: bar.open,
            close: bar.close,
            high: bar.high,
            low: bar.low,
            volume: bar.volume,
            amplitude_pct,
            change_pct,
        }
    }
}

/// Render candles without volume or indicators
///
/// With `show_details` and exactly one row, dashed guides mark open, close,
/// high and low.
pub fn render_candles(
    rows: &[DailyBar],
    theme: &ThemeDescriptor,
    colors: &ColorScheme,
    path: &Path,
    show_details: bool,
    options: &RenderOptions,
) -> Result<()> {
    if rows.is_empty() {
        return Err(Error::InvalidInput("No candles to render".to_string()));
    }

    let canvas = draw_candle_chart(rows, theme, colors, show_details, options);
    canvas.save(path)?;

    if rows.len() == 1 && show_details {
        let details = CandleDetails::from_bar(&rows[0]);
        debug!(
            file = %path.display(),
            open = details.open,
            close = details.close,
            high = details.high,
            low = details.low,
            volume = details.volume,
            amplitude = %format!("{:.2}%", details.amplitude_pct),
            change = %format!("{:.2}%", details.change_pct),
            "Rendered single candle"
        );
    } else {
        debug!(file = %path.display(), rows = rows.len(), "Rendered candles");
    }
    Ok(())
}

pub(crate) fn draw_candle_chart(
    rows: &[DailyBar],
    theme: &ThemeDescriptor,
    colors: &ColorScheme,
    show_details: bool,
    options: &RenderOptions,
) -> Canvas {
    let metrics = Metrics::new(theme, options);
    let palette = Palette::for_style(&theme.style);
    let mut canvas = Canvas::new(metrics.width, metrics.height, palette.background);

    let (left, top, right, bottom) = metrics.margins(theme.font_size);
    let panel = Panel {
        left,
        top,
        right: metrics.width as f64 - right,
        bottom: metrics.height as f64 - bottom,
    };
    draw_panel(&mut canvas, &panel, &palette, &metrics);

    let scale = ValueScale::fit(&panel, rows.iter().flat_map(|b| [b.high, b.low]));
    draw_candles(&mut canvas, &panel, &scale, rows, colors, &metrics);

    if show_details && rows.len() == 1 {
        let bar = &rows[0];
        let width = metrics.stroke(0.8);
        let dash = Some((metrics.stroke(4.0), metrics.stroke(2.0)));
        for (price, color) in [
            (bar.open, colors.open_line),
            (bar.close, colors.close_line),
            (bar.high, colors.high_line),
            (bar.low, colors.low_line),
        ] {
            let y = scale.y(price);
            canvas.dashed_line(panel.left, y, panel.right, y, width, color, dash);
        }
    }

    canvas
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ThemeRegistry;
    use chrono::NaiveDate;

    fn bar() -> DailyBar {
        DailyBar::new(NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(), 10.0, 11.0, 9.5, 10.5, 12000.0)
    }

    #[test]
    fn test_candle_details() {
        let details = CandleDetails::from_bar(&bar());
        assert!((details.amplitude_pct - 1.5 / 9.5 * 100.0).abs() < 1e-9);
        assert!((details.change_pct - 5.0).abs() < 1e-9);
    }

    #[test]
    fn test_single_candle_guides() {
        let registry = ThemeRegistry::builtin();
        let colors = ColorScheme::default();
        let canvas = draw_candle_chart(
            &[bar()],
            registry.resolve("yahoo"),
            &colors,
            true,
            &RenderOptions { render_scale: 0.1 },
        );
        let img = canvas.into_image();
        assert!(img.pixels().any(|p| *p == colors.open_line));
        assert!(img.pixels().any(|p| *p == colors.low_line));

        let plain = draw_candle_chart(
            &[bar()],
            registry.resolve("yahoo"),
            &colors,
            false,
            &RenderOptions { render_scale: 0.1 },
        )
        .into_image();
        assert!(!plain.pixels().any(|p| *p == colors.low_line));
    }

    #[test]
    fn test_render_candles_rejects_empty() {
        let tmp = tempfile::tempdir().unwrap();
        let registry = ThemeRegistry::builtin();
        let result = render_candles(
            &[],
            registry.resolve("default"),
            &ColorScheme::default(),
            &tmp.path().join("x.png"),
            true,
            &RenderOptions::default(),
        );
        assert!(result.is_err());
    }
}
