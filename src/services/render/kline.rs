use super::{
    candle_color, draw_candles, draw_panel, series_points, Canvas, Metrics, Palette, Panel,
    RenderOptions, ValueScale,
};
use crate::error::Result;
use crate::models::{ColorScheme, ThemeDescriptor};
use crate::services::indicator_engine::{AugmentedSeries, IndicatorColumn};
use std::path::Path;
use tracing::debug;

/// Overlay width in points
const OVERLAY_WIDTH: f64 = 0.7;

/// Columns drawn over the price panel, with their colour and whether dashed
fn price_overlays(colors: &ColorScheme) -> [(IndicatorColumn, image::Rgb<u8>, bool); 6] {
    [
        (IndicatorColumn::Ma5, colors.ma5, false),
        (IndicatorColumn::Ma20, colors.ma20, false),
        (IndicatorColumn::Vwap, colors.vwap, false),
        (IndicatorColumn::BollUpper, colors.boll, false),
        (IndicatorColumn::BollMiddle, colors.boll, true),
        (IndicatorColumn::BollLower, colors.boll, false),
    ]
}

/// Render a three-panel chart: price with overlays, volume, oscillators
pub fn render_kline(
    window: &AugmentedSeries,
    theme: &ThemeDescriptor,
    colors: &ColorScheme,
    path: &Path,
    options: &RenderOptions,
) -> Result<()> {
    let canvas = draw_kline(window, theme, colors, options);
    canvas.save(path)?;
    debug!(file = %path.display(), rows = window.len(), theme = %theme.name, "Rendered kline chart");
    Ok(())
}

pub(crate) fn draw_kline(
    window: &AugmentedSeries,
    theme: &ThemeDescriptor,
    colors: &ColorScheme,
    options: &RenderOptions,
) -> Canvas {
    let metrics = Metrics::new(theme, options);
    let palette = Palette::for_style(&theme.style);
    let mut canvas = Canvas::new(metrics.width, metrics.height, palette.background);

    let (left, top, right, bottom) = metrics.margins(theme.font_size);
    let outer = Panel {
        left,
        top,
        right: metrics.width as f64 - right,
        bottom: metrics.height as f64 - bottom,
    };
    let gap = theme.label_size as f64 * metrics.px_per_pt * 0.5;
    let (price_ratio, volume_ratio, osc_ratio) = theme.panel_ratios;
    let panels = outer.split(&[price_ratio, volume_ratio, osc_ratio], gap);
    for panel in &panels {
        draw_panel(&mut canvas, panel, &palette, &metrics);
    }

    if window.is_empty() || panels.len() < 3 {
        return canvas;
    }

    draw_price_panel(&mut canvas, &panels[0], window, theme, colors, &metrics);
    draw_volume_panel(&mut canvas, &panels[1], window, colors);
    draw_oscillator_panel(&mut canvas, &panels[2], window, theme, colors, &metrics);

    canvas
}

fn draw_price_panel(
    canvas: &mut Canvas,
    panel: &Panel,
    window: &AugmentedSeries,
    theme: &ThemeDescriptor,
    colors: &ColorScheme,
    metrics: &Metrics,
) {
    let bars = window.bars();
    let overlays = price_overlays(colors);

    let overlay_values = overlays
        .iter()
        .filter_map(|(column, _, _)| window.column(*column))
        .flat_map(|values| values.iter().flatten().copied());
    let scale = ValueScale::fit(
        panel,
        bars.iter()
            .flat_map(|b| [b.high, b.low])
            .chain(overlay_values),
    );

    draw_candles(canvas, panel, &scale, bars, colors, metrics);

    let width = metrics.stroke(OVERLAY_WIDTH * theme.line_width);
    let dash = Some((metrics.stroke(3.0), metrics.stroke(2.0)));
    for (column, color, dashed) in overlays {
        let Some(values) = window.column(column) else {
            continue;
        };
        let points = series_points(panel, &scale, values);
        if dashed {
            for pair in points.windows(2) {
                if let (Some((x0, y0)), Some((x1, y1))) = (pair[0], pair[1]) {
                    canvas.dashed_line(x0, y0, x1, y1, width, color, dash);
                }
            }
        } else {
            canvas.polyline(&points, width, color);
        }
    }
}

fn draw_volume_panel(canvas: &mut Canvas, panel: &Panel, window: &AugmentedSeries, colors: &ColorScheme) {
    let bars = window.bars();
    let max_volume = bars.iter().map(|b| b.volume).fold(0.0_f64, f64::max);
    let scale = ValueScale::fixed(panel, 0.0, if max_volume > 0.0 { max_volume * 1.05 } else { 1.0 });

    let count = bars.len();
    let width = (panel.slot(count) * 0.7).max(1.0);
    for (i, bar) in bars.iter().enumerate() {
        let x = panel.x(i, count);
        canvas.fill_rect(
            x - width / 2.0,
            scale.y(0.0),
            x + width / 2.0,
            scale.y(bar.volume.max(0.0)),
            candle_color(bar, colors),
        );
    }
}

fn draw_oscillator_panel(
    canvas: &mut Canvas,
    panel: &Panel,
    window: &AugmentedSeries,
    theme: &ThemeDescriptor,
    colors: &ColorScheme,
    metrics: &Metrics,
) {
    let count = window.len();
    let width = metrics.stroke(OVERLAY_WIDTH * theme.line_width);

    let macd_columns = [
        IndicatorColumn::Macd,
        IndicatorColumn::MacdSignal,
        IndicatorColumn::MacdHistPos,
        IndicatorColumn::MacdHistNeg,
    ];
    let macd_values: Vec<f64> = macd_columns
        .iter()
        .filter_map(|c| window.column(*c))
        .flat_map(|values| values.iter().flatten().copied())
        .chain(std::iter::once(0.0))
        .collect();

    if window.has_column(IndicatorColumn::Macd) {
        let scale = ValueScale::fit(panel, macd_values);
        let bar_width = (panel.slot(count) * 0.7).max(1.0);

        let bars = [
            (IndicatorColumn::MacdHistPos, colors.hist_pos),
            (IndicatorColumn::MacdHistNeg, colors.hist_neg),
        ];
        for (column, color) in bars {
            let Some(values) = window.column(column) else {
                continue;
            };
            for (i, value) in values.iter().enumerate() {
                let Some(value) = value.filter(|v| *v != 0.0) else {
                    continue;
                };
                let x = panel.x(i, count);
                canvas.fill_rect(x - bar_width / 2.0, scale.y(0.0), x + bar_width / 2.0, scale.y(value), color);
            }
        }

        for (column, color) in [
            (IndicatorColumn::Macd, colors.macd),
            (IndicatorColumn::MacdSignal, colors.signal),
        ] {
            if let Some(values) = window.column(column) {
                canvas.polyline(&series_points(panel, &scale, values), width, color);
            }
        }
    }

    // RSI keeps its own 0..100 scale
    if let Some(values) = window.column(IndicatorColumn::Rsi) {
        let scale = ValueScale::fixed(panel, 0.0, 100.0);
        canvas.polyline(&series_points(panel, &scale, values), width, colors.rsi);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{DailyBar, IndicatorConfig, ThemeRegistry};
    use crate::services::indicator_engine::compute_indicators;
    use chrono::{Duration, NaiveDate};

    fn series(n: usize) -> Vec<DailyBar> {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        (0..n)
            .map(|i| {
                let close = 20.0 + (i as f64 * 0.4).cos() * 3.0;
                let open = if i % 2 == 0 { close - 0.5 } else { close + 0.5 };
                DailyBar::new(
                    start + Duration::days(i as i64),
                    open,
                    close.max(open) + 0.3,
                    close.min(open) - 0.3,
                    close,
                    5000.0 + i as f64 * 100.0,
                )
            })
            .collect()
    }

    #[test]
    fn test_render_kline_writes_png() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("k.png");
        let registry = ThemeRegistry::builtin();
        let augmented = compute_indicators(&series(60), &IndicatorConfig::all());
        let options = RenderOptions { render_scale: 0.05 };

        render_kline(&augmented, registry.resolve("nightclouds"), &ColorScheme::default(), &path, &options)
            .unwrap();

        let img = image::open(&path).unwrap();
        assert_eq!((img.width(), img.height()), (240, 240));
    }

    #[test]
    fn test_candle_colors_present() {
        let registry = ThemeRegistry::builtin();
        let colors = ColorScheme::default();
        let augmented = compute_indicators(&series(30), &IndicatorConfig::none());
        let canvas = draw_kline(
            &augmented,
            registry.resolve("default"),
            &colors,
            &RenderOptions { render_scale: 0.1 },
        );

        let img = canvas.into_image();
        assert!(img.pixels().any(|p| *p == colors.up));
        assert!(img.pixels().any(|p| *p == colors.down));
    }

    #[test]
    fn test_empty_window_still_renders() {
        let registry = ThemeRegistry::builtin();
        let augmented = compute_indicators(&[], &IndicatorConfig::default());
        let canvas = draw_kline(
            &augmented,
            registry.resolve("classic"),
            &ColorScheme::default(),
            &RenderOptions { render_scale: 0.02 },
        );
        assert_eq!(canvas.width(), 96);
    }
}
