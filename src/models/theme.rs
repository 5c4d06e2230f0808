//! Chart themes
//!
//! A theme is a named, immutable bundle of layout and styling parameters. The
//! registry holds the built-in themes in a fixed order and resolves unknown
//! names to the default theme.

use crate::constants::DEFAULT_THEME;
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Grid line style
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GridStyle {
    /// `--`
    Dashed,
    /// `-`
    Solid,
}

impl GridStyle {
    pub fn as_str(&self) -> &'static str {
        match self {
            GridStyle::Dashed => "--",
            GridStyle::Solid => "-",
        }
    }
}

/// Layout and styling parameters of one theme
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThemeDescriptor {
    /// Theme name, used in output paths
    pub name: String,

    /// Base palette name
    pub style: String,

    pub grid_style: GridStyle,

    /// Price axis on the right side of the panel
    pub y_on_right: bool,

    /// Figure size in inches (width, height)
    pub figsize: (f64, f64),

    /// Relative heights of the price, volume and oscillator panels
    pub panel_ratios: (f64, f64, f64),

    pub dpi: u32,

    pub line_width: f64,

    pub font_size: u32,
    pub label_size: u32,
    pub title_size: u32,

    pub tight_layout: bool,
}

impl ThemeDescriptor {
    /// Standard layout with the given palette
    fn standard(name: &str, style: &str) -> Self {
        Self {
            name: name.to_string(),
            style: style.to_string(),
            grid_style: GridStyle::Dashed,
            y_on_right: true,
            figsize: (16.0, 16.0),
            panel_ratios: (3.0, 3.0, 3.0),
            dpi: 300,
            line_width: 1.2,
            font_size: 12,
            label_size: 20,
            title_size: 40,
            tight_layout: true,
        }
    }

    /// Output size in pixels for a given render scale
    pub fn pixel_size(&self, scale: f64) -> (u32, u32) {
        let px = |inches: f64| ((inches * self.dpi as f64 * scale).round() as u32).max(1);
        (px(self.figsize.0), px(self.figsize.1))
    }
}

/// Ordered collection of themes
#[derive(Debug, Clone)]
pub struct ThemeRegistry {
    themes: Vec<ThemeDescriptor>,
}

impl ThemeRegistry {
    /// The built-in themes, `default` first
    pub fn builtin() -> Self {
        let mut classic = ThemeDescriptor::standard("classic", "classic");
        classic.grid_style = GridStyle::Solid;
        classic.y_on_right = false;
        classic.line_width = 1.0;
        classic.font_size = 10;

        let themes = vec![
            ThemeDescriptor::standard("default", "default"),
            ThemeDescriptor::standard("dark", "mike"),
            classic,
            ThemeDescriptor::standard("yahoo", "yahoo"),
            ThemeDescriptor::standard("blueskies", "blueskies"),
            ThemeDescriptor::standard("brasil", "brasil"),
            ThemeDescriptor::standard("charles", "charles"),
            ThemeDescriptor::standard("checkers", "checkers"),
            ThemeDescriptor::standard("mike", "mike"),
            ThemeDescriptor::standard("nightclouds", "nightclouds"),
            ThemeDescriptor::standard("sas", "sas"),
            ThemeDescriptor::standard("starsandstripes", "starsandstripes"),
        ];

        Self { themes }
    }

    /// Exact lookup
    pub fn get(&self, name: &str) -> Option<&ThemeDescriptor> {
        self.themes.iter().find(|t| t.name == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Theme names in registry order
    pub fn names(&self) -> Vec<&str> {
        self.themes.iter().map(|t| t.name.as_str()).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ThemeDescriptor> {
        self.themes.iter()
    }

    /// Look up a theme, falling back to `default` with a warning
    pub fn resolve(&self, name: &str) -> &ThemeDescriptor {
        if let Some(theme) = self.get(name) {
            return theme;
        }
        warn!(theme = name, fallback = DEFAULT_THEME, "Unknown theme, using default");
        self.default_theme()
    }

    pub fn default_theme(&self) -> &ThemeDescriptor {
        // builtin() always puts the default theme first
        self.get(DEFAULT_THEME).unwrap_or(&self.themes[0])
    }
}

impl Default for ThemeRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}
