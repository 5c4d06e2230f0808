mod chart_config;
mod daily_bar;
mod indicator_config;
mod theme;
pub mod indicators;

pub use chart_config::{ColorScheme, TimeRange};
pub use daily_bar::{normalize_series, DailyBar};
pub use indicator_config::{IndicatorConfig, IndicatorKind};
pub use theme::{GridStyle, ThemeDescriptor, ThemeRegistry};
