use crate::constants::KLINE_OUTPUT_DIR;
use crate::error::Result;
use crate::models::{IndicatorConfig, ThemeRegistry, TimeRange};
use crate::services::{GenerationStats, KlineGenerator};
use crate::utils::get_data_dir;
use std::path::PathBuf;

pub struct KlineArgs {
    pub theme: String,
    pub limit: Option<usize>,
    pub indicators: Option<String>,
    pub start_date: String,
    pub end_date: Option<String>,
    pub window_months: u32,
    pub output: Option<PathBuf>,
    pub scale: f64,
}

pub fn run(args: KlineArgs) {
    match generate(args) {
        Ok(stats) => super::print_stats(&stats),
        Err(e) => super::exit_with_error(e),
    }
}

fn generate(args: KlineArgs) -> Result<GenerationStats> {
    let registry = ThemeRegistry::builtin();
    let theme = registry.resolve(&args.theme).clone();

    let mut generator = KlineGenerator::new(
        get_data_dir(),
        args.output.unwrap_or_else(|| PathBuf::from(KLINE_OUTPUT_DIR)),
        theme,
    );
    generator.range = TimeRange::parse(Some(args.start_date.as_str()), args.end_date.as_deref(), args.window_months)?;
    if let Some(list) = &args.indicators {
        generator.indicators = IndicatorConfig::parse_list(list)?;
    }
    generator.limit = args.limit;
    generator.options = super::render_options(args.scale)?;

    let enabled: Vec<String> = generator
        .indicators
        .enabled_kinds()
        .iter()
        .map(|k| k.to_string())
        .collect();
    println!("🎨 Theme: {}", generator.theme.name);
    println!("📐 Indicators: {}", enabled.join(", "));
    println!("📁 Output: {}", generator.output_dir.display());

    super::run_cancellable(move |cancel| generator.run(&cancel))
}
