use crate::models::ThemeRegistry;

pub fn run() {
    let registry = ThemeRegistry::builtin();

    println!("🎨 Available themes\n");
    for theme in registry.iter() {
        let (w, h) = theme.figsize;
        println!(
            "   {:<16} style={:<16} grid={:<2} y_on_right={:<5} {}x{}in @ {}dpi",
            theme.name,
            theme.style,
            theme.grid_style.as_str(),
            theme.y_on_right,
            w,
            h,
            theme.dpi
        );
    }
}
