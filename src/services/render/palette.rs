use image::Rgb;

/// Background and chrome colours of a base style
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Palette {
    /// Figure background
    pub background: Rgb<u8>,
    /// Plot area background
    pub panel: Rgb<u8>,
    pub grid: Rgb<u8>,
    /// Axis spines and ticks
    pub axis: Rgb<u8>,
}

impl Palette {
    const fn new(background: [u8; 3], panel: [u8; 3], grid: [u8; 3], axis: [u8; 3]) -> Self {
        Self {
            background: Rgb(background),
            panel: Rgb(panel),
            grid: Rgb(grid),
            axis: Rgb(axis),
        }
    }

    /// Palette for a base style name; unknown names get the default palette
    pub fn for_style(style: &str) -> Self {
        match style {
            "classic" => Self::new([255, 255, 255], [255, 255, 255], [200, 200, 200], [0, 0, 0]),
            "yahoo" => Self::new([255, 255, 255], [255, 255, 255], [222, 226, 230], [90, 90, 90]),
            "blueskies" => Self::new([235, 243, 252], [220, 235, 250], [180, 200, 230], [40, 60, 110]),
            "brasil" => Self::new([255, 255, 230], [250, 250, 215], [200, 210, 160], [0, 90, 40]),
            "charles" => Self::new([255, 255, 255], [248, 248, 248], [215, 215, 215], [60, 60, 60]),
            "checkers" => Self::new([250, 250, 250], [240, 240, 240], [190, 190, 190], [20, 20, 20]),
            "mike" => Self::new([10, 10, 10], [0, 0, 0], [60, 60, 60], [200, 200, 200]),
            "nightclouds" => Self::new([10, 20, 40], [5, 15, 35], [50, 70, 100], [210, 220, 235]),
            "sas" => Self::new([245, 248, 250], [255, 255, 255], [210, 215, 220], [70, 80, 90]),
            "starsandstripes" => Self::new([250, 250, 255], [240, 244, 255], [190, 200, 230], [30, 40, 110]),
            _ => Self::default(),
        }
    }
}

impl Default for Palette {
    fn default() -> Self {
        Self::new([255, 255, 255], [250, 250, 250], [220, 220, 220], [40, 40, 40])
    }
}
