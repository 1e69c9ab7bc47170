// ABOUTME: Layout module for the ocr-deck application
// ABOUTME: Converts pixels and inches to slide geometry and resolves slide sizes

/// Pixel density assumed for every input image, regardless of embedded metadata.
pub const ASSUMED_DPI: f64 = 96.0;

/// English Metric Units per inch, the unit used inside PPTX parts.
pub const EMU_PER_INCH: f64 = 914_400.0;

/// A placement rectangle in inches.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

/// A placement rectangle in EMU.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EmuRect {
    pub x: i64,
    pub y: i64,
    pub cx: i64,
    pub cy: i64,
}

impl Rect {
    pub fn new(left: f64, top: f64, width: f64, height: f64) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }

    pub fn to_emu(&self) -> EmuRect {
        EmuRect {
            x: inches_to_emu(self.left),
            y: inches_to_emu(self.top),
            cx: inches_to_emu(self.width),
            cy: inches_to_emu(self.height),
        }
    }
}

pub fn inches_to_emu(inches: f64) -> i64 {
    (inches * EMU_PER_INCH).round() as i64
}

pub fn pixels_to_inches(pixels: u32) -> f64 {
    f64::from(pixels) / ASSUMED_DPI
}

/// Compute where a picture goes on its slide.
///
/// Both dimensions share one scale factor, so the aspect ratio of the source
/// image is always kept.
pub fn image_placement(
    width_px: u32,
    height_px: u32,
    left: f64,
    top: f64,
    scale_percent: f64,
) -> Rect {
    let scale = scale_percent / 100.0;
    Rect::new(
        left,
        top,
        pixels_to_inches(width_px) * scale,
        pixels_to_inches(height_px) * scale,
    )
}

/// The supported slide canvas sizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SlideSize {
    Standard,
    #[default]
    Widescreen,
}

impl SlideSize {
    /// Parse a `slide_size_option` value, ignoring case.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "standard" => Some(SlideSize::Standard),
            "widescreen" => Some(SlideSize::Widescreen),
            _ => None,
        }
    }

    /// Width and height in inches.
    pub fn dimensions(&self) -> (f64, f64) {
        match self {
            SlideSize::Standard => (10.0, 7.5),
            SlideSize::Widescreen => (13.3333, 7.5),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            SlideSize::Standard => "standard",
            SlideSize::Widescreen => "widescreen",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOLERANCE: f64 = 1e-6;

    #[test]
    fn test_image_placement_scales_from_96_dpi() {
        let rect = image_placement(960, 480, 0.5, 1.0, 50.0);
        assert!((rect.width - 5.0).abs() < TOLERANCE);
        assert!((rect.height - 2.5).abs() < TOLERANCE);
        assert_eq!(rect.left, 0.5);
        assert_eq!(rect.top, 1.0);
    }

    #[test]
    fn test_image_placement_keeps_aspect_ratio() {
        let rect = image_placement(1234, 567, 0.0, 0.0, 37.5);
        let source_ratio = 1234.0 / 567.0;
        assert!((rect.width / rect.height - source_ratio).abs() < TOLERANCE);
    }

    #[test]
    fn test_full_scale_is_pixels_over_dpi() {
        let rect = image_placement(192, 96, 0.0, 0.0, 100.0);
        assert!((rect.width - 2.0).abs() < TOLERANCE);
        assert!((rect.height - 1.0).abs() < TOLERANCE);
    }

    #[test]
    fn test_emu_conversion() {
        assert_eq!(inches_to_emu(1.0), 914_400);
        assert_eq!(inches_to_emu(10.0), 9_144_000);
        assert_eq!(inches_to_emu(7.5), 6_858_000);

        let emu = Rect::new(0.5, 0.25, 2.0, 1.0).to_emu();
        assert_eq!(
            emu,
            EmuRect {
                x: 457_200,
                y: 228_600,
                cx: 1_828_800,
                cy: 914_400
            }
        );
    }

    #[test]
    fn test_slide_size_parse_is_case_insensitive() {
        assert_eq!(SlideSize::parse("Standard"), Some(SlideSize::Standard));
        assert_eq!(SlideSize::parse("WIDESCREEN"), Some(SlideSize::Widescreen));
        assert_eq!(SlideSize::parse("square"), None);
    }

    #[test]
    fn test_slide_size_dimensions() {
        assert_eq!(SlideSize::Standard.dimensions(), (10.0, 7.5));
        assert_eq!(SlideSize::Widescreen.dimensions(), (13.3333, 7.5));
        assert_eq!(SlideSize::default(), SlideSize::Widescreen);
        assert_eq!(SlideSize::parse(SlideSize::Standard.name()), Some(SlideSize::Standard));
    }
}
