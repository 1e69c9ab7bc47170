// ABOUTME: OCR module for the ocr-deck application
// ABOUTME: Defines the text recognition seam and its Tesseract implementation

use crate::errors::{OcrDeckError, Result};
use image::{DynamicImage, ImageFormat};
use log::{debug, error, info};
use rusty_tesseract::{Args, Image};

/// Language passed to Tesseract when none is configured.
pub const DEFAULT_LANGUAGE: &str = "eng";

/// Turns decoded image pixels into text.
///
/// Implementations never fail: an engine error is reported by the
/// implementation itself and yields an empty string.
pub trait TextRecognizer {
    fn recognize_text(&self, image: &DynamicImage) -> String;
}

impl<F> TextRecognizer for F
where
    F: Fn(&DynamicImage) -> String,
{
    fn recognize_text(&self, image: &DynamicImage) -> String {
        self(image)
    }
}

/// Recognizer backed by the `tesseract` executable.
pub struct TesseractRecognizer {
    args: Args,
}

impl TesseractRecognizer {
    /// Create a recognizer for `language`, failing if Tesseract is not installed.
    pub fn new(language: &str) -> Result<Self> {
        let version = rusty_tesseract::get_tesseract_version().map_err(|e| {
            OcrDeckError::OcrError(format!("Tesseract is not available: {}", e))
        })?;
        info!(
            "Using {} with language '{}'",
            version.lines().next().unwrap_or("tesseract"),
            language
        );

        Ok(Self {
            args: Args {
                lang: language.to_string(),
                ..Args::default()
            },
        })
    }

    fn try_recognize(&self, image: &DynamicImage) -> Result<String> {
        // Hand Tesseract the already decoded frame, not the source file
        let frame = tempfile::Builder::new()
            .prefix("ocr-deck-")
            .suffix(".png")
            .tempfile()?;
        image
            .save_with_format(frame.path(), ImageFormat::Png)
            .map_err(|e| OcrDeckError::OcrError(format!("Failed to stage image: {}", e)))?;

        let ocr_image = Image::from_path(frame.path().to_string_lossy().to_string())
            .map_err(|e| OcrDeckError::OcrError(e.to_string()))?;
        rusty_tesseract::image_to_string(&ocr_image, &self.args)
            .map_err(|e| OcrDeckError::OcrError(e.to_string()))
    }
}

impl TextRecognizer for TesseractRecognizer {
    fn recognize_text(&self, image: &DynamicImage) -> String {
        match self.try_recognize(image) {
            Ok(text) => {
                debug!("Recognized {} characters", text.chars().count());
                text
            }
            Err(e) => {
                error!("{}", e);
                String::new()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageBuffer, Rgb};

    #[test]
    fn test_closures_are_recognizers() {
        let recognizer = |image: &DynamicImage| format!("{}x{}", image.width(), image.height());
        let image = DynamicImage::ImageRgb8(ImageBuffer::from_pixel(4, 2, Rgb([0u8, 0, 0])));
        assert_eq!(recognizer.recognize_text(&image), "4x2");
    }

    #[test]
    #[ignore] // Ignore by default as it requires tesseract to be installed
    fn test_tesseract_on_blank_image() {
        let recognizer = TesseractRecognizer::new(DEFAULT_LANGUAGE).expect("tesseract missing");
        let image =
            DynamicImage::ImageRgb8(ImageBuffer::from_pixel(200, 100, Rgb([255u8, 255, 255])));
        assert!(recognizer.recognize_text(&image).trim().is_empty());
    }
}
