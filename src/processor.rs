// ABOUTME: Image processing module for the ocr-deck application
// ABOUTME: Decodes one image, runs OCR on it and computes where it goes on its slide

use crate::config::PresentationConfig;
use crate::deck::{content_type_for, Picture};
use crate::errors::{OcrDeckError, Result};
use crate::layout::{image_placement, Rect};
use crate::ocr::TextRecognizer;
use image::io::Reader as ImageReader;
use image::{DynamicImage, ImageOutputFormat};
use log::debug;
use std::fs;
use std::io::Cursor;
use std::path::{Path, PathBuf};

/// Everything needed to build the slide for one image.
#[derive(Debug, Clone, PartialEq)]
pub struct SlideContent {
    pub source: PathBuf,
    pub text: String,
    pub picture: Picture,
    pub image_rect: Rect,
    pub text_box: Rect,
    pub font_size: f64,
}

/// Decode `path`, recognize its text and lay it out.
///
/// Any failure is an [`OcrDeckError::ImageError`] that only concerns this image.
pub fn process_image<R>(
    path: &Path,
    recognizer: &R,
    presentation: &PresentationConfig,
) -> Result<SlideContent>
where
    R: TextRecognizer + ?Sized,
{
    // Multi-frame formats decode to their first frame
    let image = decode_image(path)?;

    let text = recognizer.recognize_text(&image);
    let (width_px, height_px) = (image.width(), image.height());
    let image_rect = image_placement(
        width_px,
        height_px,
        presentation.image_left,
        presentation.image_top,
        presentation.image_scale_percent,
    );
    debug!(
        "{:?}: {}x{} px placed at {:.3}in x {:.3}in",
        path, width_px, height_px, image_rect.width, image_rect.height
    );

    let picture = embeddable_picture(path, &image)?;

    Ok(SlideContent {
        source: path.to_path_buf(),
        text,
        picture,
        image_rect,
        text_box: presentation.text_box,
        font_size: presentation.text_font_size,
    })
}

fn image_error(path: &Path, message: impl ToString) -> OcrDeckError {
    OcrDeckError::ImageError {
        path: path.to_path_buf(),
        message: message.to_string(),
    }
}

fn decode_image(path: &Path) -> Result<DynamicImage> {
    ImageReader::open(path)
        .map_err(|e| image_error(path, e))?
        .with_guessed_format()
        .map_err(|e| image_error(path, e))?
        .decode()
        .map_err(|e| image_error(path, e))
}

/// Original file bytes when the deck can show the format, a PNG of the frame otherwise.
fn embeddable_picture(path: &Path, image: &DynamicImage) -> Result<Picture> {
    let extension = path
        .extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .unwrap_or_default();

    if content_type_for(&extension).is_some() {
        let data = fs::read(path)
            .map_err(|e| image_error(path, format!("could not add image to slide: {}", e)))?;
        return Ok(Picture::new(data, &extension));
    }

    let mut data = Vec::new();
    image
        .write_to(&mut Cursor::new(&mut data), ImageOutputFormat::Png)
        .map_err(|e| image_error(path, format!("could not re-encode image: {}", e)))?;
    Ok(Picture::new(data, "png"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::SlideSize;
    use image::{ImageBuffer, Rgb};
    use tempfile::TempDir;

    fn presentation() -> PresentationConfig {
        PresentationConfig {
            text_box: Rect::new(7.0, 0.5, 5.0, 6.0),
            image_left: 0.25,
            image_top: 0.75,
            image_scale_percent: 50.0,
            text_font_size: 18.0,
            slide_size: SlideSize::Widescreen,
        }
    }

    fn write_image(dir: &Path, name: &str, width: u32, height: u32) -> PathBuf {
        let path = dir.join(name);
        ImageBuffer::from_pixel(width, height, Rgb([10u8, 20, 30]))
            .save(&path)
            .expect("Failed to save image");
        path
    }

    #[test]
    fn test_process_image() {
        let dir = TempDir::new().unwrap();
        let path = write_image(dir.path(), "page.png", 960, 480);
        let recognizer = |_: &DynamicImage| "Hello".to_string();

        let content = process_image(&path, &recognizer, &presentation()).unwrap();
        assert_eq!(content.source, path);
        assert_eq!(content.text, "Hello");
        assert!((content.image_rect.width - 5.0).abs() < 1e-6);
        assert!((content.image_rect.height - 2.5).abs() < 1e-6);
        assert_eq!(content.image_rect.left, 0.25);
        assert_eq!(content.image_rect.top, 0.75);
        assert_eq!(content.text_box, Rect::new(7.0, 0.5, 5.0, 6.0));
        assert_eq!(content.font_size, 18.0);
        assert_eq!(content.picture.extension, "png");
        assert_eq!(content.picture.data, fs::read(&path).unwrap());
    }

    #[test]
    fn test_recognizer_sees_decoded_pixels() {
        let dir = TempDir::new().unwrap();
        let path = write_image(dir.path(), "page.png", 30, 20);
        let recognizer = |image: &DynamicImage| format!("{}x{}", image.width(), image.height());

        let content = process_image(&path, &recognizer, &presentation()).unwrap();
        assert_eq!(content.text, "30x20");
    }

    #[test]
    fn test_format_is_detected_from_content() {
        let dir = TempDir::new().unwrap();
        let png = write_image(dir.path(), "page.png", 8, 8);
        let odd_name = dir.path().join("page.scan");
        fs::copy(&png, &odd_name).unwrap();

        let content =
            process_image(&odd_name, &|_: &DynamicImage| String::new(), &presentation()).unwrap();
        // Unknown extensions are embedded as a fresh PNG
        assert_eq!(content.picture.extension, "png");
        assert!(!content.picture.data.is_empty());
    }

    #[test]
    fn test_animated_gif_uses_first_frame() {
        use image::codecs::gif::GifEncoder;
        use image::{Frame, Rgba, RgbaImage};

        let dir = TempDir::new().unwrap();
        let path = dir.path().join("anim.gif");
        {
            let file = fs::File::create(&path).unwrap();
            let mut encoder = GifEncoder::new(file);
            encoder
                .encode_frames(vec![
                    Frame::new(RgbaImage::from_pixel(16, 8, Rgba([255, 0, 0, 255]))),
                    Frame::new(RgbaImage::from_pixel(16, 8, Rgba([0, 0, 255, 255]))),
                ])
                .unwrap();
        }

        let recognizer = |image: &DynamicImage| {
            let pixel = image.to_rgb8().get_pixel(0, 0).0;
            format!("{:?}", pixel)
        };
        let content = process_image(&path, &recognizer, &presentation()).unwrap();
        assert_eq!(content.text, "[255, 0, 0]");
        assert!((content.image_rect.width - 16.0 / 96.0 * 0.5).abs() < 1e-9);
        // GIF is embedded as the original file
        assert_eq!(content.picture.extension, "gif");
        assert_eq!(content.picture.data, fs::read(&path).unwrap());
    }

    #[test]
    fn test_corrupt_image_is_recoverable() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("broken.png");
        fs::write(&path, b"definitely not a png").unwrap();

        let err = process_image(&path, &|_: &DynamicImage| String::new(), &presentation())
            .unwrap_err();
        assert!(err.is_recoverable());
        assert!(err.to_string().contains("broken.png"));
    }

    #[test]
    fn test_missing_image_is_recoverable() {
        let dir = TempDir::new().unwrap();
        let err = process_image(
            &dir.path().join("gone.png"),
            &|_: &DynamicImage| String::new(),
            &presentation(),
        )
        .unwrap_err();
        assert!(err.is_recoverable());
    }
}
