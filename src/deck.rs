// ABOUTME: Deck module for the ocr-deck application
// ABOUTME: Defines the document builder seam and assembles slides from processed images

use crate::config::PresentationConfig;
use crate::errors::Result;
use crate::layout::{Rect, SlideSize};
use crate::processor::SlideContent;
use log::{debug, info};
use std::path::Path;

/// Encoded image bytes ready to be embedded in a document.
#[derive(Debug, Clone, PartialEq)]
pub struct Picture {
    pub data: Vec<u8>,
    /// Lowercase file extension without the dot, e.g. "png"
    pub extension: String,
}

impl Picture {
    pub fn new(data: Vec<u8>, extension: &str) -> Self {
        Self {
            data,
            extension: extension.to_lowercase(),
        }
    }

    pub fn content_type(&self) -> &'static str {
        content_type_for(&self.extension).unwrap_or("application/octet-stream")
    }
}

/// MIME type for the image formats a slide deck can embed as-is.
pub fn content_type_for(extension: &str) -> Option<&'static str> {
    match extension.to_lowercase().as_str() {
        "png" => Some("image/png"),
        "jpg" | "jpeg" => Some("image/jpeg"),
        "gif" => Some("image/gif"),
        "bmp" => Some("image/bmp"),
        "tif" | "tiff" => Some("image/tiff"),
        _ => None,
    }
}

/// A slide document under construction.
pub trait DeckBuilder {
    /// Create an empty document with the given canvas.
    fn with_slide_size(size: SlideSize) -> Self
    where
        Self: Sized;

    fn slide_size(&self) -> SlideSize;

    /// Append a blank slide and return its index.
    fn add_slide(&mut self) -> usize;

    fn place_picture(&mut self, slide: usize, picture: &Picture, rect: Rect) -> Result<()>;

    /// Place a text box holding `text`, every run sized `font_size` points.
    fn place_text_box(&mut self, slide: usize, rect: Rect, text: &str, font_size: f64)
        -> Result<()>;

    fn slide_count(&self) -> usize;

    fn save(&self, path: &Path) -> Result<()>;
}

/// Builds one slide per processed image, in the order they arrive.
pub struct SlideAssembler<D> {
    deck: D,
}

impl<D: DeckBuilder> SlideAssembler<D> {
    pub fn new(presentation: &PresentationConfig) -> Self {
        let (width, height) = presentation.slide_size.dimensions();
        info!(
            "Using slide size: {} ({}in x {}in)",
            presentation.slide_size.name(),
            width,
            height
        );
        Self {
            deck: D::with_slide_size(presentation.slide_size),
        }
    }

    /// Append the slide for `content`.
    pub fn add(&mut self, content: &SlideContent) -> Result<usize> {
        let slide = self.deck.add_slide();
        self.deck
            .place_picture(slide, &content.picture, content.image_rect)?;
        self.deck.place_text_box(
            slide,
            content.text_box,
            &content.text,
            content.font_size,
        )?;
        debug!("Assembled slide {} from {:?}", slide + 1, content.source);
        Ok(slide)
    }

    pub fn deck(&self) -> &D {
        &self.deck
    }

    pub fn into_deck(self) -> D {
        self.deck
    }
}
