// ABOUTME: Library module for the ocr-deck program.
// ABOUTME: Contains the pipeline that turns a folder of images into an OCR slide deck.

// Reexport modules
pub mod config;
pub mod deck;
pub mod errors;
pub mod images;
pub mod layout;
pub mod logging;
pub mod ocr;
pub mod pipeline;
pub mod pptx;
pub mod processor;
pub mod templates;
pub mod utils;

// Reexport common types and functions
pub use config::Config;
pub use deck::{DeckBuilder, Picture, SlideAssembler};
pub use errors::{OcrDeckError, Result};
pub use images::find_images;
pub use layout::{Rect, SlideSize};
pub use ocr::{TesseractRecognizer, TextRecognizer};
pub use pipeline::{build_deck, generate_presentation, run, RunReport};
pub use pptx::{read_slide_texts, PptxDeck};
pub use processor::{process_image, SlideContent};
