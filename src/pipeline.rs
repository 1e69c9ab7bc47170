// ABOUTME: Pipeline module for the ocr-deck application
// ABOUTME: Runs discovery, per-image processing, slide assembly and output in order

use crate::config::Config;
use crate::deck::{DeckBuilder, SlideAssembler};
use crate::errors::Result;
use crate::images::find_images;
use crate::layout::Rect;
use crate::ocr::TextRecognizer;
use crate::pptx::PptxDeck;
use crate::processor::process_image;
use crate::utils::write_presentation;
use log::{error, info};
use std::path::{Path, PathBuf};

/// An image that made it onto a slide
#[derive(Debug, Clone, PartialEq)]
pub struct ProcessedSlide {
    pub source: PathBuf,
    pub text: String,
    pub image_rect: Rect,
}

/// An image that was skipped, and why
#[derive(Debug, Clone, PartialEq)]
pub struct SkippedImage {
    pub path: PathBuf,
    pub reason: String,
}

/// Outcome of one run, in processing order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunReport {
    pub slides: Vec<ProcessedSlide>,
    pub skipped: Vec<SkippedImage>,
    pub output_path: Option<PathBuf>,
}

impl RunReport {
    pub fn summary(&self) -> String {
        format!(
            "{} slides created, {} images skipped",
            self.slides.len(),
            self.skipped.len()
        )
    }
}

/// A finished in-memory deck together with what went into it
pub struct BuiltDeck<D> {
    pub deck: D,
    pub report: RunReport,
}

/// Process every matching image of the configured folder into a new deck.
///
/// Unreadable images are logged and skipped. Nothing is written to disk.
pub fn build_deck<D, R>(config: &Config, recognizer: &R) -> Result<BuiltDeck<D>>
where
    D: DeckBuilder,
    R: TextRecognizer + ?Sized,
{
    let paths = &config.paths;
    info!("Images folder: {:?}", paths.images_folder);
    info!("Output folder: {:?}", paths.output_folder);
    info!("Output filename: {}", paths.output_filename);
    info!("Allowed extensions: {:?}", config.extensions);

    let mut assembler = SlideAssembler::<D>::new(&config.presentation);
    let image_files = find_images(&paths.images_folder, &config.extensions)?;

    let mut report = RunReport::default();
    for image_file in image_files {
        let image_path = paths.images_folder.join(&image_file);
        info!("Processing image: {:?}", image_path);

        let content = match process_image(&image_path, recognizer, &config.presentation) {
            Ok(content) => content,
            Err(e) if e.is_recoverable() => {
                error!("{}", e);
                report.skipped.push(SkippedImage {
                    path: image_path,
                    reason: e.to_string(),
                });
                continue;
            }
            Err(e) => return Err(e),
        };

        assembler.add(&content)?;
        report.slides.push(ProcessedSlide {
            source: content.source,
            text: content.text,
            image_rect: content.image_rect,
        });
    }

    Ok(BuiltDeck {
        deck: assembler.into_deck(),
        report,
    })
}

/// Build the deck with backend `D` and write it to the configured output path.
pub fn generate_with<D, R>(config: &Config, recognizer: &R) -> Result<RunReport>
where
    D: DeckBuilder,
    R: TextRecognizer + ?Sized,
{
    let BuiltDeck { deck, mut report } = build_deck::<D, R>(config, recognizer)?;
    report.output_path = Some(write_presentation(&deck, &config.paths)?);
    Ok(report)
}

/// Build a `.pptx` deck from a validated configuration.
pub fn generate_presentation<R>(config: &Config, recognizer: &R) -> Result<RunReport>
where
    R: TextRecognizer + ?Sized,
{
    generate_with::<PptxDeck, R>(config, recognizer)
}

/// Load the configuration at `config_path`, then generate the deck.
///
/// No image is touched unless the configuration is valid.
pub fn run<R>(config_path: &Path, recognizer: &R) -> Result<RunReport>
where
    R: TextRecognizer + ?Sized,
{
    let config = Config::load(config_path)?;
    generate_presentation(&config, recognizer)
}
