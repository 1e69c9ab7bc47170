// ABOUTME: Utility functions for the ocr-deck application
// ABOUTME: Directory helpers and the final write of the assembled deck

use crate::config::PathsConfig;
use crate::deck::DeckBuilder;
use crate::errors::{OcrDeckError, Result};
use log::info;
use std::path::{Path, PathBuf};

/// Ensure a directory exists, creating it if necessary
pub fn ensure_directory_exists(path: &Path) -> Result<()> {
    if !path.exists() {
        std::fs::create_dir_all(path).map_err(OcrDeckError::FileReadError)?;
    } else if !path.is_dir() {
        return Err(OcrDeckError::PptxError(format!(
            "Path exists but is not a directory: {:?}",
            path
        )));
    }
    Ok(())
}

/// Save `deck` to `<output_folder>/<output_filename>` and return that path.
pub fn write_presentation<D: DeckBuilder>(deck: &D, paths: &PathsConfig) -> Result<PathBuf> {
    ensure_directory_exists(&paths.output_folder)?;

    let output_path = paths.output_folder.join(&paths.output_filename);
    deck.save(&output_path).map_err(|e| {
        OcrDeckError::PptxError(format!(
            "Failed to save PowerPoint to {:?}: {}",
            output_path, e
        ))
    })?;

    info!("PowerPoint presentation saved to: {:?}", output_path);
    Ok(output_path)
}
