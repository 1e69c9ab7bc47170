// ABOUTME: Image discovery module for the ocr-deck application
// ABOUTME: Lists the images folder and keeps the files with an allowed extension

use crate::errors::{OcrDeckError, Result};
use log::{debug, info, warn};
use std::fs;
use std::path::Path;

/// Find the image files in `folder` whose name ends with one of `extensions`.
///
/// Matching ignores case. Names come back in lexicographic order, which is
/// also the order of the slides. Subdirectories are never returned.
pub fn find_images(folder: &Path, extensions: &[String]) -> Result<Vec<String>> {
    let read_error = |source: std::io::Error| OcrDeckError::DirectoryReadError {
        path: folder.to_path_buf(),
        source,
    };

    let mut names = Vec::new();
    for entry in fs::read_dir(folder).map_err(read_error)? {
        let entry = entry.map_err(read_error)?;

        if entry.file_type().map(|t| t.is_dir()).unwrap_or(false) {
            continue;
        }

        match entry.file_name().into_string() {
            Ok(name) => names.push(name),
            Err(raw) => debug!("Skipping non UTF-8 file name {:?}", raw),
        }
    }

    let images = filter_image_names(names, extensions);
    if images.is_empty() {
        warn!("No valid image files found in the specified folder.");
    } else {
        info!("Found {} image files in {:?}", images.len(), folder);
    }
    Ok(images)
}

/// Sort `names` and keep the ones ending with an allowed extension.
pub fn filter_image_names<I>(names: I, extensions: &[String]) -> Vec<String>
where
    I: IntoIterator<Item = String>,
{
    let extensions: Vec<String> = extensions.iter().map(|e| e.to_lowercase()).collect();

    let mut names: Vec<String> = names.into_iter().collect();
    names.sort();
    names
        .into_iter()
        .filter(|name| {
            let lower = name.to_lowercase();
            extensions.iter().any(|ext| lower.ends_with(ext.as_str()))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn exts(list: &[&str]) -> Vec<String> {
        list.iter().map(|e| e.to_string()).collect()
    }

    #[test]
    fn test_case_insensitive_sorted_filter() {
        let names = vec!["b.PNG", "a.png", "c.txt"]
            .into_iter()
            .map(String::from);
        assert_eq!(
            filter_image_names(names, &exts(&[".png"])),
            vec!["a.png", "b.PNG"]
        );
    }

    #[test]
    fn test_configured_extensions_are_lowercased() {
        let names = vec!["scan.JPG", "scan.jpeg", "scan.png"]
            .into_iter()
            .map(String::from);
        assert_eq!(
            filter_image_names(names, &exts(&[".Jpg", ".JPEG"])),
            vec!["scan.JPG", "scan.jpeg"]
        );
    }

    #[test]
    fn test_find_images_in_folder() {
        let dir = TempDir::new().unwrap();
        for name in ["b.PNG", "a.png", "c.txt"] {
            fs::write(dir.path().join(name), b"x").unwrap();
        }
        fs::create_dir(dir.path().join("nested.png")).unwrap();

        let images = find_images(dir.path(), &exts(&[".png"])).unwrap();
        assert_eq!(images, vec!["a.png", "b.PNG"]);
    }

    #[test]
    fn test_empty_folder_is_not_an_error() {
        let dir = TempDir::new().unwrap();
        let images = find_images(dir.path(), &exts(&[".png"])).unwrap();
        assert!(images.is_empty());
    }

    #[test]
    fn test_unreadable_folder_is_fatal() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("missing");
        let result = find_images(&missing, &exts(&[".png"]));
        assert!(matches!(result, Err(OcrDeckError::DirectoryReadError { .. })));
    }
}
