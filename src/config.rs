// ABOUTME: Configuration module for the ocr-deck application
// ABOUTME: Loads the YAML configuration file and validates it into typed settings

use crate::errors::{OcrDeckError, Result};
use crate::layout::{Rect, SlideSize};
use log::{info, warn};
use serde::Deserialize;
use serde_yaml::Value;
use std::fs;
use std::path::{Path, PathBuf};

/// Configuration file read when no path is given on the command line.
pub const DEFAULT_CONFIG_PATH: &str = "config.yaml";

/// Suffix every output filename must carry.
pub const OUTPUT_SUFFIX: &str = ".pptx";

/// Extensions used when the configuration has no `extensions` list.
pub const DEFAULT_EXTENSIONS: &[&str] = &[".png"];

const MIN_FONT_SIZE: f64 = 1.0;
const MAX_FONT_SIZE: f64 = 4000.0;

const REQUIRED_PATHS_KEYS: [&str; 3] = ["images_folder", "output_folder", "output_filename"];

const REQUIRED_PRESENTATION_KEYS: [&str; 8] = [
    "textbox_left_inches",
    "textbox_top_inches",
    "textbox_width_inches",
    "textbox_height_inches",
    "image_left_inches",
    "image_top_inches",
    "image_scale_percent",
    "text_font_size",
];

/// Input and output locations
#[derive(Debug, Clone, PartialEq)]
pub struct PathsConfig {
    pub images_folder: PathBuf,
    pub output_folder: PathBuf,
    pub output_filename: String,
}

/// Geometry and typography shared by every slide
#[derive(Debug, Clone, PartialEq)]
pub struct PresentationConfig {
    pub text_box: Rect,
    pub image_left: f64,
    pub image_top: f64,
    pub image_scale_percent: f64,
    pub text_font_size: f64,
    pub slide_size: SlideSize,
}

/// Fully validated configuration. Never built partially.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub paths: PathsConfig,
    pub presentation: PresentationConfig,
    /// Allowed image suffixes, lowercased, each starting with '.'
    pub extensions: Vec<String>,
    /// Non-fatal problems found while validating
    pub warnings: Vec<String>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Numeric {
    Number(f64),
    Text(String),
}

impl Config {
    /// Load and validate the configuration file at `path`.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.is_file() {
            return Err(OcrDeckError::ConfigNotFound(path.to_path_buf()));
        }

        let contents = fs::read_to_string(path)?;
        let config = Self::from_yaml_str(&contents)?;
        info!("Loaded configuration from {:?}", path);
        Ok(config)
    }

    /// Parse and validate YAML text.
    pub fn from_yaml_str(contents: &str) -> Result<Self> {
        let value: Value = serde_yaml::from_str(contents)
            .map_err(|e| OcrDeckError::ConfigParseError(e.to_string()))?;

        match value {
            Value::Null => Err(OcrDeckError::ConfigParseError(
                "Empty or invalid YAML structure.".to_string(),
            )),
            Value::Mapping(_) => Self::from_value(&value),
            _ => Err(OcrDeckError::ConfigParseError(
                "Top level of the config must be a mapping.".to_string(),
            )),
        }
    }

    /// Validate an already parsed YAML document. The first failing check wins.
    pub fn from_value(value: &Value) -> Result<Self> {
        let paths = value
            .get("paths")
            .ok_or(OcrDeckError::MissingSection("paths"))?;
        let presentation = value
            .get("presentation")
            .ok_or(OcrDeckError::MissingSection("presentation"))?;

        let paths = validate_paths(paths)?;

        let mut warnings = Vec::new();
        let presentation = validate_presentation(presentation, &mut warnings)?;
        let extensions = validate_extensions(value.get("extensions"))?;

        for warning in &warnings {
            warn!("{}", warning);
        }

        Ok(Self {
            paths,
            presentation,
            extensions,
            warnings,
        })
    }

    /// Where the finished deck is written.
    pub fn output_path(&self) -> PathBuf {
        self.paths.output_folder.join(&self.paths.output_filename)
    }
}

fn validate_paths(paths: &Value) -> Result<PathsConfig> {
    for key in REQUIRED_PATHS_KEYS {
        if paths.get(key).is_none() {
            return Err(OcrDeckError::MissingKey {
                section: "paths",
                key,
            });
        }
    }

    let images_folder = PathBuf::from(path_value(paths, "images_folder")?);
    if !images_folder.is_dir() {
        return Err(OcrDeckError::ImagesFolderNotFound(images_folder));
    }

    let output_filename = match &paths["output_filename"] {
        Value::String(name) if name.ends_with(OUTPUT_SUFFIX) => name.clone(),
        other => return Err(OcrDeckError::InvalidOutputFilename(describe(other))),
    };

    let output_folder = PathBuf::from(path_value(paths, "output_folder")?);

    Ok(PathsConfig {
        images_folder,
        output_folder,
        output_filename,
    })
}

fn path_value<'a>(paths: &'a Value, key: &'static str) -> Result<&'a str> {
    paths[key]
        .as_str()
        .ok_or(OcrDeckError::InvalidPathValue {
            section: "paths",
            key,
        })
}

fn validate_presentation(
    presentation: &Value,
    warnings: &mut Vec<String>,
) -> Result<PresentationConfig> {
    let mut numbers = [0.0; REQUIRED_PRESENTATION_KEYS.len()];
    for (slot, key) in numbers.iter_mut().zip(REQUIRED_PRESENTATION_KEYS) {
        let value = presentation.get(key).ok_or(OcrDeckError::MissingKey {
            section: "presentation",
            key,
        })?;
        *slot = numeric(value).ok_or(OcrDeckError::NotNumeric(key))?;
    }
    let [tb_left, tb_top, tb_width, tb_height, image_left, image_top, scale, font_size] = numbers;

    check_ranges(tb_width, tb_height, scale, font_size)?;

    let slide_size = resolve_slide_size(presentation.get("slide_size_option"), warnings);

    Ok(PresentationConfig {
        text_box: Rect::new(tb_left, tb_top, tb_width, tb_height),
        image_left,
        image_top,
        image_scale_percent: scale,
        text_font_size: font_size,
        slide_size,
    })
}

/// Accepts finite integers, decimals and numeric strings. Booleans are rejected.
fn numeric(value: &Value) -> Option<f64> {
    let number = match serde_yaml::from_value::<Numeric>(value.clone()).ok()? {
        Numeric::Number(n) => n,
        Numeric::Text(text) => text.trim().parse::<f64>().ok()?,
    };
    number.is_finite().then_some(number)
}

/// Sizes must not be negative and the font size must fit a slide run (1-4000 pt).
fn check_ranges(tb_width: f64, tb_height: f64, scale: f64, font_size: f64) -> Result<()> {
    let out_of_range = |key, message: &str| {
        Err(OcrDeckError::OutOfRange {
            key,
            message: message.to_string(),
        })
    };

    for (key, value) in [
        ("textbox_width_inches", tb_width),
        ("textbox_height_inches", tb_height),
        ("image_scale_percent", scale),
    ] {
        if value < 0.0 {
            return out_of_range(key, "must not be negative");
        }
    }
    if !(MIN_FONT_SIZE..=MAX_FONT_SIZE).contains(&font_size) {
        return out_of_range("text_font_size", "must be between 1 and 4000 points");
    }
    Ok(())
}

/// Resolve `slide_size_option`, falling back to widescreen with a warning.
pub fn resolve_slide_size(option: Option<&Value>, warnings: &mut Vec<String>) -> SlideSize {
    match option {
        Some(Value::String(name)) => match SlideSize::parse(name) {
            Some(size) => size,
            None => {
                warnings.push(format!(
                    "Invalid slide_size_option '{}'. Defaulting to 'widescreen'.",
                    name.to_lowercase()
                ));
                SlideSize::Widescreen
            }
        },
        Some(other) => {
            warnings.push(format!(
                "Invalid slide_size_option '{}'. Defaulting to 'widescreen'.",
                describe(other)
            ));
            SlideSize::Widescreen
        }
        None => {
            warnings.push(
                "No slide_size_option given. Defaulting to 'widescreen'.".to_string(),
            );
            SlideSize::Widescreen
        }
    }
}

fn validate_extensions(extensions: Option<&Value>) -> Result<Vec<String>> {
    let Some(extensions) = extensions else {
        return Ok(DEFAULT_EXTENSIONS.iter().map(|e| e.to_string()).collect());
    };

    let items = extensions
        .as_sequence()
        .ok_or(OcrDeckError::InvalidExtensions)?;

    items
        .iter()
        .map(|item| match item {
            Value::String(ext) if ext.starts_with('.') => Ok(ext.to_lowercase()),
            other => Err(OcrDeckError::InvalidExtension(describe(other))),
        })
        .collect()
}

/// Render a YAML value for an error message.
fn describe(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(s) => s.clone(),
        other => serde_yaml::to_string(other)
            .map(|s| s.trim().to_string())
            .unwrap_or_else(|_| format!("{:?}", other)),
    }
}
