use image::{DynamicImage, ImageBuffer, Rgb};
use ocr_deck::{generate_presentation, read_slide_texts, Config};
use std::fs;
use std::io::Read;
use std::path::Path;
use tempfile::TempDir;
use zip::ZipArchive;

fn write_config(dir: &Path, images: &Path, output: &Path, slide_size: &str) -> std::path::PathBuf {
    let config_path = dir.join("config.yaml");
    let yaml = format!(
        r#"paths:
  images_folder: "{}"
  output_folder: "{}"
  output_filename: "scans.pptx"
presentation:
  textbox_left_inches: "6.0"
  textbox_top_inches: 0.5
  textbox_width_inches: 3.5
  textbox_height_inches: 6.5
  image_left_inches: 0.25
  image_top_inches: 0.5
  image_scale_percent: 100
  text_font_size: 16
  slide_size_option: {}
extensions:
  - .png
  - .JPG
"#,
        images.display(),
        output.display(),
        slide_size
    );
    fs::write(&config_path, yaml).expect("Failed to write config");
    config_path
}

fn read_part(path: &Path, name: &str) -> String {
    let file = fs::File::open(path).expect("Failed to open PPTX file");
    let mut archive = ZipArchive::new(file).expect("Failed to read PPTX as ZIP");
    let mut contents = String::new();
    archive
        .by_name(name)
        .expect("Missing part")
        .read_to_string(&mut contents)
        .expect("Part is not UTF-8");
    contents
}

#[test]
fn test_generate_pptx_from_folder() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let images = temp_dir.path().join("images");
    fs::create_dir(&images).expect("Failed to create images directory");

    // A red PNG, a blue JPEG, a corrupt PNG and a file that is ignored
    ImageBuffer::from_fn(192, 96, |_, _| Rgb([255u8, 0u8, 0u8]))
        .save(images.join("page_01.png"))
        .expect("Failed to save red image");
    ImageBuffer::from_fn(96, 96, |_, _| Rgb([0u8, 0u8, 255u8]))
        .save_with_format(images.join("page_02.JPG"), image::ImageFormat::Jpeg)
        .expect("Failed to save blue image");
    fs::write(images.join("page_03.png"), b"not really a png").unwrap();
    fs::write(images.join("page_04.txt"), b"ignored").unwrap();

    let output = temp_dir.path().join("out");
    let config_path = write_config(temp_dir.path(), &images, &output, "STANDARD");
    let config = Config::load(&config_path).expect("Config should be valid");

    let recognizer = |image: &DynamicImage| {
        let Rgb([r, _, b]) = image.to_rgb8().get_pixel(0, 0).to_owned();
        if r > b {
            "Red page\nsecond line".to_string()
        } else {
            "Blue page".to_string()
        }
    };
    let report = generate_presentation(&config, &recognizer).expect("Generation failed");

    assert_eq!(report.slides.len(), 2);
    assert_eq!(report.skipped.len(), 1);
    assert!(report.skipped[0].path.ends_with("page_03.png"));

    let output_path = output.join("scans.pptx");
    assert_eq!(report.output_path.as_deref(), Some(output_path.as_path()));
    assert!(output_path.exists(), "PPTX file was not created");

    assert_eq!(
        read_slide_texts(&output_path).unwrap(),
        vec!["Red page\nsecond line", "Blue page"]
    );

    // Standard 4:3 canvas
    let presentation = read_part(&output_path, "ppt/presentation.xml");
    assert!(presentation.contains(r#"cx="9144000" cy="6858000""#));

    // 192x96 px at 100% is 2in x 1in
    let slide = read_part(&output_path, "ppt/slides/slide1.xml");
    assert!(slide.contains(r#"<a:off x="228600" y="457200"/>"#));
    assert!(slide.contains(r#"<a:ext cx="1828800" cy="914400"/>"#));
    assert!(slide.contains(r#"sz="1600""#));

    let content_types = read_part(&output_path, "[Content_Types].xml");
    assert!(content_types.contains(r#"Extension="jpg" ContentType="image/jpeg""#));
    assert!(content_types.contains(r#"Extension="png" ContentType="image/png""#));

    let file = fs::File::open(&output_path).unwrap();
    let archive = ZipArchive::new(file).unwrap();
    let slide_files: Vec<String> = archive
        .file_names()
        .filter(|name| name.starts_with("ppt/slides/slide") && name.ends_with(".xml"))
        .map(String::from)
        .collect();
    assert_eq!(slide_files.len(), 2, "Expected exactly two slide XML files");
    assert!(archive.file_names().any(|n| n == "ppt/media/image2.jpg"));
}
