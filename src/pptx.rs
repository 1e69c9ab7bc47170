// ABOUTME: PPTX generation module for the ocr-deck application
// ABOUTME: Keeps slides in memory and writes them out as a PowerPoint package

use crate::deck::{DeckBuilder, Picture};
use crate::errors::{OcrDeckError, Result};
use crate::layout::{inches_to_emu, EmuRect, Rect, SlideSize};
use crate::templates;
use log::{debug, info};
use quick_xml::escape::escape;
use quick_xml::events::Event;
use quick_xml::Reader;
use std::collections::BTreeSet;
use std::fs;
use std::io::{Read, Write};
use std::path::Path;
use zip::{write::FileOptions, ZipArchive, ZipWriter};

enum Shape {
    Picture { media: usize, rect: Rect },
    TextBox { rect: Rect, text: String, font_size: f64 },
}

#[derive(Default)]
struct Slide {
    shapes: Vec<Shape>,
}

/// A slide deck written as an Office Open XML presentation.
pub struct PptxDeck {
    size: SlideSize,
    slides: Vec<Slide>,
    media: Vec<Picture>,
}

impl PptxDeck {
    pub fn new(size: SlideSize) -> Self {
        Self {
            size,
            slides: Vec::new(),
            media: Vec::new(),
        }
    }

    fn slide_mut(&mut self, slide: usize) -> Result<&mut Slide> {
        let count = self.slides.len();
        self.slides.get_mut(slide).ok_or_else(|| {
            OcrDeckError::PptxError(format!("Slide {} does not exist ({} slides)", slide, count))
        })
    }

    fn media_name(&self, media: usize) -> String {
        format!("image{}.{}", media + 1, self.media[media].extension)
    }

    fn slide_size_emu(&self) -> (i64, i64) {
        let (width, height) = self.size.dimensions();
        (inches_to_emu(width), inches_to_emu(height))
    }

    fn content_types_xml(&self) -> String {
        let mut xml = String::from(templates::CONTENT_TYPES_HEAD);

        let media_types: BTreeSet<(&str, &str)> = self
            .media
            .iter()
            .map(|p| (p.extension.as_str(), p.content_type()))
            .collect();
        for (extension, content_type) in media_types {
            xml.push_str(&format!(
                "    <Default Extension=\"{}\" ContentType=\"{}\"/>\n",
                extension, content_type
            ));
        }

        for i in 0..self.slides.len() {
            xml.push_str(&format!(
                "    <Override PartName=\"/ppt/slides/slide{}.xml\" ContentType=\"{}\"/>\n",
                i + 1,
                templates::SLIDE_CONTENT_TYPE
            ));
        }

        xml.push_str("</Types>");
        xml
    }

    fn app_xml(&self) -> String {
        format!(
            r#"{}
<Properties xmlns="http://schemas.openxmlformats.org/officeDocument/2006/extended-properties" xmlns:vt="http://schemas.openxmlformats.org/officeDocument/2006/docPropsVTypes">
    <Application>ocr-deck</Application>
    <Slides>{}</Slides>
</Properties>"#,
            templates::XML_HEADER,
            self.slides.len()
        )
    }

    fn core_xml(&self, title: &str) -> String {
        format!(
            r#"{}
<cp:coreProperties xmlns:cp="http://schemas.openxmlformats.org/package/2006/metadata/core-properties" xmlns:dc="http://purl.org/dc/elements/1.1/" xmlns:dcterms="http://purl.org/dc/terms/" xmlns:dcmitype="http://purl.org/dc/dcmitype/" xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance">
    <dc:title>{}</dc:title>
    <dc:creator>ocr-deck</dc:creator>
    <dcterms:created xsi:type="dcterms:W3CDTF">{}</dcterms:created>
    <cp:revision>1</cp:revision>
</cp:coreProperties>"#,
            templates::XML_HEADER,
            escape(title),
            chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ")
        )
    }

    fn presentation_rels_xml(&self) -> String {
        let mut rels = String::from(templates::PRESENTATION_RELS_HEAD);
        for i in 0..self.slides.len() {
            rels.push_str(&format!(
                "    <Relationship Id=\"rId{}\" Type=\"{}\" Target=\"slides/slide{}.xml\"/>\n",
                templates::FIRST_SLIDE_REL + i,
                templates::SLIDE_REL_TYPE,
                i + 1
            ));
        }
        rels.push_str("</Relationships>");
        rels
    }

    fn presentation_xml(&self) -> String {
        let (cx, cy) = self.slide_size_emu();
        let size_type = match self.size {
            SlideSize::Standard => r#" type="screen4x3""#,
            SlideSize::Widescreen => "",
        };

        let slide_ids = if self.slides.is_empty() {
            String::new()
        } else {
            let ids = (0..self.slides.len())
                .map(|i| {
                    format!(
                        r#"        <p:sldId id="{}" r:id="rId{}"/>"#,
                        256 + i,
                        templates::FIRST_SLIDE_REL + i
                    )
                })
                .collect::<Vec<String>>()
                .join("\n");
            format!("    <p:sldIdLst>\n{}\n    </p:sldIdLst>\n", ids)
        };

        format!(
            r#"{header}
<p:presentation xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships" xmlns:p="http://schemas.openxmlformats.org/presentationml/2006/main" saveSubsetFonts="1">
    <p:sldMasterIdLst>
        <p:sldMasterId id="2147483648" r:id="rId1"/>
    </p:sldMasterIdLst>
{slide_ids}    <p:sldSz cx="{cx}" cy="{cy}"{size_type}/>
    <p:notesSz cx="6858000" cy="9144000"/>
</p:presentation>"#,
            header = templates::XML_HEADER,
            slide_ids = slide_ids,
            cx = cx,
            cy = cy,
            size_type = size_type
        )
    }

    fn slide_rels_xml(&self, slide: &Slide) -> String {
        let mut rels = format!(
            "{}\n<Relationships xmlns=\"http://schemas.openxmlformats.org/package/2006/relationships\">\n    <Relationship Id=\"rId1\" Type=\"{}\" Target=\"../slideLayouts/slideLayout1.xml\"/>\n",
            templates::XML_HEADER,
            templates::LAYOUT_REL_TYPE
        );

        let pictures = slide.shapes.iter().filter_map(|shape| match shape {
            Shape::Picture { media, .. } => Some(*media),
            Shape::TextBox { .. } => None,
        });
        for (n, media) in pictures.enumerate() {
            rels.push_str(&format!(
                "    <Relationship Id=\"rId{}\" Type=\"{}\" Target=\"../media/{}\"/>\n",
                n + 2,
                templates::IMAGE_REL_TYPE,
                self.media_name(media)
            ));
        }

        rels.push_str("</Relationships>");
        rels
    }

    fn slide_xml(slide: &Slide) -> String {
        let mut xml = String::from(templates::SLIDE_HEAD);
        let mut picture_rel = 2;

        for (n, shape) in slide.shapes.iter().enumerate() {
            // id 1 is the group shape
            let id = n + 2;
            match shape {
                Shape::Picture { rect, .. } => {
                    xml.push_str(&picture_xml(id, picture_rel, rect.to_emu()));
                    picture_rel += 1;
                }
                Shape::TextBox {
                    rect,
                    text,
                    font_size,
                } => xml.push_str(&text_box_xml(id, rect.to_emu(), text, *font_size)),
            }
        }

        xml.push_str(templates::SLIDE_TAIL);
        xml
    }
}

fn xfrm_xml(emu: EmuRect) -> String {
    format!(
        r#"<a:xfrm>
                        <a:off x="{}" y="{}"/>
                        <a:ext cx="{}" cy="{}"/>
                    </a:xfrm>"#,
        emu.x, emu.y, emu.cx, emu.cy
    )
}

fn picture_xml(id: usize, rel: usize, emu: EmuRect) -> String {
    format!(
        r#"            <p:pic>
                <p:nvPicPr>
                    <p:cNvPr id="{id}" name="Picture {n}"/>
                    <p:cNvPicPr>
                        <a:picLocks noChangeAspect="1"/>
                    </p:cNvPicPr>
                    <p:nvPr/>
                </p:nvPicPr>
                <p:blipFill>
                    <a:blip r:embed="rId{rel}"/>
                    <a:stretch>
                        <a:fillRect/>
                    </a:stretch>
                </p:blipFill>
                <p:spPr>
                    {xfrm}
                    <a:prstGeom prst="rect">
                        <a:avLst/>
                    </a:prstGeom>
                </p:spPr>
            </p:pic>
"#,
        id = id,
        n = id - 1,
        rel = rel,
        xfrm = xfrm_xml(emu)
    )
}

fn text_box_xml(id: usize, emu: EmuRect, text: &str, font_size: f64) -> String {
    format!(
        r#"            <p:sp>
                <p:nvSpPr>
                    <p:cNvPr id="{id}" name="TextBox {n}"/>
                    <p:cNvSpPr txBox="1"/>
                    <p:nvPr/>
                </p:nvSpPr>
                <p:spPr>
                    {xfrm}
                    <a:prstGeom prst="rect">
                        <a:avLst/>
                    </a:prstGeom>
                    <a:noFill/>
                </p:spPr>
                <p:txBody>
                    <a:bodyPr wrap="none" rtlCol="0">
                        <a:spAutoFit/>
                    </a:bodyPr>
                    <a:lstStyle/>
{paragraphs}                </p:txBody>
            </p:sp>
"#,
        id = id,
        n = id - 1,
        xfrm = xfrm_xml(emu),
        paragraphs = paragraphs_xml(text, font_size)
    )
}

/// Font size in hundredths of a point, as stored in `sz` attributes.
pub fn font_size_hundredths(points: f64) -> i64 {
    (points * 100.0).round() as i64
}

fn is_xml_char(c: char) -> bool {
    matches!(c, '\t' | '\u{20}'..='\u{D7FF}' | '\u{E000}'..='\u{FFFD}' | '\u{10000}'..='\u{10FFFF}')
}

/// Split `text` into paragraphs of line segments.
///
/// Line breaks start a new paragraph, vertical tabs a new line within one.
/// Characters XML cannot carry are dropped.
pub fn split_paragraphs(text: &str) -> Vec<Vec<String>> {
    let normalized = text.replace("\r\n", "\n").replace('\r', "\n");
    normalized
        .split('\n')
        .map(|paragraph| {
            paragraph
                .split('\u{b}')
                .map(|segment| segment.chars().filter(|c| is_xml_char(*c)).collect())
                .collect()
        })
        .collect()
}

fn paragraphs_xml(text: &str, font_size: f64) -> String {
    let sz = font_size_hundredths(font_size);
    let run_props = format!(r#"<a:rPr lang="en-US" sz="{}" dirty="0"/>"#, sz);

    let mut xml = String::new();
    for segments in split_paragraphs(text) {
        xml.push_str("                    <a:p>");
        for (i, segment) in segments.iter().enumerate() {
            if i > 0 {
                xml.push_str(&format!("<a:br>{}</a:br>", run_props));
            }
            if !segment.is_empty() {
                xml.push_str(&format!(
                    "<a:r>{}<a:t>{}</a:t></a:r>",
                    run_props,
                    escape(segment.as_str())
                ));
            }
        }
        xml.push_str(&format!(
            r#"<a:endParaRPr lang="en-US" sz="{}" dirty="0"/></a:p>"#,
            sz
        ));
        xml.push('\n');
    }
    xml
}

fn write_part<W: Write + std::io::Seek>(
    zip: &mut ZipWriter<W>,
    name: &str,
    contents: &[u8],
) -> Result<()> {
    debug!("Writing PPTX part: {}", name);
    zip.start_file(name, FileOptions::default())?;
    zip.write_all(contents)?;
    Ok(())
}

impl DeckBuilder for PptxDeck {
    fn with_slide_size(size: SlideSize) -> Self {
        Self::new(size)
    }

    fn slide_size(&self) -> SlideSize {
        self.size
    }

    fn add_slide(&mut self) -> usize {
        self.slides.push(Slide::default());
        self.slides.len() - 1
    }

    fn place_picture(&mut self, slide: usize, picture: &Picture, rect: Rect) -> Result<()> {
        let media = self.media.len();
        self.slide_mut(slide)?
            .shapes
            .push(Shape::Picture { media, rect });
        self.media.push(picture.clone());
        Ok(())
    }

    fn place_text_box(
        &mut self,
        slide: usize,
        rect: Rect,
        text: &str,
        font_size: f64,
    ) -> Result<()> {
        self.slide_mut(slide)?.shapes.push(Shape::TextBox {
            rect,
            text: text.to_string(),
            font_size,
        });
        Ok(())
    }

    fn slide_count(&self) -> usize {
        self.slides.len()
    }

    fn save(&self, path: &Path) -> Result<()> {
        info!("Writing PPTX with {} slides to {:?}", self.slides.len(), path);

        let title = path
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| "Presentation".to_string());

        let file = fs::File::create(path).map_err(OcrDeckError::FileReadError)?;
        let mut zip = ZipWriter::new(file);

        write_part(&mut zip, "[Content_Types].xml", self.content_types_xml().as_bytes())?;
        write_part(&mut zip, "_rels/.rels", templates::PACKAGE_RELS.as_bytes())?;
        write_part(&mut zip, "docProps/app.xml", self.app_xml().as_bytes())?;
        write_part(&mut zip, "docProps/core.xml", self.core_xml(&title).as_bytes())?;
        write_part(
            &mut zip,
            "ppt/_rels/presentation.xml.rels",
            self.presentation_rels_xml().as_bytes(),
        )?;
        write_part(&mut zip, "ppt/presentation.xml", self.presentation_xml().as_bytes())?;
        write_part(&mut zip, "ppt/presProps.xml", templates::PRES_PROPS.as_bytes())?;
        write_part(&mut zip, "ppt/viewProps.xml", templates::VIEW_PROPS.as_bytes())?;
        write_part(&mut zip, "ppt/tableStyles.xml", templates::TABLE_STYLES.as_bytes())?;
        write_part(&mut zip, "ppt/theme/theme1.xml", templates::THEME.as_bytes())?;
        write_part(
            &mut zip,
            "ppt/slideMasters/slideMaster1.xml",
            templates::SLIDE_MASTER.as_bytes(),
        )?;
        write_part(
            &mut zip,
            "ppt/slideMasters/_rels/slideMaster1.xml.rels",
            templates::SLIDE_MASTER_RELS.as_bytes(),
        )?;
        write_part(
            &mut zip,
            "ppt/slideLayouts/slideLayout1.xml",
            templates::SLIDE_LAYOUT.as_bytes(),
        )?;
        write_part(
            &mut zip,
            "ppt/slideLayouts/_rels/slideLayout1.xml.rels",
            templates::SLIDE_LAYOUT_RELS.as_bytes(),
        )?;

        for (i, picture) in self.media.iter().enumerate() {
            write_part(
                &mut zip,
                &format!("ppt/media/{}", self.media_name(i)),
                &picture.data,
            )?;
        }

        for (i, slide) in self.slides.iter().enumerate() {
            let slide_num = i + 1;
            write_part(
                &mut zip,
                &format!("ppt/slides/_rels/slide{}.xml.rels", slide_num),
                self.slide_rels_xml(slide).as_bytes(),
            )?;
            write_part(
                &mut zip,
                &format!("ppt/slides/slide{}.xml", slide_num),
                Self::slide_xml(slide).as_bytes(),
            )?;
        }

        zip.finish()?;
        Ok(())
    }
}

/// Read back the text of every slide of a `.pptx` file, in slide order.
///
/// Paragraphs are joined with '\n' and line breaks inside a paragraph
/// come back as '\u{b}'.
pub fn read_slide_texts(path: &Path) -> Result<Vec<String>> {
    let file = fs::File::open(path)?;
    let mut archive = ZipArchive::new(file)?;

    let mut slide_numbers: Vec<usize> = archive
        .file_names()
        .filter_map(|name| {
            name.strip_prefix("ppt/slides/slide")?
                .strip_suffix(".xml")?
                .parse()
                .ok()
        })
        .collect();
    slide_numbers.sort_unstable();

    let mut texts = Vec::with_capacity(slide_numbers.len());
    for number in slide_numbers {
        let mut xml = String::new();
        archive
            .by_name(&format!("ppt/slides/slide{}.xml", number))?
            .read_to_string(&mut xml)?;
        texts.push(text_of_slide(&xml)?);
    }
    Ok(texts)
}

fn text_of_slide(xml: &str) -> Result<String> {
    let mut reader = Reader::from_str(xml);
    let mut paragraphs: Vec<String> = Vec::new();
    let mut in_text = false;

    loop {
        let event = reader
            .read_event()
            .map_err(|e| OcrDeckError::PptxError(format!("Malformed slide XML: {}", e)))?;
        match event {
            Event::Start(e) if e.name().as_ref() == b"a:p" => paragraphs.push(String::new()),
            Event::Start(e) if e.name().as_ref() == b"a:t" => in_text = true,
            Event::End(e) if e.name().as_ref() == b"a:t" => in_text = false,
            Event::Start(e) if e.name().as_ref() == b"a:br" => {
                if let Some(current) = paragraphs.last_mut() {
                    current.push('\u{b}');
                }
            }
            Event::Text(t) if in_text => {
                let text = t
                    .unescape()
                    .map_err(|e| OcrDeckError::PptxError(format!("Bad slide text: {}", e)))?;
                if let Some(current) = paragraphs.last_mut() {
                    current.push_str(&text);
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(paragraphs.join("\n"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn picture() -> Picture {
        let mut data = Vec::new();
        image::DynamicImage::new_rgb8(4, 4)
            .write_to(
                &mut std::io::Cursor::new(&mut data),
                image::ImageOutputFormat::Png,
            )
            .unwrap();
        Picture::new(data, "png")
    }

    fn part_names(path: &Path) -> Vec<String> {
        let archive = ZipArchive::new(fs::File::open(path).unwrap()).unwrap();
        archive.file_names().map(String::from).collect()
    }

    fn read_part(path: &Path, name: &str) -> String {
        let mut archive = ZipArchive::new(fs::File::open(path).unwrap()).unwrap();
        let mut xml = String::new();
        archive
            .by_name(name)
            .unwrap()
            .read_to_string(&mut xml)
            .unwrap();
        xml
    }

    #[test]
    fn test_split_paragraphs() {
        assert_eq!(
            split_paragraphs("one\r\ntwo\rthree\nfour\u{b}five\u{c}"),
            vec![
                vec!["one".to_string()],
                vec!["two".to_string()],
                vec!["three".to_string()],
                vec!["four".to_string(), "five".to_string()],
            ]
        );
        assert_eq!(split_paragraphs(""), vec![vec![String::new()]]);
    }

    #[test]
    fn test_every_run_gets_the_font_size() {
        let xml = paragraphs_xml("a & b\n\nc\u{b}d", 12.5);
        assert_eq!(xml.matches("<a:r>").count(), 3);
        assert_eq!(xml.matches(r#"sz="1250""#).count(), 3 + 1 + 3);
        assert!(xml.contains("<a:t>a &amp; b</a:t>"));
        assert!(!xml.contains("sz=\"1200\""));
    }

    #[test]
    fn test_font_size_hundredths() {
        assert_eq!(font_size_hundredths(12.0), 1200);
        assert_eq!(font_size_hundredths(10.5), 1050);
    }

    #[test]
    fn test_save_writes_complete_package() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("deck.pptx");

        let mut deck = PptxDeck::new(SlideSize::Standard);
        for text in ["first slide", "second <slide>"] {
            let slide = deck.add_slide();
            deck.place_picture(slide, &picture(), Rect::new(0.5, 0.5, 2.0, 2.0))
                .unwrap();
            deck.place_text_box(slide, Rect::new(3.0, 0.5, 5.0, 5.0), text, 14.0)
                .unwrap();
        }
        deck.save(&path).unwrap();

        let names = part_names(&path);
        for expected in [
            "[Content_Types].xml",
            "_rels/.rels",
            "ppt/presentation.xml",
            "ppt/slideMasters/slideMaster1.xml",
            "ppt/slideLayouts/slideLayout1.xml",
            "ppt/theme/theme1.xml",
            "ppt/slides/slide1.xml",
            "ppt/slides/slide2.xml",
            "ppt/slides/_rels/slide2.xml.rels",
            "ppt/media/image1.png",
            "ppt/media/image2.png",
        ] {
            assert!(names.iter().any(|n| n == expected), "missing {}", expected);
        }

        let presentation = read_part(&path, "ppt/presentation.xml");
        assert!(presentation.contains(r#"<p:sldSz cx="9144000" cy="6858000" type="screen4x3"/>"#));
        assert!(presentation.contains(r#"<p:sldId id="257" r:id="rId7"/>"#));

        let content_types = read_part(&path, "[Content_Types].xml");
        assert_eq!(content_types.matches(r#"Extension="png""#).count(), 1);

        let slide = read_part(&path, "ppt/slides/slide1.xml");
        assert!(slide.contains(r#"<a:off x="457200" y="457200"/>"#));
        assert!(slide.contains(r#"<a:ext cx="1828800" cy="1828800"/>"#));
        assert!(slide.contains(r#"r:embed="rId2""#));

        let rels = read_part(&path, "ppt/slides/_rels/slide2.xml.rels");
        assert!(rels.contains("../media/image2.png"));

        assert_eq!(
            read_slide_texts(&path).unwrap(),
            vec!["first slide", "second <slide>"]
        );
    }

    #[test]
    fn test_empty_deck_is_valid() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("empty.pptx");

        let deck = PptxDeck::new(SlideSize::Widescreen);
        deck.save(&path).unwrap();

        let presentation = read_part(&path, "ppt/presentation.xml");
        assert!(!presentation.contains("sldIdLst"));
        assert!(presentation.contains(r#"<p:sldSz cx="12191970" cy="6858000"/>"#));
        assert!(read_slide_texts(&path).unwrap().is_empty());
    }

    #[test]
    fn test_unknown_slide_is_an_error() {
        let mut deck = PptxDeck::new(SlideSize::Widescreen);
        assert!(deck
            .place_text_box(3, Rect::new(0.0, 0.0, 1.0, 1.0), "x", 12.0)
            .is_err());
    }
}
