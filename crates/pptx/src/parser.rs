//! PPTX file parser implementation.

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use quizzard_core::text::{clean_block, clean_cell};
use quizzard_core::{
    DocumentFormat, Error, Extractor, ImageHandle, NormalizedContent, Result, TableBlock,
};
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, Read, Seek};
use std::path::Path;
use zip::ZipArchive;

/// Presentation part listing slides in display order.
const PRESENTATION_PATH: &str = "ppt/presentation.xml";

/// Relationships of the presentation part.
const PRESENTATION_RELS_PATH: &str = "ppt/_rels/presentation.xml.rels";

/// Folder holding embedded images.
const MEDIA_PREFIX: &str = "ppt/media/";

/// Parser for PPTX (Office Open XML) files.
pub struct PptxParser;

impl PptxParser {
    /// Create a new PPTX parser.
    pub fn new() -> Self {
        Self
    }

    /// Parse a PPTX file from a reader.
    pub fn parse<R: Read + Seek>(&self, reader: R) -> Result<NormalizedContent> {
        let mut archive = ZipArchive::new(reader)
            .map_err(|e| Error::ZipError(format!("Failed to open ZIP: {}", e)))?;

        let mut content = NormalizedContent::empty();

        // Parse each slide in display order
        for (idx, slide_path) in self.get_slide_order(&mut archive)?.iter().enumerate() {
            match self.parse_slide(&mut archive, slide_path) {
                Ok(slide) => {
                    content.text.push(slide.text);
                    content.tables.extend(slide.tables);
                }
                Err(e) => {
                    log::warn!("Skipping slide {} ({}): {}", idx + 1, slide_path, e);
                    content.text.push(String::new());
                }
            }
        }

        content.images = self.collect_media(&mut archive);

        log::debug!(
            "PPTX: {} slide(s), {} table(s), {} image(s)",
            content.text.len(),
            content.tables.len(),
            content.images.len()
        );

        Ok(content)
    }

    /// Get the ordered list of slide paths.
    ///
    /// The order comes from `p:sldIdLst` in the presentation part. If that is
    /// missing, slides are ordered by the number in their relationship id or
    /// file name.
    fn get_slide_order<R: Read + Seek>(&self, archive: &mut ZipArchive<R>) -> Result<Vec<String>> {
        let rels_content = self.read_file_from_archive(archive, PRESENTATION_RELS_PATH)?;
        let slide_rels = parse_slide_relationships(&rels_content)?;

        let listed = match self.read_file_from_archive(archive, PRESENTATION_PATH) {
            Ok(presentation) => parse_slide_id_list(&presentation),
            Err(e) => {
                log::debug!("No usable presentation part, falling back to numbering: {}", e);
                Vec::new()
            }
        };

        if !listed.is_empty() {
            let by_id: HashMap<&str, &str> = slide_rels
                .iter()
                .map(|rel| (rel.id.as_str(), rel.path.as_str()))
                .collect();
            return Ok(listed
                .iter()
                .filter_map(|id| by_id.get(id.as_str()).map(|path| path.to_string()))
                .collect());
        }

        let mut slides: Vec<(String, Option<usize>)> = slide_rels
            .into_iter()
            .map(|rel| {
                let order_num = extract_slide_number(&rel.id).or_else(|| extract_slide_number(&rel.path));
                (rel.path, order_num)
            })
            .collect();

        // Sort slides by their number
        slides.sort_by(|a, b| match (a.1, b.1) {
            (Some(na), Some(nb)) => na.cmp(&nb),
            (Some(_), None) => std::cmp::Ordering::Less,
            (None, Some(_)) => std::cmp::Ordering::Greater,
            (None, None) => a.0.cmp(&b.0),
        });

        Ok(slides.into_iter().map(|(path, _)| path).collect())
    }

    /// Parse a single slide from the archive.
    fn parse_slide<R: Read + Seek>(
        &self,
        archive: &mut ZipArchive<R>,
        slide_path: &str,
    ) -> Result<SlideContent> {
        let content = self.read_file_from_archive(archive, slide_path)?;
        let mut slide = ShapeWalker::default().walk(&content)?;

        // Top-to-bottom, then left-to-right
        slide
            .shapes
            .sort_by(|a, b| a.y.total_cmp(&b.y).then(a.x.total_cmp(&b.x)));

        let text = slide
            .shapes
            .iter()
            .map(|shape| shape.text.as_str())
            .collect::<Vec<_>>()
            .join("\n");

        Ok(SlideContent {
            text: clean_block(&text),
            tables: slide.tables,
        })
    }

    /// Read a file from the ZIP archive.
    fn read_file_from_archive<R: Read + Seek>(
        &self,
        archive: &mut ZipArchive<R>,
        path: &str,
    ) -> Result<String> {
        let mut file = archive
            .by_name(path)
            .map_err(|e| Error::ZipError(format!("File not found in archive '{}': {}", path, e)))?;

        let mut content = String::new();
        file.read_to_string(&mut content)
            .map_err(|e| Error::ZipError(format!("Failed to read '{}': {}", path, e)))?;

        Ok(content)
    }

    /// Embedded media in archive order. Unreadable entries are skipped.
    fn collect_media<R: Read + Seek>(&self, archive: &mut ZipArchive<R>) -> Vec<ImageHandle> {
        let mut images = Vec::new();

        for idx in 0..archive.len() {
            let mut file = match archive.by_index(idx) {
                Ok(file) => file,
                Err(e) => {
                    log::warn!("Skipping unreadable archive entry {}: {}", idx, e);
                    continue;
                }
            };
            if !file.name().starts_with(MEDIA_PREFIX) || file.is_dir() {
                continue;
            }

            let name = file.name().to_string();
            let mut data = Vec::new();
            match file.read_to_end(&mut data) {
                Ok(_) => images.push(ImageHandle::new(name, data)),
                Err(e) => log::warn!("Skipping media '{}': {}", name, e),
            }
        }

        images
    }
}

impl Default for PptxParser {
    fn default() -> Self {
        Self::new()
    }
}

impl Extractor for PptxParser {
    fn format(&self) -> DocumentFormat {
        DocumentFormat::Pptx
    }

    fn extract(&self, path: &Path) -> Result<NormalizedContent> {
        let file = File::open(path)?;
        self.parse(BufReader::new(file))
    }
}

/// A slide relationship from `presentation.xml.rels`.
#[derive(Debug)]
struct SlideRelationship {
    id: String,
    path: String,
}

/// Relationships of type `.../relationships/slide`, with archive paths.
fn parse_slide_relationships(xml: &str) -> Result<Vec<SlideRelationship>> {
    let mut slides = Vec::new();
    let mut reader = Reader::from_str(xml);
    reader.trim_text(true);

    loop {
        match reader.read_event() {
            Ok(Event::Empty(ref e)) | Ok(Event::Start(ref e))
                if e.name().as_ref() == b"Relationship" =>
            {
                let rel_type = attribute(e, b"Type").unwrap_or_default();
                let target = attribute(e, b"Target").unwrap_or_default();
                let id = attribute(e, b"Id").unwrap_or_default();

                if rel_type.ends_with("/slide") {
                    let path = match target.strip_prefix('/') {
                        Some(absolute) => absolute.to_string(),
                        None => format!("ppt/{}", target),
                    };
                    slides.push(SlideRelationship { id, path });
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(Error::XmlError(format!(
                    "Error parsing relationships: {}",
                    e
                )));
            }
            _ => {}
        }
    }

    Ok(slides)
}

/// Relationship ids of `p:sldId` entries, in display order.
///
/// Malformed XML yields whatever was read before the error.
fn parse_slide_id_list(xml: &str) -> Vec<String> {
    let mut ids = Vec::new();
    let mut reader = Reader::from_str(xml);
    reader.trim_text(true);

    loop {
        match reader.read_event() {
            Ok(Event::Empty(ref e)) | Ok(Event::Start(ref e))
                if local_name(e.name().as_ref()) == b"sldId" =>
            {
                // The prefixed r:id, not the numeric id
                let rel_id = e
                    .attributes()
                    .flatten()
                    .find(|attr| attr.key.as_ref() != b"id" && local_name(attr.key.as_ref()) == b"id")
                    .map(|attr| String::from_utf8_lossy(&attr.value).to_string());
                if let Some(rel_id) = rel_id {
                    ids.push(rel_id);
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                log::warn!("XML parsing error in presentation part: {}", e);
                break;
            }
            _ => {}
        }
    }

    ids
}

/// Text and tables of one slide.
#[derive(Debug, Default)]
struct SlideContent {
    text: String,
    tables: Vec<TableBlock>,
}

/// Information about a shape extracted from XML.
#[derive(Debug, Default)]
struct ShapeInfo {
    text: String,
    x: f64,
    y: f64,
}

/// Table being assembled inside a graphic frame.
#[derive(Debug, Default)]
struct TableBuilder {
    rows: Vec<Vec<String>>,
    row: Vec<String>,
    cell: String,
}

/// Shapes and tables found while walking a slide.
#[derive(Debug, Default)]
struct WalkedSlide {
    shapes: Vec<ShapeInfo>,
    tables: Vec<TableBlock>,
}

/// Streaming walk over a slide's shape tree.
#[derive(Debug, Default)]
struct ShapeWalker {
    slide: WalkedSlide,
    current_shape: Option<ShapeInfo>,
    current_text: String,
    table: Option<TableBuilder>,
    in_text_body: bool,
    in_text: bool,
}

impl ShapeWalker {
    fn walk(mut self, xml_content: &str) -> Result<WalkedSlide> {
        let mut reader = Reader::from_str(xml_content);

        loop {
            match reader.read_event() {
                Ok(Event::Start(ref e)) => self.open(e),
                Ok(Event::Empty(ref e)) => {
                    self.open(e);
                    self.close(local_name(e.name().as_ref()));
                }
                Ok(Event::Text(ref e)) => {
                    if self.in_text {
                        let text = e.unescape().unwrap_or_default();
                        self.buffer().push_str(&text);
                    }
                }
                Ok(Event::End(ref e)) => self.close(local_name(e.name().as_ref())),
                Ok(Event::Eof) => break,
                Err(e) => {
                    return Err(Error::XmlError(format!("Error parsing slide: {}", e)));
                }
                _ => {}
            }
        }

        Ok(self.slide)
    }

    /// Where text currently goes: the open table cell or the open shape.
    fn buffer(&mut self) -> &mut String {
        match self.table.as_mut() {
            Some(table) => &mut table.cell,
            None => &mut self.current_text,
        }
    }

    fn open(&mut self, e: &BytesStart) {
        let name = e.name();
        match local_name(name.as_ref()) {
            b"sp" | b"pic" | b"graphicFrame" => {
                // Start of a shape
                self.current_shape = Some(ShapeInfo::default());
            }
            b"off" => {
                // Offset element with x and y attributes
                if let Some(shape) = self.current_shape.as_mut() {
                    if let Some(x) = attribute(e, b"x").and_then(|v| v.parse::<f64>().ok()) {
                        shape.x = x;
                    }
                    if let Some(y) = attribute(e, b"y").and_then(|v| v.parse::<f64>().ok()) {
                        shape.y = y;
                    }
                }
            }
            b"tbl" => self.table = Some(TableBuilder::default()),
            b"tr" => {
                if let Some(table) = self.table.as_mut() {
                    table.row.clear();
                }
            }
            b"tc" => {
                if let Some(table) = self.table.as_mut() {
                    table.cell.clear();
                }
            }
            b"txBody" => self.in_text_body = true,
            b"p" if self.in_text_body => {
                let buffer = self.buffer();
                if !buffer.is_empty() {
                    buffer.push('\n');
                }
            }
            b"br" if self.in_text_body => self.buffer().push('\n'),
            b"t" if self.in_text_body => self.in_text = true,
            _ => {}
        }
    }

    fn close(&mut self, name: &[u8]) {
        match name {
            b"sp" | b"pic" | b"graphicFrame" => {
                // End of shape - save it
                if let Some(mut shape) = self.current_shape.take() {
                    shape.text = self.current_text.trim().to_string();
                    if !shape.text.is_empty() {
                        self.slide.shapes.push(shape);
                    }
                }
                self.current_text.clear();
                self.in_text_body = false;
                self.in_text = false;
            }
            b"txBody" => self.in_text_body = false,
            b"t" => self.in_text = false,
            b"tc" => {
                if let Some(table) = self.table.as_mut() {
                    let cell = clean_cell(&table.cell);
                    table.row.push(cell);
                }
            }
            b"tr" => {
                if let Some(table) = self.table.as_mut() {
                    let row = std::mem::take(&mut table.row);
                    table.rows.push(row);
                }
            }
            b"tbl" => {
                if let Some(table) = self.table.take() {
                    let block = TableBlock::new(table.rows);
                    if !block.is_blank() {
                        self.slide.tables.push(block);
                    }
                }
            }
            _ => {}
        }
    }
}

/// Value of the attribute with the given local name.
fn attribute(e: &BytesStart, key: &[u8]) -> Option<String> {
    e.attributes()
        .flatten()
        .find(|attr| local_name(attr.key.as_ref()) == key)
        .map(|attr| String::from_utf8_lossy(&attr.value).to_string())
}

/// Extract the local name from a potentially namespaced XML element name.
fn local_name(name: &[u8]) -> &[u8] {
    if let Some(pos) = name.iter().position(|&b| b == b':') {
        &name[pos + 1..]
    } else {
        name
    }
}

/// Extract a slide number from a string like "rId2" or "slide3.xml".
fn extract_slide_number(s: &str) -> Option<usize> {
    // Remove common extensions first
    let s = s.trim_end_matches(".xml").trim_end_matches(".rels");

    // Try to find digits at the end
    let digits: String = s.chars().rev().take_while(|c| c.is_ascii_digit()).collect();
    if digits.is_empty() {
        return None;
    }
    let digits: String = digits.chars().rev().collect();
    digits.parse().ok()
}
