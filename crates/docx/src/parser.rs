//! DOCX file parser implementation.

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use quizzard_core::text::{clean_block, clean_cell};
use quizzard_core::{
    DocumentFormat, Error, Extractor, ImageHandle, NormalizedContent, Result, TableBlock,
};
use std::fs::File;
use std::io::{BufReader, Read, Seek};
use std::path::Path;
use zip::ZipArchive;

/// Main document part inside the archive.
const DOCUMENT_PATH: &str = "word/document.xml";

/// Folder holding embedded images.
const MEDIA_PREFIX: &str = "word/media/";

/// Parser for DOCX (Office Open XML) files.
pub struct DocxParser;

impl DocxParser {
    /// Create a new DOCX parser.
    pub fn new() -> Self {
        Self
    }

    /// Parse a DOCX file from a reader.
    pub fn parse<R: Read + Seek>(&self, reader: R) -> Result<NormalizedContent> {
        let mut archive = ZipArchive::new(reader)
            .map_err(|e| Error::ZipError(format!("Failed to open ZIP: {}", e)))?;

        let document = self.read_file_from_archive(&mut archive, DOCUMENT_PATH)?;
        let body = BodyWalker::default().walk(&document)?;

        let content = NormalizedContent {
            text: body.blocks,
            images: self.collect_media(&mut archive),
            tables: body.tables,
        };

        log::debug!(
            "DOCX: {} section(s), {} table(s), {} image(s)",
            content.text.len(),
            content.tables.len(),
            content.images.len()
        );

        Ok(content)
    }

    /// Read a file from the ZIP archive.
    fn read_file_from_archive<R: Read + Seek>(
        &self,
        archive: &mut ZipArchive<R>,
        path: &str,
    ) -> Result<String> {
        let mut file = archive.by_name(path).map_err(|e| {
            Error::DocxParseError(format!("File not found in archive '{}': {}", path, e))
        })?;

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

impl Default for DocxParser {
    fn default() -> Self {
        Self::new()
    }
}

impl Extractor for DocxParser {
    fn format(&self) -> DocumentFormat {
        DocumentFormat::Docx
    }

    fn extract(&self, path: &Path) -> Result<NormalizedContent> {
        let file = File::open(path)?;
        self.parse(BufReader::new(file))
    }
}

/// Sections and tables found in `word/document.xml`.
#[derive(Debug, Default)]
struct Body {
    blocks: Vec<String>,
    tables: Vec<TableBlock>,
}

/// Table being assembled; only the outermost table is tracked.
#[derive(Debug, Default)]
struct TableBuilder {
    rows: Vec<Vec<String>>,
    row: Vec<String>,
    cell: String,
}

/// Paragraph being assembled.
#[derive(Debug, Default)]
struct ParagraphFrame {
    text: String,
    heading: bool,
}

/// Streaming walk over the document body.
#[derive(Debug, Default)]
struct BodyWalker {
    body: Body,
    /// Paragraphs of the section being built.
    section: Vec<String>,
    /// Open paragraphs; text boxes nest paragraphs inside a run.
    paragraphs: Vec<ParagraphFrame>,
    section_break: bool,
    in_properties: bool,
    run_depth: usize,
    in_text: bool,
    /// Depth inside `mc:Fallback`, whose content duplicates `mc:Choice`.
    fallback_depth: usize,
    table_depth: usize,
    table: Option<TableBuilder>,
}

impl BodyWalker {
    fn walk(mut self, xml: &str) -> Result<Body> {
        let mut reader = Reader::from_str(xml);

        loop {
            match reader.read_event() {
                Ok(Event::Start(ref e)) if local_name(e.name().as_ref()) == b"Fallback" => {
                    self.fallback_depth += 1;
                }
                Ok(Event::End(ref e)) if local_name(e.name().as_ref()) == b"Fallback" => {
                    self.fallback_depth = self.fallback_depth.saturating_sub(1);
                }
                Ok(Event::Eof) => break,
                Ok(_) if self.fallback_depth > 0 => {}
                Ok(Event::Start(ref e)) => self.open(e),
                Ok(Event::Empty(ref e)) => {
                    self.open(e);
                    self.close(local_name(e.name().as_ref()));
                }
                Ok(Event::Text(ref e)) => {
                    if self.in_text {
                        let text = e.unescape().unwrap_or_default();
                        self.push_text(&text);
                    }
                }
                Ok(Event::End(ref e)) => self.close(local_name(e.name().as_ref())),
                Err(e) => {
                    return Err(Error::XmlError(format!(
                        "Error parsing document body: {}",
                        e
                    )));
                }
                _ => {}
            }
        }

        self.flush_section();
        Ok(self.body)
    }

    fn open(&mut self, e: &BytesStart) {
        let name = e.name();
        match local_name(name.as_ref()) {
            b"tbl" => {
                self.table_depth += 1;
                if self.table_depth == 1 {
                    self.table = Some(TableBuilder::default());
                }
            }
            b"tr" if self.table_depth == 1 => {
                if let Some(table) = self.table.as_mut() {
                    table.row.clear();
                }
            }
            b"tc" if self.table_depth == 1 => {
                if let Some(table) = self.table.as_mut() {
                    table.cell.clear();
                }
            }
            b"p" => self.paragraphs.push(ParagraphFrame::default()),
            b"pPr" => self.in_properties = true,
            b"pStyle" if self.in_properties => {
                if let (Some(style), Some(frame)) = (attribute(e, b"val"), self.paragraphs.last_mut())
                {
                    frame.heading = style.starts_with("Heading") || style == "Title";
                }
            }
            b"sectPr" if !self.paragraphs.is_empty() => self.section_break = true,
            b"r" => self.run_depth += 1,
            b"t" if self.run_depth > 0 => self.in_text = true,
            b"tab" if self.run_depth > 0 => self.push_text("\t"),
            b"cr" if self.run_depth > 0 => self.push_text("\n"),
            b"br" if self.run_depth > 0 => {
                let top_level = self.paragraphs.len() == 1 && self.table_depth == 0;
                if top_level && attribute(e, b"type").as_deref() == Some("page") {
                    self.page_break();
                } else {
                    self.push_text("\n");
                }
            }
            _ => {}
        }
    }

    fn close(&mut self, name: &[u8]) {
        match name {
            b"t" => self.in_text = false,
            b"r" => self.run_depth = self.run_depth.saturating_sub(1),
            b"pPr" => self.in_properties = false,
            b"p" => self.end_paragraph(),
            b"tc" if self.table_depth == 1 => {
                if let Some(table) = self.table.as_mut() {
                    let cell = clean_cell(&table.cell);
                    table.row.push(cell);
                }
            }
            b"tr" if self.table_depth == 1 => {
                if let Some(table) = self.table.as_mut() {
                    let row = std::mem::take(&mut table.row);
                    table.rows.push(row);
                }
            }
            b"tbl" => {
                self.table_depth = self.table_depth.saturating_sub(1);
                if self.table_depth == 0 {
                    if let Some(table) = self.table.take() {
                        let block = TableBlock::new(table.rows);
                        if !block.is_blank() {
                            self.body.tables.push(block);
                        }
                    }
                }
            }
            _ => {}
        }
    }

    fn push_text(&mut self, text: &str) {
        if let Some(frame) = self.paragraphs.last_mut() {
            frame.text.push_str(text);
        }
    }

    fn end_paragraph(&mut self) {
        let Some(frame) = self.paragraphs.pop() else {
            return;
        };
        let text = frame.text.trim_end_matches('\n').to_string();

        // A text box paragraph becomes a line of the paragraph around it
        if let Some(outer) = self.paragraphs.last_mut() {
            if !outer.text.is_empty() && !outer.text.ends_with('\n') {
                outer.text.push('\n');
            }
            outer.text.push_str(&text);
            outer.text.push('\n');
            return;
        }

        if self.table_depth > 0 {
            if let Some(table) = self.table.as_mut() {
                if !table.cell.is_empty() {
                    table.cell.push('\n');
                }
                table.cell.push_str(&text);
            }
            return;
        }

        if frame.heading {
            self.flush_section();
        }
        self.section.push(text);

        if std::mem::take(&mut self.section_break) {
            self.flush_section();
        }
    }

    /// Text before the break stays in the current section.
    fn page_break(&mut self) {
        if let Some(frame) = self.paragraphs.last_mut() {
            let before = std::mem::take(&mut frame.text);
            self.section.push(before);
        }
        self.flush_section();
    }

    fn flush_section(&mut self) {
        let block = clean_block(&self.section.join("\n"));
        self.section.clear();
        if !block.is_empty() {
            self.body.blocks.push(block);
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

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Cursor, Write};
    use zip::write::FileOptions;
    use zip::ZipWriter;

    const NS: &str = r#"xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main" xmlns:mc="http://schemas.openxmlformats.org/markup-compatibility/2006" xmlns:v="urn:schemas-microsoft-com:vml""#;

    fn document(body: &str) -> String {
        format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><w:document {}><w:body>{}<w:sectPr/></w:body></w:document>"#,
            NS, body
        )
    }

    fn paragraph(text: &str) -> String {
        format!("<w:p><w:r><w:t xml:space=\"preserve\">{}</w:t></w:r></w:p>", text)
    }

    fn heading(text: &str) -> String {
        format!(
            "<w:p><w:pPr><w:pStyle w:val=\"Heading1\"/></w:pPr><w:r><w:t>{}</w:t></w:r></w:p>",
            text
        )
    }

    fn build_docx(files: &[(&str, &[u8])]) -> Vec<u8> {
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        for (name, data) in files {
            writer.start_file(*name, FileOptions::default()).unwrap();
            writer.write_all(data).unwrap();
        }
        writer.finish().unwrap().into_inner()
    }

    fn parse_body(body: &str) -> NormalizedContent {
        let xml = document(body);
        let data = build_docx(&[(DOCUMENT_PATH, xml.as_bytes())]);
        DocxParser::new().parse(Cursor::new(data)).unwrap()
    }

    #[test]
    fn test_paragraphs_form_one_section() {
        let content = parse_body(&format!("{}{}", paragraph("First line."), paragraph("Second line.")));
        assert_eq!(content.text, vec!["First line.\nSecond line."]);
    }

    #[test]
    fn test_runs_are_concatenated() {
        let body = "<w:p><w:r><w:t xml:space=\"preserve\">Cell </w:t></w:r><w:r><w:t>membrane</w:t></w:r></w:p>";
        let content = parse_body(body);
        assert_eq!(content.text, vec!["Cell membrane"]);
    }

    #[test]
    fn test_headings_start_new_sections() {
        let body = format!(
            "{}{}{}{}{}",
            paragraph("Preface."),
            heading("Chapter 1"),
            paragraph("Atoms."),
            heading("Chapter 2"),
            paragraph("Molecules.")
        );
        let content = parse_body(&body);
        assert_eq!(
            content.text,
            vec!["Preface.", "Chapter 1\nAtoms.", "Chapter 2\nMolecules."]
        );
    }

    #[test]
    fn test_page_break_splits_section() {
        let body = "<w:p><w:r><w:t>Before</w:t><w:br w:type=\"page\"/><w:t>After</w:t></w:r></w:p>";
        let content = parse_body(body);
        assert_eq!(content.text, vec!["Before", "After"]);
    }

    #[test]
    fn test_section_break_splits_after_paragraph() {
        let body = format!(
            "<w:p><w:pPr><w:sectPr/></w:pPr><w:r><w:t>End of part one</w:t></w:r></w:p>{}",
            paragraph("Part two")
        );
        let content = parse_body(&body);
        assert_eq!(content.text, vec!["End of part one", "Part two"]);
    }

    #[test]
    fn test_tabs_and_line_breaks() {
        let body = "<w:p><w:pPr><w:tabs><w:tab w:val=\"left\" w:pos=\"720\"/></w:tabs></w:pPr><w:r><w:t>Name</w:t><w:tab/><w:t>Value</w:t><w:br/><w:t>Next</w:t></w:r></w:p>";
        let content = parse_body(body);
        assert_eq!(content.text, vec!["Name Value\nNext"]);
    }

    #[test]
    fn test_text_box_keeps_surrounding_text() {
        let body = "<w:p><w:r><w:t>Before</w:t></w:r><w:r><w:drawing><w:txbxContent><w:p><w:r><w:t>Box</w:t></w:r></w:p></w:txbxContent></w:drawing></w:r><w:r><w:t xml:space=\"preserve\"> After</w:t></w:r></w:p>";
        let content = parse_body(body);
        assert_eq!(content.text, vec!["Before\nBox\nAfter"]);
    }

    #[test]
    fn test_alternate_content_fallback_is_ignored() {
        let body = format!(
            "<w:p><w:r><w:t>Intro</w:t></w:r><w:r><mc:AlternateContent><mc:Choice Requires=\"wps\"><w:drawing><w:txbxContent><w:p><w:r><w:t>Key fact</w:t></w:r></w:p></w:txbxContent></w:drawing></mc:Choice><mc:Fallback><w:pict><v:textbox><w:txbxContent><w:p><w:r><w:t>Key fact</w:t></w:r></w:p></w:txbxContent></v:textbox></w:pict></mc:Fallback></mc:AlternateContent></w:r></w:p>{}",
            paragraph("Next")
        );
        let content = parse_body(&body);
        assert_eq!(content.text, vec!["Intro\nKey fact\nNext"]);
    }

    #[test]
    fn test_page_break_inside_text_box_stays_in_section() {
        let body = "<w:p><w:r><w:t>Outer</w:t></w:r><w:r><w:drawing><w:txbxContent><w:p><w:r><w:t>One</w:t><w:br w:type=\"page\"/><w:t>Two</w:t></w:r></w:p></w:txbxContent></w:drawing></w:r></w:p>";
        let content = parse_body(body);
        assert_eq!(content.text, vec!["Outer\nOne\nTwo"]);
    }

    #[test]
    fn test_entities_are_unescaped() {
        let content = parse_body(&paragraph("Salt &amp; pepper &lt;3"));
        assert_eq!(content.text, vec!["Salt & pepper <3"]);
    }

    #[test]
    fn test_tables_are_separate_from_text() {
        let body = format!(
            "{}<w:tbl><w:tr><w:tc>{}</w:tc><w:tc>{}</w:tc></w:tr><w:tr><w:tc>{}</w:tc><w:tc>{}{}</w:tc></w:tr></w:tbl>{}",
            paragraph("Intro"),
            paragraph("Element"),
            paragraph("Symbol"),
            paragraph("Gold"),
            paragraph("A"),
            paragraph("u"),
            paragraph("Outro")
        );
        let content = parse_body(&body);

        assert_eq!(content.text, vec!["Intro\nOutro"]);
        assert_eq!(content.tables.len(), 1);
        assert_eq!(
            content.tables[0].rows,
            vec![vec!["Element", "Symbol"], vec!["Gold", "A u"]]
        );
    }

    #[test]
    fn test_nested_table_text_goes_to_outer_cell() {
        let body = format!(
            "<w:tbl><w:tr><w:tc>{}<w:tbl><w:tr><w:tc>{}</w:tc></w:tr></w:tbl></w:tc></w:tr></w:tbl>",
            paragraph("Outer"),
            paragraph("Inner")
        );
        let content = parse_body(&body);

        assert!(content.text.is_empty());
        assert_eq!(content.tables.len(), 1);
        assert_eq!(content.tables[0].rows, vec![vec!["Outer Inner"]]);
    }

    #[test]
    fn test_media_entries_become_images() {
        let xml = document(&paragraph("Figure 1"));
        let data = build_docx(&[
            (DOCUMENT_PATH, xml.as_bytes()),
            ("word/media/image1.png", &b"\x89PNG fake"[..]),
            ("word/styles.xml", &b"<w:styles/>"[..]),
        ]);
        let content = DocxParser::new().parse(Cursor::new(data)).unwrap();

        assert_eq!(content.images.len(), 1);
        assert_eq!(content.images[0].name, "word/media/image1.png");
        assert_eq!(content.images[0].data, b"\x89PNG fake".to_vec());
    }

    #[test]
    fn test_empty_document_has_no_blocks() {
        let content = parse_body("");
        assert!(content.is_empty());
    }

    #[test]
    fn test_missing_document_part_is_an_error() {
        let data = build_docx(&[("word/styles.xml", &b"<w:styles/>"[..])]);
        let result = DocxParser::new().parse(Cursor::new(data));
        assert!(matches!(result, Err(Error::DocxParseError(_))));
    }

    #[test]
    fn test_not_a_zip_normalizes_to_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("essay.docx");
        std::fs::write(&path, b"plain text pretending to be a docx").unwrap();

        assert!(DocxParser::new().normalize(&path).is_empty());
    }

    #[test]
    fn test_extract_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("essay.docx");
        let xml = document(&paragraph("Osmosis moves water."));
        std::fs::write(&path, build_docx(&[(DOCUMENT_PATH, xml.as_bytes())])).unwrap();

        let content = DocxParser::new().normalize(&path);
        assert_eq!(content.text, vec!["Osmosis moves water."]);
    }

    #[test]
    fn test_local_name() {
        assert_eq!(local_name(b"w:p"), b"p");
        assert_eq!(local_name(b"p"), b"p");
    }
}
