//! PDF text in, plain text and a reflowed PDF out.
//!
//! Extraction reads each page's text layer with lopdf and splits it into
//! paragraphs on blank lines. The translated output does not try to keep
//! the original layout: paragraphs are word-wrapped onto plain A4 pages
//! set in Helvetica.
//!
//! # Encoding
//!
//! Helvetica is one of the standard 14 fonts, so nothing is embedded and
//! text is written in WinAnsi. Characters outside that code page are
//! replaced with `?` in the PDF; the `.txt` output always carries the full
//! translation.

use std::path::{Path, PathBuf};

use lopdf::content::{Content, Operation};
use lopdf::{Dictionary, Document, Object, Stream};

use super::{DocumentAdapter, Fragment, Locator, paragraph_index, split_paragraphs};
use crate::error::{Error, Result};

// =============================================================================
// Layout Constants
// =============================================================================

/// A4 portrait, in points
const PAGE_WIDTH: f32 = 595.0;
const PAGE_HEIGHT: f32 = 842.0;

const MARGIN: f32 = 56.0;

const FONT_SIZE: f32 = 11.0;

/// Line height as a multiple of font size.
const LINE_HEIGHT_FACTOR: f32 = 1.3;

/// Average Helvetica glyph width as a fraction of font size.
const CHAR_WIDTH_FACTOR: f32 = 0.5;

#[derive(Debug, Clone, Default)]
pub struct PdfDocument {
    paragraphs: Vec<String>,
    translated: Vec<Option<String>>,
}

impl PdfDocument {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let doc = Document::load(path)
            .map_err(|e| Error::DocumentOpen(format!("{}: {e}", path.display())))?;
        Self::from_document(&doc)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let doc = Document::load_mem(bytes).map_err(|e| Error::DocumentOpen(format!("Failed to parse PDF: {e}")))?;
        Self::from_document(&doc)
    }

    fn from_document(doc: &Document) -> Result<Self> {
        let pages = doc.get_pages();
        if pages.is_empty() {
            return Err(Error::DocumentExtraction("PDF has no pages".to_string()));
        }

        let mut text = String::new();
        let mut extracted = 0;
        for &page_num in pages.keys() {
            match doc.extract_text(&[page_num]) {
                Ok(page_text) => {
                    text.push_str(&page_text);
                    text.push_str("\n\n");
                    extracted += 1;
                }
                Err(e) => tracing::warn!("Skipping page {}: {}", page_num, e),
            }
        }
        if extracted == 0 {
            return Err(Error::DocumentExtraction(
                "no page has an extractable text layer".to_string(),
            ));
        }

        let paragraphs = split_paragraphs(&text);
        tracing::info!(
            "Extracted {} paragraphs from {}/{} pages",
            paragraphs.len(),
            extracted,
            pages.len()
        );
        let translated = vec![None; paragraphs.len()];
        Ok(Self { paragraphs, translated })
    }

    #[cfg(test)]
    fn from_paragraphs(paragraphs: Vec<String>) -> Self {
        let translated = vec![None; paragraphs.len()];
        Self { paragraphs, translated }
    }

    pub fn paragraphs(&self) -> &[String] {
        &self.paragraphs
    }

    fn output_paragraphs(&self) -> impl Iterator<Item = &str> {
        self.paragraphs
            .iter()
            .zip(&self.translated)
            .map(|(original, translated)| translated.as_deref().unwrap_or(original))
    }

    /// Translated paragraphs, blank-line separated
    pub fn translated_text(&self) -> String {
        self.output_paragraphs().collect::<Vec<_>>().join("\n\n")
    }

    /// Lay the translated paragraphs out on fresh pages.
    pub fn render_pdf(&self) -> Result<Vec<u8>> {
        let char_width = FONT_SIZE * CHAR_WIDTH_FACTOR;
        let line_height = FONT_SIZE * LINE_HEIGHT_FACTOR;
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let max_chars = ((PAGE_WIDTH - 2.0 * MARGIN) / char_width).floor().max(10.0) as usize;
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let lines_per_page = ((PAGE_HEIGHT - 2.0 * MARGIN) / line_height).floor().max(1.0) as usize;

        let mut lines = Vec::new();
        for paragraph in self.output_paragraphs() {
            if !lines.is_empty() {
                lines.push(String::new());
            }
            lines.extend(word_wrap(paragraph, max_chars));
        }

        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();

        let font_id = doc.add_object(Dictionary::from_iter([
            ("Type", Object::Name(b"Font".to_vec())),
            ("Subtype", Object::Name(b"Type1".to_vec())),
            ("BaseFont", Object::Name(b"Helvetica".to_vec())),
            ("Encoding", Object::Name(b"WinAnsiEncoding".to_vec())),
        ]));
        let resources_id = doc.add_object(Dictionary::from_iter([(
            "Font",
            Object::Dictionary(Dictionary::from_iter([("F1", Object::Reference(font_id))])),
        )]));

        let mut page_lines: Vec<&[String]> = lines.chunks(lines_per_page).collect();
        if page_lines.is_empty() {
            page_lines.push(&[]);
        }

        let mut kids = Vec::with_capacity(page_lines.len());
        for chunk in page_lines {
            let mut operations = Vec::new();
            for (i, line) in chunk.iter().enumerate() {
                if line.is_empty() {
                    continue;
                }
                #[allow(clippy::cast_precision_loss)]
                let y = PAGE_HEIGHT - MARGIN - FONT_SIZE - i as f32 * line_height;
                operations.push(Operation::new("BT", vec![]));
                operations.push(Operation::new("Tf", vec!["F1".into(), Object::Real(FONT_SIZE)]));
                operations.push(Operation::new("Td", vec![Object::Real(MARGIN), Object::Real(y)]));
                operations.push(Operation::new("Tj", vec![Object::string_literal(to_win_ansi(line))]));
                operations.push(Operation::new("ET", vec![]));
            }

            let content = Content { operations }
                .encode()
                .map_err(|e| Error::DocumentSave(format!("Failed to encode page content: {e}")))?;
            let content_id = doc.add_object(Stream::new(Dictionary::new(), content));

            let page_id = doc.add_object(Dictionary::from_iter([
                ("Type", Object::Name(b"Page".to_vec())),
                ("Parent", Object::Reference(pages_id)),
                ("Contents", Object::Reference(content_id)),
                ("Resources", Object::Reference(resources_id)),
                (
                    "MediaBox",
                    Object::Array(vec![
                        Object::Integer(0),
                        Object::Integer(0),
                        Object::Real(PAGE_WIDTH),
                        Object::Real(PAGE_HEIGHT),
                    ]),
                ),
            ]));
            kids.push(Object::Reference(page_id));
        }

        #[allow(clippy::cast_possible_wrap)]
        let count = kids.len() as i64;
        doc.objects.insert(
            pages_id,
            Object::Dictionary(Dictionary::from_iter([
                ("Type", Object::Name(b"Pages".to_vec())),
                ("Kids", Object::Array(kids)),
                ("Count", Object::Integer(count)),
            ])),
        );

        let catalog_id = doc.add_object(Dictionary::from_iter([
            ("Type", Object::Name(b"Catalog".to_vec())),
            ("Pages", Object::Reference(pages_id)),
        ]));
        doc.trailer.set("Root", Object::Reference(catalog_id));

        let mut output = Vec::new();
        doc.save_to(&mut output)
            .map_err(|e| Error::DocumentSave(format!("Failed to save PDF: {e}")))?;
        Ok(output)
    }
}

impl DocumentAdapter for PdfDocument {
    fn extract_fragments(&self) -> Result<Vec<Fragment>> {
        Ok(self
            .paragraphs
            .iter()
            .enumerate()
            .map(|(index, text)| Fragment::new(Locator::Paragraph { index }, text.clone()))
            .collect())
    }

    fn write_back(&mut self, locator: &Locator, translated: &str) -> Result<()> {
        let index = paragraph_index(locator, self.paragraphs.len())?;
        self.translated[index] = Some(translated.to_string());
        Ok(())
    }

    /// Writes `<output>.pdf` and `<output>.txt`.
    fn save(&self, output: &Path) -> Result<Vec<PathBuf>> {
        let pdf_path = output.with_extension("pdf");
        let txt_path = output.with_extension("txt");

        std::fs::write(&txt_path, self.translated_text())
            .map_err(|e| Error::DocumentSave(format!("{}: {e}", txt_path.display())))?;
        std::fs::write(&pdf_path, self.render_pdf()?)
            .map_err(|e| Error::DocumentSave(format!("{}: {e}", pdf_path.display())))?;

        tracing::info!("Saved {} and {}", pdf_path.display(), txt_path.display());
        Ok(vec![pdf_path, txt_path])
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Greedy word wrap to at most `max_chars` characters per line.
fn word_wrap(text: &str, max_chars: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();
    let mut current_chars = 0;

    for word in text.split_whitespace() {
        let word_chars = word.chars().count();
        if current.is_empty() {
            current = word.to_string();
            current_chars = word_chars;
        } else if current_chars + 1 + word_chars <= max_chars {
            current.push(' ');
            current.push_str(word);
            current_chars += 1 + word_chars;
        } else {
            lines.push(std::mem::replace(&mut current, word.to_string()));
            current_chars = word_chars;
        }
    }

    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

/// Encode for a WinAnsi simple font; unmappable characters become `?`.
fn to_win_ansi(text: &str) -> Vec<u8> {
    text.chars()
        .map(|c| match c {
            '€' => 0x80,
            '…' => 0x85,
            '‘' => 0x91,
            '’' => 0x92,
            '“' => 0x93,
            '”' => 0x94,
            '•' => 0x95,
            '–' => 0x96,
            '—' => 0x97,
            c => u8::try_from(u32::from(c))
                .ok()
                .filter(|b| !(0x80..0xA0).contains(b))
                .unwrap_or(b'?'),
        })
        .collect()
}
