use std::io::Cursor;
use std::path::{Path, PathBuf};

use umya_spreadsheet::{Spreadsheet, Worksheet};
use umya_spreadsheet::structs::drawing::spreadsheet::{Shape, TextBody};
use umya_spreadsheet::structs::drawing::{Paragraph, Run};

use super::{DocumentAdapter, Fragment, Locator};
use crate::error::{Error, Result};

/// An `.xlsx` workbook translated cell by cell and shape by shape.
///
/// Every sheet's used range is walked first; cells holding text become
/// [`Locator::Cell`] fragments. Text boxes and shapes anchored on the sheet
/// follow as [`Locator::Shape`] fragments, indexed by their anchor position.
/// Everything else in the workbook is written out untouched.
pub struct Workbook {
    book: Spreadsheet,
}

/// Shape text with one line per paragraph
fn shape_text(shape: &Shape) -> Option<String> {
    let body = shape.get_text_body()?;
    let text = body
        .get_paragraph()
        .iter()
        .map(|paragraph| paragraph.get_run().iter().map(Run::get_text).collect::<String>())
        .collect::<Vec<_>>()
        .join("\n");
    Some(text)
}

/// Replace a text body's content, keeping the first run's formatting.
fn set_shape_text(body: &mut TextBody, text: &str) {
    let paragraphs = body.get_paragraph_mut();
    paragraphs.truncate(1);
    if paragraphs.is_empty() {
        body.add_paragraph(Paragraph::default());
    }

    let Some(paragraph) = body.get_paragraph_mut().first_mut() else {
        return;
    };
    let runs = paragraph.get_run_mut();
    runs.truncate(1);
    if runs.is_empty() {
        paragraph.add_run(Run::default());
    }
    if let Some(run) = paragraph.get_run_mut().first_mut() {
        run.set_text(text);
    }
}

impl Workbook {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let bytes = std::fs::read(path).map_err(|e| Error::DocumentOpen(format!("{}: {e}", path.display())))?;
        Self::from_bytes(&bytes)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let cursor = Cursor::new(bytes.to_vec());
        let book = umya_spreadsheet::reader::xlsx::read_reader(cursor, true)
            .map_err(|e| Error::DocumentOpen(format!("Failed to read workbook: {e}")))?;
        Ok(Self { book })
    }

    pub fn sheet_names(&self) -> Vec<String> {
        self.book
            .get_sheet_collection()
            .iter()
            .map(|ws| ws.get_name().to_string())
            .collect()
    }

    #[cfg(test)]
    const fn from_spreadsheet(book: Spreadsheet) -> Self {
        Self { book }
    }

    /// Current text of a shape, if the sheet has a text shape at `index`
    pub fn shape_text(&self, sheet: &str, index: usize) -> Option<String> {
        self.book
            .get_sheet_by_name(sheet)?
            .get_worksheet_drawing()
            .get_two_cell_anchor_collection()
            .get(index)?
            .get_shape()
            .and_then(shape_text)
    }

    /// Current value of a cell, if the cell exists
    pub fn cell_value(&self, sheet: &str, row: u32, col: u32) -> Option<String> {
        self.book
            .get_sheet_by_name(sheet)
            .and_then(|ws| ws.get_cell((col, row)))
            .map(|cell| cell.get_value().to_string())
    }

    fn sheet_mut(&mut self, sheet: &str, locator: &Locator) -> Result<&mut Worksheet> {
        self.book
            .get_sheet_by_name_mut(sheet)
            .ok_or_else(|| Error::UnsupportedLocator(format!("{locator} (no sheet named '{sheet}')")))
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut buf = Cursor::new(Vec::new());
        umya_spreadsheet::writer::xlsx::write_writer(&self.book, &mut buf)
            .map_err(|e| Error::DocumentSave(format!("Failed to write workbook: {e}")))?;
        Ok(buf.into_inner())
    }
}

impl DocumentAdapter for Workbook {
    fn extract_fragments(&self) -> Result<Vec<Fragment>> {
        let mut fragments = Vec::new();

        for sheet in self.book.get_sheet_collection() {
            let name = sheet.get_name().to_string();
            let (max_col, max_row) = sheet.get_highest_column_and_row();

            for row in 1..=max_row {
                for col in 1..=max_col {
                    let Some(cell) = sheet.get_cell((col, row)) else {
                        continue;
                    };
                    if cell.is_formula() {
                        continue;
                    }
                    let value = cell.get_value();
                    if value.trim().is_empty() {
                        continue;
                    }
                    fragments.push(Fragment::new(
                        Locator::Cell {
                            sheet: name.clone(),
                            row,
                            col,
                        },
                        value.to_string(),
                    ));
                }
            }

            let anchors = sheet.get_worksheet_drawing().get_two_cell_anchor_collection();
            for (index, anchor) in anchors.iter().enumerate() {
                let Some(text) = anchor.get_shape().and_then(shape_text) else {
                    continue;
                };
                if text.trim().is_empty() {
                    continue;
                }
                fragments.push(Fragment::new(
                    Locator::Shape {
                        sheet: name.clone(),
                        index,
                    },
                    text,
                ));
            }
        }

        tracing::debug!("Extracted {} non-empty cells and shapes", fragments.len());
        Ok(fragments)
    }

    fn write_back(&mut self, locator: &Locator, translated: &str) -> Result<()> {
        match locator {
            Locator::Cell { sheet, row, col } => {
                self.sheet_mut(sheet, locator)?
                    .get_cell_mut((*col, *row))
                    .set_value(translated);
            }
            Locator::Shape { sheet, index } => {
                let body = self
                    .sheet_mut(sheet, locator)?
                    .get_worksheet_drawing_mut()
                    .get_two_cell_anchor_collection_mut()
                    .get_mut(*index)
                    .and_then(|anchor| anchor.get_shape_mut())
                    .and_then(|shape| shape.get_text_body_mut())
                    .ok_or_else(|| Error::UnsupportedLocator(format!("{locator} (no text shape)")))?;
                set_shape_text(body, translated);
            }
            Locator::Paragraph { .. } => return Err(Error::UnsupportedLocator(locator.to_string())),
        }
        Ok(())
    }

    fn save(&self, output: &Path) -> Result<Vec<PathBuf>> {
        std::fs::write(output, self.to_bytes()?)
            .map_err(|e| Error::DocumentSave(format!("{}: {e}", output.display())))?;
        tracing::info!("Saved {}", output.display());
        Ok(vec![output.to_path_buf()])
    }
}
