//! Documents as sequences of translatable fragments.
//!
//! An adapter walks a document, hands out fragments tagged with a
//! [`Locator`], and later takes translated text back for the same locator.
//! The translation core only threads locators through; it never looks
//! inside them.

mod pdf;
mod text;
mod workbook;

pub use pdf::PdfDocument;
pub use text::TextDocument;
pub use workbook::Workbook;

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Where a fragment lives inside its document
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Locator {
    /// 1-based spreadsheet cell
    Cell { sheet: String, row: u32, col: u32 },
    /// Drawing shape, by position within its sheet
    Shape { sheet: String, index: usize },
    /// Paragraph, by position within the document
    Paragraph { index: usize },
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Cell { sheet, row, col } => write!(f, "{sheet}!R{row}C{col}"),
            Self::Shape { sheet, index } => write!(f, "{sheet}!shape[{index}]"),
            Self::Paragraph { index } => write!(f, "paragraph[{index}]"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fragment {
    pub locator: Locator,
    pub text: String,
}

impl Fragment {
    pub fn new(locator: Locator, text: impl Into<String>) -> Self {
        Self {
            locator,
            text: text.into(),
        }
    }
}

/// A document the job runner can translate in place.
pub trait DocumentAdapter {
    /// Candidate fragments in document order.
    fn extract_fragments(&self) -> Result<Vec<Fragment>>;

    /// Replace the text at `locator` with its translation.
    fn write_back(&mut self, locator: &Locator, translated: &str) -> Result<()>;

    /// Write the translated document. Returns every file written.
    fn save(&self, output: &Path) -> Result<Vec<PathBuf>>;
}

#[allow(clippy::expect_used)]
static PARAGRAPH_BREAK: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\n\s*\n").expect("valid regex"));

/// Split on blank lines, dropping empty paragraphs.
pub fn split_paragraphs(text: &str) -> Vec<String> {
    PARAGRAPH_BREAK
        .split(text)
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(str::to_string)
        .collect()
}

/// Paragraph index out of a locator, for paragraph-based documents
fn paragraph_index(locator: &Locator, len: usize) -> Result<usize> {
    match *locator {
        Locator::Paragraph { index } if index < len => Ok(index),
        Locator::Paragraph { index } => Err(crate::Error::UnsupportedLocator(format!(
            "paragraph[{index}] (document has {len} paragraphs)"
        ))),
        ref other => Err(crate::Error::UnsupportedLocator(other.to_string())),
    }
}
