use std::path::{Path, PathBuf};

use super::{DocumentAdapter, Fragment, Locator, paragraph_index, split_paragraphs};
use crate::error::{Error, Result};

/// Plain text, one fragment per blank-line separated paragraph.
#[derive(Debug, Clone, Default)]
pub struct TextDocument {
    paragraphs: Vec<String>,
    translated: Vec<Option<String>>,
}

impl TextDocument {
    pub fn parse(text: &str) -> Self {
        let paragraphs = split_paragraphs(text);
        let translated = vec![None; paragraphs.len()];
        Self { paragraphs, translated }
    }

    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| Error::DocumentOpen(format!("{}: {e}", path.display())))?;
        Ok(Self::parse(&text))
    }

    pub fn paragraphs(&self) -> &[String] {
        &self.paragraphs
    }

    /// Translated paragraphs (originals where untranslated), blank-line separated.
    pub fn render(&self) -> String {
        self.paragraphs
            .iter()
            .zip(&self.translated)
            .map(|(original, translated)| translated.as_deref().unwrap_or(original))
            .collect::<Vec<_>>()
            .join("\n\n")
    }
}

impl DocumentAdapter for TextDocument {
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

    fn save(&self, output: &Path) -> Result<Vec<PathBuf>> {
        std::fs::write(output, self.render())
            .map_err(|e| Error::DocumentSave(format!("{}: {e}", output.display())))?;
        Ok(vec![output.to_path_buf()])
    }
}
