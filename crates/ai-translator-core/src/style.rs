//! Named translation styles and the register/tone instructions they inject.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A named register/tone applied uniformly to every prompt in a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Style {
    #[default]
    General,
    Literary,
    Technical,
    Financial,
    Legal,
    Medical,
    Scientific,
    Casual,
    Formal,
    Marketing,
    Educational,
    PharmaceuticalTechnology,
    PharmaceuticalIndustry,
    Creative,
}

impl Style {
    pub const ALL: [Self; 14] = [
        Self::General,
        Self::Literary,
        Self::Technical,
        Self::Financial,
        Self::Legal,
        Self::Medical,
        Self::Scientific,
        Self::Casual,
        Self::Formal,
        Self::Marketing,
        Self::Educational,
        Self::PharmaceuticalTechnology,
        Self::PharmaceuticalIndustry,
        Self::Creative,
    ];

    pub const fn key(self) -> &'static str {
        match self {
            Self::General => "General",
            Self::Literary => "Literary",
            Self::Technical => "Technical",
            Self::Financial => "Financial",
            Self::Legal => "Legal",
            Self::Medical => "Medical",
            Self::Scientific => "Scientific",
            Self::Casual => "Casual",
            Self::Formal => "Formal",
            Self::Marketing => "Marketing",
            Self::Educational => "Educational",
            Self::PharmaceuticalTechnology => "PharmaceuticalTechnology",
            Self::PharmaceuticalIndustry => "PharmaceuticalIndustry",
            Self::Creative => "Creative",
        }
    }

    /// Look up a style by key, ignoring case.
    ///
    /// Unknown keys resolve to [`Style::General`].
    pub fn from_key(key: &str) -> Self {
        let key = key.trim();
        Self::ALL
            .into_iter()
            .find(|s| s.key().eq_ignore_ascii_case(key))
            .unwrap_or_else(|| {
                if !key.is_empty() {
                    tracing::debug!("Unknown style '{}', using General", key);
                }
                Self::General
            })
    }

    pub const fn instructions(self) -> &'static str {
        match self {
            Self::General => {
                "Translate accurately and clearly, conveying the information in a neutral way that a general audience can follow. \
                 Use natural, fluent language without any particular stylistic flourish, and focus on carrying the meaning of the source across as effectively as possible."
            }
            Self::Literary => {
                "Translate in a literary register, carrying not only the meaning but the artistry and emotion of the original. \
                 Use rich, supple language that respects the rhythm and sound of each sentence. \
                 Preserve and recreate rhetorical devices such as metaphor, simile and personification, along with the author's characteristic voice, \
                 so the translation gives the reader an aesthetic and emotional experience close to the original."
            }
            Self::Technical => {
                "Translate technical material with high precision in terminology and domain information. \
                 Use exact, objective language that follows the conventions and standards of the technical field. \
                 Keep terminology and sentence structure consistent so specialist readers get clear, unambiguous information."
            }
            Self::Financial => {
                "Translate financial material with exact figures, terms and financial concepts. \
                 Use professional, formal language that follows the norms of the financial sector, keep every number and amount precise, \
                 and suit the result to a professional business setting."
            }
            Self::Legal => {
                "Translate legal material with absolute fidelity to both wording and legal meaning. \
                 Use formal, precise language and established legal terminology, avoid any ambiguity that could cause a legal misunderstanding, \
                 and produce text usable in a legal context."
            }
            Self::Medical => {
                "Translate medical material with precise medical terminology and clinical information. \
                 Use clear, exact language that follows healthcare conventions, and take particular care with anything related to patient care and safety."
            }
            Self::Scientific => {
                "Translate scientific material with accurate scientific terminology and research content. \
                 Use objective, logical language that follows academic writing norms, keeping the information precise, transparent and verifiable."
            }
            Self::Casual => {
                "Translate in a relaxed, conversational register, as in everyday speech. \
                 Use simple, friendly wording, keep the natural tone and any humour of the original, and make the result feel comfortable and approachable."
            }
            Self::Formal => {
                "Translate in a formal, courteous and professional register. \
                 Use standard, polished language, avoid slang and overly familiar expressions, and suit the result to business or ceremonial communication."
            }
            Self::Marketing => {
                "Translate marketing copy to persuade, capture attention and leave a positive impression. \
                 Use creative, compelling language that carries the brand message, the product or service benefits and the call to action to the target audience."
            }
            Self::Educational => {
                "Translate educational material clearly and pedagogically. \
                 Use simple, coherent language, explain concepts and terms so they are easy to absorb, and support learners in reaching the learning goals."
            }
            Self::PharmaceuticalTechnology => {
                "Translate pharmaceutical technology material with precise technical terminology for drug manufacturing processes. \
                 Follow GMP, GLP and related technical guidance, and render technologies, equipment and the production, testing and storage of medicines accurately \
                 for research and manufacturing settings."
            }
            Self::PharmaceuticalIndustry => {
                "Translate pharmaceutical industry material focused on the business, production, distribution and management of medicines. \
                 Use professional, precise language suited to the regulatory and commercial context, and reflect regulations, business models, market strategy, \
                 supply chain management and product development accurately."
            }
            Self::Creative => {
                "Translate creatively, with freedom of expression while keeping the core idea and spirit of the original. \
                 Imagery, metaphor and other rhetorical devices are welcome where they make the text more vivid. \
                 Suitable for poetry, lyrics, scripts and other artistic work; the result should show the translator's craft while respecting the author's intent."
            }
        }
    }

    /// Style instructions, with any custom instructions appended.
    pub fn prompt(self, custom_instructions: Option<&str>) -> String {
        match custom_instructions.map(str::trim).filter(|c| !c.is_empty()) {
            Some(custom) => format!("{} Additional instructions: {custom}", self.instructions()),
            None => self.instructions().to_string(),
        }
    }
}

impl fmt::Display for Style {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}
