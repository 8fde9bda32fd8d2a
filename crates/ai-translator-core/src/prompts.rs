//! Prompt builders for every completion call the translator makes.

use crate::pipeline::TranslationRequest;

fn country_clause(req: &TranslationRequest) -> Option<&str> {
    req.country
        .as_deref()
        .map(str::trim)
        .filter(|country| !country.is_empty())
}

fn terminology_block(req: &TranslationRequest) -> String {
    if req.terminology.is_empty() {
        String::new()
    } else {
        format!(
            "\nUse the following custom terminology:\n{}\n",
            req.terminology.render()
        )
    }
}

/// User prompt for the first-draft translation of one chunk.
pub fn initial_translation(req: &TranslationRequest, text: &str) -> String {
    let mut prompt = format!(
        "Translate the following text from {} to {}.",
        req.source_lang, req.target_lang
    );
    if let Some(country) = country_clause(req) {
        prompt.push_str(&format!(" Adapt the translation for {country}."));
    }
    prompt.push_str("\n\n");
    prompt.push_str(&req.style_prompt());
    prompt.push_str(&terminology_block(req));
    prompt.push_str("\n\nText to translate:\n");
    prompt.push_str(text);
    prompt
}

pub fn reflection_system(req: &TranslationRequest) -> String {
    format!(
        "You are an expert linguist, specializing in {} translation from {} to {}. \
         You will be provided with a source text and its translation and your goal is to improve the translation.",
        req.style.key().to_lowercase(),
        req.source_lang,
        req.target_lang
    )
}

/// User prompt asking for a critique of `draft` along four fixed axes.
pub fn reflection(req: &TranslationRequest, source_text: &str, draft: &str) -> String {
    let country_line = country_clause(req)
        .map(|country| {
            format!(
                "The final style and tone of the translation should match the style of {} colloquially spoken in {country}.\n\n",
                req.target_lang
            )
        })
        .unwrap_or_default();

    format!(
        "Your task is to carefully read a source text and a translation from {src} to {tgt}, \
         and then give constructive criticism and helpful suggestions to improve the translation.\n\
         {country_line}\
         Style requirements: {style}\n\
         {terms}\n\
         The source text and initial translation, delimited by XML tags <SOURCE_TEXT></SOURCE_TEXT> and <TRANSLATION></TRANSLATION>, are as follows:\n\n\
         <SOURCE_TEXT>\n{source_text}\n</SOURCE_TEXT>\n\n\
         <TRANSLATION>\n{draft}\n</TRANSLATION>\n\n\
         When writing suggestions, pay attention to whether there are ways to improve the translation's\n\
         (i) accuracy (by correcting errors of addition, mistranslation, omission, or untranslated text),\n\
         (ii) fluency (by applying {tgt} grammar, spelling and punctuation rules, and ensuring there are no unnecessary repetitions),\n\
         (iii) style (by ensuring the translation follows the style requirements and takes into account any cultural context),\n\
         (iv) terminology (by ensuring terminology use is consistent and reflects the source text domain, and by only using equivalent idioms in {tgt}).\n\n\
         Write a list of specific, helpful and constructive suggestions for improving the translation.\n\
         Each suggestion should address one specific part of the translation.\n\
         Output only the suggestions and nothing else.",
        src = req.source_lang,
        tgt = req.target_lang,
        style = req.style_prompt(),
        terms = terminology_block(req),
    )
}

pub fn improve_system(req: &TranslationRequest) -> String {
    format!(
        "You are an expert linguist, specializing in {} translation editing from {} to {}.",
        req.style.key().to_lowercase(),
        req.source_lang,
        req.target_lang
    )
}

/// User prompt asking for a revised translation that applies `reflection`.
pub fn improve(req: &TranslationRequest, source_text: &str, draft: &str, reflection: &str) -> String {
    format!(
        "Your task is to carefully read, then edit, a translation from {src} to {tgt}, taking into account a list of expert suggestions and constructive criticisms.\n\n\
         Style requirements: {style}\n\
         {terms}\n\
         The source text, the initial translation, and the expert linguist suggestions are delimited by XML tags \
         <SOURCE_TEXT></SOURCE_TEXT>, <TRANSLATION></TRANSLATION> and <EXPERT_SUGGESTIONS></EXPERT_SUGGESTIONS> as follows:\n\n\
         <SOURCE_TEXT>\n{source_text}\n</SOURCE_TEXT>\n\n\
         <TRANSLATION>\n{draft}\n</TRANSLATION>\n\n\
         <EXPERT_SUGGESTIONS>\n{reflection}\n</EXPERT_SUGGESTIONS>\n\n\
         Please take into account the expert suggestions when editing the translation. Edit the translation by ensuring:\n\n\
         1. Original text: every part of the source is rendered, nothing is added or dropped\n\
         2. Current translation: keep what is already correct\n\
         3. Suggestions: apply each suggestion that improves accuracy, fluency, style or terminology\n\n\
         Return ONLY the improved translation, with no explanation or commentary.",
        src = req.source_lang,
        tgt = req.target_lang,
        style = req.style_prompt(),
        terms = terminology_block(req),
    )
}

/// Strict-rules system message for a separator-delimited batch call.
pub fn batch_system(req: &TranslationRequest, separator: &str) -> String {
    let mut rules = vec![
        "Output ONLY the translation.".to_string(),
        "Do not include the original text.".to_string(),
        "Do not add explanations, notes or comments.".to_string(),
        "Keep IDs, model numbers and special characters unchanged.".to_string(),
        "Use standard terminology for the subject domain.".to_string(),
        "Preserve the original formatting.".to_string(),
        "Use proper grammar in the target language.".to_string(),
        "Keep only names, IDs and codes untranslated; translate everything else.".to_string(),
        format!(
            "Translate every segment separated by \"{separator}\" and keep them separated by \"{separator}\" in the same order and number."
        ),
    ];
    if let Some(country) = country_clause(req) {
        rules.push(format!("Adapt the translation for {country}."));
    }
    if let Some(custom) = req
        .custom_style_instructions
        .as_deref()
        .map(str::trim)
        .filter(|c| !c.is_empty())
    {
        rules.push(format!("Follow these additional instructions: {custom}"));
    }
    if !req.terminology.is_empty() {
        rules.push(format!(
            "Use the following custom terminology:\n{}",
            req.terminology.render()
        ));
    }

    let numbered: Vec<String> = rules
        .iter()
        .enumerate()
        .map(|(i, rule)| format!("{}. {rule}", i + 1))
        .collect();

    format!(
        "You are a professional translator. Translate from {} to {}.\n{}\n\nRules:\n{}",
        req.source_lang,
        req.target_lang,
        req.style.instructions(),
        numbered.join("\n")
    )
}

pub fn batch_user(req: &TranslationRequest, separator: &str, combined: &str) -> String {
    format!(
        "Translate the following text from {} to {} in a {} style, keeping segments separated by '{separator}':\n\n{combined}",
        req.source_lang,
        req.target_lang,
        req.style.key().to_lowercase()
    )
}
