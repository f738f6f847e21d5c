use crate::models::BilingualAnswer;
use crate::prompt::TargetLanguage;

pub const ENGLISH_SECTION_LABEL: &str = "ENGLISH RESPONSE:";
pub const NO_CONTEXT_MESSAGE: &str =
    "I'm sorry, I couldn't find relevant information. Please ask a more specific question.";
pub const TECHNICAL_ERROR_MESSAGE: &str =
    "I'm sorry, there's a technical issue right now. Please try again later.";
pub const TRANSLATION_PLACEHOLDER: &str = "[Translation unavailable]";
pub const TRANSLATION_UNAVAILABLE: &str = "Translation unavailable.";

/// Formats both sections under their fixed labels. Presentation layers split
/// on these labels, so their text must not change.
pub fn render_bilingual(answer: &BilingualAnswer, language: &TargetLanguage) -> String {
    let translated = if answer.translated.trim().is_empty() {
        TRANSLATION_UNAVAILABLE
    } else {
        answer.translated.as_str()
    };

    format!(
        "\n{ENGLISH_SECTION_LABEL}\n{}\n\n{}\n{}",
        answer.english,
        language.section_label(),
        translated
    )
}

/// Inverse of [`render_bilingual`]; `None` for fallback messages.
pub fn split_sections(response: &str, language: &TargetLanguage) -> Option<BilingualAnswer> {
    let translation_label = language.section_label();
    let (head, translated) = response.split_once(translation_label.as_str())?;
    let (_, english) = head.split_once(ENGLISH_SECTION_LABEL)?;

    Some(BilingualAnswer {
        english: english.trim().to_string(),
        translated: translated.trim().to_string(),
    })
}
