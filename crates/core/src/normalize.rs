use crate::prompt::TargetLanguage;
use regex::{Regex, RegexBuilder};

/// Leading phrases translation models like to prepend to their output.
/// `{translation_word}` is replaced with the target-script word for "translation".
/// A qualifier after "here is the translation" is only consumed when it is plain
/// ASCII ending in `:` or a line break, so same-line translated text survives.
const BOILERPLATE_PATTERNS: [&str; 4] = [
    r"^translation\b\s*:?",
    r"^{translation_word}\b\s*:?",
    r"^here is the translation\b(?:[ \t\-,'()a-z0-9]*(?::|\n))?",
    r"^let me translate\b[^\n]*",
];

pub struct TranslationCleaner {
    patterns: Vec<Regex>,
}

impl TranslationCleaner {
    pub fn new(language: &TargetLanguage) -> Result<Self, regex::Error> {
        let word = regex::escape(&language.translation_word);
        let patterns = BOILERPLATE_PATTERNS
            .iter()
            .map(|pattern| {
                RegexBuilder::new(&pattern.replace("{translation_word}", &word))
                    .case_insensitive(true)
                    .build()
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { patterns })
    }

    /// Trims the reply and strips any run of leading boilerplate phrases.
    pub fn clean(&self, raw: &str) -> String {
        let mut text = raw.trim();
        loop {
            let stripped = self
                .patterns
                .iter()
                .find_map(|pattern| pattern.find(text).map(|found| &text[found.end()..]));
            match stripped {
                Some(rest) if rest.len() < text.len() => text = rest.trim_start(),
                _ => break,
            }
        }
        text.trim_end().to_string()
    }
}
