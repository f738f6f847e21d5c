//! Prompt templates for grounded answer generation and paragraph translation.

use crate::models::RetrievalResult;

const SYSTEM_PROMPT: &str = r#"You are an expert Odisha E-Governance Assistant specializing in Odisha Government schemes and programs. Your role is to:

CORE RESPONSIBILITIES:
1. Explain government schemes in simple, conversational English
2. Provide accurate information about eligibility, benefits, and application processes
3. Focus on three main schemes: KALIA Yojana, Biju Swasthya Kalyan Yojana, and Mission Shakti
4. Make complex bureaucratic information accessible to common citizens

COMMUNICATION STYLE:
- Use simple, everyday English (avoid complex bureaucratic jargon)
- Break down complex procedures into easy-to-follow steps
- Provide practical examples and real-life scenarios
- Be empathetic and understanding of common citizen concerns
- Explain technical terms in plain language

STRUCTURE YOUR RESPONSES:
For scheme-related queries, organize information as:
- Brief scheme overview
- Who can apply (eligibility criteria)
- What benefits are provided
- How to apply (step-by-step process)
- Required documents
- Helpful tips and important notes

ACCURACY REQUIREMENTS:
- Base all responses ONLY on the provided document context
- Never answer from outside the supplied context
- Never provide incorrect eligibility or benefit information
- Clearly state when information is not available in the documents

Remember: You are helping everyday citizens understand their rights and access government benefits. Be patient, clear, and supportive in your explanations."#;

const USER_GUIDELINES: &str = r#"Please provide a helpful response in clear, simple English following these guidelines:
1. Focus on practical, actionable information
2. Use simple language that any citizen can understand
3. Include specific steps, eligibility, and requirements when relevant
4. If the query is about a specific scheme, structure your response with:
   - Brief scheme overview
   - Who can apply (eligibility)
   - What benefits are provided
   - How to apply (step-by-step)
   - Required documents
   - Helpful tips

If the information is not available in the provided context, please say so clearly and suggest how the user might find this information."#;

/// The single language answers are translated into.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetLanguage {
    pub name: String,
    pub script: String,
    /// The word "translation" in the target script, stripped from replies.
    pub translation_word: String,
}

impl TargetLanguage {
    pub fn odia() -> Self {
        Self {
            name: "Odia".to_string(),
            script: "Odia script".to_string(),
            translation_word: "ଅନୁବାଦ".to_string(),
        }
    }

    pub fn section_label(&self) -> String {
        format!("{} TRANSLATION:", self.name.to_uppercase())
    }
}

impl Default for TargetLanguage {
    fn default() -> Self {
        Self::odia()
    }
}

#[derive(Debug, Clone, Default)]
pub struct PromptBuilder {
    language: TargetLanguage,
    context_char_budget: Option<usize>,
}

impl PromptBuilder {
    pub fn new(language: TargetLanguage, context_char_budget: Option<usize>) -> Self {
        Self {
            language,
            context_char_budget,
        }
    }

    pub fn language(&self) -> &TargetLanguage {
        &self.language
    }

    pub fn system_prompt(&self) -> &'static str {
        SYSTEM_PROMPT
    }

    pub fn user_prompt(&self, query: &str, docs: &[RetrievalResult]) -> String {
        let context = self.build_context(docs);
        format!(
            "Based on the following official government documents about Odisha schemes:\n\n\
             CONTEXT:\n{context}\n\n\
             USER QUERY: {query}\n\n\
             {USER_GUIDELINES}"
        )
    }

    pub fn translation_system_prompt(&self) -> String {
        format!(
            "You are an {name} translation engine. Translate ONLY the user's input from English to {name}. \
             Do NOT add explanations, comments, or intermediate thoughts. Return {name} translation only, using {script}.",
            name = self.language.name,
            script = self.language.script,
        )
    }

    /// Joins document texts with blank lines. With a budget set, trailing
    /// (lowest similarity) documents are dropped until the context fits; the
    /// first document is always kept.
    pub fn build_context(&self, docs: &[RetrievalResult]) -> String {
        let mut kept = docs.len();
        if let Some(budget) = self.context_char_budget {
            while kept > 1 && joined_len(&docs[..kept]) > budget {
                kept -= 1;
            }
            if kept < docs.len() {
                tracing::debug!(kept, dropped = docs.len() - kept, budget, "context truncated");
            }
        }

        docs[..kept]
            .iter()
            .map(|doc| doc.content.as_str())
            .collect::<Vec<_>>()
            .join("\n\n")
    }
}

fn joined_len(docs: &[RetrievalResult]) -> usize {
    let separators = docs.len().saturating_sub(1) * 2;
    docs.iter()
        .map(|doc| doc.content.chars().count())
        .sum::<usize>()
        + separators
}
