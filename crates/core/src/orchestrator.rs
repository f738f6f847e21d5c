use crate::chat::ChatClient;
use crate::chunking::TextChunker;
use crate::config::{AssistantConfig, GenerationConfig};
use crate::embeddings::Embedder;
use crate::error::{ConfigError, SearchError};
use crate::extractor::TextExtractor;
use crate::index::{EmbeddingIndex, IndexHandle};
use crate::ingest::IngestionReport;
use crate::models::{BilingualAnswer, ChatMessage, ChatRequest, RetrievalResult};
use crate::normalize::TranslationCleaner;
use crate::prompt::PromptBuilder;
use crate::response::{
    render_bilingual, NO_CONTEXT_MESSAGE, TECHNICAL_ERROR_MESSAGE, TRANSLATION_PLACEHOLDER,
};
use crate::retriever::Retriever;
use crate::store::DocumentStore;
use futures::stream::{self, StreamExt};
use std::fmt;
use std::path::Path;
use tracing::{debug, error, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Retrieving,
    Generating,
    Translating,
    Done,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Retrieving => "retrieving",
            Stage::Generating => "generating",
            Stage::Translating => "translating",
            Stage::Done => "done",
        };
        f.write_str(name)
    }
}

/// Where a query ended up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatOutcome {
    /// Retrieval found nothing above the similarity threshold.
    NoContext,
    /// The answer model could not be reached or returned nothing usable.
    GenerationFailed,
    Answered(BilingualAnswer),
}

impl ChatOutcome {
    /// The stage the pipeline stopped in.
    pub fn final_stage(&self) -> Stage {
        match self {
            ChatOutcome::NoContext => Stage::Retrieving,
            ChatOutcome::GenerationFailed => Stage::Generating,
            ChatOutcome::Answered(_) => Stage::Done,
        }
    }
}

/// Retrieve, answer, then translate paragraph by paragraph.
pub struct SchemeAssistant<E, C> {
    retriever: Retriever<E>,
    chat: C,
    chunker: TextChunker,
    prompts: PromptBuilder,
    cleaner: TranslationCleaner,
    generation: GenerationConfig,
}

impl<E, C> SchemeAssistant<E, C>
where
    E: Embedder,
    C: ChatClient,
{
    pub fn new(config: &AssistantConfig, embedder: E, chat: C) -> Result<Self, ConfigError> {
        config.validate()?;
        let language = config.generation.language.clone();

        Ok(Self {
            retriever: Retriever::new(IndexHandle::default(), embedder, config.retrieval),
            chat,
            chunker: TextChunker::new(config.chunking)?,
            prompts: PromptBuilder::new(language.clone(), config.retrieval.context_char_budget),
            cleaner: TranslationCleaner::new(&language)?,
            generation: config.generation.clone(),
        })
    }

    pub fn retriever(&self) -> &Retriever<E> {
        &self.retriever
    }

    pub fn prompts(&self) -> &PromptBuilder {
        &self.prompts
    }

    /// Ingests `paths` into a fresh store, embeds it, and swaps it in as the
    /// serving index. On failure the previous index keeps serving.
    pub async fn rebuild_index<P, X>(
        &self,
        paths: &[P],
        extractor: &X,
    ) -> Result<IngestionReport, SearchError>
    where
        P: AsRef<Path>,
        X: TextExtractor + ?Sized,
    {
        let mut store = DocumentStore::new();
        let report = store.ingest(paths, extractor, &self.chunker);
        let index = EmbeddingIndex::build(store, self.retriever.embedder()).await?;
        self.retriever.index().replace(index);
        info!(chunk_count = report.chunk_count, "serving index replaced");
        Ok(report)
    }

    /// Answers `query` and renders both language sections into one string.
    pub async fn chat(&self, query: &str) -> String {
        match self.answer(query).await {
            ChatOutcome::NoContext => NO_CONTEXT_MESSAGE.to_string(),
            ChatOutcome::GenerationFailed => TECHNICAL_ERROR_MESSAGE.to_string(),
            ChatOutcome::Answered(answer) => render_bilingual(&answer, self.prompts.language()),
        }
    }

    pub async fn answer(&self, query: &str) -> ChatOutcome {
        debug!(stage = %Stage::Retrieving, query, "chat");
        let docs = self.retriever.retrieve(query).await;
        if docs.is_empty() {
            info!("no relevant context found");
            return ChatOutcome::NoContext;
        }

        debug!(stage = %Stage::Generating, documents = docs.len(), "chat");
        let Some(english) = self.generate(query, &docs).await else {
            return ChatOutcome::GenerationFailed;
        };

        debug!(stage = %Stage::Translating, "chat");
        let translated = self.translate(&english).await;

        debug!(stage = %Stage::Done, "chat");
        ChatOutcome::Answered(BilingualAnswer {
            english,
            translated,
        })
    }

    async fn generate(&self, query: &str, docs: &[RetrievalResult]) -> Option<String> {
        let request = ChatRequest::new(
            self.generation.answer_model.clone(),
            vec![
                ChatMessage::system(self.prompts.system_prompt()),
                ChatMessage::user(self.prompts.user_prompt(query, docs)),
            ],
            self.generation.sampling,
        );

        match self.chat.complete(&request).await {
            Ok(answer) => Some(answer),
            Err(error) => {
                error!(model = %request.model, %error, "answer generation failed");
                None
            }
        }
    }

    /// Translates each non-empty line on its own; failed lines become a
    /// placeholder. Output order always follows input order.
    pub async fn translate(&self, english: &str) -> String {
        let paragraphs = english
            .split('\n')
            .filter(|paragraph| !paragraph.trim().is_empty())
            .collect::<Vec<_>>();

        let translations = stream::iter(paragraphs.into_iter().enumerate())
            .map(|(position, paragraph)| self.translate_paragraph(position, paragraph))
            .buffered(self.generation.translation_concurrency.max(1))
            .collect::<Vec<_>>()
            .await;

        translations.join("\n")
    }

    async fn translate_paragraph(&self, position: usize, paragraph: &str) -> String {
        let request = ChatRequest::new(
            self.generation.translation_model.clone(),
            vec![
                ChatMessage::system(self.prompts.translation_system_prompt()),
                ChatMessage::user(paragraph),
            ],
            self.generation.sampling,
        );

        match self.chat.complete(&request).await {
            Ok(reply) => self.cleaner.clean(&reply),
            Err(error) => {
                warn!(paragraph = position, %error, "paragraph translation failed");
                TRANSLATION_PLACEHOLDER.to_string()
            }
        }
    }
}
