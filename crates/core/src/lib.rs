pub mod chat;
pub mod chunking;
pub mod config;
pub mod embeddings;
pub mod error;
pub mod extractor;
pub mod index;
pub mod ingest;
pub mod models;
pub mod normalize;
pub mod orchestrator;
pub mod prompt;
pub mod response;
pub mod retriever;
pub mod store;

pub use chat::{ApiKey, ChatClient, EndpointConfig, OpenRouterClient};
pub use chunking::{chunk_words, ChunkingConfig, TextChunker};
pub use config::{AssistantConfig, GenerationConfig};
pub use embeddings::{CharacterNgramEmbedder, Embedder, HttpEmbedder, DEFAULT_EMBEDDING_DIMENSIONS};
pub use error::{ChatError, ConfigError, EmbeddingError, IngestError, SearchError};
pub use extractor::{LopdfExtractor, TextExtractor};
pub use index::{cosine_similarity, EmbeddingIndex, IndexHandle, IndexHit, SearchOutcome};
pub use ingest::{discover_pdf_files, IngestionReport, SkipReason, SkippedDocument};
pub use models::{
    BilingualAnswer, ChatMessage, ChatRequest, Chunk, ChunkMetadata, RetrievalResult, Role,
    SamplingParams,
};
pub use normalize::TranslationCleaner;
pub use orchestrator::{ChatOutcome, SchemeAssistant, Stage};
pub use prompt::{PromptBuilder, TargetLanguage};
pub use response::{
    render_bilingual, split_sections, ENGLISH_SECTION_LABEL, NO_CONTEXT_MESSAGE,
    TECHNICAL_ERROR_MESSAGE, TRANSLATION_PLACEHOLDER, TRANSLATION_UNAVAILABLE,
};
pub use retriever::{RetrievalConfig, Retriever};
pub use store::DocumentStore;
