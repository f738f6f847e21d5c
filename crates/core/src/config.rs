use crate::chat::{ApiKey, EndpointConfig, DEFAULT_CHAT_ENDPOINT, DEFAULT_TIMEOUT};
use crate::chunking::ChunkingConfig;
use crate::error::ConfigError;
use crate::models::SamplingParams;
use crate::prompt::TargetLanguage;
use crate::retriever::RetrievalConfig;
use url::Url;

pub const DEFAULT_ANSWER_MODEL: &str = "thedrummer/valkyrie-49b-v1";
pub const DEFAULT_TRANSLATION_MODEL: &str = "cohere/command-r-plus";

#[derive(Debug, Clone)]
pub struct GenerationConfig {
    pub answer_model: String,
    pub translation_model: String,
    pub sampling: SamplingParams,
    /// Paragraph translations in flight at once; 1 translates sequentially.
    pub translation_concurrency: usize,
    pub language: TargetLanguage,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            answer_model: DEFAULT_ANSWER_MODEL.to_string(),
            translation_model: DEFAULT_TRANSLATION_MODEL.to_string(),
            sampling: SamplingParams::default(),
            translation_concurrency: 1,
            language: TargetLanguage::odia(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AssistantConfig {
    pub chunking: ChunkingConfig,
    pub retrieval: RetrievalConfig,
    pub generation: GenerationConfig,
    pub endpoint: EndpointConfig,
}

impl AssistantConfig {
    pub fn new(api_key: ApiKey) -> Result<Self, ConfigError> {
        Ok(Self {
            chunking: ChunkingConfig::default(),
            retrieval: RetrievalConfig::default(),
            generation: GenerationConfig::default(),
            endpoint: EndpointConfig {
                chat_endpoint: Url::parse(DEFAULT_CHAT_ENDPOINT)?,
                api_key,
                timeout: DEFAULT_TIMEOUT,
                max_retries: 0,
            },
        })
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.chunking.validate()?;

        if self.retrieval.top_k == 0 {
            return Err(ConfigError::Invalid("top_k must be at least 1".to_string()));
        }
        if !(-1.0..=1.0).contains(&self.retrieval.min_similarity) {
            return Err(ConfigError::Invalid(format!(
                "min_similarity {} is outside [-1, 1]",
                self.retrieval.min_similarity
            )));
        }
        if self.retrieval.context_char_budget == Some(0) {
            return Err(ConfigError::Invalid(
                "context_char_budget must be positive when set".to_string(),
            ));
        }
        if self.generation.translation_concurrency == 0 {
            return Err(ConfigError::Invalid(
                "translation_concurrency must be at least 1".to_string(),
            ));
        }
        if self.generation.answer_model.trim().is_empty()
            || self.generation.translation_model.trim().is_empty()
        {
            return Err(ConfigError::Invalid("model identifiers must not be empty".to_string()));
        }
        if self.endpoint.timeout.is_zero() {
            return Err(ConfigError::Invalid("timeout must be positive".to_string()));
        }
        Ok(())
    }
}
