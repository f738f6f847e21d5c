use crate::error::IngestError;
use regex::Regex;

pub const DEFAULT_CHUNK_SIZE: usize = 1_000;
pub const DEFAULT_CHUNK_OVERLAP: usize = 200;

/// Word-window chunking parameters. Both values are counted in words.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkingConfig {
    pub chunk_size: usize,
    pub overlap: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            overlap: DEFAULT_CHUNK_OVERLAP,
        }
    }
}

impl ChunkingConfig {
    pub fn validate(&self) -> Result<(), IngestError> {
        if self.chunk_size == 0 {
            return Err(IngestError::InvalidChunkConfig(
                "chunk_size must be greater than zero".to_string(),
            ));
        }
        if self.overlap >= self.chunk_size {
            return Err(IngestError::InvalidChunkConfig(format!(
                "overlap {} must be smaller than chunk_size {}",
                self.overlap, self.chunk_size
            )));
        }
        Ok(())
    }

    /// Number of words the window start advances by.
    pub fn step(&self) -> usize {
        self.chunk_size - self.overlap
    }
}

/// Splits words into overlapping windows of `chunk_size` words.
pub fn chunk_words(text: &str, config: ChunkingConfig) -> Result<Vec<String>, IngestError> {
    config.validate()?;
    let words = text.split_whitespace().collect::<Vec<_>>();
    Ok(word_windows(&words, config))
}

// Callers validate `config` first; a zero step would panic in `step_by`.
fn word_windows(words: &[&str], config: ChunkingConfig) -> Vec<String> {
    let mut chunks = Vec::new();

    for start in (0..words.len()).step_by(config.step()) {
        let end = (start + config.chunk_size).min(words.len());
        let chunk = words[start..end].join(" ");
        if !chunk.trim().is_empty() {
            chunks.push(chunk);
        }
    }

    chunks
}

pub struct TextChunker {
    config: ChunkingConfig,
    whitespace_re: Regex,
    disallowed_re: Regex,
}

impl TextChunker {
    pub fn new(config: ChunkingConfig) -> Result<Self, IngestError> {
        config.validate()?;
        Ok(Self {
            config,
            whitespace_re: Regex::new(r"\s+")?,
            disallowed_re: Regex::new(r"[^\w\s.,!?()\-]")?,
        })
    }

    pub fn config(&self) -> ChunkingConfig {
        self.config
    }

    /// Collapses whitespace runs and drops punctuation outside `. , ! ? ( ) -`.
    pub fn preprocess(&self, text: &str) -> String {
        let collapsed = self.whitespace_re.replace_all(text.trim(), " ");
        self.disallowed_re.replace_all(&collapsed, "").into_owned()
    }

    pub fn split(&self, raw_text: &str) -> Vec<String> {
        let cleaned = self.preprocess(raw_text);
        let words = cleaned.split_whitespace().collect::<Vec<_>>();
        word_windows(&words, self.config)
    }
}
