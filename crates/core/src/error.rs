use thiserror::Error;

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("pdf parse error: {0}")]
    PdfParse(String),

    #[error("regex error: {0}")]
    RegexError(#[from] regex::Error),

    #[error("invalid chunking config: {0}")]
    InvalidChunkConfig(String),
}

#[derive(Debug, Error)]
pub enum EmbeddingError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("embedding service returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("malformed embedding response: {0}")]
    MalformedResponse(String),

    #[error("embedding service returned {actual} vectors for {expected} inputs")]
    CountMismatch { expected: usize, actual: usize },
}

#[derive(Debug, Error)]
pub enum SearchError {
    #[error("embedding failed: {0}")]
    Embedding(#[from] EmbeddingError),

    #[error("vector dimension {actual} does not match index dimension {expected}")]
    DimensionMismatch { expected: usize, actual: usize },
}

#[derive(Debug, Error)]
pub enum ChatError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("chat request timed out")]
    Timeout,

    #[error("chat service returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("malformed chat response: {0}")]
    MalformedResponse(String),

    #[error("chat response had no content")]
    EmptyContent,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid configuration: {0}")]
    Invalid(String),

    #[error("invalid chunking config: {0}")]
    Chunking(#[from] IngestError),

    #[error("url parse error: {0}")]
    Url(#[from] url::ParseError),

    #[error("regex error: {0}")]
    Regex(#[from] regex::Error),
}

pub type Result<T, E = IngestError> = std::result::Result<T, E>;
