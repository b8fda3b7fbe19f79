use std::path::PathBuf;

use thiserror::Error;

/// Reasons a transcript could not be extracted for a video.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExtractionError {
    #[error("no player response found on the watch page")]
    NoPlayerResponse,

    #[error("no English caption track available")]
    NoEnglishTrack,

    #[error("every caption format produced an empty transcript")]
    NoTranscript,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GenerationError {
    #[error("Ollama API error {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Ollama request failed: {0}")]
    Transport(String),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PipelineError {
    #[error("no transcript available")]
    NoTranscript(#[source] ExtractionError),

    #[error(transparent)]
    Generation(#[from] GenerationError),
}

impl From<ExtractionError> for PipelineError {
    fn from(err: ExtractionError) -> Self {
        PipelineError::NoTranscript(err)
    }
}

#[derive(Error, Debug)]
pub enum CacheError {
    #[error("Cache IO error for {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Cache file {path} is not valid JSON: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{field} must not be empty")]
    Empty { field: &'static str },

    #[error("Failed to build HTTP client: {0}")]
    HttpClient(String),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("not a video URL or 11-character video id: {input}")]
pub struct VideoIdError {
    pub input: String,
}
