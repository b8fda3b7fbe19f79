//! ytldr Core Library
//!
//! Pulls English captions for a video, asks a local Ollama model for a
//! timestamped summary, strips reasoning markup from the answer and caches it
//! per video and model.

pub mod cache;
pub mod captions;
pub mod completion;
pub mod config;
pub mod error;
pub mod normalize;
pub mod pipeline;
pub mod service;
pub mod types;

// Re-export commonly used items at crate root
pub use cache::{JsonFileStore, MemoryStore, SummaryCache, SummaryStore, cache_key};
pub use captions::{TranscriptSource, YoutubeCaptions, decode_segmented_json, decode_timed_text_xml};
pub use completion::{Completer, OllamaClient};
pub use config::{Config, DEFAULT_MODEL, DEFAULT_OLLAMA_URL};
pub use error::{
    CacheError, ConfigError, ExtractionError, GenerationError, PipelineError, VideoIdError,
};
pub use normalize::clean_summary;
pub use pipeline::{Summarizer, build_prompt};
pub use service::{Envelope, Request, Response, SummaryHandle, SummaryService};
pub use types::{CaptionTrack, VideoId};
