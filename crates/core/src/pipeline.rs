use std::sync::Arc;

use tracing::{error, info, instrument};

use crate::{
    cache::{JsonFileStore, SummaryCache, SummaryStore},
    captions::{TranscriptSource, YoutubeCaptions},
    completion::{Completer, OllamaClient},
    config::Config,
    error::{ConfigError, ExtractionError, GenerationError, PipelineError},
    normalize::clean_summary,
    types::VideoId,
};

static SUMMARY_PROMPT: &str = r#"
You are a youtube video summarization assistant.
Your task is to generate a concise summary of the provided YouTube video based on subtitles.
The summary should be clear, informative, and capture the main points of the video.
Add timestamps to the summary in the format [hh:mm:ss] for each key point.
The summary should be in English and should not include any personal opinions or interpretations.
Summary should be in a single paragraph 5-10 sentences long, maybe with bulleted points if appropriate.
Do NOT include any <think> or other XML-like thinking process tags in your final output. Only provide the summary text.
Here is the transcript:
"#;

/// Instructions followed by the transcript, verbatim.
pub fn build_prompt(transcript: &str) -> String {
    format!("{SUMMARY_PROMPT}{transcript}\n")
}

/// Cache, captions, completion and cleanup wired into one call.
pub struct Summarizer {
    captions: Arc<dyn TranscriptSource>,
    completer: Arc<dyn Completer>,
    cache: SummaryCache,
    default_model: String,
}

impl Summarizer {
    pub fn new(
        captions: Arc<dyn TranscriptSource>,
        completer: Arc<dyn Completer>,
        cache: SummaryCache,
        default_model: impl Into<String>,
    ) -> Self {
        Self {
            captions,
            completer,
            cache,
            default_model: default_model.into(),
        }
    }

    /// Production wiring: scraped captions, Ollama, and a JSON file cache at
    /// the configured path.
    pub fn from_config(config: &Config) -> Result<Self, ConfigError> {
        Self::with_store(
            config,
            Arc::new(JsonFileStore::new(config.cache_path().clone())),
        )
    }

    pub fn with_store(config: &Config, store: Arc<dyn SummaryStore>) -> Result<Self, ConfigError> {
        let http = reqwest::Client::builder()
            .build()
            .map_err(|e| ConfigError::HttpClient(e.to_string()))?;
        let cache = SummaryCache::new(store, config.default_model());
        Ok(Self::with_cache(config, http, cache))
    }

    /// Production captions and completion around a caller-chosen cache.
    pub fn with_cache(config: &Config, http: reqwest::Client, cache: SummaryCache) -> Self {
        Self::new(
            Arc::new(YoutubeCaptions::from_config(http.clone(), config)),
            Arc::new(OllamaClient::from_config(http, config)),
            cache,
            config.default_model(),
        )
    }

    pub fn cache(&self) -> &SummaryCache {
        &self.cache
    }

    pub fn default_model(&self) -> &str {
        &self.default_model
    }

    fn model_name<'a>(&'a self, model: Option<&'a str>) -> &'a str {
        model
            .filter(|m| !m.is_empty())
            .unwrap_or(&self.default_model)
    }

    pub async fn transcript(&self, video_id: &VideoId) -> Result<String, ExtractionError> {
        self.captions.fetch_transcript(video_id).await
    }

    pub async fn list_models(&self) -> Result<Vec<String>, GenerationError> {
        self.completer.list_models().await
    }

    /// Summarize a video, serving from the cache unless `bypass_cache` is set.
    ///
    /// Only successful summaries are cached; a bypassed call always
    /// regenerates and overwrites the cached entry.
    /// An empty model id counts as absent.
    #[instrument(
        skip_all,
        fields(video_id = %video_id, model = self.model_name(model), bypass_cache = bypass_cache)
    )]
    pub async fn summarize(
        &self,
        video_id: &VideoId,
        model: Option<&str>,
        bypass_cache: bool,
    ) -> Result<String, PipelineError> {
        if bypass_cache {
            info!("bypassing cache");
        } else if let Some(summary) = self.cache.get(video_id, model).await {
            return Ok(summary);
        }

        let transcript = self.captions.fetch_transcript(video_id).await.map_err(|e| {
            error!(error = %e, "no transcript available");
            PipelineError::from(e)
        })?;

        let prompt = build_prompt(&transcript);
        let raw = self
            .completer
            .generate(self.model_name(model), &prompt)
            .await?;

        let summary = clean_summary(&raw);
        self.cache.put(video_id, model, &summary).await;
        info!(chars = summary.len(), "summary generated");

        Ok(summary)
    }
}
