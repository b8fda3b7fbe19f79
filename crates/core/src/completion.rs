use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, instrument};

use crate::{
    config::{Config, strip_trailing_slash},
    error::GenerationError,
};

/// Anything that turns a prompt into generated text.
#[async_trait]
pub trait Completer: Send + Sync {
    async fn generate(&self, model: &str, prompt: &str) -> Result<String, GenerationError>;

    /// Models the backend can serve.
    async fn list_models(&self) -> Result<Vec<String>, GenerationError>;
}

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    response: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct TagsResponse {
    #[serde(default)]
    models: Vec<ModelTag>,
}

#[derive(Debug, Deserialize)]
struct ModelTag {
    name: String,
}

/// Client for a local Ollama server.
pub struct OllamaClient {
    http: reqwest::Client,
    base_url: String,
}

impl OllamaClient {
    pub fn new(http: reqwest::Client, base_url: &str) -> Self {
        Self {
            http,
            base_url: strip_trailing_slash(base_url),
        }
    }

    pub fn from_config(http: reqwest::Client, config: &Config) -> Self {
        Self::new(http, config.ollama_base_url())
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn generate_url(&self) -> String {
        format!("{}/api/generate", self.base_url)
    }

    pub fn tags_url(&self) -> String {
        format!("{}/api/tags", self.base_url)
    }
}

#[async_trait]
impl Completer for OllamaClient {
    #[instrument(skip_all, fields(model = model, prompt_chars = prompt.len()))]
    async fn generate(&self, model: &str, prompt: &str) -> Result<String, GenerationError> {
        let response = self
            .http
            .post(self.generate_url())
            .json(&GenerateRequest {
                model,
                prompt,
                stream: false,
            })
            .send()
            .await
            .map_err(|e| {
                error!(error = %e, "generation request failed");
                transport(e)
            })?;
        let response = ensure_success(response).await?;

        let body: GenerateResponse = response.json().await.map_err(transport)?;
        debug!("generation succeeded");

        // A missing or non-string `response` is an empty completion, not a failure.
        Ok(body.response.as_str().unwrap_or_default().to_string())
    }

    async fn list_models(&self) -> Result<Vec<String>, GenerationError> {
        let response = self
            .http
            .get(self.tags_url())
            .send()
            .await
            .map_err(transport)?;
        let response = ensure_success(response).await?;

        let tags: TagsResponse = response.json().await.map_err(transport)?;
        Ok(tags.models.into_iter().map(|m| m.name).collect())
    }
}

fn transport(e: reqwest::Error) -> GenerationError {
    GenerationError::Transport(e.to_string())
}

/// Turn a non-success response into [`GenerationError::Status`], carrying the
/// body text or, when that is unreadable, the status phrase.
async fn ensure_success(response: reqwest::Response) -> Result<reqwest::Response, GenerationError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = match response.text().await {
        Ok(body) => body,
        Err(_) => status.canonical_reason().unwrap_or_default().to_string(),
    };
    error!(status = status.as_u16(), %body, "Ollama API error");

    Err(GenerationError::Status {
        status: status.as_u16(),
        body,
    })
}
