use async_trait::async_trait;
use tokio::sync::OnceCell;
use tracing::{debug, info, instrument, warn};

use crate::{
    captions::{
        decode::{decode_segmented_json, decode_timed_text_xml},
        track::{extract_player_response, select_track},
    },
    config::{Config, strip_trailing_slash},
    error::ExtractionError,
    types::{CaptionTrack, VideoId},
};

/// Anything that can turn a video id into a plain transcript.
#[async_trait]
pub trait TranscriptSource: Send + Sync {
    async fn fetch_transcript(&self, video_id: &VideoId) -> Result<String, ExtractionError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PayloadFormat {
    /// Whatever the track URL serves by default (timed-text XML).
    Default,
    /// The `fmt=srv3` override.
    Srv3,
}

impl PayloadFormat {
    fn url(self, base_url: &str) -> String {
        match self {
            PayloadFormat::Default => base_url.to_string(),
            PayloadFormat::Srv3 => {
                let sep = if base_url.contains('?') { '&' } else { '?' };
                format!("{base_url}{sep}fmt=srv3")
            }
        }
    }
}

struct DecodeStrategy {
    name: &'static str,
    format: PayloadFormat,
    decode: fn(&str) -> String,
}

/// Tried in order; the first non-empty transcript wins. The last entry
/// covers servers that ignore the srv3 override and keep sending XML.
const STRATEGIES: [DecodeStrategy; 3] = [
    DecodeStrategy {
        name: "timed-text xml",
        format: PayloadFormat::Default,
        decode: decode_timed_text_xml,
    },
    DecodeStrategy {
        name: "srv3 json",
        format: PayloadFormat::Srv3,
        decode: decode_segmented_json,
    },
    DecodeStrategy {
        name: "srv3 xml",
        format: PayloadFormat::Srv3,
        decode: decode_timed_text_xml,
    },
];

/// Scrapes captions from the watch page of a video.
pub struct YoutubeCaptions {
    http: reqwest::Client,
    watch_base_url: String,
}

impl YoutubeCaptions {
    pub fn new(http: reqwest::Client, watch_base_url: &str) -> Self {
        Self {
            http,
            watch_base_url: strip_trailing_slash(watch_base_url),
        }
    }

    pub fn from_config(http: reqwest::Client, config: &Config) -> Self {
        Self::new(http, config.watch_base_url())
    }

    pub fn watch_url(&self, video_id: &VideoId) -> String {
        format!("{}/watch?v={}", self.watch_base_url, video_id)
    }

    /// Locate the caption track the transcript will be read from.
    pub async fn find_track(&self, video_id: &VideoId) -> Result<CaptionTrack, ExtractionError> {
        let html = match self.fetch_text(&self.watch_url(video_id)).await {
            Ok(html) => html,
            Err(e) => {
                warn!(error = %e, "watch page fetch failed");
                return Err(ExtractionError::NoPlayerResponse);
            }
        };

        let player_response =
            extract_player_response(&html).ok_or(ExtractionError::NoPlayerResponse)?;
        let tracks = player_response.caption_tracks();
        debug!(tracks = tracks.len(), "caption tracks listed");

        select_track(tracks)
            .cloned()
            .ok_or(ExtractionError::NoEnglishTrack)
    }

    async fn fetch_text(&self, url: &str) -> Result<String, reqwest::Error> {
        self.http.get(url).send().await?.text().await
    }

    /// Payload body, or `None` when the fetch failed, returned a non-success
    /// status, or came back empty.
    async fn fetch_payload(&self, url: &str) -> Option<String> {
        let response = match self.http.get(url).send().await {
            Ok(response) => response,
            Err(e) => {
                warn!(url, error = %e, "caption fetch failed");
                return None;
            }
        };

        if !response.status().is_success() {
            warn!(url, status = %response.status(), "caption fetch returned an error status");
            return None;
        }

        match response.text().await {
            Ok(body) if !body.is_empty() => Some(body),
            Ok(_) => None,
            Err(e) => {
                warn!(url, error = %e, "caption body could not be read");
                None
            }
        }
    }
}

#[async_trait]
impl TranscriptSource for YoutubeCaptions {
    #[instrument(skip_all, fields(video_id = %video_id))]
    async fn fetch_transcript(&self, video_id: &VideoId) -> Result<String, ExtractionError> {
        let track = self.find_track(video_id).await?;
        debug!(kind = ?track.kind, "selected caption track");

        let default_payload = OnceCell::new();
        let srv3_payload = OnceCell::new();

        for strategy in &STRATEGIES {
            let cell: &OnceCell<Option<String>> = match strategy.format {
                PayloadFormat::Default => &default_payload,
                PayloadFormat::Srv3 => &srv3_payload,
            };
            let url = strategy.format.url(&track.base_url);
            let payload = cell.get_or_init(|| self.fetch_payload(&url)).await;

            let Some(payload) = payload else {
                continue;
            };

            let text = (strategy.decode)(payload);
            if !text.is_empty() {
                info!(strategy = strategy.name, chars = text.len(), "transcript extracted");
                return Ok(text);
            }
            debug!(strategy = strategy.name, "decoded to empty text");
        }

        warn!("all caption formats failed");
        Err(ExtractionError::NoTranscript)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn srv3_url_appends_format_override() {
        assert_eq!(
            PayloadFormat::Srv3.url("https://x.test/api/timedtext?v=abc&lang=en"),
            "https://x.test/api/timedtext?v=abc&lang=en&fmt=srv3"
        );
        assert_eq!(
            PayloadFormat::Srv3.url("https://x.test/captions"),
            "https://x.test/captions?fmt=srv3"
        );
        assert_eq!(
            PayloadFormat::Default.url("https://x.test/captions"),
            "https://x.test/captions"
        );
    }

    #[test]
    fn watch_url_uses_configured_host() {
        let captions = YoutubeCaptions::new(reqwest::Client::new(), "http://127.0.0.1:9000/");
        assert_eq!(
            captions.watch_url(&VideoId::new("abc12345678")),
            "http://127.0.0.1:9000/watch?v=abc12345678"
        );
    }

    #[test]
    fn strategies_run_xml_then_srv3() {
        let names: Vec<_> = STRATEGIES.iter().map(|s| s.name).collect();
        assert_eq!(names, ["timed-text xml", "srv3 json", "srv3 xml"]);
    }
}
