use std::{fmt, sync::LazyLock};

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::VideoIdError;

static URL_VIDEO_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[?&]v=([\w-]{11})").expect("valid video id regex"));

static BARE_VIDEO_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[\w-]{11}$").expect("valid video id regex"));

/// Opaque video identifier. Only the URL extraction cares about its shape.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VideoId(String);

impl VideoId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Pull the `v=` query parameter out of a watch URL.
    pub fn from_url(url: &str) -> Option<Self> {
        URL_VIDEO_ID
            .captures(url)
            .and_then(|caps| caps.get(1))
            .map(|m| Self(m.as_str().to_string()))
    }

    /// Accept either a watch URL or a bare 11-character id.
    pub fn parse(input: &str) -> Result<Self, VideoIdError> {
        let input = input.trim();
        if let Some(id) = Self::from_url(input) {
            return Ok(id);
        }
        if BARE_VIDEO_ID.is_match(input) {
            return Ok(Self(input.to_string()));
        }
        Err(VideoIdError {
            input: input.to_string(),
        })
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for VideoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for VideoId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// One caption stream advertised by the player configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CaptionTrack {
    #[serde(default)]
    pub language_code: String,
    /// Absent for human-authored captions, `"asr"` for auto-generated ones.
    #[serde(default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub base_url: String,
}

impl CaptionTrack {
    pub fn is_manual(&self) -> bool {
        self.kind.as_deref().is_none_or(str::is_empty)
    }
}
