#![allow(dead_code)]

use std::sync::{
    Arc, Mutex,
    atomic::{AtomicUsize, Ordering},
};

use async_trait::async_trait;
use tokio::sync::Barrier;
use serde_json::{Value, json};
use ytldr_core::{
    Completer, ExtractionError, GenerationError, MemoryStore, SummaryCache, Summarizer,
    TranscriptSource, VideoId,
};

pub const VIDEO: &str = "abc12345678";

/// Minimal watch page embedding a player response with the given tracks.
pub fn watch_page(tracks: Value) -> String {
    let player_response = json!({
        "playabilityStatus": {"status": "OK"},
        "captions": {
            "playerCaptionsTracklistRenderer": {"captionTracks": tracks}
        },
        "videoDetails": {"videoId": VIDEO, "title": "Braces }; inside a title"}
    });
    format!(
        "<!DOCTYPE html><html><body><script nonce=\"x\">var ytInitialPlayerResponse = {player_response};var meta = document.createElement('meta');</script></body></html>"
    )
}

pub fn track(base_url: &str, lang: &str, kind: Option<&str>) -> Value {
    let mut track = json!({"baseUrl": base_url, "languageCode": lang, "isTranslatable": true});
    if let Some(kind) = kind {
        track["kind"] = json!(kind);
    }
    track
}

pub struct FakeCaptions {
    transcript: Option<String>,
    pub calls: AtomicUsize,
}

impl FakeCaptions {
    pub fn with(transcript: &str) -> Arc<Self> {
        Arc::new(Self {
            transcript: Some(transcript.to_string()),
            calls: AtomicUsize::new(0),
        })
    }

    pub fn missing() -> Arc<Self> {
        Arc::new(Self {
            transcript: None,
            calls: AtomicUsize::new(0),
        })
    }
}

#[async_trait]
impl TranscriptSource for FakeCaptions {
    async fn fetch_transcript(&self, _video_id: &VideoId) -> Result<String, ExtractionError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.transcript.clone().ok_or(ExtractionError::NoEnglishTrack)
    }
}

/// Answers `<think>..</think>summary N` for the Nth call, or fails.
pub struct FakeCompleter {
    fail: Option<GenerationError>,
    gate: Option<Barrier>,
    pub calls: AtomicUsize,
    pub seen: Mutex<Vec<(String, String)>>,
}

impl FakeCompleter {
    pub fn ok() -> Arc<Self> {
        Arc::new(Self {
            fail: None,
            gate: None,
            calls: AtomicUsize::new(0),
            seen: Mutex::new(Vec::new()),
        })
    }

    /// Holds every generation until `parties` of them are in progress.
    pub fn gated(parties: usize) -> Arc<Self> {
        Arc::new(Self {
            fail: None,
            gate: Some(Barrier::new(parties)),
            calls: AtomicUsize::new(0),
            seen: Mutex::new(Vec::new()),
        })
    }

    pub fn failing(err: GenerationError) -> Arc<Self> {
        Arc::new(Self {
            fail: Some(err),
            gate: None,
            calls: AtomicUsize::new(0),
            seen: Mutex::new(Vec::new()),
        })
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Completer for FakeCompleter {
    async fn generate(&self, model: &str, prompt: &str) -> Result<String, GenerationError> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        self.seen
            .lock()
            .unwrap()
            .push((model.to_string(), prompt.to_string()));
        if let Some(gate) = &self.gate {
            gate.wait().await;
        }
        match &self.fail {
            Some(err) => Err(err.clone()),
            None => Ok(format!("<think>\nreasoning {n}\n</think>\n  summary {n}  ")),
        }
    }

    async fn list_models(&self) -> Result<Vec<String>, GenerationError> {
        match &self.fail {
            Some(err) => Err(err.clone()),
            None => Ok(vec!["deepseek-r1".into(), "llama3.2:latest".into()]),
        }
    }
}

pub struct Harness {
    pub captions: Arc<FakeCaptions>,
    pub completer: Arc<FakeCompleter>,
    pub store: Arc<MemoryStore>,
    pub summarizer: Summarizer,
}

pub fn harness(captions: Arc<FakeCaptions>, completer: Arc<FakeCompleter>) -> Harness {
    let store = Arc::new(MemoryStore::new());
    let summarizer = Summarizer::new(
        captions.clone(),
        completer.clone(),
        SummaryCache::new(store.clone(), "deepseek-r1"),
        "deepseek-r1",
    );
    Harness {
        captions,
        completer,
        store,
        summarizer,
    }
}
