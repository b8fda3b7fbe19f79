//! Request/response boundary in front of the [`Summarizer`].
//!
//! Callers hold a cloneable [`SummaryHandle`] and get exactly one
//! [`Response`] per [`Request`]. Every request runs on its own task, so
//! requests for different videos proceed concurrently and identical requests
//! are not coalesced.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::{
    sync::{broadcast, mpsc, oneshot},
    task::JoinHandle,
};
use tracing::{Instrument, debug, info_span};
use uuid::Uuid;

use crate::{pipeline::Summarizer, types::VideoId};

const INBOX_CAPACITY: usize = 32;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum Request {
    #[serde(rename_all = "camelCase")]
    GenerateSummary {
        video_id: VideoId,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        model_id: Option<String>,
        #[serde(default)]
        bypass_cache: bool,
    },
    #[serde(rename_all = "camelCase")]
    GetSubtitles { video_id: VideoId },
    ListModels,
}

impl Request {
    pub fn action(&self) -> &'static str {
        match self {
            Request::GenerateSummary { .. } => "generateSummary",
            Request::GetSubtitles { .. } => "getSubtitles",
            Request::ListModels => "listModels",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Response {
    Summary { summary: String },
    Subtitles { subtitles: String },
    Models { models: Vec<String> },
    Error { error: String },
}

impl Response {
    pub fn error(message: impl Into<String>) -> Self {
        Response::Error {
            error: message.into(),
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Response::Error { .. })
    }
}

/// Wire wrapper that lets a caller correlate out-of-order responses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope<T> {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<serde_json::Value>,
    #[serde(flatten)]
    pub body: T,
}

/// Answer one request. Failures become [`Response::Error`].
pub async fn respond(summarizer: &Summarizer, request: Request) -> Response {
    match request {
        Request::GenerateSummary {
            video_id,
            model_id,
            bypass_cache,
        } => match summarizer
            .summarize(&video_id, model_id.as_deref(), bypass_cache)
            .await
        {
            Ok(summary) => Response::Summary { summary },
            Err(e) => Response::error(e.to_string()),
        },
        Request::GetSubtitles { video_id } => match summarizer.transcript(&video_id).await {
            Ok(subtitles) => Response::Subtitles { subtitles },
            Err(_) => Response::error("Failed to fetch subtitles."),
        },
        Request::ListModels => match summarizer.list_models().await {
            Ok(models) => Response::Models { models },
            Err(e) => Response::error(e.to_string()),
        },
    }
}

struct Job {
    request: Request,
    reply: oneshot::Sender<Response>,
}

#[derive(Clone)]
pub struct SummaryHandle {
    tx: mpsc::Sender<Job>,
}

impl SummaryHandle {
    pub async fn request(&self, request: Request) -> Response {
        let (reply, rx) = oneshot::channel();
        if self.tx.send(Job { request, reply }).await.is_err() {
            return Response::error("summary service is not running");
        }
        rx.await
            .unwrap_or_else(|_| Response::error("summary service dropped the request"))
    }
}

pub struct SummaryService;

impl SummaryService {
    /// Start the dispatch loop. It stops when `shutdown` fires or every
    /// handle is dropped; requests already dispatched still complete.
    pub fn spawn(
        summarizer: Arc<Summarizer>,
        shutdown: broadcast::Receiver<()>,
    ) -> (SummaryHandle, JoinHandle<()>) {
        let (tx, rx) = mpsc::channel(INBOX_CAPACITY);
        let task = tokio::spawn(Self::run(summarizer, rx, shutdown));
        (SummaryHandle { tx }, task)
    }

    async fn run(
        summarizer: Arc<Summarizer>,
        mut inbox: mpsc::Receiver<Job>,
        mut shutdown: broadcast::Receiver<()>,
    ) {
        loop {
            tokio::select! {
                _ = shutdown.recv() => {
                    debug!("summary service shutting down");
                    return;
                }
                job = inbox.recv() => match job {
                    Some(Job { request, reply }) => {
                        let summarizer = Arc::clone(&summarizer);
                        let span = info_span!(
                            "request",
                            request_id = %Uuid::new_v4(),
                            action = request.action(),
                        );
                        tokio::spawn(
                            async move {
                                let response = respond(&summarizer, request).await;
                                if reply.send(response).is_err() {
                                    debug!("requester went away before the response");
                                }
                            }
                            .instrument(span),
                        );
                    }
                    None => return,
                },
            }
        }
    }
}
