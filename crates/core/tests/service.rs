mod common;

use std::sync::Arc;

use common::{FakeCaptions, FakeCompleter, VIDEO, harness};
use pretty_assertions::assert_eq;
use tokio::sync::broadcast;
use ytldr_core::{GenerationError, Request, Response, SummaryService, SummaryStore, VideoId};

fn generate(video: &str, bypass_cache: bool) -> Request {
    Request::GenerateSummary {
        video_id: VideoId::new(video),
        model_id: None,
        bypass_cache,
    }
}

#[tokio::test]
async fn generate_summary_round_trip() {
    let h = harness(FakeCaptions::with("Hello world"), FakeCompleter::ok());
    let (_shutdown_tx, shutdown_rx) = broadcast::channel(1);
    let (handle, _task) = SummaryService::spawn(Arc::new(h.summarizer), shutdown_rx);

    let response = handle.request(generate(VIDEO, false)).await;
    assert_eq!(
        response,
        Response::Summary {
            summary: "summary 1".into()
        }
    );

    let cached = handle.request(generate(VIDEO, false)).await;
    assert_eq!(cached, response);
    assert_eq!(h.completer.call_count(), 1);
}

#[tokio::test]
async fn pipeline_failure_becomes_error_response() {
    let h = harness(FakeCaptions::missing(), FakeCompleter::ok());
    let (_shutdown_tx, shutdown_rx) = broadcast::channel(1);
    let (handle, _task) = SummaryService::spawn(Arc::new(h.summarizer), shutdown_rx);

    let response = handle.request(generate(VIDEO, false)).await;
    assert_eq!(response, Response::error("no transcript available"));
    assert!(response.is_error());
}

#[tokio::test]
async fn subtitles_request_returns_transcript() {
    let h = harness(FakeCaptions::with("Hello world"), FakeCompleter::ok());
    let (_shutdown_tx, shutdown_rx) = broadcast::channel(1);
    let (handle, _task) = SummaryService::spawn(Arc::new(h.summarizer), shutdown_rx);

    let response = handle
        .request(Request::GetSubtitles {
            video_id: VideoId::new(VIDEO),
        })
        .await;
    assert_eq!(
        response,
        Response::Subtitles {
            subtitles: "Hello world".into()
        }
    );
}

#[tokio::test]
async fn subtitles_failure_has_fixed_message() {
    let h = harness(FakeCaptions::missing(), FakeCompleter::ok());
    let (_shutdown_tx, shutdown_rx) = broadcast::channel(1);
    let (handle, _task) = SummaryService::spawn(Arc::new(h.summarizer), shutdown_rx);

    let response = handle
        .request(Request::GetSubtitles {
            video_id: VideoId::new(VIDEO),
        })
        .await;
    assert_eq!(response, Response::error("Failed to fetch subtitles."));
}

#[tokio::test]
async fn list_models_passes_through() {
    let h = harness(FakeCaptions::with("x"), FakeCompleter::ok());
    let (_shutdown_tx, shutdown_rx) = broadcast::channel(1);
    let (handle, _task) = SummaryService::spawn(Arc::new(h.summarizer), shutdown_rx);

    assert_eq!(
        handle.request(Request::ListModels).await,
        Response::Models {
            models: vec!["deepseek-r1".into(), "llama3.2:latest".into()]
        }
    );
}

#[tokio::test]
async fn list_models_failure_is_reported() {
    let h = harness(
        FakeCaptions::with("x"),
        FakeCompleter::failing(GenerationError::Transport("connection refused".into())),
    );
    let (_shutdown_tx, shutdown_rx) = broadcast::channel(1);
    let (handle, _task) = SummaryService::spawn(Arc::new(h.summarizer), shutdown_rx);

    assert_eq!(
        handle.request(Request::ListModels).await,
        Response::error("Ollama request failed: connection refused")
    );
}

#[tokio::test]
async fn concurrent_requests_each_get_an_answer() {
    let h = harness(FakeCaptions::with("text"), FakeCompleter::ok());
    let (_shutdown_tx, shutdown_rx) = broadcast::channel(1);
    let (handle, _task) = SummaryService::spawn(Arc::new(h.summarizer), shutdown_rx);

    let first = handle.clone();
    let second = handle.clone();
    let (a, b) = tokio::join!(
        first.request(generate("aaaaaaaaaaa", false)),
        second.request(generate("bbbbbbbbbbb", false)),
    );

    assert!(matches!(a, Response::Summary { .. }));
    assert!(matches!(b, Response::Summary { .. }));
    assert_ne!(a, b);
    assert_eq!(h.completer.call_count(), 2);
}

#[tokio::test]
async fn identical_concurrent_requests_both_generate() {
    let h = harness(FakeCaptions::with("text"), FakeCompleter::gated(2));
    let (_shutdown_tx, shutdown_rx) = broadcast::channel(1);
    let (handle, _task) = SummaryService::spawn(Arc::new(h.summarizer), shutdown_rx);

    let first = handle.clone();
    let second = handle.clone();
    let (a, b) = tokio::join!(
        first.request(generate(VIDEO, false)),
        second.request(generate(VIDEO, false)),
    );

    assert_eq!(h.completer.call_count(), 2);
    let fresh = ["summary 1", "summary 2"];
    for response in [&a, &b] {
        let Response::Summary { summary } = response else {
            panic!("expected a summary, got {response:?}");
        };
        assert!(fresh.contains(&summary.as_str()));
    }
    assert_ne!(a, b);

    let stored = h.store.get("abc12345678::deepseek-r1").await.unwrap().unwrap();
    assert!(fresh.contains(&stored.as_str()));
}

#[tokio::test]
async fn requests_after_shutdown_are_refused() {
    let h = harness(FakeCaptions::with("text"), FakeCompleter::ok());
    let (shutdown_tx, shutdown_rx) = broadcast::channel(1);
    let (handle, task) = SummaryService::spawn(Arc::new(h.summarizer), shutdown_rx);

    shutdown_tx.send(()).unwrap();
    task.await.unwrap();

    assert_eq!(
        handle.request(generate(VIDEO, false)).await,
        Response::error("summary service is not running")
    );
    assert_eq!(h.completer.call_count(), 0);
}
