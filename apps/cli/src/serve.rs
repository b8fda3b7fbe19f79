//! JSON-lines front end for the summary service.
//!
//! One request object per stdin line, one response object per stdout line.
//! Responses are written as they complete, so callers correlate them by `id`.

use std::{future::Future, sync::Arc};

use anyhow::Result;
use serde_json::Value;
use tokio::{
    io::{AsyncBufRead, AsyncBufReadExt, AsyncWriteExt, BufReader},
    sync::{broadcast, mpsc},
    task::JoinSet,
};
use tracing::{debug, info, warn};
use ytldr_core::{Envelope, Request, Response, SummaryHandle, SummaryService, Summarizer};

pub async fn run(summarizer: Summarizer) -> Result<()> {
    let (shutdown_tx, shutdown_rx) = broadcast::channel::<()>(1);
    let (handle, service) = SummaryService::spawn(Arc::new(summarizer), shutdown_rx);

    let (out_tx, out_rx) = mpsc::unbounded_channel::<String>();
    let writer = tokio::spawn(write_lines(out_rx));

    info!("serving requests on stdin");
    let interrupt = async {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("interrupted");
        } else {
            std::future::pending::<()>().await;
        }
    };
    let served = serve_lines(BufReader::new(tokio::io::stdin()), &handle, out_tx, interrupt).await;

    let _ = shutdown_tx.send(());
    service.await?;
    writer.await??;
    served
}

/// Dispatch every line of `reader` until EOF or `interrupt`, then wait for
/// the requests already in flight. A line that is not UTF-8 is answered with
/// an error like any other malformed line.
async fn serve_lines<R>(
    mut reader: R,
    handle: &SummaryHandle,
    out_tx: mpsc::UnboundedSender<String>,
    interrupt: impl Future<Output = ()>,
) -> Result<()>
where
    R: AsyncBufRead + Unpin,
{
    tokio::pin!(interrupt);
    let mut in_flight = JoinSet::new();
    let mut buf = Vec::new();

    let result = loop {
        buf.clear();
        let read = tokio::select! {
            _ = &mut interrupt => break Ok(()),
            read = reader.read_until(b'\n', &mut buf) => read,
        };
        match read {
            Ok(0) => {
                debug!("stdin closed");
                break Ok(());
            }
            Ok(_) => {}
            Err(e) => break Err(e.into()),
        }

        let line = match String::from_utf8(std::mem::take(&mut buf)) {
            Ok(line) => line,
            Err(e) => {
                warn!(error = %e, "skipping line that is not UTF-8");
                let reply = Envelope {
                    id: None,
                    body: Response::error(format!("invalid UTF-8: {e}")),
                };
                send(&out_tx, render(&reply));
                continue;
            }
        };
        if line.trim().is_empty() {
            continue;
        }

        let handle = handle.clone();
        let out_tx = out_tx.clone();
        in_flight.spawn(async move {
            let reply = answer(&handle, &line).await;
            send(&out_tx, reply);
        });
    };

    while in_flight.join_next().await.is_some() {}
    result
}

fn send(out_tx: &mpsc::UnboundedSender<String>, line: String) {
    if out_tx.send(line).is_err() {
        warn!("stdout writer stopped");
    }
}

async fn write_lines(mut rx: mpsc::UnboundedReceiver<String>) -> Result<()> {
    let mut stdout = tokio::io::stdout();
    while let Some(line) = rx.recv().await {
        stdout.write_all(line.as_bytes()).await?;
        stdout.write_all(b"\n").await?;
        stdout.flush().await?;
    }
    Ok(())
}

/// Parse one line, dispatch it and render the response line.
async fn answer(handle: &SummaryHandle, line: &str) -> String {
    let reply = match parse(line) {
        Ok(Envelope { id, body }) => Envelope {
            id,
            body: handle.request(body).await,
        },
        Err(reply) => reply,
    };
    render(&reply)
}

fn render(reply: &Envelope<Response>) -> String {
    serde_json::to_string(reply)
        .unwrap_or_else(|e| format!(r#"{{"error":"failed to encode response: {e}"}}"#))
}

fn parse(line: &str) -> Result<Envelope<Request>, Envelope<Response>> {
    let value: Value = serde_json::from_str(line).map_err(|e| Envelope {
        id: None,
        body: Response::error(format!("invalid JSON: {e}")),
    })?;
    let id = value.get("id").cloned();
    serde_json::from_value(value).map_err(|e| Envelope {
        id,
        body: Response::error(format!("invalid request: {e}")),
    })
}
