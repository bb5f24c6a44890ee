//! Tokenization worker: a dedicated thread that owns the tokenizer and
//! answers requests over a channel pair.
//!
//! Lifecycle: the thread loads grammars and theme right after it is spawned,
//! then posts an unsolicited `Ready` (or an `Error` with no id on failure).
//! Each tokenize request is answered independently and may be answered out of
//! order relative to other requests; callers correlate by id.

use crate::highlighting::{HighlighterOptions, Tokenizer};
use crate::models::TokenSpan;
use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};
use std::sync::Arc;
use std::thread;
use tracing::{debug, info, warn};

pub type RequestId = u64;

#[derive(Debug, Clone, PartialEq)]
pub enum WorkerRequest {
    Tokenize {
        id: RequestId,
        content: String,
        language: String,
    },
    Shutdown,
}

#[derive(Debug, Clone, PartialEq)]
pub enum WorkerResponse {
    /// Setup finished; tokenize requests are now answered
    Ready,
    /// Spans whose concatenated content equals the request content. An
    /// unloaded language yields a single unstyled span.
    Tokens { id: RequestId, tokens: Vec<TokenSpan> },
    /// `id` is `None` when setup itself failed
    Error { id: Option<RequestId>, message: String },
}

/// Owning handle to the worker thread.
///
/// Dropping it raises the stop flag and detaches the thread without joining:
/// the worker skips whatever is still queued and exits at its next check.
pub struct WorkerHandle {
    requests: Sender<WorkerRequest>,
    responses: Receiver<WorkerResponse>,
    stop: Arc<AtomicBool>,
}

impl WorkerHandle {
    /// Spawn the worker; initialization starts immediately on the new thread.
    pub fn spawn(options: HighlighterOptions) -> io::Result<Self> {
        let (request_tx, request_rx) = mpsc::channel();
        let (response_tx, response_rx) = mpsc::channel();
        let stop = Arc::new(AtomicBool::new(false));

        let worker_stop = Arc::clone(&stop);
        thread::Builder::new()
            .name("syntax-worker".to_string())
            .spawn(move || run(options, request_rx, response_tx, &worker_stop))?;

        Ok(WorkerHandle {
            requests: request_tx,
            responses: response_rx,
            stop,
        })
    }

    /// Send a request. Returns false if the worker thread is gone.
    pub fn send(&self, request: WorkerRequest) -> bool {
        self.requests.send(request).is_ok()
    }

    /// Next pending response without blocking.
    pub fn try_recv(&self) -> Result<WorkerResponse, TryRecvError> {
        self.responses.try_recv()
    }

    /// Handle with no thread behind it; the test drives the other channel ends.
    #[cfg(test)]
    pub fn detached() -> (Self, Receiver<WorkerRequest>, Sender<WorkerResponse>) {
        let (request_tx, request_rx) = mpsc::channel();
        let (response_tx, response_rx) = mpsc::channel();
        let handle = WorkerHandle {
            requests: request_tx,
            responses: response_rx,
            stop: Arc::new(AtomicBool::new(false)),
        };
        (handle, request_rx, response_tx)
    }

    #[cfg(test)]
    pub fn recv_timeout(
        &self,
        timeout: std::time::Duration,
    ) -> Result<WorkerResponse, mpsc::RecvTimeoutError> {
        self.responses.recv_timeout(timeout)
    }
}

impl Drop for WorkerHandle {
    fn drop(&mut self) {
        self.stop.store(true, Ordering::Release);
        // Wakes a worker blocked on an empty queue
        let _ = self.requests.send(WorkerRequest::Shutdown);
    }
}

fn run(
    options: HighlighterOptions,
    requests: Receiver<WorkerRequest>,
    responses: Sender<WorkerResponse>,
    stop: &AtomicBool,
) {
    let stopped = || stop.load(Ordering::Acquire);
    if stopped() {
        debug!("syntax worker stopped before initializing");
        return;
    }

    debug!(?options, "syntax worker initializing");
    let tokenizer = match Tokenizer::load(&options) {
        Ok(tokenizer) => {
            info!("syntax worker ready");
            let _ = responses.send(WorkerResponse::Ready);
            Some(tokenizer)
        }
        Err(err) => {
            warn!(error = %err, "syntax worker failed to initialize");
            let _ = responses.send(WorkerResponse::Error {
                id: None,
                message: err.to_string(),
            });
            None
        }
    };

    for request in requests {
        if stopped() {
            break;
        }
        let response = match request {
            WorkerRequest::Shutdown => break,
            WorkerRequest::Tokenize { id, content, language } => {
                tokenize(tokenizer.as_ref(), id, &content, &language)
            }
        };
        if responses.send(response).is_err() {
            break;
        }
    }
    debug!("syntax worker stopped");
}

fn tokenize(tokenizer: Option<&Tokenizer>, id: RequestId, content: &str, language: &str) -> WorkerResponse {
    let Some(tokenizer) = tokenizer else {
        return WorkerResponse::Error {
            id: Some(id),
            message: "Highlighter not initialized".to_string(),
        };
    };

    if !tokenizer.is_loaded(language) {
        debug!(id, language, "no grammar loaded, returning plain text");
        return WorkerResponse::Tokens {
            id,
            tokens: vec![TokenSpan::plain(content)],
        };
    }

    match tokenizer.tokenize(content, language) {
        Ok(tokens) => WorkerResponse::Tokens { id, tokens },
        Err(err) => WorkerResponse::Error {
            id: Some(id),
            message: err.to_string(),
        },
    }
}
