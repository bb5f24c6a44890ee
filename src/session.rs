//! UI-side client of the tokenization worker.
//!
//! The session owns the worker handle and the token cache for one diff view.
//! Rendering asks it for a row's spans; it answers synchronously from the
//! cache or with an unstyled fallback, and requests tokenization for visible
//! rows in the background. `poll` folds worker responses back into the cache.
//!
//! Stale responses are detected with a per-row generation counter: each new
//! request for a row bumps the row's generation, and a response is only used
//! if it carries the row's current generation and the row is still inside
//! the visible window.

use crate::highlighting::HighlighterOptions;
use crate::models::TokenSpan;
use crate::token_cache::TokenCache;
use crate::worker::{RequestId, WorkerHandle, WorkerRequest, WorkerResponse};
use std::collections::HashMap;
use std::fmt;
use std::ops::Range;
use std::sync::mpsc::TryRecvError;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Lifecycle of the tokenization worker as seen from the UI thread.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkerState {
    Uninitialized,
    Initializing,
    Ready,
    Failed(String),
}

impl fmt::Display for WorkerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WorkerState::Uninitialized => write!(f, "off"),
            WorkerState::Initializing => write!(f, "loading"),
            WorkerState::Ready => write!(f, "ready"),
            WorkerState::Failed(message) => write!(f, "failed: {message}"),
        }
    }
}

#[derive(Debug)]
struct PendingRequest {
    row: usize,
    generation: u64,
    content: String,
    language: String,
}

#[derive(Debug, Default)]
struct RowSlot {
    generation: u64,
    in_flight: Option<RequestId>,
}

pub struct HighlightSession {
    worker: Option<WorkerHandle>,
    state: WorkerState,
    cache: TokenCache,
    next_id: RequestId,
    rows: HashMap<usize, RowSlot>,
    pending: HashMap<RequestId, PendingRequest>,
    /// Requests issued before the worker signalled ready
    queued: Vec<WorkerRequest>,
    visible: Range<usize>,
}

impl HighlightSession {
    pub fn new(cache_capacity: usize) -> Self {
        HighlightSession {
            worker: None,
            state: WorkerState::Uninitialized,
            cache: TokenCache::new(cache_capacity),
            next_id: 0,
            rows: HashMap::new(),
            pending: HashMap::new(),
            queued: Vec::new(),
            visible: 0..0,
        }
    }

    /// Spawn the worker. Only valid once, from `Uninitialized`.
    pub fn start(&mut self, options: HighlighterOptions) {
        if self.state != WorkerState::Uninitialized {
            return;
        }
        match WorkerHandle::spawn(options) {
            Ok(worker) => self.attach(worker),
            Err(err) => self.fail(format!("failed to spawn syntax worker: {err}")),
        }
    }

    /// Replace the worker (e.g. after a theme change). Cached spans carry the
    /// old colors, so the cache is emptied as well.
    pub fn restart(&mut self, options: HighlighterOptions) {
        self.worker = None;
        self.state = WorkerState::Uninitialized;
        if !self.cache.is_empty() {
            debug!(dropped = self.cache.len(), capacity = self.cache.capacity(), "clearing token cache");
        }
        self.cache.clear();
        self.reset_rows();
        self.start(options);
    }

    fn attach(&mut self, worker: WorkerHandle) {
        self.worker = Some(worker);
        self.state = WorkerState::Initializing;
        debug!("highlight session initializing");
    }

    pub fn state(&self) -> &WorkerState {
        &self.state
    }

    pub fn cache_len(&self) -> usize {
        self.cache.len()
    }

    /// Record the rows currently materialized by the viewport.
    pub fn set_visible_range(&mut self, range: Range<usize>) {
        self.visible = range;
        if self.state == WorkerState::Initializing {
            self.prune_queue();
        }
    }

    /// Drop queued requests whose rows left the window or were re-requested.
    fn prune_queue(&mut self) {
        let before = self.queued.len();
        let mut dropped = Vec::new();
        self.queued.retain(|request| {
            let WorkerRequest::Tokenize { id, .. } = request else {
                return true;
            };
            let wanted = self.pending.get(id).is_some_and(|p| {
                self.visible.contains(&p.row)
                    && self.rows.get(&p.row).is_some_and(|slot| slot.in_flight == Some(*id))
            });
            if !wanted {
                dropped.push(*id);
            }
            wanted
        });

        for id in dropped {
            let Some(pending) = self.pending.remove(&id) else {
                continue;
            };
            if let Some(slot) = self.rows.get_mut(&pending.row) {
                if slot.in_flight == Some(id) {
                    slot.in_flight = None;
                }
            }
        }
        if self.queued.len() < before {
            debug!(dropped = before - self.queued.len(), kept = self.queued.len(), "pruned queued requests");
        }
    }

    /// Forget every row's request state. Called when the row sequence is
    /// regenerated; responses still in flight are dropped on arrival.
    pub fn reset_rows(&mut self) {
        self.rows.clear();
        self.pending.clear();
        self.queued.clear();
    }

    /// Spans for a row, never blocking on the worker.
    ///
    /// Returns cached spans when available, otherwise a single unstyled span
    /// and (for rows inside the visible window) a background request.
    pub fn tokens_for_row(&mut self, row: usize, content: &str, language: Option<&str>) -> Arc<[TokenSpan]> {
        let Some(language) = language else {
            return plain(content);
        };
        if let Some(tokens) = self.cache.get(content, language) {
            return tokens;
        }
        if self.accepts_requests() && self.visible.contains(&row) && !self.has_request(row, content, language) {
            self.request(row, content, language);
        }
        plain(content)
    }

    fn accepts_requests(&self) -> bool {
        matches!(self.state, WorkerState::Initializing | WorkerState::Ready)
    }

    fn has_request(&self, row: usize, content: &str, language: &str) -> bool {
        self.rows
            .get(&row)
            .and_then(|slot| slot.in_flight)
            .and_then(|id| self.pending.get(&id))
            .is_some_and(|p| p.content == content && p.language == language)
    }

    fn request(&mut self, row: usize, content: &str, language: &str) {
        let id = self.next_id;
        self.next_id += 1;

        let slot = self.rows.entry(row).or_default();
        slot.generation += 1;
        slot.in_flight = Some(id);
        let generation = slot.generation;

        self.pending.insert(
            id,
            PendingRequest {
                row,
                generation,
                content: content.to_string(),
                language: language.to_string(),
            },
        );

        let request = WorkerRequest::Tokenize {
            id,
            content: content.to_string(),
            language: language.to_string(),
        };
        if self.state == WorkerState::Ready {
            self.dispatch(request);
        } else {
            self.queued.push(request);
        }
    }

    fn dispatch(&mut self, request: WorkerRequest) {
        let sent = self.worker.as_ref().is_some_and(|w| w.send(request));
        if !sent {
            self.fail("syntax worker disconnected".to_string());
        }
    }

    fn fail(&mut self, message: String) {
        warn!(%message, "syntax highlighting disabled");
        self.state = WorkerState::Failed(message);
        self.pending.clear();
        self.queued.clear();
        for slot in self.rows.values_mut() {
            slot.in_flight = None;
        }
    }

    /// Drain worker messages without blocking. Returns true when the screen
    /// should be redrawn.
    pub fn poll(&mut self) -> bool {
        let mut redraw = false;
        loop {
            let response = match self.worker.as_ref().map(|w| w.try_recv()) {
                None | Some(Err(TryRecvError::Empty)) => break,
                Some(Err(TryRecvError::Disconnected)) => {
                    self.worker = None;
                    if !matches!(self.state, WorkerState::Failed(_)) {
                        self.fail("syntax worker disconnected".to_string());
                        redraw = true;
                    }
                    break;
                }
                Some(Ok(response)) => response,
            };
            redraw |= self.handle_response(response);
        }
        redraw
    }

    fn handle_response(&mut self, response: WorkerResponse) -> bool {
        match response {
            WorkerResponse::Ready => {
                if self.state != WorkerState::Initializing {
                    return false;
                }
                self.prune_queue();
                info!(queued = self.queued.len(), "syntax worker ready");
                self.state = WorkerState::Ready;
                for request in std::mem::take(&mut self.queued) {
                    self.dispatch(request);
                }
                true
            }
            WorkerResponse::Error { id: None, message } => {
                self.fail(message);
                true
            }
            WorkerResponse::Tokens { id, tokens } => self.complete(id, Arc::from(tokens)),
            WorkerResponse::Error { id: Some(id), message } => {
                debug!(id, %message, "tokenize failed, using plain text");
                let Some(content) = self.pending.get(&id).map(|p| p.content.clone()) else {
                    return false;
                };
                self.complete(id, plain(&content))
            }
        }
    }

    /// Apply a finished request if its row still wants it.
    fn complete(&mut self, id: RequestId, tokens: Arc<[TokenSpan]>) -> bool {
        let Some(pending) = self.pending.remove(&id) else {
            debug!(id, "dropping response for forgotten request");
            return false;
        };
        let Some(slot) = self.rows.get_mut(&pending.row) else {
            return false;
        };
        if slot.generation != pending.generation {
            debug!(id, row = pending.row, "dropping superseded response");
            return false;
        }
        slot.in_flight = None;
        if !self.visible.contains(&pending.row) {
            debug!(id, row = pending.row, "dropping response for row out of view");
            return false;
        }

        self.cache.put(&pending.content, &pending.language, tokens);
        true
    }
}

fn plain(content: &str) -> Arc<[TokenSpan]> {
    Arc::from(vec![TokenSpan::plain(content)])
}
