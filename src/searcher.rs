//! Off-thread playlist searcher.
//!
//! The worker receives snapshots copied at dispatch time and never touches
//! live playlist state. Requests and responses travel over ordered channels,
//! so a session's responses arrive in request order and the generation
//! equality check on the interactive side is sufficient to discard stale
//! ones. There is no cancellation: a superseded computation runs to
//! completion and its late emission becomes a no-op.

use std::thread;

use log::{debug, trace};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

use crate::item::Item;
use crate::playlist::Playlist;
use crate::protocol::{SearchRequest, SearchResponse, SnapshotEntry};

/// Splits filter text into case-folded, non-empty needles.
pub fn text_to_needles(text: &str) -> Vec<String> {
    text.split_whitespace()
        .filter(|needle| !needle.is_empty())
        .map(|needle| needle.to_lowercase())
        .collect()
}

/// Conjunctive match: every needle must be a substring of at least one
/// haystack field. An empty needle set matches everything.
fn haystack_matches(haystack: &[String], needles: &[String]) -> bool {
    needles
        .iter()
        .all(|needle| haystack.iter().any(|field| field.contains(needle)))
}

/// Live-item variant of the matching predicate, used by views that want to
/// decide whether a freshly imported item belongs in the current filtered
/// view without a worker round trip.
pub fn item_matches_filter(item: &Item, needles: &[String]) -> bool {
    if needles.is_empty() {
        return true;
    }
    let entry = snapshot_entry(item);
    haystack_matches(&entry.haystack, needles)
}

fn snapshot_entry(item: &Item) -> SnapshotEntry {
    let mut haystack = Vec::with_capacity(1 + item.metadata().len());
    haystack.push(item.to_display_string().to_lowercase());
    for value in item.metadata().values() {
        haystack.push(value.to_display_string().to_lowercase());
    }
    SnapshotEntry {
        item_id: item.id(),
        haystack,
    }
}

/// Copies a playlist's item sequence into a searchable snapshot. Taken on
/// the interactive thread at dispatch time; the worker sees only this copy.
pub fn capture_snapshot(playlist: &Playlist) -> Vec<SnapshotEntry> {
    playlist.iterate_items().map(snapshot_entry).collect()
}

/// Worker loop computing filter matches over dispatched snapshots.
pub struct PlaylistSearcher {
    request_rx: UnboundedReceiver<SearchRequest>,
    response_tx: UnboundedSender<SearchResponse>,
}

impl PlaylistSearcher {
    pub fn new(
        request_rx: UnboundedReceiver<SearchRequest>,
        response_tx: UnboundedSender<SearchResponse>,
    ) -> Self {
        Self {
            request_rx,
            response_tx,
        }
    }

    /// Runs until the request channel closes. Every request is answered,
    /// in order; staleness is the receiver's concern.
    pub fn run(&mut self) {
        while let Some(request) = self.request_rx.blocking_recv() {
            let needles = text_to_needles(&request.filter);
            let matched = request
                .snapshot
                .iter()
                .filter(|entry| haystack_matches(&entry.haystack, &needles))
                .map(|entry| entry.item_id)
                .collect::<Vec<_>>();
            trace!(
                "searcher: generation {} matched {}/{} items",
                request.generation,
                matched.len(),
                request.snapshot.len()
            );
            let _ = self.response_tx.send(SearchResponse {
                playlist_id: request.playlist_id,
                generation: request.generation,
                matched,
            });
        }
        debug!("searcher: request channel closed, worker exiting");
    }
}

/// Owning handle to one long-lived searcher thread. Created once per
/// playlist view; dropping it closes the request channel, which retires
/// the worker.
pub struct SearcherHandle {
    request_tx: Option<UnboundedSender<SearchRequest>>,
    response_rx: UnboundedReceiver<SearchResponse>,
    worker: Option<thread::JoinHandle<()>>,
}

impl SearcherHandle {
    pub fn spawn() -> Self {
        let (request_tx, request_rx) = mpsc::unbounded_channel();
        let (response_tx, response_rx) = mpsc::unbounded_channel();
        let worker = thread::Builder::new()
            .name("playlist-searcher".to_string())
            .spawn(move || PlaylistSearcher::new(request_rx, response_tx).run())
            .ok();
        debug_assert!(worker.is_some(), "failed to spawn searcher thread");
        Self {
            request_tx: Some(request_tx),
            response_rx,
            worker,
        }
    }

    /// Fire-and-forget dispatch; the interactive side never blocks on the
    /// worker.
    pub fn dispatch(&self, request: SearchRequest) {
        if let Some(request_tx) = &self.request_tx {
            let _ = request_tx.send(request);
        }
    }

    /// Non-blocking poll for the next response, in request order.
    pub fn try_recv(&mut self) -> Option<SearchResponse> {
        self.response_rx.try_recv().ok()
    }
}

impl Drop for SearcherHandle {
    fn drop(&mut self) {
        // Close the request channel first so the worker's recv loop ends,
        // then reap the thread.
        self.request_tx.take();
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
    }
}
