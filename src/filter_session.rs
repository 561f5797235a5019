//! Per-view filter session.
//!
//! A session tracks the live filter text for one playlist view, dispatches
//! generation-tagged search requests to its own worker, and applies only
//! the response matching the current generation. Older in-flight results
//! are discarded silently; that is the whole staleness protocol, there is
//! no cancellation.

use log::trace;

use crate::item::ItemId;
use crate::playlist::{Playlist, PlaylistId};
use crate::protocol::{SearchRequest, SearchResponse};
use crate::searcher::{capture_snapshot, SearcherHandle};

/// What happened to one incoming search response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyOutcome {
    /// The response matched the current generation and became the visible
    /// set.
    Applied,
    /// The response was superseded by a newer filter change.
    Stale,
    /// The response belongs to another playlist's session.
    Ignored,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SessionState {
    Idle,
    Pending(u64),
}

/// Filter state for one visible playlist view, with its own long-lived
/// search worker. Dropping the session retires the worker.
pub struct FilterSession {
    playlist_id: PlaylistId,
    searcher: SearcherHandle,
    filter_text: String,
    generation: u64,
    state: SessionState,
    visible: Option<Vec<ItemId>>,
}

impl FilterSession {
    pub fn new(playlist_id: PlaylistId) -> Self {
        Self {
            playlist_id,
            searcher: SearcherHandle::spawn(),
            filter_text: String::new(),
            generation: 0,
            state: SessionState::Idle,
            visible: None,
        }
    }

    pub fn playlist_id(&self) -> PlaylistId {
        self.playlist_id
    }

    pub fn filter_text(&self) -> &str {
        &self.filter_text
    }

    /// Monotonic counter bumped on every filter-text change.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn is_pending(&self) -> bool {
        matches!(self.state, SessionState::Pending(_))
    }

    /// The last applied visible set, in playlist snapshot order. `None`
    /// until a first result arrives (views show the full sequence then).
    pub fn visible(&self) -> Option<&[ItemId]> {
        self.visible.as_deref()
    }

    /// Stores new filter text and dispatches a search over a snapshot of
    /// `playlist` taken now. Setting the same text again is a no-op; the
    /// dispatch itself is fire-and-forget.
    pub fn set_filter(&mut self, text: &str, playlist: &Playlist) -> bool {
        debug_assert_eq!(
            playlist.id(),
            self.playlist_id,
            "session fed a snapshot from another playlist"
        );
        if text == self.filter_text {
            return false;
        }
        self.filter_text = text.to_string();
        self.generation += 1;
        self.state = SessionState::Pending(self.generation);
        trace!(
            "filter session {}: dispatching generation {} for {:?}",
            self.playlist_id,
            self.generation,
            text
        );
        self.searcher.dispatch(SearchRequest {
            playlist_id: self.playlist_id,
            generation: self.generation,
            filter: self.filter_text.clone(),
            snapshot: capture_snapshot(playlist),
        });
        true
    }

    /// Applies a search response if, and only if, its generation equals
    /// the session's current generation.
    pub fn on_result(&mut self, response: SearchResponse) -> ApplyOutcome {
        if response.playlist_id != self.playlist_id {
            return ApplyOutcome::Ignored;
        }
        if response.generation != self.generation {
            trace!(
                "filter session {}: discarding stale generation {} (current {})",
                self.playlist_id,
                response.generation,
                self.generation
            );
            return ApplyOutcome::Stale;
        }
        self.visible = Some(response.matched);
        self.state = SessionState::Idle;
        ApplyOutcome::Applied
    }

    /// Drains all ready responses from the worker. Returns true when the
    /// visible set was updated.
    pub fn poll_results(&mut self) -> bool {
        let mut applied = false;
        while let Some(response) = self.searcher.try_recv() {
            if self.on_result(response) == ApplyOutcome::Applied {
                applied = true;
            }
        }
        applied
    }
}
