//! Bus protocol and serialization records shared by the core and its
//! collaborators.
//!
//! This module defines the notification payloads broadcast after structural
//! mutation, the request/response payloads exchanged with the search worker,
//! and the serialized shapes consumed by persistence and session restore.

use std::collections::BTreeMap;

use crate::item::{ItemId, MetadataValue};
use crate::playlist::PlaylistId;

/// Top-level envelope for all bus traffic.
#[derive(Debug, Clone)]
pub enum Message {
    Playlist(PlaylistMessage),
}

/// Playlist-domain notifications.
///
/// The core never renders; it only signals that state changed so views can
/// request a repaint or react to a playback request.
#[derive(Debug, Clone)]
pub enum PlaylistMessage {
    /// A playlist's sequence, items, or title changed.
    PlaylistChanged { playlist_id: PlaylistId },
    /// A playlist was destroyed and its items removed.
    PlaylistRemoved { playlist_id: PlaylistId },
    /// The cross-playlist queue overlay changed.
    QueueChanged,
    /// An item was chosen for playback.
    ItemDesired {
        playlist_id: PlaylistId,
        item_id: ItemId,
    },
}

/// Serialized shape of one item, as produced for persistence collaborators.
#[derive(Debug, Clone, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct ItemRecord {
    /// Stable item id.
    pub id: ItemId,
    /// Source url, immutable after creation.
    pub url: String,
    #[serde(default)]
    pub metadata: BTreeMap<String, MetadataValue>,
    #[serde(default)]
    pub hidden: bool,
    /// Queue assignment rank, 0 when not queued.
    #[serde(default)]
    pub queue_position: u64,
    #[serde(default)]
    pub extra_play_times: u32,
}

/// Serialized shape of one playlist, items in sequence order.
#[derive(Debug, Clone, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct PlaylistRecord {
    /// Stable playlist id.
    pub id: PlaylistId,
    /// User-visible title.
    pub title: String,
    #[serde(default)]
    pub items: Vec<ItemRecord>,
}

/// One queue overlay entry, serialized in FIFO assignment order.
#[derive(Debug, Clone, PartialEq, Eq, serde::Deserialize, serde::Serialize)]
pub struct QueueRecord {
    /// Playlist owning the queued item.
    pub playlist_id: PlaylistId,
    /// The queued item.
    pub item_id: ItemId,
}

/// Searchable projection of one item, copied at dispatch time.
///
/// The haystack holds the item's fallback display label followed by its
/// metadata values, already case-folded so the worker only does substring
/// scans.
#[derive(Debug, Clone)]
pub struct SnapshotEntry {
    pub item_id: ItemId,
    pub haystack: Vec<String>,
}

/// One filter computation request sent to the search worker.
#[derive(Debug, Clone)]
pub struct SearchRequest {
    /// Playlist the snapshot was taken from.
    pub playlist_id: PlaylistId,
    /// Monotonic per-session counter used to discard stale responses.
    pub generation: u64,
    /// Raw filter text as typed; tokenized by the worker.
    pub filter: String,
    /// Point-in-time copy of the playlist's item sequence.
    pub snapshot: Vec<SnapshotEntry>,
}

/// Result of one filter computation, ids in snapshot order.
#[derive(Debug, Clone)]
pub struct SearchResponse {
    pub playlist_id: PlaylistId,
    /// Generation copied verbatim from the request.
    pub generation: u64,
    /// Matching subset of the snapshot, original order preserved.
    pub matched: Vec<ItemId>,
}
