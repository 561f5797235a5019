//! FIFO play-queue overlay.
//!
//! A `PlayQueue` ranks selected items in assignment order, independent of
//! any playlist's storage order. Ranks come from a monotonic counter and
//! are never renumbered, so removing an entry leaves the remaining ranks
//! untouched (contiguity is not an invariant, relative order is).
//!
//! The same type serves two scopes: every `Playlist` embeds one for its own
//! items, and `PlaylistCollection` owns the process-wide overlay layered
//! over all playlists.

use crate::item::ItemId;
use crate::playlist::PlaylistId;
use crate::protocol::QueueRecord;

/// One queued entry in FIFO assignment order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueueEntry {
    pub playlist_id: PlaylistId,
    pub item_id: ItemId,
    /// Assignment rank at enqueue time; display-worthy, never recomputed.
    pub rank: u64,
}

/// What a toggle did, so the caller can stamp or clear the item's
/// queue position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueueChange {
    Queued(u64),
    Unqueued,
}

/// Ordered overlay of queued items with monotonic rank assignment.
#[derive(Debug, Default)]
pub struct PlayQueue {
    entries: Vec<QueueEntry>,
    next_rank: u64,
}

impl PlayQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues `item_id` at the end of the current order, or unqueues it if
    /// already present. Toggling on always appends; toggling off never
    /// shifts the ranks of the remaining entries.
    pub fn toggle(&mut self, playlist_id: PlaylistId, item_id: ItemId) -> QueueChange {
        if let Some(position) = self.entries.iter().position(|entry| entry.item_id == item_id) {
            self.entries.remove(position);
            return QueueChange::Unqueued;
        }
        self.next_rank += 1;
        self.entries.push(QueueEntry {
            playlist_id,
            item_id,
            rank: self.next_rank,
        });
        QueueChange::Queued(self.next_rank)
    }

    /// Reattaches a restored entry with its previously assigned rank,
    /// keeping the counter ahead of every restored rank so later toggles
    /// stay strictly increasing. Callers feed entries in rank order.
    pub(crate) fn push_restored(&mut self, playlist_id: PlaylistId, item_id: ItemId, rank: u64) {
        debug_assert!(
            self.entries.last().map_or(true, |entry| entry.rank < rank),
            "restored queue ranks out of order"
        );
        self.entries.push(QueueEntry {
            playlist_id,
            item_id,
            rank,
        });
        self.next_rank = self.next_rank.max(rank);
    }

    /// Lowest-ranked entry without removing it.
    pub fn first(&self) -> Option<&QueueEntry> {
        self.entries.first()
    }

    /// Pops the lowest-ranked entry; empty result when nothing is queued.
    pub fn take_first(&mut self) -> Option<QueueEntry> {
        if self.entries.is_empty() {
            return None;
        }
        Some(self.entries.remove(0))
    }

    /// Prunes a removed item from the queue order.
    pub fn remove_item(&mut self, item_id: ItemId) -> bool {
        let before = self.entries.len();
        self.entries.retain(|entry| entry.item_id != item_id);
        before != self.entries.len()
    }

    /// Prunes every entry owned by `playlist_id`.
    pub fn remove_playlist(&mut self, playlist_id: PlaylistId) -> bool {
        let before = self.entries.len();
        self.entries.retain(|entry| entry.playlist_id != playlist_id);
        before != self.entries.len()
    }

    pub fn contains(&self, item_id: ItemId) -> bool {
        self.entries.iter().any(|entry| entry.item_id == item_id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &QueueEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Serialized shape: (playlist, item) pairs in FIFO assignment order.
    /// Ranks are not serialized; order carries the same information.
    pub fn to_records(&self) -> Vec<QueueRecord> {
        self.entries
            .iter()
            .map(|entry| QueueRecord {
                playlist_id: entry.playlist_id,
                item_id: entry.item_id,
            })
            .collect()
    }

    /// Rebuilds a queue from serialized pairs, reassigning ranks in the
    /// preserved FIFO order.
    pub fn from_records(records: Vec<QueueRecord>) -> Self {
        let mut queue = Self::new();
        for record in records {
            queue.toggle(record.playlist_id, record.item_id);
        }
        queue
    }
}
