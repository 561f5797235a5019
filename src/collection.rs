//! Process-wide playlist registry.
//!
//! `PlaylistCollection` is the single store object handed to every component
//! that needs playlist state (no ambient singletons; tests get isolated
//! instances). It owns all playlists, the non-owning item index, and the
//! cross-playlist queue overlay, and broadcasts change notifications so
//! views can request repaints.
//!
//! All mutation happens on the interactive thread through this registry;
//! the search worker only ever sees snapshots.

use std::collections::HashMap;

use log::{debug, info};
use tokio::sync::broadcast::Sender;

use crate::item::{Item, ItemCollection, ItemId};
use crate::playlist::{Playlist, PlaylistId};
use crate::protocol::{Message, PlaylistMessage, PlaylistRecord, QueueRecord};
use crate::queue::{PlayQueue, QueueChange, QueueEntry};

/// Registry of every playlist in the process, with the quick playlist
/// pre-created and the queue overlay always available.
pub struct PlaylistCollection {
    playlists: HashMap<PlaylistId, Playlist>,
    items: ItemCollection,
    queue: PlayQueue,
    bus: Sender<Message>,
}

impl PlaylistCollection {
    /// Creates the registry with the quick playlist in place. The bus
    /// sender may have no subscribers; notifications are fire-and-forget.
    pub fn new(bus: Sender<Message>) -> Self {
        let mut playlists = HashMap::new();
        playlists.insert(
            PlaylistId::nil(),
            Playlist::with_id(PlaylistId::nil(), "Quick playlist"),
        );
        info!("playlist collection initialized");
        Self {
            playlists,
            items: ItemCollection::new(),
            queue: PlayQueue::new(),
            bus,
        }
    }

    fn emit(&self, message: PlaylistMessage) {
        let _ = self.bus.send(Message::Playlist(message));
    }

    fn emit_playlist_changed(&self, playlist_id: PlaylistId) {
        self.emit(PlaylistMessage::PlaylistChanged { playlist_id });
    }

    /// Id of the singleton playlist used for single ad-hoc urls.
    pub fn quick_playlist_id(&self) -> PlaylistId {
        PlaylistId::nil()
    }

    pub fn new_playlist(&mut self, title: &str) -> PlaylistId {
        let playlist = Playlist::new(title);
        let id = playlist.id();
        debug!("creating playlist {title:?} ({id})");
        self.playlists.insert(id, playlist);
        self.emit_playlist_changed(id);
        id
    }

    /// Clones a playlist wholesale: new playlist id, same title, freshly
    /// cloned items in the same order. Empty result on a miss.
    pub fn clone_playlist(&mut self, id: PlaylistId) -> Option<PlaylistId> {
        let cloned = {
            let source = self.playlists.get(&id)?;
            source.clone_with(&mut self.items)
        };
        let new_id = cloned.id();
        debug!("cloned playlist {id} into {new_id}");
        self.playlists.insert(new_id, cloned);
        self.emit_playlist_changed(new_id);
        Some(new_id)
    }

    /// Destroys a playlist and all of its items. The quick playlist is
    /// process-lifetime: asking to remove it clears it instead and reports
    /// that nothing was destroyed.
    pub fn remove_playlist(&mut self, id: PlaylistId) -> bool {
        if id.is_nil() {
            self.clear_playlist(id);
            return false;
        }
        let Some(mut playlist) = self.playlists.remove(&id) else {
            return false;
        };
        playlist.clear(&mut self.items);
        if self.queue.remove_playlist(id) {
            self.emit(PlaylistMessage::QueueChanged);
        }
        debug!("removed playlist {id}");
        self.emit(PlaylistMessage::PlaylistRemoved { playlist_id: id });
        true
    }

    pub fn playlist_of(&self, id: PlaylistId) -> Option<&Playlist> {
        self.playlists.get(&id)
    }

    /// Mutable playlist access for title edits and playlist-scoped queue
    /// operations. Mutations that touch the identity index go through the
    /// registry's own methods instead.
    pub fn playlist_of_mut(&mut self, id: PlaylistId) -> Option<&mut Playlist> {
        self.playlists.get_mut(&id)
    }

    pub fn playlist_ids(&self) -> impl Iterator<Item = PlaylistId> + '_ {
        self.playlists.keys().copied()
    }

    /// Registers a deserialized playlist. Empty result if its id is
    /// already taken.
    pub fn add_playlist(&mut self, record: PlaylistRecord) -> Option<PlaylistId> {
        if self.playlists.contains_key(&record.id) {
            debug_assert!(false, "playlist id restored twice: {}", record.id);
            debug!("ignoring restored playlist with duplicate id {}", record.id);
            return None;
        }
        let playlist = Playlist::from_record(record, &mut self.items);
        let id = playlist.id();
        self.playlists.insert(id, playlist);
        self.emit_playlist_changed(id);
        Some(id)
    }

    /// Resolves an item anywhere in the process by identity. Misses mean
    /// "item no longer exists" and are not an error.
    pub fn item_of(&self, item_id: ItemId) -> Option<&Item> {
        let owner = self.items.owner_of(item_id)?;
        self.playlists.get(&owner)?.item_of(item_id)
    }

    /// Mutable counterpart of [`item_of`] for metadata/hidden/play-count
    /// edits.
    ///
    /// [`item_of`]: PlaylistCollection::item_of
    pub fn item_of_mut(&mut self, item_id: ItemId) -> Option<&mut Item> {
        let owner = self.items.owner_of(item_id)?;
        self.playlists.get_mut(&owner)?.item_of_mut(item_id)
    }

    pub fn add_item(&mut self, playlist_id: PlaylistId, url: &str) -> Option<ItemId> {
        let playlist = self.playlists.get_mut(&playlist_id)?;
        let id = playlist.add_item(&mut self.items, url);
        self.emit_playlist_changed(playlist_id);
        Some(id)
    }

    /// Clones an existing item (possibly from another playlist) onto the
    /// end of `playlist_id`.
    pub fn add_item_clone(
        &mut self,
        playlist_id: PlaylistId,
        source_item_id: ItemId,
    ) -> Option<ItemId> {
        let source = self.item_of(source_item_id)?.clone();
        let playlist = self.playlists.get_mut(&playlist_id)?;
        let id = playlist.add_item_clone(&mut self.items, &source);
        self.emit_playlist_changed(playlist_id);
        Some(id)
    }

    /// Removes an item from its owning playlist, the identity index, and
    /// the queue overlay. No-op if the id is unknown.
    pub fn remove_item(&mut self, item_id: ItemId) -> bool {
        let Some(owner) = self.items.owner_of(item_id) else {
            return false;
        };
        let Some(playlist) = self.playlists.get_mut(&owner) else {
            debug_assert!(false, "item {item_id} indexed to a missing playlist");
            return false;
        };
        playlist.remove_item(&mut self.items, item_id);
        if self.queue.remove_item(item_id) {
            self.emit(PlaylistMessage::QueueChanged);
        }
        self.emit_playlist_changed(owner);
        true
    }

    pub fn clear_playlist(&mut self, playlist_id: PlaylistId) {
        let Some(playlist) = self.playlists.get_mut(&playlist_id) else {
            return;
        };
        playlist.clear(&mut self.items);
        if self.queue.remove_playlist(playlist_id) {
            self.emit(PlaylistMessage::QueueChanged);
        }
        self.emit_playlist_changed(playlist_id);
    }

    /// Two-phase drag reorder within one playlist: detach `ids`, then
    /// reattach after `target` (front on `None`).
    pub fn move_items(&mut self, playlist_id: PlaylistId, ids: &[ItemId], target: Option<ItemId>) {
        let Some(playlist) = self.playlists.get_mut(&playlist_id) else {
            return;
        };
        playlist.move_items_after(ids, target);
        self.emit_playlist_changed(playlist_id);
    }

    /// Replaces playlist contents from a plain url list (m3u-style import).
    pub fn import_string_list(&mut self, playlist_id: PlaylistId, urls: &[String]) {
        let Some(playlist) = self.playlists.get_mut(&playlist_id) else {
            return;
        };
        playlist.from_string_list(&mut self.items, urls);
        self.emit_playlist_changed(playlist_id);
    }

    pub fn rename_playlist(&mut self, playlist_id: PlaylistId, title: &str) {
        let Some(playlist) = self.playlists.get_mut(&playlist_id) else {
            return;
        };
        playlist.set_title(title);
        self.emit_playlist_changed(playlist_id);
    }

    /// The cross-playlist queue overlay in FIFO assignment order.
    pub fn queue(&self) -> &PlayQueue {
        &self.queue
    }

    /// Queues an item on the process-wide overlay, or unqueues it if
    /// already queued. Unqueueing abandons any pending extra plays.
    /// Returns false when the item is not in `playlist_id`.
    pub fn queue_toggle(&mut self, playlist_id: PlaylistId, item_id: ItemId) -> bool {
        let Some(playlist) = self.playlists.get_mut(&playlist_id) else {
            return false;
        };
        let Some(item) = playlist.item_of_mut(item_id) else {
            return false;
        };
        match self.queue.toggle(playlist_id, item_id) {
            QueueChange::Queued(rank) => item.set_queue_position(rank),
            QueueChange::Unqueued => {
                item.set_queue_position(0);
                item.reset_extra_play_times();
            }
        }
        self.emit(PlaylistMessage::QueueChanged);
        true
    }

    /// Queues every visible (non-hidden) item of `playlist_id` that is not
    /// already queued, in sequence order. Returns the number of items
    /// appended to the overlay.
    pub fn queue_visible(&mut self, playlist_id: PlaylistId) -> usize {
        let Some(playlist) = self.playlists.get_mut(&playlist_id) else {
            return 0;
        };
        let candidates: Vec<ItemId> = playlist
            .visible_items()
            .map(Item::id)
            .filter(|id| !self.queue.contains(*id))
            .collect();
        let mut appended = 0;
        for item_id in candidates {
            let Some(item) = playlist.item_of_mut(item_id) else {
                continue;
            };
            if let QueueChange::Queued(rank) = self.queue.toggle(playlist_id, item_id) {
                item.set_queue_position(rank);
                appended += 1;
            }
        }
        if appended > 0 {
            self.emit(PlaylistMessage::QueueChanged);
        }
        appended
    }

    pub fn queue_first(&self) -> Option<(PlaylistId, ItemId)> {
        self.queue
            .first()
            .map(|entry| (entry.playlist_id, entry.item_id))
    }

    /// Pops the next-to-play entry and clears the item's queue position.
    /// Empty result when nothing is queued.
    pub fn queue_take_first(&mut self) -> Option<(PlaylistId, ItemId)> {
        let entry = self.queue.take_first()?;
        if let Some(item) = self.item_of_mut(entry.item_id) {
            item.set_queue_position(0);
        }
        self.emit(PlaylistMessage::QueueChanged);
        Some((entry.playlist_id, entry.item_id))
    }

    /// Serialized overlay shape for session persistence.
    pub fn queue_records(&self) -> Vec<QueueRecord> {
        self.queue.to_records()
    }

    /// Rebuilds the overlay from serialized pairs, dropping entries whose
    /// playlist or item no longer exists.
    pub fn restore_queue(&mut self, records: Vec<QueueRecord>) {
        let stale: Vec<QueueEntry> = self.queue.iter().copied().collect();
        self.queue.clear();
        for entry in stale {
            if let Some(item) = self.item_of_mut(entry.item_id) {
                item.set_queue_position(0);
            }
        }
        for record in records {
            let known = self
                .playlists
                .get(&record.playlist_id)
                .is_some_and(|playlist| playlist.contains(record.item_id));
            if !known {
                debug!(
                    "dropping restored queue entry for missing item {}",
                    record.item_id
                );
                continue;
            }
            if let QueueChange::Queued(rank) = self.queue.toggle(record.playlist_id, record.item_id)
            {
                if let Some(item) = self.item_of_mut(record.item_id) {
                    item.set_queue_position(rank);
                }
            }
        }
        self.emit(PlaylistMessage::QueueChanged);
    }

    /// Signals that an item was chosen for playback. Returns false and
    /// stays silent when the item is gone.
    pub fn request_item(&self, playlist_id: PlaylistId, item_id: ItemId) -> bool {
        let exists = self
            .playlists
            .get(&playlist_id)
            .is_some_and(|playlist| playlist.contains(item_id));
        if !exists {
            return false;
        }
        self.emit(PlaylistMessage::ItemDesired {
            playlist_id,
            item_id,
        });
        true
    }
}
