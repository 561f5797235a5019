//! Ordered, arena-backed playlists.
//!
//! A playlist exclusively owns its items: the arena map holds the payloads
//! and `order` holds the display/playback sequence of their ids. Every
//! by-id lookup is total and returns an empty result on a miss, because
//! interactive races (item removed mid-interaction) are expected and must
//! degrade to no-ops rather than errors.

use std::collections::HashMap;
use std::fmt;

use log::debug;
use uuid::Uuid;

use crate::item::{Item, ItemCollection, ItemId, MetadataValue};
use crate::protocol::PlaylistRecord;
use crate::queue::{PlayQueue, QueueChange};

/// Unique playlist identity. The nil id is reserved for the quick playlist.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Deserialize, serde::Serialize,
)]
#[serde(transparent)]
pub struct PlaylistId(Uuid);

impl PlaylistId {
    pub fn random() -> Self {
        Self(Uuid::new_v4())
    }

    /// Reserved id of the quick playlist.
    pub fn nil() -> Self {
        Self(Uuid::nil())
    }

    pub fn is_nil(&self) -> bool {
        self.0.is_nil()
    }
}

impl fmt::Display for PlaylistId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// An ordered, mutable sequence of owned items with a title and identity.
#[derive(Debug)]
pub struct Playlist {
    id: PlaylistId,
    title: String,
    order: Vec<ItemId>,
    items: HashMap<ItemId, Item>,
    queue: PlayQueue,
}

impl Playlist {
    pub fn new(title: &str) -> Self {
        Self::with_id(PlaylistId::random(), title)
    }

    pub(crate) fn with_id(id: PlaylistId, title: &str) -> Self {
        Self {
            id,
            title: title.to_string(),
            order: Vec::new(),
            items: HashMap::new(),
            queue: PlayQueue::new(),
        }
    }

    pub fn id(&self) -> PlaylistId {
        self.id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn set_title(&mut self, title: &str) {
        self.title = title.to_string();
    }

    /// Creates a fresh item for `url` and appends it to the sequence.
    pub fn add_item(&mut self, items: &mut ItemCollection, url: &str) -> ItemId {
        let item = items.create(url, self.id);
        let id = item.id();
        self.order.push(id);
        self.items.insert(id, item);
        id
    }

    /// Clones `source` (fresh identity, copied data) and appends it.
    pub fn add_item_clone(&mut self, items: &mut ItemCollection, source: &Item) -> ItemId {
        let item = items.clone_item(source, self.id);
        let id = item.id();
        self.order.push(id);
        self.items.insert(id, item);
        id
    }

    /// Removes an item from the sequence, the arena, the queue order, and
    /// the identity index. No-op if absent.
    pub fn remove_item(&mut self, items: &mut ItemCollection, id: ItemId) -> bool {
        if self.items.remove(&id).is_none() {
            return false;
        }
        self.order.retain(|existing| *existing != id);
        self.queue.remove_item(id);
        items.unregister(id);
        true
    }

    pub fn item_of(&self, id: ItemId) -> Option<&Item> {
        self.items.get(&id)
    }

    pub fn item_of_mut(&mut self, id: ItemId) -> Option<&mut Item> {
        self.items.get_mut(&id)
    }

    /// Sequence successor of `id`; empty at the tail or on a miss.
    pub fn item_after(&self, id: ItemId) -> Option<&Item> {
        let position = self.order.iter().position(|existing| *existing == id)?;
        let next = self.order.get(position + 1)?;
        self.items.get(next)
    }

    /// Sequence predecessor of `id`; empty at the head or on a miss.
    pub fn item_before(&self, id: ItemId) -> Option<&Item> {
        let position = self.order.iter().position(|existing| *existing == id)?;
        let previous = self.order.get(position.checked_sub(1)?)?;
        self.items.get(previous)
    }

    pub fn first_item(&self) -> Option<&Item> {
        self.items.get(self.order.first()?)
    }

    pub fn contains(&self, id: ItemId) -> bool {
        self.items.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Item ids in sequence order.
    pub fn item_ids(&self) -> &[ItemId] {
        &self.order
    }

    /// Items in sequence order.
    pub fn iterate_items(&self) -> impl Iterator<Item = &Item> {
        self.order.iter().filter_map(|id| self.items.get(id))
    }

    /// Items in sequence order with the hidden ones skipped.
    pub fn visible_items(&self) -> impl Iterator<Item = &Item> {
        self.iterate_items().filter(|item| !item.hidden())
    }

    /// Replaces the metadata mapping of one item. No-op on a miss.
    pub fn set_metadata(
        &mut self,
        id: ItemId,
        metadata: std::collections::BTreeMap<String, MetadataValue>,
    ) -> bool {
        match self.items.get_mut(&id) {
            Some(item) => {
                item.set_metadata(metadata);
                true
            }
            None => false,
        }
    }

    /// Phase one of a two-phase move: detaches `ids` from the sequence,
    /// returning them in their current relative sequence order. The items
    /// stay in the arena and must be reattached with [`add_items_after`]
    /// before the move is observable as complete.
    ///
    /// Removal commits fully before any reinsertion so an overlapping
    /// source span and insertion point cannot corrupt the sequence.
    ///
    /// [`add_items_after`]: Playlist::add_items_after
    pub fn take_items_raw(&mut self, ids: &[ItemId]) -> Vec<ItemId> {
        let taken: Vec<ItemId> = self
            .order
            .iter()
            .copied()
            .filter(|id| ids.contains(id))
            .collect();
        self.order.retain(|id| !taken.contains(id));
        taken
    }

    /// Phase two of a two-phase move: reinserts detached ids immediately
    /// after `target`, or at the front when the target is empty or absent.
    /// Ids unknown to the arena or already present in the sequence are
    /// skipped.
    pub fn add_items_after(&mut self, target: Option<ItemId>, ids: &[ItemId]) {
        let mut insert_at = match target {
            Some(target_id) => self
                .order
                .iter()
                .position(|existing| *existing == target_id)
                .map(|position| position + 1)
                .unwrap_or(0),
            None => 0,
        };
        for id in ids {
            if !self.items.contains_key(id) || self.order.contains(id) {
                debug_assert!(self.items.contains_key(id), "reattach of unknown item {id}");
                continue;
            }
            self.order.insert(insert_at, *id);
            insert_at += 1;
        }
    }

    /// Convenience wrapper running both phases of a move.
    pub fn move_items_after(&mut self, ids: &[ItemId], target: Option<ItemId>) {
        let taken = self.take_items_raw(ids);
        self.add_items_after(target, &taken);
    }

    /// Queues the item at the end of this playlist's queue order, or
    /// unqueues it if already queued. Unqueueing abandons any pending
    /// extra plays. Returns false on a miss.
    pub fn queue_toggle(&mut self, id: ItemId) -> bool {
        let Some(item) = self.items.get_mut(&id) else {
            return false;
        };
        match self.queue.toggle(self.id, id) {
            QueueChange::Queued(rank) => item.set_queue_position(rank),
            QueueChange::Unqueued => {
                item.set_queue_position(0);
                item.reset_extra_play_times();
            }
        }
        true
    }

    /// Lowest-ranked queued item, if any.
    pub fn queue_first(&self) -> Option<ItemId> {
        self.queue.first().map(|entry| entry.item_id)
    }

    /// Pops the lowest-ranked queued item and clears its position.
    pub fn queue_take_first(&mut self) -> Option<ItemId> {
        let entry = self.queue.take_first()?;
        if let Some(item) = self.items.get_mut(&entry.item_id) {
            item.set_queue_position(0);
        }
        Some(entry.item_id)
    }

    /// Removes every item, clearing the sequence, arena, queue order, and
    /// identity index entries.
    pub fn clear(&mut self, items: &mut ItemCollection) {
        for id in self.order.drain(..) {
            items.unregister(id);
        }
        self.items.clear();
        self.queue.clear();
    }

    /// Plain url-list export; metadata is not preserved in this form.
    pub fn to_string_list(&self) -> Vec<String> {
        self.iterate_items()
            .map(|item| item.url().to_string())
            .collect()
    }

    /// Plain url-list import: replaces the contents with fresh identities
    /// created in list order.
    pub fn from_string_list(&mut self, items: &mut ItemCollection, urls: &[String]) {
        self.clear(items);
        for url in urls {
            self.add_item(items, url);
        }
    }

    /// Full structured serialization including metadata and title.
    pub fn to_record(&self) -> PlaylistRecord {
        PlaylistRecord {
            id: self.id,
            title: self.title.clone(),
            items: self.iterate_items().map(Item::to_record).collect(),
        }
    }

    /// Rebuilds a playlist from its serialized shape, registering every
    /// item with the identity index and restoring queue order from the
    /// items' recorded queue positions.
    pub fn from_record(record: PlaylistRecord, items: &mut ItemCollection) -> Self {
        let mut playlist = Self::with_id(record.id, &record.title);
        for item_record in record.items {
            let id = item_record.id;
            if playlist.items.contains_key(&id) || items.contains(id) {
                debug_assert!(false, "duplicate item id in playlist record: {id}");
                debug!("dropping duplicate item {id} while restoring playlist {}", record.id);
                continue;
            }
            let item = Item::from_record(item_record, playlist.id);
            items.register(id, playlist.id);
            playlist.order.push(id);
            playlist.items.insert(id, item);
        }
        let mut queued: Vec<(u64, ItemId)> = playlist
            .iterate_items()
            .filter(|item| item.queue_position() > 0)
            .map(|item| (item.queue_position(), item.id()))
            .collect();
        queued.sort_unstable();
        for (rank, id) in queued {
            playlist.queue.push_restored(playlist.id, id, rank);
        }
        playlist
    }

    /// Structured serialization as a generic json-style map.
    pub fn to_vmap(&self) -> serde_json::Value {
        serde_json::to_value(self.to_record()).unwrap_or(serde_json::Value::Null)
    }

    /// Counterpart of [`to_vmap`]; empty result on a malformed map.
    ///
    /// [`to_vmap`]: Playlist::to_vmap
    pub fn from_vmap(value: serde_json::Value, items: &mut ItemCollection) -> Option<Self> {
        let record: PlaylistRecord = serde_json::from_value(value).ok()?;
        Some(Self::from_record(record, items))
    }

    /// Clones the whole playlist: new playlist identity, same title, and
    /// freshly cloned items (new ids, copied data) in the same order.
    pub fn clone_with(&self, items: &mut ItemCollection) -> Playlist {
        let mut clone = Playlist::new(&self.title);
        for item in self.iterate_items() {
            clone.add_item_clone(items, item);
        }
        clone
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn urls(playlist: &Playlist) -> Vec<String> {
        playlist.to_string_list()
    }

    fn populated(items: &mut ItemCollection, names: &[&str]) -> (Playlist, Vec<ItemId>) {
        let mut playlist = Playlist::new("Test");
        let ids = names
            .iter()
            .map(|name| playlist.add_item(items, &format!("file:///music/{name}.flac")))
            .collect();
        (playlist, ids)
    }

    #[test]
    fn add_remove_matches_reference_list_model() {
        let mut items = ItemCollection::new();
        let mut playlist = Playlist::new("Test");
        let mut reference: Vec<String> = Vec::new();

        for name in ["a", "b", "c", "d", "e"] {
            let url = format!("file:///music/{name}.flac");
            playlist.add_item(&mut items, &url);
            reference.push(url);
        }
        assert_eq!(urls(&playlist), reference);

        // Remove from the middle and both ends; relative order must hold.
        let ids: Vec<ItemId> = playlist.item_ids().to_vec();
        for original_index in [2usize, 0, 4] {
            playlist.remove_item(&mut items, ids[original_index]);
            let url = format!(
                "file:///music/{}.flac",
                ["a", "b", "c", "d", "e"][original_index]
            );
            let position = reference.iter().position(|entry| *entry == url).unwrap();
            reference.remove(position);
            assert_eq!(urls(&playlist), reference);
        }
        assert_eq!(playlist.len(), 2);

        // Removing an unknown id is a no-op.
        assert!(!playlist.remove_item(&mut items, ids[0]));
        assert_eq!(urls(&playlist), reference);
    }

    #[test]
    fn sequence_relative_lookups_fail_at_boundaries() {
        let mut items = ItemCollection::new();
        let (playlist, ids) = populated(&mut items, &["a", "b", "c"]);

        assert_eq!(playlist.item_after(ids[0]).map(Item::id), Some(ids[1]));
        assert_eq!(playlist.item_before(ids[2]).map(Item::id), Some(ids[1]));
        assert!(playlist.item_after(ids[2]).is_none());
        assert!(playlist.item_before(ids[0]).is_none());
        assert!(playlist.item_after(ItemId::random()).is_none());
    }

    #[test]
    fn two_phase_move_preserves_relative_orders() {
        let mut items = ItemCollection::new();
        let (mut playlist, ids) = populated(&mut items, &["a", "b", "c", "d", "e"]);

        // Move the contiguous block [b, c] to after d. The move span
        // overlaps the walk toward the insertion point on purpose.
        let taken = playlist.take_items_raw(&[ids[2], ids[1]]);
        assert_eq!(taken, vec![ids[1], ids[2]]);
        playlist.add_items_after(Some(ids[3]), &taken);

        let expected = vec![ids[0], ids[3], ids[1], ids[2], ids[4]];
        assert_eq!(playlist.item_ids(), &expected[..]);
    }

    #[test]
    fn move_to_absent_target_lands_at_front() {
        let mut items = ItemCollection::new();
        let (mut playlist, ids) = populated(&mut items, &["a", "b", "c"]);

        playlist.move_items_after(&[ids[2]], Some(ItemId::random()));
        assert_eq!(playlist.item_ids(), &[ids[2], ids[0], ids[1]]);

        playlist.move_items_after(&[ids[1]], None);
        assert_eq!(playlist.item_ids(), &[ids[1], ids[2], ids[0]]);
    }

    #[test]
    fn queue_is_fifo_with_stable_ranks() {
        let mut items = ItemCollection::new();
        let (mut playlist, ids) = populated(&mut items, &["a", "b", "c"]);

        assert!(playlist.queue_toggle(ids[0]));
        assert!(playlist.queue_toggle(ids[1]));
        assert!(playlist.queue_toggle(ids[2]));
        assert_eq!(playlist.item_of(ids[1]).unwrap().queue_position(), 2);

        // Untoggle the head; b and c keep their relative rank.
        assert!(playlist.queue_toggle(ids[0]));
        assert_eq!(playlist.item_of(ids[0]).unwrap().queue_position(), 0);
        assert_eq!(playlist.queue_first(), Some(ids[1]));

        assert_eq!(playlist.queue_take_first(), Some(ids[1]));
        assert_eq!(playlist.item_of(ids[1]).unwrap().queue_position(), 0);
        assert_eq!(playlist.queue_take_first(), Some(ids[2]));
        assert_eq!(playlist.queue_take_first(), None);

        assert!(!playlist.queue_toggle(ItemId::random()));
    }

    #[test]
    fn hidden_items_leave_the_visible_view_but_not_the_sequence() {
        let mut items = ItemCollection::new();
        let (mut playlist, ids) = populated(&mut items, &["a", "b", "c"]);
        playlist.item_of_mut(ids[1]).unwrap().set_hidden(true);

        let visible: Vec<ItemId> = playlist.visible_items().map(Item::id).collect();
        assert_eq!(visible, vec![ids[0], ids[2]]);

        // Hiding never removes: the full sequence is intact.
        assert_eq!(playlist.len(), 3);
        assert_eq!(playlist.iterate_items().count(), 3);
        assert!(playlist.contains(ids[1]));

        playlist.item_of_mut(ids[1]).unwrap().set_hidden(false);
        assert_eq!(playlist.visible_items().count(), 3);
    }

    #[test]
    fn untoggling_abandons_pending_extra_plays() {
        let mut items = ItemCollection::new();
        let (mut playlist, ids) = populated(&mut items, &["a"]);
        playlist.queue_toggle(ids[0]);
        playlist
            .item_of_mut(ids[0])
            .unwrap()
            .increment_extra_play_times();
        assert_eq!(playlist.item_of(ids[0]).unwrap().extra_play_times(), 1);

        playlist.queue_toggle(ids[0]);
        let item = playlist.item_of(ids[0]).unwrap();
        assert_eq!(item.queue_position(), 0);
        assert_eq!(item.extra_play_times(), 0);
    }

    #[test]
    fn removing_a_queued_item_prunes_the_queue() {
        let mut items = ItemCollection::new();
        let (mut playlist, ids) = populated(&mut items, &["a", "b"]);
        playlist.queue_toggle(ids[0]);
        playlist.queue_toggle(ids[1]);

        playlist.remove_item(&mut items, ids[0]);
        assert_eq!(playlist.queue_first(), Some(ids[1]));
        assert_eq!(items.owner_of(ids[0]), None);
    }

    #[test]
    fn record_round_trip_reproduces_equivalent_playlist() {
        let mut items = ItemCollection::new();
        let (mut playlist, ids) = populated(&mut items, &["a", "b"]);
        playlist.queue_toggle(ids[1]);
        {
            let item = playlist.item_of_mut(ids[0]).unwrap();
            item.set_metadata_value("title", "Big Buck Bunny".into());
            item.set_metadata_value("rating", MetadataValue::Number(4.5));
            item.set_hidden(true);
            item.increment_extra_play_times();
        }

        let mut restored_items = ItemCollection::new();
        let restored = Playlist::from_vmap(playlist.to_vmap(), &mut restored_items)
            .expect("round trip should parse");

        assert_eq!(restored.id(), playlist.id());
        assert_eq!(restored.title(), playlist.title());
        assert_eq!(restored.item_ids(), playlist.item_ids());
        for id in &ids {
            let original = playlist.item_of(*id).unwrap();
            let copy = restored.item_of(*id).unwrap();
            assert_eq!(copy.url(), original.url());
            assert_eq!(copy.metadata(), original.metadata());
            assert_eq!(copy.hidden(), original.hidden());
            assert_eq!(copy.queue_position(), original.queue_position());
            assert_eq!(copy.extra_play_times(), original.extra_play_times());
        }
        assert_eq!(restored.queue_first(), Some(ids[1]));
        assert_eq!(restored_items.owner_of(ids[0]), Some(playlist.id()));
    }

    #[test]
    fn string_list_import_creates_fresh_identities_in_order() {
        let mut items = ItemCollection::new();
        let (source, source_ids) = populated(&mut items, &["a", "b"]);

        let mut imported = Playlist::new("Imported");
        imported.from_string_list(&mut items, &source.to_string_list());
        assert_eq!(imported.to_string_list(), source.to_string_list());
        for (new_id, old_id) in imported.item_ids().iter().zip(&source_ids) {
            assert_ne!(new_id, old_id);
        }
    }

    #[test]
    fn clone_has_fresh_ids_and_identical_data() {
        let mut items = ItemCollection::new();
        let (mut source, ids) = populated(&mut items, &["a", "b"]);
        source
            .item_of_mut(ids[0])
            .unwrap()
            .set_metadata_value("title", "Tears of Steel".into());

        let clone = source.clone_with(&mut items);
        assert_ne!(clone.id(), source.id());
        assert_eq!(clone.title(), source.title());
        assert_eq!(clone.len(), source.len());
        for (clone_item, source_item) in clone.iterate_items().zip(source.iterate_items()) {
            assert_ne!(clone_item.id(), source_item.id());
            assert_eq!(clone_item.url(), source_item.url());
            assert_eq!(clone_item.metadata(), source_item.metadata());
        }
    }

    #[test]
    fn clear_empties_sequence_and_index() {
        let mut items = ItemCollection::new();
        let (mut playlist, ids) = populated(&mut items, &["a", "b"]);
        playlist.queue_toggle(ids[0]);

        playlist.clear(&mut items);
        assert!(playlist.is_empty());
        assert!(playlist.queue_first().is_none());
        assert!(items.is_empty());
    }
}
