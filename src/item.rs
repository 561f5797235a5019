//! Playable items and the process-wide identity index.
//!
//! Items are owned exclusively by their playlist's arena; `ItemCollection`
//! is a non-owning index from item id to owning playlist id, pruned on every
//! removal so a stale lookup misses instead of dangling.

use std::collections::{BTreeMap, HashMap};
use std::fmt;

use uuid::Uuid;

use crate::playlist::PlaylistId;
use crate::protocol::ItemRecord;

/// Globally unique, immutable item identity. Never reused.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Deserialize, serde::Serialize,
)]
#[serde(transparent)]
pub struct ItemId(Uuid);

impl ItemId {
    pub fn random() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn nil() -> Self {
        Self(Uuid::nil())
    }

    pub fn is_nil(&self) -> bool {
        self.0.is_nil()
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// One metadata value. Map keys are unique; value schemas are not.
#[derive(Debug, Clone, PartialEq, serde::Deserialize, serde::Serialize)]
#[serde(untagged)]
pub enum MetadataValue {
    Text(String),
    Number(f64),
    Flag(bool),
}

impl MetadataValue {
    /// Plain-text rendering used when building search haystacks.
    pub fn to_display_string(&self) -> String {
        match self {
            MetadataValue::Text(text) => text.clone(),
            MetadataValue::Number(number) => number.to_string(),
            MetadataValue::Flag(flag) => flag.to_string(),
        }
    }
}

impl From<&str> for MetadataValue {
    fn from(text: &str) -> Self {
        MetadataValue::Text(text.to_string())
    }
}

impl From<String> for MetadataValue {
    fn from(text: String) -> Self {
        MetadataValue::Text(text)
    }
}

impl From<f64> for MetadataValue {
    fn from(number: f64) -> Self {
        MetadataValue::Number(number)
    }
}

impl From<i64> for MetadataValue {
    fn from(number: i64) -> Self {
        MetadataValue::Number(number as f64)
    }
}

impl From<bool> for MetadataValue {
    fn from(flag: bool) -> Self {
        MetadataValue::Flag(flag)
    }
}

/// A single playable entry: url, metadata, and queue/play-count state.
#[derive(Debug, Clone)]
pub struct Item {
    id: ItemId,
    playlist_id: PlaylistId,
    url: String,
    metadata: BTreeMap<String, MetadataValue>,
    hidden: bool,
    queue_position: u64,
    extra_play_times: u32,
}

impl Item {
    pub(crate) fn new(url: &str, playlist_id: PlaylistId) -> Self {
        Self {
            id: ItemId::random(),
            playlist_id,
            url: url.to_string(),
            metadata: BTreeMap::new(),
            hidden: false,
            queue_position: 0,
            extra_play_times: 0,
        }
    }

    pub fn id(&self) -> ItemId {
        self.id
    }

    /// Id of the playlist that currently owns this item.
    pub fn playlist_id(&self) -> PlaylistId {
        self.playlist_id
    }

    pub(crate) fn set_playlist_id(&mut self, playlist_id: PlaylistId) {
        self.playlist_id = playlist_id;
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn metadata(&self) -> &BTreeMap<String, MetadataValue> {
        &self.metadata
    }

    /// Replaces the whole metadata mapping.
    pub fn set_metadata(&mut self, metadata: BTreeMap<String, MetadataValue>) {
        self.metadata = metadata;
    }

    pub fn set_metadata_value(&mut self, key: &str, value: MetadataValue) {
        self.metadata.insert(key.to_string(), value);
    }

    /// Whether the item is excluded from the active view without removal.
    pub fn hidden(&self) -> bool {
        self.hidden
    }

    pub fn set_hidden(&mut self, hidden: bool) {
        self.hidden = hidden;
    }

    /// Queue assignment rank; 0 means not queued.
    pub fn queue_position(&self) -> u64 {
        self.queue_position
    }

    pub(crate) fn set_queue_position(&mut self, position: u64) {
        self.queue_position = position;
    }

    pub fn extra_play_times(&self) -> u32 {
        self.extra_play_times
    }

    /// Bumped when the item is chosen again while already queued.
    /// Informational only; never affects ordering.
    pub fn increment_extra_play_times(&mut self) {
        self.extra_play_times = self.extra_play_times.saturating_add(1);
    }

    pub fn reset_extra_play_times(&mut self) {
        self.extra_play_times = 0;
    }

    /// Plain fallback display label: the file name for local urls, the full
    /// url otherwise. Collaborators with a display-format compiler render
    /// richer labels from the metadata mapping instead.
    pub fn to_display_string(&self) -> String {
        let local_path = self
            .url
            .strip_prefix("file://")
            .or_else(|| (!self.url.contains("://")).then_some(self.url.as_str()));
        if let Some(path) = local_path {
            if let Some(name) = path.trim_end_matches('/').rsplit('/').next() {
                if !name.is_empty() {
                    return name.to_string();
                }
            }
        }
        self.url.clone()
    }

    pub fn to_record(&self) -> ItemRecord {
        ItemRecord {
            id: self.id,
            url: self.url.clone(),
            metadata: self.metadata.clone(),
            hidden: self.hidden,
            queue_position: self.queue_position,
            extra_play_times: self.extra_play_times,
        }
    }

    pub(crate) fn from_record(record: ItemRecord, playlist_id: PlaylistId) -> Self {
        Self {
            id: record.id,
            playlist_id,
            url: record.url,
            metadata: record.metadata,
            hidden: record.hidden,
            queue_position: record.queue_position,
            extra_play_times: record.extra_play_times,
        }
    }
}

/// Non-owning registry of every live item, keyed by identity.
///
/// Holds only the owning playlist id per item; payload resolution composes
/// through the playlist arena so removal can never leave this index holding
/// data for a dead item.
#[derive(Debug, Default)]
pub struct ItemCollection {
    index: HashMap<ItemId, PlaylistId>,
}

impl ItemCollection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocates a fresh identity for `url` owned by `playlist_id`.
    pub fn create(&mut self, url: &str, playlist_id: PlaylistId) -> Item {
        let item = Item::new(url, playlist_id);
        self.index.insert(item.id(), playlist_id);
        item
    }

    /// Explicit clone: new identity, copied url/metadata/hidden flag,
    /// queue and play-count state reset to zero.
    pub fn clone_item(&mut self, source: &Item, playlist_id: PlaylistId) -> Item {
        let mut item = Item::new(source.url(), playlist_id);
        item.metadata = source.metadata.clone();
        item.hidden = source.hidden;
        self.index.insert(item.id(), playlist_id);
        item
    }

    /// Owning playlist of `id`, or `None` if the item no longer exists.
    pub fn owner_of(&self, id: ItemId) -> Option<PlaylistId> {
        self.index.get(&id).copied()
    }

    pub fn contains(&self, id: ItemId) -> bool {
        self.index.contains_key(&id)
    }

    pub(crate) fn register(&mut self, id: ItemId, playlist_id: PlaylistId) {
        debug_assert!(
            !self.index.contains_key(&id),
            "item id registered twice: {id}"
        );
        self.index.insert(id, playlist_id);
    }

    pub(crate) fn unregister(&mut self, id: ItemId) {
        self.index.remove(&id);
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }
}
