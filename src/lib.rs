//! Playlist and play-queue core for a media player.
//!
//! This crate owns identity, ordering, membership, and search for playlists
//! of playable items. It deliberately does not render rows, own widgets, or
//! decode media; those collaborators talk to this core over a broadcast bus
//! and receive plain data (urls, metadata, fallback labels) in return.
//!
//! The interactive thread owns all mutation. Incremental search runs on a
//! dedicated worker thread fed with point-in-time snapshots; results carry a
//! generation tag and stale ones are discarded on arrival, so the visible
//! item set is eventually consistent with the live filter text without any
//! cancellation machinery.

pub mod collection;
pub mod config;
pub mod filter_session;
pub mod input;
pub mod item;
pub mod playlist;
pub mod protocol;
pub mod queue;
pub mod searcher;

pub use collection::PlaylistCollection;
pub use filter_session::FilterSession;
pub use item::{Item, ItemCollection, ItemId, MetadataValue};
pub use playlist::{Playlist, PlaylistId};
pub use queue::PlayQueue;
pub use searcher::SearcherHandle;
