//! # DataStore Module
//!
//! Persistence for processed videos, scheduled social posts and engagement
//! snapshots.
//!
//! Two backends implement [`DataStore`]: a Postgres store built on sqlx with
//! embedded migrations, and a JSON file store for single-machine use when no
//! database is configured. [`AnyStore`] picks one at runtime.

mod datastore;
mod domain;

pub use datastore::file::FileStore;
pub use datastore::postgres::PgDataStore;
pub use datastore::{AnyStore, DataStore, DispatchUpdate};
pub use domain::{EngagementSnapshot, Platform, PostStatus, ScheduledPost, VideoRecord};
