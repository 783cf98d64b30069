//! Resource database, subscription engine and watch-source integration.

mod database;
mod encoding;
mod record;
mod watch;

pub use database::{DatabaseMap, ResourceDatabase, SubscriptionId, UnknownAddress};
pub use encoding::JsonSnapshotEncoder;
pub use record::{Filter, LabelSelector, ResourceChangeSet, ResourceRecord, SnapshotEncoder};
pub use watch::{spawn_watch_pump, WatchSource};
