mod composite;
mod snapshot;

pub use composite::{icvu, merge_composite};
pub use snapshot::{Snapshot, SnapshotStore};
