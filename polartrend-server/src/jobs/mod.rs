//! Background maintenance jobs

pub mod snapshot;

pub use snapshot::SnapshotJob;
