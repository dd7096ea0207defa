mod sql;
mod version_interval;

pub use sql::SqlSnapshotStore;
pub use version_interval::VersionIntervalStrategy;
