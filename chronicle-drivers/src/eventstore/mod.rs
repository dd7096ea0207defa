mod sql;

pub use sql::SqlEventStore;
