//! Sqlite-backed repositories (spec.md §4.4/§4.5's pluggable persistence,
//! wired to the `SQLITE_DB_FILE` config key).

mod events;
mod orders;
mod pool;

pub use events::SqliteEventsRepository;
pub use orders::SqliteOrdersRepository;
pub use pool::connect;
