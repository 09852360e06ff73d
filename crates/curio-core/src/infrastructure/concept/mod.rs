//! SQLite-backed concept persistence

mod repository;

pub use repository::SqliteConceptRepository;
