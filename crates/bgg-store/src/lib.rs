//! Relational persistence of the scraped records.
//!
//! A [`Store`] hands out one [`Session`] at a time. Nothing written through a
//! session is visible until [`Session::commit`] succeeds, and a session that is
//! dropped without being committed leaves the store untouched.

mod sqlite;

use bgg_scraper::{MechanicRecord, RankedRecord, StatisticsRecord, ValidationError};
use thiserror::Error;

pub use sqlite::{SqliteSession, SqliteStore, Table};

#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("Stored row is invalid: {0}")]
    InvalidRow(#[from] ValidationError),
    #[error("{0}")]
    Rejected(String),
}

pub trait Store {
    type Session<'s>: Session
    where
        Self: 's;

    fn session(&mut self) -> Result<Self::Session<'_>, PersistenceError>;
}

pub trait Session {
    fn insert_rankings(&mut self, records: &[RankedRecord]) -> Result<(), PersistenceError>;

    fn insert_statistics(&mut self, records: &[StatisticsRecord]) -> Result<(), PersistenceError>;

    fn insert_mechanics(&mut self, records: &[MechanicRecord]) -> Result<(), PersistenceError>;

    /// Makes every insert of this session durable, or none of them on failure.
    fn commit(self) -> Result<(), PersistenceError>;

    fn rollback(self) -> Result<(), PersistenceError>;
}
