use std::path::Path;

use bgg_scraper::{MechanicRecord, RankedRecord, StatisticsRecord};
use rusqlite::{params, Connection, Transaction};

use crate::{PersistenceError, Session, Store};

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS games (
    id INTEGER PRIMARY KEY,
    rank INTEGER NOT NULL,
    name TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS game_statistics (
    id INTEGER PRIMARY KEY,
    description TEXT NOT NULL,
    year_published INTEGER NOT NULL,
    min_players INTEGER NOT NULL,
    max_players INTEGER NOT NULL,
    suggested_num_player INTEGER NOT NULL,
    min_age INTEGER NOT NULL,
    average_rating REAL NOT NULL,
    average_weight REAL NOT NULL
);

CREATE TABLE IF NOT EXISTS game_mechanics (
    id INTEGER NOT NULL,
    mechanic_name TEXT NOT NULL,
    PRIMARY KEY (id, mechanic_name)
);
";

#[derive(Debug)]
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, PersistenceError> {
        Ok(Self {
            conn: Connection::open(path)?,
        })
    }

    pub fn open_in_memory() -> Result<Self, PersistenceError> {
        Ok(Self {
            conn: Connection::open_in_memory()?,
        })
    }

    pub fn create_tables(&self) -> Result<(), PersistenceError> {
        self.conn.execute_batch(SCHEMA)?;
        Ok(())
    }

    /// Stored game ids by ascending rank.
    pub fn game_ids(&self, limit: Option<usize>) -> Result<Vec<i64>, PersistenceError> {
        let limit = limit.map_or(-1, |l| i64::try_from(l).unwrap_or(i64::MAX));
        let mut stmt = self
            .conn
            .prepare("SELECT id FROM games ORDER BY rank, id LIMIT ?1")?;
        let ids = stmt
            .query_map([limit], |row| row.get(0))?
            .collect::<Result<Vec<i64>, _>>()?;
        Ok(ids)
    }

    pub fn rankings(&self) -> Result<Vec<RankedRecord>, PersistenceError> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, rank, name FROM games ORDER BY rank, id")?;
        let rows = stmt
            .query_map([], |row| {
                Ok((row.get::<_, i64>(0)?, row.get::<_, i64>(1)?, row.get::<_, String>(2)?))
            })?
            .collect::<Result<Vec<_>, _>>()?;
        rows.into_iter()
            .map(|(id, rank, name)| {
                RankedRecord::new(id, rank, name).map_err(PersistenceError::from)
            })
            .collect()
    }

    pub fn count(&self, table: Table) -> Result<usize, PersistenceError> {
        let sql = format!("SELECT COUNT(*) FROM {}", table.name());
        let n: i64 = self.conn.query_row(&sql, [], |row| row.get(0))?;
        Ok(usize::try_from(n).unwrap_or_default())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Table {
    Games,
    Statistics,
    Mechanics,
}

impl Table {
    fn name(self) -> &'static str {
        match self {
            Self::Games => "games",
            Self::Statistics => "game_statistics",
            Self::Mechanics => "game_mechanics",
        }
    }
}

impl Store for SqliteStore {
    type Session<'s> = SqliteSession<'s>
    where
        Self: 's;

    fn session(&mut self) -> Result<SqliteSession<'_>, PersistenceError> {
        Ok(SqliteSession(self.conn.transaction()?))
    }
}

/// Wraps a transaction, which rolls back when dropped uncommitted.
pub struct SqliteSession<'c>(Transaction<'c>);

impl Session for SqliteSession<'_> {
    fn insert_rankings(&mut self, records: &[RankedRecord]) -> Result<(), PersistenceError> {
        let mut stmt = self
            .0
            .prepare_cached("INSERT INTO games (id, rank, name) VALUES (?1, ?2, ?3)")?;
        for r in records {
            stmt.execute(params![r.id(), r.rank(), r.name()])?;
        }
        Ok(())
    }

    fn insert_statistics(&mut self, records: &[StatisticsRecord]) -> Result<(), PersistenceError> {
        let mut stmt = self.0.prepare_cached(
            "INSERT INTO game_statistics (
                id, description, year_published, min_players, max_players,
                suggested_num_player, min_age, average_rating, average_weight
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        )?;
        for r in records {
            stmt.execute(params![
                r.id(),
                r.description(),
                r.year_published(),
                r.min_players(),
                r.max_players(),
                r.suggested_num_player(),
                r.min_age(),
                r.average_rating(),
                r.average_weight(),
            ])?;
        }
        Ok(())
    }

    fn insert_mechanics(&mut self, records: &[MechanicRecord]) -> Result<(), PersistenceError> {
        let mut stmt = self
            .0
            .prepare_cached("INSERT INTO game_mechanics (id, mechanic_name) VALUES (?1, ?2)")?;
        for r in records {
            stmt.execute(params![r.id(), r.mechanic_name()])?;
        }
        Ok(())
    }

    fn commit(self) -> Result<(), PersistenceError> {
        Ok(self.0.commit()?)
    }

    fn rollback(self) -> Result<(), PersistenceError> {
        Ok(self.0.rollback()?)
    }
}
