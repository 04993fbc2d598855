//! Validated records.
//!
//! Every record type can only be obtained through a constructor that checks
//! all of its invariants, and exposes its fields read-only afterwards.

use chrono::Datelike;
use serde::Serialize;

use crate::error::ValidationError;

/// One entry of the catalog ranking.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RankedRecord {
    id: i64,
    rank: i64,
    name: String,
}

impl RankedRecord {
    pub fn new(id: i64, rank: i64, name: impl Into<String>) -> Result<Self, ValidationError> {
        let name = name.into();
        positive("id", id)?;
        positive("rank", rank)?;
        non_empty("name", &name)?;
        Ok(Self { id, rank, name })
    }

    pub fn id(&self) -> i64 {
        self.id
    }

    pub fn rank(&self) -> i64 {
        self.rank
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

/// Unchecked statistics, as extracted from a document.
#[derive(Debug, Clone, PartialEq)]
pub struct StatisticsFields {
    pub id: i64,
    pub description: String,
    pub year_published: i64,
    pub min_players: i64,
    pub max_players: i64,
    pub suggested_num_player: i64,
    pub min_age: i64,
    pub average_rating: f64,
    pub average_weight: f64,
}

/// Detailed attributes of one catalog entry.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatisticsRecord {
    id: i64,
    description: String,
    year_published: i64,
    min_players: i64,
    max_players: i64,
    suggested_num_player: i64,
    min_age: i64,
    average_rating: f64,
    average_weight: f64,
}

impl StatisticsRecord {
    /// Validates `fields` against the current local calendar year.
    pub fn new(fields: StatisticsFields) -> Result<Self, ValidationError> {
        Self::new_as_of(fields, i64::from(chrono::Local::now().year()))
    }

    pub fn new_as_of(fields: StatisticsFields, current_year: i64) -> Result<Self, ValidationError> {
        let StatisticsFields {
            id,
            description,
            year_published,
            min_players,
            max_players,
            suggested_num_player,
            min_age,
            average_rating,
            average_weight,
        } = fields;

        positive("id", id)?;
        if year_published > current_year {
            return Err(ValidationError::FutureYear {
                value: year_published,
                current: current_year,
            });
        }
        positive("min_players", min_players)?;
        positive("max_players", max_players)?;
        positive("suggested_num_player", suggested_num_player)?;
        positive("min_age", min_age)?;
        non_negative("average_rating", average_rating)?;
        non_negative("average_weight", average_weight)?;
        if max_players < min_players {
            return Err(ValidationError::PlayerRange {
                min: min_players,
                max: max_players,
            });
        }

        Ok(Self {
            id,
            description,
            year_published,
            min_players,
            max_players,
            suggested_num_player,
            min_age,
            average_rating,
            average_weight,
        })
    }

    pub fn id(&self) -> i64 {
        self.id
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn year_published(&self) -> i64 {
        self.year_published
    }

    pub fn min_players(&self) -> i64 {
        self.min_players
    }

    pub fn max_players(&self) -> i64 {
        self.max_players
    }

    pub fn suggested_num_player(&self) -> i64 {
        self.suggested_num_player
    }

    pub fn min_age(&self) -> i64 {
        self.min_age
    }

    pub fn average_rating(&self) -> f64 {
        self.average_rating
    }

    pub fn average_weight(&self) -> f64 {
        self.average_weight
    }
}

/// A game mechanic attached to a catalog entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MechanicRecord {
    id: i64,
    mechanic_name: String,
}

impl MechanicRecord {
    pub fn new(id: i64, mechanic_name: impl Into<String>) -> Result<Self, ValidationError> {
        let mechanic_name = mechanic_name.into();
        positive("id", id)?;
        non_empty("mechanic_name", &mechanic_name)?;
        Ok(Self { id, mechanic_name })
    }

    pub fn id(&self) -> i64 {
        self.id
    }

    pub fn mechanic_name(&self) -> &str {
        &self.mechanic_name
    }
}

fn positive(field: &'static str, value: i64) -> Result<(), ValidationError> {
    if value > 0 {
        Ok(())
    } else {
        Err(ValidationError::NotPositive { field, value })
    }
}

fn non_negative(field: &'static str, value: f64) -> Result<(), ValidationError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(ValidationError::Negative { field, value })
    }
}

fn non_empty(field: &'static str, value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        Err(ValidationError::Empty { field })
    } else {
        Ok(())
    }
}
