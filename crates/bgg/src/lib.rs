//! Harvest the BoardGameGeek catalog into a relational store.
//!
//! [`PipelineOrchestrator`] walks every catalog page and persists the ranked
//! games all-or-nothing. [`StatisticsPipeline`] then enriches the stored games
//! with the statistics of the XML API.

mod pipeline;
mod stats;

pub use pipeline::{PipelineError, PipelineOrchestrator};
pub use stats::{
    extract_and_validate_mechanics, extract_and_validate_statistics, GameDetails,
    StatisticsPipeline,
};

pub use bgg_crawler as crawler;
pub use bgg_scraper as scraper;
pub use bgg_store as store;
