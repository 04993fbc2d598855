//! Extraction of BoardGameGeek records from catalog pages and XML API documents.
//!
//! Extraction turns markup into raw fields, validation turns raw fields into
//! records. Nothing leaves this crate without having gone through both.

mod error;
pub mod markup;
pub mod ranking;
pub mod record;
pub mod stats;

pub use error::{ExtractionError, RecordError, ValidationError};
pub use markup::{Markup, XmlMarkup};
pub use record::{MechanicRecord, RankedRecord, StatisticsFields, StatisticsRecord};
