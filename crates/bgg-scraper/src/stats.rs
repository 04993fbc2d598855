use crate::error::{ExtractionError, RecordError};
use crate::markup::XmlMarkup;
use crate::record::{MechanicRecord, StatisticsFields, StatisticsRecord};

const ITEM: &str = "/items/item";
const PLAYER_POLL: &str = "/items/item/poll[@name='suggested_numplayers']";

pub fn extract_description(doc: &XmlMarkup) -> Result<String, ExtractionError> {
    doc.required_value(&format!("{ITEM}/description"))
}

pub fn extract_year_published(doc: &XmlMarkup) -> Result<i64, ExtractionError> {
    count_attr(doc, "yearpublished")
}

pub fn extract_min_players(doc: &XmlMarkup) -> Result<i64, ExtractionError> {
    count_attr(doc, "minplayers")
}

pub fn extract_max_players(doc: &XmlMarkup) -> Result<i64, ExtractionError> {
    count_attr(doc, "maxplayers")
}

pub fn extract_min_age(doc: &XmlMarkup) -> Result<i64, ExtractionError> {
    count_attr(doc, "minage")
}

pub fn extract_average_rating(doc: &XmlMarkup) -> Result<f64, ExtractionError> {
    let value = doc.required_value(&format!("{ITEM}/statistics/ratings/average/@value"))?;
    parse_decimal("average", value)
}

pub fn extract_average_weight(doc: &XmlMarkup) -> Result<f64, ExtractionError> {
    let value = doc.required_value(&format!("{ITEM}/statistics/ratings/averageweight/@value"))?;
    parse_decimal("averageweight", value)
}

/// The player count with the most "Best" votes in the suggested players poll.
///
/// Ties keep the first maximum in document order. Open-ended groups such as
/// `4+` don't denote a player count and are skipped.
pub fn extract_suggested_num_player(doc: &XmlMarkup) -> Result<i64, ExtractionError> {
    if doc.first_value(PLAYER_POLL)?.is_none() {
        return Err(ExtractionError::Missing(PLAYER_POLL.to_string()));
    }

    let groups = doc.values(&format!("{PLAYER_POLL}/results"))?.len();
    let mut best: Option<(i64, i64)> = None;
    for i in 1..=groups {
        let group = format!("{PLAYER_POLL}/results[{i}]");
        let num_players = doc.required_value(&format!("{group}/@numplayers"))?;
        let num_votes = doc.required_value(&format!("{group}/result[@value='Best']/@numvotes"))?;
        let num_votes = parse_count("numvotes", num_votes)?;

        if num_players.trim_end().ends_with('+') {
            continue;
        }
        let num_players = parse_count("numplayers", num_players)?;

        if best.map_or(true, |(max_votes, _)| num_votes > max_votes) {
            best = Some((num_votes, num_players));
        }
    }

    best.map(|(_, num_players)| num_players)
        .ok_or_else(|| ExtractionError::Missing(format!("{PLAYER_POLL}/results")))
}

pub fn extract_statistics(doc: &XmlMarkup, id: i64) -> Result<StatisticsRecord, RecordError> {
    let fields = StatisticsFields {
        id,
        description: extract_description(doc)?,
        year_published: extract_year_published(doc)?,
        min_players: extract_min_players(doc)?,
        max_players: extract_max_players(doc)?,
        suggested_num_player: extract_suggested_num_player(doc)?,
        min_age: extract_min_age(doc)?,
        average_rating: extract_average_rating(doc)?,
        average_weight: extract_average_weight(doc)?,
    };
    Ok(StatisticsRecord::new(fields)?)
}

pub fn extract_mechanics(doc: &XmlMarkup, id: i64) -> Result<Vec<MechanicRecord>, RecordError> {
    doc.values(&format!("{ITEM}/link[@type='boardgamemechanic']/@value"))?
        .into_iter()
        .map(|name| MechanicRecord::new(id, name).map_err(RecordError::from))
        .collect()
}

fn count_attr(doc: &XmlMarkup, tag: &'static str) -> Result<i64, ExtractionError> {
    let value = doc.required_value(&format!("{ITEM}/{tag}/@value"))?;
    parse_count(tag, value)
}

fn parse_count(what: &'static str, text: String) -> Result<i64, ExtractionError> {
    let trimmed = text.trim();
    if !trimmed.is_empty() && trimmed.chars().all(|c| c.is_ascii_digit()) {
        if let Ok(n) = trimmed.parse() {
            return Ok(n);
        }
    }
    Err(ExtractionError::Unparsable { what, text })
}

fn parse_decimal(what: &'static str, text: String) -> Result<f64, ExtractionError> {
    let trimmed = text.trim();
    let well_formed = match trimmed.split_once('.') {
        Some((int, frac)) => is_digits(int) && is_digits(frac),
        None => is_digits(trimmed),
    };
    match trimmed.parse() {
        Ok(n) if well_formed => Ok(n),
        _ => Err(ExtractionError::Unparsable { what, text }),
    }
}

fn is_digits(s: &str) -> bool {
    !s.is_empty() && s.chars().all(|c| c.is_ascii_digit())
}
