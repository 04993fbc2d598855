use crate::error::{ExtractionError, RecordError};
use crate::markup::Markup;
use crate::record::RankedRecord;

const ENTRY_TAG: &str = "a";
const ENTRY_CLASS: &str = "primary";
const RANK_TAG: &str = "td";
const RANK_CLASS: &str = "collection_rank";
const LAST_PAGE_TITLE: &str = "last page";

// `/boardgame/224517/brass-birmingham` splits into ["", "boardgame", "224517", ..]
const ID_SEGMENT: usize = 2;

/// The `(id, name)` of every primary entry anchor, in document order.
pub fn extract_identities_and_labels(
    page: &Markup,
) -> Result<Vec<(i64, String)>, ExtractionError> {
    let anchors = page.find_by_class(ENTRY_TAG, ENTRY_CLASS);
    if anchors.is_empty() {
        return Err(ExtractionError::Missing(format!("{ENTRY_TAG}.{ENTRY_CLASS}")));
    }

    anchors
        .iter()
        .map(|anchor| {
            let href = anchor.attr("href").ok_or_else(|| ExtractionError::Unparsable {
                what: "href",
                text: anchor.text(),
            })?;
            let id = href
                .split('/')
                .nth(ID_SEGMENT)
                .and_then(|segment| segment.parse::<i64>().ok())
                .ok_or_else(|| ExtractionError::Unparsable {
                    what: "entry id",
                    text: href.to_string(),
                })?;
            Ok((id, anchor.text().trim().to_string()))
        })
        .collect()
}

/// The value of every rank cell, in document order.
pub fn extract_ranks(page: &Markup) -> Result<Vec<i64>, ExtractionError> {
    let cells = page.find_by_class(RANK_TAG, RANK_CLASS);
    if cells.is_empty() {
        return Err(ExtractionError::Missing(format!("{RANK_TAG}.{RANK_CLASS}")));
    }

    cells
        .iter()
        .map(|cell| {
            let text = cell.text();
            let stripped: String = text.chars().filter(|c| !c.is_whitespace()).collect();
            stripped
                .parse::<i64>()
                .map_err(|_| ExtractionError::Unparsable { what: "rank", text })
        })
        .collect()
}

/// The highest page number, read from the `[1727]` shaped "last page" control.
pub fn extract_pagination_bound(page: &Markup) -> Result<u32, ExtractionError> {
    let link = page
        .find_by_attr("a", "title", LAST_PAGE_TITLE)
        .into_iter()
        .next()
        .ok_or_else(|| ExtractionError::Missing(format!("a[title='{LAST_PAGE_TITLE}']")))?;

    let text = link.text();
    let mut chars = text.trim().chars();
    chars.next();
    chars.next_back();
    chars
        .as_str()
        .parse::<u32>()
        .map_err(|_| ExtractionError::Unparsable {
            what: "last page number",
            text: text.clone(),
        })
}

/// Pairs the Nth entry anchor with the Nth rank cell and validates each pair.
///
/// Both sequences must have the same length, otherwise entries and ranks can
/// no longer be told apart and the whole page is rejected.
pub fn extract_and_validate(page: &Markup) -> Result<Vec<RankedRecord>, RecordError> {
    let identities = extract_identities_and_labels(page)?;
    let ranks = extract_ranks(page)?;
    if identities.len() != ranks.len() {
        return Err(ExtractionError::LengthMismatch {
            identities: identities.len(),
            ranks: ranks.len(),
        }
        .into());
    }

    identities
        .into_iter()
        .zip(ranks)
        .map(|((id, name), rank)| RankedRecord::new(id, rank, name).map_err(RecordError::from))
        .collect()
}

pub fn extract_and_validate_page(text: &str) -> Result<Vec<RankedRecord>, RecordError> {
    extract_and_validate(&Markup::parse(text))
}
