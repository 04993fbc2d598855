use std::sync::Arc;

use bgg_crawler::{
    emit, Clock, CrawlerConfig, EventSink, Level, OnError, PageBatch, PageSource, RateLimiter,
    SystemClock, Transport,
};
use bgg_scraper::{ranking, ExtractionError, Markup, RankedRecord, RecordError};
use bgg_store::{PersistenceError, Session, Store};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("First catalog page {url} couldn't be fetched")]
    FirstPageUnavailable { url: String },
    #[error("Couldn't find the last page number on the first catalog page: {0}")]
    NoPaginationBound(#[source] ExtractionError),
    #[error("Catalog page {page} failed: {source}")]
    Page {
        page: u32,
        #[source]
        source: RecordError,
    },
    #[error(transparent)]
    Persistence(#[from] PersistenceError),
}

/// Drives one catalog scrape from page 1 to the last page, then persists it.
pub struct PipelineOrchestrator<T, C = SystemClock> {
    source: PageSource<T, C>,
    on_page_error: OnError,
    sink: Arc<dyn EventSink>,
}

impl<T> PipelineOrchestrator<T>
where
    T: Transport,
{
    pub fn new(config: &CrawlerConfig, transport: T, sink: Arc<dyn EventSink>) -> Self {
        let limiter = RateLimiter::with_clock(config.delay, config.jitter, SystemClock);
        Self::with_limiter(config, transport, limiter, sink)
    }
}

impl<T, C> PipelineOrchestrator<T, C>
where
    T: Transport,
    C: Clock,
{
    pub fn with_limiter(
        config: &CrawlerConfig,
        transport: T,
        limiter: RateLimiter<C>,
        sink: Arc<dyn EventSink>,
    ) -> Self {
        Self {
            source: PageSource::with_limiter(config, transport, limiter, sink.clone()),
            on_page_error: config.on_page_error,
            sink,
        }
    }

    /// Every ranked record of the catalog, in page order then document order.
    ///
    /// Pages that can't be fetched contribute no record. Pages that can't be
    /// extracted contribute no record unless `on_page_error` is `Fail`.
    pub fn run_catalog_scrape(&mut self) -> Result<Vec<RankedRecord>, PipelineError> {
        let first = self.source.fetch_page(1).ok_or_else(|| {
            let url = self.source.page_url(1);
            emit!(self.sink, Level::Error, "First catalog page {url} couldn't be fetched");
            PipelineError::FirstPageUnavailable { url }
        })?;

        let bound = ranking::extract_pagination_bound(&Markup::parse(&first)).map_err(|e| {
            emit!(self.sink, Level::Error, "No last page number on page 1: {e}");
            PipelineError::NoPaginationBound(e)
        })?;
        emit!(self.sink, Level::Info, "Catalog has {bound} pages");

        let Self {
            source,
            on_page_error,
            sink,
        } = self;
        let first = PageBatch {
            page: 1,
            body: Some(first),
        };
        let mut records = page_records(&first, *on_page_error, &**sink)?;
        let mut pages = 1;
        for batch in source.page_range(2, bound) {
            records.extend(page_records(&batch, *on_page_error, &**sink)?);
            pages += 1;
        }
        emit!(
            sink,
            Level::Info,
            "Gathered {} ranked records from {pages} pages",
            records.len()
        );

        Ok(records)
    }

    /// Inserts all `records` in one session: either all of them land or none does.
    pub fn persist<S>(
        &self,
        store: &mut S,
        records: &[RankedRecord],
    ) -> Result<(), PersistenceError>
    where
        S: Store,
    {
        emit!(self.sink, Level::Info, "Inserting {} ranked records", records.len());
        let mut session = store.session()?;
        let inserted = session.insert_rankings(records);
        finish(session, inserted, &*self.sink)
    }
}

fn page_records(
    batch: &PageBatch,
    on_page_error: OnError,
    sink: &dyn EventSink,
) -> Result<Vec<RankedRecord>, PipelineError> {
    let Some(body) = &batch.body else {
        emit!(
            sink,
            Level::Warn,
            "Catalog page {} unavailable, it contributes no record",
            batch.page
        );
        return Ok(vec![]);
    };

    match ranking::extract_and_validate_page(body) {
        Ok(records) => Ok(records),
        Err(e) => match on_page_error {
            OnError::SkipAndLog => {
                emit!(sink, Level::Error, "Skipping catalog page {} got: {e}", batch.page);
                Ok(vec![])
            }
            OnError::Fail => Err(PipelineError::Page {
                page: batch.page,
                source: e,
            }),
        },
    }
}

/// Commits `session` when `inserted` succeeded, rolls it back otherwise.
pub(crate) fn finish<X>(
    session: X,
    inserted: Result<(), PersistenceError>,
    sink: &dyn EventSink,
) -> Result<(), PersistenceError>
where
    X: Session,
{
    match inserted {
        Ok(()) => session.commit().map_err(|e| {
            emit!(sink, Level::Error, "Commit failed, nothing was persisted: {e}");
            e
        }),
        Err(e) => {
            emit!(sink, Level::Error, "Bulk insert failed, rolling back: {e}");
            if let Err(rollback) = session.rollback() {
                emit!(sink, Level::Error, "Rollback failed: {rollback}");
            }
            Err(e)
        }
    }
}
