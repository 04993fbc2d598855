use std::sync::Arc;

use bgg_crawler::{
    emit, Clock, CrawlerConfig, EventSink, Level, RateLimiter, SystemClock, Transport, XmlApi,
};
use bgg_scraper::{stats, MechanicRecord, StatisticsRecord, XmlMarkup};
use bgg_store::{PersistenceError, Session, Store};

use crate::pipeline::finish;

/// Validated statistics of `id`, or `None` after logging why the document was rejected.
pub fn extract_and_validate_statistics(
    document: &XmlMarkup,
    id: i64,
    sink: &dyn EventSink,
) -> Option<StatisticsRecord> {
    match stats::extract_statistics(document, id) {
        Ok(record) => Some(record),
        Err(e) => {
            emit!(sink, Level::Error, "Skipping statistics of game {id} got: {e}");
            None
        }
    }
}

pub fn extract_and_validate_mechanics(
    document: &XmlMarkup,
    id: i64,
    sink: &dyn EventSink,
) -> Option<Vec<MechanicRecord>> {
    match stats::extract_mechanics(document, id) {
        Ok(records) => Some(records),
        Err(e) => {
            emit!(sink, Level::Error, "Skipping mechanics of game {id} got: {e}");
            None
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct GameDetails {
    pub statistics: StatisticsRecord,
    pub mechanics: Vec<MechanicRecord>,
}

/// Fetches the XML API document of already ranked games.
pub struct StatisticsPipeline<T, C = SystemClock> {
    api: XmlApi<T, C>,
    sink: Arc<dyn EventSink>,
}

impl<T> StatisticsPipeline<T>
where
    T: Transport,
{
    pub fn new(config: &CrawlerConfig, transport: T, sink: Arc<dyn EventSink>) -> Self {
        let limiter = RateLimiter::with_clock(config.delay, config.jitter, SystemClock);
        Self::with_limiter(config, transport, limiter, sink)
    }
}

impl<T, C> StatisticsPipeline<T, C>
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
            api: XmlApi::with_limiter(config, transport, limiter, sink.clone()),
            sink,
        }
    }

    /// Details of every game of `ids` whose document could be fetched and validated.
    ///
    /// A game whose mechanics are unusable keeps its statistics with no mechanic.
    pub fn run_statistics_scrape(&mut self, ids: &[i64]) -> Vec<GameDetails> {
        let mut details = Vec::with_capacity(ids.len());
        for &id in ids {
            let Some(text) = self.api.fetch_thing(id, true) else {
                continue;
            };
            let document = match XmlMarkup::parse(&text) {
                Ok(document) => document,
                Err(e) => {
                    emit!(self.sink, Level::Error, "Skipping statistics of game {id} got: {e}");
                    continue;
                }
            };
            let Some(statistics) = extract_and_validate_statistics(&document, id, &*self.sink)
            else {
                continue;
            };
            let mechanics =
                extract_and_validate_mechanics(&document, id, &*self.sink).unwrap_or_default();
            details.push(GameDetails {
                statistics,
                mechanics,
            });
        }
        emit!(
            self.sink,
            Level::Info,
            "Gathered statistics of {} out of {} games",
            details.len(),
            ids.len()
        );
        details
    }

    /// Inserts all statistics and mechanics of `details` in one session.
    pub fn persist_statistics<S>(
        &self,
        store: &mut S,
        details: &[GameDetails],
    ) -> Result<(), PersistenceError>
    where
        S: Store,
    {
        let statistics = details
            .iter()
            .map(|d| d.statistics.clone())
            .collect::<Vec<_>>();
        let mechanics = details
            .iter()
            .flat_map(|d| d.mechanics.iter().cloned())
            .collect::<Vec<_>>();
        emit!(
            self.sink,
            Level::Info,
            "Inserting {} statistics and {} mechanics",
            statistics.len(),
            mechanics.len()
        );

        let mut session = store.session()?;
        let inserted = session
            .insert_statistics(&statistics)
            .and_then(|()| session.insert_mechanics(&mechanics));
        finish(session, inserted, &*self.sink)
    }
}
