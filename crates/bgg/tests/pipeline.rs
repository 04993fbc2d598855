use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;
use std::sync::Arc;

use bgg::{GameDetails, PipelineError, PipelineOrchestrator, StatisticsPipeline};
use bgg_crawler::{CrawlerConfig, Level, MemorySink, OnError, Response, Transport, TransportError};
use bgg_scraper::{MechanicRecord, RankedRecord, StatisticsRecord};
use bgg_store::{PersistenceError, Session, SqliteStore, Store, Table};

#[derive(Default)]
struct FakeTransport {
    pages: HashMap<String, String>,
    requests: Cell<usize>,
}

impl FakeTransport {
    fn serve(mut self, url: &str, body: impl Into<String>) -> Self {
        self.pages.insert(url.to_string(), body.into());
        self
    }

    fn catalog(self, page: u32, body: impl Into<String>) -> Self {
        self.serve(
            &format!("https://boardgamegeek.com/browse/boardgame/page/{page}"),
            body,
        )
    }

    fn thing(self, id: i64, body: impl Into<String>) -> Self {
        self.serve(
            &format!("https://boardgamegeek.com/xmlapi2/thing?id={id}&stats=1"),
            body,
        )
    }
}

impl Transport for FakeTransport {
    fn get(&self, url: &str, _headers: &[(&str, String)]) -> Result<Response, TransportError> {
        self.requests.set(self.requests.get() + 1);
        Ok(match self.pages.get(url) {
            Some(body) => Response {
                status: 200,
                body: body.clone(),
            },
            None => Response {
                status: 404,
                body: String::from("Not Found"),
            },
        })
    }
}

fn config() -> CrawlerConfig {
    CrawlerConfig {
        delay: 0.0,
        ..Default::default()
    }
}

/// A catalog page listing `(id, rank, name)`, with a last page link when `last` is set.
fn catalog_page(games: &[(i64, i64, &str)], last: Option<u32>) -> String {
    let pagination = last
        .map(|n| format!(r#"<a href="/browse/boardgame/page/{n}" title="last page">[{n}]</a>"#))
        .unwrap_or_default();
    let rows = games
        .iter()
        .map(|(id, rank, name)| {
            format!(
                r#"<tr><td class="collection_rank">
                    {rank}
                </td><td><a href="/boardgame/{id}/slug" class="primary">{name}</a></td></tr>"#
            )
        })
        .collect::<String>();
    format!("<html><body>{pagination}<table>{rows}</table></body></html>")
}

fn game(id: i64, rank: i64, name: &str) -> RankedRecord {
    RankedRecord::new(id, rank, name).unwrap()
}

fn store() -> SqliteStore {
    let store = SqliteStore::open_in_memory().unwrap();
    store.create_tables().unwrap();
    store
}

fn three_page_catalog() -> FakeTransport {
    FakeTransport::default()
        .catalog(
            1,
            catalog_page(
                &[(224517, 1, "Brass: Birmingham"), (161936, 2, "Pandemic Legacy")],
                Some(3),
            ),
        )
        .catalog(2, catalog_page(&[(342942, 3, "Ark Nova")], Some(3)))
        .catalog(3, catalog_page(&[(174430, 4, "Gloomhaven")], Some(3)))
}

#[test]
fn catalog_scrape_walks_every_page_in_order() {
    let sink = Arc::new(MemorySink::default());
    let mut orchestrator = PipelineOrchestrator::new(&config(), three_page_catalog(), sink.clone());

    assert_eq!(
        vec![
            game(224517, 1, "Brass: Birmingham"),
            game(161936, 2, "Pandemic Legacy"),
            game(342942, 3, "Ark Nova"),
            game(174430, 4, "Gloomhaven"),
        ],
        orchestrator.run_catalog_scrape().unwrap()
    );
    assert!(sink.contains(Level::Info, "3 pages"));
}

#[test]
fn single_page_catalog() {
    let transport = FakeTransport::default().catalog(1, catalog_page(&[(13, 1, "CATAN")], Some(1)));
    let mut orchestrator =
        PipelineOrchestrator::new(&config(), transport, Arc::new(MemorySink::default()));

    assert_eq!(vec![game(13, 1, "CATAN")], orchestrator.run_catalog_scrape().unwrap());
}

#[test]
fn unavailable_first_page_aborts_the_run() {
    let sink = Arc::new(MemorySink::default());
    let mut orchestrator =
        PipelineOrchestrator::new(&config(), FakeTransport::default(), sink.clone());

    match orchestrator.run_catalog_scrape() {
        Err(PipelineError::FirstPageUnavailable { url }) => {
            assert_eq!("https://boardgamegeek.com/browse/boardgame/page/1", url)
        }
        res => panic!("unexpected result {res:?}"),
    }
    assert!(sink.contains(Level::Error, "couldn't be fetched"));
}

#[test]
fn first_page_without_pagination_bound_aborts_the_run() {
    let transport = FakeTransport::default().catalog(1, catalog_page(&[(13, 1, "CATAN")], None));
    let mut orchestrator =
        PipelineOrchestrator::new(&config(), transport, Arc::new(MemorySink::default()));

    assert!(matches!(
        orchestrator.run_catalog_scrape(),
        Err(PipelineError::NoPaginationBound(_))
    ));
}

#[test]
fn unavailable_page_is_a_gap() {
    let transport = FakeTransport::default()
        .catalog(1, catalog_page(&[(224517, 1, "Brass: Birmingham")], Some(3)))
        .catalog(3, catalog_page(&[(174430, 3, "Gloomhaven")], Some(3)));
    let sink = Arc::new(MemorySink::default());
    let mut orchestrator = PipelineOrchestrator::new(&config(), transport, sink.clone());

    assert_eq!(
        vec![game(224517, 1, "Brass: Birmingham"), game(174430, 3, "Gloomhaven")],
        orchestrator.run_catalog_scrape().unwrap()
    );
    assert!(sink.contains(
        Level::Warn,
        "https://boardgamegeek.com/browse/boardgame/page/2"
    ));
    assert!(sink.contains(Level::Warn, "Catalog page 2 unavailable"));
}

#[test]
fn invalid_page_is_skipped_and_logged() {
    let transport =
        three_page_catalog().catalog(2, catalog_page(&[(342942, 0, "Ark Nova")], Some(3)));
    let sink = Arc::new(MemorySink::default());
    let mut orchestrator = PipelineOrchestrator::new(&config(), transport, sink.clone());

    assert_eq!(
        vec![
            game(224517, 1, "Brass: Birmingham"),
            game(161936, 2, "Pandemic Legacy"),
            game(174430, 4, "Gloomhaven"),
        ],
        orchestrator.run_catalog_scrape().unwrap()
    );
    assert!(sink.contains(Level::Error, "Skipping catalog page 2"));
    assert!(sink.contains(Level::Error, "rank"));
}

#[test]
fn invalid_page_fails_the_run_when_asked_to() {
    let transport = three_page_catalog().catalog(2, "<html>Not a catalog page</html>");
    let conf = CrawlerConfig {
        on_page_error: OnError::Fail,
        ..config()
    };
    let mut orchestrator =
        PipelineOrchestrator::new(&conf, transport, Arc::new(MemorySink::default()));

    assert!(matches!(
        orchestrator.run_catalog_scrape(),
        Err(PipelineError::Page { page: 2, .. })
    ));
}

#[test]
fn huge_pagination_bound_is_walked_page_by_page() {
    let transport = FakeTransport::default()
        .catalog(1, catalog_page(&[(13, 1, "CATAN")], Some(4_000_000_000)))
        .catalog(2, "<html>Not a catalog page</html>");
    let conf = CrawlerConfig {
        on_page_error: OnError::Fail,
        ..config()
    };
    let mut orchestrator =
        PipelineOrchestrator::new(&conf, &transport, Arc::new(MemorySink::default()));

    assert!(matches!(
        orchestrator.run_catalog_scrape(),
        Err(PipelineError::Page { page: 2, .. })
    ));
    assert_eq!(2, transport.requests.get());
}

#[test]
fn persisted_catalog_is_stored() {
    let mut orchestrator =
        PipelineOrchestrator::new(&config(), three_page_catalog(), Arc::new(MemorySink::default()));
    let records = orchestrator.run_catalog_scrape().unwrap();
    let mut store = store();

    orchestrator.persist(&mut store, &records).unwrap();

    assert_eq!(records, store.rankings().unwrap());
}

#[test]
fn failing_insert_persists_nothing() {
    let sink = Arc::new(MemorySink::default());
    let orchestrator =
        PipelineOrchestrator::new(&config(), FakeTransport::default(), sink.clone());
    let mut store = store();

    let res = orchestrator.persist(&mut store, &[game(13, 1, "CATAN"), game(13, 2, "CATAN again")]);

    assert!(matches!(res, Err(PersistenceError::Sqlite(_))));
    assert_eq!(0, store.count(Table::Games).unwrap());
    assert!(sink.contains(Level::Error, "rolling back"));
}

/// Records every call and fails the one named `rejects`.
struct RejectingStore {
    calls: Rc<RefCell<Vec<&'static str>>>,
    rejects: &'static str,
}

impl RejectingStore {
    fn rejecting(rejects: &'static str) -> Self {
        Self {
            calls: Rc::default(),
            rejects,
        }
    }
}

struct RejectingSession {
    calls: Rc<RefCell<Vec<&'static str>>>,
    rejects: &'static str,
}

impl Store for RejectingStore {
    type Session<'s> = RejectingSession
    where
        Self: 's;

    fn session(&mut self) -> Result<RejectingSession, PersistenceError> {
        Ok(RejectingSession {
            calls: self.calls.clone(),
            rejects: self.rejects,
        })
    }
}

impl RejectingSession {
    fn call(&self, name: &'static str) -> Result<(), PersistenceError> {
        self.calls.borrow_mut().push(name);
        if name == self.rejects {
            return Err(PersistenceError::Rejected(format!("{name} rejected")));
        }
        Ok(())
    }
}

impl Session for RejectingSession {
    fn insert_rankings(&mut self, _records: &[RankedRecord]) -> Result<(), PersistenceError> {
        self.call("insert_rankings")
    }

    fn insert_statistics(&mut self, _records: &[StatisticsRecord]) -> Result<(), PersistenceError> {
        self.call("insert_statistics")
    }

    fn insert_mechanics(&mut self, _records: &[MechanicRecord]) -> Result<(), PersistenceError> {
        self.call("insert_mechanics")
    }

    fn commit(self) -> Result<(), PersistenceError> {
        self.call("commit")
    }

    fn rollback(self) -> Result<(), PersistenceError> {
        self.call("rollback")
    }
}

#[test]
fn failing_insert_is_rolled_back_never_committed() {
    let orchestrator = PipelineOrchestrator::new(
        &config(),
        FakeTransport::default(),
        Arc::new(MemorySink::default()),
    );
    let mut store = RejectingStore::rejecting("insert_rankings");

    let res = orchestrator.persist(&mut store, &[game(13, 1, "CATAN")]);

    assert!(matches!(res, Err(PersistenceError::Rejected(_))));
    assert_eq!(vec!["insert_rankings", "rollback"], *store.calls.borrow());
}

#[test]
fn failing_commit_is_reported() {
    let sink = Arc::new(MemorySink::default());
    let orchestrator =
        PipelineOrchestrator::new(&config(), FakeTransport::default(), sink.clone());
    let mut store = RejectingStore::rejecting("commit");

    let res = orchestrator.persist(&mut store, &[game(13, 1, "CATAN")]);

    match res {
        Err(PersistenceError::Rejected(reason)) => assert_eq!("commit rejected", reason),
        res => panic!("unexpected result {res:?}"),
    }
    assert_eq!(vec!["insert_rankings", "commit"], *store.calls.borrow());
    assert!(sink.contains(Level::Error, "Commit failed"));
}

fn thing(min_players: u32, max_players: u32) -> String {
    format!(
        r#"<?xml version="1.0" encoding="utf-8"?>
<items>
    <item type="boardgame" id="1">
        <description>Checkmate your opponent</description>
        <yearpublished value="1475"/>
        <minplayers value="{min_players}"/>
        <maxplayers value="{max_players}"/>
        <poll name="suggested_numplayers">
            <results numplayers="2"><result value="Best" numvotes="120"/></results>
        </poll>
        <minage value="6"/>
        <link type="boardgamemechanic" id="2023" value="Grid Movement"/>
        <link type="boardgamemechanic" id="2048" value="Pattern Recognition"/>
        <statistics page="1">
            <ratings>
                <average value="7.2"/>
                <averageweight value="3.64"/>
            </ratings>
        </statistics>
    </item>
</items>"#
    )
}

#[test]
fn statistics_scrape_keeps_valid_games_only() {
    let transport = FakeTransport::default()
        .thing(171, thing(2, 2))
        .thing(173, thing(4, 2))
        .thing(174, "<items><item>");
    let sink = Arc::new(MemorySink::default());
    let mut pipeline = StatisticsPipeline::new(&config(), transport, sink.clone());

    let details = pipeline.run_statistics_scrape(&[171, 172, 173, 174]);

    assert_eq!(
        vec![171],
        details.iter().map(|d| d.statistics.id()).collect::<Vec<_>>()
    );
    assert_eq!(
        vec!["Grid Movement", "Pattern Recognition"],
        details[0]
            .mechanics
            .iter()
            .map(|m| m.mechanic_name())
            .collect::<Vec<_>>()
    );
    assert!(sink.contains(Level::Warn, "thing?id=172"));
    assert!(sink.contains(Level::Error, "game 173"));
    assert!(sink.contains(Level::Error, "game 174"));
}

#[test]
fn persisted_statistics_are_stored() {
    let transport = FakeTransport::default().thing(171, thing(2, 2));
    let mut pipeline =
        StatisticsPipeline::new(&config(), transport, Arc::new(MemorySink::default()));
    let details = pipeline.run_statistics_scrape(&[171]);
    let mut store = store();

    pipeline.persist_statistics(&mut store, &details).unwrap();

    assert_eq!(1, store.count(Table::Statistics).unwrap());
    assert_eq!(2, store.count(Table::Mechanics).unwrap());
}

#[test]
fn failing_mechanics_insert_discards_statistics_too() {
    let transport = FakeTransport::default().thing(171, thing(2, 2));
    let mut pipeline =
        StatisticsPipeline::new(&config(), transport, Arc::new(MemorySink::default()));
    let details: Vec<GameDetails> = pipeline.run_statistics_scrape(&[171]);
    let mut store = RejectingStore::rejecting("insert_mechanics");

    let res = pipeline.persist_statistics(&mut store, &details);

    assert!(matches!(res, Err(PersistenceError::Rejected(_))));
    assert_eq!(
        vec!["insert_statistics", "insert_mechanics", "rollback"],
        *store.calls.borrow()
    );
}

