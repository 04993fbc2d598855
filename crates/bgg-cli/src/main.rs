use std::fs::{self, File};
use std::io;
use std::path::PathBuf;
use std::sync::Arc;

use bgg::{PipelineOrchestrator, StatisticsPipeline};
use bgg_crawler::{CrawlerConfig, EventSink, HttpTransport, LogSink, OnError, Transport};
use bgg_scraper::ranking::extract_and_validate_page;
use bgg_store::SqliteStore;
use clap::{CommandFactory, Parser};
use clap_complete::{generate, Shell};
use env_logger::Env;

/// BoardGameGeek rankings harvester
#[derive(Debug, Parser)]
#[clap(version)]
pub struct Args {
    #[clap(subcommand)]
    pub cmd: SubCommand,
}

#[derive(Debug, clap::Subcommand)]
pub enum SubCommand {
    #[clap(name = "crawl")]
    Crawl(CrawlArgs),
    #[clap(name = "stats")]
    Stats(StatsArgs),
    #[clap(name = "scrap")]
    Scrap(ScrapArgs),
    #[clap(hide = true)]
    Completion,
}

#[derive(Debug, clap::Args)]
pub struct ConfigArgs {
    /// Optional default crawler yaml configuration file
    #[clap(env = "BGG_CRAWLER_CONFIG", long, value_parser)]
    pub crawler_config: Option<PathBuf>,
    /// Override crawler's user agent
    #[clap(long)]
    pub user_agent: Option<String>,
    /// Override crawler's minimum delay in seconds between two requests
    #[clap(long)]
    pub delay: Option<f32>,
    /// Override crawler's XML API bearer token
    #[clap(env = "BGG_API_TOKEN", long, hide_env_values = true)]
    pub api_token: Option<String>,
    /// Override crawler's catalog page error handling strategy
    #[clap(value_enum, long)]
    pub on_page_error: Option<OnError>,
    /// When quiet no logs are outputted
    #[clap(long, short)]
    pub quiet: bool,
}

impl TryFrom<&ConfigArgs> for CrawlerConfig {
    type Error = anyhow::Error;

    fn try_from(args: &ConfigArgs) -> Result<Self, Self::Error> {
        let mut conf = if let Some(file) = args.crawler_config.as_ref().map(File::open) {
            serde_yaml::from_reader(file?)?
        } else {
            CrawlerConfig::default()
        };
        if let Some(user_agent) = &args.user_agent {
            conf.user_agent = user_agent.to_string();
        }
        if let Some(delay) = args.delay {
            conf.delay = delay;
        }
        if let Some(api_token) = &args.api_token {
            conf.api_token = Some(api_token.to_string());
        }
        if let Some(on_page_error) = args.on_page_error {
            conf.on_page_error = on_page_error;
        }
        Ok(conf)
    }
}

/// Crawl the whole catalog and store its rankings
#[derive(Debug, clap::Args)]
pub struct CrawlArgs {
    /// Path to the SQLite database, created when missing
    #[clap(long, short, value_parser)]
    pub database: PathBuf,
    #[clap(flatten)]
    pub config: ConfigArgs,
}

pub fn crawl(args: CrawlArgs) -> anyhow::Result<()> {
    let conf: CrawlerConfig = (&args.config).try_into()?;
    let mut store = SqliteStore::open(&args.database)?;
    store.create_tables()?;

    let sink: Arc<dyn EventSink> = Arc::new(LogSink);
    let mut orchestrator = PipelineOrchestrator::new(&conf, HttpTransport::new(&conf)?, sink);
    let records = orchestrator.run_catalog_scrape()?;
    orchestrator.persist(&mut store, &records)?;
    log::info!("Stored {} games into {}", records.len(), args.database.display());
    Ok(())
}

/// Fetch and store the statistics of already crawled games
#[derive(Debug, clap::Args)]
pub struct StatsArgs {
    /// Path to the SQLite database filled by `crawl`
    #[clap(long, short, value_parser)]
    pub database: PathBuf,
    /// Only fetch the statistics of the best ranked games
    #[clap(long)]
    pub limit: Option<usize>,
    #[clap(flatten)]
    pub config: ConfigArgs,
}

pub fn stats(args: StatsArgs) -> anyhow::Result<()> {
    let conf: CrawlerConfig = (&args.config).try_into()?;
    let mut store = SqliteStore::open(&args.database)?;
    store.create_tables()?;
    let ids = store.game_ids(args.limit)?;

    let sink: Arc<dyn EventSink> = Arc::new(LogSink);
    let mut pipeline = StatisticsPipeline::new(&conf, HttpTransport::new(&conf)?, sink);
    let details = pipeline.run_statistics_scrape(&ids);
    pipeline.persist_statistics(&mut store, &details)?;
    log::info!("Stored statistics of {} games", details.len());
    Ok(())
}

/// Scrap a single catalog page and print its records to stdout
#[derive(Debug, clap::Args)]
#[clap(group = clap::ArgGroup::new("page").required(true))]
pub struct ScrapArgs {
    /// A local html page to scrap
    #[clap(group = "page", long, value_parser)]
    pub file: Option<PathBuf>,
    /// A distant html page to scrap
    #[clap(group = "page", long)]
    pub url: Option<String>,
    /// Custom user agent to download the page
    #[clap(long, conflicts_with = "file")]
    pub ua: Option<String>,
}

pub fn scrap(args: ScrapArgs) -> anyhow::Result<()> {
    let page = if let Some(url) = args.url {
        let mut conf = CrawlerConfig::default();
        if let Some(ua) = args.ua {
            conf.user_agent = ua;
        }
        let resp = HttpTransport::new(&conf)?.get(&url, &[])?;
        if resp.status != 200 {
            anyhow::bail!("{url} returned status {}", resp.status);
        }
        resp.body
    } else if let Some(path) = args.file {
        fs::read_to_string(&path)?
    } else {
        anyhow::bail!("Missing `url` or `file`");
    };

    let records = extract_and_validate_page(&page)?;
    let mut wtr = csv::Writer::from_writer(io::stdout());
    for record in &records {
        wtr.serialize(record)?;
    }
    wtr.flush()?;
    Ok(())
}

fn init_logger(filter: &str) {
    env_logger::Builder::from_env(Env::default().default_filter_or(filter)).init();
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    match args.cmd {
        SubCommand::Crawl(args) => {
            if !args.config.quiet {
                init_logger("bgg=info,bgg_cli=info,bgg_crawler=warn");
            }
            crawl(args)
        }
        SubCommand::Stats(args) => {
            if !args.config.quiet {
                init_logger("bgg=info,bgg_cli=info,bgg_crawler=warn");
            }
            stats(args)
        }
        SubCommand::Scrap(args) => {
            init_logger("bgg_crawler=warn");
            scrap(args)
        }
        SubCommand::Completion => {
            generate(Shell::Bash, &mut Args::command(), "bgg", &mut io::stdout());
            Ok(())
        }
    }
}
