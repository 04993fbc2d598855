use std::sync::Arc;

use log::Level;

use crate::config::CrawlerConfig;
use crate::emit;
use crate::limiter::{Clock, RateLimiter, SystemClock};
use crate::sink::EventSink;
use crate::transport::{Transport, TransportError};

/// Raw content of one catalog page, `None` when it couldn't be fetched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageBatch {
    pub page: u32,
    pub body: Option<String>,
}

/// Catalog pages of the browse listing.
pub struct PageSource<T, C = SystemClock> {
    base_url: String,
    catalog_path: String,
    transport: T,
    limiter: RateLimiter<C>,
    sink: Arc<dyn EventSink>,
}

impl<T> PageSource<T>
where
    T: Transport,
{
    pub fn new(config: &CrawlerConfig, transport: T, sink: Arc<dyn EventSink>) -> Self {
        let limiter = RateLimiter::with_clock(config.delay, config.jitter, SystemClock);
        Self::with_limiter(config, transport, limiter, sink)
    }
}

impl<T, C> PageSource<T, C>
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
            base_url: config.base_url.trim_end_matches('/').to_string(),
            catalog_path: config.catalog_path.trim_matches('/').to_string(),
            transport,
            limiter,
            sink,
        }
    }

    pub fn page_url(&self, page: u32) -> String {
        format!("{}/{}/page/{page}", self.base_url, self.catalog_path)
    }

    pub fn fetch_page(&mut self, page: u32) -> Option<String> {
        let url = self.page_url(page);
        fetch_ok(&self.transport, &mut self.limiter, &*self.sink, &url, &[])
    }

    /// Fetches every page in `start..=stop`, keeping one entry per page in page order.
    pub fn fetch_page_range(&mut self, start: u32, stop: u32) -> Vec<PageBatch> {
        self.page_range(start, stop).collect()
    }

    /// Same as [`fetch_page_range`](Self::fetch_page_range) but a page is only
    /// fetched when the iterator reaches it.
    pub fn page_range(&mut self, start: u32, stop: u32) -> impl Iterator<Item = PageBatch> + '_ {
        (start..=stop).map(move |page| PageBatch {
            page,
            body: self.fetch_page(page),
        })
    }
}

/// Statistics documents of the XML API.
pub struct XmlApi<T, C = SystemClock> {
    api_url: String,
    token: Option<String>,
    transport: T,
    limiter: RateLimiter<C>,
    sink: Arc<dyn EventSink>,
}

impl<T> XmlApi<T>
where
    T: Transport,
{
    pub fn new(config: &CrawlerConfig, transport: T, sink: Arc<dyn EventSink>) -> Self {
        let limiter = RateLimiter::with_clock(config.delay, config.jitter, SystemClock);
        Self::with_limiter(config, transport, limiter, sink)
    }
}

impl<T, C> XmlApi<T, C>
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
            api_url: config.api_url.trim_end_matches('/').to_string(),
            token: config.api_token.clone(),
            transport,
            limiter,
            sink,
        }
    }

    pub fn thing_url(&self, id: i64, stats: bool) -> String {
        let stats = if stats { "&stats=1" } else { "" };
        format!("{}/thing?id={id}{stats}", self.api_url)
    }

    pub fn fetch_thing(&mut self, id: i64, stats: bool) -> Option<String> {
        let url = self.thing_url(id, stats);
        let headers = match &self.token {
            Some(token) => vec![("Authorization", format!("Bearer {token}"))],
            None => vec![],
        };
        fetch_ok(&self.transport, &mut self.limiter, &*self.sink, &url, &headers)
    }
}

fn fetch_ok<T, C>(
    transport: &T,
    limiter: &mut RateLimiter<C>,
    sink: &dyn EventSink,
    url: &str,
    headers: &[(&str, String)],
) -> Option<String>
where
    T: Transport,
    C: Clock,
{
    limiter.wait();
    let err = match transport.get(url, headers) {
        Ok(resp) if resp.status == 200 => return Some(resp.body),
        Ok(resp) => TransportError::Status {
            url: url.to_string(),
            status: resp.status,
        },
        Err(e) => e,
    };
    emit!(sink, Level::Warn, "Skipping URL: {err}");
    None
}
