use std::time::Duration;

use reqwest::header::USER_AGENT;
use thiserror::Error;

use crate::config::CrawlerConfig;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    pub status: u16,
    pub body: String,
}

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("{url} returned status {status}")]
    Status { url: String, status: u16 },
    #[error("Request to {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("Couldn't build HTTP client: {0}")]
    Client(#[source] reqwest::Error),
}

/// A single blocking HTTP GET.
pub trait Transport {
    fn get(&self, url: &str, headers: &[(&str, String)]) -> Result<Response, TransportError>;
}

impl<T> Transport for &T
where
    T: Transport + ?Sized,
{
    fn get(&self, url: &str, headers: &[(&str, String)]) -> Result<Response, TransportError> {
        (**self).get(url, headers)
    }
}

#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::blocking::Client,
    user_agent: String,
}

impl HttpTransport {
    pub fn new(config: &CrawlerConfig) -> Result<Self, TransportError> {
        let client = reqwest::blocking::ClientBuilder::new()
            .gzip(true)
            .deflate(true)
            .timeout(config.request_timeout_secs.map(Duration::from_secs))
            .build()
            .map_err(TransportError::Client)?;
        Ok(Self {
            client,
            user_agent: config.user_agent.clone(),
        })
    }
}

impl Transport for HttpTransport {
    fn get(&self, url: &str, headers: &[(&str, String)]) -> Result<Response, TransportError> {
        let mut req = self.client.get(url).header(USER_AGENT, &self.user_agent);
        for (name, value) in headers {
            req = req.header(*name, value.as_str());
        }

        let resp = req.send().map_err(|source| TransportError::Request {
            url: url.to_string(),
            source,
        })?;
        let status = resp.status().as_u16();
        let body = resp.text().map_err(|source| TransportError::Request {
            url: url.to_string(),
            source,
        })?;

        Ok(Response { status, body })
    }
}
