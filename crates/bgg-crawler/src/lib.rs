mod config;
mod limiter;
mod sink;
mod source;
mod transport;

pub use config::{CrawlerConfig, OnError};
pub use limiter::{Clock, RateLimiter, SystemClock};
pub use sink::{Event, EventSink, LogSink, MemorySink};
pub use source::{PageBatch, PageSource, XmlApi};
pub use transport::{HttpTransport, Response, Transport, TransportError};

pub use log::Level;
