use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CrawlerConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,

    #[serde(default = "default_catalog_path")]
    pub catalog_path: String,

    #[serde(default = "default_api_url")]
    pub api_url: String,

    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// The minimum delay in seconds between two requests
    #[serde(default = "default_delay")]
    pub delay: f32,

    /// Half of it is added to every throttled sleep
    #[serde(default)]
    pub jitter: f32,

    #[serde(default)]
    pub api_token: Option<String>,

    #[serde(default)]
    pub request_timeout_secs: Option<u64>,

    #[serde(default = "default_on_page_error")]
    pub on_page_error: OnError,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            catalog_path: default_catalog_path(),
            api_url: default_api_url(),
            user_agent: default_user_agent(),
            delay: default_delay(),
            jitter: 0.0,
            api_token: None,
            request_timeout_secs: None,
            on_page_error: default_on_page_error(),
        }
    }
}

fn default_base_url() -> String {
    String::from("https://boardgamegeek.com")
}

fn default_catalog_path() -> String {
    String::from("browse/boardgame")
}

fn default_api_url() -> String {
    String::from("https://boardgamegeek.com/xmlapi2")
}

fn default_user_agent() -> String {
    String::from("bgg-scraper/0.1")
}

fn default_delay() -> f32 {
    2.0
}

fn default_on_page_error() -> OnError {
    OnError::SkipAndLog
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "clap", derive(clap::ValueEnum))]
pub enum OnError {
    Fail,
    SkipAndLog,
}
