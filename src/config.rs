use crate::search::SearchSettings;
use serde::Deserialize;
use std::time::Duration;

/// Config, from a TOML file.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// <address>:<port> to serve userfacing endpoints
    pub userfacing_listen_address: String,

    /// <address>:<port> to serve metrics on
    pub metrics_address: String,

    /// By default, output JSON logs. Only if this flag is set to true, output colourful human-friendly logs
    pub human_logs: bool,

    /// Max HTTP body size the API accepts
    #[serde(default = "max_body_size")]
    pub max_body_size: usize,

    /// Root of the remote REST API that owns posts, users and comments.
    #[serde(default = "api_base_url")]
    pub api_base_url: String,

    /// Maximum seconds to wait on the remote API
    #[serde(default = "api_timeout_secs")]
    pub api_timeout_secs: u64,

    /// Upper bound on how many posts the search view pulls in and filters locally.
    #[serde(default = "fetch_limit")]
    pub fetch_limit: usize,

    #[serde(default = "items_per_page")]
    pub items_per_page: usize,

    /// How long the search query must stay unchanged before results follow it
    #[serde(default = "debounce_ms")]
    pub debounce_ms: u64,

    /// How long a fetched post snapshot is reused before hitting the remote API again
    #[serde(default = "posts_stale_secs")]
    pub posts_stale_secs: u64,

    /// HS256 secret for signing session tokens.
    pub jwt_secret: String,

    #[serde(default = "token_ttl_secs")]
    pub token_ttl_secs: i64,
}

impl Config {
    /// Will crash if file isn't found or config is invalid.
    pub fn from_file(filepath: &str) -> Self {
        let contents = std::fs::read_to_string(filepath).expect("Couldn't read from config file");
        Self::from_toml(&contents).expect("couldn't parse config file")
    }

    pub fn from_toml(contents: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(contents)
    }

    pub fn search_settings(&self) -> SearchSettings {
        SearchSettings {
            fetch_limit: self.fetch_limit,
            items_per_page: self.items_per_page.max(1),
            debounce: Duration::from_millis(self.debounce_ms),
        }
    }
}

fn max_body_size() -> usize {
    65536
}

fn api_base_url() -> String {
    "https://jsonplaceholder.typicode.com".to_owned()
}

fn api_timeout_secs() -> u64 {
    10
}

fn fetch_limit() -> usize {
    1000
}

fn items_per_page() -> usize {
    10
}

fn debounce_ms() -> u64 {
    300
}

fn posts_stale_secs() -> u64 {
    5 * 60
}

fn token_ttl_secs() -> i64 {
    3600
}
