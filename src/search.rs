//! Post search: filter the full post list locally, page through the results, and keep the URL in
//! step with what's being searched for.
pub mod filters;
pub mod location;
pub mod orchestrator;
pub mod pagination;
pub mod querystring;
pub mod state;
pub mod suggestions;

use std::time::Duration;

pub use filters::FilterPatch;
pub use location::MemoryLocation;
pub use orchestrator::{Search, SearchView};

/// Tunables for a search view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchSettings {
    /// Most posts fetched for local filtering. Beyond this, filtering belongs on the server.
    pub fetch_limit: usize,
    pub items_per_page: usize,
    pub debounce: Duration,
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            fetch_limit: 1000,
            items_per_page: pagination::ITEMS_PER_PAGE,
            debounce: Duration::from_millis(300),
        }
    }
}
