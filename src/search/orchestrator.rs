//! Everything a search view needs, in one place: the debounced filter state, paging, the fetched
//! posts, and keeping the URL up to date.
//!
//! All posts are fetched once when the view mounts; after that, every filter or page change is
//! answered from that snapshot without going back to the remote service.
use crate::remote::{
    structs::{ListPosts, Post},
    Client,
};
use crate::search::filters::{apply_filters, FilterPatch, SearchFilters};
use crate::search::location::Location;
use crate::search::pagination::{self, PageLink};
use crate::search::querystring;
use crate::search::state::SearchState;
use crate::search::SearchSettings;
use crate::twoface::{Fallible, TfError};
use serde::Serialize;
use tracing::{debug, warn};

/// Where the post snapshot is at. Refining a search never goes back to `Fetching`.
#[derive(Debug)]
enum Load {
    Idle,
    Fetching,
    Ready(Vec<Post>),
    Failed(TfError),
}

pub struct Search<C, L> {
    client: C,
    location: L,
    state: SearchState,
    load: Load,
    settings: SearchSettings,
}

/// A serializable snapshot of a search view.
#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SearchView {
    pub filters: SearchFilters,
    pub page: u32,
    pub total_pages: u32,
    /// How many posts matched, across all pages
    pub total: usize,
    /// The matching posts on this page
    pub posts: Vec<Post>,
    pub pages: Vec<PageLink>,
    pub has_active_filters: bool,
    pub has_results: bool,
    pub is_loading: bool,
}

impl<C: Client, L: Location> Search<C, L> {
    /// Start a search view. Initial filters come from the caller if given, otherwise from the
    /// location's query string, otherwise they're empty. The page always comes from the location.
    pub fn mount(
        client: C,
        location: L,
        initial: Option<SearchFilters>,
        settings: SearchSettings,
    ) -> Self {
        let from_url = querystring::decode(location.search());
        let filters = initial.unwrap_or(from_url.filters);
        let mut search = Self {
            client,
            location,
            state: SearchState::new(filters, from_url.page, settings.debounce),
            load: Load::Idle,
            settings,
        };
        search.sync_location();
        search
    }

    /// Fetch the posts to search through. Does nothing once they've loaded; after a failure,
    /// calling it again retries. If this future is dropped midway the response is never applied.
    pub async fn load(&mut self) {
        if let Load::Ready(_) = self.load {
            return;
        }
        self.load = Load::Fetching;
        let params = ListPosts {
            limit: Some(self.settings.fetch_limit),
            ..Default::default()
        };
        self.load = match self.client.list_posts(params).await {
            Ok(posts) => {
                debug!(posts = posts.len(), "search snapshot loaded");
                Load::Ready(posts)
            }
            Err(e) => {
                warn!(error = %e.internal, "couldn't load posts to search");
                Load::Failed(e)
            }
        };
    }

    pub fn filters(&self) -> &SearchFilters {
        self.state.filters()
    }

    pub fn debounced_query(&self) -> &str {
        self.state.debounced_query()
    }

    pub fn page(&self) -> u32 {
        self.state.page()
    }

    pub fn has_active_filters(&self) -> bool {
        self.state.has_active_filters()
    }

    pub fn location(&self) -> &L {
        &self.location
    }

    pub fn update_filters(&mut self, patch: FilterPatch) {
        self.state.update_filters(patch);
        self.sync_location();
    }

    /// Show another page of results. The page isn't checked against `total_pages`; that's up to
    /// the caller.
    pub fn update_page(&mut self, page: u32) {
        self.state.update_page(page);
        self.sync_location();
    }

    /// Forget every filter and drop the search from the URL.
    pub fn clear_search(&mut self) {
        self.state.reset_filters();
        self.location.replace("");
    }

    /// Apply the pending query now rather than after the debounce delay.
    pub fn flush(&mut self) {
        self.state.flush();
    }

    /// Wait until the debounced query catches up with the typed one.
    pub async fn settled(&mut self) {
        self.state.settled().await;
    }

    pub fn is_loading(&self) -> bool {
        matches!(self.load, Load::Idle | Load::Fetching)
    }

    pub fn error(&self) -> Option<&TfError> {
        match &self.load {
            Load::Failed(e) => Some(e),
            _ => None,
        }
    }

    /// Give up the view, returning why the posts couldn't be loaded if that's what happened.
    pub fn into_result(self) -> Fallible<Self> {
        match self.load {
            Load::Failed(e) => Err(e),
            _ => Ok(self),
        }
    }

    /// Every post matching the current filters, using the debounced query rather than the one
    /// being typed. Empty until the posts have loaded.
    fn matching(&self) -> Vec<&Post> {
        let Load::Ready(posts) = &self.load else {
            return Vec::new();
        };
        let filters = SearchFilters {
            query: self.state.debounced_query().to_owned(),
            ..self.state.filters().clone()
        };
        apply_filters(posts, &filters)
    }

    /// The matching posts on the current page.
    pub fn posts(&self) -> Vec<Post> {
        let matching = self.matching();
        pagination::paginate(&matching, self.page(), self.settings.items_per_page)
            .iter()
            .map(|post| (*post).clone())
            .collect()
    }

    /// How many posts match, across all pages.
    pub fn total(&self) -> usize {
        self.matching().len()
    }

    pub fn total_pages(&self) -> u32 {
        pagination::total_pages(self.total(), self.settings.items_per_page)
    }

    pub fn has_results(&self) -> bool {
        self.total() > 0
    }

    /// Loaded, but nothing matched.
    pub fn is_empty(&self) -> bool {
        !self.is_loading() && self.total() == 0
    }

    pub fn view(&self) -> SearchView {
        let matching = self.matching();
        let page = self.page();
        let per_page = self.settings.items_per_page;
        let total_pages = pagination::total_pages(matching.len(), per_page);
        SearchView {
            filters: self.filters().clone(),
            page,
            total_pages,
            total: matching.len(),
            posts: pagination::paginate(&matching, page, per_page)
                .iter()
                .map(|post| (*post).clone())
                .collect(),
            pages: pagination::page_numbers(page, total_pages),
            has_active_filters: self.has_active_filters(),
            has_results: !matching.is_empty(),
            is_loading: self.is_loading(),
        }
    }

    /// Write the live filters and page into the URL, replacing rather than adding history.
    fn sync_location(&mut self) {
        let search = querystring::encode(self.state.filters(), self.state.page());
        if search != self.location.search() {
            self.location.replace(&search);
        }
    }
}
