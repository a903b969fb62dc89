//! Live search state, with the text query debounced.
//!
//! Filters change immediately on every edit, but the query used for matching only catches up
//! once the user stops typing for the debounce delay. The timer is a single pending slot: each
//! new query replaces whatever was waiting, so only the last edit in a burst takes effect.
use crate::search::filters::{FilterPatch, SearchFilters};
use std::time::Duration;
use tokio::time::Instant;

/// A query waiting out its debounce delay.
#[derive(Debug, Clone)]
struct Pending {
    query: String,
    due: Instant,
}

#[derive(Debug, Clone)]
pub struct SearchState {
    filters: SearchFilters,
    /// The last query whose delay ran out.
    committed_query: String,
    pending: Option<Pending>,
    page: u32,
    delay: Duration,
}

impl SearchState {
    /// The debounced query starts out equal to the initial query; there's nothing to wait for.
    pub fn new(initial: SearchFilters, initial_page: u32, delay: Duration) -> Self {
        Self {
            committed_query: initial.query.clone(),
            filters: initial,
            pending: None,
            page: initial_page.max(1),
            delay,
        }
    }

    pub fn filters(&self) -> &SearchFilters {
        &self.filters
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    /// The query to match posts against. Lags `filters().query` by the debounce delay.
    pub fn debounced_query(&self) -> &str {
        match &self.pending {
            Some(pending) if pending.due <= Instant::now() => &pending.query,
            _ => &self.committed_query,
        }
    }

    /// When the pending query (if any) takes effect.
    pub fn deadline(&self) -> Option<Instant> {
        self.pending.as_ref().map(|p| p.due)
    }

    pub fn has_active_filters(&self) -> bool {
        self.filters.has_active_filters()
    }

    /// Merge a partial update into the filters and go back to the first page. A changed query
    /// restarts the debounce timer.
    pub fn update_filters(&mut self, patch: FilterPatch) {
        self.settle();
        let previous_query = self.filters.query.clone();
        self.filters.merge(patch);
        self.page = 1;
        if self.filters.query != previous_query {
            self.pending = Some(Pending {
                query: self.filters.query.clone(),
                due: Instant::now() + self.delay,
            });
        }
    }

    /// Move to a page. Callers are responsible for keeping it in range.
    pub fn update_page(&mut self, page: u32) {
        self.page = page;
    }

    /// Clear every filter and the debounced query at once, and go back to the first page.
    pub fn reset_filters(&mut self) {
        self.filters = SearchFilters::default();
        self.committed_query.clear();
        self.pending = None;
        self.page = 1;
    }

    /// Commit the pending query now instead of waiting for its delay.
    pub fn flush(&mut self) {
        if let Some(pending) = self.pending.take() {
            self.committed_query = pending.query;
        }
    }

    /// Wait until the pending query (if any) takes effect.
    pub async fn settled(&mut self) {
        if let Some(due) = self.deadline() {
            tokio::time::sleep_until(due).await;
        }
        self.settle();
    }

    /// Commit the pending query if its delay has run out.
    fn settle(&mut self) {
        if self.deadline().map_or(false, |due| due <= Instant::now()) {
            self.flush();
        }
    }
}
