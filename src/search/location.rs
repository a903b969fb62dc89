//! The address bar, as far as search is concerned: something holding a query string that can be
//! read and replaced. Replacing never adds a history entry, so stepping back doesn't walk through
//! every filter edit.

pub trait Location {
    /// The current query string, without the leading `?`.
    fn search(&self) -> &str;

    /// Swap in a new query string in place.
    fn replace(&mut self, search: &str);
}

/// A location that only exists in memory, e.g. the URL of one HTTP request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemoryLocation {
    path: String,
    search: String,
    replacements: usize,
}

impl MemoryLocation {
    pub fn new(path: impl Into<String>, search: &str) -> Self {
        Self {
            path: path.into(),
            search: search.strip_prefix('?').unwrap_or(search).to_owned(),
            replacements: 0,
        }
    }

    /// Path plus query string, e.g. `/posts?q=rust`. No `?` when there's no query.
    pub fn href(&self) -> String {
        if self.search.is_empty() {
            self.path.clone()
        } else {
            format!("{}?{}", self.path, self.search)
        }
    }

    /// How many times the query string was replaced.
    pub fn replacements(&self) -> usize {
        self.replacements
    }
}

impl Location for MemoryLocation {
    fn search(&self) -> &str {
        &self.search
    }

    fn replace(&mut self, search: &str) {
        self.search = search.to_owned();
        self.replacements += 1;
    }
}
