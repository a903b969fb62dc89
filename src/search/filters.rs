//! Ways to filter posts based on their fields. Filter semantics work just like SQL:
//! If a field is unset, its filter won't be applied.
//! If set, filter out posts that don't match the filter.
use crate::remote::structs::{Post, UserId};
use chrono::{offset::Utc, DateTime};
use serde::{Deserialize, Deserializer, Serialize};

/// What the user is searching for.
#[derive(Default, Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SearchFilters {
    /// Free text, matched case-insensitively against title and body.
    #[serde(default)]
    pub query: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_range: Option<DateRange>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment_count_range: Option<CommentCountRange>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<UserId>,
}

/// Inclusive on both ends.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl DateRange {
    pub fn contains(&self, instant: &DateTime<Utc>) -> bool {
        &self.start <= instant && instant <= &self.end
    }
}

/// Inclusive on both ends.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommentCountRange {
    pub min: u32,
    pub max: u32,
}

impl CommentCountRange {
    pub fn contains(&self, count: u32) -> bool {
        self.min <= count && count <= self.max
    }
}

/// A partial update to `SearchFilters`. Unset fields are left alone; a range or user id set to
/// `null` is cleared.
#[derive(Default, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct FilterPatch {
    #[serde(default)]
    pub query: Option<String>,
    #[serde(default, deserialize_with = "present")]
    pub date_range: Option<Option<DateRange>>,
    #[serde(default, deserialize_with = "present")]
    pub comment_count_range: Option<Option<CommentCountRange>>,
    #[serde(default, deserialize_with = "present")]
    pub user_id: Option<Option<UserId>>,
}

/// A key that's present in the JSON is `Some`, even if its value is `null`.
fn present<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

impl FilterPatch {
    pub fn query(query: impl Into<String>) -> Self {
        Self {
            query: Some(query.into()),
            ..Default::default()
        }
    }
}

impl SearchFilters {
    pub fn with_query(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            ..Default::default()
        }
    }

    /// Is any dimension constraining the results? A non-empty query counts even if it's only
    /// whitespace, because the user typed something.
    pub fn has_active_filters(&self) -> bool {
        !self.query.is_empty()
            || self.date_range.is_some()
            || self.comment_count_range.is_some()
            || self.user_id.is_some()
    }

    pub fn merge(&mut self, patch: FilterPatch) {
        if let Some(query) = patch.query {
            self.query = query;
        }
        if let Some(date_range) = patch.date_range {
            self.date_range = date_range;
        }
        if let Some(comment_count_range) = patch.comment_count_range {
            self.comment_count_range = comment_count_range;
        }
        if let Some(user_id) = patch.user_id {
            self.user_id = user_id;
        }
    }

    /// The text actually matched against posts: trimmed and lowercased. Blank queries match
    /// everything.
    pub fn search_term(&self) -> Option<String> {
        search_term(&self.query)
    }
}

pub(crate) fn search_term(query: &str) -> Option<String> {
    let term = query.trim();
    if term.is_empty() {
        None
    } else {
        Some(term.to_lowercase())
    }
}

impl Post {
    /// Does the title or body contain this lowercase term?
    pub fn mentions(&self, term: &str) -> bool {
        self.title.to_lowercase().contains(term) || self.body.to_lowercase().contains(term)
    }

    /// Does this post match all specified filters?
    pub fn matches(&self, filters: &SearchFilters) -> bool {
        self.matches_term(filters.search_term().as_deref(), filters)
    }

    fn matches_term(&self, term: Option<&str>, filters: &SearchFilters) -> bool {
        if let Some(term) = term {
            if !self.mentions(term) {
                return false;
            }
        }
        // Undated posts are never filtered out by date.
        if let (Some(range), Some(created_at)) = (&filters.date_range, &self.created_at) {
            if !range.contains(created_at) {
                return false;
            }
        }
        if let Some(range) = &filters.comment_count_range {
            if !range.contains(self.comments_count.unwrap_or(0)) {
                return false;
            }
        }
        if let Some(user_id) = filters.user_id {
            if user_id != self.user_id {
                return false;
            }
        }
        true
    }
}

/// Keep the posts matching every specified filter, in their original order.
pub fn apply_filters<'a>(posts: &'a [Post], filters: &SearchFilters) -> Vec<&'a Post> {
    let term = filters.search_term();
    posts
        .iter()
        .filter(|post| post.matches_term(term.as_deref(), filters))
        .collect()
}
