//! Search state lives in the URL so it can be bookmarked and shared. This maps `SearchFilters`
//! (plus the page) to a query string and back.
//!
//! Decoding is forgiving: a malformed or half-specified parameter drops that one
//! filter instead of failing, so a hand-edited URL never breaks the view.
use crate::remote::structs::{format_instant, parse_instant, UserId};
use crate::search::filters::{CommentCountRange, DateRange, SearchFilters};
use serde::Serialize;
use std::borrow::Cow;
use std::collections::HashMap;
use tracing::{debug, warn};
use url::form_urlencoded;

/// The URL's view of the search: filters and which page of results is showing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UrlState {
    pub filters: SearchFilters,
    /// 1-indexed
    pub page: u32,
}

impl Default for UrlState {
    fn default() -> Self {
        Self {
            filters: SearchFilters::default(),
            page: 1,
        }
    }
}

/// Wire names of each parameter. Field order is the order they appear in the URL.
#[derive(Serialize, Default)]
#[serde(rename_all = "camelCase")]
struct SearchParams<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    q: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    start_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    end_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    min_comments: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_comments: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    user_id: Option<UserId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    page: Option<u32>,
}

/// Serialize filters (and the page, if past the first) to a query string without the leading `?`.
/// Unset filters emit nothing, so default state is the empty string.
pub fn encode(filters: &SearchFilters, page: u32) -> String {
    let params = SearchParams {
        q: Some(filters.query.as_str()).filter(|q| !q.is_empty()),
        start_date: filters.date_range.map(|r| format_instant(&r.start)),
        end_date: filters.date_range.map(|r| format_instant(&r.end)),
        min_comments: filters.comment_count_range.map(|r| r.min),
        max_comments: filters.comment_count_range.map(|r| r.max),
        user_id: filters.user_id,
        page: Some(page).filter(|p| *p > 1),
    };
    serde_qs::to_string(&params).unwrap_or_else(|e| {
        warn!(error = %e, "couldn't serialize search filters");
        String::new()
    })
}

/// Parse a query string (with or without the leading `?`). Never fails; see the module docs.
pub fn decode(query: &str) -> UrlState {
    let query = query.strip_prefix('?').unwrap_or(query);
    // The first occurrence of a repeated key wins.
    let mut params: HashMap<Cow<str>, Cow<str>> = HashMap::new();
    for (key, value) in form_urlencoded::parse(query.as_bytes()) {
        params.entry(key).or_insert(value);
    }
    let get = |key: &str| params.get(key).map(|v| v.as_ref()).filter(|v| !v.is_empty());

    let mut filters = SearchFilters {
        query: get("q").unwrap_or_default().to_owned(),
        ..Default::default()
    };

    match (get("startDate"), get("endDate")) {
        (Some(start), Some(end)) => match (parse_instant(start), parse_instant(end)) {
            (Some(start), Some(end)) => filters.date_range = Some(DateRange { start, end }),
            _ => debug!(start, end, "dropping date range with an unparseable bound"),
        },
        (None, None) => {}
        _ => debug!("dropping one-sided date range"),
    }

    match (get("minComments"), get("maxComments")) {
        (Some(min), Some(max)) => match (parse_count(min), parse_count(max)) {
            (Some(min), Some(max)) => {
                filters.comment_count_range = Some(CommentCountRange { min, max })
            }
            _ => debug!(min, max, "dropping comment range with a non-integer bound"),
        },
        (None, None) => {}
        _ => debug!("dropping one-sided comment range"),
    }

    if let Some(raw) = get("userId") {
        filters.user_id = parse_user_id(raw);
        if filters.user_id.is_none() {
            debug!(user_id = raw, "dropping invalid userId");
        }
    }

    let page = get("page")
        .and_then(|raw| raw.trim().parse::<u32>().ok())
        .filter(|page| *page >= 1)
        .unwrap_or(1);

    UrlState { filters, page }
}

fn parse_count(raw: &str) -> Option<u32> {
    raw.trim().parse().ok()
}

/// User ids start at 1, so zero is as meaningless as garbage.
fn parse_user_id(raw: &str) -> Option<UserId> {
    raw.trim().parse().ok().filter(|id| *id > 0)
}
