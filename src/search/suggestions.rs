use crate::remote::structs::{Post, PostId};
use serde::Serialize;

const MAX_SUGGESTIONS: usize = 5;
const MIN_QUERY_CHARS: usize = 2;

#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SuggestionKind {
    Title,
}

/// A title the user might be typing.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Suggestion {
    #[serde(rename = "type")]
    pub kind: SuggestionKind,
    pub text: String,
    pub post_id: PostId,
}

/// Up to five post titles containing the query, ignoring case. Queries shorter than two
/// characters are too vague to suggest anything.
pub fn suggest(query: &str, posts: &[Post]) -> Vec<Suggestion> {
    if query.trim().is_empty() || query.chars().count() < MIN_QUERY_CHARS {
        return Vec::new();
    }
    let term = query.to_lowercase();
    posts
        .iter()
        .filter(|post| post.title.to_lowercase().contains(&term))
        .take(MAX_SUGGESTIONS)
        .map(|post| Suggestion {
            kind: SuggestionKind::Title,
            text: post.title.clone(),
            post_id: post.id,
        })
        .collect()
}
