//! Client-side paging over an already-filtered list.
use serde::{Serialize, Serializer};

pub const ITEMS_PER_PAGE: usize = 10;

/// At most this many page links are shown before the list is windowed with ellipses.
const MAX_VISIBLE_PAGES: u32 = 5;

/// There's always at least one page, even when it's empty.
pub fn total_pages(total: usize, per_page: usize) -> u32 {
    let per_page = per_page.max(1);
    let pages = (total + per_page - 1) / per_page;
    u32::try_from(pages).unwrap_or(u32::MAX).max(1)
}

pub fn clamp_page(page: u32, total_pages: u32) -> u32 {
    page.clamp(1, total_pages.max(1))
}

/// The items on a 1-indexed page. Pages past the end are empty.
pub fn paginate<T>(items: &[T], page: u32, per_page: usize) -> &[T] {
    let start = (page.max(1) as usize - 1).saturating_mul(per_page);
    if start >= items.len() {
        return &[];
    }
    let end = start.saturating_add(per_page).min(items.len());
    &items[start..end]
}

/// One entry in a row of page links. Serializes as the page number, or `"..."` for a gap.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageLink {
    Page(u32),
    Gap,
}

impl Serialize for PageLink {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            PageLink::Page(page) => serializer.serialize_u32(*page),
            PageLink::Gap => serializer.serialize_str("..."),
        }
    }
}

/// Which page links to show: every page when there are few, otherwise the first and last page,
/// the current page and its neighbours, with gaps in between.
pub fn page_numbers(current: u32, total_pages: u32) -> Vec<PageLink> {
    if total_pages <= MAX_VISIBLE_PAGES {
        return (1..=total_pages).map(PageLink::Page).collect();
    }
    let mut links = vec![PageLink::Page(1)];
    if current > 3 {
        links.push(PageLink::Gap);
    }
    let start = current.saturating_sub(1).max(2);
    let end = current.saturating_add(1).min(total_pages - 1);
    links.extend((start..=end).map(PageLink::Page));
    if current.saturating_add(2) < total_pages {
        links.push(PageLink::Gap);
    }
    links.push(PageLink::Page(total_pages));
    links
}

#[cfg(test)]
mod tests {
    use super::*;
    use PageLink::{Gap, Page};

    #[test]
    fn test_page_numbers_past_the_end() {
        assert_eq!(page_numbers(u32::MAX, 10), vec![Page(1), Gap, Page(10)]);
        assert_eq!(page_numbers(12, 10), vec![Page(1), Gap, Page(10)]);
    }

    #[test]
    fn test_total_pages() {
        assert_eq!(total_pages(0, 10), 1);
        assert_eq!(total_pages(10, 10), 1);
        assert_eq!(total_pages(11, 10), 2);
        assert_eq!(total_pages(100, 10), 10);
    }

    #[test]
    fn test_clamp_page() {
        assert_eq!(clamp_page(0, 5), 1);
        assert_eq!(clamp_page(9, 5), 5);
        assert_eq!(clamp_page(3, 5), 3);
        assert_eq!(clamp_page(3, 0), 1);
    }

    #[test]
    fn test_paginate() {
        let items: Vec<u32> = (1..=23).collect();
        assert_eq!(paginate(&items, 1, 10), &items[0..10]);
        assert_eq!(paginate(&items, 3, 10), &[21, 22, 23]);
        assert!(paginate(&items, 4, 10).is_empty());
        assert_eq!(paginate(&items, 0, 10), &items[0..10]);
    }

    #[test]
    fn test_page_numbers() {
        assert_eq!(page_numbers(2, 4), vec![Page(1), Page(2), Page(3), Page(4)]);
        assert_eq!(page_numbers(1, 10), vec![Page(1), Page(2), Gap, Page(10)]);
        assert_eq!(
            page_numbers(5, 10),
            vec![Page(1), Gap, Page(4), Page(5), Page(6), Gap, Page(10)]
        );
        assert_eq!(page_numbers(10, 10), vec![Page(1), Gap, Page(9), Page(10)]);
        assert_eq!(
            serde_json::to_string(&page_numbers(5, 10)).unwrap(),
            r#"[1,"...",4,5,6,"...",10]"#
        );
    }
}
