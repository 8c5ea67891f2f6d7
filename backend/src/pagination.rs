//! Offset pagination over ordered listings.
//!
//! A [`PageSource`] knows how to count its rows and fetch an ordered window;
//! [`paginate`] normalizes the requested page, counts once, fetches exactly
//! one window and derives the navigation flags from the count.

use async_trait::async_trait;
use serde::Serialize;

use crate::{error::Result, models::common::PageParams};

/// Zero-based offset plus row limit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    pub offset: i64,
    pub limit: i64,
}

impl Window {
    /// The whole listing (used by the unpaginated v1 surface).
    pub const ALL: Window = Window {
        offset: 0,
        limit: i64::MAX,
    };

    pub fn for_page(page: i64, page_size: i64) -> Self {
        Self {
            offset: page.saturating_sub(1).saturating_mul(page_size),
            limit: page_size,
        }
    }

    /// Applies the window to an already ordered in-memory listing.
    pub fn slice<T: Clone>(&self, ordered: &[T]) -> Vec<T> {
        let offset = usize::try_from(self.offset).unwrap_or(usize::MAX);
        let limit = usize::try_from(self.limit).unwrap_or(usize::MAX);
        ordered.iter().skip(offset).take(limit).cloned().collect()
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: i64,
    pub page_size: i64,
    pub total_count: i64,
    pub has_next_page: bool,
    pub has_previous_page: bool,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, page: i64, page_size: i64, total_count: i64) -> Self {
        Self {
            items,
            page,
            page_size,
            total_count,
            has_next_page: page.saturating_mul(page_size) < total_count,
            // Derived from the requested page alone, even past the end.
            has_previous_page: page > 1,
        }
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            page: self.page,
            page_size: self.page_size,
            total_count: self.total_count,
            has_next_page: self.has_next_page,
            has_previous_page: self.has_previous_page,
        }
    }
}

/// An ordered, countable listing. Implementations must apply a deterministic
/// sort in `fetch`, otherwise windows overlap between requests.
#[async_trait]
pub trait PageSource: Send + Sync {
    type Item: Send;

    async fn count(&self) -> Result<i64>;

    async fn fetch(&self, window: Window) -> Result<Vec<Self::Item>>;
}

pub async fn paginate<S>(source: &S, params: &PageParams) -> Result<Page<S::Item>>
where
    S: PageSource + ?Sized,
{
    let page = params.page();
    let page_size = params.page_size();

    let total_count = source.count().await?;
    let window = Window::for_page(page, page_size);
    let items = if window.offset >= total_count {
        Vec::new()
    } else {
        source.fetch(window).await?
    };

    tracing::debug!(page, page_size, total_count, returned = items.len(), "page fetched");

    Ok(Page::new(items, page, page_size, total_count))
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Numbers(Vec<i64>);

    #[async_trait]
    impl PageSource for Numbers {
        type Item = i64;

        async fn count(&self) -> Result<i64> {
            Ok(self.0.len() as i64)
        }

        async fn fetch(&self, window: Window) -> Result<Vec<i64>> {
            Ok(window.slice(&self.0))
        }
    }

    fn numbers(n: i64) -> Numbers {
        Numbers((1..=n).collect())
    }

    #[tokio::test]
    async fn first_page_of_ten() {
        let page = paginate(&numbers(10), &PageParams::new(1, 2)).await.unwrap();

        assert_eq!(page.items, vec![1, 2]);
        assert_eq!(page.total_count, 10);
        assert!(page.has_next_page);
        assert!(!page.has_previous_page);
    }

    #[tokio::test]
    async fn last_page_is_partial() {
        let page = paginate(&numbers(7), &PageParams::new(3, 3)).await.unwrap();

        assert_eq!(page.items, vec![7]);
        assert!(!page.has_next_page);
        assert!(page.has_previous_page);
    }

    #[tokio::test]
    async fn page_past_the_end_is_empty_but_counted() {
        let page = paginate(&numbers(4), &PageParams::new(9, 2)).await.unwrap();

        assert!(page.items.is_empty());
        assert_eq!(page.total_count, 4);
        assert!(!page.has_next_page);
        assert!(page.has_previous_page);
    }

    #[tokio::test]
    async fn empty_listing_reports_previous_page_from_request() {
        let page = paginate(&numbers(0), &PageParams::new(5, 10)).await.unwrap();

        assert!(page.items.is_empty());
        assert_eq!(page.total_count, 0);
        assert!(!page.has_next_page);
        assert!(page.has_previous_page);
    }

    #[tokio::test]
    async fn invalid_params_are_clamped() {
        let page = paginate(&numbers(50), &PageParams::new(0, 1000)).await.unwrap();

        assert_eq!(page.page, 1);
        assert_eq!(page.page_size, 20);
        assert_eq!(page.items.len(), 20);
    }

    #[tokio::test]
    async fn flags_follow_the_formula_for_all_small_inputs() {
        let source = numbers(13);
        for page in 1..=6 {
            for page_size in 1..=7 {
                let result = paginate(&source, &PageParams::new(page, page_size))
                    .await
                    .unwrap();
                assert!(result.items.len() as i64 <= page_size);
                assert_eq!(result.has_next_page, page * page_size < 13);
                assert_eq!(result.has_previous_page, page > 1);
            }
        }
    }

    #[test]
    fn huge_page_numbers_saturate_instead_of_overflowing() {
        let window = Window::for_page(i64::MAX, 100);
        assert_eq!(window.offset, i64::MAX);

        let page = Page::<i64>::new(Vec::new(), i64::MAX, 100, 3);
        assert!(!page.has_next_page);
    }
}
