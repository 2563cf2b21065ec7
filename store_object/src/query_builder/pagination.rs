//! Pagination
//!
//! `Pagination` turns a page request into a limit/offset window; `Page`
//! carries one page of results with its metadata.

use serde::Serialize;

pub const DEFAULT_PAGE: i64 = 1;
pub const DEFAULT_PER_PAGE: i64 = 25;

/// Validated page request
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pagination {
    pub page: i64,
    pub per_page: i64,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            page: DEFAULT_PAGE,
            per_page: DEFAULT_PER_PAGE,
        }
    }
}

impl Pagination {
    pub fn new(page: i64, per_page: i64) -> Result<Self, String> {
        if page < 1 {
            return Err("Page needs to be >= 1".to_string());
        }
        if per_page < 1 {
            return Err("The page size needs to be >= 1".to_string());
        }
        Ok(Self { page, per_page })
    }

    pub fn limit(&self) -> i64 {
        self.per_page
    }

    pub fn offset(&self) -> i64 {
        (self.page - 1).saturating_mul(self.per_page)
    }
}

/// One page of results
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page<T> {
    pub data_set: Vec<T>,
    pub current: i64,
    pub per_page: i64,
    #[serde(rename = "total_pages")]
    pub pages: i64,
    #[serde(rename = "total_data")]
    pub total: i64,
    #[serde(rename = "previous")]
    pub previous_page: Option<i64>,
    #[serde(rename = "next")]
    pub next_page: Option<i64>,
    pub has_previous: bool,
    pub has_next: bool,
}

impl<T> Page<T> {
    /// Compute page metadata for `data_set`, the window of `pagination` over `total` matches
    pub fn new(data_set: Vec<T>, pagination: Pagination, total: i64) -> Self {
        let Pagination { page, per_page } = pagination;
        let pages = if total <= 0 {
            0
        } else {
            (total - 1) / per_page + 1
        };
        let has_previous = page > 1;
        let has_next = pagination.offset().saturating_add(data_set.len() as i64) < total;

        Self {
            data_set,
            current: page,
            per_page,
            pages,
            total,
            previous_page: has_previous.then(|| page - 1),
            next_page: has_next.then(|| page + 1),
            has_previous,
            has_next,
        }
    }

    pub fn len(&self) -> usize {
        self.data_set.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data_set.is_empty()
    }

    /// Convert every item, keeping the metadata
    pub fn try_map<U, E>(self, f: impl FnMut(T) -> Result<U, E>) -> Result<Page<U>, E> {
        let data_set = self.data_set.into_iter().map(f).collect::<Result<Vec<_>, E>>()?;
        Ok(Page {
            data_set,
            current: self.current,
            per_page: self.per_page,
            pages: self.pages,
            total: self.total,
            previous_page: self.previous_page,
            next_page: self.next_page,
            has_previous: self.has_previous,
            has_next: self.has_next,
        })
    }
}
