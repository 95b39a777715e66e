//! Pagination metadata and typed result pages.

use http::HeaderMap;

const TOTAL_ENTRIES: &str = "x-total-entries";
const PER_PAGE: &str = "x-per-page";
const PAGE: &str = "x-page";

/// Pagination metadata sent out of band with a listing response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageHeaders {
    /// Total number of records across all pages.
    pub total_entries: u64,
    /// Records per page.
    pub per_page: u32,
    /// The 1-indexed page this response holds.
    pub page: u32,
}

impl PageHeaders {
    /// Parses `X-Total-Entries`, `X-Per-Page` and `X-Page`.
    ///
    /// Returns `None` when `X-Total-Entries` is absent: the response is not
    /// paginated, which is different from an empty first page. When the
    /// total is present, a missing or malformed companion header reads as 0.
    ///
    /// # Examples
    ///
    /// ```
    /// use naturalist::PageHeaders;
    /// use http::HeaderMap;
    ///
    /// let mut headers = HeaderMap::new();
    /// headers.insert("x-total-entries", "50".parse().unwrap());
    /// headers.insert("x-per-page", "3".parse().unwrap());
    /// headers.insert("x-page", "2".parse().unwrap());
    ///
    /// let paging = PageHeaders::from_headers(&headers).unwrap();
    /// assert_eq!(paging.total_entries, 50);
    /// assert_eq!(paging.total_pages(), 17);
    ///
    /// assert!(PageHeaders::from_headers(&HeaderMap::new()).is_none());
    /// ```
    pub fn from_headers(headers: &HeaderMap) -> Option<Self> {
        let total_entries = headers.get(TOTAL_ENTRIES)?;
        Some(Self {
            total_entries: parse_value(Some(total_entries)),
            per_page: parse_value(headers.get(PER_PAGE)),
            page: parse_value(headers.get(PAGE)),
        })
    }

    /// Number of pages needed for `total_entries`, or 0 if `per_page` is 0.
    pub fn total_pages(&self) -> u64 {
        if self.per_page == 0 {
            return 0;
        }
        self.total_entries.div_ceil(u64::from(self.per_page))
    }

    /// Returns `true` if a page after this one exists and can be requested.
    pub fn has_next_page(&self) -> bool {
        self.next_page().is_some()
    }

    /// The next page number, if there is one and it fits in a `u32`.
    pub fn next_page(&self) -> Option<u32> {
        self.page
            .checked_add(1)
            .filter(|_| u64::from(self.page) < self.total_pages())
    }
}

// `HeaderMap::get` returns the first value, which is the one we want.
fn parse_value<T: std::str::FromStr + Default>(value: Option<&http::HeaderValue>) -> T {
    value
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or_default()
}

/// One page of records from a listing endpoint.
///
/// Records appear in the order the server sent them.
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    /// The decoded records.
    pub records: Vec<T>,
    /// Pagination metadata, absent when the endpoint did not paginate.
    pub paging: Option<PageHeaders>,
}

impl<T> Page<T> {
    /// Creates a page from decoded records and optional metadata.
    pub fn new(records: Vec<T>, paging: Option<PageHeaders>) -> Self {
        Self { records, paging }
    }

    /// Number of records on this page.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns `true` if this page holds no records.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Iterates over the records.
    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.records.iter()
    }

    /// Total pages reported by the server, if paginated.
    pub fn total_pages(&self) -> Option<u64> {
        self.paging.map(|p| p.total_pages())
    }

    /// Returns `true` if the server reported another page after this one.
    pub fn has_next_page(&self) -> bool {
        self.paging.is_some_and(|p| p.has_next_page())
    }

    /// The next page number to request, if any.
    pub fn next_page(&self) -> Option<u32> {
        self.paging.and_then(|p| p.next_page())
    }
}

impl<T> IntoIterator for Page<T> {
    type Item = T;
    type IntoIter = std::vec::IntoIter<T>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.into_iter()
    }
}

impl<'a, T> IntoIterator for &'a Page<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}
