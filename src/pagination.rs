use axum::http::{
    HeaderValue, Uri,
    header::{HeaderMap, LINK},
};
use sea_orm::Order;
use serde::Serialize;
use url::form_urlencoded;

use crate::config::PaginationConfig;
use crate::sort::{SortError, parse_sorting};

pub const TOTAL_COUNT_HEADER: &str = "X-Total-Count";

/// Largest row offset the database drivers accept.
const MAX_OFFSET: u64 = i64::MAX.unsigned_abs();

/// Zero-based page number, page size and sort order of a list request.
#[derive(Debug, Clone, PartialEq)]
pub struct PageRequest<C> {
    pub page: u64,
    pub size: u64,
    pub sort: Vec<(C, Order)>,
}

impl<C> PageRequest<C> {
    #[must_use]
    pub fn new(page: u64, size: u64) -> Self {
        Self {
            page,
            size: size.max(1),
            sort: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_sort(mut self, column: C, order: Order) -> Self {
        self.sort.push((column, order));
        self
    }

    /// Rows to skip, capped at [`MAX_OFFSET`] so a huge page number reads as
    /// past the end.
    #[must_use]
    pub fn offset(&self) -> u64 {
        self.page.saturating_mul(self.size).min(MAX_OFFSET)
    }

    /// Reads `page`, `size` and `sort` from query parameters.
    ///
    /// Missing or unparsable `page`/`size` fall back to the first page and the
    /// configured default size; `size` is capped at the configured maximum.
    ///
    /// # Errors
    ///
    /// Returns [`SortError`] when a `sort` value names an unknown property.
    pub fn from_query<K, V, R>(
        params: &[(K, V)],
        settings: &PaginationConfig,
        resolve: R,
    ) -> Result<Self, SortError>
    where
        K: AsRef<str>,
        V: AsRef<str>,
        R: Fn(&str) -> Option<C>,
    {
        let value_of = |name: &str| {
            params
                .iter()
                .rev()
                .find(|(key, _)| key.as_ref() == name)
                .and_then(|(_, value)| value.as_ref().trim().parse::<u64>().ok())
        };

        let page = value_of("page").unwrap_or(0);
        let size = value_of("size")
            .filter(|size| *size > 0)
            .unwrap_or(settings.default_size)
            .min(settings.max_size);

        let sort = parse_sorting(
            params
                .iter()
                .filter(|(key, _)| key.as_ref() == "sort")
                .map(|(_, value)| value.as_ref()),
            resolve,
        )?;

        Ok(Self {
            page,
            size: size.max(1),
            sort,
        })
    }
}

/// One page of results plus the total number of matching rows.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub content: Vec<T>,
    pub number: u64,
    pub size: u64,
    pub total_elements: u64,
}

impl<T> Page<T> {
    #[must_use]
    pub fn total_pages(&self) -> u64 {
        if self.size == 0 {
            0
        } else {
            self.total_elements.div_ceil(self.size)
        }
    }

    #[must_use]
    pub fn has_next(&self) -> bool {
        self.number.saturating_add(1) < self.total_pages()
    }

    #[must_use]
    pub fn has_previous(&self) -> bool {
        self.number > 0
    }
}

/// `uri` with its `page` and `size` parameters replaced; other parameters keep
/// their order.
fn page_link(uri: &Uri, page: u64, size: u64, rel: &str) -> String {
    let kept = form_urlencoded::parse(uri.query().unwrap_or_default().as_bytes())
        .filter(|(key, _)| key != "page" && key != "size");

    let query = form_urlencoded::Serializer::new(String::new())
        .extend_pairs(kept)
        .append_pair("page", &page.to_string())
        .append_pair("size", &size.to_string())
        .finish();

    format!("<{}?{query}>; rel=\"{rel}\"", uri.path())
}

/// Builds `X-Total-Count` and an RFC 5988 `Link` header (`next`, `prev`,
/// `last`, `first`) for a page served from `uri`.
#[must_use]
pub fn generate_pagination_headers<T>(uri: &Uri, page: &Page<T>) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(TOTAL_COUNT_HEADER, HeaderValue::from(page.total_elements));

    let mut links = Vec::with_capacity(4);
    if page.has_next() {
        links.push(page_link(uri, page.number + 1, page.size, "next"));
    }
    if page.has_previous() {
        links.push(page_link(uri, page.number - 1, page.size, "prev"));
    }
    let last = page.total_pages().saturating_sub(1);
    links.push(page_link(uri, last, page.size, "last"));
    links.push(page_link(uri, 0, page.size, "first"));

    match HeaderValue::from_str(&links.join(",")) {
        Ok(value) => {
            headers.insert(LINK, value);
        }
        Err(err) => tracing::warn!(error = %err, "Skipping unrepresentable Link header"),
    }

    headers
}
