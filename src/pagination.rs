use serde::{Deserialize, Serialize};
use ts_rs::TS;
use utoipa::{IntoParams, ToSchema};

pub const DEFAULT_PAGE: u32 = 1;
pub const DEFAULT_PER_PAGE: u32 = 10;
pub const MAX_PER_PAGE: u32 = 100;

/// PaginationParams
///
/// Raw `page` / `per_page` query parameters. Kept as strings so that values
/// which are not integers fall back to the defaults instead of rejecting the
/// request.
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PaginationParams {
    /// 1-based page number. Defaults to 1.
    #[param(value_type = Option<u32>)]
    pub page: Option<String>,
    /// Items per page. Defaults to 10, capped at 100.
    #[param(value_type = Option<u32>)]
    pub per_page: Option<String>,
}

/// PageRequest
///
/// A normalized page selection: `page >= 1` and `1 <= per_page <= MAX_PER_PAGE`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    page: u32,
    per_page: u32,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: DEFAULT_PAGE,
            per_page: DEFAULT_PER_PAGE,
        }
    }
}

impl PageRequest {
    /// Builds a request, clamping out-of-range values.
    pub fn new(page: u32, per_page: u32) -> Self {
        Self {
            page: page.max(1),
            per_page: if per_page == 0 {
                DEFAULT_PER_PAGE
            } else {
                per_page.min(MAX_PER_PAGE)
            },
        }
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn per_page(&self) -> u32 {
        self.per_page
    }

    /// Rows to skip, for `OFFSET`.
    pub fn offset(&self) -> i64 {
        i64::from(self.page - 1) * i64::from(self.per_page)
    }

    /// Rows to return, for `LIMIT`.
    pub fn limit(&self) -> i64 {
        i64::from(self.per_page)
    }

    /// Same page size, different page.
    fn with_page(self, page: u32) -> Self {
        Self { page, ..self }
    }
}

impl From<PaginationParams> for PageRequest {
    fn from(params: PaginationParams) -> Self {
        let page = parse_param(params.page.as_deref())
            .map(|page| page.clamp(1, i64::from(u32::MAX)) as u32)
            .unwrap_or(DEFAULT_PAGE);
        let per_page = match parse_param(params.per_page.as_deref()) {
            Some(per_page) if per_page >= 1 => per_page.min(i64::from(MAX_PER_PAGE)) as u32,
            _ => DEFAULT_PER_PAGE,
        };
        Self::new(page, per_page)
    }
}

fn parse_param(raw: Option<&str>) -> Option<i64> {
    raw.and_then(|value| value.trim().parse::<i64>().ok())
}

/// Page
///
/// One page of rows as returned by the repository, with the total number of
/// rows matching the query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: u64,
}

impl<T> Page<T> {
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            total: self.total,
        }
    }
}

/// PageMeta
///
/// Pagination metadata of a collection envelope.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, PartialEq, Eq)]
#[ts(export)]
pub struct PageMeta {
    pub page: u32,
    pub per_page: u32,
    pub total_pages: u64,
    pub total_items: u64,
}

/// CollectionLinks
///
/// Navigation links of a collection envelope. `next` and `prev` are `null` at
/// the edges.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, PartialEq, Eq)]
#[ts(export)]
pub struct CollectionLinks {
    #[serde(rename = "self")]
    pub self_link: String,
    pub next: Option<String>,
    pub prev: Option<String>,
}

/// Collection
///
/// The paginated collection envelope: a page of items, its metadata and links
/// built from the route that produced it.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, PartialEq, Eq)]
#[ts(export)]
pub struct Collection<T> {
    pub items: Vec<T>,
    #[serde(rename = "_meta")]
    pub meta: PageMeta,
    #[serde(rename = "_links")]
    pub links: CollectionLinks,
}

impl<T> Collection<T> {
    /// Wraps `page` into an envelope. `link` renders the URL of the listing
    /// route for a given page request.
    pub fn new(page: Page<T>, request: PageRequest, link: impl Fn(PageRequest) -> String) -> Self {
        let total_pages = page.total.div_ceil(u64::from(request.per_page));
        let current = request.page;

        let next = (u64::from(current) < total_pages).then(|| link(request.with_page(current + 1)));
        let prev = (current > 1).then(|| link(request.with_page(current - 1)));

        Self {
            items: page.items,
            meta: PageMeta {
                page: current,
                per_page: request.per_page,
                total_pages,
                total_items: page.total,
            },
            links: CollectionLinks {
                self_link: link(request),
                next,
                prev,
            },
        }
    }
}
