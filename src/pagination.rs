//! Paginated collections.
//!
//! Ghost list endpoints return the items under a type-specific key and the
//! paging state under `meta.pagination`:
//!
//! ```json
//! {"posts": [...], "meta": {"pagination": {"page": 1, "limit": 15, "pages": 3, "total": 31}}}
//! ```

use crate::codec::{decode_items, from_json, value_at, JsonDecode};
use crate::post::PersistedPost;
use crate::tag::Tag;
use serde::Deserialize;
use serde_json::Value;

/// Path of the pagination section in list responses
pub const PAGINATION_PATH: &str = "meta.pagination";

/// Entity that can be listed in a paginated response
pub trait PageItem: JsonDecode {
    /// Top-level key holding the items
    const ITEMS_KEY: &'static str;
}

impl PageItem for PersistedPost {
    const ITEMS_KEY: &'static str = "posts";
}

impl PageItem for Tag {
    const ITEMS_KEY: &'static str = "tags";
}

/// Page to request from a list endpoint. A `limit` of 0 requests all items.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u32,
    pub limit: u32,
}

impl PageRequest {
    pub fn new(page: u32, limit: u32) -> Self {
        PageRequest { page, limit }
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        PageRequest { page: 1, limit: 15 }
    }
}

/// Paging state reported by the server
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct PaginationMetadata {
    pub page: u32,
    pub limit: u32,
    pub pages: u32,
    #[serde(default)]
    pub total: u64,
}

impl PaginationMetadata {
    /// The page following this one, if there is one
    pub fn next(&self) -> Option<PageRequest> {
        (self.page < self.pages).then(|| PageRequest::new(self.page + 1, self.limit))
    }
}

/// One page of entities with its metadata.
///
/// `metadata` is `None` when the response had no pagination section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pagination<T> {
    pub items: Vec<T>,
    pub metadata: Option<PaginationMetadata>,
}

pub type PostsPagination = Pagination<PersistedPost>;
pub type TagsPagination = Pagination<Tag>;

impl<T> Pagination<T> {
    pub fn page(&self) -> Option<u32> {
        self.metadata.map(|m| m.page)
    }

    pub fn limit(&self) -> Option<u32> {
        self.metadata.map(|m| m.limit)
    }

    pub fn total(&self) -> Option<u64> {
        self.metadata.map(|m| m.total)
    }

    pub fn next_page(&self) -> Option<PageRequest> {
        self.metadata.as_ref().and_then(PaginationMetadata::next)
    }
}

impl<T> Default for Pagination<T> {
    fn default() -> Self {
        Pagination {
            items: Vec::new(),
            metadata: None,
        }
    }
}

impl<T: PageItem> JsonDecode for Pagination<T> {
    const ENTITY: &'static str = T::ITEMS_KEY;

    fn decode(json: &Value) -> Option<Self> {
        if !json.is_object() {
            return None;
        }

        let metadata = value_at(json, PAGINATION_PATH).and_then(from_json::<PaginationMetadata>);
        Some(Pagination {
            items: decode_items(json, T::ITEMS_KEY),
            metadata,
        })
    }
}
