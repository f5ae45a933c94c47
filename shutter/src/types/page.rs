use serde::{Deserialize, Serialize};

use super::filters::FilterSet;
use super::photo::Photo;
use crate::error::{Result, ShutterError};

/// Largest page the provider will serve.
pub const MAX_PAGE_SIZE: u32 = 30;

/// One page query. Two requests are cache-equivalent iff all fields are equal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageRequest {
    pub page: u32,
    pub page_size: u32,
    pub filters: FilterSet,
}

impl PageRequest {
    pub fn new(page: u32, page_size: u32, filters: FilterSet) -> Self {
        Self {
            page,
            page_size,
            filters,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.page == 0 {
            return Err(ShutterError::Validation("page must be >= 1".into()));
        }
        if self.page_size == 0 || self.page_size > MAX_PAGE_SIZE {
            return Err(ShutterError::Validation(format!(
                "page size must be within 1..={MAX_PAGE_SIZE}, got {}",
                self.page_size
            )));
        }
        Ok(())
    }
}

impl std::fmt::Display for PageRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "list:{}:{}:{}:{}:{}",
            self.page,
            self.page_size,
            self.filters.order_by,
            self.filters.color,
            self.filters.orientation
        )
    }
}

/// A normalised page of photos.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PhotoPage {
    pub items: Vec<Photo>,
    pub total: u64,
}

/// Page payload as it appears on the wire: either a bare array or an object
/// with `results`.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ListPayload {
    Bare(Vec<Photo>),
    Paged {
        results: Vec<Photo>,
        #[serde(default)]
        total: Option<u64>,
    },
}

impl ListPayload {
    /// Normalise into a [`PhotoPage`].
    ///
    /// `fallback_total` is used when the payload carries no total (the
    /// provider reports it in a header for bare arrays). Any unusable photo
    /// makes the whole payload malformed.
    pub fn into_page(self, fallback_total: Option<u64>) -> Result<PhotoPage> {
        let (items, total) = match self {
            ListPayload::Bare(items) => (items, fallback_total),
            ListPayload::Paged { results, total } => (results, total.or(fallback_total)),
        };
        if let Some(defect) = items.iter().find_map(Photo::defect) {
            return Err(ShutterError::Upstream(format!("malformed payload: {defect}")));
        }
        let total = total.unwrap_or(items.len() as u64);
        Ok(PhotoPage { items, total })
    }
}
