//! Paginated, predicate-filtered recipe listings.

use std::sync::Arc;

use tracing::debug;

use crate::db::models::{RecipeQueryRequest, RecipeQueryResponse};
use crate::error::{Error, Result};
use crate::store::{RecipeFilter, RecipeStore};

#[derive(Clone)]
pub struct FilterEngine {
    store: Arc<dyn RecipeStore>,
}

impl FilterEngine {
    pub fn new(store: Arc<dyn RecipeStore>) -> Self {
        Self { store }
    }

    /// List one page of recipes matching every active predicate.
    ///
    /// `page` and `limit` must already be positive; callers clamp user input.
    /// `total` counts all matching recipes, not just this page.
    pub async fn list(&self, request: &RecipeQueryRequest) -> Result<RecipeQueryResponse> {
        if request.page < 1 {
            return Err(Error::InvalidInput(format!(
                "page must be at least 1, got {}",
                request.page
            )));
        }
        if request.limit < 1 {
            return Err(Error::InvalidInput(format!(
                "limit must be at least 1, got {}",
                request.limit
            )));
        }

        let filter = RecipeFilter::from_request(request);
        let limit = u64::from(request.limit);
        let offset = (u64::from(request.page) - 1) * limit;

        debug!(?filter, page = request.page, limit, "Listing recipes");

        let (recipes, total) = self.store.list_filtered(&filter, offset, limit).await?;

        Ok(RecipeQueryResponse {
            recipes,
            page: request.page,
            limit: request.limit,
            total,
        })
    }
}

/// Number of pages needed for `total` rows, capped at `max_pages`
pub fn total_pages(total: u64, limit: u32, max_pages: u64) -> u64 {
    if limit == 0 {
        return 0;
    }
    total.div_ceil(u64::from(limit)).min(max_pages)
}
