// SPDX-License-Identifier: BSD-3-Clause
// Copyright (c) 2026 Aleksandr Ptakhin

//! Application state and request dispatch.
//!
//! This module is `pub` so that integration tests can drive the
//! dispatcher directly without opening a socket.

use crate::error::SearchError;
use crate::gemini::{GeminiRequest, GeminiResponse};
use crate::models::search::RankedResult;
use crate::routes;
use crate::services::cache::ResultCache;
use crate::services::counter::InflightCounter;
use crate::services::store::PageStore;
use std::sync::Arc;
use std::time::Duration;
use tracing::error;

/// Application version, shown on the home page.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Ranked result lists stay valid this long before a query is re-run.
const RESULT_CACHE_TTL: Duration = Duration::from_secs(600);

/// Shared state injected into every request handler.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<PageStore>,
    pub result_cache: Arc<ResultCache<Vec<RankedResult>>>,
    pub in_flight: Arc<InflightCounter>,
}

impl AppState {
    pub fn new(store: PageStore) -> Self {
        Self {
            store: Arc::new(store),
            result_cache: Arc::new(ResultCache::new(RESULT_CACHE_TTL)),
            in_flight: Arc::new(InflightCounter::new()),
        }
    }
}

/// Route a request and turn pipeline errors into protocol responses.
pub async fn dispatch(state: &AppState, request: &GeminiRequest) -> GeminiResponse {
    match route(state, request).await {
        Ok(response) => response,
        Err(SearchError::Input(prompt)) => GeminiResponse::input(&prompt),
        Err(SearchError::Overloaded) => GeminiResponse::slow_down(),
        Err(err @ SearchError::Store(_)) => {
            error!(path = %request.path, error = %err, "request failed");
            GeminiResponse::failure("Internal error")
        }
    }
}

async fn route(state: &AppState, request: &GeminiRequest) -> Result<GeminiResponse, SearchError> {
    let path = request.path.as_str();

    if path == "/" {
        return Ok(GeminiResponse::success(home_page()));
    }

    let unprefixed = path.strip_prefix("/v").unwrap_or(path);
    if unprefixed == "/search" || unprefixed.starts_with("/search/") {
        return routes::search::ranked_search(state, request).await;
    }
    if let Some(term) = unprefixed.strip_prefix("/search_jump/") {
        return routes::search::jump_search(request, term);
    }
    if path == "/backlinks" {
        return routes::search::backlinks(state, request).await;
    }

    Ok(GeminiResponse::not_found())
}

fn home_page() -> String {
    format!(
        "# Gemini capsule search\n\
         \n\
         => /search Search the crawled corpus\n\
         => /backlinks Who links to a page?\n\
         \n\
         Filters: content_type:, domain:, size:<op><num><unit>, NOT prefix.\n\
         \n\
         gemsearch-agent {VERSION}\n"
    )
}
