// SPDX-License-Identifier: BSD-3-Clause
// Copyright (c) 2026 Aleksandr Ptakhin

//! Search endpoints: ranked search, page jumping and backlinks.

use crate::app::AppState;
use crate::error::SearchError;
use crate::gemini::{GeminiRequest, GeminiResponse};
use crate::models::search::{RankedResult, SearchResultEntry};
use crate::models::url::GemUrl;
use crate::services::filter::eval_filter;
use crate::services::hits::{self, RankingMode};
use crate::services::query::parse_search_query;
use crate::services::text;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, warn};

pub const RESULTS_PER_PAGE: usize = 10;
const MAX_SEARCHES_IN_FLIGHT: usize = 120;

static PAGE_PATH_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(?:/v)?/search/([0-9]+)$").unwrap());

/// Zero-based page index from the request path. `/search` and
/// `/search/1` are the first page.
fn page_index(path: &str) -> usize {
    PAGE_PATH_RE
        .captures(path)
        .and_then(|captures| captures[1].parse::<usize>().ok())
        .map(|page| page.saturating_sub(1))
        .unwrap_or(0)
}

/// Clamp the visible window for `page_idx` into `[0, total]`.
pub fn page_bounds(page_idx: usize, total: usize) -> (usize, usize) {
    let start = (page_idx * RESULTS_PER_PAGE).min(total);
    let end = (start + RESULTS_PER_PAGE).min(total);
    (start, end)
}

/// Ranked search over the crawled corpus.
pub async fn ranked_search(
    state: &AppState,
    request: &GeminiRequest,
) -> Result<GeminiResponse, SearchError> {
    let started = Instant::now();

    // Admission check before any work is queued
    let guard = state.in_flight.acquire();
    if guard.observed() > MAX_SEARCHES_IN_FLIGHT {
        return Err(SearchError::Overloaded);
    }

    let input = request.decoded_query();
    let (query_text, filter) = parse_search_query(&input);
    let query_text = query_text.to_lowercase();
    if query_text.is_empty() {
        return Err(SearchError::Input("Search for something".to_string()));
    }

    let page_idx = page_index(&request.path);
    let verbose = request.path.starts_with("/v/search");

    let built = AtomicBool::new(false);
    let ranked = state
        .result_cache
        .find_or_build(&query_text, || {
            built.store(true, Ordering::Relaxed);
            let store = state.store.clone();
            let query = query_text.clone();
            async move {
                let candidates = store.lexical_candidates(&query).await?;
                let inbound = store.inbound_links(&query).await?;
                Ok::<_, SearchError>(hits::rank_pages(&candidates, &inbound, RankingMode::Authority))
            }
        })
        .await?;

    let filtered: Arc<Vec<RankedResult>> = if filter.is_empty() {
        ranked.clone()
    } else {
        Arc::new(
            ranked
                .iter()
                .filter(|item| {
                    let host = GemUrl::parse(&item.url)
                        .map(|url| url.host().to_string())
                        .unwrap_or_default();
                    eval_filter(&host, &item.content_type, item.size, &filter)
                })
                .cloned()
                .collect(),
        )
    };

    let total = filtered.len();
    let (page_start, page_end) = page_bounds(page_idx, total);
    let visible = &filtered[page_start..page_end];

    let mut entries: Vec<SearchResultEntry> = Vec::with_capacity(visible.len());
    if !visible.is_empty() {
        let urls: Vec<String> = visible.iter().map(|item| item.url.clone()).collect();
        let rows = state.store.page_snippets(&query_text, &urls).await?;
        let by_url: HashMap<&str, usize> = rows
            .iter()
            .enumerate()
            .map(|(idx, row)| (row.url.as_str(), idx))
            .collect();

        for item in visible {
            let Some(&idx) = by_url.get(item.url.as_str()) else {
                warn!(url = %item.url, "ranked result no longer present in page store");
                continue;
            };
            let row = &rows[idx];
            entries.push(SearchResultEntry {
                url: item.url.clone(),
                title: row.title.clone().unwrap_or_default(),
                content_type: row.content_type.clone(),
                preview: row.preview.clone().unwrap_or_default(),
                last_crawled_at: row.last_crawled_at.format("%Y-%m-%d %H:%M:%S").to_string(),
                size: row.size.max(0) as u64,
                score: item.score,
            });
        }
    }

    let body = render_search_page(&input, &entries, total, page_idx, verbose);

    debug!(
        query = %query_text,
        cached = !built.load(Ordering::Relaxed),
        elapsed_ms = started.elapsed().as_millis() as u64,
        results = total,
        "search served"
    );
    Ok(GeminiResponse::success(body))
}

/// Redirect to the requested result page, keeping the original search
/// term as the query string.
pub fn jump_search(request: &GeminiRequest, search_term: &str) -> Result<GeminiResponse, SearchError> {
    let input = request.decoded_query();
    // A leading run of digits is enough; trailing text is ignored.
    // No digits at all (or overflow) asks for input again.
    let trimmed = input.trim_start();
    let digits = trimmed
        .bytes()
        .take_while(|byte| byte.is_ascii_digit())
        .count();
    let Ok(page) = trimmed[..digits].parse::<u64>() else {
        return Err(SearchError::Input("Go to page".to_string()));
    };

    let search_path = if request.path.starts_with("/v") {
        "/v/search"
    } else {
        "/search"
    };
    let target = if page != 1 {
        format!("{search_path}/{page}?{search_term}")
    } else {
        format!("{search_path}?{search_term}")
    };
    Ok(GeminiResponse::redirect(&target))
}

/// List every crawled link pointing at a page, split into links from
/// the same capsule and links from elsewhere.
pub async fn backlinks(
    state: &AppState,
    request: &GeminiRequest,
) -> Result<GeminiResponse, SearchError> {
    let input = request.decoded_query();
    let url = if input.is_empty() {
        None
    } else {
        GemUrl::parse_lenient(&input)
    };
    let Some(url) = url else {
        return Err(SearchError::Input("Enter URL to a page".to_string()));
    };

    let rows = state.store.backlinks(url.as_str()).await?;
    let mut internal: Vec<String> = Vec::new();
    let mut external: Vec<String> = Vec::new();
    for row in rows {
        if row.is_cross_site {
            external.push(row.url);
        } else {
            internal.push(row.url);
        }
    }

    Ok(GeminiResponse::success(render_backlinks_page(
        url.as_str(),
        &internal,
        &external,
    )))
}

fn render_search_page(
    input: &str,
    entries: &[SearchResultEntry],
    total: usize,
    page_idx: usize,
    verbose: bool,
) -> String {
    let mut body = String::new();
    let title = text::sanitize_gemtext(input);
    body.push_str(&format!("# Search: {}\n\n", title.trim()));

    if total == 0 {
        body.push_str("Nothing matched your query.\n");
        return body;
    }

    for (offset, entry) in entries.iter().enumerate() {
        let number = page_idx * RESULTS_PER_PAGE + offset + 1;
        let label = if entry.title.trim().is_empty() {
            entry.url.clone()
        } else {
            text::sanitize_gemtext(&entry.title).trim().to_string()
        };
        body.push_str(&format!("=> {} {}. {}\n", entry.url, number, label));

        let preview = text::sanitize_gemtext(&entry.preview);
        let preview = preview.trim();
        if preview.is_empty() {
            body.push_str("No preview provided\n");
        } else {
            body.push_str(preview);
            body.push('\n');
        }

        if verbose {
            body.push_str(&format!(
                "* {} | {} | crawled {} | score {:.3}\n",
                entry.content_type,
                text::format_size(entry.size),
                entry.last_crawled_at,
                entry.score,
            ));
        } else {
            body.push_str(&format!(
                "* {} | {} | crawled {}\n",
                entry.content_type,
                text::format_size(entry.size),
                entry.last_crawled_at,
            ));
        }
        body.push('\n');
    }

    let encoded = text::url_encode(input);
    let prefix = if verbose { "/v" } else { "" };
    let last_page = total.div_ceil(RESULTS_PER_PAGE);

    if page_idx > 0 {
        if page_idx == 1 {
            body.push_str(&format!("=> {prefix}/search?{encoded} Previous page\n"));
        } else {
            body.push_str(&format!(
                "=> {prefix}/search/{}?{encoded} Previous page\n",
                page_idx
            ));
        }
    }
    if (page_idx + 1) * RESULTS_PER_PAGE < total {
        body.push_str(&format!(
            "=> {prefix}/search/{}?{encoded} Next page\n",
            page_idx + 2
        ));
    }
    body.push_str(&format!(
        "=> {prefix}/search_jump/{encoded} Jump to page\n\n"
    ));
    body.push_str(&format!(
        "{} results, page {} of {}\n",
        total,
        page_idx + 1,
        last_page.max(1)
    ));
    body
}

fn render_backlinks_page(url: &str, internal: &[String], external: &[String]) -> String {
    let mut body = String::new();
    body.push_str(&format!("# Backlinks to {url}\n\n"));

    body.push_str("## From the same capsule\n");
    if internal.is_empty() {
        body.push_str("No known internal backlinks.\n");
    } else {
        for link in internal {
            body.push_str(&format!("=> {link}\n"));
        }
    }

    body.push_str("\n## From other capsules\n");
    if external.is_empty() {
        body.push_str("No known external backlinks.\n");
    } else {
        for link in external {
            body.push_str(&format!("=> {link}\n"));
        }
    }
    body
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_index_from_path() {
        assert_eq!(page_index("/search"), 0);
        assert_eq!(page_index("/search/1"), 0);
        assert_eq!(page_index("/search/2"), 1);
        assert_eq!(page_index("/v/search/7"), 6);
        assert_eq!(page_index("/search/abc"), 0);
        assert_eq!(page_index("/v/search"), 0);
    }

    #[test]
    fn test_page_bounds() {
        // 25 results, page "3" (index 2) covers [20, 25)
        assert_eq!(page_bounds(2, 25), (20, 25));
        // page "2" covers [10, 20)
        assert_eq!(page_bounds(1, 25), (10, 20));
        // Past the end collapses to an empty window
        assert_eq!(page_bounds(9, 25), (25, 25));
        assert_eq!(page_bounds(0, 0), (0, 0));
        assert_eq!(page_bounds(0, 3), (0, 3));
    }

    #[test]
    fn test_render_search_page_empty() {
        let body = render_search_page("cats", &[], 0, 0, false);
        assert!(body.contains("Nothing matched"));
    }

    #[test]
    fn test_render_search_page_pagination_links() {
        let entries: Vec<SearchResultEntry> = (0..10)
            .map(|i| SearchResultEntry {
                url: format!("gemini://capsule{i}.example/"),
                title: format!("Capsule {i}"),
                content_type: "text/gemini".to_string(),
                preview: "a preview".to_string(),
                last_crawled_at: "2026-07-01 10:00:00".to_string(),
                size: 1000,
                score: 1.0,
            })
            .collect();

        // Middle page gets both directions
        let body = render_search_page("cats", &entries, 25, 1, false);
        assert!(body.contains("=> /search?cats Previous page"));
        assert!(body.contains("=> /search/3?cats Next page"));
        assert!(body.contains("25 results, page 2 of 3"));

        // First page has no previous link
        let body = render_search_page("cats", &entries, 25, 0, false);
        assert!(!body.contains("Previous page"));
        assert!(body.contains("=> /search/2?cats Next page"));

        // Verbose pages use the /v prefix and show scores
        let body = render_search_page("cats", &entries, 25, 1, true);
        assert!(body.contains("=> /v/search/3?cats Next page"));
        assert!(body.contains("score 1.000"));
    }
}
