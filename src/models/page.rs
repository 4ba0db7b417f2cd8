// SPDX-License-Identifier: BSD-3-Clause
// Copyright (c) 2026 Aleksandr Ptakhin

use chrono::{DateTime, Utc};

/// Lexical-candidate row: a page whose body matched the query, with its
/// outgoing cross-site links and combined title/body rank.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct CandidateRow {
    pub source_url: String,
    /// JSON array of destination URL strings; null when the page has no
    /// cross-site links.
    pub cross_site_links: Option<String>,
    pub content_type: String,
    pub size: i64,
    /// Strictly positive for lexical matches.
    pub rank: f32,
}

/// Cross-site link pointing at a page that matched the query. The rank
/// is always zero, marking the linking page as a base-set node.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct InboundLinkRow {
    pub dest_url: String,
    pub source_url: String,
    pub content_type: String,
    pub size: i64,
    pub rank: f32,
}

/// Page metadata plus highlighted preview for one visible result.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct SnippetRow {
    pub url: String,
    pub size: i64,
    pub title: Option<String>,
    pub content_type: String,
    pub preview: Option<String>,
    pub last_crawled_at: DateTime<Utc>,
}

/// One link whose destination is the page being asked about.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct BacklinkRow {
    pub url: String,
    pub is_cross_site: bool,
}
