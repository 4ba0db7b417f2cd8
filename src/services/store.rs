// SPDX-License-Identifier: BSD-3-Clause
// Copyright (c) 2026 Aleksandr Ptakhin

//! Postgres page-store adapter.
//!
//! Thin wrapper over the indexed `pages` and `links` tables. Ranking
//! primitives (`ts_rank_cd`, `plainto_tsquery`, `ts_headline`) live in
//! the database; this module only parameterizes and shapes the rows.

use crate::models::page::{BacklinkRow, CandidateRow, InboundLinkRow, SnippetRow};
use anyhow::{anyhow, Result};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use std::time::Duration;

/// Top-of-the-funnel cap on lexical candidates per query.
const CANDIDATE_LIMIT: i64 = 50_000;

const CANDIDATES_SQL: &str = "\
    SELECT url AS source_url, cross_site_links::text AS cross_site_links, content_type, size, \
    (ts_rank_cd(pages.title_vector, plainto_tsquery($1)) * 50 \
     + ts_rank_cd(pages.search_vector, plainto_tsquery($1)))::float4 AS rank \
    FROM pages WHERE pages.search_vector @@ plainto_tsquery($1) \
    ORDER BY rank DESC LIMIT $2";

const INBOUND_LINKS_SQL: &str = "\
    SELECT links.to_url AS dest_url, links.url AS source_url, content_type, size, \
    0::float4 AS rank \
    FROM pages JOIN links ON pages.url = links.to_url \
    WHERE links.is_cross_site = TRUE AND pages.search_vector @@ plainto_tsquery($1)";

const BACKLINKS_SQL: &str = "SELECT url, is_cross_site FROM links WHERE links.to_url = $1";

/// Connection settings, read from the environment.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    pub database_url: String,
    pub max_connections: u32,
    pub acquire_timeout: Duration,
}

impl StoreConfig {
    pub fn from_env() -> Result<Self> {
        let database_url = std::env::var("GEMSEARCH_DATABASE_URL")
            .or_else(|_| std::env::var("DATABASE_URL"))
            .map_err(|_| anyhow!("GEMSEARCH_DATABASE_URL environment variable not set"))?;

        let max_connections = match std::env::var("GEMSEARCH_DB_MAX_CONNECTIONS") {
            Ok(value) => value
                .parse()
                .map_err(|_| anyhow!("GEMSEARCH_DB_MAX_CONNECTIONS must be a number"))?,
            Err(_) => 8,
        };

        let acquire_timeout = match std::env::var("GEMSEARCH_DB_ACQUIRE_TIMEOUT_SECS") {
            Ok(value) => Duration::from_secs(
                value
                    .parse()
                    .map_err(|_| anyhow!("GEMSEARCH_DB_ACQUIRE_TIMEOUT_SECS must be a number"))?,
            ),
            Err(_) => Duration::from_secs(30),
        };

        Ok(Self {
            database_url,
            max_connections,
            acquire_timeout,
        })
    }
}

/// Handle to the indexed page store.
#[derive(Debug, Clone)]
pub struct PageStore {
    pool: PgPool,
}

impl PageStore {
    /// Connect eagerly, verifying the database is reachable.
    pub async fn connect(config: &StoreConfig) -> Result<Self, sqlx::Error> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(config.acquire_timeout)
            .connect(&config.database_url)
            .await?;
        Ok(Self { pool })
    }

    /// Build the handle without touching the network; connections are
    /// established on first use.
    pub fn connect_lazy(config: &StoreConfig) -> Result<Self, sqlx::Error> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(config.acquire_timeout)
            .connect_lazy(&config.database_url)?;
        Ok(Self { pool })
    }

    /// Top pages whose body matches `query`, ranked by weighted title
    /// plus body rank. The rank is strictly positive for every row.
    pub async fn lexical_candidates(&self, query: &str) -> Result<Vec<CandidateRow>, sqlx::Error> {
        sqlx::query_as::<_, CandidateRow>(CANDIDATES_SQL)
            .bind(query)
            .bind(CANDIDATE_LIMIT)
            .fetch_all(&self.pool)
            .await
    }

    /// Cross-site links pointing at pages that match `query`. These
    /// rows carry rank 0 and feed the base set of the authority graph.
    pub async fn inbound_links(&self, query: &str) -> Result<Vec<InboundLinkRow>, sqlx::Error> {
        sqlx::query_as::<_, InboundLinkRow>(INBOUND_LINKS_SQL)
            .bind(query)
            .fetch_all(&self.pool)
            .await
    }

    /// Metadata and highlighted previews for the visible result page.
    ///
    /// The URL set is spliced into the statement text because the
    /// driver cannot bind a set for `IN`; URLs carrying a single quote
    /// are dropped rather than escaped.
    pub async fn page_snippets(
        &self,
        query: &str,
        urls: &[String],
    ) -> Result<Vec<SnippetRow>, sqlx::Error> {
        let url_list = urls
            .iter()
            .filter(|url| !url.contains('\''))
            .map(|url| format!("'{url}'"))
            .collect::<Vec<_>>()
            .join(", ");
        if url_list.is_empty() {
            return Ok(Vec::new());
        }

        // The first 5000 characters are enough for an accurate headline
        // and keep ts_headline fast on huge pages.
        let sql = format!(
            "SELECT url, size, title, content_type, \
             ts_headline(SUBSTRING(content_body, 0, 5000), plainto_tsquery($1), \
             'StartSel=\"\", StopSel=\"\", MinWords=23, MaxWords=37, MaxFragments=1, \
             FragmentDelimiter=\" ... \"') AS preview, \
             last_crawled_at FROM pages WHERE url IN ({url_list})"
        );
        sqlx::query_as::<_, SnippetRow>(&sql)
            .bind(query)
            .fetch_all(&self.pool)
            .await
    }

    /// Every link whose destination is `url`.
    pub async fn backlinks(&self, url: &str) -> Result<Vec<BacklinkRow>, sqlx::Error> {
        sqlx::query_as::<_, BacklinkRow>(BACKLINKS_SQL)
            .bind(url)
            .fetch_all(&self.pool)
            .await
    }
}
