// SPDX-License-Identifier: BSD-3-Clause
// Copyright (c) 2026 Aleksandr Ptakhin

use serde::{Deserialize, Serialize};

/// A `content_type:` or `domain:` constraint from the query mini-language.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterConstraint {
    pub value: String,
    pub negate: bool,
}

/// A `size:` constraint, already multiplied out to bytes.
///
/// `greater` folds the `NOT` prefix in: it is `negate XOR (op == '>')`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SizeConstraint {
    pub bytes: u64,
    pub greater: bool,
}

/// Structured constraints parsed out of a search query.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchFilter {
    pub content_type: Vec<FilterConstraint>,
    pub domain: Vec<FilterConstraint>,
    pub size: Vec<SizeConstraint>,
}

impl SearchFilter {
    pub fn is_empty(&self) -> bool {
        self.content_type.is_empty() && self.domain.is_empty() && self.size.is_empty()
    }
}

/// One entry of the ranked list produced by the authority pass.
/// Ordered by `(is_root desc, score desc)` at the time it is built.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankedResult {
    pub url: String,
    pub content_type: String,
    pub size: u64,
    pub score: f32,
}

/// A fully hydrated result, ready to render on the visible page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResultEntry {
    pub url: String,
    pub title: String,
    pub content_type: String,
    pub preview: String,
    pub last_crawled_at: String,
    pub size: u64,
    pub score: f32,
}
