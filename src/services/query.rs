// SPDX-License-Identifier: BSD-3-Clause
// Copyright (c) 2026 Aleksandr Ptakhin

//! Search query mini-language.
//!
//! A query is a space-separated token list. `content_type:`, `domain:`
//! and `size:` tokens become structured constraints, `NOT`/`not` negates
//! the following constraint, everything else is free text handed to the
//! full-text index.

use crate::models::search::{FilterConstraint, SearchFilter, SizeConstraint};
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TokenKind {
    Text,
    Filter,
    Logical,
}

static SIZE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^([<>])([0-9.]+)([A-Za-z]+)?$").unwrap());

fn classify(token: &str) -> TokenKind {
    if let Some((key, value)) = token.split_once(':') {
        if !key.is_empty()
            && !value.is_empty()
            && !value.contains(':')
            && matches!(key, "content_type" | "domain" | "size")
        {
            return TokenKind::Filter;
        }
    }
    if token == "NOT" || token == "not" {
        return TokenKind::Logical;
    }
    TokenKind::Text
}

/// Multiplier for a size-filter unit suffix. Case-insensitive, with an
/// optional trailing `b` (`kb`, `mib`, ...).
fn parse_size_unit(unit: &str) -> Option<u64> {
    let mut unit = unit.to_ascii_lowercase();
    if unit.len() > 1 && unit.ends_with('b') {
        unit.pop();
    }
    match unit.as_str() {
        "" | "b" | "byte" => Some(1),
        "k" => Some(1_000),
        "ki" => Some(1 << 10),
        "m" => Some(1_000_000),
        "mi" => Some(1 << 20),
        "g" => Some(1_000_000_000),
        "gi" => Some(1 << 30),
        _ => None,
    }
}

fn parse_size_constraint(value: &str, negate: bool) -> Option<SizeConstraint> {
    let captures = SIZE_RE.captures(value)?;
    let greater = &captures[1] == ">";
    let number: f64 = captures[2].parse().ok()?;
    let unit = parse_size_unit(captures.get(3).map_or("", |m| m.as_str()))?;
    Some(SizeConstraint {
        bytes: (number * unit as f64) as u64,
        greater: negate ^ greater,
    })
}

/// Split a raw query into free text and structured constraints.
///
/// The text keeps the caller's case; the orchestrator lowercases it
/// before using it as cache key and index query. Malformed size filters
/// are dropped (they still consume a pending `NOT`).
pub fn parse_search_query(input: &str) -> (String, SearchFilter) {
    let words: Vec<&str> = input.split(' ').filter(|w| !w.is_empty()).collect();
    let kinds: Vec<TokenKind> = words.iter().map(|w| classify(w)).collect();

    let mut text_parts: Vec<&str> = Vec::new();
    let mut filter = SearchFilter::default();
    let mut negate = false;

    for (i, (&word, kind)) in words.iter().zip(&kinds).enumerate() {
        match kind {
            TokenKind::Text => text_parts.push(word),
            TokenKind::Filter => {
                if let Some((key, value)) = word.split_once(':') {
                    match key {
                        "content_type" => filter.content_type.push(FilterConstraint {
                            value: value.to_string(),
                            negate,
                        }),
                        "domain" => filter.domain.push(FilterConstraint {
                            value: value.to_string(),
                            negate,
                        }),
                        "size" => match parse_size_constraint(value, negate) {
                            Some(constraint) => filter.size.push(constraint),
                            None => debug!(token = word, "dropping malformed size filter"),
                        },
                        _ => {}
                    }
                }
                negate = false;
            }
            TokenKind::Logical => {
                // NOT only binds to a directly following filter token;
                // otherwise it is ordinary text.
                if kinds.get(i + 1) == Some(&TokenKind::Filter) {
                    negate = true;
                } else {
                    text_parts.push(word);
                }
            }
        }
    }

    (text_parts.join(" "), filter)
}
