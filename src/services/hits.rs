// SPDX-License-Identifier: BSD-3-Clause
// Copyright (c) 2026 Aleksandr Ptakhin

//! Link-graph authority ranking.
//!
//! Builds an in-memory graph from the two store result streams (lexical
//! matches form the root set, pages linking into them form the base
//! set), runs hub/authority iteration to convergence, then fuses the
//! authority score with the lexical rank.

use crate::models::page::{CandidateRow, InboundLinkRow};
use crate::models::search::RankedResult;
use std::cmp::Ordering;
use std::collections::HashMap;
use tracing::{debug, warn};

const MAX_ITERATIONS: usize = 300;
const CONVERGENCE_EPSILON: f32 = 0.005;
const AUTHORITY_BOOST: f32 = 6.5;

/// What the fused score should favor. The search endpoints use
/// authority; hub ordering is kept for link-hub exploration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RankingMode {
    Authority,
    Hub,
}

/// Nodes live in one contiguous vector; edges are indices into it.
#[derive(Debug)]
struct HitsNode {
    url: String,
    content_type: String,
    size: u64,
    outgoing: Vec<u32>,
    incoming: Vec<u32>,
    text_rank: f32,
    auth: f32,
    hub: f32,
    auth_next: f32,
    hub_next: f32,
    score: f32,
    is_root: bool,
}

impl HitsNode {
    fn new(url: &str, content_type: &str, size: i64, text_rank: f32) -> Self {
        Self {
            url: url.to_string(),
            content_type: content_type.to_string(),
            size: size.max(0) as u64,
            outgoing: Vec::new(),
            incoming: Vec::new(),
            text_rank,
            auth: 1.0,
            hub: 1.0,
            auth_next: 1.0,
            hub_next: 1.0,
            score: 0.0,
            is_root: text_rank > 0.0,
        }
    }
}

fn build_graph(candidates: &[CandidateRow], inbound: &[InboundLinkRow]) -> Vec<HitsNode> {
    let mut nodes: Vec<HitsNode> = Vec::with_capacity(candidates.len());
    let mut index: HashMap<String, u32> = HashMap::with_capacity(candidates.len());

    // First appearance wins for metadata and rank; candidates come
    // first, so every lexical match is a root node.
    let candidate_rows = candidates
        .iter()
        .map(|r| (r.source_url.as_str(), r.content_type.as_str(), r.size, r.rank));
    let inbound_rows = inbound
        .iter()
        .map(|r| (r.source_url.as_str(), r.content_type.as_str(), r.size, r.rank));
    for (url, content_type, size, rank) in candidate_rows.chain(inbound_rows) {
        if !index.contains_key(url) {
            index.insert(url.to_string(), nodes.len() as u32);
            nodes.push(HitsNode::new(url, content_type, size, rank));
        }
    }

    fn add_edge(nodes: &mut [HitsNode], source: u32, dest: u32) {
        nodes[source as usize].outgoing.push(dest);
        nodes[dest as usize].incoming.push(source);
    }

    for row in candidates {
        let Some(links) = row.cross_site_links.as_deref() else {
            continue;
        };
        let links: Vec<String> = match serde_json::from_str(links) {
            Ok(links) => links,
            Err(error) => {
                warn!(url = %row.source_url, %error, "unreadable cross_site_links");
                continue;
            }
        };
        let Some(source) = index.get(&row.source_url).copied() else {
            debug_assert!(false, "candidate row missing from node table");
            warn!(url = %row.source_url, "candidate row missing from node table");
            continue;
        };
        for dest_url in &links {
            if *dest_url == row.source_url {
                continue;
            }
            if let Some(dest) = index.get(dest_url).copied() {
                add_edge(&mut nodes, source, dest);
            }
        }
    }

    for row in inbound {
        if row.source_url == row.dest_url {
            continue;
        }
        let source = index.get(&row.source_url).copied();
        let dest = index.get(&row.dest_url).copied();
        if let (Some(source), Some(dest)) = (source, dest) {
            add_edge(&mut nodes, source, dest);
        }
    }

    nodes
}

/// Rank the root and base sets. Output is ordered `(is_root desc,
/// score desc)`; in authority mode the base set is trimmed off after
/// sorting, so linking pages influence scores without appearing.
pub fn rank_pages(
    candidates: &[CandidateRow],
    inbound: &[InboundLinkRow],
    mode: RankingMode,
) -> Vec<RankedResult> {
    let mut nodes = build_graph(candidates, inbound);

    debug!(
        total = nodes.len(),
        root = candidates.len(),
        base = nodes.len().saturating_sub(candidates.len()),
        "authority graph built"
    );
    if nodes.is_empty() {
        return Vec::new();
    }

    let mut score_delta = f32::MAX;
    let mut iterations = 0;
    while iterations < MAX_ITERATIONS && score_delta > CONVERGENCE_EPSILON {
        for idx in 0..nodes.len() {
            let mut auth_sum = 0.0f32;
            for &source in &nodes[idx].incoming {
                auth_sum += nodes[source as usize].hub;
            }
            let mut hub_sum = 0.0f32;
            for &dest in &nodes[idx].outgoing {
                hub_sum += nodes[dest as usize].auth;
            }
            // A zero sum means no neighbors feed this direction; the
            // previous value is retained rather than zeroed.
            nodes[idx].auth_next = if auth_sum != 0.0 {
                auth_sum
            } else {
                nodes[idx].auth
            };
            nodes[idx].hub_next = if hub_sum != 0.0 {
                hub_sum
            } else {
                nodes[idx].hub
            };
        }

        let auth_total = nodes.iter().map(|n| n.auth_next).sum::<f32>().max(1.0);
        let hub_total = nodes.iter().map(|n| n.hub_next).sum::<f32>().max(1.0);

        score_delta = 0.0;
        for node in nodes.iter_mut() {
            let auth = node.auth_next / auth_total;
            let hub = node.hub_next / hub_total;
            score_delta += (node.auth - auth).abs() + (node.hub - hub).abs();
            // Flush denormals
            node.auth = if auth < f32::EPSILON { 0.0 } else { auth };
            node.hub = if hub < f32::EPSILON { 0.0 } else { hub };
        }
        iterations += 1;
    }
    debug!(iterations, "authority iteration finished");

    let mut max_auth = nodes.iter().map(|n| n.auth).fold(0.0f32, f32::max);
    if max_auth == 0.0 {
        max_auth = 1.0;
    }

    for node in nodes.iter_mut() {
        node.score = match mode {
            RankingMode::Authority => {
                // Harmonic mean of the lexical rank and an exponential
                // authority boost.
                let boost = ((node.auth / max_auth) * AUTHORITY_BOOST).exp();
                2.0 * (boost * node.text_rank) / (boost + node.text_rank)
            }
            RankingMode::Hub => node.hub,
        };
    }

    nodes.sort_by(|a, b| {
        b.is_root
            .cmp(&a.is_root)
            .then(b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal))
    });
    if mode == RankingMode::Authority {
        let root_count = nodes
            .iter()
            .position(|n| !n.is_root)
            .unwrap_or(nodes.len());
        nodes.truncate(root_count);
    }

    nodes
        .iter()
        .map(|node| RankedResult {
            url: node.url.clone(),
            content_type: node.content_type.clone(),
            size: node.size,
            score: node.score,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate(url: &str, rank: f32, links: &[&str]) -> CandidateRow {
        CandidateRow {
            source_url: url.to_string(),
            cross_site_links: if links.is_empty() {
                None
            } else {
                Some(serde_json::to_string(links).unwrap())
            },
            content_type: "text/gemini".to_string(),
            size: 1000,
            rank,
        }
    }

    fn inbound_link(source: &str, dest: &str) -> InboundLinkRow {
        InboundLinkRow {
            dest_url: dest.to_string(),
            source_url: source.to_string(),
            content_type: "text/gemini".to_string(),
            size: 1000,
            rank: 0.0,
        }
    }

    #[test]
    fn test_empty_input_yields_empty_output() {
        assert!(rank_pages(&[], &[], RankingMode::Authority).is_empty());
    }

    #[test]
    fn test_triangle_roots_sort_before_base_and_base_is_trimmed() {
        // A and B match the query, C only links into the set: A→B, B→C, C→A.
        let a = "gemini://a.example/";
        let b = "gemini://b.example/";
        let c = "gemini://c.example/";
        let candidates = vec![candidate(a, 1.0, &[b]), candidate(b, 1.0, &[c])];
        let inbound = vec![inbound_link(c, a)];

        let ranked = rank_pages(&candidates, &inbound, RankingMode::Authority);
        let urls: Vec<&str> = ranked.iter().map(|r| r.url.as_str()).collect();
        assert_eq!(urls.len(), 2);
        assert!(urls.contains(&a) && urls.contains(&b));

        // In hub mode the base node survives and sorts after the roots
        let with_base = rank_pages(&candidates, &inbound, RankingMode::Hub);
        assert_eq!(with_base.len(), 3);
        assert_eq!(with_base[2].url, c);
    }

    #[test]
    fn test_scores_converge_and_normalize() {
        let a = "gemini://a.example/";
        let b = "gemini://b.example/";
        let c = "gemini://c.example/";
        let candidates = vec![
            candidate(a, 1.0, &[b, c]),
            candidate(b, 1.0, &[c]),
            candidate(c, 0.5, &[a]),
        ];

        let ranked = rank_pages(&candidates, &[], RankingMode::Authority);
        assert_eq!(ranked.len(), 3);
        for result in &ranked {
            assert!(result.score > 0.0, "score for {}", result.url);
            assert!(result.score.is_finite());
        }
        // Sorted descending
        assert!(ranked[0].score >= ranked[1].score);
        assert!(ranked[1].score >= ranked[2].score);
    }

    #[test]
    fn test_self_loops_and_unknown_destinations_are_ignored() {
        let a = "gemini://a.example/";
        let candidates = vec![candidate(a, 1.0, &[a, "gemini://unknown.example/"])];

        let ranked = rank_pages(&candidates, &[], RankingMode::Authority);
        assert_eq!(ranked.len(), 1);
        assert_eq!(ranked[0].url, a);
    }

    #[test]
    fn test_malformed_link_json_is_skipped() {
        let a = "gemini://a.example/";
        let mut row = candidate(a, 1.0, &[]);
        row.cross_site_links = Some("{not json".to_string());

        let ranked = rank_pages(&[row], &[], RankingMode::Authority);
        assert_eq!(ranked.len(), 1);
    }

    #[test]
    fn test_first_appearance_wins_for_metadata() {
        let a = "gemini://a.example/";
        let candidates = vec![candidate(a, 2.0, &[])];
        // The same page also shows up as a linking page with rank 0;
        // it must stay a root with its original rank.
        let inbound = vec![inbound_link(a, "gemini://elsewhere.example/")];

        let ranked = rank_pages(&candidates, &inbound, RankingMode::Authority);
        assert_eq!(ranked.len(), 1);
        assert_eq!(ranked[0].url, a);
    }

    #[test]
    fn test_strongly_linked_page_outranks_equal_text_rank() {
        // hub1..hub3 all point at "popular"; "lonely" has the same
        // lexical rank but no inbound links.
        let popular = "gemini://popular.example/";
        let lonely = "gemini://lonely.example/";
        let candidates = vec![
            candidate(popular, 1.0, &[]),
            candidate(lonely, 1.0, &[]),
            candidate("gemini://hub1.example/", 0.1, &[popular]),
            candidate("gemini://hub2.example/", 0.1, &[popular]),
            candidate("gemini://hub3.example/", 0.1, &[popular]),
        ];

        let ranked = rank_pages(&candidates, &[], RankingMode::Authority);
        let popular_score = ranked.iter().find(|r| r.url == popular).unwrap().score;
        let lonely_score = ranked.iter().find(|r| r.url == lonely).unwrap().score;
        assert!(popular_score > lonely_score);
    }
}
