// SPDX-License-Identifier: BSD-3-Clause
// Copyright (c) 2026 Aleksandr Ptakhin

//! robots.txt rules as the crawler consumes them.
//!
//! Gemini capsules publish the same line format as the web, plus
//! virtual agents like `indexer`. The parser collects `Disallow` paths
//! for the agents we answer to; matching is plain path-prefix matching
//! on `/` boundaries.

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::BTreeSet;

static LINE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(.*):[ \t](.*)$").unwrap());

/// Collect the disallowed paths that apply to any of `agents`.
///
/// Consecutive `User-agent` lines accumulate into one group. An empty
/// `Disallow` value resets everything collected so far. The result is
/// deduplicated and sorted.
pub fn parse_robots_txt(content: &str, agents: &[&str]) -> Vec<String> {
    let mut disallowed: BTreeSet<String> = BTreeSet::new();
    let mut care = false;
    let mut last_line_user_agent = false;

    for line in content.lines() {
        let Some(captures) = LINE_RE.captures(line) else {
            continue;
        };

        let key = &captures[1];
        let value = &captures[2];

        if key == "User-agent" {
            let matched = agents.contains(&value);
            if last_line_user_agent {
                care |= matched;
            } else {
                care = matched;
            }
            last_line_user_agent = true;
        } else {
            last_line_user_agent = false;
        }

        if key == "Disallow" && care {
            if value.is_empty() {
                disallowed.clear();
            } else {
                disallowed.insert(value.to_string());
            }
        }
    }

    disallowed.into_iter().collect()
}

/// True when `path` falls under any disallowed rule. A rule blocks its
/// exact path, the path plus a trailing slash, and true sub-paths:
/// `/foo` blocks `/foo/bar` but not `/foobar`.
pub fn is_path_blocked(path: &str, disallowed_paths: &[String]) -> bool {
    disallowed_paths.iter().any(|rule| {
        if path == rule || path == format!("{rule}/") {
            return true;
        }
        path.len() > rule.len() + 1
            && path.starts_with(rule.as_str())
            && (path.as_bytes()[rule.len()] == b'/' || rule.ends_with('/'))
    })
}
