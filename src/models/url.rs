// SPDX-License-Identifier: BSD-3-Clause
// Copyright (c) 2026 Aleksandr Ptakhin

use std::fmt;
use url::Url;

/// Normalized Gemini URL.
///
/// Wraps `url::Url` and pins down the comparisons the search pipeline
/// relies on: hosts are ASCII-lowercased (the WHATWG parser leaves
/// non-special-scheme hosts opaque, so case is folded here), paths keep
/// their case, and `as_str()` re-parses to the identical string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GemUrl {
    inner: Url,
}

impl GemUrl {
    /// Parse an absolute URL. Returns `None` for anything without a host.
    pub fn parse(input: &str) -> Option<Self> {
        let mut parsed = Url::parse(input).ok()?;
        let host = parsed.host_str()?.to_string();
        let lowered = host.to_ascii_lowercase();
        if lowered != host {
            parsed.set_host(Some(&lowered)).ok()?;
        }
        Some(Self { inner: parsed })
    }

    /// Parse user input, retrying with a `gemini://` prefix when the
    /// input lacks a scheme (`example.com/foo` style).
    pub fn parse_lenient(input: &str) -> Option<Self> {
        Self::parse(input).or_else(|| Self::parse(&format!("gemini://{input}")))
    }

    pub fn scheme(&self) -> &str {
        self.inner.scheme()
    }

    /// Lowercased host. IPv6 literals keep their brackets.
    pub fn host(&self) -> &str {
        self.inner.host_str().unwrap_or("")
    }

    pub fn port(&self) -> Option<u16> {
        self.inner.port()
    }

    /// Path component, with its leading `/` when present. Case-sensitive.
    pub fn path(&self) -> &str {
        self.inner.path()
    }

    pub fn query(&self) -> Option<&str> {
        self.inner.query()
    }

    /// Normalized string form. Re-parsing this yields the same value.
    pub fn as_str(&self) -> &str {
        self.inner.as_str()
    }
}

impl fmt::Display for GemUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_basic() {
        let url = GemUrl::parse("gemini://example.com/foo/bar").unwrap();
        assert_eq!(url.scheme(), "gemini");
        assert_eq!(url.host(), "example.com");
        assert_eq!(url.path(), "/foo/bar");
        assert_eq!(url.port(), None);
    }

    #[test]
    fn test_host_is_lowercased() {
        let url = GemUrl::parse("gemini://Example.COM/Foo").unwrap();
        assert_eq!(url.host(), "example.com");
        // Path case is preserved
        assert_eq!(url.path(), "/Foo");
    }

    #[test]
    fn test_ipv6_host_keeps_brackets() {
        let url = GemUrl::parse("gemini://[::1]/").unwrap();
        assert_eq!(url.host(), "[::1]");
    }

    #[test]
    fn test_explicit_port() {
        let url = GemUrl::parse("gemini://capsule.town:1966/feed").unwrap();
        assert_eq!(url.port(), Some(1966));
    }

    #[test]
    fn test_roundtrip_is_stable() {
        let first = GemUrl::parse("gemini://Example.Com/Some/Path?q=1").unwrap();
        let second = GemUrl::parse(first.as_str()).unwrap();
        assert_eq!(first.as_str(), second.as_str());
    }

    #[test]
    fn test_rejects_relative() {
        assert!(GemUrl::parse("example.com/foo").is_none());
        assert!(GemUrl::parse("/just/a/path").is_none());
    }

    #[test]
    fn test_parse_lenient_prepends_scheme() {
        let url = GemUrl::parse_lenient("example.com/foo").unwrap();
        assert_eq!(url.as_str(), "gemini://example.com/foo");
        // Already-absolute input is untouched
        let url = GemUrl::parse_lenient("gemini://example.com/foo").unwrap();
        assert_eq!(url.as_str(), "gemini://example.com/foo");
    }
}
