// SPDX-License-Identifier: BSD-3-Clause
// Copyright (c) 2026 Aleksandr Ptakhin

//! URL admission filter for the crawler.
//!
//! `blocked` runs on every candidate link, so everything here is a pure
//! predicate over the URL string backed by statically compiled lists:
//! an exact-host set, a sorted URL-prefix list answered by binary
//! search, and a handful of structural rules for loopback hosts, git
//! repositories, onion services and corrupt links.

use crate::models::url::GemUrl;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;

/// Hosts that are never crawled: placeholder domains, loopback names
/// and capsules that are known to be gone or hostile to crawling.
static BLOCKED_HOSTS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    HashSet::from([
        // placeholder domains
        "example.com",
        "example.org",
        "example.net",
        "example.io",
        "example.us",
        "example.eu",
        "example.gov",
        "example.space",
        // loopback names; 127.0.0.x is a structural rule below
        "localhost",
        "[::1]",
        // capsules that went away for good
        "gus.guru",
        "ftrv.se",
        "gmi.bacardi55.io",
        "clemat.is",
        "nanako.mooo.com",
        "gluonspace.com",
        "lord.re",
        "thurk.org",
        "git.thebackupbox.net",
        "mikelynch.org",
        "going-flying.com",
        "gemini.rmf-dev.com",
    ])
});

/// Known-problematic URL prefixes: infinite CGI spaces, proxies,
/// mirrors and other content that poisons the index. Kept sorted so
/// membership is a binary search.
static BLOCKED_PREFIXES: Lazy<Vec<&'static str>> = Lazy::new(|| {
    let mut prefixes = vec![
        "gemini://www.youtube.com/",
        // every tictactoe board state is its own page
        "gemini://tictactoe.lanterne.chilliet.eu",
        // huge files on a very slow capsule
        "gemini://kamalatta.ddnss.de/",
        "gemini://tweek.zyxxyz.eu/valentina/",
        // ASCII art at emulated modem speed
        "gemini://ansi.hrtk.in/",
        "gemini://matrix.kiwifarms.net",
        // song-per-page generators
        "gemini://songs.zachdecook.com/song.gmi.php/",
        "gemini://songs.zachdecook.com/chord.svg/",
        "gemini://gemini.zachdecook.com/cgi-bin/ccel.sh",
        // gemcast audio
        "gemini://kwiecien.us/gemcast/",
        // recursion blows the crawl stack
        "gemini://cadence.moe/chapo/",
        "gemini://nixo.xyz/reply/",
        "gemini://nixo.xyz/notify",
        "gemini://gemini.thebackupbox.net/queryresponse",
        "gemini://gem.garichankar.com/share_audio",
        // Mastodon mirrors
        "gemini://vps01.rdelaage.ovh/",
        "gemini://mastogem.picasoft.net",
        // broken resources
        "gemini://runjimmyrunrunyoufuckerrun.com/fonts/",
        "gemini://runjimmyrunrunyoufuckerrun.com/tmp/",
        // other search engines
        "gemini://houston.coder.town/search?",
        "gemini://houston.coder.town/search/",
        "gemini://marginalia.nu/search",
        // Geddit
        "gemini://geddit.pitr.ca/post?",
        "gemini://geddit.pitr.ca/c/",
        "gemini://geddit.glv.one/post?",
        "gemini://geddit.glv.one/c/",
        // calculators
        "gemini://gemini.marmaladefoo.com/cgi-bin/calc.cgi?",
        "gemini://gemini.circumlunar.space/users/fgaz/calculator/",
        // per-query weather pages
        "gemini://acidic.website/cgi-bin/weather.tcl?",
        "gemini://caolan.uk/weather/",
        // dynamic wiki endpoints
        "gemini://alexschroeder.ch/image_external",
        "gemini://alexschroeder.ch/html/",
        "gemini://alexschroeder.ch/diff/",
        "gemini://alexschroeder.ch/history/",
        "gemini://alexschroeder.ch/http",
        "gemini://alexschroeder.ch/https",
        "gemini://alexschroeder.ch/tag/",
        "gemini://alexschroeder.ch/raw/",
        "gemini://alexschroeder.ch/map/",
        "gemini://alexschroeder.ch/do/comment",
        "gemini://alexschroeder.ch/do/rc",
        "gemini://alexschroeder.ch/do/rss",
        "gemini://alexschroeder.ch/do/new",
        "gemini://alexschroeder.ch/do/more",
        "gemini://alexschroeder.ch/do/tags",
        "gemini://alexschroeder.ch/do/match",
        "gemini://alexschroeder.ch/do/search",
        "gemini://alexschroeder.ch/do/gallery/",
        // mailing list scrapers
        "gemini://mozz.us/files/gemini-links.gmi",
        "gemini://gem.benscraft.info/mailing-list",
        "gemini://rawtext.club/~sloum/geminilist",
        "gemini://gemini.techrights.org/",
        // youtube mirrors
        "gemini://pon.ix.tc/cgi-bin/youtube.cgi?",
        "gemini://pon.ix.tc/youtube/",
        // news mirrors
        "gemini://taz.de/",
        "gemini://simplynews.metalune.xyz",
        "gemini://illegaldrugs.net/cgi-bin/news.php?",
        "gemini://illegaldrugs.net/cgi-bin/reader",
        "gemini://rawtext.club/~sloum/geminews",
        "gemini://gemini.cabestan.tk/hn",
        "gemini://hn.filiuspatris.net/",
        "gemini://schmittstefan.de/de/nachrichten/",
        "gemini://gmi.noulin.net/mobile",
        "gemini://jpfox.fr/rss/",
        "gemini://illegaldrugs.net/cgi-bin/news.php/",
        "gemini://dw.schettler.net/",
        "gemini://dioskouroi.xyz/top",
        "gemini://drewdevault.com/cgi-bin/hn.py",
        "gemini://tobykurien.com/maverick/",
        // wikipedia proxies
        "gemini://wp.pitr.ca/",
        "gemini://wp.glv.one/",
        "gemini://wikipedia.geminet.org/",
        "gemini://wikipedia.geminet.org:1966",
        "gemini://vault.transjovian.org/",
        // client torture tests
        "gemini://egsam.pitr.ca/",
        "gemini://egsam.glv.one/",
        "gemini://gemini.conman.org/test",
        // chat streams
        "gemini://chat.mozz.us/stream",
        "gemini://chat.mozz.us/submit",
        // gopher proxy
        "gemini://80h.dev/agena/",
        // astrobotany
        "gemini://astrobotany.mozz.us/",
        "gemini://carboncopy.xyz/cgi-bin/apache.gex/",
        // susa.net CGI
        "gemini://gemini.susa.net/cgi-bin/search?",
        "gemini://gemini.susa.net/cgi-bin/twitter?",
        "gemini://gemini.susa.net/cgi-bin/vim-search?",
        "gemini://gemini.susa.net/cgi-bin/links_stu.lua?",
        "gemini://gemini.spam.works/textfiles/",
        "gemini://gemini.spam.works/mirrors/textfiles/",
        "gemini://gemini.spam.works/users/dvn/archive/",
        // radio streams that never end
        "gemini://gemini.thebackupbox.net/radio",
        "gemini://higeki.jp/radio",
        // full web proxies
        "gemini://drewdevault.com/cgi-bin/web.sh?",
        "gemini://gemiprox.pollux.casa/",
        "gemini://gemiprox.pollux.casa:1966",
        "gemini://ecs.d2evs.net/proxy/",
        "gemini://gmi.si3t.ch/www-gem/",
        "gemini://orrg.clttr.info/orrg.pl",
        // cryptocurrency dump, too big to crawl
        "gemini://gem.denarii.cloud/",
        // documentation mirrors
        "gemini://cfdocs.wetterberg.nu/",
        "gemini://godocs.io",
        "gemini://emacswiki.org/",
        // capsule owner asked not to be crawled
        "gemini://alexschroeder.ch/",
        // code, RFC and man-page mirrors
        "gemini://si3t.ch/code/",
        "gemini://tilde.club/~filip/library/",
        "gemini://gemini.bortzmeyer.org/rfc-mirror/",
        "gemini://chris.vittal.dev/rfcs",
        "gemini://going-flying.com/git/cgi/gemini.git/",
        "gemini://szczezuja.flounder.online/git/",
        "gemini://gmi.noulin.net/rfc",
        "gemini://gmi.noulin.net/man",
        "gemini://hellomouse.net/user-pages/handicraftsman/ietf/",
        "gemini://tilde.team/~orichalcumcosmonaut/darcs/website/prod/",
        "gemini://gemini.omarpolo.com/cgi",
        // mail and message archives
        "gemini://gemini.lost-frequencies.eu/posts/archive",
        "gemini://blitter.com/",
        "gemini://ake.crabdance.com:1966/message/",
        "gemini://iceworks.cc/z/",
        "gemini://ake.crabdance.com:1966/channel/",
        "gemini://gemini.autonomy.earth/posts/",
        "gemini://warmedal.se/~antenna",
        "gemini://gemini.rob-bolton.co.uk/songs",
        // text adventures
        "gemini://gthudson.xyz/cgi-bin/quietplace.cgi",
        "gemini://futagoza.gamiri.com/gmninkle/",
        "gemini://alexey.shpakovsky.ru/maze",
        // hangs the crawl without tripping the timeout
        "gemini://202x.moe/resonance",
    ];
    prefixes.sort_unstable();
    prefixes
});

static COMMIT_PATH_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"commits/[0-9a-zA-Z]+/").unwrap());

/// Longest-common-prefix binary search over the sorted prefix list.
///
/// The candidate at the partition point may share only part of its text
/// with `url`; in that case any matching prefix must also prefix their
/// common part, so the search re-runs on that shorter bound until it
/// either hits a match or runs out of candidates.
fn has_blocked_prefix(url: &str) -> bool {
    let prefixes = &*BLOCKED_PREFIXES;
    let mut bound: &str = url;
    let mut hi = prefixes.partition_point(|p| *p <= bound);
    while hi > 0 {
        let candidate = prefixes[hi - 1];
        if url.starts_with(candidate) {
            return true;
        }
        let common = url
            .bytes()
            .zip(candidate.bytes())
            .take_while(|(a, b)| a == b)
            .count();
        if common == 0 {
            return false;
        }
        bound = &url[..common];
        hi = prefixes[..hi - 1].partition_point(|p| *p <= bound);
    }
    false
}

/// Decide whether the crawler may fetch `url_str`.
///
/// Pure over the input: the same string always yields the same answer.
/// Unparseable URLs are blocked, since they cannot be fetched anyway.
pub fn blocked(url_str: &str) -> bool {
    // Control characters mean a corrupt link. Checked on the raw input
    // because normalization would escape them.
    if url_str.bytes().any(|b| b < 0x1a) {
        return true;
    }

    let Some(url) = GemUrl::parse(url_str) else {
        return true;
    };

    if BLOCKED_HOSTS.contains(url.host()) {
        return true;
    }
    if has_blocked_prefix(url.as_str()) {
        return true;
    }

    // Files the crawler fetches through separate channels
    if url.path() == "/robots.txt" || url.path() == "/favicon.txt" {
        return true;
    }
    // The entire loopback /24
    if url.host().starts_with("127.0.0.") {
        return true;
    }

    // Git repository browsers
    if url.path().starts_with("/git/") || url.host().starts_with("git.") {
        return true;
    }
    if url.as_str().contains(".git/tree/") || url.as_str().contains(".git/blob/") {
        return true;
    }

    // No way to reach hidden services
    if url.host().ends_with(".onion") {
        return true;
    }

    // Telltale sign of a misconfigured gopher proxy
    if url.as_str().contains("gopher:/:/") {
        return true;
    }

    // Deep links into individual commits
    if url.as_str().contains("commits/") && COMMIT_PATH_RE.is_match(url.as_str()) {
        return true;
    }

    false
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blocked_host() {
        assert!(blocked("gemini://example.com/foo"));
        assert!(blocked("gemini://localhost/"));
        assert!(blocked("gemini://[::1]/page"));
        // Host must match exactly, not as a suffix
        assert!(!blocked("gemini://example.com.evilmirror.net/"));
    }

    #[test]
    fn test_loopback_subnet() {
        assert!(blocked("gemini://127.0.0.5/x"));
        assert!(blocked("gemini://127.0.0.1/"));
        assert!(!blocked("gemini://127.1.0.1/"));
    }

    #[test]
    fn test_blocked_prefix() {
        assert!(blocked("gemini://taz.de/article/123"));
        assert!(blocked("gemini://wp.pitr.ca/wiki/Gemini"));
        assert!(blocked("gemini://gemiprox.pollux.casa:1966/some/page"));
        assert!(!blocked("gemini://wp.example.dev/wiki/Gemini"));
    }

    #[test]
    fn test_prefix_match_backtracks_over_longer_neighbors() {
        // alexschroeder.ch has both "/do/..." entries and the bare host
        // entry; a path between them lexicographically must still match
        // the shorter prefix.
        assert!(blocked("gemini://alexschroeder.ch/do/nonexistent"));
        assert!(blocked("gemini://alexschroeder.ch/zzz"));
    }

    #[test]
    fn test_git_rules() {
        assert!(blocked("gemini://host/git/project"));
        assert!(blocked("gemini://git.example.dev/"));
        assert!(blocked("gemini://host/path/.git/tree/main"));
        assert!(blocked("gemini://host/path/.git/blob/main/src"));
        assert!(!blocked("gemini://host/gitea-article"));
    }

    #[test]
    fn test_special_files() {
        assert!(blocked("gemini://host/robots.txt"));
        assert!(blocked("gemini://host/favicon.txt"));
        assert!(!blocked("gemini://host/robots.txt.html"));
    }

    #[test]
    fn test_onion_and_gopher() {
        assert!(blocked("gemini://abcdef.onion/"));
        assert!(blocked("gemini://proxy.host/gopher:/:/example"));
    }

    #[test]
    fn test_control_characters() {
        assert!(blocked("gemini://host/page\x05"));
        assert!(blocked("gemini://host/\x01"));
        assert!(!blocked("gemini://host/page"));
    }

    #[test]
    fn test_commit_deep_links() {
        assert!(blocked("gemini://host/repo/commits/a1b2c3/diff"));
        assert!(blocked("gemini://host/commits/HEAD/"));
        assert!(!blocked("gemini://host/commits/"));
        assert!(!blocked("gemini://host/commitment"));
    }

    #[test]
    fn test_unparseable_is_blocked() {
        assert!(blocked("not a url"));
        assert!(blocked(""));
    }

    #[test]
    fn test_blocked_is_deterministic() {
        for url in [
            "gemini://example.com/foo",
            "gemini://good.capsule/page",
            "gemini://host/path/.git/tree/main",
        ] {
            assert_eq!(blocked(url), blocked(url));
        }
    }
}
