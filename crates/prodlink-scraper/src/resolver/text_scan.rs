//! Pulls the most useful product link out of free-form share text.

use std::sync::LazyLock;

use prodlink_core::{classify_host, family_for_scheme, HostKind};
use regex::Regex;
use reqwest::Url;

/// A host-shaped token, optionally prefixed by a scheme, followed by an
/// RFC 3986 path/query tail. The tail stops at quotes, angle brackets,
/// whitespace and any non-ASCII character, so CJK text glued to a link is
/// left behind.
static URL_TOKEN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)(?:[a-z][a-z0-9+.-]*://)?[a-z0-9](?:[a-z0-9-]*[a-z0-9])?(?:\.[a-z0-9](?:[a-z0-9-]*[a-z0-9])?)+(?::\d{1,5})?(?:[/?#][A-Za-z0-9\-._~:/?#\[\]@!$&()*+,;=%]*)?",
    )
    .expect("valid regex")
});

const TRAILING_JUNK: &[char] = &['.', ',', ';', ':', '!', '?', ')', ']', '}', '\'', '"'];

/// Candidate ranks, lowest wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Rank {
    ShortOrMobile,
    Canonical,
    Generic,
}

/// Returns `true` when `input` is one `http(s)` or app-scheme URL with no
/// surrounding text.
///
/// The input must open with `scheme://`, so a label glued to a link
/// (`Link:https://…`) goes through the text scan instead.
pub(crate) fn is_single_url(input: &str) -> bool {
    if input.chars().any(char::is_whitespace) {
        return false;
    }
    let Ok(parsed) = Url::parse(input) else {
        return false;
    };
    let scheme = parsed.scheme();
    let known = matches!(scheme, "http" | "https") || family_for_scheme(scheme).is_some();
    known
        && input
            .get(scheme.len()..)
            .is_some_and(|rest| rest.starts_with("://"))
}

/// Finds the best link in `text`.
///
/// Shortener, mobile and deep-link matches beat canonical product links,
/// which beat any other `http(s)` URL. Within a rank the earliest match wins.
/// Scheme-less vendor domains get `https://` prepended; scheme-less unknown
/// hosts are ignored.
pub(crate) fn find_candidate(text: &str) -> Option<String> {
    URL_TOKEN
        .find_iter(text)
        .filter_map(|m| rank_token(m.as_str()))
        .min_by_key(|(rank, _)| *rank)
        .map(|(_, url)| url)
}

fn rank_token(raw: &str) -> Option<(Rank, String)> {
    let token = raw.trim_end_matches(TRAILING_JUNK);
    if token.is_empty() {
        return None;
    }

    let has_scheme = token.contains("://");
    let candidate = if has_scheme {
        token.to_owned()
    } else {
        format!("https://{token}")
    };
    let parsed = Url::parse(&candidate).ok()?;
    let scheme = parsed.scheme().to_ascii_lowercase();
    let is_http = matches!(scheme.as_str(), "http" | "https");

    if !is_http {
        return family_for_scheme(&scheme).map(|_| (Rank::ShortOrMobile, candidate));
    }

    match parsed.host_str().and_then(classify_host) {
        Some((_, HostKind::Shortener | HostKind::Mobile)) => {
            Some((Rank::ShortOrMobile, candidate))
        }
        Some((_, HostKind::Canonical)) => Some((Rank::Canonical, candidate)),
        None if has_scheme => Some((Rank::Generic, candidate)),
        None => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_url_detection() {
        assert!(is_single_url("https://e.tb.cn/h.abc123?tk=xyz"));
        assert!(is_single_url("taobao://item.taobao.com/item.htm?id=123456789"));
        assert!(!is_single_url("e.tb.cn/h.abc123"));
        assert!(!is_single_url("look https://e.tb.cn/h.abc123"));
        assert!(!is_single_url("note:this"));
    }

    #[test]
    fn labelled_link_is_not_a_single_url() {
        assert!(!is_single_url("Link:https://item.taobao.com/item.htm?id=123456789"));
        assert!(!is_single_url("Taobao:https://item.taobao.com/item.htm?id=123456789"));
        assert!(!is_single_url("ftp://item.taobao.com/item.htm?id=123456789"));
        assert_eq!(
            find_candidate("Link:https://item.taobao.com/item.htm?id=123456789").as_deref(),
            Some("https://item.taobao.com/item.htm?id=123456789")
        );
    }

    #[test]
    fn finds_canonical_link_in_sentence() {
        assert_eq!(
            find_candidate("Check this https://detail.1688.com/offer/953742824238.html out")
                .as_deref(),
            Some("https://detail.1688.com/offer/953742824238.html")
        );
    }

    #[test]
    fn shortener_outranks_canonical_and_generic() {
        let text = "see https://example.com/a then https://item.taobao.com/item.htm?id=123456789 or e.tb.cn/h.Zx9";
        assert_eq!(find_candidate(text).as_deref(), Some("https://e.tb.cn/h.Zx9"));
    }

    #[test]
    fn stops_at_cjk_text_and_trims_punctuation() {
        let text = "【淘宝】https://e.tb.cn/h.SVYesMz1CWCGef8?tk=gGCY4DMdCiV「复制本条消息」";
        assert_eq!(
            find_candidate(text).as_deref(),
            Some("https://e.tb.cn/h.SVYesMz1CWCGef8?tk=gGCY4DMdCiV")
        );
        assert_eq!(
            find_candidate("(https://item.taobao.com/item.htm?id=123456789).").as_deref(),
            Some("https://item.taobao.com/item.htm?id=123456789")
        );
    }

    #[test]
    fn stops_at_quotes() {
        assert_eq!(
            find_candidate(r#"link="https://m.tb.cn/h.abc" end"#).as_deref(),
            Some("https://m.tb.cn/h.abc")
        );
    }

    #[test]
    fn generic_url_used_when_nothing_vendor_specific() {
        assert_eq!(
            find_candidate("go to https://example.com/x now").as_deref(),
            Some("https://example.com/x")
        );
    }

    #[test]
    fn scheme_less_unknown_hosts_are_not_candidates() {
        assert!(find_candidate("version 3.5 of example.com is out").is_none());
        assert!(find_candidate("no links here").is_none());
    }

    #[test]
    fn deep_link_is_a_candidate() {
        assert_eq!(
            find_candidate("open tmall://page.tm/itemDetail?id=600000000001 in app").as_deref(),
            Some("tmall://page.tm/itemDetail?id=600000000001")
        );
    }
}
