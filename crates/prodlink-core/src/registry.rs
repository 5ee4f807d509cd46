//! Domain Registry: the single table of supported vendor families.
//!
//! Both the URL resolver and the field projector classify hosts through this
//! module, so a domain added here is recognized everywhere at once.

use std::sync::LazyLock;

use percent_encoding::percent_decode_str;
use regex::Regex;
use serde::{Deserialize, Serialize};
use url::Url;

/// A vendor whose product pages this crate knows how to resolve and project.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VendorFamily {
    #[serde(rename = "taobao")]
    Taobao,
    #[serde(rename = "tmall")]
    Tmall,
    #[serde(rename = "1688")]
    Alibaba1688,
}

/// How a host relates to its vendor family.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostKind {
    /// Desktop product-detail domain; a valid final resolution target.
    Canonical,
    /// Short-link or share domain that redirects to (or embeds) a product URL.
    Shortener,
    /// Mobile web domain; carries a product id but is not a final target.
    Mobile,
}

/// Immutable description of one vendor family.
#[derive(Debug)]
pub struct DomainFamily {
    pub family: VendorFamily,
    pub canonical_domains: &'static [&'static str],
    pub shortener_domains: &'static [&'static str],
    pub mobile_domains: &'static [&'static str],
    /// App deep-link schemes, e.g. `taobao://`.
    pub app_schemes: &'static [&'static str],
    /// Desktop product URL with an `{id}` placeholder.
    pub url_template: &'static str,
    id_patterns: &'static LazyLock<Vec<Regex>>,
}

static ITEM_ID_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    compile(&[
        r"[?&](?:id|itemId|item_id|itemid)=(\d{6,})",
        r"/i(\d{6,})\.htm",
        r"/item/(\d{6,})",
    ])
});

static OFFER_ID_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    compile(&[
        r"/offer/(\d{6,})\.html",
        r"[?&]offer[iI]d=(\d{6,})",
        r"offer\.id=(\d{6,})",
    ])
});

fn compile(patterns: &[&str]) -> Vec<Regex> {
    patterns
        .iter()
        .map(|p| Regex::new(p).expect("valid regex"))
        .collect()
}

static TAOBAO: DomainFamily = DomainFamily {
    family: VendorFamily::Taobao,
    canonical_domains: &["item.taobao.com"],
    shortener_domains: &[
        "e.tb.cn",
        "s.tb.cn",
        "m.tb.cn",
        "tb.cn",
        "s.click.taobao.com",
        "uland.taobao.com",
    ],
    mobile_domains: &[
        "m.taobao.com",
        "h5.m.taobao.com",
        "a.m.taobao.com",
        "main.m.taobao.com",
        "market.m.taobao.com",
        "m.intl.taobao.com",
    ],
    app_schemes: &["taobao", "tbopen"],
    url_template: "https://item.taobao.com/item.htm?id={id}",
    id_patterns: &ITEM_ID_PATTERNS,
};

static TMALL: DomainFamily = DomainFamily {
    family: VendorFamily::Tmall,
    canonical_domains: &["detail.tmall.com"],
    shortener_domains: &[],
    mobile_domains: &["detail.m.tmall.com", "m.tmall.com"],
    app_schemes: &["tmall"],
    url_template: "https://detail.tmall.com/item.htm?id={id}",
    id_patterns: &ITEM_ID_PATTERNS,
};

static ALIBABA_1688: DomainFamily = DomainFamily {
    family: VendorFamily::Alibaba1688,
    canonical_domains: &["detail.1688.com"],
    shortener_domains: &["qr.1688.com"],
    mobile_domains: &["m.1688.com", "detail.m.1688.com"],
    app_schemes: &["wireless1688"],
    url_template: "https://detail.1688.com/offer/{id}.html",
    id_patterns: &OFFER_ID_PATTERNS,
};

static FAMILIES: [&DomainFamily; 3] = [&TAOBAO, &TMALL, &ALIBABA_1688];

/// Every registered family, in declaration order.
#[must_use]
pub fn families() -> &'static [&'static DomainFamily] {
    &FAMILIES
}

impl VendorFamily {
    /// Stable family identifier used as `sourceType` in projected output.
    #[must_use]
    pub fn id(self) -> &'static str {
        match self {
            VendorFamily::Taobao => "taobao",
            VendorFamily::Tmall => "tmall",
            VendorFamily::Alibaba1688 => "1688",
        }
    }

    #[must_use]
    pub fn from_id(id: &str) -> Option<Self> {
        families()
            .iter()
            .map(|f| f.family)
            .find(|family| family.id() == id)
    }

    #[must_use]
    pub fn descriptor(self) -> &'static DomainFamily {
        match self {
            VendorFamily::Taobao => &TAOBAO,
            VendorFamily::Tmall => &TMALL,
            VendorFamily::Alibaba1688 => &ALIBABA_1688,
        }
    }

    /// Builds the canonical desktop product URL for `product_id`.
    #[must_use]
    pub fn product_url(self, product_id: &str) -> String {
        self.descriptor().url_template.replace("{id}", product_id)
    }
}

impl std::fmt::Display for VendorFamily {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.id())
    }
}

impl DomainFamily {
    /// Finds a product id in `text` using this family's patterns.
    ///
    /// The raw text is tried first, then its percent-decoded form, so ids
    /// nested inside encoded redirect parameters are found too.
    #[must_use]
    pub fn parse_product_id(&self, text: &str) -> Option<String> {
        let decoded = percent_decode_str(text).decode_utf8_lossy();
        let found = [text, decoded.as_ref()].into_iter().find_map(|candidate| {
            self.id_patterns
                .iter()
                .find_map(|re| re.captures(candidate))
                .and_then(|caps| caps.get(1))
                .map(|m| m.as_str().to_owned())
        });
        found
    }

    fn domains(&self) -> impl Iterator<Item = (&'static str, HostKind)> + '_ {
        self.canonical_domains
            .iter()
            .map(|d| (*d, HostKind::Canonical))
            .chain(self.shortener_domains.iter().map(|d| (*d, HostKind::Shortener)))
            .chain(self.mobile_domains.iter().map(|d| (*d, HostKind::Mobile)))
    }
}

fn host_matches(host: &str, domain: &str) -> bool {
    host == domain
        || host
            .strip_suffix(domain)
            .is_some_and(|prefix| prefix.ends_with('.'))
}

/// Classifies a bare host name against every family.
///
/// Matching is exact or by dot-suffix; when several registered domains match,
/// the longest (most specific) one decides.
#[must_use]
pub fn classify_host(host: &str) -> Option<(VendorFamily, HostKind)> {
    let host = host.trim().trim_end_matches('.').to_ascii_lowercase();
    if host.is_empty() {
        return None;
    }

    families()
        .iter()
        .flat_map(|family| family.domains().map(move |(d, kind)| (family.family, d, kind)))
        .filter(|(_, domain, _)| host_matches(&host, domain))
        .max_by_key(|(_, domain, _)| domain.len())
        .map(|(family, _, kind)| (family, kind))
}

/// Looks up the family owning an app deep-link scheme (`taobao`, `tmall`, ...).
#[must_use]
pub fn family_for_scheme(scheme: &str) -> Option<VendorFamily> {
    let scheme = scheme.to_ascii_lowercase();
    families()
        .iter()
        .find(|f| f.app_schemes.contains(&scheme.as_str()))
        .map(|f| f.family)
}

/// Classifies a full URL string.
///
/// Returns `None` when the string does not parse or its host belongs to no
/// registered family. Non-HTTP schemes are classified by host only; callers
/// that need a final target must use [`is_canonical_url`].
#[must_use]
pub fn classify_url(url: &str) -> Option<(VendorFamily, HostKind)> {
    let parsed = Url::parse(url.trim()).ok()?;
    parsed.host_str().and_then(classify_host)
}

/// Returns `true` when `url` is an http(s) URL on a canonical product domain.
#[must_use]
pub fn is_canonical_url(url: &str) -> bool {
    Url::parse(url.trim()).is_ok_and(|parsed| {
        matches!(parsed.scheme(), "http" | "https")
            && parsed
                .host_str()
                .and_then(classify_host)
                .is_some_and(|(_, kind)| kind == HostKind::Canonical)
    })
}

/// Re-derives the vendor family from a URL: host first, then app scheme.
#[must_use]
pub fn family_for_url(url: &str) -> Option<VendorFamily> {
    let parsed = Url::parse(url.trim()).ok()?;
    parsed
        .host_str()
        .and_then(classify_host)
        .map(|(family, _)| family)
        .or_else(|| family_for_scheme(parsed.scheme()))
}

/// Extracts the product id from a URL belonging to a registered family.
///
/// Tries the `id` query parameter first, then the family's path patterns.
#[must_use]
pub fn extract_product_id(url: &str) -> Option<String> {
    let family = family_for_url(url)?;
    let from_query = Url::parse(url.trim()).ok().and_then(|parsed| {
        parsed
            .query_pairs()
            .find(|(k, v)| k == "id" && !v.is_empty() && v.bytes().all(|b| b.is_ascii_digit()))
            .map(|(_, v)| v.into_owned())
    });
    from_query.or_else(|| family.descriptor().parse_product_id(url))
}

#[cfg(test)]
#[path = "registry_test.rs"]
mod tests;
