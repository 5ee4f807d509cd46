//! Recovers a product link from the body of a short-link landing page.
//!
//! Some share gateways answer with a 200 page that embeds the target URL in
//! markup or script instead of redirecting.

use std::sync::LazyLock;

use percent_encoding::percent_decode_str;
use prodlink_core::{extract_product_id, families, is_canonical_url, VendorFamily};
use regex::Regex;

/// Links shorter than this are fragments, not product URLs.
const MIN_LINK_LEN: usize = 21;

/// Quoted links to a canonical domain, most explicit context first:
/// `href="…"`, then `url="…"`, then any quoted string.
static LINK_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    let prefixes = [r#"href=["']"#, r#"url=["']"#, r#"["']"#];
    prefixes
        .iter()
        .flat_map(|prefix| {
            families()
                .iter()
                .flat_map(|family| family.canonical_domains.iter())
                .map(move |domain| {
                    Regex::new(&format!(
                        r#"(?i){prefix}([^"']*{}[^"']*)["']"#,
                        regex::escape(domain)
                    ))
                    .expect("valid regex")
                })
        })
        .collect()
});

static ID_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r#"(?i)itemId["']?\s*:\s*["']?(\d{6,})"#,
        r#"(?i)item_id["']?\s*:\s*["']?(\d{6,})"#,
        r#"(?i)\bid["']?\s*:\s*["']?(\d{9,13})\b"#,
        r#"(?i)productId["']?\s*:\s*["']?(\d{6,})"#,
        r"(?i)offerId=(\d{6,})",
        r"(?i)offer\.id=(\d{6,})",
        r"(?i)offer/(\d{6,})\.html",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("valid regex"))
    .collect()
});

/// Scans `body` for an embedded canonical product link, then for a bare
/// product id. Ids are turned into URLs with `family`'s template.
pub(crate) fn find_product_url(body: &str, family: VendorFamily) -> Option<String> {
    find_embedded_link(body).or_else(|| {
        find_product_id(body).map(|id| {
            tracing::debug!(family = %family, product_id = %id, "product id found in page body");
            family.product_url(&id)
        })
    })
}

fn find_embedded_link(body: &str) -> Option<String> {
    LINK_PATTERNS.iter().find_map(|re| {
        re.captures_iter(body)
            .filter_map(|caps| caps.get(1))
            .map(|m| clean_link(m.as_str()))
            .find(|link| {
                link.len() >= MIN_LINK_LEN
                    && is_canonical_url(link)
                    && extract_product_id(link).is_some()
            })
    })
}

fn find_product_id(body: &str) -> Option<String> {
    ID_PATTERNS.iter().find_map(|re| {
        re.captures(body)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().to_owned())
    })
}

/// Undoes JSON, HTML, and percent escaping and completes protocol-relative
/// or scheme-less links.
fn clean_link(raw: &str) -> String {
    let mut unescaped = raw.trim().replace("\\/", "/").replace("&amp;", "&");
    if unescaped.contains("%3A") || unescaped.contains("%2F") || unescaped.contains("%3a") {
        unescaped = percent_decode_str(&unescaped).decode_utf8_lossy().into_owned();
    }
    // A tracking wrapper carries the product URL in its query; keep the
    // innermost one.
    let innermost = [unescaped.rfind("https://"), unescaped.rfind("http://")]
        .into_iter()
        .flatten()
        .max();
    if let Some(start) = innermost.filter(|start| *start > 0) {
        unescaped = unescaped[start..].to_owned();
    }
    if unescaped.starts_with("//") {
        format!("https:{unescaped}")
    } else if unescaped.contains("://") {
        unescaped
    } else {
        format!("https://{unescaped}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finds_href_link() {
        let body = r#"<a class="go" href="https://detail.tmall.com/item.htm?id=777166626275&amp;spm=a1">open</a>"#;
        assert_eq!(
            find_product_url(body, VendorFamily::Taobao).as_deref(),
            Some("https://detail.tmall.com/item.htm?id=777166626275&spm=a1")
        );
    }

    #[test]
    fn unescapes_json_embedded_link() {
        let body = r#"var cfg = {"target":"https:\/\/item.taobao.com\/item.htm?id=612345678901"};"#;
        assert_eq!(
            find_product_url(body, VendorFamily::Taobao).as_deref(),
            Some("https://item.taobao.com/item.htm?id=612345678901")
        );
    }

    #[test]
    fn completes_protocol_relative_link() {
        let body = r#"<meta http-equiv="refresh" content="0" url='//item.taobao.com/item.htm?id=612345678901'>"#;
        assert_eq!(
            find_product_url(body, VendorFamily::Taobao).as_deref(),
            Some("https://item.taobao.com/item.htm?id=612345678901")
        );
    }

    #[test]
    fn decodes_percent_encoded_target() {
        let body = r#"<a href="https://s.click.taobao.com/t?url=https%3A%2F%2Fdetail.tmall.com%2Fitem.htm%3Fid%3D612345678901">go</a>"#;
        assert_eq!(
            find_product_url(body, VendorFamily::Tmall).as_deref(),
            Some("https://detail.tmall.com/item.htm?id=612345678901")
        );
    }

    #[test]
    fn accepts_offer_path_link() {
        let body = r#"<a href="https://detail.1688.com/offer/953742824238.html?spm=x">offer</a>"#;
        assert_eq!(
            find_product_url(body, VendorFamily::Alibaba1688).as_deref(),
            Some("https://detail.1688.com/offer/953742824238.html?spm=x")
        );
    }

    #[test]
    fn ignores_links_without_id_marker() {
        let body = r#"<a href="https://item.taobao.com/">home</a>"#;
        assert!(find_product_url(body, VendorFamily::Taobao).is_none());
    }

    #[test]
    fn falls_back_to_item_id_key() {
        let body = r#"<script>var data = {"itemId": "665544332211", "shop": 1};</script>"#;
        assert_eq!(
            find_product_url(body, VendorFamily::Taobao).as_deref(),
            Some("https://item.taobao.com/item.htm?id=665544332211")
        );
    }

    #[test]
    fn offer_path_uses_1688_template() {
        let body = r#"<script>location.replace("/m/offer/953742824238.html")</script>"#;
        assert_eq!(
            find_product_url(body, VendorFamily::Alibaba1688).as_deref(),
            Some("https://detail.1688.com/offer/953742824238.html")
        );
    }

    #[test]
    fn generic_id_requires_nine_to_thirteen_digits() {
        assert!(find_product_url(r#"{"id": 12345}"#, VendorFamily::Taobao).is_none());
        assert_eq!(
            find_product_url(r#"{"id": 123456789012}"#, VendorFamily::Taobao).as_deref(),
            Some("https://item.taobao.com/item.htm?id=123456789012")
        );
    }
}
