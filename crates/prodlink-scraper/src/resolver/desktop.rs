//! Rewrites app deep links and mobile product pages to desktop URLs.

use prodlink_core::{classify_host, family_for_scheme, HostKind, ResolutionMethod, VendorFamily};
use reqwest::Url;

/// A URL that must be rewritten before it can be a final target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Rewritable {
    DeepLink(VendorFamily),
    Mobile(VendorFamily),
}

impl Rewritable {
    pub(crate) fn method(self) -> ResolutionMethod {
        match self {
            Rewritable::DeepLink(_) => ResolutionMethod::DeepLinkConverted,
            Rewritable::Mobile(_) => ResolutionMethod::MobileToDesktopConverted,
        }
    }

    fn family(self) -> VendorFamily {
        match self {
            Rewritable::DeepLink(family) | Rewritable::Mobile(family) => family,
        }
    }
}

/// Classifies `url` as a deep link (registered app scheme) or a mobile page.
///
/// For deep links the host's family wins over the scheme's, so
/// `taobao://detail.tmall.com/...` is a Tmall link.
pub(crate) fn classify(url: &str) -> Option<Rewritable> {
    let parsed = Url::parse(url.trim()).ok()?;
    let host = parsed.host_str().and_then(classify_host);
    match parsed.scheme() {
        "http" | "https" => match host {
            Some((family, HostKind::Mobile)) => Some(Rewritable::Mobile(family)),
            _ => None,
        },
        scheme => {
            let scheme_family = family_for_scheme(scheme)?;
            let family = host.map_or(scheme_family, |(family, _)| family);
            Some(Rewritable::DeepLink(family))
        }
    }
}

/// Builds the desktop product URL for a rewritable `url`.
///
/// A canonical URL nested in a query parameter (e.g. `h5Url=`) decides the
/// family when present; otherwise the outer classification does.
pub(crate) fn to_desktop(url: &str, kind: Rewritable) -> Option<String> {
    let family = nested_family(url).unwrap_or_else(|| kind.family());
    family
        .descriptor()
        .parse_product_id(url)
        .map(|id| family.product_url(&id))
}

fn nested_family(url: &str) -> Option<VendorFamily> {
    let parsed = Url::parse(url.trim()).ok()?;
    parsed.query_pairs().find_map(|(_, value)| {
        let nested = Url::parse(&value).ok()?;
        match nested.host_str().and_then(classify_host) {
            Some((family, HostKind::Canonical | HostKind::Mobile)) => Some(family),
            _ => None,
        }
    })
}
