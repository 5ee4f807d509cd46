//! URL resolver: turns raw user input into a canonical product URL.
//!
//! Strategies run in a fixed order and the first decisive one wins:
//!
//! 1. text scan (only when the input is not a lone URL)
//! 2. canonical input is returned untouched
//! 3. deep links and mobile pages with an id are rewritten locally
//! 4. unknown hosts are rejected
//! 5. redirect following, id parsing, and landing-page scanning, first with
//!    the mobile identity and then with the desktop one
//! 6. a deep-link or mobile landing is rewritten
//!
//! [`UrlResolver::resolve`] never fails; every outcome is a
//! [`ResolutionResult`].

mod content;
mod desktop;
mod text_scan;

use std::time::Duration;

use prodlink_core::{
    classify_url, is_canonical_url, AppConfig, HostKind, ResolutionMethod, ResolutionResult,
    ResolveErrorKind, VendorFamily,
};

use crate::error::FetchError;
use crate::fetch::{Fetch, FetchRequest, FetchedPage};
use crate::retry::retry_on_timeout;

pub use prodlink_core::config::{DEFAULT_DESKTOP_USER_AGENT, DEFAULT_MOBILE_USER_AGENT};

const EXPIRED_LINK_MESSAGE: &str =
    "short link did not redirect; it may have expired. Try the full product link instead";

#[derive(Debug, Clone)]
pub struct ResolverOptions {
    pub mobile_user_agent: String,
    pub desktop_user_agent: String,
    /// Total attempts for the landing-page fetch; only timeouts are retried.
    pub content_fetch_attempts: u32,
    pub content_fetch_backoff: Duration,
}

impl Default for ResolverOptions {
    fn default() -> Self {
        Self {
            mobile_user_agent: DEFAULT_MOBILE_USER_AGENT.to_owned(),
            desktop_user_agent: DEFAULT_DESKTOP_USER_AGENT.to_owned(),
            content_fetch_attempts: 3,
            content_fetch_backoff: Duration::from_millis(300),
        }
    }
}

impl ResolverOptions {
    #[must_use]
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            mobile_user_agent: config.mobile_user_agent.clone(),
            desktop_user_agent: config.desktop_user_agent.clone(),
            content_fetch_attempts: config.content_fetch_attempts,
            content_fetch_backoff: config.content_fetch_backoff(),
        }
    }
}

/// Last place a network strategy ended up.
#[derive(Debug, Clone)]
struct Landing {
    url: String,
    hops: u32,
}

/// What one pass of the network strategies produced.
enum Pass {
    Resolved {
        url: String,
        hops: u32,
        method: ResolutionMethod,
    },
    Unresolved {
        landing: Option<Landing>,
        error: Option<FetchError>,
    },
}

pub struct UrlResolver<F> {
    fetcher: F,
    options: ResolverOptions,
}

impl<F: Fetch> UrlResolver<F> {
    pub fn new(fetcher: F, options: ResolverOptions) -> Self {
        Self { fetcher, options }
    }

    pub fn fetcher(&self) -> &F {
        &self.fetcher
    }

    pub fn options(&self) -> &ResolverOptions {
        &self.options
    }

    /// Resolves `input` (a URL or free text containing one).
    pub async fn resolve(&self, input: &str) -> ResolutionResult {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return ResolutionResult::failed(
                input,
                ResolveErrorKind::NoUrlFound,
                "input is empty",
                false,
            );
        }

        let (candidate, from_text) = if text_scan::is_single_url(trimmed) {
            (trimmed.to_owned(), false)
        } else if let Some(found) = text_scan::find_candidate(trimmed) {
            tracing::debug!(candidate = %found, "extracted URL from text");
            (found, true)
        } else {
            return ResolutionResult::failed(
                input,
                ResolveErrorKind::NoUrlFound,
                "no URL found in input",
                true,
            );
        };

        let result = self.resolve_candidate(input, &candidate, from_text).await;
        match (&result.final_url, result.method) {
            (Some(final_url), Some(method)) if result.success => {
                tracing::info!(
                    candidate = %candidate,
                    final_url = %final_url,
                    redirect_count = result.redirect_count,
                    method = ?method,
                    "resolved product URL"
                );
            }
            _ => {
                tracing::info!(
                    candidate = %candidate,
                    error_kind = ?result.error_kind(),
                    "could not resolve product URL"
                );
            }
        }
        result
    }

    async fn resolve_candidate(
        &self,
        input: &str,
        candidate: &str,
        from_text: bool,
    ) -> ResolutionResult {
        if is_canonical_url(candidate) {
            return ResolutionResult::resolved(
                input,
                candidate.to_owned(),
                0,
                ResolutionMethod::NoRedirectNeeded,
                from_text,
            );
        }

        if let Some(kind) = desktop::classify(candidate) {
            if let Some(url) = desktop::to_desktop(candidate, kind) {
                return ResolutionResult::resolved(input, url, 1, kind.method(), from_text);
            }
            if matches!(kind, desktop::Rewritable::DeepLink(_)) {
                return ResolutionResult::failed(
                    input,
                    ResolveErrorKind::InvalidFinalUrl,
                    "app link does not carry a product id",
                    from_text,
                )
                .with_landing(Some(candidate.to_owned()), 0);
            }
        }

        let family = match classify_url(candidate) {
            Some((family, HostKind::Shortener | HostKind::Mobile)) if is_http(candidate) => family,
            _ => {
                return ResolutionResult::failed(
                    input,
                    ResolveErrorKind::UnsupportedDomain,
                    format!("unsupported domain: {candidate}"),
                    from_text,
                );
            }
        };

        let mut latest: Option<Landing> = None;
        let mut last_error: Option<FetchError> = None;
        let identities = [
            (self.options.mobile_user_agent.as_str(), false),
            (self.options.desktop_user_agent.as_str(), true),
        ];

        for (user_agent, is_retry) in identities {
            if is_retry {
                tracing::debug!(candidate, "retrying with desktop identity");
            }
            match self.network_pass(candidate, family, user_agent).await {
                Pass::Resolved { url, hops, method } => {
                    let method = if is_retry {
                        ResolutionMethod::DesktopUaRetry
                    } else {
                        method
                    };
                    return ResolutionResult::resolved(input, url, hops, method, from_text);
                }
                Pass::Unresolved { landing, error } => {
                    if landing.is_some() {
                        latest = landing;
                    }
                    if error.is_some() {
                        last_error = error;
                    }
                }
            }
        }

        if let Some(landing) = &latest {
            if let Some(kind) = desktop::classify(&landing.url) {
                if let Some(url) = desktop::to_desktop(&landing.url, kind) {
                    return ResolutionResult::resolved(
                        input,
                        url,
                        landing.hops + 1,
                        kind.method(),
                        from_text,
                    );
                }
            }
        }

        match (latest, last_error) {
            (Some(landing), _) => {
                let message = if landing.hops == 0 {
                    EXPIRED_LINK_MESSAGE.to_owned()
                } else {
                    format!("redirect landed on an unsupported page: {}", landing.url)
                };
                ResolutionResult::failed(
                    input,
                    ResolveErrorKind::InvalidFinalUrl,
                    message,
                    from_text,
                )
                .with_landing(Some(landing.url), landing.hops)
            }
            (None, Some(err)) => {
                let kind = if err.is_timeout() {
                    ResolveErrorKind::Timeout
                } else {
                    ResolveErrorKind::RequestError
                };
                ResolutionResult::failed(input, kind, err.to_string(), from_text)
            }
            (None, None) => ResolutionResult::failed(
                input,
                ResolveErrorKind::InvalidFinalUrl,
                EXPIRED_LINK_MESSAGE,
                from_text,
            ),
        }
    }

    /// Redirect following, id parsing, then landing-page scanning, all with
    /// one user agent.
    async fn network_pass(&self, candidate: &str, family: VendorFamily, user_agent: &str) -> Pass {
        let mut landing = None;
        let mut error = None;

        match self.follow_redirects(candidate, user_agent).await {
            Ok(page) => {
                if is_canonical_url(&page.final_url) {
                    return Pass::Resolved {
                        url: page.final_url,
                        hops: page.hops,
                        method: ResolutionMethod::RedirectResolved,
                    };
                }
                tracing::debug!(
                    candidate,
                    landing = %page.final_url,
                    hops = page.hops,
                    "redirects did not reach a product page"
                );
                landing = Some(Landing {
                    url: page.final_url,
                    hops: page.hops,
                });
            }
            Err(err) => {
                tracing::warn!(candidate, error = %err, "redirect resolution failed");
                error = Some(err);
            }
        }

        if let Some(id) = family.descriptor().parse_product_id(candidate) {
            return Pass::Resolved {
                url: family.product_url(&id),
                hops: 1,
                method: ResolutionMethod::DirectIdParse,
            };
        }

        let request = FetchRequest::get(candidate, user_agent);
        let fetched = retry_on_timeout(
            self.options.content_fetch_attempts,
            self.options.content_fetch_backoff,
            || self.fetcher.fetch(request.clone()),
        )
        .await;

        match fetched {
            Ok(page) => {
                if is_canonical_url(&page.final_url) {
                    return Pass::Resolved {
                        url: page.final_url,
                        hops: page.hops,
                        method: ResolutionMethod::RedirectResolved,
                    };
                }
                if let Some(url) = page
                    .body
                    .as_deref()
                    .and_then(|body| content::find_product_url(body, family))
                {
                    return Pass::Resolved {
                        url,
                        hops: page.hops.max(1),
                        method: ResolutionMethod::ContentParsed,
                    };
                }
                landing = Some(Landing {
                    url: page.final_url,
                    hops: page.hops,
                });
            }
            Err(err) => {
                tracing::warn!(candidate, error = %err, "landing page fetch failed");
                error = Some(err);
            }
        }

        Pass::Unresolved { landing, error }
    }

    /// Header-only request, retried once as a full `GET` on transport failure.
    async fn follow_redirects(
        &self,
        url: &str,
        user_agent: &str,
    ) -> Result<FetchedPage, FetchError> {
        match self.fetcher.fetch(FetchRequest::head(url, user_agent)).await {
            Ok(page) => Ok(page),
            Err(err) => {
                tracing::debug!(url, error = %err, "HEAD failed; retrying as GET");
                self.fetcher.fetch(FetchRequest::get(url, user_agent)).await
            }
        }
    }
}

fn is_http(url: &str) -> bool {
    let lower = url.trim_start().to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}

#[cfg(test)]
#[path = "resolver_test.rs"]
mod tests;
