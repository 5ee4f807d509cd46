use std::future::Future;
use std::time::Duration;

use prodlink_core::AppConfig;
use reqwest::{redirect::Policy, Client, Response, Url};

use super::{Fetch, FetchMethod, FetchRequest, FetchedPage};
use crate::error::FetchError;

/// Upper bound on redirects followed for a single request.
pub const MAX_REDIRECTS: u32 = 10;

/// Share links are opened from the vendor's mobile site in practice.
pub const DEFAULT_REFERER: &str = "https://m.taobao.com/";

const ACCEPT_HTML: &str =
    "text/html,application/xhtml+xml,application/xml;q=0.9,image/avif,image/webp,*/*;q=0.8";
const ACCEPT_LANGUAGE: &str = "zh-CN,zh;q=0.9,en;q=0.8";

/// `reqwest`-backed [`Fetch`] implementation.
///
/// Automatic redirects are disabled on the client; the chain is walked here
/// so hops can be counted and deep-link landings reported instead of failing.
pub struct HttpFetcher {
    client: Client,
    referer: String,
    max_redirects: u32,
}

impl HttpFetcher {
    /// # Errors
    ///
    /// Returns [`FetchError::Http`] if the underlying client cannot be built.
    pub fn new(timeout: Duration) -> Result<Self, FetchError> {
        let client = Client::builder()
            .timeout(timeout)
            .connect_timeout(timeout.min(Duration::from_secs(10)))
            .redirect(Policy::none())
            .build()?;
        Ok(Self {
            client,
            referer: DEFAULT_REFERER.to_owned(),
            max_redirects: MAX_REDIRECTS,
        })
    }

    /// # Errors
    ///
    /// Returns [`FetchError::Http`] if the underlying client cannot be built.
    pub fn from_config(config: &AppConfig) -> Result<Self, FetchError> {
        Self::new(config.http_timeout())
    }

    #[must_use]
    pub fn with_referer(mut self, referer: &str) -> Self {
        referer.clone_into(&mut self.referer);
        self
    }

    #[must_use]
    pub fn with_max_redirects(mut self, max_redirects: u32) -> Self {
        self.max_redirects = max_redirects;
        self
    }

    async fn follow(&self, request: FetchRequest) -> Result<FetchedPage, FetchError> {
        let mut current = Url::parse(request.url.trim()).map_err(|e| FetchError::InvalidUrl {
            url: request.url.clone(),
            reason: e.to_string(),
        })?;
        if !is_http(&current) {
            return Err(FetchError::InvalidUrl {
                url: request.url,
                reason: format!("unsupported scheme '{}'", current.scheme()),
            });
        }

        let mut hops = 0u32;
        loop {
            let response = self.send(&current, &request).await?;
            let status = response.status();

            if status.is_redirection() {
                if let Some(next) = redirect_target(&current, &response) {
                    hops += 1;
                    if hops > self.max_redirects {
                        return Err(FetchError::TooManyRedirects {
                            url: request.url,
                            max: self.max_redirects,
                        });
                    }
                    tracing::debug!(from = %current, to = %next, hops, "following redirect");
                    if !is_http(&next) {
                        return Ok(FetchedPage {
                            final_url: next.to_string(),
                            hops,
                            status: status.as_u16(),
                            body: None,
                        });
                    }
                    current = next;
                    continue;
                }
            }

            let body = match request.method {
                FetchMethod::Head => None,
                FetchMethod::Get => Some(
                    response
                        .text()
                        .await
                        .map_err(|e| classify(e, current.as_str()))?,
                ),
            };
            return Ok(FetchedPage {
                final_url: current.to_string(),
                hops,
                status: status.as_u16(),
                body,
            });
        }
    }

    async fn send(&self, url: &Url, request: &FetchRequest) -> Result<Response, FetchError> {
        let builder = match request.method {
            FetchMethod::Head => self.client.head(url.clone()),
            FetchMethod::Get => self.client.get(url.clone()),
        };
        builder
            .header(reqwest::header::USER_AGENT, &request.user_agent)
            .header(reqwest::header::ACCEPT, ACCEPT_HTML)
            .header(reqwest::header::ACCEPT_LANGUAGE, ACCEPT_LANGUAGE)
            .header(reqwest::header::REFERER, &self.referer)
            .header(reqwest::header::CACHE_CONTROL, "max-age=0")
            .send()
            .await
            .map_err(|e| classify(e, url.as_str()))
    }
}

impl Fetch for HttpFetcher {
    fn fetch(
        &self,
        request: FetchRequest,
    ) -> impl Future<Output = Result<FetchedPage, FetchError>> + Send {
        self.follow(request)
    }
}

fn is_http(url: &Url) -> bool {
    matches!(url.scheme(), "http" | "https")
}

fn redirect_target(current: &Url, response: &Response) -> Option<Url> {
    let location = response
        .headers()
        .get(reqwest::header::LOCATION)?
        .to_str()
        .ok()?
        .trim();
    if location.is_empty() {
        return None;
    }
    current.join(location).ok()
}

fn classify(err: reqwest::Error, url: &str) -> FetchError {
    if err.is_timeout() {
        FetchError::Timeout {
            url: url.to_owned(),
        }
    } else {
        FetchError::Http(err)
    }
}
