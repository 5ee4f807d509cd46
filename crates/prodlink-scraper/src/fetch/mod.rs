//! HTTP seam used by the resolver and the plain-HTTP page source.
//!
//! [`Fetch`] is the only way the rest of the crate touches the network, so
//! resolver strategies can be exercised against an in-memory fake.

mod http;

use std::future::Future;
use std::sync::Arc;

use crate::error::FetchError;

pub use http::{HttpFetcher, DEFAULT_REFERER, MAX_REDIRECTS};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchMethod {
    /// Header-only request; the response body is discarded.
    Head,
    Get,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchRequest {
    pub url: String,
    pub method: FetchMethod,
    pub user_agent: String,
}

impl FetchRequest {
    #[must_use]
    pub fn head(url: &str, user_agent: &str) -> Self {
        Self {
            url: url.to_owned(),
            method: FetchMethod::Head,
            user_agent: user_agent.to_owned(),
        }
    }

    #[must_use]
    pub fn get(url: &str, user_agent: &str) -> Self {
        Self {
            url: url.to_owned(),
            method: FetchMethod::Get,
            user_agent: user_agent.to_owned(),
        }
    }
}

/// Where a request ended up after following redirects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedPage {
    pub final_url: String,
    /// Number of redirects followed to reach `final_url`.
    pub hops: u32,
    pub status: u16,
    /// Present for `GET` requests that reached an HTTP(S) page.
    pub body: Option<String>,
}

pub trait Fetch: Send + Sync {
    /// Performs `request`, following redirects.
    ///
    /// A redirect into a non-HTTP scheme (an app deep link) ends the chain
    /// successfully with that URL as `final_url` and no body.
    fn fetch(
        &self,
        request: FetchRequest,
    ) -> impl Future<Output = Result<FetchedPage, FetchError>> + Send;
}

impl<T: Fetch> Fetch for &T {
    fn fetch(
        &self,
        request: FetchRequest,
    ) -> impl Future<Output = Result<FetchedPage, FetchError>> + Send {
        (**self).fetch(request)
    }
}

impl<T: Fetch> Fetch for Arc<T> {
    fn fetch(
        &self,
        request: FetchRequest,
    ) -> impl Future<Output = Result<FetchedPage, FetchError>> + Send {
        (**self).fetch(request)
    }
}
