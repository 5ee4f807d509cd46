//! End-to-end acquisition: resolve the input, render the product page,
//! recover its state, and project it.

use std::future::Future;

use chrono::{DateTime, Utc};
use prodlink_core::{NormalizedProduct, ResolutionResult};
use serde::Serialize;
use serde_json::Value;

use crate::error::{FetchError, PipelineError};
use crate::extract::{EmbeddedStateExtractor, LiteralEvaluator, ParseMode, Strategy};
use crate::fetch::{Fetch, FetchRequest};
use crate::project::project;
use crate::resolver::UrlResolver;

/// A product page as delivered by a [`PageSource`].
#[derive(Debug, Clone, Default)]
pub struct RenderedPage {
    pub markup: String,
    /// State read directly from the page runtime, when the source can do
    /// that (e.g. a browser evaluating `window.context`).
    pub live_state: Option<Value>,
}

/// Produces product pages. Session and cookie handling live behind this
/// trait; the pipeline never sees them.
pub trait PageSource: Send + Sync {
    fn render(&self, url: &str) -> impl Future<Output = Result<RenderedPage, FetchError>> + Send;
}

/// Plain-HTTP page source: one `GET` with the desktop identity, no script
/// execution.
pub struct HttpPageSource<F> {
    fetcher: F,
    user_agent: String,
}

impl<F: Fetch> HttpPageSource<F> {
    pub fn new(fetcher: F, user_agent: &str) -> Self {
        Self {
            fetcher,
            user_agent: user_agent.to_owned(),
        }
    }

    async fn get(&self, url: &str) -> Result<RenderedPage, FetchError> {
        let page = self
            .fetcher
            .fetch(FetchRequest::get(url, &self.user_agent))
            .await?;
        if !(200..300).contains(&page.status) {
            return Err(FetchError::UnexpectedStatus {
                status: page.status,
                url: page.final_url,
            });
        }
        Ok(RenderedPage {
            markup: page.body.unwrap_or_default(),
            live_state: None,
        })
    }
}

impl<F: Fetch> PageSource for HttpPageSource<F> {
    fn render(&self, url: &str) -> impl Future<Output = Result<RenderedPage, FetchError>> + Send {
        let url = url.to_owned();
        async move { self.get(&url).await }
    }
}

/// Where the projected state came from.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StateOrigin {
    LiveState,
    Embedded {
        anchor: String,
        strategy: Strategy,
        parse_mode: ParseMode,
    },
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Acquisition {
    pub resolution: ResolutionResult,
    pub product: NormalizedProduct,
    pub state_origin: StateOrigin,
    pub fetched_at: DateTime<Utc>,
}

/// Runs the whole pipeline for one user input.
///
/// The product is projected against the resolved URL, so its family always
/// matches the resolution.
///
/// # Errors
///
/// Returns the [`PipelineError`] variant of the first stage that failed.
pub async fn acquire<F, P, E>(
    input: &str,
    resolver: &UrlResolver<F>,
    source: &P,
    extractor: &EmbeddedStateExtractor<E>,
) -> Result<Acquisition, PipelineError>
where
    F: Fetch,
    P: PageSource,
    E: LiteralEvaluator,
{
    let resolution = resolver.resolve(input).await;
    let url = match resolution.final_url.clone() {
        Some(url) if resolution.success => url,
        _ => return Err(PipelineError::Resolve(Box::new(resolution))),
    };

    let page = source
        .render(&url)
        .await
        .map_err(|source| PipelineError::Fetch {
            url: url.clone(),
            source,
        })?;

    let (document, state_origin) = match page.live_state {
        Some(Value::Object(map)) if !map.is_empty() => (Value::Object(map), StateOrigin::LiveState),
        _ => {
            let state = extractor.extract(&page.markup).await?;
            let origin = StateOrigin::Embedded {
                anchor: state.anchor,
                strategy: state.strategy,
                parse_mode: state.parse_mode,
            };
            (state.document, origin)
        }
    };

    let product = project(&document, &url)?;
    tracing::info!(
        url = %url,
        source_id = %product.source_id,
        family = %product.source_type,
        origin = ?state_origin,
        "acquired product"
    );

    Ok(Acquisition {
        resolution,
        product,
        state_origin,
        fetched_at: Utc::now(),
    })
}

#[cfg(test)]
#[path = "pipeline_test.rs"]
mod tests;
