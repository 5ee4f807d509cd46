use prodlink_core::{ResolutionResult, VendorFamily};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("request to {url} timed out")]
    Timeout { url: String },

    #[error("too many redirects from {url}: exceeded {max} hops")]
    TooManyRedirects { url: String, max: u32 },

    #[error("invalid URL \"{url}\": {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("unexpected HTTP status {status} from {url}")]
    UnexpectedStatus { status: u16, url: String },
}

impl FetchError {
    /// `true` when the failure was a timeout, including timeouts surfaced by
    /// the underlying client.
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        match self {
            FetchError::Timeout { .. } => true,
            FetchError::Http(e) => e.is_timeout(),
            _ => false,
        }
    }
}

#[derive(Debug, Error)]
pub enum EvalError {
    #[error("failed to start evaluator: {0}")]
    Spawn(#[from] std::io::Error),

    #[error("evaluator exited with an error: {stderr}")]
    Failed { stderr: String },

    #[error("evaluator produced invalid JSON: {0}")]
    InvalidOutput(#[source] serde_json::Error),

    #[error("literal is not a valid object expression: {reason}")]
    Syntax { reason: String },

    #[error("evaluator task did not complete: {0}")]
    Task(#[from] tokio::task::JoinError),
}

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("no embedded state found: {reason}")]
    ExtractionFailed { reason: String },

    #[error("literal evaluation timed out after {timeout_ms}ms and no other strategy succeeded")]
    EvalTimeout { timeout_ms: u64 },
}

#[derive(Debug, Error)]
pub enum ProjectError {
    #[error("URL does not belong to a supported vendor: {url}")]
    UnsupportedUrl { url: String },

    #[error("document does not match any known {family} layout")]
    SchemaMismatch { family: VendorFamily },
}

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("could not resolve input: {}", describe_resolution(.0))]
    Resolve(Box<ResolutionResult>),

    #[error("fetching {url} failed: {source}")]
    Fetch {
        url: String,
        #[source]
        source: FetchError,
    },

    #[error(transparent)]
    Extract(#[from] ExtractError),

    #[error(transparent)]
    Project(#[from] ProjectError),
}

fn describe_resolution(result: &ResolutionResult) -> String {
    result.error.as_ref().map_or_else(
        || "unknown failure".to_string(),
        |e| format!("{:?}: {}", e.kind, e.message),
    )
}
