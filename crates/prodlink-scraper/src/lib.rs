pub mod error;
pub mod extract;
pub mod fetch;
pub mod pipeline;
pub mod project;
pub mod resolver;
mod retry;

pub use error::{EvalError, ExtractError, FetchError, PipelineError, ProjectError};
pub use extract::{
    default_anchors, ConfiguredEvaluator, EmbeddedState, EmbeddedStateExtractor,
    LiteralEvaluator, NodeLiteralEvaluator, ParseMode, RelaxedLiteralEvaluator, StateAnchor,
    Strategy,
};
pub use fetch::{Fetch, FetchMethod, FetchRequest, FetchedPage, HttpFetcher};
pub use pipeline::{acquire, Acquisition, HttpPageSource, PageSource, RenderedPage, StateOrigin};
pub use project::{project, project_with_family, FieldProjection, ProjectionProfile};
pub use resolver::{ResolverOptions, UrlResolver};
