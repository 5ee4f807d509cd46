//! Turns object literals that are valid script but not strict JSON into
//! documents.
//!
//! The extractor only sees the [`LiteralEvaluator`] trait and bounds every
//! call with its own timeout, so the in-process normalizer and the external
//! `node` runner are interchangeable.

mod node;
mod relaxed;

use std::future::Future;

use prodlink_core::{AppConfig, EvaluatorKind};
use serde_json::Value;

use crate::error::EvalError;

pub use node::NodeLiteralEvaluator;
pub use relaxed::{normalize_literal, RelaxedLiteralEvaluator};

pub trait LiteralEvaluator: Send + Sync {
    /// Evaluates one object literal. Called at most once per captured span.
    fn evaluate(&self, literal: &str) -> impl Future<Output = Result<Value, EvalError>> + Send;
}

/// Evaluator chosen by `PRODLINK_LITERAL_EVALUATOR`.
#[derive(Debug, Clone)]
pub enum ConfiguredEvaluator {
    Relaxed(RelaxedLiteralEvaluator),
    Node(NodeLiteralEvaluator),
}

impl ConfiguredEvaluator {
    #[must_use]
    pub fn from_config(config: &AppConfig) -> Self {
        match config.literal_evaluator {
            EvaluatorKind::Relaxed => ConfiguredEvaluator::Relaxed(RelaxedLiteralEvaluator),
            EvaluatorKind::Node => ConfiguredEvaluator::Node(NodeLiteralEvaluator::new(
                &config.node_binary,
                config.eval_timeout(),
            )),
        }
    }
}

impl LiteralEvaluator for ConfiguredEvaluator {
    async fn evaluate(&self, literal: &str) -> Result<Value, EvalError> {
        match self {
            ConfiguredEvaluator::Relaxed(inner) => inner.evaluate(literal).await,
            ConfiguredEvaluator::Node(inner) => inner.evaluate(literal).await,
        }
    }
}
