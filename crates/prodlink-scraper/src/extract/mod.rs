//! Embedded-state extraction: finds the state object a vendor page
//! bootstraps into a global variable and decodes it.
//!
//! Strategies run in fixed order across all anchors: the factory-call
//! capture, then the marker + brace scan, then a single-line assignment
//! regex. Each captured span is parsed strictly first and handed to the
//! [`LiteralEvaluator`] at most once.

pub mod evaluator;
mod scan;

use std::collections::HashSet;
use std::time::Duration;

use prodlink_core::AppConfig;
use regex::Regex;
use serde::Serialize;
use serde_json::Value;

use crate::error::{EvalError, ExtractError};

pub use evaluator::{
    ConfiguredEvaluator, LiteralEvaluator, NodeLiteralEvaluator, RelaxedLiteralEvaluator,
};

/// Which strategy located the literal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    AnchoredCapture,
    BraceScan,
    SingleLine,
}

/// How the located literal was decoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ParseMode {
    Strict,
    Evaluated,
}

/// A decoded state document and how it was obtained.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EmbeddedState {
    /// Always a JSON object.
    pub document: Value,
    pub anchor: String,
    pub strategy: Strategy,
    pub parse_mode: ParseMode,
}

/// A page global that carries embedded state.
#[derive(Debug, Clone)]
pub struct StateAnchor {
    global: String,
    marker: String,
    factory_call: Regex,
    single_line: Regex,
}

impl StateAnchor {
    /// `global` is the assigned expression (e.g. `window.context`); `marker`
    /// is the text that immediately precedes the object literal.
    #[must_use]
    pub fn new(global: &str, marker: &str) -> Self {
        let escaped = regex::escape(global);
        let factory_call = Regex::new(&format!(
            r"{escaped}\s*=\s*\(function\s*\([^)]*\)\s*\{{[\s\S]*?\}}\s*\)\s*\([^,]+,\s*(\{{[\s\S]*?\}})\s*\);"
        ))
        .expect("valid regex");
        let single_line =
            Regex::new(&format!(r"{escaped}\s*=\s*(\{{.*?\}})\s*;")).expect("valid regex");
        Self {
            global: global.to_owned(),
            marker: marker.to_owned(),
            factory_call,
            single_line,
        }
    }

    /// Anchor for a plain `global={...}` assignment.
    #[must_use]
    pub fn assignment(global: &str) -> Self {
        Self::new(global, &format!("{global}="))
    }

    #[must_use]
    pub fn global(&self) -> &str {
        &self.global
    }

    fn capture(&self, strategy: Strategy, markup: &str) -> Option<String> {
        match strategy {
            Strategy::AnchoredCapture => first_group(&self.factory_call, markup),
            Strategy::BraceScan => {
                scan::object_after_marker(markup, &self.marker).map(str::to_owned)
            }
            Strategy::SingleLine => first_group(&self.single_line, markup),
        }
    }
}

fn first_group(re: &Regex, markup: &str) -> Option<String> {
    re.captures(markup)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_owned())
}

/// `window.context` (factory call with `window.contextPath` as first
/// argument) and `window.__INIT_DATA__`.
#[must_use]
pub fn default_anchors() -> Vec<StateAnchor> {
    vec![
        StateAnchor::new("window.context", "window.contextPath,"),
        StateAnchor::assignment("window.__INIT_DATA__"),
    ]
}

const STRATEGIES: [Strategy; 3] = [
    Strategy::AnchoredCapture,
    Strategy::BraceScan,
    Strategy::SingleLine,
];

pub struct EmbeddedStateExtractor<E> {
    evaluator: E,
    anchors: Vec<StateAnchor>,
    eval_timeout: Duration,
}

impl<E: LiteralEvaluator> EmbeddedStateExtractor<E> {
    pub fn new(evaluator: E, eval_timeout: Duration) -> Self {
        Self {
            evaluator,
            anchors: default_anchors(),
            eval_timeout,
        }
    }

    #[must_use]
    pub fn with_anchors(mut self, anchors: Vec<StateAnchor>) -> Self {
        self.anchors = anchors;
        self
    }

    /// Extracts the first decodable state object from `markup`.
    ///
    /// # Errors
    ///
    /// - [`ExtractError::EvalTimeout`] when the evaluator timed out and no
    ///   later strategy produced a document.
    /// - [`ExtractError::ExtractionFailed`] when nothing was found or every
    ///   captured literal failed to decode.
    pub async fn extract(&self, markup: &str) -> Result<EmbeddedState, ExtractError> {
        let mut evaluator_spent = false;
        let mut timed_out = false;
        let mut attempts = 0usize;
        let mut seen: HashSet<String> = HashSet::new();

        for strategy in STRATEGIES {
            for anchor in &self.anchors {
                let Some(span) = anchor.capture(strategy, markup) else {
                    continue;
                };
                attempts += 1;
                tracing::debug!(
                    anchor = %anchor.global,
                    strategy = ?strategy,
                    span_len = span.len(),
                    "captured state literal"
                );

                if let Some(document) = parse_strict(&span) {
                    return Ok(self.found(anchor, strategy, ParseMode::Strict, document));
                }
                // Strategies often capture the same literal; it gets one
                // evaluator call at most.
                if evaluator_spent || !seen.insert(span.clone()) {
                    continue;
                }

                match tokio::time::timeout(self.eval_timeout, self.evaluator.evaluate(&span)).await
                {
                    Ok(Ok(document)) if document.is_object() => {
                        return Ok(self.found(anchor, strategy, ParseMode::Evaluated, document));
                    }
                    Ok(Ok(_)) => {
                        tracing::debug!(anchor = %anchor.global, "evaluated literal is not an object");
                    }
                    Ok(Err(err)) => log_eval_failure(&anchor.global, &err),
                    Err(_) => {
                        tracing::warn!(
                            anchor = %anchor.global,
                            timeout_ms = self.timeout_ms(),
                            "literal evaluation timed out; continuing with strict parsing only"
                        );
                        evaluator_spent = true;
                        timed_out = true;
                    }
                }
            }
        }

        if timed_out {
            return Err(ExtractError::EvalTimeout {
                timeout_ms: self.timeout_ms(),
            });
        }
        let reason = if attempts == 0 {
            "no known state anchor in markup".to_owned()
        } else {
            format!("{attempts} captured literal(s) could not be decoded")
        };
        Err(ExtractError::ExtractionFailed { reason })
    }

    fn found(
        &self,
        anchor: &StateAnchor,
        strategy: Strategy,
        parse_mode: ParseMode,
        document: Value,
    ) -> EmbeddedState {
        tracing::info!(
            anchor = %anchor.global,
            strategy = ?strategy,
            parse_mode = ?parse_mode,
            "extracted embedded state"
        );
        EmbeddedState {
            document,
            anchor: anchor.global.clone(),
            strategy,
            parse_mode,
        }
    }

    fn timeout_ms(&self) -> u64 {
        u64::try_from(self.eval_timeout.as_millis()).unwrap_or(u64::MAX)
    }
}

impl EmbeddedStateExtractor<ConfiguredEvaluator> {
    /// Extractor using the configured evaluator and evaluation timeout.
    #[must_use]
    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(ConfiguredEvaluator::from_config(config), config.eval_timeout())
    }
}

fn parse_strict(span: &str) -> Option<Value> {
    serde_json::from_str::<Value>(span)
        .ok()
        .filter(Value::is_object)
}

fn log_eval_failure(anchor: &str, err: &EvalError) {
    tracing::debug!(anchor, error = %err, "literal evaluation failed");
}

#[cfg(test)]
#[path = "extract_test.rs"]
mod tests;
