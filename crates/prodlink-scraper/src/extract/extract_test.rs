use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use serde_json::json;

use super::*;

/// Evaluator that never finishes inside the extractor's timeout.
#[derive(Clone, Default)]
struct StalledEvaluator {
    calls: Arc<AtomicUsize>,
}

impl LiteralEvaluator for StalledEvaluator {
    async fn evaluate(&self, _literal: &str) -> Result<Value, EvalError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(Duration::from_secs(30)).await;
        Ok(json!({"late": true}))
    }
}

/// Evaluator that always fails and records every literal it was given.
#[derive(Clone, Default)]
struct RejectingEvaluator {
    literals: Arc<Mutex<Vec<String>>>,
}

impl LiteralEvaluator for RejectingEvaluator {
    async fn evaluate(&self, literal: &str) -> Result<Value, EvalError> {
        self.literals.lock().unwrap().push(literal.to_owned());
        Err(EvalError::Syntax {
            reason: "unsupported call".to_owned(),
        })
    }
}

fn relaxed() -> EmbeddedStateExtractor<RelaxedLiteralEvaluator> {
    EmbeddedStateExtractor::new(RelaxedLiteralEvaluator, Duration::from_secs(1))
}

fn stalled() -> (EmbeddedStateExtractor<StalledEvaluator>, Arc<AtomicUsize>) {
    let evaluator = StalledEvaluator::default();
    let calls = Arc::clone(&evaluator.calls);
    (
        EmbeddedStateExtractor::new(evaluator, Duration::from_millis(20)),
        calls,
    )
}

#[tokio::test]
async fn factory_call_argument_is_captured() {
    let markup = r#"<script>window.context=(function(a,b){return b;})(window.contextPath,{"result":{"data":{}}});</script>"#;
    let state = relaxed().extract(markup).await.unwrap();
    assert_eq!(state.document, json!({"result": {"data": {}}}));
    assert_eq!(state.strategy, Strategy::AnchoredCapture);
    assert_eq!(state.parse_mode, ParseMode::Strict);
    assert_eq!(state.anchor, "window.context");
}

#[tokio::test]
async fn brace_scan_keeps_escaped_quote_before_brace() {
    let markup = r#"<script>init(window.contextPath,{"outer":{"k":"a\"b"}}, 1);</script>"#;
    let state = relaxed().extract(markup).await.unwrap();
    assert_eq!(state.strategy, Strategy::BraceScan);
    assert_eq!(state.document, json!({"outer": {"k": "a\"b"}}));
}

#[tokio::test]
async fn single_line_assignment_is_the_last_resort() {
    let markup = r#"<script>window.__INIT_DATA__ = {"data":{"title":"x"}};</script>"#;
    let state = relaxed().extract(markup).await.unwrap();
    assert_eq!(state.strategy, Strategy::SingleLine);
    assert_eq!(state.anchor, "window.__INIT_DATA__");
    assert_eq!(state.document["data"]["title"], "x");
}

#[tokio::test]
async fn relaxed_literal_is_evaluated() {
    let markup = "<script>window.__INIT_DATA__={data: {title: 'Cotton tee', hot: !0,}};</script>";
    let state = relaxed().extract(markup).await.unwrap();
    assert_eq!(state.strategy, Strategy::BraceScan);
    assert_eq!(state.parse_mode, ParseMode::Evaluated);
    assert_eq!(
        state.document,
        json!({"data": {"title": "Cotton tee", "hot": true}})
    );
}

#[tokio::test]
async fn extraction_is_idempotent() {
    let markup = r#"window.context=(function(a,b){})(window.contextPath,{"result":{"n":1}});"#;
    let extractor = relaxed();
    let first = extractor.extract(markup).await.unwrap();
    let second = extractor.extract(markup).await.unwrap();
    assert_eq!(first, second);
}

#[tokio::test]
async fn stalled_evaluator_reports_timeout_after_one_call() {
    let markup = "window.context=(function(a,b){})(window.contextPath,{result: 1});";
    let (extractor, calls) = stalled();
    let err = extractor.extract(markup).await.unwrap_err();
    assert!(
        matches!(err, ExtractError::EvalTimeout { timeout_ms: 20 }),
        "got {err:?}"
    );
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn strict_parse_still_succeeds_after_evaluator_timeout() {
    let markup = concat!(
        "window.context=(function(a,b){})(window.contextPath,{result: 1});",
        r#"window.__INIT_DATA__={"ok":true};"#,
    );
    let (extractor, calls) = stalled();
    let state = extractor.extract(markup).await.unwrap();
    assert_eq!(state.anchor, "window.__INIT_DATA__");
    assert_eq!(state.strategy, Strategy::BraceScan);
    assert_eq!(state.document, json!({"ok": true}));
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn markup_without_anchor_fails() {
    let err = relaxed()
        .extract("<html><body>nothing here</body></html>")
        .await
        .unwrap_err();
    match err {
        ExtractError::ExtractionFailed { reason } => assert!(reason.contains("no known")),
        other => panic!("expected ExtractionFailed, got {other:?}"),
    }
}

#[tokio::test]
async fn undecodable_literal_fails() {
    let err = relaxed()
        .extract("window.__INIT_DATA__={a: track()};")
        .await
        .unwrap_err();
    assert!(
        matches!(err, ExtractError::ExtractionFailed { .. }),
        "got {err:?}"
    );
}

#[tokio::test]
async fn non_object_literal_is_not_accepted() {
    let err = relaxed()
        .extract("window.__INIT_DATA__=[1,2,3];")
        .await
        .unwrap_err();
    assert!(matches!(err, ExtractError::ExtractionFailed { .. }));
}

#[tokio::test]
async fn custom_anchor_is_used() {
    let extractor = relaxed().with_anchors(vec![StateAnchor::assignment("window.__STATE__")]);
    let state = extractor
        .extract(r#"<script>window.__STATE__={"item":{"id":7}};</script>"#)
        .await
        .unwrap();
    assert_eq!(state.anchor, "window.__STATE__");
    assert_eq!(state.document["item"]["id"], 7);
}

#[tokio::test]
async fn identical_literal_is_evaluated_once() {
    let evaluator = RejectingEvaluator::default();
    let literals = Arc::clone(&evaluator.literals);
    let extractor = EmbeddedStateExtractor::new(evaluator, Duration::from_secs(1));
    let markup =
        "<script>window.context=(function(a,b){return b;})(window.contextPath,{a: foo()});</script>";

    let err = extractor.extract(markup).await.unwrap_err();

    assert!(matches!(err, ExtractError::ExtractionFailed { .. }), "got {err:?}");
    assert_eq!(*literals.lock().unwrap(), vec!["{a: foo()}".to_owned()]);
}

#[tokio::test]
async fn relaxed_evaluation_is_bounded_by_timeout() {
    let literal = format!("{{tiers: [{}]}}", "1,".repeat(2_000_000));
    let markup = format!("<script>window.__INIT_DATA__ = {literal};</script>");
    let extractor = EmbeddedStateExtractor::new(RelaxedLiteralEvaluator, Duration::ZERO);

    let err = extractor.extract(&markup).await.unwrap_err();

    assert!(matches!(err, ExtractError::EvalTimeout { timeout_ms: 0 }), "got {err:?}");
}
