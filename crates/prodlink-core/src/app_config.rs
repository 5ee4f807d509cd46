use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Test => write!(f, "test"),
            Environment::Production => write!(f, "production"),
        }
    }
}

/// Which engine turns a non-JSON object literal into a JSON document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EvaluatorKind {
    /// In-process relaxed literal normalizer.
    Relaxed,
    /// External `node` process running the literal in an isolated context.
    Node,
}

impl std::fmt::Display for EvaluatorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EvaluatorKind::Relaxed => write!(f, "relaxed"),
            EvaluatorKind::Node => write!(f, "node"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub env: Environment,
    pub log_level: String,
    pub http_timeout_secs: u64,
    pub mobile_user_agent: String,
    pub desktop_user_agent: String,
    pub content_fetch_attempts: u32,
    pub content_fetch_backoff_ms: u64,
    pub literal_evaluator: EvaluatorKind,
    pub node_binary: PathBuf,
    pub eval_timeout_ms: u64,
}

impl AppConfig {
    #[must_use]
    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }

    #[must_use]
    pub fn eval_timeout(&self) -> Duration {
        Duration::from_millis(self.eval_timeout_ms)
    }

    #[must_use]
    pub fn content_fetch_backoff(&self) -> Duration {
        Duration::from_millis(self.content_fetch_backoff_ms)
    }
}
