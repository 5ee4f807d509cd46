use std::future::Future;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use serde_json::Value;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

use super::LiteralEvaluator;
use crate::error::EvalError;

/// Evaluates a literal with an external `node` binary.
///
/// The literal arrives on stdin and is run by `vm.runInNewContext` against
/// an empty sandbox with its own timeout, so page globals and `require` are
/// out of reach. The child is killed if the returned future is dropped.
#[derive(Debug, Clone)]
pub struct NodeLiteralEvaluator {
    binary: PathBuf,
    timeout: Duration,
}

impl NodeLiteralEvaluator {
    #[must_use]
    pub fn new(binary: &Path, timeout: Duration) -> Self {
        Self {
            binary: binary.to_path_buf(),
            timeout,
        }
    }

    fn script(&self) -> String {
        let timeout_ms = self.timeout.as_millis().max(1);
        format!(
            r"const vm = require('vm');
let src = '';
process.stdin.setEncoding('utf8');
process.stdin.on('data', (chunk) => {{ src += chunk; }});
process.stdin.on('end', () => {{
  try {{
    const value = vm.runInNewContext('(' + src + '\n)', {{}}, {{ timeout: {timeout_ms} }});
    process.stdout.write(JSON.stringify(value === undefined ? null : value));
  }} catch (e) {{
    process.stderr.write(String((e && e.message) || e));
    process.exit(1);
  }}
}});"
        )
    }

    async fn run(&self, literal: &str) -> Result<Value, EvalError> {
        let mut child = Command::new(&self.binary)
            .arg("-e")
            .arg(self.script())
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()?;

        let mut stdin = child.stdin.take().ok_or_else(|| EvalError::Failed {
            stderr: "child stdin was not captured".to_owned(),
        })?;
        let input = literal.to_owned();
        let write = async move {
            let written = stdin.write_all(input.as_bytes()).await;
            drop(stdin);
            written
        };

        let (written, output) = tokio::join!(write, child.wait_with_output());
        let output = output?;
        if !output.status.success() {
            return Err(EvalError::Failed {
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_owned(),
            });
        }
        written?;

        serde_json::from_slice(&output.stdout).map_err(EvalError::InvalidOutput)
    }
}

impl LiteralEvaluator for NodeLiteralEvaluator {
    fn evaluate(&self, literal: &str) -> impl Future<Output = Result<Value, EvalError>> + Send {
        let literal = literal.to_owned();
        async move { self.run(&literal).await }
    }
}
