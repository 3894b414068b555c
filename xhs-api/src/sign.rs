//! Request signing.
//!
//! Signed endpoints require two per-request headers, `x-s` and `x-t`,
//! produced by the web frontend's obfuscated JavaScript routine
//! `GetXsXt(uri, data, cookie)`. The routine is a vendor artifact; this crate
//! never reimplements it and passes its output through untouched.
//!
//! [`SignatureProvider`] is the seam. [`ScriptSigner`] evaluates the vendor
//! script in an external JavaScript runtime; any closure with the right
//! signature is also a provider, which is how tests supply fixed values.

use crate::error::{Result, XhsError};
use serde_json::Value;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

/// Evaluates the script file given as first argument, then calls the global
/// `GetXsXt` with the JSON object read from stdin.
const DRIVER: &str = r#"
const fs = require('fs');
const vm = require('vm');
vm.runInThisContext(fs.readFileSync(process.argv[1], 'utf8'));
let input = '';
process.stdin.setEncoding('utf8');
process.stdin.on('data', (chunk) => { input += chunk; });
process.stdin.on('end', () => {
  const req = JSON.parse(input);
  let out = GetXsXt(req.uri, req.data, req.cookie);
  if (typeof out === 'string') { out = JSON.parse(out); }
  process.stdout.write(JSON.stringify(out));
});
"#;

/// Per-request signature headers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignaturePair {
    /// `x-s`: depends on path and body.
    pub x_s: String,
    /// `x-t`: millisecond timestamp the signature was made at.
    pub x_t: String,
}

impl SignaturePair {
    /// Parse the routine's `{"X-s": "...", "X-t": ...}` output.
    ///
    /// `X-t` may be a string or a number.
    pub fn from_script_output(output: &str) -> Result<Self> {
        let v: Value = serde_json::from_str(output.trim())
            .map_err(|e| XhsError::Signature(format!("invalid signer output: {e}")))?;
        let x_s = v["X-s"].as_str().unwrap_or_default().to_owned();
        let x_t = match &v["X-t"] {
            Value::String(s) => s.clone(),
            Value::Number(n) => n.to_string(),
            _ => String::new(),
        };
        if x_s.is_empty() || x_t.is_empty() {
            return Err(XhsError::Signature("missing X-s or X-t".into()));
        }
        Ok(Self { x_s, x_t })
    }
}

/// Produces the `x-s` / `x-t` pair for one request.
pub trait SignatureProvider: Send + Sync {
    /// Sign a request to `path` carrying `body`, on behalf of `cookie`.
    fn sign(&self, path: &str, body: &Value, cookie: &str) -> Result<SignaturePair>;
}

impl<F> SignatureProvider for F
where
    F: Fn(&str, &Value, &str) -> Result<SignaturePair> + Send + Sync,
{
    fn sign(&self, path: &str, body: &Value, cookie: &str) -> Result<SignaturePair> {
        self(path, body, cookie)
    }
}

/// Runs the vendor signing script in an external JavaScript runtime.
///
/// One runtime process is spawned per signature.
#[derive(Debug, Clone)]
pub struct ScriptSigner {
    runtime: PathBuf,
    script: PathBuf,
}

impl ScriptSigner {
    /// Use `script` with the `node` runtime.
    ///
    /// # Errors
    ///
    /// [`XhsError::Config`] if `script` is not a readable file.
    pub fn new(script: impl Into<PathBuf>) -> Result<Self> {
        let script = script.into();
        if !script.is_file() {
            return Err(XhsError::Config(format!(
                "signing script not found: {}",
                script.display()
            )));
        }
        Ok(Self {
            runtime: PathBuf::from("node"),
            script,
        })
    }

    /// Use a different JavaScript runtime binary.
    #[must_use]
    pub fn with_runtime(mut self, runtime: impl Into<PathBuf>) -> Self {
        self.runtime = runtime.into();
        self
    }

    pub fn script(&self) -> &Path {
        &self.script
    }
}

impl SignatureProvider for ScriptSigner {
    fn sign(&self, path: &str, body: &Value, cookie: &str) -> Result<SignaturePair> {
        let mut child = Command::new(&self.runtime)
            .arg("-e")
            .arg(DRIVER)
            .arg(&self.script)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| {
                if e.kind() == ErrorKind::NotFound {
                    XhsError::Config(format!(
                        "JavaScript runtime not found: {}",
                        self.runtime.display()
                    ))
                } else {
                    XhsError::Signature(format!("cannot start signer: {e}"))
                }
            })?;

        let input = serde_json::json!({ "uri": path, "data": body, "cookie": cookie }).to_string();
        // stdin is dropped after the write so the driver sees EOF.
        let written = child
            .stdin
            .take()
            .map_or(Ok(()), |mut stdin| stdin.write_all(input.as_bytes()));

        let output = child
            .wait_with_output()
            .map_err(|e| XhsError::Signature(format!("signer did not finish: {e}")))?;
        if let Err(e) = written {
            tracing::error!(
                status = %output.status,
                error = %e,
                "signing script closed its input"
            );
            return Err(XhsError::Signature(format!(
                "cannot write signer input ({}): {e}",
                output.status
            )));
        }
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            tracing::error!(status = %output.status, "signing script failed");
            return Err(XhsError::Signature(format!(
                "script exited with {}: {}",
                output.status,
                stderr.trim()
            )));
        }
        SignaturePair::from_script_output(&String::from_utf8_lossy(&output.stdout))
    }
}
