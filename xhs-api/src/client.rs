//! Blocking client and the builder for both clients.
//!
//! Every call goes through the same steps:
//!
//! 1. The operation validates its arguments and produces a
//!    [`Call`](crate::request::Call): request descriptor + payload decoder
//! 2. The pipeline signs (per attempt), adds headers and the cookie
//! 3. The transport sends; 5xx and envelope errors are classified
//! 4. Retryable failures sleep `retry_delay * n` and go again
//! 5. The unwrapped `data` is decoded into the typed result
//!
//! API methods are implemented in separate modules (`user`, `note`,
//! `comment`) as `impl XhsClient` blocks.

use crate::async_client::AsyncXhsClient;
use crate::auth::Credential;
use crate::config::ClientConfig;
use crate::error::{Result, XhsError};
use crate::request::{Call, Pipeline, RequestDescriptor};
use crate::sign::{ScriptSigner, SignatureProvider};
use crate::transport::{AsyncReqwestTransport, AsyncTransport, ReqwestTransport, Transport};
use serde_json::Value;
use std::sync::Arc;
use std::thread;

/// Assembles an [`XhsClient`] or [`AsyncXhsClient`].
///
/// ```no_run
/// use xhs_api::{ClientBuilder, ClientConfig};
///
/// let client = ClientBuilder::new("a1=...; web_session=...")
///     .config(ClientConfig::default().with_sign_script("vendor/xhs_sign.js"))
///     .build()?;
/// let me = client.current_user()?;
/// println!("{}", me.nickname);
/// # Ok::<(), xhs_api::XhsError>(())
/// ```
pub struct ClientBuilder {
    cookie: String,
    config: ClientConfig,
    signer: Option<Arc<dyn SignatureProvider>>,
}

impl ClientBuilder {
    pub fn new(cookie: impl Into<String>) -> Self {
        Self {
            cookie: cookie.into(),
            config: ClientConfig::default(),
            signer: None,
        }
    }

    /// Start from a cookie found in `XHS_COOKIE` or the saved session file.
    ///
    /// # Errors
    ///
    /// [`XhsError::Config`] if neither holds a cookie.
    pub fn discover() -> Result<Self> {
        let credential = Credential::discover()?.ok_or_else(|| {
            XhsError::Config("no cookie in XHS_COOKIE or the saved session".into())
        })?;
        Ok(Self::new(credential.raw()))
    }

    #[must_use]
    pub fn config(mut self, config: ClientConfig) -> Self {
        self.config = config;
        self
    }

    /// Use `signer` instead of running `config.sign_script`.
    #[must_use]
    pub fn signer(mut self, signer: impl SignatureProvider + 'static) -> Self {
        self.signer = Some(Arc::new(signer));
        self
    }

    fn pipeline(self) -> Result<Pipeline> {
        let credential = Credential::parse(&self.cookie)?;
        let signer = self.signer.map_or_else(|| script_signer(&self.config), Ok)?;
        Ok(Pipeline::new(credential, self.config, signer))
    }

    /// Build a blocking client over HTTP.
    pub fn build(self) -> Result<XhsClient> {
        let transport = ReqwestTransport::new(&self.config)?;
        self.build_with_transport(transport)
    }

    /// Build a blocking client over a custom transport.
    pub fn build_with_transport(self, transport: impl Transport + 'static) -> Result<XhsClient> {
        Ok(XhsClient {
            pipeline: self.pipeline()?,
            transport: Box::new(transport),
        })
    }

    /// Build an async client over HTTP.
    pub fn build_async(self) -> Result<AsyncXhsClient> {
        let transport = AsyncReqwestTransport::new(&self.config)?;
        self.build_async_with_transport(transport)
    }

    /// Build an async client over a custom transport.
    pub fn build_async_with_transport(
        self,
        transport: impl AsyncTransport + 'static,
    ) -> Result<AsyncXhsClient> {
        Ok(AsyncXhsClient::from_parts(
            self.pipeline()?,
            Box::new(transport),
        ))
    }
}

/// Signer for `config.sign_script`, run with `config.js_runtime`.
fn script_signer(config: &ClientConfig) -> Result<Arc<dyn SignatureProvider>> {
    let script = config.sign_script.as_ref().ok_or_else(|| {
        XhsError::Config("no signature provider given and no sign_script configured".into())
    })?;
    let signer = ScriptSigner::new(script)?.with_runtime(config.js_runtime.clone());
    Ok(Arc::new(signer))
}

/// Blocking client for the Xiaohongshu web API.
///
/// Holds the parsed credential, the signer and a lazily created HTTP
/// session. Build it with [`ClientBuilder`].
pub struct XhsClient {
    pipeline: Pipeline,
    transport: Box<dyn Transport>,
}

impl XhsClient {
    pub fn builder(cookie: impl Into<String>) -> ClientBuilder {
        ClientBuilder::new(cookie)
    }

    pub fn credential(&self) -> &Credential {
        self.pipeline.credential()
    }

    pub fn config(&self) -> &ClientConfig {
        self.pipeline.config()
    }

    /// Execute a descriptor with retries and return the unwrapped payload.
    pub(crate) fn execute(&self, descriptor: &RequestDescriptor) -> Result<Value> {
        let retry = *self.pipeline.retry();
        let mut attempt = 0;
        loop {
            match self.attempt(descriptor, attempt) {
                Ok(data) => return Ok(data),
                Err(err) => {
                    let Some(delay) = retry.backoff(&err, attempt) else {
                        return Err(err);
                    };
                    self.pipeline
                        .log_retry(descriptor.path, &err, attempt, delay);
                    thread::sleep(delay);
                    attempt += 1;
                }
            }
        }
    }

    fn attempt(&self, descriptor: &RequestDescriptor, attempt: u32) -> Result<Value> {
        let signature = self.pipeline.sign(descriptor)?;
        let request = self.pipeline.build(descriptor, signature.as_ref())?;
        self.pipeline.log_request(&request, attempt);
        let response = self.transport.send(&request)?;
        self.pipeline.log_response(&request, &response);
        self.pipeline.interpret(&response)
    }

    pub(crate) fn run<T>(&self, call: Call<T>) -> Result<T> {
        let data = self.execute(&call.descriptor)?;
        Ok((call.decode)(&data))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::{SEARCH_NOTES, USER_ME};
    use crate::sign::SignaturePair;
    use crate::transport::{HttpResponse, MockTransport, TransportError};
    use crate::types::{NoteTypeFilter, SortOrder};
    use serde_json::json;
    use std::io;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    const COOKIE: &str = "a1=abc123; web_session=s3cr3t-value";

    fn config() -> ClientConfig {
        ClientConfig::default()
            .with_base_url("http://mock")
            .with_retry_delay(Duration::from_millis(1))
            .with_rate_limit_backoff(Duration::from_millis(1))
    }

    fn signer(_: &str, _: &Value, _: &str) -> Result<SignaturePair> {
        Ok(SignaturePair {
            x_s: "XYW_sig".into(),
            x_t: "1700000000000".into(),
        })
    }

    fn client(mock: &MockTransport) -> XhsClient {
        ClientBuilder::new(COOKIE)
            .config(config())
            .signer(signer)
            .build_with_transport(mock.clone())
            .unwrap()
    }

    #[test]
    fn current_user_end_to_end() {
        let mock = MockTransport::new();
        mock.respond_json(
            USER_ME,
            &json!({"success": true, "code": 0, "data": {"user_id": "u1", "nickname": "小红", "fans": "1.2k"}}),
        );
        let me = client(&mock).current_user().unwrap();
        assert_eq!(me.user_id, "u1");
        assert_eq!(me.followers, 1200);

        let sent = mock.last(USER_ME).unwrap();
        assert_eq!(sent.url, format!("http://mock{USER_ME}"));
        assert_eq!(sent.header("cookie"), Some(COOKIE));
        assert!(sent.header("x-s").is_none());
    }

    #[test]
    fn persistent_server_error_exhausts_retries() {
        let mock = MockTransport::new();
        mock.respond_always(USER_ME, Ok(HttpResponse::new(502, "bad gateway")));
        let c = client(&mock);

        let err = c.current_user().unwrap_err();
        assert!(matches!(err, XhsError::Server { status: 502 }));
        assert_eq!(mock.calls(USER_ME), 4);
    }

    #[test]
    fn auth_error_is_not_retried() {
        let mock = MockTransport::new();
        mock.respond_always(
            USER_ME,
            Ok(HttpResponse::json(&json!({"success": false, "code": 10001, "msg": "未登录"}))),
        );
        let err = client(&mock).current_user().unwrap_err();
        assert!(matches!(err, XhsError::Auth { code: 10001, .. }));
        assert_eq!(mock.calls(USER_ME), 1);
    }

    #[test]
    fn transient_failures_recover() {
        let mock = MockTransport::new();
        mock.respond(USER_ME, Err(TransportError::Timeout));
        mock.respond(
            USER_ME,
            Ok(HttpResponse::json(&json!({"success": false, "code": 503, "msg": "busy"}))),
        );
        mock.respond(USER_ME, Ok(HttpResponse::json(&json!({"data": {"user_id": "u1"}}))));

        let me = client(&mock).current_user().unwrap();
        assert_eq!(me.user_id, "u1");
        assert_eq!(mock.calls(USER_ME), 3);
    }

    #[test]
    fn last_error_surfaces_on_exhaustion() {
        let mock = MockTransport::new();
        mock.respond(USER_ME, Ok(HttpResponse::new(500, "")));
        mock.respond_always(USER_ME, Err(TransportError::Connect("refused".into())));
        let c = ClientBuilder::new(COOKIE)
            .config(config().with_max_retries(1))
            .signer(signer)
            .build_with_transport(mock.clone())
            .unwrap();

        assert!(matches!(
            c.current_user(),
            Err(XhsError::Network(TransportError::Connect(_)))
        ));
        assert_eq!(mock.calls(USER_ME), 2);
    }

    #[test]
    fn malformed_body_is_not_retried() {
        let mock = MockTransport::new();
        mock.respond_always(USER_ME, Ok(HttpResponse::new(200, "<html>captcha</html>")));
        let err = client(&mock).current_user().unwrap_err();
        assert!(matches!(err, XhsError::MalformedResponse { status: 200, .. }));
        assert_eq!(mock.calls(USER_ME), 1);
    }

    #[test]
    fn validation_error_sends_nothing() {
        let mock = MockTransport::new();
        let c = client(&mock);
        for limit in [0, 101] {
            let err = c
                .search_notes("咖啡", limit, SortOrder::General, NoteTypeFilter::All)
                .unwrap_err();
            assert!(matches!(err, XhsError::Validation(_)));
        }
        assert!(c.post_comment("n1", &"x".repeat(501), None, &[]).is_err());
        assert!(mock.requests().is_empty());
    }

    #[test]
    fn signer_runs_on_every_attempt() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let mock = MockTransport::new();
        mock.respond(SEARCH_NOTES, Ok(HttpResponse::new(503, "")));
        mock.respond_json(SEARCH_NOTES, &json!({"data": {"items": [], "has_more": false}}));

        let c = ClientBuilder::new(COOKIE)
            .config(config())
            .signer(move |path: &str, _: &Value, _: &str| -> Result<SignaturePair> {
                let n = counter.fetch_add(1, Ordering::SeqCst);
                Ok(SignaturePair {
                    x_s: format!("sig-{path}-{n}"),
                    x_t: n.to_string(),
                })
            })
            .build_with_transport(mock.clone())
            .unwrap();

        let result = c
            .search_notes("咖啡", 10, SortOrder::Hot, NoteTypeFilter::Normal)
            .unwrap();
        assert!(result.notes.is_empty());
        assert_eq!(calls.load(Ordering::SeqCst), 2);

        let sent = mock.requests();
        assert_eq!(sent[0].header("x-t"), Some("0"));
        assert_eq!(sent[1].header("x-t"), Some("1"));
    }

    #[test]
    fn signature_failure_is_not_retried() {
        let mock = MockTransport::new();
        let c = ClientBuilder::new(COOKIE)
            .config(config())
            .signer(|_: &str, _: &Value, _: &str| -> Result<SignaturePair> {
                Err(XhsError::Signature("empty X-s".into()))
            })
            .build_with_transport(mock.clone())
            .unwrap();
        assert!(matches!(c.home_feed(), Err(XhsError::Signature(_))));
        assert!(mock.requests().is_empty());
    }

    #[test]
    fn build_requires_cookie_and_signer() {
        let empty = ClientBuilder::new("  ")
            .signer(signer)
            .build_with_transport(MockTransport::new());
        assert!(matches!(empty, Err(XhsError::Config(_))));

        let unsigned = ClientBuilder::new(COOKIE).build_with_transport(MockTransport::new());
        assert!(matches!(unsigned, Err(XhsError::Config(_))));

        let missing_script = ClientBuilder::new(COOKIE)
            .config(ClientConfig::default().with_sign_script("/nonexistent/sign.js"))
            .build_with_transport(MockTransport::new());
        assert!(matches!(missing_script, Err(XhsError::Config(_))));

        let separators_only = ClientBuilder::new(";;")
            .signer(signer)
            .build_with_transport(MockTransport::new());
        assert!(matches!(separators_only, Err(XhsError::Config(_))));
    }

    #[test]
    fn configured_script_becomes_the_signer() {
        let dir = tempfile::tempdir().unwrap();
        let script = dir.path().join("xhs_sign.js");
        std::fs::write(&script, "function GetXsXt() {}").unwrap();

        let mock = MockTransport::new();
        mock.respond_json(USER_ME, &json!({"success": true, "code": 0, "data": {"user_id": "u1"}}));
        let c = ClientBuilder::new(COOKIE)
            .config(config().with_sign_script(&script))
            .build_with_transport(mock)
            .unwrap();
        // Unsigned endpoints never start the script runtime.
        assert_eq!(c.current_user().unwrap().user_id, "u1");
    }

    #[derive(Clone, Default)]
    struct Captured(Arc<Mutex<Vec<u8>>>);

    impl io::Write for Captured {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn verbose_logging_never_prints_cookie_values() {
        let captured = Captured::default();
        let writer = captured.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .with_ansi(false)
            .with_writer(move || writer.clone())
            .finish();

        let mock = MockTransport::new();
        mock.respond(USER_ME, Ok(HttpResponse::new(500, "")));
        mock.respond_json(USER_ME, &json!({"success": true, "code": 0, "data": {"user_id": "u1"}}));
        let c = ClientBuilder::new(COOKIE)
            .config(config().with_verbose(true))
            .signer(signer)
            .build_with_transport(mock)
            .unwrap();

        tracing::subscriber::with_default(subscriber, || {
            c.current_user().unwrap();
        });

        let logs = String::from_utf8(captured.0.lock().unwrap().clone()).unwrap();
        assert!(logs.contains("sending request"));
        assert!(logs.contains("retrying request"));
        assert!(logs.contains("web_session"));
        assert!(!logs.contains("s3cr3t-value"));
        assert!(!logs.contains("abc123"));
    }
}
