//! Authenticated request pipeline.
//!
//! Operations describe what they need as a [`RequestDescriptor`]; the
//! [`Pipeline`] turns it into a concrete [`HttpRequest`]:
//!
//! 1. Default headers (`content-type`, `user-agent`, `origin`, `referer`)
//! 2. `x-s` / `x-t` from the [`SignatureProvider`] when the descriptor is
//!    signed and carries a body
//! 3. `x-s-common` when the descriptor asks for it
//! 4. `cookie` rebuilt from the parsed credential
//! 5. `base_url + path`, percent-encoded query string, compact JSON body
//!
//! Responses go back through [`Pipeline::interpret`]: HTTP 5xx becomes
//! [`XhsError::Server`], everything else is unwrapped by
//! [`envelope::unwrap`](crate::envelope::unwrap). The send/sleep/retry loop
//! lives in the clients because that is the only part that differs between
//! blocking and async.

use crate::auth::Credential;
use crate::config::{ClientConfig, WEB_ORIGIN};
use crate::envelope;
use crate::error::{Result, XhsError};
use crate::retry::RetryPolicy;
use crate::sign::{SignatureProvider, SignaturePair};
use crate::transport::{HttpRequest, HttpResponse, Method};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;

pub const USER_ME: &str = "/api/sns/web/v2/user/me";
pub const USER_PROFILE: &str = "/api/sns/web/v1/user/otherinfo";
pub const SEARCH_NOTES: &str = "/api/sns/web/v1/search/notes";
pub const HOME_FEED: &str = "/api/sns/web/v1/homefeed";
pub const NOTE_FEED: &str = "/api/sns/web/v1/feed";
pub const COMMENT_PAGE: &str = "/api/sns/web/v2/comment/page";
pub const COMMENT_POST: &str = "/api/sns/web/v1/comment/post";

const CONTENT_TYPE: &str = "application/json;charset=UTF-8";

/// What one API call needs. Built fresh by every operation.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestDescriptor {
    pub method: Method,
    pub path: &'static str,
    pub query: Vec<(String, String)>,
    pub body: Option<Value>,
    /// Attach `x-s` / `x-t`.
    pub signed: bool,
    /// Attach `x-s-common`.
    pub common: bool,
}

impl RequestDescriptor {
    pub fn get(path: &'static str) -> Self {
        Self {
            method: Method::Get,
            path,
            query: Vec::new(),
            body: None,
            signed: false,
            common: false,
        }
    }

    pub fn post(path: &'static str, body: Value) -> Self {
        Self {
            method: Method::Post,
            body: Some(body),
            ..Self::get(path)
        }
    }

    #[must_use]
    pub fn query(mut self, key: &str, value: &str) -> Self {
        self.query.push((key.to_owned(), value.to_owned()));
        self
    }

    #[must_use]
    pub fn signed(mut self) -> Self {
        self.signed = true;
        self
    }

    #[must_use]
    pub fn with_common(mut self) -> Self {
        self.common = true;
        self
    }

    /// Signatures are only computed over a body.
    pub fn needs_signature(&self) -> bool {
        self.signed && self.body.is_some()
    }
}

/// A validated request plus the decoder for its payload.
///
/// Both clients execute the same `Call`s; see `user.rs`, `note.rs`,
/// `comment.rs`.
pub(crate) struct Call<T> {
    pub descriptor: RequestDescriptor,
    pub decode: fn(&Value) -> T,
}

/// Reject an empty (or whitespace-only) required parameter.
pub(crate) fn require(name: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(XhsError::Validation(format!("{name} must not be empty")));
    }
    Ok(())
}

/// Deferred signing, movable onto a blocking thread.
pub(crate) type SignJob = Box<dyn FnOnce() -> Result<SignaturePair> + Send>;

/// Everything both clients share: credential, config, signer, retry policy.
pub(crate) struct Pipeline {
    credential: Credential,
    config: ClientConfig,
    signer: Arc<dyn SignatureProvider>,
    retry: RetryPolicy,
}

impl Pipeline {
    pub fn new(
        credential: Credential,
        config: ClientConfig,
        signer: Arc<dyn SignatureProvider>,
    ) -> Self {
        let retry = RetryPolicy::from_config(&config);
        Self {
            credential,
            config,
            signer,
            retry,
        }
    }

    pub fn credential(&self) -> &Credential {
        &self.credential
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn retry(&self) -> &RetryPolicy {
        &self.retry
    }

    /// Sign on the current thread, if the descriptor needs it.
    pub fn sign(&self, descriptor: &RequestDescriptor) -> Result<Option<SignaturePair>> {
        match (descriptor.needs_signature(), &descriptor.body) {
            (true, Some(body)) => self
                .signer
                .sign(descriptor.path, body, self.credential.raw())
                .map(Some),
            _ => Ok(None),
        }
    }

    /// Owned signing closure for `spawn_blocking`, if the descriptor needs it.
    pub fn sign_job(&self, descriptor: &RequestDescriptor) -> Option<SignJob> {
        if !descriptor.needs_signature() {
            return None;
        }
        let signer = Arc::clone(&self.signer);
        let path = descriptor.path;
        let body = descriptor.body.clone().unwrap_or(Value::Null);
        let cookie = self.credential.raw().to_owned();
        Some(Box::new(move || signer.sign(path, &body, &cookie)))
    }

    /// Resolve a descriptor into a sendable request.
    pub fn build(
        &self,
        descriptor: &RequestDescriptor,
        signature: Option<&SignaturePair>,
    ) -> Result<HttpRequest> {
        let mut headers = vec![
            ("content-type".to_owned(), CONTENT_TYPE.to_owned()),
            ("user-agent".to_owned(), self.config.user_agent.clone()),
            ("origin".to_owned(), WEB_ORIGIN.to_owned()),
            ("referer".to_owned(), format!("{WEB_ORIGIN}/")),
        ];
        if let Some(sig) = signature {
            headers.push(("x-s".to_owned(), sig.x_s.clone()));
            headers.push(("x-t".to_owned(), sig.x_t.clone()));
        }
        if descriptor.common {
            headers.push(("x-s-common".to_owned(), self.config.common_token.clone()));
        }
        headers.push(("cookie".to_owned(), self.credential.header_value()));

        let body = descriptor
            .body
            .as_ref()
            .map(serde_json::to_string)
            .transpose()?;

        Ok(HttpRequest {
            method: descriptor.method,
            path: descriptor.path.to_owned(),
            url: self.url(descriptor),
            headers,
            body,
        })
    }

    fn url(&self, descriptor: &RequestDescriptor) -> String {
        let mut url = format!("{}{}", self.config.base_url, descriptor.path);
        if !descriptor.query.is_empty() {
            let qs = descriptor
                .query
                .iter()
                .map(|(k, v)| format!("{}={}", urlencoding::encode(k), urlencoding::encode(v)))
                .collect::<Vec<_>>()
                .join("&");
            url.push('?');
            url.push_str(&qs);
        }
        url
    }

    /// Classify a raw response and unwrap its envelope.
    pub fn interpret(&self, response: &HttpResponse) -> Result<Value> {
        if response.status >= 500 {
            return Err(XhsError::Server {
                status: response.status,
            });
        }
        envelope::unwrap(
            response.status,
            &response.body,
            self.config.rate_limit_backoff,
        )
    }

    pub fn log_request(&self, request: &HttpRequest, attempt: u32) {
        if !self.config.verbose {
            return;
        }
        let header_names: Vec<&str> = request.headers.iter().map(|(k, _)| k.as_str()).collect();
        tracing::debug!(
            method = %request.method,
            url = %request.url,
            attempt,
            signed = request.header("x-s").is_some(),
            headers = ?header_names,
            cookie_keys = ?self.credential.keys(),
            body_len = request.body.as_ref().map_or(0, String::len),
            "sending request"
        );
    }

    pub fn log_response(&self, request: &HttpRequest, response: &HttpResponse) {
        if !self.config.verbose {
            return;
        }
        tracing::debug!(
            url = %request.url,
            status = response.status,
            body_len = response.body.len(),
            "received response"
        );
    }

    pub fn log_retry(&self, path: &str, err: &XhsError, attempt: u32, delay: Duration) {
        tracing::warn!(
            path,
            attempt = attempt + 1,
            max_attempts = self.retry.max_attempts(),
            delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
            error = %err,
            "retrying request"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::Mutex;

    fn pipeline(signer: Arc<dyn SignatureProvider>) -> Pipeline {
        Pipeline::new(
            Credential::parse("a1=abc; web_session=s3cr3t").unwrap(),
            ClientConfig::default().with_base_url("http://mock"),
            signer,
        )
    }

    fn fixed_signer() -> Arc<dyn SignatureProvider> {
        Arc::new(|_: &str, _: &Value, _: &str| -> Result<SignaturePair> {
            Ok(SignaturePair {
                x_s: "XS".into(),
                x_t: "XT".into(),
            })
        })
    }

    #[test]
    fn signed_post_gets_signature_and_common_headers() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let seen2 = Arc::clone(&seen);
        let signer = Arc::new(move |path: &str, body: &Value, cookie: &str| -> Result<SignaturePair> {
            seen2
                .lock()
                .unwrap()
                .push((path.to_owned(), body.clone(), cookie.to_owned()));
            Ok(SignaturePair {
                x_s: "XS".into(),
                x_t: "XT".into(),
            })
        });
        let p = pipeline(signer);
        let d = RequestDescriptor::post(NOTE_FEED, json!({"source_note_id": "n1"}))
            .signed()
            .with_common();

        let sig = p.sign(&d).unwrap();
        let req = p.build(&d, sig.as_ref()).unwrap();

        assert_eq!(req.url, format!("http://mock{NOTE_FEED}"));
        assert_eq!(req.header("x-s"), Some("XS"));
        assert_eq!(req.header("x-t"), Some("XT"));
        assert!(req.header("x-s-common").is_some());
        assert_eq!(req.header("cookie"), Some("a1=abc; web_session=s3cr3t"));
        assert_eq!(req.body.as_deref(), Some(r#"{"source_note_id":"n1"}"#));

        let calls = seen.lock().unwrap();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].0, NOTE_FEED);
        assert_eq!(calls[0].1, json!({"source_note_id": "n1"}));
        assert_eq!(calls[0].2, "a1=abc; web_session=s3cr3t");
    }

    #[test]
    fn unsigned_get_skips_signer() {
        let signer = Arc::new(|_: &str, _: &Value, _: &str| -> Result<SignaturePair> {
            panic!("signer must not be called")
        });
        let p = pipeline(signer);
        let d = RequestDescriptor::get(COMMENT_PAGE)
            .query("note_id", "n1")
            .query("cursor", "")
            .query("image_formats", "jpg,webp,avif");
        assert!(p.sign(&d).unwrap().is_none());
        assert!(p.sign_job(&d).is_none());

        let req = p.build(&d, None).unwrap();
        assert_eq!(
            req.url,
            format!("http://mock{COMMENT_PAGE}?note_id=n1&cursor=&image_formats=jpg%2Cwebp%2Cavif")
        );
        assert!(req.header("x-s").is_none());
        assert!(req.header("x-s-common").is_none());
        assert!(req.body.is_none());
    }

    #[test]
    fn signed_without_body_is_not_signed() {
        let d = RequestDescriptor::get(USER_ME).signed();
        assert!(!d.needs_signature());
    }

    #[test]
    fn sign_job_runs_detached() {
        let p = pipeline(fixed_signer());
        let d = RequestDescriptor::post(HOME_FEED, json!({})).signed();
        let job = p.sign_job(&d).unwrap();
        let handle = std::thread::spawn(job);
        assert_eq!(handle.join().unwrap().unwrap().x_s, "XS");
    }

    #[test]
    fn interpret_maps_5xx_to_server_error() {
        let p = pipeline(fixed_signer());
        let err = p.interpret(&HttpResponse::new(503, "bad gateway")).unwrap_err();
        assert!(matches!(err, XhsError::Server { status: 503 }));

        let ok = p
            .interpret(&HttpResponse::json(&json!({"success": true, "data": {"x": 1}})))
            .unwrap();
        assert_eq!(ok, json!({"x": 1}));
    }
}
