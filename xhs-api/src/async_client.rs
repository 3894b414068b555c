//! Async client.
//!
//! Same operations and pipeline as [`XhsClient`](crate::XhsClient); only
//! sending and sleeping differ. The signer is a blocking routine (often a
//! child process), so it runs on tokio's blocking pool.

use crate::auth::Credential;
use crate::config::ClientConfig;
use crate::error::{Result, XhsError};
use crate::fanout::FanOut;
use crate::request::{Call, Pipeline, RequestDescriptor};
use crate::sign::SignaturePair;
use crate::transport::AsyncTransport;
use crate::types::{Note, NoteTypeFilter, SearchResult, SortOrder, User};
use serde_json::Value;

/// Page size of the search in [`AsyncXhsClient::snapshot`].
pub const SNAPSHOT_SEARCH_LIMIT: u32 = 20;

/// Async client for the Xiaohongshu web API.
///
/// Build it with [`ClientBuilder::build_async`](crate::ClientBuilder::build_async).
/// Calls take `&self` and may run concurrently.
pub struct AsyncXhsClient {
    pipeline: Pipeline,
    transport: Box<dyn AsyncTransport>,
}

/// Results of [`AsyncXhsClient::snapshot`], one per operation.
#[derive(Debug)]
pub struct Snapshot {
    pub user: Result<User>,
    pub search: Result<SearchResult>,
    pub feed: Result<Vec<Note>>,
}

impl Snapshot {
    /// Number of operations that succeeded.
    pub fn succeeded(&self) -> usize {
        [self.user.is_ok(), self.search.is_ok(), self.feed.is_ok()]
            .into_iter()
            .filter(|ok| *ok)
            .count()
    }
}

impl AsyncXhsClient {
    pub(crate) fn from_parts(pipeline: Pipeline, transport: Box<dyn AsyncTransport>) -> Self {
        Self {
            pipeline,
            transport,
        }
    }

    pub fn credential(&self) -> &Credential {
        self.pipeline.credential()
    }

    pub fn config(&self) -> &ClientConfig {
        self.pipeline.config()
    }

    pub(crate) async fn execute(&self, descriptor: &RequestDescriptor) -> Result<Value> {
        let retry = *self.pipeline.retry();
        let mut attempt = 0;
        loop {
            match self.attempt(descriptor, attempt).await {
                Ok(data) => return Ok(data),
                Err(err) => {
                    let Some(delay) = retry.backoff(&err, attempt) else {
                        return Err(err);
                    };
                    self.pipeline
                        .log_retry(descriptor.path, &err, attempt, delay);
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
            }
        }
    }

    async fn attempt(&self, descriptor: &RequestDescriptor, attempt: u32) -> Result<Value> {
        let signature = self.sign(descriptor).await?;
        let request = self.pipeline.build(descriptor, signature.as_ref())?;
        self.pipeline.log_request(&request, attempt);
        let response = self.transport.send(&request).await?;
        self.pipeline.log_response(&request, &response);
        self.pipeline.interpret(&response)
    }

    async fn sign(&self, descriptor: &RequestDescriptor) -> Result<Option<SignaturePair>> {
        let Some(job) = self.pipeline.sign_job(descriptor) else {
            return Ok(None);
        };
        let pair = tokio::task::spawn_blocking(job)
            .await
            .map_err(|e| XhsError::Signature(format!("signer task failed: {e}")))??;
        Ok(Some(pair))
    }

    pub(crate) async fn run<T>(&self, call: Call<T>) -> Result<T> {
        let data = self.execute(&call.descriptor).await?;
        Ok((call.decode)(&data))
    }

    /// Fetch the current user, a search for `keyword` and the home feed
    /// concurrently.
    ///
    /// With [`FanOut::Partial`] every operation reports its own result and
    /// this never fails. With [`FanOut::FailFast`] the first error is
    /// returned and the other calls are dropped.
    pub async fn snapshot(&self, keyword: &str, mode: FanOut) -> Result<Snapshot> {
        let user = self.current_user();
        let search = self.search_notes(
            keyword,
            SNAPSHOT_SEARCH_LIMIT,
            SortOrder::General,
            NoteTypeFilter::All,
        );
        let feed = self.home_feed();

        match mode {
            FanOut::FailFast => {
                let (user, search, feed) = tokio::try_join!(user, search, feed)?;
                Ok(Snapshot {
                    user: Ok(user),
                    search: Ok(search),
                    feed: Ok(feed),
                })
            }
            FanOut::Partial => {
                let (user, search, feed) = tokio::join!(user, search, feed);
                Ok(Snapshot { user, search, feed })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ClientBuilder;
    use crate::fanout::{join_all, join_settled};
    use crate::request::{HOME_FEED, NOTE_FEED, SEARCH_NOTES, USER_ME, USER_PROFILE};
    use crate::transport::{HttpResponse, MockTransport};
    use serde_json::json;
    use std::time::Duration;
    use tokio::time::Instant;

    const COOKIE: &str = "a1=abc; web_session=s3cr3t";

    fn signer(path: &str, _: &Value, _: &str) -> Result<SignaturePair> {
        Ok(SignaturePair {
            x_s: format!("XYW_{}", path.len()),
            x_t: "1700000000000".into(),
        })
    }

    fn client(mock: &MockTransport, config: ClientConfig) -> AsyncXhsClient {
        ClientBuilder::new(COOKIE)
            .config(config.with_base_url("http://mock"))
            .signer(signer)
            .build_async_with_transport(mock.clone())
            .unwrap()
    }

    fn ok(data: &Value) -> Value {
        json!({"success": true, "code": 0, "msg": "成功", "data": data})
    }

    #[tokio::test(start_paused = true)]
    async fn server_errors_back_off_linearly() {
        let mock = MockTransport::new();
        mock.respond_always(USER_ME, Ok(HttpResponse::new(503, "")));
        let c = client(&mock, ClientConfig::default());

        let start = Instant::now();
        let err = c.current_user().await.unwrap_err();
        let elapsed = start.elapsed();

        assert!(matches!(err, XhsError::Server { status: 503 }));
        assert_eq!(mock.calls(USER_ME), 4);
        // 1s + 2s + 3s
        assert!(elapsed >= Duration::from_secs(6), "{elapsed:?}");
        assert!(elapsed < Duration::from_secs(7), "{elapsed:?}");
    }

    #[tokio::test(start_paused = true)]
    async fn rate_limit_waits_advised_backoff() {
        let mock = MockTransport::new();
        mock.respond(
            USER_ME,
            Ok(HttpResponse::json(&json!({"success": false, "code": 10003, "msg": "请求太频繁"}))),
        );
        mock.respond_json(USER_ME, &ok(&json!({"user_id": "u1"})));
        let c = client(&mock, ClientConfig::default());

        let start = Instant::now();
        let me = c.current_user().await.unwrap();
        assert_eq!(me.user_id, "u1");
        assert!(start.elapsed() >= Duration::from_secs(60));
        assert_eq!(mock.calls(USER_ME), 2);
    }

    #[tokio::test]
    async fn auth_error_single_call() {
        let mock = MockTransport::new();
        mock.respond_always(
            USER_ME,
            Ok(HttpResponse::json(&json!({"success": false, "code": 10002, "msg": "登录已过期"}))),
        );
        let c = client(&mock, ClientConfig::default());
        assert!(matches!(
            c.current_user().await,
            Err(XhsError::Auth { code: 10002, .. })
        ));
        assert_eq!(mock.calls(USER_ME), 1);
    }

    #[tokio::test]
    async fn signed_call_goes_through_blocking_signer() {
        let mock = MockTransport::new();
        mock.respond_json(
            NOTE_FEED,
            &ok(&json!({"items": [{"id": "n1", "note_card": {"title": "t", "desc": "body"}}]})),
        );
        let c = client(&mock, ClientConfig::default());

        let detail = c.note_detail("n1", "tok").await.unwrap();
        assert_eq!(detail.note.note_id, "n1");
        assert_eq!(detail.content, "body");

        let sent = mock.last(NOTE_FEED).unwrap();
        assert_eq!(sent.header("x-s"), Some(format!("XYW_{}", NOTE_FEED.len()).as_str()));
        assert_eq!(sent.header("x-t"), Some("1700000000000"));
        assert!(sent.header("x-s-common").is_some());
    }

    #[tokio::test]
    async fn validation_happens_before_io() {
        let mock = MockTransport::new();
        let c = client(&mock, ClientConfig::default());
        assert!(matches!(
            c.search_notes("咖啡", 0, SortOrder::General, NoteTypeFilter::All).await,
            Err(XhsError::Validation(_))
        ));
        assert!(matches!(
            c.comments("n1", "", "").await,
            Err(XhsError::Validation(_))
        ));
        assert!(mock.requests().is_empty());
    }

    fn snapshot_mock(feed_fails: bool) -> MockTransport {
        let mock = MockTransport::new();
        mock.respond_json(USER_ME, &ok(&json!({"user_id": "me"})));
        mock.respond_json(
            SEARCH_NOTES,
            &ok(&json!({"items": [{"id": "s1", "note_card": {"title": "hit"}}], "has_more": false})),
        );
        if feed_fails {
            mock.respond_json(HOME_FEED, &json!({"success": false, "code": 10001, "msg": "未登录"}));
        } else {
            mock.respond_json(HOME_FEED, &ok(&json!({"items": []})));
        }
        mock
    }

    #[tokio::test]
    async fn partial_snapshot_keeps_successes() {
        let mock = snapshot_mock(true);
        let c = client(&mock, ClientConfig::default());

        let snap = c.snapshot("咖啡", FanOut::Partial).await.unwrap();
        assert_eq!(snap.succeeded(), 2);
        assert_eq!(snap.user.as_ref().unwrap().user_id, "me");
        assert_eq!(snap.search.as_ref().unwrap().notes[0].note_id, "s1");
        assert!(matches!(snap.feed, Err(XhsError::Auth { .. })));
    }

    #[tokio::test]
    async fn fail_fast_snapshot_surfaces_error() {
        let mock = snapshot_mock(true);
        let c = client(&mock, ClientConfig::default());
        assert!(matches!(
            c.snapshot("咖啡", FanOut::FailFast).await,
            Err(XhsError::Auth { code: 10001, .. })
        ));

        let mock = snapshot_mock(false);
        let c = client(&mock, ClientConfig::default());
        let snap = c.snapshot("咖啡", FanOut::FailFast).await.unwrap();
        assert_eq!(snap.succeeded(), 3);
    }

    #[tokio::test]
    async fn fan_out_over_client_calls() {
        let mock = MockTransport::new();
        for id in ["a", "b"] {
            mock.respond(
                USER_PROFILE,
                Ok(HttpResponse::json(&ok(&json!({"user_id": id})))),
            );
        }
        mock.respond(
            USER_PROFILE,
            Ok(HttpResponse::json(&json!({"success": false, "code": 10001, "msg": "未登录"}))),
        );
        let c = client(&mock, ClientConfig::default());

        let users = join_all([c.user_profile("a"), c.user_profile("b")])
            .await
            .unwrap();
        let ids: Vec<&str> = users.iter().map(|u| u.user_id.as_str()).collect();
        assert_eq!(ids, ["a", "b"]);

        let settled = join_settled([c.user_profile("c"), c.user_profile("")]).await;
        assert!(matches!(settled[0], Err(XhsError::Auth { code: 10001, .. })));
        assert!(matches!(settled[1], Err(XhsError::Validation(_))));
        assert_eq!(mock.calls(USER_PROFILE), 3);

        let targets: Vec<String> = mock.requests().iter().map(|r| r.url.clone()).collect();
        assert!(targets[0].ends_with("target_user_id=a"));
        assert!(targets[1].ends_with("target_user_id=b"));
        assert!(targets[2].ends_with("target_user_id=c"));
    }
}
