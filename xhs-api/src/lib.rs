//! Xiaohongshu (小红书) web API client library.
//!
//! Provides authenticated access to the `edith.xiaohongshu.com` web API:
//! current user and profiles, note search, home feed, note detail, comment
//! pages and comment posting, over a blocking ([`XhsClient`]) or async
//! ([`AsyncXhsClient`]) client.
//!
//! # Authentication
//!
//! Calls are authorised by the cookie of a logged-in browser session
//! (`a1`, `web_session`, ...). Write endpoints and most reads additionally
//! need per-request `x-s` / `x-t` signatures produced by the site's own
//! signing script; supply it through [`ClientConfig::sign_script`] (run with
//! `node`) or plug in any [`SignatureProvider`].
//!
//! ```no_run
//! use xhs_api::{ClientBuilder, ClientConfig, Credential, NoteTypeFilter, SortOrder};
//!
//! // Persist the cookie once
//! Credential::parse("a1=...; web_session=...")?.save()?;
//!
//! // Later: pick it up from XHS_COOKIE or the saved session
//! let client = ClientBuilder::discover()?
//!     .config(ClientConfig::default().with_sign_script("vendor/xhs_sign.js"))
//!     .build()?;
//!
//! let found = client.search_notes("咖啡", 20, SortOrder::Hot, NoteTypeFilter::All)?;
//! for note in &found.notes {
//!     let detail = client.note_detail(&note.note_id, &note.xsec_token)?;
//!     println!("{}: {}", detail.note.title, detail.content);
//! }
//! # Ok::<(), xhs_api::XhsError>(())
//! ```
//!
//! # API endpoint mapping
//!
//! | Method                        | Endpoint                          | Signed |
//! |-------------------------------|-----------------------------------|--------|
//! | [`XhsClient::current_user`]   | `GET /api/sns/web/v2/user/me`     | no     |
//! | [`XhsClient::user_profile`]   | `GET /api/sns/web/v1/user/otherinfo` | no  |
//! | [`XhsClient::search_notes`]   | `POST /api/sns/web/v1/search/notes` | yes  |
//! | [`XhsClient::home_feed`]      | `POST /api/sns/web/v1/homefeed`   | yes    |
//! | [`XhsClient::note_detail`]    | `POST /api/sns/web/v1/feed`       | yes, + `x-s-common` |
//! | [`XhsClient::comments`]       | `GET /api/sns/web/v2/comment/page` | no    |
//! | [`XhsClient::post_comment`]   | `POST /api/sns/web/v1/comment/post` | yes, + `x-s-common` |
//!
//! [`AsyncXhsClient`] has the same methods, plus
//! [`snapshot`](AsyncXhsClient::snapshot) and the [`fanout`] helpers for
//! concurrent calls.
//!
//! # Errors and retries
//!
//! Every method returns [`Result`]. Network failures, HTTP 5xx, rate limits
//! and transient API codes are retried with linear backoff
//! ([`ClientConfig::max_retries`], [`ClientConfig::retry_delay`]); see
//! [`XhsError::is_retryable`].

pub mod async_client;
pub mod auth;
pub mod client;
mod comment;
pub mod config;
pub mod decode;
pub mod envelope;
pub mod error;
pub mod fanout;
mod note;
mod request;
mod retry;
pub mod sign;
pub mod transport;
pub mod types;
mod user;

pub use async_client::{AsyncXhsClient, Snapshot};
pub use auth::Credential;
pub use client::{ClientBuilder, XhsClient};
pub use comment::MAX_COMMENT_CHARS;
pub use config::ClientConfig;
pub use error::{Result, XhsError};
pub use fanout::FanOut;
pub use note::MAX_SEARCH_LIMIT;
pub use retry::RetryPolicy;
pub use sign::{ScriptSigner, SignaturePair, SignatureProvider};
pub use types::{
    Comment, CommentPage, Note, NoteDetail, NoteTypeFilter, SearchResult, SortOrder, User,
};
