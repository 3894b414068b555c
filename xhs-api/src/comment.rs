//! Comment API.
//!
//! Endpoints:
//! - `GET /api/sns/web/v2/comment/page` — one page of top-level comments
//! - `POST /api/sns/web/v1/comment/post` — signed, with `x-s-common`
//!
//! Page query: `note_id`, `cursor` (empty for the first page),
//! `top_comment_id`, `image_formats`, `xsec_token`.
//!
//! Page response (`data`):
//! ```json
//! {
//!   "cursor": "6650...",
//!   "has_more": true,
//!   "comments": [
//!     {
//!       "id": "6650...",
//!       "content": "...",
//!       "create_time": 1716000000000,
//!       "like_count": "12",
//!       "liked": false,
//!       "user_info": { "user_id": "...", "nickname": "..." },
//!       "sub_comments": [ ... ]
//!     }
//!   ]
//! }
//! ```
//!
//! Post response (`data`): `{ "comment": { ...same shape... }, "toast": "..." }`.

use crate::async_client::AsyncXhsClient;
use crate::client::XhsClient;
use crate::decode;
use crate::error::{Result, XhsError};
use crate::request::{COMMENT_PAGE, COMMENT_POST, Call, RequestDescriptor, require};
use crate::types::{Comment, CommentPage, User};
use serde_json::{Value, json};

/// Longest comment the server accepts, in characters.
pub const MAX_COMMENT_CHARS: usize = 500;

pub(crate) fn comments(note_id: &str, xsec_token: &str, cursor: &str) -> Result<Call<CommentPage>> {
    require("note_id", note_id)?;
    require("xsec_token", xsec_token)?;
    Ok(Call {
        descriptor: RequestDescriptor::get(COMMENT_PAGE)
            .query("note_id", note_id)
            .query("cursor", cursor)
            .query("top_comment_id", "")
            .query("image_formats", "jpg,webp,avif")
            .query("xsec_token", xsec_token),
        decode: decode::comment_page,
    })
}

pub(crate) fn post_comment(
    note_id: &str,
    content: &str,
    reply_to: Option<&str>,
    at_users: &[User],
) -> Result<Call<Comment>> {
    require("note_id", note_id)?;
    require("content", content)?;
    let chars = content.chars().count();
    if chars > MAX_COMMENT_CHARS {
        return Err(XhsError::Validation(format!(
            "content is {chars} characters, limit is {MAX_COMMENT_CHARS}"
        )));
    }

    let mentions: Vec<Value> = at_users
        .iter()
        .map(|u| json!({ "user_id": u.user_id, "nickname": u.nickname }))
        .collect();
    let mut body = json!({
        "note_id": note_id,
        "content": content,
        "at_users": mentions,
    });
    if let Some(target) = reply_to.filter(|t| !t.trim().is_empty()) {
        body["target_comment_id"] = json!(target);
    }

    Ok(Call {
        descriptor: RequestDescriptor::post(COMMENT_POST, body)
            .signed()
            .with_common(),
        decode: decode::posted_comment,
    })
}

impl XhsClient {
    /// Fetch one page of a note's comments.
    ///
    /// Pass an empty `cursor` for the first page, then
    /// [`CommentPage::cursor`] while [`CommentPage::has_more`].
    pub fn comments(&self, note_id: &str, xsec_token: &str, cursor: &str) -> Result<CommentPage> {
        self.run(comments(note_id, xsec_token, cursor)?)
    }

    /// Post a comment, or a reply when `reply_to` names a comment ID.
    ///
    /// # Errors
    ///
    /// - [`XhsError::Validation`] — empty content or more than 500 characters
    /// - [`XhsError::Api`] — rejected by the server (e.g. content review)
    pub fn post_comment(
        &self,
        note_id: &str,
        content: &str,
        reply_to: Option<&str>,
        at_users: &[User],
    ) -> Result<Comment> {
        self.run(post_comment(note_id, content, reply_to, at_users)?)
    }
}

impl AsyncXhsClient {
    /// Async [`XhsClient::comments`].
    pub async fn comments(
        &self,
        note_id: &str,
        xsec_token: &str,
        cursor: &str,
    ) -> Result<CommentPage> {
        self.run(comments(note_id, xsec_token, cursor)?).await
    }

    /// Async [`XhsClient::post_comment`].
    pub async fn post_comment(
        &self,
        note_id: &str,
        content: &str,
        reply_to: Option<&str>,
        at_users: &[User],
    ) -> Result<Comment> {
        self.run(post_comment(note_id, content, reply_to, at_users)?)
            .await
    }
}
