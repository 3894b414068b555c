//! User API.
//!
//! Endpoints:
//! - `GET /api/sns/web/v2/user/me` — logged-in user
//! - `GET /api/sns/web/v1/user/otherinfo?target_user_id=...` — any user
//!
//! Response JSON (`data` of the envelope):
//! ```json
//! {
//!   "user_id": "5f1a...",
//!   "nickname": "...",
//!   "images": "https://sns-avatar-qc.xhscdn.com/avatar/...",
//!   "desc": "...",
//!   "gender": 2
//! }
//! ```
//!
//! The profile endpoint nests the identity under `basic_info` and reports
//! counters in an `interactions` list; see [`decode::profile`].

use crate::async_client::AsyncXhsClient;
use crate::client::XhsClient;
use crate::decode;
use crate::error::Result;
use crate::request::{Call, RequestDescriptor, USER_ME, USER_PROFILE, require};
use crate::types::User;

pub(crate) fn current_user() -> Call<User> {
    Call {
        descriptor: RequestDescriptor::get(USER_ME),
        decode: decode::user,
    }
}

pub(crate) fn user_profile(user_id: &str) -> Result<Call<User>> {
    require("user_id", user_id)?;
    Ok(Call {
        descriptor: RequestDescriptor::get(USER_PROFILE).query("target_user_id", user_id),
        decode: decode::profile,
    })
}

impl XhsClient {
    /// Fetch the user owning the session cookie.
    ///
    /// # Errors
    ///
    /// - [`XhsError::Auth`](crate::XhsError::Auth) — cookie expired or invalid
    /// - [`XhsError::Network`](crate::XhsError::Network) — after retries
    pub fn current_user(&self) -> Result<User> {
        self.run(current_user())
    }

    /// Fetch another user's public profile.
    pub fn user_profile(&self, user_id: &str) -> Result<User> {
        self.run(user_profile(user_id)?)
    }
}

impl AsyncXhsClient {
    /// Async [`XhsClient::current_user`].
    pub async fn current_user(&self) -> Result<User> {
        self.run(current_user()).await
    }

    /// Async [`XhsClient::user_profile`].
    pub async fn user_profile(&self, user_id: &str) -> Result<User> {
        self.run(user_profile(user_id)?).await
    }
}
