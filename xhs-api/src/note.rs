//! Note API: search, home feed, and note detail.
//!
//! All three are signed `POST`s. Endpoints:
//!
//! | Operation | Endpoint | `x-s-common` |
//! |-----------|----------|--------------|
//! | search    | `/api/sns/web/v1/search/notes` | no |
//! | home feed | `/api/sns/web/v1/homefeed` | no |
//! | detail    | `/api/sns/web/v1/feed` | yes |
//!
//! Search and feed respond with a list of items wrapping a `note_card`:
//!
//! ```json
//! {
//!   "has_more": true,
//!   "items": [
//!     {
//!       "id": "64f0...",
//!       "xsec_token": "AB...",
//!       "model_type": "note",
//!       "note_card": {
//!         "display_title": "...",
//!         "type": "normal",
//!         "user": { "user_id": "...", "nickname": "..." },
//!         "interact_info": { "liked_count": "1.2k" },
//!         "cover": { "url_default": "https://..." }
//!       }
//!     }
//!   ]
//! }
//! ```
//!
//! Detail uses the same shape with a single item whose card also carries
//! `desc`, `image_list`, `tag_list`, `time` and `last_update_time`.

use crate::async_client::AsyncXhsClient;
use crate::client::XhsClient;
use crate::decode;
use crate::error::{Result, XhsError};
use crate::request::{Call, HOME_FEED, NOTE_FEED, RequestDescriptor, SEARCH_NOTES, require};
use crate::types::{Note, NoteDetail, NoteTypeFilter, SearchResult, SortOrder};
use chrono::Utc;
use rand::Rng;
use serde_json::json;

/// Largest page a search accepts.
pub const MAX_SEARCH_LIMIT: u32 = 100;

const IMAGE_FORMATS: [&str; 3] = ["jpg", "webp", "avif"];

pub(crate) fn search_notes(
    keyword: &str,
    limit: u32,
    sort: SortOrder,
    note_type: NoteTypeFilter,
) -> Result<Call<SearchResult>> {
    require("keyword", keyword)?;
    if !(1..=MAX_SEARCH_LIMIT).contains(&limit) {
        return Err(XhsError::Validation(format!(
            "limit must be between 1 and {MAX_SEARCH_LIMIT}, got {limit}"
        )));
    }

    let body = json!({
        "keyword": keyword,
        "page": 1,
        "page_size": limit,
        "search_id": search_id(),
        "sort": sort.as_str(),
        "note_type": note_type as u8,
        "ext_flags": [],
        "geo": "",
        "image_formats": image_formats_string(),
    });
    Ok(Call {
        descriptor: RequestDescriptor::post(SEARCH_NOTES, body).signed(),
        decode: decode::search_result,
    })
}

pub(crate) fn home_feed() -> Call<Vec<Note>> {
    let body = json!({
        "category": "homefeed_recommend",
        "cursor_score": "",
        "image_formats": image_formats_string(),
        "need_filter_image": false,
        "need_num": 8,
        "num": 18,
        "note_index": 33,
        "refresh_type": 1,
        "search_key": "",
        "unread_begin_note_id": "",
        "unread_end_note_id": "",
        "unread_note_count": 0,
    });
    Call {
        descriptor: RequestDescriptor::post(HOME_FEED, body).signed(),
        decode: decode::feed,
    }
}

pub(crate) fn note_detail(note_id: &str, xsec_token: &str) -> Result<Call<NoteDetail>> {
    require("note_id", note_id)?;
    require("xsec_token", xsec_token)?;

    let body = json!({
        "source_note_id": note_id,
        "image_formats": IMAGE_FORMATS,
        "extra": { "need_body_topic": "1" },
        "xsec_source": "pc_feed",
        "xsec_token": xsec_token,
    });
    Ok(Call {
        descriptor: RequestDescriptor::post(NOTE_FEED, body)
            .signed()
            .with_common(),
        decode: decode::note_detail,
    })
}

/// `["jpg","webp","avif"]` as a compact JSON string; search and feed send
/// the list pre-serialised.
fn image_formats_string() -> String {
    format!(
        "[{}]",
        IMAGE_FORMATS
            .iter()
            .map(|f| format!("\"{f}\""))
            .collect::<Vec<_>>()
            .join(",")
    )
}

/// Fresh search session ID: base-36 of `(unix_millis << 64) + random`.
fn search_id() -> String {
    let millis = u128::try_from(Utc::now().timestamp_millis()).unwrap_or(0);
    let salt = u128::from(rand::rng().random_range(0..2_147_483_646_u32));
    base36((millis << 64) + salt)
}

#[allow(clippy::cast_possible_truncation)]
fn base36(mut n: u128) -> String {
    const DIGITS: &[u8; 36] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ";
    if n == 0 {
        return "0".to_owned();
    }
    let mut out = Vec::new();
    while n > 0 {
        out.push(char::from(DIGITS[(n % 36) as usize]));
        n /= 36;
    }
    out.iter().rev().collect()
}

impl XhsClient {
    /// Search notes by keyword.
    ///
    /// Returns the first page (`limit` items at most).
    ///
    /// # Errors
    ///
    /// - [`XhsError::Validation`] — empty keyword or `limit` outside `1..=100`
    /// - [`XhsError::Signature`] — signer failed
    /// - [`XhsError::Auth`] — cookie expired
    pub fn search_notes(
        &self,
        keyword: &str,
        limit: u32,
        sort: SortOrder,
        note_type: NoteTypeFilter,
    ) -> Result<SearchResult> {
        self.run(search_notes(keyword, limit, sort, note_type)?)
    }

    /// Fetch the recommended home feed.
    pub fn home_feed(&self) -> Result<Vec<Note>> {
        self.run(home_feed())
    }

    /// Fetch a note's full content.
    ///
    /// `xsec_token` is the token the note was delivered with
    /// ([`Note::xsec_token`]).
    pub fn note_detail(&self, note_id: &str, xsec_token: &str) -> Result<NoteDetail> {
        self.run(note_detail(note_id, xsec_token)?)
    }
}

impl AsyncXhsClient {
    /// Async [`XhsClient::search_notes`].
    pub async fn search_notes(
        &self,
        keyword: &str,
        limit: u32,
        sort: SortOrder,
        note_type: NoteTypeFilter,
    ) -> Result<SearchResult> {
        self.run(search_notes(keyword, limit, sort, note_type)?).await
    }

    /// Async [`XhsClient::home_feed`].
    pub async fn home_feed(&self) -> Result<Vec<Note>> {
        self.run(home_feed()).await
    }

    /// Async [`XhsClient::note_detail`].
    pub async fn note_detail(&self, note_id: &str, xsec_token: &str) -> Result<NoteDetail> {
        self.run(note_detail(note_id, xsec_token)?).await
    }
}
