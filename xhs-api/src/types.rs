//! Data types for Xiaohongshu API responses.
//!
//! These are value objects decoded from the raw JSON payloads by
//! [`decode`](crate::decode). The service names the same attribute
//! differently depending on the endpoint (`id` vs `note_id`, `fans` vs
//! `followers`); the Rust types carry one canonical name per attribute.
//! Missing attributes decode to empty strings, zero, `false`, empty lists or
//! `None`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A user account.
///
/// Returned by [`XhsClient::current_user`](crate::XhsClient::current_user)
/// and embedded by value as the author of every [`Note`] and [`Comment`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct User {
    /// Xiaohongshu user ID (24 hex chars).
    pub user_id: String,
    /// Display name.
    pub nickname: String,
    /// Avatar image URL.
    pub avatar: String,
    /// Profile bio.
    pub description: String,
    /// `0` unknown, `1` male, `2` female.
    pub gender: u8,
    pub followers: u64,
    pub following: u64,
    pub notes_count: u64,
    /// Likes received across all notes.
    pub liked_count: u64,
    /// Collections received across all notes.
    pub collected_count: u64,
    pub is_verified: bool,
    /// Raw level object, if the endpoint sends one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub level: Option<Value>,
}

/// A note as it appears in search results and feeds.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Note {
    pub note_id: String,
    pub title: String,
    /// Preview text (`desc`).
    pub description: String,
    pub author: User,
    /// Image URLs, cover first.
    pub images: Vec<String>,
    /// Raw video object; `Some` only for video notes.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub video: Option<Value>,
    pub likes: u64,
    pub comments: u64,
    pub collects: u64,
    pub shares: u64,
    pub tags: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    /// `normal` or `video`.
    pub note_type: String,
    /// Access token the note was delivered with; pass it to
    /// [`note_detail`](crate::XhsClient::note_detail) and
    /// [`comments`](crate::XhsClient::comments).
    pub xsec_token: String,
}

/// A note with its full body and viewer-specific state.
///
/// Returned by [`XhsClient::note_detail`](crate::XhsClient::note_detail).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NoteDetail {
    #[serde(flatten)]
    pub note: Note,
    /// Full body text.
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
    /// Location as sent by the server (object or plain string).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<Value>,
    /// The logged-in user liked this note.
    pub is_liked: bool,
    /// The logged-in user collected this note.
    pub is_collected: bool,
}

/// A comment, with its first page of replies.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Comment {
    pub comment_id: String,
    pub content: String,
    pub user: User,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    pub likes: u64,
    pub sub_comments: Vec<Comment>,
    /// Written by the note's author.
    pub is_author: bool,
    /// Liked by the logged-in user.
    pub is_liked: bool,
}

/// One page of top-level comments.
///
/// Pass `cursor` back to [`comments`](crate::XhsClient::comments) while
/// `has_more` is `true`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CommentPage {
    pub comments: Vec<Comment>,
    pub cursor: String,
    pub has_more: bool,
    pub total: u64,
}

/// Search results.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    pub notes: Vec<Note>,
    pub total: u64,
    pub has_more: bool,
}

/// Search sort order, sent verbatim as the `sort` parameter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    #[default]
    General,
    Hot,
    Time,
}

impl SortOrder {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::General => "general",
            Self::Hot => "hot",
            Self::Time => "time",
        }
    }
}

/// Search note-type filter, mapped to the API `note_type` parameter.
///
/// | Variant  | API value |
/// |----------|-----------|
/// | `All`    | 0         |
/// | `Normal` | 1         |
/// | `Video`  | 2         |
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NoteTypeFilter {
    #[default]
    All = 0,
    Normal = 1,
    Video = 2,
}
