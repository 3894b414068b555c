//! Tolerant JSON → entity decoding.
//!
//! The service sends the same attribute under different names depending on
//! the endpoint, and sends counters either as numbers or as abbreviated
//! strings (`"1.2k"`, `"3.4万"`). Each entity therefore has a table of
//! candidate keys per attribute, tried in order; the first key holding a
//! usable value wins. Nothing here fails: absent or unusable attributes
//! decode to their defaults.

use crate::types::{Comment, CommentPage, Note, NoteDetail, SearchResult, User};
use chrono::{DateTime, Utc};
use serde_json::Value;

/// Candidate keys for [`User`] attributes.
pub mod user_keys {
    pub const ID: &[&str] = &["user_id", "userId", "id"];
    pub const NICKNAME: &[&str] = &["nickname", "nick_name", "name"];
    pub const AVATAR: &[&str] = &["avatar", "image", "images"];
    pub const DESCRIPTION: &[&str] = &["desc", "description"];
    pub const GENDER: &[&str] = &["gender"];
    pub const FOLLOWERS: &[&str] = &["fans", "followers"];
    pub const FOLLOWING: &[&str] = &["follows", "following"];
    pub const NOTES: &[&str] = &["notes", "notes_count"];
    pub const LIKED: &[&str] = &["liked", "liked_count"];
    pub const COLLECTED: &[&str] = &["collected", "collected_count"];
    pub const VERIFIED: &[&str] = &["verified", "is_verified"];
    pub const LEVEL: &[&str] = &["level"];
}

/// Candidate keys for [`Note`] / [`NoteDetail`] attributes.
pub mod note_keys {
    pub const ID: &[&str] = &["note_id", "id"];
    pub const TITLE: &[&str] = &["title", "display_title"];
    pub const DESCRIPTION: &[&str] = &["desc", "description"];
    pub const AUTHOR: &[&str] = &["user", "author", "user_info"];
    pub const LIKES: &[&str] = &["liked_count", "likes_count", "likes"];
    pub const COMMENTS: &[&str] = &["comment_count", "comments_count", "comments"];
    pub const COLLECTS: &[&str] = &["collected_count", "collects"];
    pub const SHARES: &[&str] = &["shared_count", "share_count", "shares"];
    pub const TAGS: &[&str] = &["tags", "tag_list"];
    pub const TIME: &[&str] = &["time"];
    pub const TYPE: &[&str] = &["type"];
    pub const XSEC_TOKEN: &[&str] = &["xsec_token"];
    pub const IMAGE_URL: &[&str] = &["url_default", "urlDefault", "url"];
    pub const CONTENT: &[&str] = &["desc", "content"];
    pub const UPDATED: &[&str] = &["last_update_time"];
    pub const LOCATION: &[&str] = &["location", "ip_location"];
    pub const LIKED: &[&str] = &["liked"];
    pub const COLLECTED: &[&str] = &["collected"];
}

/// Candidate keys for [`Comment`] attributes.
pub mod comment_keys {
    pub const ID: &[&str] = &["id", "comment_id"];
    pub const CONTENT: &[&str] = &["content"];
    pub const USER: &[&str] = &["user_info", "user"];
    pub const TIME: &[&str] = &["create_time"];
    pub const LIKES: &[&str] = &["like_count", "likes"];
    pub const SUB_COMMENTS: &[&str] = &["sub_comments"];
    pub const IS_AUTHOR: &[&str] = &["is_author"];
    pub const LIKED: &[&str] = &["liked", "is_liked"];
}

/// First candidate whose value satisfies `usable`.
fn pick<'a>(v: &'a Value, keys: &[&str], usable: fn(&Value) -> bool) -> Option<&'a Value> {
    keys.iter().filter_map(|k| v.get(*k)).find(|x| usable(x))
}

fn is_scalar(v: &Value) -> bool {
    v.is_string() || v.is_number()
}

fn is_object(v: &Value) -> bool {
    v.is_object()
}

fn is_array(v: &Value) -> bool {
    v.is_array()
}

fn is_present(v: &Value) -> bool {
    !v.is_null()
}

fn text(v: &Value, keys: &[&str]) -> String {
    match pick(v, keys, is_scalar) {
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
        None => String::new(),
    }
}

fn count(v: &Value, keys: &[&str]) -> u64 {
    pick(v, keys, is_scalar).map_or(0, count_value)
}

fn flag(v: &Value, keys: &[&str]) -> bool {
    match pick(v, keys, is_present) {
        Some(Value::Bool(b)) => *b,
        Some(Value::Number(n)) => n.as_f64().is_some_and(|f| f != 0.0),
        Some(Value::String(s)) => matches!(s.as_str(), "true" | "1"),
        _ => false,
    }
}

fn millis(v: &Value, keys: &[&str]) -> Option<DateTime<Utc>> {
    let raw = pick(v, keys, is_scalar)?;
    let ms = match raw {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }?;
    DateTime::from_timestamp_millis(ms)
}

fn array<'a>(v: &'a Value, keys: &[&str]) -> &'a [Value] {
    pick(v, keys, is_array)
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default()
}

/// Normalise a JSON counter: numbers pass through (floats truncated,
/// negatives become 0), strings go through [`parse_count`].
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn count_value(v: &Value) -> u64 {
    match v {
        Value::Number(n) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| *f > 0.0).map(|f| f as u64))
            .unwrap_or(0),
        Value::String(s) => parse_count(s),
        _ => 0,
    }
}

/// Parse an abbreviated counter string.
///
/// - `,` separators and a trailing `+` are ignored
/// - `k`/`K` multiplies by 1 000, `w`/`W`/`万` by 10 000
/// - fractional input is multiplied exactly; the remainder below one unit
///   is truncated (`"1.2345k"` → 1234)
/// - anything else yields 0
pub fn parse_count(raw: &str) -> u64 {
    let cleaned: String = raw.trim().chars().filter(|c| *c != ',').collect();
    let s = cleaned.trim_end_matches('+').trim_end();

    let (number, multiplier) = if let Some(n) = s.strip_suffix(|c: char| c == 'k' || c == 'K') {
        (n, 1_000)
    } else if let Some(n) = s.strip_suffix(|c: char| matches!(c, 'w' | 'W' | '万')) {
        (n, 10_000)
    } else {
        (s, 1)
    };
    scale_decimal(number.trim(), multiplier).unwrap_or(0)
}

/// Exact `decimal * multiplier`, truncated.
fn scale_decimal(number: &str, multiplier: u64) -> Option<u64> {
    let (whole, frac) = number.split_once('.').unwrap_or((number, ""));
    if whole.is_empty() && frac.is_empty() {
        return None;
    }
    if !whole.bytes().chain(frac.bytes()).all(|b| b.is_ascii_digit()) {
        return None;
    }

    let whole: u64 = if whole.is_empty() { 0 } else { whole.parse().ok()? };
    let mut value = whole.checked_mul(multiplier)?;

    // Digits past the 18th cannot change a truncated result for the
    // multipliers in use.
    let frac = &frac[..frac.len().min(18)];
    if !frac.is_empty() {
        let digits: u128 = frac.parse().ok()?;
        let denom = 10u128.pow(u32::try_from(frac.len()).ok()?);
        let part = u64::try_from(digits * u128::from(multiplier) / denom).ok()?;
        value = value.checked_add(part)?;
    }
    Some(value)
}

/// Decode a user record.
pub fn user(v: &Value) -> User {
    use user_keys as k;
    User {
        user_id: text(v, k::ID),
        nickname: text(v, k::NICKNAME),
        avatar: text(v, k::AVATAR),
        description: text(v, k::DESCRIPTION),
        gender: u8::try_from(count(v, k::GENDER)).unwrap_or(0),
        followers: count(v, k::FOLLOWERS),
        following: count(v, k::FOLLOWING),
        notes_count: count(v, k::NOTES),
        liked_count: count(v, k::LIKED),
        collected_count: count(v, k::COLLECTED),
        is_verified: flag(v, k::VERIFIED),
        level: pick(v, k::LEVEL, is_present).cloned(),
    }
}

/// Decode the other-user profile payload.
///
/// Profiles nest the identity under `basic_info` and send follower counts
/// as an `interactions` list of `{type, count}`; flat user objects decode
/// as in [`user`].
pub fn profile(payload: &Value) -> User {
    let mut u = user(
        payload
            .get("basic_info")
            .filter(|b| is_object(b))
            .unwrap_or(payload),
    );
    if u.user_id.is_empty() {
        u.user_id = text(payload, user_keys::ID);
    }
    for entry in array(payload, &["interactions"]) {
        let n = count(entry, &["count"]);
        match text(entry, &["type"]).as_str() {
            "fans" => u.followers = n,
            "follows" => u.following = n,
            "interaction" => u.liked_count = n,
            _ => {}
        }
    }
    u
}

/// Counter from `interact_info` if present there, else from the note itself.
fn interaction(v: &Value, keys: &[&str]) -> u64 {
    v.get("interact_info")
        .filter(|i| is_object(i))
        .and_then(|i| pick(i, keys, is_scalar))
        .or_else(|| pick(v, keys, is_scalar))
        .map_or(0, count_value)
}

fn interaction_flag(v: &Value, keys: &[&str]) -> bool {
    flag(v, keys) || v.get("interact_info").is_some_and(|i| flag(i, keys))
}

fn image_urls(v: &Value) -> Vec<String> {
    use note_keys::IMAGE_URL;

    let urls: Vec<String> = if let Some(list) = v.get("image_list").and_then(Value::as_array) {
        list.iter().map(|img| text(img, IMAGE_URL)).collect()
    } else if let Some(list) = v.get("images_list").and_then(Value::as_array) {
        list.iter().map(|img| text(img, &["url"])).collect()
    } else if let Some(list) = v.get("images").and_then(Value::as_array) {
        list.iter()
            .map(|img| match img {
                Value::String(s) => s.clone(),
                other => text(other, IMAGE_URL),
            })
            .collect()
    } else if let Some(cover) = v.get("cover").filter(|c| is_object(c)) {
        vec![text(cover, IMAGE_URL)]
    } else {
        Vec::new()
    };
    urls.into_iter().filter(|u| !u.is_empty()).collect()
}

fn tags(v: &Value) -> Vec<String> {
    array(v, note_keys::TAGS)
        .iter()
        .map(|t| match t {
            Value::String(s) => s.clone(),
            other => text(other, &["name"]),
        })
        .filter(|t| !t.is_empty())
        .collect()
}

/// Decode a note object (the `note_card` body, or a flat note).
pub fn note(v: &Value) -> Note {
    use note_keys as k;
    let note_type = text(v, k::TYPE);
    Note {
        note_id: text(v, k::ID),
        title: text(v, k::TITLE),
        description: text(v, k::DESCRIPTION),
        author: pick(v, k::AUTHOR, is_object).map(user).unwrap_or_default(),
        images: image_urls(v),
        video: pick(v, &["video"], is_present).cloned(),
        likes: interaction(v, k::LIKES),
        comments: interaction(v, k::COMMENTS),
        collects: interaction(v, k::COLLECTS),
        shares: interaction(v, k::SHARES),
        tags: tags(v),
        created_at: millis(v, k::TIME),
        note_type: if note_type.is_empty() {
            "normal".to_owned()
        } else {
            note_type
        },
        xsec_token: text(v, k::XSEC_TOKEN),
    }
}

/// Decode a search or feed item, unwrapping its `note_card`.
///
/// The item's own `id` and `xsec_token` take precedence over the card's.
pub fn note_item(item: &Value) -> Note {
    let Some(card) = item.get("note_card").filter(|c| is_object(c)) else {
        return note(item);
    };
    let mut n = note(card);
    let id = text(item, note_keys::ID);
    if !id.is_empty() {
        n.note_id = id;
    }
    let token = text(item, note_keys::XSEC_TOKEN);
    if !token.is_empty() {
        n.xsec_token = token;
    }
    n
}

/// Decode the note-feed payload: `items[0]` (or the payload itself).
pub fn note_detail(payload: &Value) -> NoteDetail {
    use note_keys as k;
    let item = payload
        .get("items")
        .and_then(Value::as_array)
        .and_then(|items| items.first())
        .unwrap_or(payload);
    let card = item
        .get("note_card")
        .filter(|c| is_object(c))
        .unwrap_or(item);

    NoteDetail {
        note: note_item(item),
        content: text(card, k::CONTENT),
        updated_at: millis(card, k::UPDATED),
        location: pick(card, k::LOCATION, is_present).cloned(),
        is_liked: interaction_flag(card, k::LIKED),
        is_collected: interaction_flag(card, k::COLLECTED),
    }
}

/// Decode the home-feed payload.
pub fn feed(payload: &Value) -> Vec<Note> {
    array(payload, &["items"]).iter().map(note_item).collect()
}

/// Decode the search payload.
pub fn search_result(payload: &Value) -> SearchResult {
    let notes: Vec<Note> = feed(payload);
    let total = pick(payload, &["total"], is_scalar).map_or(notes.len() as u64, count_value);
    SearchResult {
        total,
        has_more: flag(payload, &["has_more"]),
        notes,
    }
}

/// Decode a comment and, recursively, its replies.
pub fn comment(v: &Value) -> Comment {
    use comment_keys as k;
    Comment {
        comment_id: text(v, k::ID),
        content: text(v, k::CONTENT),
        user: pick(v, k::USER, is_object).map(user).unwrap_or_default(),
        created_at: millis(v, k::TIME),
        likes: count(v, k::LIKES),
        sub_comments: array(v, k::SUB_COMMENTS).iter().map(comment).collect(),
        is_author: flag(v, k::IS_AUTHOR),
        is_liked: flag(v, k::LIKED),
    }
}

/// Decode one page of comments.
pub fn comment_page(payload: &Value) -> CommentPage {
    let comments: Vec<Comment> = array(payload, &["comments"]).iter().map(comment).collect();
    let total = pick(payload, &["total"], is_scalar).map_or(comments.len() as u64, count_value);
    CommentPage {
        cursor: text(payload, &["cursor"]),
        has_more: flag(payload, &["has_more"]),
        total,
        comments,
    }
}

/// Decode the comment-post payload (`comment`, or the payload itself).
pub fn posted_comment(payload: &Value) -> Comment {
    comment(
        payload
            .get("comment")
            .filter(|c| is_object(c))
            .unwrap_or(payload),
    )
}
