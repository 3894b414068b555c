//! Session credential: the browser cookie string.
//!
//! The cookie is copied from a logged-in browser session on
//! `www.xiaohongshu.com` (developer tools → Application → Cookies). The
//! pairs that matter most are `a1`, `webId` and `web_session`; the client
//! forwards every pair unchanged.
//!
//! A credential can be persisted to `~/.config/xhs-api/session.json`:
//!
//! ```json
//! { "cookie": "a1=...; webId=...; web_session=..." }
//! ```
//!
//! Cookie values never appear in `Debug` output or logs.

use crate::error::{Result, XhsError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

/// Environment variable read by [`Credential::from_env`].
pub const COOKIE_ENV: &str = "XHS_COOKIE";

/// Parsed session cookie.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential {
    raw: String,
    pairs: Vec<(String, String)>,
}

#[derive(Serialize, Deserialize)]
struct SessionFile {
    cookie: String,
}

impl Credential {
    /// Parse a raw `k1=v1; k2=v2` cookie string.
    ///
    /// Segments without `=` are ignored; values keep any further `=`.
    ///
    /// # Errors
    ///
    /// [`XhsError::Config`] if the string is empty or holds no `key=value`
    /// pair.
    pub fn parse(cookie: &str) -> Result<Self> {
        let raw = cookie.trim();
        if raw.is_empty() {
            return Err(XhsError::Config("cookie is required".into()));
        }
        let pairs: Vec<(String, String)> = raw
            .split(';')
            .filter_map(|seg| {
                let (k, v) = seg.trim().split_once('=')?;
                let k = k.trim();
                (!k.is_empty()).then(|| (k.to_owned(), v.trim().to_owned()))
            })
            .collect();
        if pairs.is_empty() {
            return Err(XhsError::Config("cookie has no key=value pairs".into()));
        }
        Ok(Self {
            raw: raw.to_owned(),
            pairs,
        })
    }

    /// The cookie exactly as supplied (trimmed). Passed to the signer.
    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// Parsed `(key, value)` pairs in original order.
    pub fn pairs(&self) -> &[(String, String)] {
        &self.pairs
    }

    /// Look up one cookie value by key.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Cookie keys only, safe to log.
    pub fn keys(&self) -> Vec<&str> {
        self.pairs.iter().map(|(k, _)| k.as_str()).collect()
    }

    /// Build the `cookie` HTTP header value from the parsed pairs.
    pub fn header_value(&self) -> String {
        self.pairs
            .iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect::<Vec<_>>()
            .join("; ")
    }

    /// Read the cookie from the `XHS_COOKIE` environment variable.
    ///
    /// Returns `None` if the variable is unset or empty.
    pub fn from_env() -> Option<Self> {
        let value = std::env::var(COOKIE_ENV).ok()?;
        Self::parse(&value).ok()
    }

    /// Load the cookie from `~/.config/xhs-api/session.json`.
    ///
    /// Returns `Ok(None)` if the file does not exist.
    pub fn load() -> Result<Option<Self>> {
        Self::load_from(&Self::path()?)
    }

    /// Load the cookie from an explicit session file.
    pub fn load_from(path: &Path) -> Result<Option<Self>> {
        if !path.exists() {
            return Ok(None);
        }
        let data = fs::read_to_string(path)?;
        let file: SessionFile = serde_json::from_str(&data)?;
        Self::parse(&file.cookie).map(Some)
    }

    /// Environment variable first, then the session file.
    pub fn discover() -> Result<Option<Self>> {
        if let Some(cred) = Self::from_env() {
            return Ok(Some(cred));
        }
        Self::load()
    }

    /// Save to `~/.config/xhs-api/session.json`, creating parent directories.
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let file = SessionFile {
            cookie: self.raw.clone(),
        };
        fs::write(path, serde_json::to_string_pretty(&file)?)?;
        Ok(())
    }

    /// Delete the session file.
    pub fn clear() -> Result<()> {
        let path = Self::path()?;
        if path.exists() {
            fs::remove_file(&path)?;
        }
        Ok(())
    }

    fn path() -> Result<PathBuf> {
        let config = dirs::config_dir()
            .ok_or_else(|| XhsError::Config("cannot determine config directory".into()))?;
        Ok(config.join("xhs-api").join("session.json"))
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("keys", &self.keys())
            .field("values", &"<redacted>")
            .finish()
    }
}
