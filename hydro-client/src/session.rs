//! Portal session cookies and their on-disk persistence.
//!
//! The session file is a JSON array of cookie objects at a single well-known
//! path. It is read once at client construction and rewritten after a
//! successful login; there is no locking (single-process tool).

use std::path::{Path, PathBuf};

use reqwest::header::{HeaderMap, SET_COOKIE};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::error::StorageError;

/// One cookie captured from the portal, in the shape it is persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionCookie {
    pub name: String,
    pub value: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    /// Informational only; expiry never triggers a re-login.
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "time::serde::rfc3339::option"
    )]
    pub expires: Option<OffsetDateTime>,
}

/// Accumulated authentication state: the cookies the portal handed back from
/// the login handshake. Empty means unauthenticated.
#[derive(Debug, Clone, Default)]
pub struct Session {
    cookies: Vec<SessionCookie>,
}

impl Session {
    pub fn new(cookies: Vec<SessionCookie>) -> Self {
        Self { cookies }
    }

    pub fn is_authenticated(&self) -> bool {
        !self.cookies.is_empty()
    }

    pub fn cookies(&self) -> &[SessionCookie] {
        &self.cookies
    }

    /// Render the `Cookie` request header, or `None` when unauthenticated.
    pub fn cookie_header(&self) -> Option<String> {
        if self.cookies.is_empty() {
            return None;
        }
        let pairs: Vec<String> = self
            .cookies
            .iter()
            .map(|c| format!("{}={}", c.name, c.value))
            .collect();
        Some(pairs.join("; "))
    }

    /// Capture every `Set-Cookie` header from a response, replacing cookies
    /// with the same name and appending new ones.
    pub fn absorb(&mut self, headers: &HeaderMap) {
        for value in headers.get_all(SET_COOKIE) {
            let Ok(raw) = value.to_str() else { continue };
            let Some(cookie) = parse_set_cookie(raw) else {
                continue;
            };
            match self.cookies.iter_mut().find(|c| c.name == cookie.name) {
                Some(existing) => *existing = cookie,
                None => self.cookies.push(cookie),
            }
        }
    }
}

/// Minimal `Set-Cookie` parsing: the name/value pair plus the handful of
/// attributes the session file records. Unknown attributes are ignored, as is
/// an expiry in a format we cannot read.
fn parse_set_cookie(raw: &str) -> Option<SessionCookie> {
    let mut parts = raw.split(';');

    let (name, value) = parts.next()?.split_once('=')?;
    let name = name.trim();
    if name.is_empty() {
        return None;
    }

    let mut cookie = SessionCookie {
        name: name.to_string(),
        value: value.trim().to_string(),
        domain: None,
        path: None,
        expires: None,
    };

    for attr in parts {
        let (key, val) = match attr.split_once('=') {
            Some((k, v)) => (k.trim(), v.trim()),
            None => continue,
        };
        if key.eq_ignore_ascii_case("domain") {
            cookie.domain = Some(val.to_string());
        } else if key.eq_ignore_ascii_case("path") {
            cookie.path = Some(val.to_string());
        } else if key.eq_ignore_ascii_case("expires") {
            cookie.expires =
                OffsetDateTime::parse(val, &time::format_description::well_known::Rfc2822).ok();
        }
    }

    Some(cookie)
}

/// Persists the cookie collection at a fixed local path.
#[derive(Debug)]
pub struct SessionStore {
    path: PathBuf,
}

impl SessionStore {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the persisted cookies. `None` when the file does not exist; any
    /// other I/O or decode fault is an error.
    pub fn load(&self) -> Result<Option<Vec<SessionCookie>>, StorageError> {
        let contents = match std::fs::read_to_string(&self.path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(StorageError::Io(e)),
        };
        let cookies: Vec<SessionCookie> = serde_json::from_str(&contents)?;
        Ok(Some(cookies))
    }

    /// Write the cookie collection, overwriting any prior content.
    pub fn save(&self, cookies: &[SessionCookie]) -> Result<(), StorageError> {
        let contents = serde_json::to_string_pretty(cookies)?;
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        std::fs::write(&self.path, contents)?;
        Ok(())
    }
}
