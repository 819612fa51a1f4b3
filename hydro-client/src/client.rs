//! The session-authenticated portal client: login handshake, cookie replay
//! and the date-ranged CSV usage fetch.

use std::path::PathBuf;

use reqwest::header::COOKIE;
use reqwest::{redirect, Response, StatusCode};
use serde::Deserialize;
use time::OffsetDateTime;

use crate::domain::{UsageRecord, PORTAL_OFFSET};
use crate::error::{AuthError, ClientError, FetchError};
use crate::parse::parse_usage_csv;
use crate::range::{format_portal_date, DateRange};
use crate::session::{Session, SessionStore};

pub const DEFAULT_BASE_URL: &str = "https://apps.guelphhydro.com/AccountOnlineWeb";

/// The export variant that yields one CSV row per metered hour.
const USAGE_TYPE_RAW_VERTICAL: &str = "DownloadRawDataVertical";
const FRAMING_TOU: &str = "TOU";

/// Credentials and endpoints, passed in explicitly; the client never reads
/// the process environment itself.
#[derive(Debug, Clone, Deserialize)]
pub struct PortalConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    pub username: String,
    pub password: String,
    #[serde(default = "default_cookie_file")]
    pub cookie_file: PathBuf,
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_cookie_file() -> PathBuf {
    PathBuf::from("cookies.json")
}

#[derive(Debug)]
pub struct PortalClient {
    http: reqwest::Client,
    session: Session,
    store: SessionStore,
    config: PortalConfig,
}

/// Outcome of a rejected form POST, before it is attributed to login or to a
/// usage fetch.
enum PostFailure {
    Request(reqwest::Error),
    Status(StatusCode),
}

impl From<PostFailure> for AuthError {
    fn from(f: PostFailure) -> Self {
        match f {
            PostFailure::Request(e) => AuthError::RequestFailed(e),
            PostFailure::Status(s) => AuthError::InvalidStatus(s),
        }
    }
}

impl From<PostFailure> for FetchError {
    fn from(f: PostFailure) -> Self {
        match f {
            PostFailure::Request(e) => FetchError::RequestFailed(e),
            PostFailure::Status(s) => FetchError::InvalidStatus(s),
        }
    }
}

impl PortalClient {
    /// Build a client, restoring a persisted session if one exists and
    /// running the login handshake otherwise. A fresh session is persisted
    /// immediately.
    pub async fn connect(config: PortalConfig) -> Result<Self, ClientError> {
        // Redirects are not followed: the portal answers a successful login
        // with a 3xx carrying the session cookies, and the spec treats any
        // 2xx/3xx as success anyway.
        let http = reqwest::Client::builder()
            .redirect(redirect::Policy::none())
            .build()
            .map_err(ClientError::Http)?;

        let store = SessionStore::new(&config.cookie_file);
        let mut client = Self {
            http,
            session: Session::default(),
            store,
            config,
        };

        match client.store.load()? {
            Some(cookies) => {
                tracing::debug!(
                    path = %client.store.path().display(),
                    count = cookies.len(),
                    "restored persisted session"
                );
                client.session = Session::new(cookies);
            }
            None => client.login().await?,
        }

        Ok(client)
    }

    /// Run the login handshake and persist the resulting cookies,
    /// overwriting the current session. This is also the manual re-auth
    /// trigger: an expired session surfaces as `FetchError::InvalidStatus`
    /// and the caller decides whether to log in again.
    pub async fn login(&mut self) -> Result<(), ClientError> {
        let session = self.authenticate().await?;
        self.store.save(session.cookies())?;
        self.session = session;
        Ok(())
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    /// The login handshake proper. The portal returns no structured
    /// success/failure payload, so any 2xx/3xx response counts as
    /// authenticated, wrong credentials included. The cookies accumulated on
    /// the response are the entire authentication state.
    async fn authenticate(&self) -> Result<Session, AuthError> {
        let url = format!("{}/AccountOnlineCommand", self.config.base_url);
        let query = [("command", "login"), ("TokenID", "null"), ("Reset", "null")];
        let form = [
            ("acn", self.config.username.as_str()),
            ("pass", self.config.password.as_str()),
            ("Submit", "Sign-On"),
        ];

        let resp = self.post_form(&url, &query, &form).await?;

        let mut session = Session::default();
        // Redirects are not followed, so only cookies set on this first
        // response are captured; a cookie set on a later hop is never seen.
        session.absorb(resp.headers());
        tracing::info!(cookies = session.cookies().len(), "logged in to portal");
        Ok(session)
    }

    /// Issue a date-ranged usage query and return the raw CSV body.
    ///
    /// Requires an authenticated session; an expired one surfaces as
    /// `FetchError::InvalidStatus`, indistinguishable from an outage. No
    /// re-authentication is attempted here.
    pub async fn fetch_raw(
        &self,
        usage_type: &str,
        framing: &str,
        range: DateRange,
    ) -> Result<String, FetchError> {
        let url = format!("{}/ChartServlet", self.config.base_url);
        let query = [(usage_type, "true"), ("UsageType", usage_type)];

        let start = format_portal_date(range.start);
        let end = format_portal_date(range.end);
        let mut form = vec![("StartDate", start.as_str()), ("EndDate", end.as_str())];
        if !framing.is_empty() {
            form.push(("framing", framing));
        }
        form.push(("Submit", "Submit"));

        let resp = self.post_form(&url, &query, &form).await?;
        resp.text().await.map_err(FetchError::RequestFailed)
    }

    /// Fetch and parse one sub-range of hourly usage.
    pub async fn fetch_usage(&self, range: DateRange) -> Result<Vec<UsageRecord>, FetchError> {
        let raw = self
            .fetch_raw(USAGE_TYPE_RAW_VERTICAL, FRAMING_TOU, range)
            .await?;
        Ok(parse_usage_csv(raw.as_bytes())?)
    }

    /// Fetch an arbitrarily long range by splitting it into provider-sized
    /// chunks and fetching each in turn, strictly sequentially. The first
    /// failing chunk aborts the whole call; already-fetched chunks from this
    /// run are discarded.
    pub async fn fetch_all_usage(&self, range: DateRange) -> Result<Vec<UsageRecord>, FetchError> {
        let today = OffsetDateTime::now_utc().to_offset(PORTAL_OFFSET).date();

        let mut records = Vec::new();
        for chunk in range.chunks(today) {
            tracing::info!(start = %chunk.start, end = %chunk.end, "fetching usage chunk");
            records.extend(self.fetch_usage(chunk).await?);
        }
        Ok(records)
    }

    /// Form POST with the session's cookies attached. Statuses in [200, 400)
    /// pass; anything else is a failure and the body (typically an HTML error
    /// page) is dropped, never surfaced.
    async fn post_form(
        &self,
        url: &str,
        query: &[(&str, &str)],
        form: &[(&str, &str)],
    ) -> Result<Response, PostFailure> {
        tracing::debug!(%url, "POST");

        let mut req = self.http.post(url).query(query).form(form);
        if let Some(header) = self.session.cookie_header() {
            req = req.header(COOKIE, header);
        }

        let resp = req.send().await.map_err(PostFailure::Request)?;

        let status = resp.status();
        if !(200..400).contains(&status.as_u16()) {
            tracing::warn!(%url, %status, "portal rejected request");
            return Err(PostFailure::Status(status));
        }
        Ok(resp)
    }
}
