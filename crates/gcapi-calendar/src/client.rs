//! Google Calendar API client.

use std::fmt;

use gcapi_auth::{GoogleAuthorizer, OAuth2Config, TokenSet};
use gcapi_core::{Config, Endpoints};
use reqwest::header::CONTENT_TYPE;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio::sync::Mutex;
use tracing::instrument;

use crate::error::CalendarError;
use crate::request::{ApiResponse, HttpMethod, Payload};
use crate::types::{Calendar, CalendarList, Event, EventList};

/// One authorized session against the Calendar API.
///
/// Token state sits behind an async mutex: the freshness check and any
/// refresh run under the lock, so concurrent requests refresh at most once.
/// The lock is released before the API call itself is sent.
pub struct CalendarApi {
    client: reqwest::Client,
    base_url: String,
    authorizer: GoogleAuthorizer,
    session: Mutex<Option<TokenSet>>,
}

impl CalendarApi {
    /// Client against the default Google endpoints. No I/O.
    pub fn new(
        client_id: &str,
        client_secret: &str,
        redirect_uri: &str,
    ) -> Result<Self, CalendarError> {
        Self::with_endpoints(client_id, client_secret, redirect_uri, Endpoints::default())
    }

    pub fn with_endpoints(
        client_id: &str,
        client_secret: &str,
        redirect_uri: &str,
        endpoints: Endpoints,
    ) -> Result<Self, CalendarError> {
        let authorizer = GoogleAuthorizer::new(OAuth2Config {
            client_id: client_id.to_string(),
            client_secret: client_secret.to_string(),
            auth_url: endpoints.auth_url,
            token_url: endpoints.token_url,
            redirect_uri: redirect_uri.to_string(),
            scopes: vec![endpoints.scope],
        })?;

        Ok(Self {
            client: reqwest::Client::new(),
            base_url: endpoints.api_base.trim_end_matches('/').to_string(),
            authorizer,
            session: Mutex::new(None),
        })
    }

    pub fn from_config(config: &Config) -> Result<Self, CalendarError> {
        Self::with_endpoints(
            &config.google.client_id,
            &config.google.client_secret,
            &config.google.redirect_uri,
            config.endpoints.clone(),
        )
    }

    pub fn client_id(&self) -> &str {
        self.authorizer.client_id()
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// URL the end user visits to grant calendar access.
    pub fn authorization_url(&self) -> String {
        self.authorizer.authorization_url()
    }

    /// Exchange a one-time authorization code and start a session with the
    /// resulting tokens.
    #[instrument(skip(self, code), level = "info")]
    pub async fn exchange_code(&self, code: &str) -> Result<(), CalendarError> {
        let tokens = self.authorizer.exchange_code(code).await?;
        *self.session.lock().await = Some(tokens);
        Ok(())
    }

    /// Restore a session, e.g. from tokens persisted by the caller.
    pub async fn set_token(&self, tokens: TokenSet) {
        *self.session.lock().await = Some(tokens);
    }

    pub async fn token(&self) -> Option<TokenSet> {
        self.session.lock().await.clone()
    }

    /// True when an access token is present and not yet expired. Local check
    /// only.
    pub async fn is_active(&self) -> bool {
        self.session
            .lock()
            .await
            .as_ref()
            .is_some_and(|t| !t.is_expired())
    }

    /// Refresh the access token now, regardless of its remaining lifetime.
    ///
    /// A failed refresh leaves the current token set in place and is not
    /// retried.
    #[instrument(skip(self), level = "info")]
    pub async fn refresh(&self) -> Result<(), CalendarError> {
        let mut session = self.session.lock().await;
        self.refresh_locked(&mut session).await
    }

    async fn refresh_locked(&self, session: &mut Option<TokenSet>) -> Result<(), CalendarError> {
        let refresh_token = session
            .as_ref()
            .and_then(|t| t.refresh_token.clone())
            .ok_or(CalendarError::NoRefreshToken)?;

        let tokens = self.authorizer.refresh(&refresh_token).await?;
        *session = Some(tokens);
        Ok(())
    }

    /// Access token to sign the next request with, refreshing it first when
    /// it is close to expiry.
    async fn fresh_access_token(&self) -> Result<String, CalendarError> {
        let mut session = self.session.lock().await;

        let (expired, needs_refresh) = match session.as_ref() {
            None => return Err(CalendarError::AuthRequired),
            Some(tokens) => (tokens.is_expired(), tokens.needs_refresh()),
        };

        if expired {
            return Err(CalendarError::TokenExpired);
        }

        if needs_refresh {
            tracing::debug!("Access token close to expiry, refreshing");
            self.refresh_locked(&mut session).await?;
        }

        session
            .as_ref()
            .map(|t| t.access_token.clone())
            .ok_or(CalendarError::AuthRequired)
    }

    fn url_for(&self, path: &str) -> String {
        if path.starts_with('/') {
            format!("{}{}", self.base_url, path)
        } else {
            format!("{}/{}", self.base_url, path)
        }
    }

    /// Send an authorized request to `path` under the API base URL.
    ///
    /// `method` is one of get, post, put, delete (any case). Method and
    /// session checks fail before anything is sent. The body is decoded into
    /// a [`Payload`] whatever the status code; an undecodable body is not an
    /// error.
    #[instrument(skip(self, data), level = "info")]
    pub async fn request(
        &self,
        method: &str,
        path: &str,
        data: Option<&Value>,
    ) -> Result<ApiResponse, CalendarError> {
        let method: HttpMethod = method.parse()?;
        let access_token = self.fresh_access_token().await?;

        let mut request = self
            .client
            .request(method.into(), self.url_for(path))
            .bearer_auth(access_token)
            .header(CONTENT_TYPE, "application/json");

        if let Some(data) = data {
            request = request.json(data);
        }

        let response = request.send().await?;
        let status = response.status().as_u16();
        let body = response.text().await?;

        let payload = Payload::parse(&body);
        if let Payload::Malformed { error, .. } = &payload {
            tracing::warn!(status, "Response body is not valid JSON: {}", error);
        }

        Ok(ApiResponse { status, payload })
    }

    pub async fn get(&self, path: &str) -> Result<ApiResponse, CalendarError> {
        self.request("get", path, None).await
    }

    pub async fn post(&self, path: &str, data: &Value) -> Result<ApiResponse, CalendarError> {
        self.request("post", path, Some(data)).await
    }

    pub async fn put(&self, path: &str, data: &Value) -> Result<ApiResponse, CalendarError> {
        self.request("put", path, Some(data)).await
    }

    pub async fn delete(&self, path: &str) -> Result<ApiResponse, CalendarError> {
        self.request("delete", path, None).await
    }

    /// Like [`request`](Self::request) but requires a 2xx status and decodes
    /// the body into `T`.
    pub async fn request_json<T: DeserializeOwned>(
        &self,
        method: &str,
        path: &str,
        data: Option<&Value>,
    ) -> Result<T, CalendarError> {
        self.request(method, path, data).await?.into_typed()
    }

    /// List the user's calendars (first page).
    pub async fn list_calendars(&self) -> Result<CalendarList, CalendarError> {
        self.request_json("get", "/users/me/calendarList", None)
            .await
    }

    pub async fn get_calendar(&self, calendar_id: &str) -> Result<Calendar, CalendarError> {
        let path = format!("/calendars/{}", urlencoding::encode(calendar_id));
        self.request_json("get", &path, None).await
    }

    /// List events of a calendar (first page).
    pub async fn list_events(&self, calendar_id: &str) -> Result<EventList, CalendarError> {
        let path = format!("/calendars/{}/events", urlencoding::encode(calendar_id));
        self.request_json("get", &path, None).await
    }

    pub async fn get_event(
        &self,
        calendar_id: &str,
        event_id: &str,
    ) -> Result<Event, CalendarError> {
        let path = format!(
            "/calendars/{}/events/{}",
            urlencoding::encode(calendar_id),
            urlencoding::encode(event_id),
        );
        self.request_json("get", &path, None).await
    }

    pub async fn insert_event(
        &self,
        calendar_id: &str,
        event: &Event,
    ) -> Result<Event, CalendarError> {
        let path = format!("/calendars/{}/events", urlencoding::encode(calendar_id));
        let body =
            serde_json::to_value(event).map_err(|e| CalendarError::Decode(e.to_string()))?;
        self.request_json("post", &path, Some(&body)).await
    }

    pub async fn delete_event(
        &self,
        calendar_id: &str,
        event_id: &str,
    ) -> Result<(), CalendarError> {
        let path = format!(
            "/calendars/{}/events/{}",
            urlencoding::encode(calendar_id),
            urlencoding::encode(event_id),
        );
        self.request_json("delete", &path, None).await
    }
}

/// `Authorization: <active>. Access token present: <bool>. Time left: <secs>`.
///
/// Time left never goes below 0: an expired token reports 0 rather than the
/// negative number of seconds since expiry.
impl fmt::Display for CalendarApi {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.session.try_lock() {
            Ok(session) => {
                let tokens = session.as_ref();
                write!(
                    f,
                    "Authorization: {}. Access token present: {}. Time left: {}",
                    tokens.is_some_and(|t| !t.is_expired()),
                    tokens.is_some(),
                    tokens.map(|t| t.expires_in().max(0)).unwrap_or(0),
                )
            }
            Err(_) => write!(f, "Authorization: refresh in progress"),
        }
    }
}

impl fmt::Debug for CalendarApi {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CalendarApi({}) {}", self.client_id(), self)
    }
}
