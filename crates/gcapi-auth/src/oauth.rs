use oauth2::basic::{BasicClient, BasicErrorResponse, BasicTokenResponse};
use oauth2::reqwest::async_http_client;
use oauth2::{
    AuthUrl, AuthorizationCode, ClientId, ClientSecret, RedirectUrl, RefreshToken,
    RequestTokenError, TokenResponse, TokenUrl,
};
use url::Url;

use crate::error::AuthError;
use crate::token::TokenSet;

/// Lifetime assumed when the token endpoint omits `expires_in`.
const DEFAULT_EXPIRES_IN_SECS: i64 = 3600;

/// OAuth2 configuration
#[derive(Clone)]
pub struct OAuth2Config {
    /// Client ID from OAuth provider
    pub client_id: String,

    /// Client secret from OAuth provider
    pub client_secret: String,

    /// Authorization endpoint URL
    pub auth_url: String,

    /// Token endpoint URL
    pub token_url: String,

    /// Redirect URI for OAuth callback
    pub redirect_uri: String,

    /// Scopes to request
    pub scopes: Vec<String>,
}

impl std::fmt::Debug for OAuth2Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OAuth2Config")
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .field("auth_url", &self.auth_url)
            .field("token_url", &self.token_url)
            .field("redirect_uri", &self.redirect_uri)
            .field("scopes", &self.scopes)
            .finish()
    }
}

/// Authorization-code flow against Google's OAuth2 endpoints.
///
/// Holds no token state of its own: every exchange or refresh returns a fresh
/// [`TokenSet`] for the caller to keep.
pub struct GoogleAuthorizer {
    config: OAuth2Config,
    auth_url: Url,
    client: BasicClient,
}

impl std::fmt::Debug for GoogleAuthorizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GoogleAuthorizer")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl GoogleAuthorizer {
    /// Validate the endpoint URLs and build the OAuth2 client. No I/O.
    pub fn new(config: OAuth2Config) -> Result<Self, AuthError> {
        let auth_url = Url::parse(&config.auth_url).map_err(|source| AuthError::InvalidUrl {
            field: "auth",
            source,
        })?;

        let client = BasicClient::new(
            ClientId::new(config.client_id.clone()),
            Some(ClientSecret::new(config.client_secret.clone())),
            AuthUrl::new(config.auth_url.clone()).map_err(|source| AuthError::InvalidUrl {
                field: "auth",
                source,
            })?,
            Some(
                TokenUrl::new(config.token_url.clone()).map_err(|source| {
                    AuthError::InvalidUrl {
                        field: "token",
                        source,
                    }
                })?,
            ),
        )
        .set_redirect_uri(RedirectUrl::new(config.redirect_uri.clone()).map_err(|source| {
            AuthError::InvalidUrl {
                field: "redirect",
                source,
            }
        })?);

        Ok(Self {
            config,
            auth_url,
            client,
        })
    }

    pub fn config(&self) -> &OAuth2Config {
        &self.config
    }

    pub fn client_id(&self) -> &str {
        &self.config.client_id
    }

    /// Consent page URL the end user must visit.
    ///
    /// Requests offline access so that the exchange also yields a refresh
    /// token.
    pub fn authorization_url(&self) -> String {
        let mut url = self.auth_url.clone();
        url.query_pairs_mut()
            .append_pair("response_type", "code")
            .append_pair("client_id", &self.config.client_id)
            .append_pair("redirect_uri", &self.config.redirect_uri)
            .append_pair("scope", &self.config.scopes.join(" "))
            .append_pair("access_type", "offline");
        url.to_string()
    }

    /// Exchange a one-time authorization code for tokens.
    #[tracing::instrument(skip(self, code), level = "info")]
    pub async fn exchange_code(&self, code: &str) -> Result<TokenSet, AuthError> {
        let response = self
            .client
            .exchange_code(AuthorizationCode::new(code.to_string()))
            .request_async(async_http_client)
            .await
            .map_err(|e| AuthError::Exchange(describe(e)))?;

        tracing::info!("Authorization code exchanged for {}", self.config.client_id);
        Ok(token_set_from(&response, None))
    }

    /// Obtain a new access token. The old refresh token is kept when the
    /// provider does not rotate it.
    #[tracing::instrument(skip(self, refresh_token), level = "info")]
    pub async fn refresh(&self, refresh_token: &str) -> Result<TokenSet, AuthError> {
        let response = self
            .client
            .exchange_refresh_token(&RefreshToken::new(refresh_token.to_string()))
            .request_async(async_http_client)
            .await
            .map_err(|e| AuthError::Refresh(describe(e)))?;

        tracing::info!("Access token refreshed");
        Ok(token_set_from(&response, Some(refresh_token)))
    }
}

fn token_set_from(response: &BasicTokenResponse, previous_refresh: Option<&str>) -> TokenSet {
    let expires_in = response
        .expires_in()
        .map(|d| i64::try_from(d.as_secs()).unwrap_or(i64::MAX))
        .unwrap_or(DEFAULT_EXPIRES_IN_SECS);

    let scopes = response
        .scopes()
        .map(|s| s.iter().map(|scope| scope.to_string()).collect())
        .unwrap_or_default();

    let refresh_token = response
        .refresh_token()
        .map(|t| t.secret().clone())
        .or_else(|| previous_refresh.map(str::to_string));

    TokenSet {
        access_token: response.access_token().secret().clone(),
        refresh_token,
        expires_at: chrono::Utc::now().timestamp().saturating_add(expires_in),
        scopes,
    }
}

fn describe<RE>(err: RequestTokenError<RE, BasicErrorResponse>) -> String
where
    RE: std::error::Error + 'static,
{
    match err {
        RequestTokenError::ServerResponse(response) => response.to_string(),
        RequestTokenError::Parse(e, _) => format!("unexpected token response: {}", e),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
    use super::*;
    use wiremock::matchers::{body_string_contains, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_config(token_url: &str) -> OAuth2Config {
        OAuth2Config {
            client_id: "test_client_id".to_string(),
            client_secret: "test_client_secret".to_string(),
            auth_url: "https://accounts.google.com/o/oauth2/auth".to_string(),
            token_url: token_url.to_string(),
            redirect_uri: "http://localhost:8080/callback".to_string(),
            scopes: vec!["https://www.googleapis.com/auth/calendar".to_string()],
        }
    }

    #[test]
    fn test_authorization_url_contains_params() {
        let authorizer =
            GoogleAuthorizer::new(test_config("https://oauth2.example.com/token")).unwrap();
        let url = Url::parse(&authorizer.authorization_url()).unwrap();

        assert_eq!(url.host_str(), Some("accounts.google.com"));
        let pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();
        assert!(pairs.contains(&("client_id".to_string(), "test_client_id".to_string())));
        assert!(pairs.contains(&(
            "redirect_uri".to_string(),
            "http://localhost:8080/callback".to_string()
        )));
        assert!(pairs.contains(&("response_type".to_string(), "code".to_string())));
        assert!(pairs.contains(&("access_type".to_string(), "offline".to_string())));
    }

    #[test]
    fn test_authorization_url_is_deterministic() {
        let authorizer =
            GoogleAuthorizer::new(test_config("https://oauth2.example.com/token")).unwrap();
        assert_eq!(authorizer.authorization_url(), authorizer.authorization_url());
    }

    #[test]
    fn test_invalid_token_url_rejected() {
        let result = GoogleAuthorizer::new(test_config("not a url"));
        assert!(matches!(
            result,
            Err(AuthError::InvalidUrl { field: "token", .. })
        ));
    }

    #[test]
    fn test_debug_hides_secret() {
        let config = test_config("https://oauth2.example.com/token");
        assert!(!format!("{:?}", config).contains("test_client_secret"));
    }

    #[tokio::test]
    async fn test_exchange_code() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/token"))
            .and(body_string_contains("grant_type=authorization_code"))
            .and(body_string_contains("code=auth-code-123"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "access_token": "ya29.fresh",
                "refresh_token": "1//refresh",
                "expires_in": 3599,
                "token_type": "Bearer",
                "scope": "https://www.googleapis.com/auth/calendar"
            })))
            .expect(1)
            .mount(&mock_server)
            .await;

        let authorizer =
            GoogleAuthorizer::new(test_config(&format!("{}/token", mock_server.uri()))).unwrap();
        let tokens = authorizer.exchange_code("auth-code-123").await.unwrap();

        assert_eq!(tokens.access_token, "ya29.fresh");
        assert_eq!(tokens.refresh_token.as_deref(), Some("1//refresh"));
        assert!(tokens.expires_in() > 3500);
        assert_eq!(tokens.scopes, vec!["https://www.googleapis.com/auth/calendar"]);
    }

    #[tokio::test]
    async fn test_exchange_code_rejected() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/token"))
            .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
                "error": "invalid_grant",
                "error_description": "Malformed auth code."
            })))
            .mount(&mock_server)
            .await;

        let authorizer =
            GoogleAuthorizer::new(test_config(&format!("{}/token", mock_server.uri()))).unwrap();
        let result = authorizer.exchange_code("bad").await;

        match result {
            Err(AuthError::Exchange(msg)) => assert!(msg.contains("invalid_grant")),
            other => panic!("expected exchange error, got {:?}", other),
        }
    }

    async fn exchange_with_lifetime(lifetime: u64) -> TokenSet {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "access_token": "ya29.long",
                "expires_in": lifetime,
                "token_type": "Bearer"
            })))
            .mount(&mock_server)
            .await;

        let authorizer =
            GoogleAuthorizer::new(test_config(&format!("{}/token", mock_server.uri()))).unwrap();
        authorizer.exchange_code("auth-code").await.unwrap()
    }

    #[tokio::test]
    async fn test_exchange_huge_lifetime_saturates() {
        let tokens = exchange_with_lifetime(u64::MAX).await;
        assert_eq!(tokens.expires_at, i64::MAX);
        assert!(tokens.expires_in() > 0);
        assert!(!tokens.is_expired());
        assert!(!tokens.needs_refresh());

        let tokens = exchange_with_lifetime(i64::MAX as u64).await;
        assert_eq!(tokens.expires_at, i64::MAX);
        assert!(!tokens.is_expired());
    }

    #[tokio::test]
    async fn test_refresh_keeps_previous_refresh_token() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/token"))
            .and(body_string_contains("grant_type=refresh_token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "access_token": "ya29.refreshed",
                "expires_in": 3599,
                "token_type": "Bearer"
            })))
            .expect(1)
            .mount(&mock_server)
            .await;

        let authorizer =
            GoogleAuthorizer::new(test_config(&format!("{}/token", mock_server.uri()))).unwrap();
        let tokens = authorizer.refresh("1//original").await.unwrap();

        assert_eq!(tokens.access_token, "ya29.refreshed");
        assert_eq!(tokens.refresh_token.as_deref(), Some("1//original"));
    }
}
