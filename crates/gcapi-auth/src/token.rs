use serde::{Deserialize, Serialize};

/// Remaining lifetime (seconds) below which a token is refreshed before use.
pub const REFRESH_THRESHOLD_SECS: i64 = 500;

/// Token set for OAuth2 authentication
#[derive(Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TokenSet {
    /// Access token for API requests
    pub access_token: String,

    /// Optional refresh token for token renewal
    pub refresh_token: Option<String>,

    /// Token expiration timestamp (Unix timestamp)
    pub expires_at: i64,

    /// Scopes granted to this token
    #[serde(default)]
    pub scopes: Vec<String>,
}

impl TokenSet {
    /// Build a token set that expires `expires_in` seconds from now.
    pub fn expiring_in(
        access_token: impl Into<String>,
        refresh_token: Option<String>,
        expires_in: i64,
    ) -> Self {
        Self {
            access_token: access_token.into(),
            refresh_token,
            expires_at: chrono::Utc::now().timestamp().saturating_add(expires_in),
            scopes: Vec::new(),
        }
    }

    /// Seconds until expiry; negative once expired.
    pub fn expires_in(&self) -> i64 {
        self.expires_at
            .saturating_sub(chrono::Utc::now().timestamp())
    }

    /// Check if the token is expired
    pub fn is_expired(&self) -> bool {
        self.expires_in() <= 0
    }

    /// Check if the token is close enough to expiry to be refreshed first
    pub fn needs_refresh(&self) -> bool {
        self.expires_in() < REFRESH_THRESHOLD_SECS
    }
}

impl std::fmt::Debug for TokenSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenSet")
            .field("access_token", &"<redacted>")
            .field("refresh_token", &self.refresh_token.as_ref().map(|_| "<redacted>"))
            .field("expires_at", &self.expires_at)
            .field("scopes", &self.scopes)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_expiry() {
        let expired = TokenSet::expiring_in("test", None, -3600);
        assert!(expired.is_expired());
        assert!(expired.needs_refresh());

        let valid = TokenSet::expiring_in("test", None, 3600);
        assert!(!valid.is_expired());
        assert!(!valid.needs_refresh());

        let soon = TokenSet::expiring_in("test", None, 200);
        assert!(!soon.is_expired());
        assert!(soon.needs_refresh());
    }

    #[test]
    fn test_refresh_threshold_boundary() {
        // One second of slack on each side absorbs a clock tick during the test.
        let above = TokenSet::expiring_in("test", None, REFRESH_THRESHOLD_SECS + 2);
        assert!(!above.needs_refresh());

        let below = TokenSet::expiring_in("test", None, REFRESH_THRESHOLD_SECS - 2);
        assert!(below.needs_refresh());
    }

    #[test]
    fn test_extreme_lifetimes_saturate() {
        let forever = TokenSet::expiring_in("test", None, i64::MAX);
        assert_eq!(forever.expires_at, i64::MAX);
        assert!(!forever.is_expired());
        assert!(forever.expires_in() > 0);

        let ancient = TokenSet::expiring_in("test", None, i64::MIN);
        assert!(ancient.expires_at < 0);
        assert!(ancient.is_expired());
        assert!(ancient.expires_in() < 0);
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let token = TokenSet::expiring_in("ya29.secret", Some("1//refresh".to_string()), 60);
        let printed = format!("{:?}", token);
        assert!(!printed.contains("ya29.secret"));
        assert!(!printed.contains("1//refresh"));
        assert!(printed.contains("<redacted>"));
    }
}
