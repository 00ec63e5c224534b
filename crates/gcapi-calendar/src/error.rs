//! Calendar client error types.

use gcapi_auth::AuthError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CalendarError {
    #[error("Wrong HTTP method: {0}")]
    InvalidMethod(String),

    #[error("Access token not present")]
    AuthRequired,

    #[error("Access token expired")]
    TokenExpired,

    #[error("No refresh token available")]
    NoRefreshToken,

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error("Access forbidden")]
    Forbidden,

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("API error {status}: {body}")]
    Api { status: u16, body: String },

    #[error("Could not decode response: {0}")]
    Decode(String),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
}

impl CalendarError {
    /// User-friendly error message for display.
    pub fn user_message(&self) -> String {
        match self {
            Self::InvalidMethod(m) => format!("Unsupported HTTP method: {}", m),
            Self::AuthRequired => "Please sign in to your Google account".to_string(),
            Self::TokenExpired => "Your session has expired. Please sign in again.".to_string(),
            Self::NoRefreshToken | Self::Auth(_) => {
                "Could not renew your session. Please sign in again.".to_string()
            }
            Self::Forbidden => "You do not have access to this calendar".to_string(),
            Self::NotFound(_) => "Calendar or event not found".to_string(),
            Self::Api { status, .. } => format!("Calendar error (HTTP {})", status),
            Self::Decode(_) => "Received an unexpected response".to_string(),
            Self::Network(_) => "Network error. Check your connection.".to_string(),
        }
    }

    /// Whether the user has to go through the consent flow again.
    pub fn should_reauthorize(&self) -> bool {
        matches!(
            self,
            Self::AuthRequired | Self::TokenExpired | Self::NoRefreshToken | Self::Auth(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_user_messages() {
        let err = CalendarError::AuthRequired;
        assert!(err.user_message().contains("sign in"));

        let err = CalendarError::Api {
            status: 500,
            body: "boom".into(),
        };
        assert!(err.user_message().contains("500"));

        let err = CalendarError::InvalidMethod("patch".into());
        assert!(err.user_message().contains("patch"));
    }

    #[test]
    fn test_should_reauthorize() {
        assert!(CalendarError::TokenExpired.should_reauthorize());
        assert!(CalendarError::AuthRequired.should_reauthorize());
        assert!(CalendarError::Auth(AuthError::Refresh("invalid_grant".into())).should_reauthorize());
        assert!(!CalendarError::NotFound("x".into()).should_reauthorize());
        assert!(!CalendarError::Decode("x".into()).should_reauthorize());
    }
}
