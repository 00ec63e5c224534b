use thiserror::Error;

#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Invalid {field} URL: {source}")]
    InvalidUrl {
        field: &'static str,
        #[source]
        source: url::ParseError,
    },

    #[error("Authorization code exchange failed: {0}")]
    Exchange(String),

    #[error("Token refresh failed: {0}")]
    Refresh(String),
}
