//! OAuth2 authorization for the Google Calendar client.
//!
//! Builds the consent URL, exchanges authorization codes and refreshes
//! access tokens. Token bookkeeping lives in [`TokenSet`].

pub mod error;
pub mod oauth;
pub mod token;

pub use error::AuthError;
pub use oauth::{GoogleAuthorizer, OAuth2Config};
pub use token::{TokenSet, REFRESH_THRESHOLD_SECS};
