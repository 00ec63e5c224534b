//! Google Calendar v3 client.
//!
//! [`CalendarApi`] owns one OAuth2 session and signs every request with it,
//! refreshing the access token shortly before it expires.

pub mod client;
pub mod error;
pub mod request;
pub mod types;

pub use client::CalendarApi;
pub use error::CalendarError;
pub use request::{ApiResponse, HttpMethod, Payload};
pub use types::{
    AccessRole, Calendar, CalendarList, Event, EventList, EventStatus, EventTime, Person,
    Recurrence, ResponseStatus,
};

pub use gcapi_auth::TokenSet;
pub use gcapi_core::Endpoints;
