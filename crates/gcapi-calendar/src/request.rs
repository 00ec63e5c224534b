//! Request verbs and decoded response bodies.

use std::fmt;
use std::str::FromStr;

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::CalendarError;

/// HTTP verbs the API client will send.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Delete => "DELETE",
        }
    }
}

impl FromStr for HttpMethod {
    type Err = CalendarError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "get" => Ok(Self::Get),
            "post" => Ok(Self::Post),
            "put" => Ok(Self::Put),
            "delete" => Ok(Self::Delete),
            _ => Err(CalendarError::InvalidMethod(s.to_string())),
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<HttpMethod> for reqwest::Method {
    fn from(method: HttpMethod) -> Self {
        match method {
            HttpMethod::Get => reqwest::Method::GET,
            HttpMethod::Post => reqwest::Method::POST,
            HttpMethod::Put => reqwest::Method::PUT,
            HttpMethod::Delete => reqwest::Method::DELETE,
        }
    }
}

/// Response body after JSON decoding.
///
/// Undecodable bodies are reported as [`Payload::Malformed`] instead of an
/// error so the status line and raw text stay available to the caller.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    Json(Value),
    /// Body was empty or whitespace, e.g. `204 No Content`.
    Empty,
    Malformed { body: String, error: String },
}

impl Payload {
    pub fn parse(body: &str) -> Self {
        if body.trim().is_empty() {
            return Self::Empty;
        }
        match serde_json::from_str(body) {
            Ok(value) => Self::Json(value),
            Err(e) => Self::Malformed {
                body: body.to_string(),
                error: e.to_string(),
            },
        }
    }

    pub fn is_malformed(&self) -> bool {
        matches!(self, Self::Malformed { .. })
    }

    pub fn as_json(&self) -> Option<&Value> {
        match self {
            Self::Json(value) => Some(value),
            _ => None,
        }
    }

    /// Collapse to a nullable value: empty and malformed bodies both become
    /// `None`.
    pub fn into_option(self) -> Option<Value> {
        match self {
            Self::Json(value) => Some(value),
            Self::Empty | Self::Malformed { .. } => None,
        }
    }

    fn body_text(&self) -> String {
        match self {
            Self::Json(value) => value.to_string(),
            Self::Empty => String::new(),
            Self::Malformed { body, .. } => body.clone(),
        }
    }
}

/// Status code plus decoded body of one API call.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse {
    pub status: u16,
    pub payload: Payload,
}

impl ApiResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Require a 2xx status and deserialize the body into `T`.
    ///
    /// An empty body deserializes from JSON `null`, so `()` and `Option<_>`
    /// accept `204 No Content`.
    pub fn into_typed<T: DeserializeOwned>(self) -> Result<T, CalendarError> {
        if !self.is_success() {
            let body = self.payload.body_text();
            return Err(match self.status {
                401 => CalendarError::TokenExpired,
                403 => CalendarError::Forbidden,
                404 => CalendarError::NotFound(body),
                status => CalendarError::Api { status, body },
            });
        }

        match self.payload {
            Payload::Json(value) => {
                serde_json::from_value(value).map_err(|e| CalendarError::Decode(e.to_string()))
            }
            Payload::Empty => serde_json::from_value(Value::Null)
                .map_err(|_| CalendarError::Decode("empty response body".to_string())),
            Payload::Malformed { error, .. } => Err(CalendarError::Decode(error)),
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
    use super::*;

    #[test]
    fn test_method_parsing_is_case_insensitive() {
        assert_eq!("get".parse::<HttpMethod>().unwrap(), HttpMethod::Get);
        assert_eq!("POST".parse::<HttpMethod>().unwrap(), HttpMethod::Post);
        assert_eq!("Put".parse::<HttpMethod>().unwrap(), HttpMethod::Put);
        assert_eq!("delete".parse::<HttpMethod>().unwrap(), HttpMethod::Delete);
    }

    #[test]
    fn test_unsupported_methods_rejected() {
        for method in ["patch", "head", "options", "", "gett"] {
            assert!(
                matches!(method.parse::<HttpMethod>(), Err(CalendarError::InvalidMethod(m)) if m == method),
                "{} should be rejected",
                method
            );
        }
    }

    #[test]
    fn test_payload_parse() {
        assert_eq!(
            Payload::parse(r#"{"id": "primary"}"#),
            Payload::Json(serde_json::json!({"id": "primary"}))
        );
        assert_eq!(Payload::parse(""), Payload::Empty);
        assert_eq!(Payload::parse("  \n"), Payload::Empty);
    }

    #[test]
    fn test_malformed_payload_is_not_an_error() {
        let payload = Payload::parse("not-json");
        assert!(payload.is_malformed());
        match &payload {
            Payload::Malformed { body, .. } => assert_eq!(body, "not-json"),
            other => panic!("unexpected payload {:?}", other),
        }
        assert_eq!(payload.into_option(), None);
    }

    #[test]
    fn test_into_typed_maps_status_codes() {
        let response = ApiResponse {
            status: 404,
            payload: Payload::parse(r#"{"error": {"message": "Not Found"}}"#),
        };
        assert!(matches!(
            response.into_typed::<Value>(),
            Err(CalendarError::NotFound(body)) if body.contains("Not Found")
        ));

        let response = ApiResponse {
            status: 401,
            payload: Payload::Empty,
        };
        assert!(matches!(
            response.into_typed::<Value>(),
            Err(CalendarError::TokenExpired)
        ));

        let response = ApiResponse {
            status: 500,
            payload: Payload::parse("backend down"),
        };
        assert!(matches!(
            response.into_typed::<Value>(),
            Err(CalendarError::Api { status: 500, body }) if body == "backend down"
        ));
    }

    #[test]
    fn test_into_typed_empty_body() {
        let response = ApiResponse {
            status: 204,
            payload: Payload::Empty,
        };
        assert!(response.clone().into_typed::<()>().is_ok());
        assert!(matches!(
            response.into_typed::<crate::types::Calendar>(),
            Err(CalendarError::Decode(_))
        ));
    }
}
