//! Error envelope and resource URLs shared by Google REST APIs.

use serde::Deserialize;
use thiserror::Error;
use url::Url;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ResourceUrlError {
    #[error("invalid API base URL '{0}'")]
    Base(String),

    #[error("invalid resource id '{0}'")]
    Id(String),
}

/// Append `segments` to `base`, one path segment each.
///
/// Every segment is percent-encoded, so `/`, `?` and `#` stay inside the
/// segment. Empty, `.` and `..` segments are refused.
pub fn resource_url(base: &str, segments: &[&str]) -> Result<Url, ResourceUrlError> {
    if let Some(bad) = segments
        .iter()
        .find(|s| s.is_empty() || **s == "." || **s == "..")
    {
        return Err(ResourceUrlError::Id(bad.to_string()));
    }

    let mut url = Url::parse(base).map_err(|_| ResourceUrlError::Base(base.to_string()))?;
    url.path_segments_mut()
        .map_err(|_| ResourceUrlError::Base(base.to_string()))?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: String,
    #[serde(default)]
    status: Option<String>,
}

/// Canonical status (e.g. `NOT_FOUND`) and message from an error response.
///
/// Falls back to the raw body when it is not the standard envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiError {
    pub http_status: u16,
    pub status: String,
    pub message: String,
}

impl ApiError {
    pub fn from_body(http_status: u16, body: &str) -> Self {
        match serde_json::from_str::<ErrorEnvelope>(body) {
            Ok(envelope) => Self {
                http_status,
                status: envelope
                    .error
                    .status
                    .unwrap_or_else(|| status_for_code(http_status).to_string()),
                message: envelope.error.message,
            },
            Err(_) => Self {
                http_status,
                status: status_for_code(http_status).to_string(),
                message: body.trim().to_string(),
            },
        }
    }
}

fn status_for_code(code: u16) -> &'static str {
    match code {
        400 => "INVALID_ARGUMENT",
        401 => "UNAUTHENTICATED",
        403 => "PERMISSION_DENIED",
        404 => "NOT_FOUND",
        409 => "ALREADY_EXISTS",
        429 => "RESOURCE_EXHAUSTED",
        500 => "INTERNAL",
        503 => "UNAVAILABLE",
        _ => "UNKNOWN",
    }
}
