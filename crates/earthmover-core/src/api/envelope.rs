//! The uniform response envelope every backend endpoint uses.
//!
//! Shape: `{ "success": bool, "message": string?, "data": T | [T] }`.
//! The decode functions take the raw status and body so tests can feed
//! captured responses directly.

use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::Deserialize;

use super::{ApiError, ApiResult};
use crate::util::compact_text;

// No `#[serde(default)]` on the optional fields: serde already decodes an
// absent `Option` as `None`, and the attribute would put a `Default` bound
// on the payload type.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiEnvelope<T> {
    pub success: bool,
    pub message: Option<String>,
    pub data: Option<T>,
}

/// Misconfigured PHP hosts answer with an HTML error page instead of JSON.
/// Catch that before the JSON parser produces a useless message.
fn sniffs_as_html(body: &str) -> bool {
    let head: String = body
        .trim_start()
        .chars()
        .take(14)
        .collect::<String>()
        .to_ascii_lowercase();
    head.starts_with("<html") || head.starts_with("<!doctype")
}

/// Decode an envelope that must carry a `data` payload.
///
/// Order of checks: HTML sniff, envelope parse, HTTP status, `success`
/// flag, then presence of `data`.
pub fn decode_envelope<T: DeserializeOwned>(status: StatusCode, body: &str) -> ApiResult<T> {
    let envelope: ApiEnvelope<T> = parse_envelope(status, body)?;
    envelope.data.ok_or(ApiError::MissingData)
}

/// Decode an acknowledgement envelope (mutations): `data` is optional and
/// the backend message is the result.
pub fn decode_ack(status: StatusCode, body: &str) -> ApiResult<String> {
    let envelope: ApiEnvelope<serde_json::Value> = parse_envelope(status, body)?;
    Ok(envelope
        .message
        .unwrap_or_else(|| "request accepted".to_string()))
}

fn parse_envelope<T: DeserializeOwned>(status: StatusCode, body: &str) -> ApiResult<ApiEnvelope<T>> {
    if sniffs_as_html(body) {
        return Err(ApiError::HtmlBody {
            status: status.as_u16(),
        });
    }

    let envelope: ApiEnvelope<T> = match serde_json::from_str(body) {
        Ok(envelope) => envelope,
        Err(error) => {
            // A failed status with an unparseable body: report the status,
            // not the parse failure.
            if !status.is_success() {
                return Err(ApiError::Status {
                    status: status.as_u16(),
                    message: compact_text(body),
                });
            }
            return Err(ApiError::Malformed(error.to_string()));
        }
    };

    if !status.is_success() {
        let message = envelope
            .message
            .unwrap_or_else(|| format!("HTTP {}", status.as_u16()));
        return Err(ApiError::Status {
            status: status.as_u16(),
            message,
        });
    }

    if !envelope.success {
        return Err(ApiError::Rejected(envelope.message.unwrap_or_else(|| {
            "the server rejected the request".to_string()
        })));
    }

    Ok(envelope)
}
