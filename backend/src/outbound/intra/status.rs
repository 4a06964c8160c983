//! Shared reqwest error and status mapping for intranet adapters.

use reqwest::StatusCode;

use crate::domain::ports::IntraSourceError;

pub(super) fn map_transport_error(error: &reqwest::Error) -> IntraSourceError {
    if error.is_timeout() {
        IntraSourceError::timeout(error.to_string())
    } else if error.is_decode() {
        IntraSourceError::decode(error.to_string())
    } else {
        IntraSourceError::transport(error.to_string())
    }
}

pub(super) fn map_status_error(status: StatusCode, body: &[u8]) -> IntraSourceError {
    let message = status_message(status, body);

    match status {
        StatusCode::TOO_MANY_REQUESTS => IntraSourceError::rate_limited(message),
        StatusCode::REQUEST_TIMEOUT | StatusCode::GATEWAY_TIMEOUT => {
            IntraSourceError::timeout(message)
        }
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            IntraSourceError::unauthorized(message)
        }
        _ if status.is_client_error() => IntraSourceError::invalid_request(message),
        _ => IntraSourceError::transport(message),
    }
}

pub(super) fn status_message(status: StatusCode, body: &[u8]) -> String {
    let body_preview = body_preview(body);
    if body_preview.is_empty() {
        format!("status {}", status.as_u16())
    } else {
        format!("status {}: {}", status.as_u16(), body_preview)
    }
}

fn body_preview(body: &[u8]) -> String {
    const PREVIEW_CHAR_LIMIT: usize = 160;

    let compact = String::from_utf8_lossy(body)
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ");
    let preview = compact.chars().take(PREVIEW_CHAR_LIMIT).collect::<String>();
    if compact.chars().count() > PREVIEW_CHAR_LIMIT {
        format!("{preview}...")
    } else {
        preview
    }
}
