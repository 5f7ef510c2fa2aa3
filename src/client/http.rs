// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Shared response-envelope handling for API calls.

use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::client::store::StoreError;

/// The uniform API envelope: `{statusCode, data, message, success}`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Envelope<T> {
    #[allow(dead_code)]
    pub status_code: u16,
    pub data: Option<T>,
    pub message: Option<String>,
    pub success: bool,
}

/// Map an error-status response body to a [`StoreError`].
fn error_from_status(status: reqwest::StatusCode, message: String) -> StoreError {
    match status.as_u16() {
        400 => StoreError::Validation(message),
        401 => StoreError::Auth(message),
        404 => StoreError::NotFound(message),
        409 => StoreError::Conflict(message),
        _ => StoreError::Network(format!("HTTP {}: {}", status, message)),
    }
}

/// Send a request and unwrap the success envelope.
pub async fn send_json<T: DeserializeOwned>(
    request: reqwest::RequestBuilder,
) -> Result<T, StoreError> {
    let response = request
        .send()
        .await
        .map_err(|e| StoreError::Network(e.to_string()))?;

    let status = response.status();
    let body = response
        .text()
        .await
        .map_err(|e| StoreError::Network(e.to_string()))?;

    if !status.is_success() {
        let message = serde_json::from_str::<Envelope<serde_json::Value>>(&body)
            .ok()
            .and_then(|envelope| envelope.message)
            .unwrap_or_else(|| status.to_string());
        return Err(error_from_status(status, message));
    }

    let envelope: Envelope<T> = serde_json::from_str(&body)
        .map_err(|e| StoreError::Network(format!("Malformed response: {}", e)))?;

    if !envelope.success {
        return Err(StoreError::Network(
            envelope
                .message
                .unwrap_or_else(|| "Request failed".to_string()),
        ));
    }

    envelope
        .data
        .ok_or_else(|| StoreError::Network("Response missing data".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_mapping_by_status() {
        let cases = [
            (400, "Validation"),
            (401, "Auth"),
            (404, "NotFound"),
            (409, "Conflict"),
            (500, "Network"),
        ];
        for (code, expected) in cases {
            let status = reqwest::StatusCode::from_u16(code).unwrap();
            let err = error_from_status(status, "boom".to_string());
            let name = match err {
                StoreError::Validation(_) => "Validation",
                StoreError::Auth(_) => "Auth",
                StoreError::NotFound(_) => "NotFound",
                StoreError::Conflict(_) => "Conflict",
                StoreError::Network(_) => "Network",
                StoreError::Storage(_) => "Storage",
            };
            assert_eq!(name, expected, "status {}", code);
        }
    }
}
