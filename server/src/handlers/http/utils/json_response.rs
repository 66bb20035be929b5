use std::convert::Infallible;

use anyhow::{Context, Result};
use bytes::Bytes;
use http_body_util::{BodyExt, Full, combinators::BoxBody};
use hyper::{Response, StatusCode};
use serde::Serialize;

use shared::types::ErrorResponse;

/// Serialize `data` and deliver it as an `application/json` response.
pub fn deliver_serialized_json<T: Serialize>(
    data: &T,
    status: StatusCode,
) -> Result<Response<BoxBody<Bytes, Infallible>>> {
    let json = serde_json::to_string(data).context("Failed to serialize response")?;

    Response::builder()
        .status(status)
        .header("content-type", "application/json")
        .body(Full::new(Bytes::from(json)).boxed())
        .context("Failed to build response")
}

/// Deliver a standard error body.
pub fn deliver_error_json(
    code: &str,
    message: &str,
    status: StatusCode,
) -> Result<Response<BoxBody<Bytes, Infallible>>> {
    deliver_serialized_json(&ErrorResponse::new(code, message), status)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_json_sets_status_and_content_type() {
        let resp =
            deliver_error_json("NOT_FOUND", "Endpoint not found", StatusCode::NOT_FOUND).unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        assert_eq!(
            resp.headers().get("content-type").unwrap(),
            "application/json"
        );
    }
}
