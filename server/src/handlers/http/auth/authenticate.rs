use std::collections::HashMap;
use std::convert::Infallible;

use anyhow::Result;
use bytes::Bytes;
use http_body_util::BodyExt;
use http_body_util::combinators::BoxBody;
use hyper::{Request, Response, StatusCode};
use tracing::{error, info, warn};

use shared::types::authenticate::{AuthenticateData, AuthenticateError, AuthenticateResponse};
use shared::types::profile::Profile;

use crate::AppState;
use crate::handlers::http::utils::deliver_serialized_json;
use crate::token;

/// POST /authenticate
/// Verify phone + password and issue a credential.
pub async fn handle_authenticate(
    req: Request<hyper::body::Incoming>,
    state: AppState,
) -> Result<Response<BoxBody<Bytes, Infallible>>> {
    info!("Processing authentication request");

    let data = match parse_authenticate_request(req).await {
        Ok(data) => data,
        Err(e) => {
            warn!("Authentication parsing failed: {:?}", e.to_code());
            return deliver_serialized_json(&e.to_response(), StatusCode::BAD_REQUEST);
        }
    };

    if let Err(e) = validate_authenticate(&data) {
        warn!("Authentication validation failed: {:?}", e.to_code());
        return deliver_serialized_json(&e.to_response(), StatusCode::BAD_REQUEST);
    }

    match attempt_authenticate(&data, &state).await {
        Ok((profile, token)) => {
            info!(
                "Authentication successful for {} (ID: {})",
                profile.phone, profile.id
            );

            deliver_serialized_json(
                &AuthenticateResponse::Success {
                    user_id: profile.id,
                    name: profile.name,
                    phone: profile.phone,
                    token,
                    expires_in: state.config.auth.token_ttl_secs() as u64,
                    created_at: profile.created_at,
                    updated_at: profile.updated_at,
                    message: "Authentication successful".to_string(),
                },
                StatusCode::OK,
            )
        }
        Err(e) => {
            warn!("Authentication failed: {:?}", e.to_code());
            let status = match e {
                AuthenticateError::InvalidCredentials => StatusCode::UNAUTHORIZED,
                AuthenticateError::MissingField(_) => StatusCode::BAD_REQUEST,
                AuthenticateError::DatabaseError | AuthenticateError::InternalError => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            };
            deliver_serialized_json(&e.to_response(), status)
        }
    }
}

/// Parse authentication data from either a JSON or a form body.
async fn parse_authenticate_request(
    req: Request<hyper::body::Incoming>,
) -> std::result::Result<AuthenticateData, AuthenticateError> {
    let content_type = req
        .headers()
        .get("content-type")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
        .to_string();

    let body = req
        .collect()
        .await
        .map_err(|_| AuthenticateError::InternalError)?
        .to_bytes();

    if content_type.contains("application/json") {
        serde_json::from_slice::<AuthenticateData>(&body).map_err(|e| {
            warn!("Failed to parse authentication JSON: {}", e);
            AuthenticateError::InternalError
        })
    } else {
        let params = form_urlencoded::parse(body.as_ref())
            .into_owned()
            .collect::<HashMap<String, String>>();

        let phone = params
            .get("phone")
            .ok_or(AuthenticateError::MissingField("phone".to_string()))?
            .trim()
            .to_string();

        let password = params
            .get("password")
            .ok_or(AuthenticateError::MissingField("password".to_string()))?
            .to_string();

        Ok(AuthenticateData { phone, password })
    }
}

fn validate_authenticate(data: &AuthenticateData) -> std::result::Result<(), AuthenticateError> {
    if data.phone.is_empty() {
        return Err(AuthenticateError::MissingField("phone".to_string()));
    }

    if data.password.is_empty() {
        return Err(AuthenticateError::MissingField("password".to_string()));
    }

    Ok(())
}

/// Look the account up by phone, check the password, issue a credential,
/// and bump the login count.
///
/// An unknown phone and a wrong password are indistinguishable to the
/// caller.  The login count moves only after issuance has succeeded.
pub async fn attempt_authenticate(
    data: &AuthenticateData,
    state: &AppState,
) -> std::result::Result<(Profile, String), AuthenticateError> {
    use crate::database::profile as db_profile;

    info!("Attempting authentication for {}", data.phone);

    let profile = db_profile::get_profile_by_phone(&state.db, data.phone.clone())
        .await
        .map_err(|e| {
            error!("Database error getting profile: {}", e);
            AuthenticateError::DatabaseError
        })?
        .ok_or_else(|| {
            warn!("Unknown phone: {}", data.phone);
            AuthenticateError::InvalidCredentials
        })?;

    let password_valid =
        crate::database::utils::verify_password(&profile.password_hash, &data.password).map_err(
            |e| {
                error!("Password verification error: {}", e);
                AuthenticateError::InternalError
            },
        )?;

    if !password_valid {
        warn!("Invalid password for {}", data.phone);
        return Err(AuthenticateError::InvalidCredentials);
    }

    let token = token::issue(&state.keys, &profile, state.config.auth.token_ttl_secs()).map_err(
        |e| {
            error!("Credential issuance failed: {}", e);
            AuthenticateError::InternalError
        },
    )?;

    db_profile::update_login_count(&state.db, profile.id, profile.login_count + 1)
        .await
        .map_err(|e| {
            error!("Failed to update login count: {}", e);
            AuthenticateError::DatabaseError
        })?;

    Ok((profile, token))
}
