use std::collections::HashMap;
use std::convert::Infallible;

use anyhow::{Context, Result};
use bytes::Bytes;
use http_body_util::BodyExt;
use http_body_util::combinators::BoxBody;
use hyper::{Request, Response, StatusCode};
use tracing::{error, info, warn};

use shared::types::profile::NewProfile;
use shared::types::register::{RegisterData, RegisterError, RegisterResponse};

use crate::AppState;
use crate::handlers::http::utils::deliver_serialized_json;

/// POST /register
/// Create a new account.
///
/// Accepts JSON or form-encoded bodies.  The password is hashed before it
/// ever reaches storage and is never echoed back.
pub async fn handle_register(
    req: Request<hyper::body::Incoming>,
    state: AppState,
) -> Result<Response<BoxBody<Bytes, Infallible>>> {
    info!("Processing registration request");

    let data = match parse_register_request(req).await {
        Ok(data) => data,
        Err(e) => {
            warn!("Registration parsing failed: {:?}", e.to_code());
            return deliver_serialized_json(&e.to_response(), StatusCode::BAD_REQUEST);
        }
    };

    if let Err(fields) = state
        .rules
        .validate_registration(&data.name, &data.phone, &data.password)
    {
        warn!("Registration validation failed: {}", fields);
        return deliver_serialized_json(
            &RegisterError::Validation(fields.to_string()).to_response(),
            StatusCode::BAD_REQUEST,
        );
    }

    let hashed_password =
        crate::database::utils::hash_password(&data.password).context("Failed to hash password")?;

    match attempt_register(&data, &hashed_password, &state).await {
        Ok(user_id) => {
            info!("Profile registered: {} (ID: {})", data.phone, user_id);
            deliver_serialized_json(
                &RegisterResponse::Success {
                    user_id,
                    name: data.name.clone(),
                    phone: data.phone.clone(),
                    message: "Registration successful".to_string(),
                },
                StatusCode::CREATED,
            )
        }
        Err(e) => {
            error!("Registration failed: {:?}", e.to_code());
            let status = match e {
                RegisterError::PhoneTaken => StatusCode::CONFLICT,
                RegisterError::DatabaseError | RegisterError::InternalError => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
                _ => StatusCode::BAD_REQUEST,
            };
            deliver_serialized_json(&e.to_response(), status)
        }
    }
}

/// Parse registration data from either a JSON or a form body.
async fn parse_register_request(
    req: Request<hyper::body::Incoming>,
) -> std::result::Result<RegisterData, RegisterError> {
    let content_type = req
        .headers()
        .get("content-type")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
        .to_string();

    let body = req
        .collect()
        .await
        .map_err(|_| RegisterError::InternalError)?
        .to_bytes();

    if content_type.contains("application/json") {
        serde_json::from_slice::<RegisterData>(&body).map_err(|e| {
            warn!("Failed to parse registration JSON: {}", e);
            RegisterError::InternalError
        })
    } else {
        let params = form_urlencoded::parse(body.as_ref())
            .into_owned()
            .collect::<HashMap<String, String>>();

        let name = params
            .get("name")
            .ok_or(RegisterError::MissingField("name".to_string()))?
            .trim()
            .to_string();

        let phone = params
            .get("phone")
            .ok_or(RegisterError::MissingField("phone".to_string()))?
            .trim()
            .to_string();

        let password = params
            .get("password")
            .ok_or(RegisterError::MissingField("password".to_string()))?
            .to_string();

        Ok(RegisterData {
            name,
            phone,
            password,
        })
    }
}

/// Attempt to persist the new profile.
///
/// The phone pre-check gives the common duplicate a clean 409; the unique
/// constraint on the column closes the race the pre-check leaves open.
pub async fn attempt_register(
    data: &RegisterData,
    hashed_password: &str,
    state: &AppState,
) -> std::result::Result<i64, RegisterError> {
    use crate::database::profile as db_profile;

    info!("Attempting registration for {}", data.phone);

    let taken = db_profile::phone_exists(&state.db, data.phone.clone())
        .await
        .map_err(|e| {
            error!("Database error checking phone: {}", e);
            RegisterError::DatabaseError
        })?;

    if taken {
        warn!("Phone already registered: {}", data.phone);
        return Err(RegisterError::PhoneTaken);
    }

    let user_id = db_profile::save_profile(
        &state.db,
        NewProfile {
            name: data.name.clone(),
            phone: data.phone.clone(),
            password_hash: hashed_password.to_string(),
        },
    )
    .await
    .map_err(|e| {
        if db_profile::is_unique_violation(&e) {
            warn!("Phone registered concurrently: {}", data.phone);
            RegisterError::PhoneTaken
        } else {
            error!("Database error creating profile: {}", e);
            RegisterError::DatabaseError
        }
    })?;

    Ok(user_id)
}
