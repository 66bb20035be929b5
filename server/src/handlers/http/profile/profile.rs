// handlers/http/profile.rs
//
// Profile read and update for the authenticated account.
//
// Auth is performed by the router before either handler is called: the
// credential has been verified and `claims` decoded.  Claims are identity
// only, so both handlers re-fetch the profile from storage by id: the
// response always reflects the current record, not the snapshot taken at
// issuance time.

use std::collections::HashMap;
use std::convert::Infallible;

use anyhow::{Context, Result};
use bytes::Bytes;
use http_body_util::{BodyExt, Full, combinators::BoxBody};
use hyper::{Request, Response, StatusCode};
use tracing::{error, info, warn};

use shared::types::jwt::JwtClaims;
use shared::types::profile::Profile;
use shared::types::update::{ProfileError, UpdateProfileData, UpdateResponse};

use crate::AppState;
use crate::handlers::http::utils::{deliver_error_json, deliver_serialized_json};

// ===========================================================================
// get
// ===========================================================================

/// GET /profile
/// Return the authenticated account's current profile.
pub async fn handle_get_profile(
    _req: Request<hyper::body::Incoming>,
    state: AppState,
    claims: JwtClaims,
) -> Result<Response<BoxBody<Bytes, Infallible>>> {
    info!("Processing get profile for user {}", claims.user_id);

    use crate::database::profile as db_profile;

    let profile = match db_profile::get_profile_by_id(&state.db, claims.user_id).await {
        Ok(Some(p)) => p,
        Ok(None) => {
            return deliver_error_json("NOT_FOUND", "Profile not found", StatusCode::NOT_FOUND);
        }
        Err(e) => return Err(anyhow::anyhow!("Database error: {}", e)),
    };

    let profile_json = serde_json::json!({
        "status": "success",
        "data": {
            "id":          profile.id,
            "name":        profile.name,
            "phone":       profile.phone,
            "login_count": profile.login_count,
            "created_at":  profile.created_at,
            "updated_at":  profile.updated_at,
        }
    });

    Ok(Response::builder()
        .status(StatusCode::OK)
        .header("content-type", "application/json")
        .body(Full::new(Bytes::from(profile_json.to_string())).boxed())
        .context("Failed to build profile response")?)
}

// ===========================================================================
// update
// ===========================================================================

/// PUT /profile
/// Update the account's name and/or phone.
///
/// A field that is absent or fails validation is skipped rather than
/// rejected; when neither field qualifies the current record is returned
/// untouched.
pub async fn handle_update_profile(
    req: Request<hyper::body::Incoming>,
    state: AppState,
    claims: JwtClaims,
) -> Result<Response<BoxBody<Bytes, Infallible>>> {
    info!("Processing update profile for user {}", claims.user_id);

    let update_data = match parse_update_request(req).await {
        Ok(data) => data,
        Err(e) => {
            warn!("Profile update parsing failed: {:?}", e.to_code());
            return deliver_serialized_json(&e.to_response(), StatusCode::BAD_REQUEST);
        }
    };

    match apply_profile_update(claims.user_id, &update_data, &state).await {
        Ok(profile) => {
            info!("Profile updated for user {}", claims.user_id);
            deliver_serialized_json(
                &UpdateResponse::Success {
                    name: profile.name,
                    phone: profile.phone,
                    message: "Profile updated successfully".to_string(),
                },
                StatusCode::OK,
            )
        }
        Err(e) => {
            error!("Failed to update profile: {:?}", e.to_code());
            let status = match e {
                ProfileError::NotFound => StatusCode::NOT_FOUND,
                ProfileError::PhoneTaken => StatusCode::CONFLICT,
                ProfileError::DatabaseError | ProfileError::InternalError => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            };
            deliver_serialized_json(&e.to_response(), status)
        }
    }
}

/// Parse update data from either a JSON or a form body.  Empty strings are
/// treated as absent.
async fn parse_update_request(
    req: Request<hyper::body::Incoming>,
) -> std::result::Result<UpdateProfileData, ProfileError> {
    let content_type = req
        .headers()
        .get("content-type")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
        .to_string();

    let body = req
        .collect()
        .await
        .map_err(|_| ProfileError::InternalError)?
        .to_bytes();

    let data = if content_type.contains("application/json") {
        serde_json::from_slice::<UpdateProfileData>(&body).map_err(|e| {
            warn!("Failed to parse update JSON: {}", e);
            ProfileError::InternalError
        })?
    } else {
        let params = form_urlencoded::parse(body.as_ref())
            .into_owned()
            .collect::<HashMap<String, String>>();

        UpdateProfileData {
            name: params.get("name").map(|s| s.trim().to_string()),
            phone: params.get("phone").map(|s| s.trim().to_string()),
        }
    };

    Ok(UpdateProfileData {
        name: data.name.filter(|s| !s.is_empty()),
        phone: data.phone.filter(|s| !s.is_empty()),
    })
}

/// Apply the update, keeping only fields that pass validation.
pub async fn apply_profile_update(
    user_id: i64,
    data: &UpdateProfileData,
    state: &AppState,
) -> std::result::Result<Profile, ProfileError> {
    use crate::database::profile as db_profile;

    let mut profile = db_profile::get_profile_by_id(&state.db, user_id)
        .await
        .map_err(|e| {
            error!("Database error getting profile: {}", e);
            ProfileError::DatabaseError
        })?
        .ok_or(ProfileError::NotFound)?;

    let valid_name = data
        .name
        .as_deref()
        .is_some_and(|n| state.rules.is_valid_name(n));
    let valid_phone = data
        .phone
        .as_deref()
        .is_some_and(|p| state.rules.is_valid_phone(p));

    // Neither field qualifies: hand back the current record untouched.
    if !valid_name && !valid_phone {
        return Ok(profile);
    }

    if valid_name {
        profile.name = data.name.clone().unwrap_or_default();
    }

    if valid_phone {
        let new_phone = data.phone.clone().unwrap_or_default();
        if new_phone != profile.phone {
            let taken = db_profile::phone_exists(&state.db, new_phone.clone())
                .await
                .map_err(|e| {
                    error!("Database error checking phone: {}", e);
                    ProfileError::DatabaseError
                })?;
            if taken {
                warn!("Phone already registered: {}", new_phone);
                return Err(ProfileError::PhoneTaken);
            }
        }
        profile.phone = new_phone;
    }

    db_profile::update_profile(
        &state.db,
        profile.id,
        profile.name.clone(),
        profile.phone.clone(),
    )
    .await
    .map_err(|e| {
        if db_profile::is_unique_violation(&e) {
            warn!("Phone registered concurrently: {}", profile.phone);
            ProfileError::PhoneTaken
        } else {
            error!("Database error updating profile: {}", e);
            ProfileError::DatabaseError
        }
    })?;

    Ok(profile)
}
