//! End-to-end flows over an in-memory database: the same register /
//! authenticate / profile paths the HTTP handlers drive, minus the socket.

use std::sync::Arc;

use tokio_rusqlite::Connection;

use server::handlers::http::auth::authenticate::attempt_authenticate;
use server::handlers::http::auth::register::attempt_register;
use server::handlers::http::profile::profile::apply_profile_update;
use server::token::{self, CredentialError, TokenKeys};
use server::{AppState, database};
use shared::types::authenticate::{AuthenticateData, AuthenticateError};
use shared::types::register::{RegisterData, RegisterError};
use shared::types::server_config::AppConfig;
use shared::types::update::{ProfileError, UpdateProfileData};
use shared::validation::Rules;

async fn test_state() -> AppState {
    let db = Connection::open_in_memory().await.unwrap();
    database::create::create_tables(&db).await.unwrap();

    AppState {
        db,
        config: Arc::new(AppConfig::default()),
        keys: Arc::new(TokenKeys::from_secret(b"integration-test-mac-secret-32b!")),
        rules: Arc::new(Rules::default()),
    }
}

fn narto() -> RegisterData {
    RegisterData {
        name: "narto".to_string(),
        phone: "+6281122334455".to_string(),
        password: "Aa123!@#".to_string(),
    }
}

async fn register(state: &AppState, data: &RegisterData) -> Result<i64, RegisterError> {
    let hash = database::utils::hash_password(&data.password).unwrap();
    attempt_register(data, &hash, state).await
}

#[tokio::test]
async fn register_creates_a_profile_without_storing_plaintext() {
    let state = test_state().await;
    let user_id = register(&state, &narto()).await.unwrap();

    let profile = database::profile::get_profile_by_id(&state.db, user_id)
        .await
        .unwrap()
        .expect("profile should exist");

    assert_eq!(profile.name, "narto");
    assert_eq!(profile.phone, "+6281122334455");
    assert_eq!(profile.login_count, 0);
    assert!(profile.updated_at.is_none());

    // Stored as a one-way hash, never the plaintext.
    assert_ne!(profile.password_hash, "Aa123!@#");
    assert!(
        database::utils::verify_password(&profile.password_hash, "Aa123!@#").unwrap()
    );
}

#[tokio::test]
async fn registering_the_same_phone_twice_conflicts() {
    let state = test_state().await;
    register(&state, &narto()).await.unwrap();

    let err = register(&state, &narto()).await.unwrap_err();
    assert!(matches!(err, RegisterError::PhoneTaken));
}

#[tokio::test]
async fn authenticate_issues_a_verifiable_token_and_bumps_the_count() {
    let state = test_state().await;
    let user_id = register(&state, &narto()).await.unwrap();

    let (profile, token) = attempt_authenticate(
        &AuthenticateData {
            phone: "+6281122334455".to_string(),
            password: "Aa123!@#".to_string(),
        },
        &state,
    )
    .await
    .unwrap();

    assert_eq!(profile.id, user_id);

    // The issued credential verifies against the same keys and carries the
    // identity of the account that authenticated.
    let claims = token::verify_credential(&state.keys, &format!("Bearer {}", token)).unwrap();
    assert_eq!(claims.user_id, user_id);
    assert_eq!(claims.phone, "+6281122334455");
    assert_eq!(claims.name, "narto");

    // Incremented by exactly one.
    let stored = database::profile::get_profile_by_id(&state.db, user_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.login_count, 1);
}

#[tokio::test]
async fn each_authentication_increments_once() {
    let state = test_state().await;
    let user_id = register(&state, &narto()).await.unwrap();

    for expected in 1..=3i64 {
        attempt_authenticate(
            &AuthenticateData {
                phone: "+6281122334455".to_string(),
                password: "Aa123!@#".to_string(),
            },
            &state,
        )
        .await
        .unwrap();

        let stored = database::profile::get_profile_by_id(&state.db, user_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.login_count, expected);
    }
}

#[tokio::test]
async fn wrong_password_fails_and_leaves_the_count_unchanged() {
    let state = test_state().await;
    let user_id = register(&state, &narto()).await.unwrap();

    let err = attempt_authenticate(
        &AuthenticateData {
            phone: "+6281122334455".to_string(),
            password: "Wrong1!@".to_string(),
        },
        &state,
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AuthenticateError::InvalidCredentials));

    let stored = database::profile::get_profile_by_id(&state.db, user_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.login_count, 0);
}

#[tokio::test]
async fn unknown_phone_is_indistinguishable_from_wrong_password() {
    let state = test_state().await;

    let err = attempt_authenticate(
        &AuthenticateData {
            phone: "+6299999999999".to_string(),
            password: "Aa123!@#".to_string(),
        },
        &state,
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AuthenticateError::InvalidCredentials));
}

#[tokio::test]
async fn expired_credential_is_rejected_without_touching_storage() {
    let state = test_state().await;
    let user_id = register(&state, &narto()).await.unwrap();

    let profile = database::profile::get_profile_by_id(&state.db, user_id)
        .await
        .unwrap()
        .unwrap();

    // Issue a token that expired an hour ago; the router's verification
    // step rejects it before any handler or storage call runs.
    let stale = token::issue(&state.keys, &profile, -3600).unwrap();
    let err = token::verify_credential(&state.keys, &format!("Bearer {}", stale)).unwrap_err();
    assert_eq!(err, CredentialError::Expired);
}

#[tokio::test]
async fn update_applies_only_valid_fields() {
    let state = test_state().await;
    let user_id = register(&state, &narto()).await.unwrap();

    // Valid name, invalid phone: the name lands, the phone is skipped.
    let updated = apply_profile_update(
        user_id,
        &UpdateProfileData {
            name: Some("Mr. Junior".to_string()),
            phone: Some("12345".to_string()),
        },
        &state,
    )
    .await
    .unwrap();
    assert_eq!(updated.name, "Mr. Junior");
    assert_eq!(updated.phone, "+6281122334455");

    let stored = database::profile::get_profile_by_id(&state.db, user_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.name, "Mr. Junior");
    assert!(stored.updated_at.is_some(), "updated_at stamped on update");
}

#[tokio::test]
async fn update_with_no_valid_fields_is_a_no_op() {
    let state = test_state().await;
    let user_id = register(&state, &narto()).await.unwrap();

    let unchanged = apply_profile_update(
        user_id,
        &UpdateProfileData {
            name: Some("ab".to_string()),
            phone: None,
        },
        &state,
    )
    .await
    .unwrap();
    assert_eq!(unchanged.name, "narto");

    // Nothing was written; updated_at is still null.
    let stored = database::profile::get_profile_by_id(&state.db, user_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.name, "narto");
    assert!(stored.updated_at.is_none());
}

#[tokio::test]
async fn update_to_another_accounts_phone_conflicts() {
    let state = test_state().await;
    register(&state, &narto()).await.unwrap();

    let second_id = register(
        &state,
        &RegisterData {
            name: "sasuke".to_string(),
            phone: "+6281122334466".to_string(),
            password: "Bb456!@#".to_string(),
        },
    )
    .await
    .unwrap();

    let err = apply_profile_update(
        second_id,
        &UpdateProfileData {
            name: None,
            phone: Some("+6281122334455".to_string()),
        },
        &state,
    )
    .await
    .unwrap_err();
    assert!(matches!(err, ProfileError::PhoneTaken));
}

#[tokio::test]
async fn update_for_a_deleted_profile_is_not_found() {
    let state = test_state().await;

    let err = apply_profile_update(
        999,
        &UpdateProfileData {
            name: Some("narto".to_string()),
            phone: None,
        },
        &state,
    )
    .await
    .unwrap_err();
    assert!(matches!(err, ProfileError::NotFound));
}
