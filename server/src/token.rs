//! Credential issuance and verification.
//!
//! Tokens are self-contained HS256 JWTs signed with the MAC secret derived
//! from the persisted RSA key (see `keys`).  Verification is a pure
//! function of (keys, header value, current time); no state is kept
//! between calls and storage is never consulted here.

use std::time::{SystemTime, UNIX_EPOCH};

use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use thiserror::Error;

use shared::types::jwt::JwtClaims;
use shared::types::profile::Profile;

/// Why a presented credential was rejected.
///
/// `Expired` is reported separately from `InvalidSignature` so clients can
/// tell a stale token from a forged one.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CredentialError {
    #[error("credential header must be '<scheme> <token>'")]
    Malformed,

    #[error("credential could not be decoded or its signature rejected")]
    InvalidSignature,

    #[error("credential has expired")]
    Expired,
}

/// HS256 key material, built once at startup and shared read-only across
/// every request.
pub struct TokenKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
}

impl TokenKeys {
    pub fn from_secret(secret: &[u8]) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        // Expiry is exact; the default 60s grace window would let expired
        // tokens through.
        validation.leeway = 0;

        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            validation,
        }
    }
}

/// Issue a signed credential for `profile`, expiring `ttl_secs` from now.
///
/// Pure computation.  Bumping the login count is the caller's job, after
/// issuance has succeeded.
pub fn issue(
    keys: &TokenKeys,
    profile: &Profile,
    ttl_secs: i64,
) -> Result<String, jsonwebtoken::errors::Error> {
    let now = unix_now();
    let claims = JwtClaims {
        sub: profile.phone.clone(),
        user_id: profile.id,
        name: profile.name.clone(),
        phone: profile.phone.clone(),
        iat: now as usize,
        exp: (now + ttl_secs) as usize,
    };

    encode(&Header::new(Algorithm::HS256), &claims, &keys.encoding)
}

/// Verify a presented `Authorization` header value and return the embedded
/// claims.
///
/// The header must split on a single space into exactly two parts; the
/// scheme itself is not inspected.  Signature and expiry are both enforced
/// by the decode step.
pub fn verify_credential(keys: &TokenKeys, header: &str) -> Result<JwtClaims, CredentialError> {
    let parts: Vec<&str> = header.split(' ').collect();
    if parts.len() != 2 {
        return Err(CredentialError::Malformed);
    }

    decode::<JwtClaims>(parts[1], &keys.decoding, &keys.validation)
        .map(|data| data.claims)
        .map_err(|e| match e.kind() {
            ErrorKind::ExpiredSignature => CredentialError::Expired,
            _ => CredentialError::InvalidSignature,
        })
}

fn unix_now() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_secs() as i64
}
