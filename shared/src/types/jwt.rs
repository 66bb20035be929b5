use serde::{Deserialize, Serialize};

/// Claims embedded in every credential issued by the server.
///
/// Identity fields only.  Mutable profile state (login count, timestamps)
/// and the password hash are NOT embedded: a long-lived token must not
/// become a stale copy of the account, and the payload is only
/// signature-protected, not encrypted.  Handlers that need fresh state
/// re-fetch the profile from storage via `user_id`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JwtClaims {
    /// Standard JWT subject, set to the phone number.
    pub sub: String,

    /// Numeric profile ID (matches `profile.id`).
    pub user_id: i64,

    pub name: String,

    pub phone: String,

    /// Issued-at (Unix timestamp, seconds).
    pub iat: usize,

    /// Standard JWT expiry (Unix timestamp, seconds).
    pub exp: usize,
}
