/// The persisted account record.
///
/// Deliberately does NOT derive `Serialize`: the password hash must never
/// end up in a response body or a token payload by accident.  Handlers
/// build their response JSON field by field.
#[derive(Debug, Clone)]
pub struct Profile {
    /// Assigned by storage on insert; never reused.
    pub id: i64,

    /// Unique business key; the lookup key for authentication.
    pub phone: String,

    pub name: String,

    /// Argon2 PHC string.  One-way; plaintext is dropped at registration.
    pub password_hash: String,

    /// Incremented by exactly one per successful authentication.
    pub login_count: i64,

    /// Unix seconds, set once at insert.
    pub created_at: i64,

    /// `None` until the first field update, then bumped on every update.
    pub updated_at: Option<i64>,
}

/// Insert payload: the columns storage does not assign itself.
#[derive(Debug, Clone)]
pub struct NewProfile {
    pub name: String,
    pub phone: String,
    pub password_hash: String,
}
