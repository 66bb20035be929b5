use serde::{Deserialize, Serialize};

/// Authentication request data
#[derive(Debug, Deserialize)]
pub struct AuthenticateData {
    pub phone: String,
    pub password: String,
}

/// Authentication response codes
#[derive(Debug, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum AuthenticateResponse {
    Success {
        user_id: i64,
        name: String,
        phone: String,
        token: String,
        expires_in: u64,
        created_at: i64,
        updated_at: Option<i64>,
        message: String,
    },
    Error {
        code: String,
        message: String,
    },
}

/// Error codes for authentication
#[derive(Debug)]
pub enum AuthenticateError {
    InvalidCredentials,
    MissingField(String),
    DatabaseError,
    InternalError,
}

impl AuthenticateError {
    pub fn to_code(&self) -> &'static str {
        match self {
            Self::InvalidCredentials => "INVALID_CREDENTIALS",
            Self::MissingField(_) => "MISSING_FIELD",
            Self::DatabaseError => "DATABASE_ERROR",
            Self::InternalError => "INTERNAL_ERROR",
        }
    }

    pub fn to_message(&self) -> String {
        match self {
            Self::InvalidCredentials => "Invalid phone number or password".to_string(),
            Self::MissingField(field) => format!("Missing required field: {}", field),
            Self::DatabaseError => "Database error occurred".to_string(),
            Self::InternalError => "An internal error occurred".to_string(),
        }
    }

    pub fn to_response(&self) -> AuthenticateResponse {
        AuthenticateResponse::Error {
            code: self.to_code().to_string(),
            message: self.to_message(),
        }
    }
}
