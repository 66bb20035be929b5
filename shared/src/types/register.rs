use serde::{Deserialize, Serialize};

/// Registration request data (supports both form-encoded and JSON)
#[derive(Debug, Clone, Deserialize)]
pub struct RegisterData {
    pub name: String,
    pub phone: String,
    pub password: String,
}

/// Registration response codes
#[derive(Debug, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RegisterResponse {
    Success {
        user_id: i64,
        name: String,
        phone: String,
        message: String,
    },
    Error {
        code: String,
        message: String,
    },
}

/// Error codes for registration
#[derive(Debug)]
pub enum RegisterError {
    /// One message per failing field, already joined with " | ".
    Validation(String),
    PhoneTaken,
    MissingField(String),
    DatabaseError,
    InternalError,
}

impl RegisterError {
    pub fn to_code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "VALIDATION_FAILED",
            Self::PhoneTaken => "PHONE_TAKEN",
            Self::MissingField(_) => "MISSING_FIELD",
            Self::DatabaseError => "DATABASE_ERROR",
            Self::InternalError => "INTERNAL_ERROR",
        }
    }

    pub fn to_message(&self) -> String {
        match self {
            Self::Validation(msg) => msg.clone(),
            Self::PhoneTaken => "Phone number is already registered".to_string(),
            Self::MissingField(field) => format!("Missing required field: {}", field),
            Self::DatabaseError => "Database error occurred".to_string(),
            Self::InternalError => "An internal error occurred".to_string(),
        }
    }

    pub fn to_response(&self) -> RegisterResponse {
        RegisterResponse::Error {
            code: self.to_code().to_string(),
            message: self.to_message(),
        }
    }
}
