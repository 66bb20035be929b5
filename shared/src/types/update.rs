use serde::{Deserialize, Serialize};

/// Profile update request.  Both fields optional; a field that is absent,
/// empty, or invalid is left untouched.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateProfileData {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
}

/// Profile update response codes
#[derive(Debug, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum UpdateResponse {
    Success {
        name: String,
        phone: String,
        message: String,
    },
    Error {
        code: String,
        message: String,
    },
}

/// Error codes for the profile endpoints
#[derive(Debug)]
pub enum ProfileError {
    NotFound,
    PhoneTaken,
    DatabaseError,
    InternalError,
}

impl ProfileError {
    pub fn to_code(&self) -> &'static str {
        match self {
            Self::NotFound => "NOT_FOUND",
            Self::PhoneTaken => "PHONE_TAKEN",
            Self::DatabaseError => "DATABASE_ERROR",
            Self::InternalError => "INTERNAL_ERROR",
        }
    }

    pub fn to_message(&self) -> String {
        match self {
            Self::NotFound => "Profile not found".to_string(),
            Self::PhoneTaken => "Phone number is already registered".to_string(),
            Self::DatabaseError => "Database error occurred".to_string(),
            Self::InternalError => "An internal error occurred".to_string(),
        }
    }

    pub fn to_response(&self) -> UpdateResponse {
        UpdateResponse::Error {
            code: self.to_code().to_string(),
            message: self.to_message(),
        }
    }
}
