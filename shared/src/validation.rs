//! Field-level validation rules for account data.
//!
//! The predicates are pure functions over raw strings; `Rules` bundles the
//! limits into one value that is built once in `main` and handed to the
//! handlers through `AppState`, so tests can construct their own instance
//! instead of sharing process-global state.

use std::fmt;

/// Phone numbers must carry the Indonesian country prefix.
pub const PHONE_PREFIX: &str = "+62";

pub const NAME_MIN_LENGTH: usize = 3;
pub const NAME_MAX_LENGTH: usize = 60;

/// Digits only, excluding the prefix sign.
pub const PHONE_MIN_LENGTH: usize = 10;
pub const PHONE_MAX_LENGTH: usize = 13;

pub const PASSWORD_MIN_LENGTH: usize = 6;
pub const PASSWORD_MAX_LENGTH: usize = 64;

/// One human-readable message per failing field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldErrors(pub Vec<String>);

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.join(" | "))
    }
}

/// Validation rule set for profile fields.
#[derive(Debug, Clone)]
pub struct Rules {
    pub phone_prefix: String,
    pub name_min: usize,
    pub name_max: usize,
    pub phone_min: usize,
    pub phone_max: usize,
    pub password_min: usize,
    pub password_max: usize,
}

impl Default for Rules {
    fn default() -> Self {
        Self {
            phone_prefix: PHONE_PREFIX.to_string(),
            name_min: NAME_MIN_LENGTH,
            name_max: NAME_MAX_LENGTH,
            phone_min: PHONE_MIN_LENGTH,
            phone_max: PHONE_MAX_LENGTH,
            password_min: PASSWORD_MIN_LENGTH,
            password_max: PASSWORD_MAX_LENGTH,
        }
    }
}

impl Rules {
    /// Validate a name.
    ///
    /// Length-bounded, then checked for a run of at least three consecutive
    /// letters or spaces anywhere in the string.  This is a substring match,
    /// not a full match: "Mr. Junior" passes, and so does a name with other
    /// characters around a qualifying run.  Callers rely on that looseness;
    /// do not tighten it to a full-string match.
    pub fn is_valid_name(&self, name: &str) -> bool {
        let length = name.len();
        if length < self.name_min || length > self.name_max {
            return false;
        }

        let mut run = 0usize;
        for c in name.chars() {
            if c.is_ascii_alphabetic() || c == ' ' {
                run += 1;
                if run >= self.name_min {
                    return true;
                }
            } else {
                run = 0;
            }
        }
        false
    }

    /// Validate a phone number.
    ///
    /// Prefix sign plus 10–13 digits; every character must be a digit or a
    /// `+` (position unchecked), and the string must start with the
    /// configured country prefix.
    pub fn is_valid_phone(&self, phone: &str) -> bool {
        let length = phone.len();
        if length < self.phone_min + 1 || length > self.phone_max + 1 {
            return false;
        }

        for c in phone.chars() {
            if !c.is_numeric() && c != '+' {
                return false;
            }
        }

        phone.starts_with(&self.phone_prefix)
    }

    /// Validate a password.
    ///
    /// Length-bounded, and must contain at least one upper-case letter, one
    /// lower-case letter, one digit, and one punctuation or symbol
    /// character.  All characters are scanned; the four flags are collected
    /// in a single pass.
    pub fn is_valid_password(&self, pass: &str) -> bool {
        let length = pass.len();
        if length < self.password_min || length > self.password_max {
            return false;
        }

        let (mut has_upper, mut has_lower, mut has_number, mut has_special) =
            (false, false, false, false);
        for c in pass.chars() {
            if c.is_uppercase() {
                has_upper = true;
            } else if c.is_lowercase() {
                has_lower = true;
            } else if c.is_numeric() {
                has_number = true;
            } else if c.is_ascii_punctuation() {
                has_special = true;
            }
        }

        has_upper && has_lower && has_number && has_special
    }

    /// Validate all three registration fields, collecting one message per
    /// failing field.
    pub fn validate_registration(
        &self,
        name: &str,
        phone: &str,
        password: &str,
    ) -> Result<(), FieldErrors> {
        let mut msg = Vec::new();

        if !self.is_valid_name(name) {
            msg.push(format!(
                "'name' should have at least {} and at most {} alpha characters",
                self.name_min, self.name_max
            ));
        }
        if !self.is_valid_phone(phone) {
            msg.push(format!(
                "'phone' should start with {} and have {} to {} digits",
                self.phone_prefix, self.phone_min, self.phone_max
            ));
        }
        if !self.is_valid_password(password) {
            msg.push(
                "'password' should contain at least 1 lower case, 1 upper case, \
                 1 number and 1 special character"
                    .to_string(),
            );
        }

        if msg.is_empty() {
            Ok(())
        } else {
            Err(FieldErrors(msg))
        }
    }
}
