//! Authentication base fields shared by every account.
//!
//! Accounts are composed from an [`AuthBase`] plus the marketplace-specific
//! columns instead of inheriting them, see [`crate::entities::user::NewUser`].

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use tracing::{debug, warn};
use validator::Validate;

use crate::error::{ModelError, Result};

/// Prefix marking a password that can never be used to log in.
pub const UNUSABLE_PASSWORD_PREFIX: &str = "!";

/// Identity and login fields of an account.
#[derive(Debug, Clone, Validate)]
pub struct AuthBase {
    #[validate(length(min = 1, max = 150))]
    pub username: String,
    /// PHC-formatted argon2 hash, never the raw password.
    pub password: String,
    #[validate(length(max = 150))]
    pub first_name: String,
    #[validate(length(max = 150))]
    pub last_name: String,
    pub is_staff: bool,
    pub is_superuser: bool,
    pub is_active: bool,
}

impl AuthBase {
    /// An active, non-staff account with an unusable password.
    pub fn new(username: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: UNUSABLE_PASSWORD_PREFIX.to_string(),
            first_name: String::new(),
            last_name: String::new(),
            is_staff: false,
            is_superuser: false,
            is_active: true,
        }
    }

    pub fn with_password(mut self, raw: &str) -> Result<Self> {
        self.set_password(raw)?;
        Ok(self)
    }

    pub fn with_names(mut self, first_name: impl Into<String>, last_name: impl Into<String>) -> Self {
        self.first_name = first_name.into();
        self.last_name = last_name.into();
        self
    }

    pub fn set_password(&mut self, raw: &str) -> Result<()> {
        self.password = hash_password(raw)?;
        Ok(())
    }

    pub fn check_password(&self, raw: &str) -> bool {
        verify_password(raw, &self.password)
    }
}

/// Hashes `raw` with argon2 and a fresh random salt.
pub fn hash_password(raw: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(raw.as_bytes(), &salt)
        .map_err(|e| ModelError::Password(e.to_string()))?;
    Ok(hash.to_string())
}

/// Verifies `raw` against a stored hash. Unusable or malformed hashes never
/// verify.
pub fn verify_password(raw: &str, stored: &str) -> bool {
    if stored.is_empty() || stored.starts_with(UNUSABLE_PASSWORD_PREFIX) {
        debug!("Stored password is unusable");
        return false;
    }
    let parsed = match PasswordHash::new(stored) {
        Ok(parsed) => parsed,
        Err(e) => {
            warn!("Malformed password hash: {}", e);
            return false;
        }
    };
    Argon2::default()
        .verify_password(raw.as_bytes(), &parsed)
        .is_ok()
}
