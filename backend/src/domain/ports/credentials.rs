//! Ports for password hashing and bearer token handling.

use chrono::{DateTime, Utc};

use crate::domain::{AccessToken, Error, Principal};

use super::define_port_error;

define_port_error! {
    /// Errors raised by credential adapters.
    pub enum CredentialError {
        /// Hashing or hash parsing failed.
        Hash { message: String } => "password hashing failed: {message}",
        /// Token signing failed.
        Signing { message: String } => "token signing failed: {message}",
        /// The presented token is malformed, forged or expired.
        InvalidToken { message: String } => "invalid token: {message}",
    }
}

impl From<CredentialError> for Error {
    fn from(value: CredentialError) -> Self {
        match value {
            CredentialError::InvalidToken { .. } => Error::unauthorized("invalid or expired token"),
            other => Error::internal(other.to_string()),
        }
    }
}

/// One-way password hashing.
#[cfg_attr(test, mockall::automock)]
pub trait PasswordHasher: Send + Sync {
    /// Hash a plain-text password.
    fn hash(&self, password: &str) -> Result<String, CredentialError>;

    /// Check a plain-text password against a stored hash.
    fn verify(&self, password: &str, hash: &str) -> Result<bool, CredentialError>;
}

/// Issues and validates signed bearer tokens.
#[cfg_attr(test, mockall::automock)]
pub trait TokenService: Send + Sync {
    /// Sign a token for `principal` valid from `issued_at`.
    fn issue(
        &self,
        principal: &Principal,
        issued_at: DateTime<Utc>,
    ) -> Result<AccessToken, CredentialError>;

    /// Validate a token and recover its principal.
    fn verify(&self, token: &str) -> Result<Principal, CredentialError>;
}
