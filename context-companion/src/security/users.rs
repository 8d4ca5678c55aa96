//! Configured principals and credential checks.

use crate::config::UserCredential;
use crate::error::GatewayError;
use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use secrecy::{ExposeSecret, Secret};
use std::collections::HashMap;

pub struct UserDirectory {
    users: HashMap<String, Secret<String>>,
}

impl UserDirectory {
    /// Every stored hash must be a well-formed PHC string.
    pub fn from_config(users: &[UserCredential]) -> Result<Self, GatewayError> {
        let users = users
            .iter()
            .map(|user| -> Result<(String, Secret<String>), GatewayError> {
                PasswordHash::new(user.password_hash.expose_secret()).map_err(|e| {
                    GatewayError::Configuration(format!(
                        "invalid password hash for user '{}': {}",
                        user.username, e
                    ))
                })?;
                Ok((user.username.clone(), user.password_hash.clone()))
            })
            .collect::<Result<_, GatewayError>>()?;

        Ok(Self { users })
    }

    /// Returns the principal name when the password matches.
    pub fn verify(&self, username: &str, password: &Secret<String>) -> Option<String> {
        let stored = self.users.get(username)?;
        let parsed = PasswordHash::new(stored.expose_secret()).ok()?;

        Argon2::default()
            .verify_password(password.expose_secret().as_bytes(), &parsed)
            .ok()
            .map(|_| username.to_string())
    }
}

/// Argon2id PHC string for a new password, salted from the OS RNG.
pub fn hash_password(password: &Secret<String>) -> Result<String, GatewayError> {
    let salt = SaltString::generate(&mut OsRng);

    Argon2::default()
        .hash_password(password.expose_secret().as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| GatewayError::Configuration(format!("failed to hash password: {}", e)))
}
