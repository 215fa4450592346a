use std::collections::HashMap;

use argon2::{password_hash::{PasswordHasher, SaltString}, Argon2};
use async_trait::async_trait;
use rand::rngs::OsRng;

use super::domain::{DevCredential, DevUser};
use super::errors::AuthError;

/// Lookup of known users.
#[async_trait]
pub trait UserDirectory: Send + Sync {
    async fn find_by_username(&self, username: &str) -> Result<Option<DevUser>, AuthError>;
    /// Accounts that may be shown in plaintext to developers.
    fn dev_credentials(&self) -> Vec<DevCredential>;
}

struct Seed {
    username: &'static str,
    password: &'static str,
    roles: &'static [&'static str],
    description: &'static str,
}

const SEED_USERS: &[Seed] = &[
    Seed { username: "admin", password: "admin123", roles: &["ADMIN", "USER"], description: "Administrator account with full access" },
    Seed { username: "user", password: "user123", roles: &["USER"], description: "Regular user account" },
    Seed { username: "vendor", password: "vendor123", roles: &["VENDOR", "USER"], description: "Vendor account" },
];

fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|h| h.to_string())
        .map_err(|e| AuthError::HashError(e.to_string()))
}

/// Fixed development users held in memory.
pub struct InMemoryUserDirectory {
    users: HashMap<String, DevUser>,
    credentials: Vec<DevCredential>,
}

impl InMemoryUserDirectory {
    /// Build the directory with the built-in development accounts.
    pub fn seeded() -> Result<Self, AuthError> {
        let mut users = HashMap::with_capacity(SEED_USERS.len());
        let mut credentials = Vec::with_capacity(SEED_USERS.len());
        for seed in SEED_USERS {
            let user = DevUser {
                username: seed.username.to_string(),
                password_hash: hash_password(seed.password)?,
                roles: seed.roles.iter().map(|r| r.to_string()).collect(),
            };
            credentials.push(DevCredential {
                username: seed.username.to_string(),
                password: seed.password.to_string(),
                role: user.role_string(),
                description: seed.description.to_string(),
            });
            users.insert(user.username.clone(), user);
        }
        Ok(Self { users, credentials })
    }
}

#[async_trait]
impl UserDirectory for InMemoryUserDirectory {
    async fn find_by_username(&self, username: &str) -> Result<Option<DevUser>, AuthError> {
        Ok(self.users.get(username).cloned())
    }

    fn dev_credentials(&self) -> Vec<DevCredential> { self.credentials.clone() }
}
