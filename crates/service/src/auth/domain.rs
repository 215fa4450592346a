use serde::{Deserialize, Serialize};

/// Login input
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginInput {
    pub username: String,
    pub password: String,
}

/// Directory entry (hashed password)
#[derive(Debug, Clone)]
pub struct DevUser {
    pub username: String,
    pub password_hash: String,
    pub roles: Vec<String>,
}

impl DevUser {
    /// Roles joined the way clients expect them, e.g. `ADMIN,USER`.
    pub fn role_string(&self) -> String { self.roles.join(",") }
}

/// Identity returned alongside a token
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionUser {
    pub username: String,
    pub role: String,
}

/// Login result (session)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginSession {
    pub access_token: String,
    pub token_type: String,
    pub user: SessionUser,
    /// Token lifetime in milliseconds.
    pub expires_in: u64,
}

/// JWT claims
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub roles: Vec<String>,
    pub iat: usize,
    pub exp: usize,
}

/// Plaintext development account, listed only when enabled.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DevCredential {
    pub username: String,
    pub password: String,
    pub role: String,
    pub description: String,
}
