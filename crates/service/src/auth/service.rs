use std::sync::Arc;

use argon2::{password_hash::PasswordVerifier, Argon2, PasswordHash};
use chrono::Utc;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header as JwtHeader, Validation};
use tracing::{info, instrument, warn};

use super::domain::{Claims, DevCredential, LoginInput, LoginSession, SessionUser};
use super::errors::AuthError;
use super::repository::UserDirectory;

pub const TOKEN_TYPE: &str = "Bearer";

/// Auth service configuration
#[derive(Clone)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub token_ttl_secs: u64,
}

/// Auth business service independent of web framework
pub struct AuthService<R: UserDirectory + ?Sized> {
    repo: Arc<R>,
    cfg: AuthConfig,
}

impl<R: UserDirectory + ?Sized> AuthService<R> {
    pub fn new(repo: Arc<R>, cfg: AuthConfig) -> Self { Self { repo, cfg } }

    /// Authenticate a user and issue a bearer token.
    ///
    /// # Examples
    /// ```
    /// use service::auth::{AuthService, AuthConfig, domain::LoginInput, repository::InMemoryUserDirectory};
    /// use std::sync::Arc;
    /// let dir = Arc::new(InMemoryUserDirectory::seeded().unwrap());
    /// let svc = AuthService::new(dir, AuthConfig { jwt_secret: "secret".into(), token_ttl_secs: 60 });
    /// let session = tokio_test::block_on(svc.login(LoginInput { username: "admin".into(), password: "admin123".into() })).unwrap();
    /// assert_eq!(session.token_type, "Bearer");
    /// assert_eq!(session.user.role, "ADMIN,USER");
    /// assert_eq!(session.expires_in, 60_000);
    /// ```
    #[instrument(skip(self, input), fields(username = %input.username))]
    pub async fn login(&self, input: LoginInput) -> Result<LoginSession, AuthError> {
        if input.username.trim().is_empty() || input.password.is_empty() {
            return Err(AuthError::Validation("username and password are required".into()));
        }
        let user = self.repo.find_by_username(&input.username).await?.ok_or_else(|| {
            warn!("login_unknown_user");
            AuthError::Unauthorized
        })?;

        let parsed = PasswordHash::new(&user.password_hash).map_err(|e| AuthError::HashError(e.to_string()))?;
        if Argon2::default().verify_password(input.password.as_bytes(), &parsed).is_err() {
            warn!("login_bad_password");
            return Err(AuthError::Unauthorized);
        }

        let now = Utc::now().timestamp() as usize;
        let claims = Claims {
            sub: user.username.clone(),
            roles: user.roles.clone(),
            iat: now,
            exp: now + self.cfg.token_ttl_secs as usize,
        };
        let access_token = encode(&JwtHeader::default(), &claims, &EncodingKey::from_secret(self.cfg.jwt_secret.as_bytes()))
            .map_err(|e| AuthError::TokenError(e.to_string()))?;

        info!(username = %user.username, "user_logged_in");
        Ok(LoginSession {
            access_token,
            token_type: TOKEN_TYPE.to_string(),
            user: SessionUser { username: user.username.clone(), role: user.role_string() },
            expires_in: self.cfg.token_ttl_secs.saturating_mul(1000),
        })
    }

    /// Validate signature and expiry of a token issued by [`AuthService::login`].
    pub fn verify(&self, token: &str) -> Result<Claims, AuthError> {
        let validation = Validation::new(Algorithm::HS256);
        decode::<Claims>(token, &DecodingKey::from_secret(self.cfg.jwt_secret.as_bytes()), &validation)
            .map(|data| data.claims)
            .map_err(|_| AuthError::InvalidToken)
    }

    pub fn dev_credentials(&self) -> Vec<DevCredential> { self.repo.dev_credentials() }
}
