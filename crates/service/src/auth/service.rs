use std::sync::Arc;

use argon2::{Argon2, password_hash::{PasswordHasher, PasswordVerifier, SaltString}, PasswordHash};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header as JwtHeader, Validation};
use rand::rngs::OsRng;
use tracing::{debug, info, instrument, warn};

use super::domain::{AdminUser, AuthSession, Claims, Credentials, LoginInput, RegisterInput};
use super::errors::AuthError;
use super::repository::AuthRepository;

/// Auth service configuration
#[derive(Clone)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub token_ttl: Duration,
    pub password_algorithm: String,
}

impl AuthConfig {
    pub fn new(jwt_secret: impl Into<String>, token_ttl_hours: i64) -> Self {
        Self {
            jwt_secret: jwt_secret.into(),
            token_ttl: Duration::hours(token_ttl_hours),
            password_algorithm: "argon2".into(),
        }
    }
}

/// Admin authentication independent of web framework
pub struct AuthService<R: AuthRepository> {
    repo: Arc<R>,
    cfg: AuthConfig,
}

impl<R: AuthRepository> AuthService<R> {
    pub fn new(repo: Arc<R>, cfg: AuthConfig) -> Self { Self { repo, cfg } }

    /// Create an admin account with a hashed password.
    ///
    /// # Examples
    /// ```
    /// use service::auth::{service::{AuthService, AuthConfig}, repo::store::StoreAuthRepository};
    /// use service::auth::domain::RegisterInput;
    /// use service::storage::MemoryRecordStore;
    /// use std::sync::Arc;
    /// let repo = Arc::new(StoreAuthRepository::new(MemoryRecordStore::new()));
    /// let svc = AuthService::new(repo, AuthConfig::new("secret", 12));
    /// let input = RegisterInput { username: "owner".into(), password: "Secret123".into() };
    /// let admin = tokio_test::block_on(svc.register(input)).unwrap();
    /// assert_eq!(admin.username, "owner");
    /// ```
    #[instrument(skip(self, input), fields(username = %input.username))]
    pub async fn register(&self, input: RegisterInput) -> Result<AdminUser, AuthError> {
        let username = input.username.trim();
        if username.is_empty() {
            return Err(AuthError::Validation("username must not be empty".into()));
        }
        if input.password.len() < 8 {
            return Err(AuthError::Validation("password too short (>=8)".into()));
        }
        if let Some((existing, _)) = self.repo.find_by_username(username).await? {
            debug!("admin exists: {}", existing.username);
            return Err(AuthError::Conflict);
        }

        let salt = SaltString::generate(&mut OsRng);
        let hash = Argon2::default()
            .hash_password(input.password.as_bytes(), &salt)
            .map_err(|e| AuthError::HashError(e.to_string()))?
            .to_string();

        let admin = self
            .repo
            .create_admin(username, Credentials { password_hash: hash, password_algorithm: self.cfg.password_algorithm.clone() })
            .await?;
        info!(admin_id = %admin.id, username = %admin.username, "admin_registered");
        Ok(admin)
    }

    /// Create the first admin when none exists yet; `Ok(None)` otherwise.
    pub async fn bootstrap_admin(&self, username: &str, password: &str) -> Result<Option<AdminUser>, AuthError> {
        if self.repo.count_admins().await? > 0 {
            debug!("admins present; skipping bootstrap");
            return Ok(None);
        }
        let admin = self
            .register(RegisterInput { username: username.to_string(), password: password.to_string() })
            .await?;
        Ok(Some(admin))
    }

    /// Check credentials and issue a token.
    ///
    /// # Examples
    /// ```
    /// use service::auth::{service::{AuthService, AuthConfig}, repo::store::StoreAuthRepository};
    /// use service::auth::domain::{RegisterInput, LoginInput};
    /// use service::storage::MemoryRecordStore;
    /// use std::sync::Arc;
    /// let repo = Arc::new(StoreAuthRepository::new(MemoryRecordStore::new()));
    /// let svc = AuthService::new(repo, AuthConfig::new("secret", 12));
    /// let _ = tokio_test::block_on(svc.register(RegisterInput { username: "owner".into(), password: "Passw0rd".into() }));
    /// let session = tokio_test::block_on(svc.login(LoginInput { username: "owner".into(), password: "Passw0rd".into() })).unwrap();
    /// assert_eq!(session.admin.username, "owner");
    /// assert!(svc.verify_token(&session.token).is_ok());
    /// ```
    #[instrument(skip(self, input), fields(username = %input.username))]
    pub async fn login(&self, input: LoginInput) -> Result<AuthSession, AuthError> {
        let (admin, cred) = self
            .repo
            .find_by_username(input.username.trim())
            .await?
            .ok_or(AuthError::Unauthorized)?;

        if cred.password_algorithm != "argon2" {
            warn!(algorithm = %cred.password_algorithm, "unsupported password algorithm");
            return Err(AuthError::Unauthorized);
        }
        let parsed = PasswordHash::new(&cred.password_hash).map_err(|e| AuthError::HashError(e.to_string()))?;
        if Argon2::default().verify_password(input.password.as_bytes(), &parsed).is_err() {
            return Err(AuthError::Unauthorized);
        }

        let now = Utc::now();
        let claims = Claims {
            sub: admin.username.clone(),
            uid: admin.id.to_string(),
            iat: now.timestamp() as usize,
            exp: (now + self.cfg.token_ttl).timestamp() as usize,
        };
        let token = encode(&JwtHeader::default(), &claims, &EncodingKey::from_secret(self.cfg.jwt_secret.as_bytes()))
            .map_err(|e| AuthError::TokenError(e.to_string()))?;
        info!(admin_id = %admin.id, "admin_logged_in");
        Ok(AuthSession { admin, token })
    }

    /// Decode and check an HS256 token, including expiry.
    pub fn verify_token(&self, token: &str) -> Result<Claims, AuthError> {
        let key = DecodingKey::from_secret(self.cfg.jwt_secret.as_bytes());
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        decode::<Claims>(token, &key, &validation)
            .map(|data| data.claims)
            .map_err(|e| {
                debug!(err = %e, "token rejected");
                AuthError::Unauthorized
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::repo::store::StoreAuthRepository;
    use crate::storage::{MemoryRecordStore, RecordStore, Table};

    fn service(secret: &str, ttl_hours: i64) -> (Arc<MemoryRecordStore>, AuthService<StoreAuthRepository>) {
        let store = MemoryRecordStore::new();
        let repo = Arc::new(StoreAuthRepository::new(store.clone()));
        (store, AuthService::new(repo, AuthConfig::new(secret, ttl_hours)))
    }

    #[tokio::test]
    async fn register_rejects_short_password_and_duplicates() -> Result<(), anyhow::Error> {
        let (_, svc) = service("s", 1);
        let short = svc.register(RegisterInput { username: "a".into(), password: "short".into() }).await;
        assert!(matches!(short, Err(AuthError::Validation(_))));

        svc.register(RegisterInput { username: "owner".into(), password: "LongEnough1".into() }).await?;
        let dup = svc.register(RegisterInput { username: " owner ".into(), password: "LongEnough1".into() }).await;
        assert!(matches!(dup, Err(AuthError::Conflict)));
        Ok(())
    }

    #[tokio::test]
    async fn stored_admin_keeps_only_a_hash() -> Result<(), anyhow::Error> {
        let (store, svc) = service("s", 1);
        svc.register(RegisterInput { username: "owner".into(), password: "LongEnough1".into() }).await?;
        let rows = store.read(Table::Admins).await;
        assert_eq!(rows.len(), 1);
        let hash = rows[0]["password_hash"].as_str().unwrap();
        assert!(hash.starts_with("$argon2"));
        assert!(!hash.contains("LongEnough1"));
        Ok(())
    }

    #[tokio::test]
    async fn bootstrap_only_runs_on_empty_table() -> Result<(), anyhow::Error> {
        let (store, svc) = service("s", 1);
        assert!(svc.bootstrap_admin("owner", "LongEnough1").await?.is_some());
        assert!(svc.bootstrap_admin("second", "LongEnough2").await?.is_none());
        assert_eq!(store.read(Table::Admins).await.len(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn login_checks_password_and_issues_verifiable_token() -> Result<(), anyhow::Error> {
        let (_, svc) = service("top-secret", 2);
        let admin = svc.register(RegisterInput { username: "owner".into(), password: "LongEnough1".into() }).await?;

        let wrong = svc.login(LoginInput { username: "owner".into(), password: "nope-nope".into() }).await;
        assert!(matches!(wrong, Err(AuthError::Unauthorized)));
        let unknown = svc.login(LoginInput { username: "ghost".into(), password: "LongEnough1".into() }).await;
        assert!(matches!(unknown, Err(AuthError::Unauthorized)));

        let session = svc.login(LoginInput { username: "owner".into(), password: "LongEnough1".into() }).await?;
        let claims = svc.verify_token(&session.token)?;
        assert_eq!(claims.sub, "owner");
        assert_eq!(claims.uid, admin.id.to_string());
        assert!(claims.exp > claims.iat);
        Ok(())
    }

    #[tokio::test]
    async fn tokens_from_another_secret_are_rejected() -> Result<(), anyhow::Error> {
        let (_, issuer) = service("secret-a", 1);
        let (_, verifier) = service("secret-b", 1);
        issuer.register(RegisterInput { username: "owner".into(), password: "LongEnough1".into() }).await?;
        let session = issuer.login(LoginInput { username: "owner".into(), password: "LongEnough1".into() }).await?;

        assert!(matches!(verifier.verify_token(&session.token), Err(AuthError::Unauthorized)));
        assert!(matches!(issuer.verify_token("not-a-jwt"), Err(AuthError::Unauthorized)));
        Ok(())
    }

    #[tokio::test]
    async fn expired_tokens_are_rejected() -> Result<(), anyhow::Error> {
        let (_, svc) = service("s", 1);
        let now = Utc::now();
        let claims = Claims {
            sub: "owner".into(),
            uid: "1".into(),
            iat: (now - Duration::hours(3)).timestamp() as usize,
            exp: (now - Duration::hours(2)).timestamp() as usize,
        };
        let token = encode(&JwtHeader::default(), &claims, &EncodingKey::from_secret(b"s"))?;
        assert!(matches!(svc.verify_token(&token), Err(AuthError::Unauthorized)));
        Ok(())
    }
}
