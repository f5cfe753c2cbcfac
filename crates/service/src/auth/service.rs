use std::sync::Arc;

use argon2::{Argon2, password_hash::{PasswordHasher, PasswordVerifier, SaltString}, PasswordHash};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header as JwtHeader, Validation};
use models::user::Role;
use rand::rngs::OsRng;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use super::domain::{AuthSession, AuthUser, Claims, LoginInput, RegisterInput};
use super::errors::AuthError;
use super::repository::AuthRepository;

const MIN_PASSWORD_LEN: usize = 8;

/// Auth service configuration
#[derive(Clone)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub token_ttl_hours: i64,
    pub password_algorithm: String,
}

impl AuthConfig {
    pub fn from_settings(cfg: &configs::AuthConfig) -> Self {
        Self {
            jwt_secret: cfg.jwt_secret.clone(),
            token_ttl_hours: cfg.token_ttl_hours,
            password_algorithm: "argon2".into(),
        }
    }
}

/// Auth business service independent of web framework
pub struct AuthService<R: AuthRepository> {
    repo: Arc<R>,
    cfg: AuthConfig,
}

fn hash_password(password: &str) -> Result<String, AuthError> {
    if password.len() < MIN_PASSWORD_LEN {
        return Err(AuthError::Validation(format!("password too short (>={MIN_PASSWORD_LEN})")));
    }
    let salt = SaltString::generate(&mut OsRng);
    Ok(Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| AuthError::HashError(e.to_string()))?
        .to_string())
}

impl<R: AuthRepository> AuthService<R> {
    pub fn new(repo: Arc<R>, cfg: AuthConfig) -> Self { Self { repo, cfg } }

    /// Register a new user with a hashed password. New users start as `viewer`.
    ///
    /// # Examples
    /// ```
    /// use service::auth::{service::{AuthService, AuthConfig}, repository::mock::MockAuthRepository};
    /// use service::auth::domain::RegisterInput;
    /// use std::sync::Arc;
    /// let repo = Arc::new(MockAuthRepository::default());
    /// let cfg = AuthConfig { jwt_secret: "secret".into(), token_ttl_hours: 12, password_algorithm: "argon2".into() };
    /// let svc = AuthService::new(repo, cfg);
    /// let input = RegisterInput { email: "user@example.com".into(), name: "Test".into(), password: "Secret123".into() };
    /// let user = tokio_test::block_on(svc.register(input)).unwrap();
    /// assert_eq!(user.email, "user@example.com");
    /// assert_eq!(user.role, models::user::Role::Viewer);
    /// ```
    #[instrument(skip(self, input), fields(email = %input.email))]
    pub async fn register(&self, input: RegisterInput) -> Result<AuthUser, AuthError> {
        self.create(&input.email, &input.name, &input.password, Role::Viewer).await
    }

    async fn create(&self, email: &str, name: &str, password: &str, role: Role) -> Result<AuthUser, AuthError> {
        let email = models::validate::email(email)?;
        let name = models::validate::text("name", name, 1, 128)?;
        let hash = hash_password(password)?;
        if let Some(existing) = self.repo.find_user_by_email(&email).await? {
            debug!("user exists: {}", existing.email);
            return Err(AuthError::Conflict);
        }

        let user = self.repo.create_user(&email, &name, role).await?;
        let _cred = self.repo.upsert_password(user.id, hash, self.cfg.password_algorithm.clone()).await?;
        info!(user_id = %user.id, email = %user.email, role = %user.role, "user_registered");
        Ok(user)
    }

    /// Authenticate a user and issue a signed token.
    ///
    /// # Examples
    /// ```
    /// use service::auth::{service::{AuthService, AuthConfig}, repository::mock::MockAuthRepository};
    /// use service::auth::domain::{RegisterInput, LoginInput};
    /// use std::sync::Arc;
    /// let repo = Arc::new(MockAuthRepository::default());
    /// let cfg = AuthConfig { jwt_secret: "secret".into(), token_ttl_hours: 12, password_algorithm: "argon2".into() };
    /// let svc = AuthService::new(repo.clone(), cfg);
    /// let _ = tokio_test::block_on(svc.register(RegisterInput { email: "u@e.com".into(), name: "N".into(), password: "Passw0rd".into() }));
    /// let session = tokio_test::block_on(svc.login(LoginInput { email: "u@e.com".into(), password: "Passw0rd".into() })).unwrap();
    /// assert_eq!(session.user.email, "u@e.com");
    /// let claims = svc.verify_token(&session.token).unwrap();
    /// assert_eq!(claims.uid, session.user.id);
    /// ```
    #[instrument(skip(self, input), fields(email = %input.email))]
    pub async fn login(&self, input: LoginInput) -> Result<AuthSession, AuthError> {
        let user = self.repo
            .find_user_by_email(&input.email)
            .await?
            .ok_or(AuthError::Unauthorized)?;

        let cred = self.repo
            .get_credentials(user.id)
            .await?
            .ok_or(AuthError::Unauthorized)?;

        let parsed = PasswordHash::new(&cred.password_hash).map_err(|e| AuthError::HashError(e.to_string()))?;
        if Argon2::default().verify_password(input.password.as_bytes(), &parsed).is_err() {
            warn!(user_id = %user.id, "login_failed");
            return Err(AuthError::Unauthorized);
        }
        if !user.is_active {
            warn!(user_id = %user.id, "login_inactive_user");
            return Err(AuthError::Unauthorized);
        }

        let now = chrono::Utc::now();
        let claims = Claims {
            sub: user.email.clone(),
            uid: user.id,
            role: user.role,
            iat: now.timestamp(),
            exp: (now + chrono::Duration::hours(self.cfg.token_ttl_hours)).timestamp(),
        };
        let token = encode(&JwtHeader::new(Algorithm::HS256), &claims, &EncodingKey::from_secret(self.cfg.jwt_secret.as_bytes()))
            .map_err(|e| AuthError::TokenError(e.to_string()))?;
        info!(user_id = %user.id, role = %user.role, "user_logged_in");
        Ok(AuthSession { user, token, expires_at: claims.exp })
    }

    /// Check signature and expiry of a bearer token.
    pub fn verify_token(&self, token: &str) -> Result<Claims, AuthError> {
        let data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.cfg.jwt_secret.as_bytes()),
            &Validation::new(Algorithm::HS256),
        )
        .map_err(|e| AuthError::TokenError(e.to_string()))?;
        Ok(data.claims)
    }

    /// Current state of the token's user; deactivated users lose access immediately.
    pub async fn me(&self, claims: &Claims) -> Result<AuthUser, AuthError> {
        match self.repo.find_user_by_id(claims.uid).await? {
            Some(u) if u.is_active => Ok(u),
            Some(_) => Err(AuthError::Unauthorized),
            None => Err(AuthError::NotFound),
        }
    }

    pub async fn list_users(&self) -> Result<Vec<AuthUser>, AuthError> {
        self.repo.list_users().await
    }

    #[instrument(skip(self))]
    pub async fn change_role(&self, actor: Uuid, target: Uuid, role: Role) -> Result<AuthUser, AuthError> {
        if actor == target && role != Role::Admin {
            return Err(AuthError::Forbidden("admins cannot demote themselves".into()));
        }
        let user = self.repo.set_role(target, role).await?;
        info!(user_id = %target, role = %role, "user_role_changed");
        Ok(user)
    }

    /// Create the configured admin unless that email is already registered.
    /// Returns `None` when nothing was created.
    #[instrument(skip(self, password))]
    pub async fn bootstrap_admin(&self, email: &str, password: &str) -> Result<Option<AuthUser>, AuthError> {
        if self.repo.find_user_by_email(email).await?.is_some() {
            debug!("bootstrap admin already present");
            return Ok(None);
        }
        let name = email.split('@').next().unwrap_or("admin");
        self.create(email, name, password, Role::Admin).await.map(Some)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::repository::mock::MockAuthRepository;

    fn svc() -> (AuthService<MockAuthRepository>, Arc<MockAuthRepository>) {
        let repo = Arc::new(MockAuthRepository::default());
        let cfg = AuthConfig { jwt_secret: "test-secret".into(), token_ttl_hours: 1, password_algorithm: "argon2".into() };
        (AuthService::new(repo.clone(), cfg), repo)
    }

    fn reg(email: &str) -> RegisterInput {
        RegisterInput { email: email.into(), name: "Ana".into(), password: "Passw0rd!".into() }
    }

    #[tokio::test]
    async fn register_rejects_short_password_and_duplicates() {
        let (svc, _) = svc();
        let short = RegisterInput { password: "1234567".into(), ..reg("a@b.com") };
        assert!(matches!(svc.register(short).await, Err(AuthError::Validation(_))));
        svc.register(reg("a@b.com")).await.unwrap();
        assert!(matches!(svc.register(reg("A@B.com")).await, Err(AuthError::Conflict)));
    }

    #[tokio::test]
    async fn login_checks_password_and_activity() {
        let (svc, repo) = svc();
        svc.register(reg("a@b.com")).await.unwrap();
        let wrong = LoginInput { email: "a@b.com".into(), password: "nope-nope".into() };
        assert!(matches!(svc.login(wrong).await, Err(AuthError::Unauthorized)));
        let unknown = LoginInput { email: "x@b.com".into(), password: "Passw0rd!".into() };
        assert!(matches!(svc.login(unknown).await, Err(AuthError::Unauthorized)));

        repo.set_active("a@b.com", false);
        let ok = LoginInput { email: "a@b.com".into(), password: "Passw0rd!".into() };
        assert!(matches!(svc.login(ok).await, Err(AuthError::Unauthorized)));
    }

    #[tokio::test]
    async fn token_carries_role_and_is_verified() {
        let (svc, _) = svc();
        svc.register(reg("a@b.com")).await.unwrap();
        let s = svc.login(LoginInput { email: "a@b.com".into(), password: "Passw0rd!".into() }).await.unwrap();
        let claims = svc.verify_token(&s.token).unwrap();
        assert_eq!(claims.role, Role::Viewer);
        assert_eq!(claims.sub, "a@b.com");
        assert!(claims.exp > claims.iat);
        assert!(matches!(svc.verify_token("garbage"), Err(AuthError::TokenError(_))));

        let cfg = AuthConfig { jwt_secret: "other".into(), token_ttl_hours: 1, password_algorithm: "argon2".into() };
        let other = AuthService::new(Arc::new(MockAuthRepository::default()), cfg);
        assert!(other.verify_token(&s.token).is_err());
    }

    #[tokio::test]
    async fn role_changes_and_self_demotion() {
        let (svc, _) = svc();
        let admin = svc.bootstrap_admin("root@b.com", "Passw0rd!").await.unwrap().unwrap();
        assert_eq!(admin.role, Role::Admin);
        assert!(svc.bootstrap_admin("root@b.com", "Passw0rd!").await.unwrap().is_none());

        let user = svc.register(reg("a@b.com")).await.unwrap();
        let promoted = svc.change_role(admin.id, user.id, Role::Seller).await.unwrap();
        assert_eq!(promoted.role, Role::Seller);
        assert!(matches!(svc.change_role(admin.id, admin.id, Role::Viewer).await, Err(AuthError::Forbidden(_))));
        assert!(matches!(svc.change_role(admin.id, Uuid::new_v4(), Role::Viewer).await, Err(AuthError::NotFound)));
        assert_eq!(svc.list_users().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn me_follows_current_user_state() {
        let (svc, repo) = svc();
        svc.register(reg("a@b.com")).await.unwrap();
        let s = svc.login(LoginInput { email: "a@b.com".into(), password: "Passw0rd!".into() }).await.unwrap();
        let claims = svc.verify_token(&s.token).unwrap();
        assert_eq!(svc.me(&claims).await.unwrap().email, "a@b.com");
        repo.set_active("a@b.com", false);
        assert!(matches!(svc.me(&claims).await, Err(AuthError::Unauthorized)));
    }
}
