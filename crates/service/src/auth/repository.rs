use async_trait::async_trait;
use models::user::Role;
use uuid::Uuid;

use super::domain::{AuthUser, Credentials};
use super::errors::AuthError;

/// Repository abstraction for auth-related persistence.
#[async_trait]
pub trait AuthRepository: Send + Sync {
    async fn find_user_by_email(&self, email: &str) -> Result<Option<AuthUser>, AuthError>;
    async fn find_user_by_id(&self, id: Uuid) -> Result<Option<AuthUser>, AuthError>;
    async fn create_user(&self, email: &str, name: &str, role: Role) -> Result<AuthUser, AuthError>;
    async fn list_users(&self) -> Result<Vec<AuthUser>, AuthError>;
    async fn set_role(&self, id: Uuid, role: Role) -> Result<AuthUser, AuthError>;

    async fn get_credentials(&self, user_id: Uuid) -> Result<Option<Credentials>, AuthError>;
    async fn upsert_password(&self, user_id: Uuid, password_hash: String, password_algorithm: String) -> Result<Credentials, AuthError>;
}

/// Simple in-memory mock repository for tests and doc examples
pub mod mock {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;

    #[derive(Default)]
    pub struct MockAuthRepository {
        users: Mutex<HashMap<String, AuthUser>>,   // key: lowercase email
        creds: Mutex<HashMap<Uuid, Credentials>>,  // key: user_id
    }

    impl MockAuthRepository {
        /// Flip `is_active` for the user with `email`.
        pub fn set_active(&self, email: &str, active: bool) {
            if let Some(u) = self.users.lock().unwrap().get_mut(&email.to_lowercase()) {
                u.is_active = active;
            }
        }
    }

    #[async_trait]
    impl AuthRepository for MockAuthRepository {
        async fn find_user_by_email(&self, email: &str) -> Result<Option<AuthUser>, AuthError> {
            let users = self.users.lock().unwrap();
            Ok(users.get(&email.trim().to_lowercase()).cloned())
        }

        async fn find_user_by_id(&self, id: Uuid) -> Result<Option<AuthUser>, AuthError> {
            let users = self.users.lock().unwrap();
            Ok(users.values().find(|u| u.id == id).cloned())
        }

        async fn create_user(&self, email: &str, name: &str, role: Role) -> Result<AuthUser, AuthError> {
            let email = email.trim().to_lowercase();
            let mut users = self.users.lock().unwrap();
            if users.contains_key(&email) {
                return Err(AuthError::Conflict);
            }
            let user = AuthUser { id: Uuid::new_v4(), email: email.clone(), name: name.to_string(), role, is_active: true };
            users.insert(email, user.clone());
            Ok(user)
        }

        async fn list_users(&self) -> Result<Vec<AuthUser>, AuthError> {
            let mut all: Vec<AuthUser> = self.users.lock().unwrap().values().cloned().collect();
            all.sort_by(|a, b| a.email.cmp(&b.email));
            Ok(all)
        }

        async fn set_role(&self, id: Uuid, role: Role) -> Result<AuthUser, AuthError> {
            let mut users = self.users.lock().unwrap();
            let user = users.values_mut().find(|u| u.id == id).ok_or(AuthError::NotFound)?;
            user.role = role;
            Ok(user.clone())
        }

        async fn get_credentials(&self, user_id: Uuid) -> Result<Option<Credentials>, AuthError> {
            let creds = self.creds.lock().unwrap();
            Ok(creds.get(&user_id).cloned())
        }

        async fn upsert_password(&self, user_id: Uuid, password_hash: String, password_algorithm: String) -> Result<Credentials, AuthError> {
            let mut creds = self.creds.lock().unwrap();
            let c = Credentials { user_id, password_hash, password_algorithm };
            creds.insert(user_id, c.clone());
            Ok(c)
        }
    }
}
