use models::user::Role;
use sea_orm::{DatabaseConnection, EntityTrait, ColumnTrait, QueryFilter, QueryOrder};
use uuid::Uuid;

use crate::auth::domain::{AuthUser, Credentials};
use crate::auth::errors::AuthError;
use crate::auth::repository::AuthRepository;

pub struct SeaOrmAuthRepository {
    pub db: DatabaseConnection,
}

fn credentials(c: models::user_credentials::Model) -> Credentials {
    Credentials { user_id: c.user_id, password_hash: c.password_hash, password_algorithm: c.password_algorithm }
}

#[async_trait::async_trait]
impl AuthRepository for SeaOrmAuthRepository {
    async fn find_user_by_email(&self, email: &str) -> Result<Option<AuthUser>, AuthError> {
        let res = models::user::find_by_email(&self.db, email).await?;
        Ok(res.map(AuthUser::from))
    }

    async fn find_user_by_id(&self, id: Uuid) -> Result<Option<AuthUser>, AuthError> {
        let res = models::user::Entity::find_by_id(id).one(&self.db).await?;
        Ok(res.map(AuthUser::from))
    }

    async fn create_user(&self, email: &str, name: &str, role: Role) -> Result<AuthUser, AuthError> {
        let created = models::user::create(&self.db, email, name, role).await.map_err(|e| match e {
            models::errors::ModelError::Db(m) if m.contains("duplicate key") => AuthError::Conflict,
            other => AuthError::from(other),
        })?;
        Ok(AuthUser::from(created))
    }

    async fn list_users(&self) -> Result<Vec<AuthUser>, AuthError> {
        let rows = models::user::Entity::find()
            .order_by_asc(models::user::Column::Email)
            .all(&self.db)
            .await?;
        Ok(rows.into_iter().map(AuthUser::from).collect())
    }

    async fn set_role(&self, id: Uuid, role: Role) -> Result<AuthUser, AuthError> {
        if self.find_user_by_id(id).await?.is_none() {
            return Err(AuthError::NotFound);
        }
        Ok(AuthUser::from(models::user::set_role(&self.db, id, role).await?))
    }

    async fn get_credentials(&self, user_id: Uuid) -> Result<Option<Credentials>, AuthError> {
        let res = models::user_credentials::Entity::find()
            .filter(models::user_credentials::Column::UserId.eq(user_id))
            .one(&self.db)
            .await?;
        Ok(res.map(credentials))
    }

    async fn upsert_password(&self, user_id: Uuid, password_hash: String, password_algorithm: String) -> Result<Credentials, AuthError> {
        let c = models::user_credentials::upsert_password(&self.db, user_id, password_hash, &password_algorithm).await?;
        Ok(credentials(c))
    }
}
