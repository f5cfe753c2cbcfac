use async_trait::async_trait;
use chrono::Utc;
use models::{category, product};
use once_cell::sync::Lazy;
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter, Set};
use uuid::Uuid;

use super::domain::CategoryFields;
use crate::errors::ServiceError;
use crate::odata::translate::fetch_page;
use crate::odata::{FieldKind, FieldMap, ODataQuery};
use crate::pagination::Page;

/// Fields addressable from `$filter`, `$orderby` and `$select`.
pub static FIELDS: Lazy<FieldMap<category::Entity>> = Lazy::new(|| {
    FieldMap::new()
        .insert("id", category::Column::Id, FieldKind::Uuid)
        .insert("name", category::Column::Name, FieldKind::String)
        .insert("description", category::Column::Description, FieldKind::String)
        .insert("is_deleted", category::Column::IsDeleted, FieldKind::Bool)
        .insert("deleted_at", category::Column::DeletedAt, FieldKind::DateTime)
        .insert("created_at", category::Column::CreatedAt, FieldKind::DateTime)
        .insert("updated_at", category::Column::UpdatedAt, FieldKind::DateTime)
});

#[async_trait]
pub trait CategoryRepository: Send + Sync {
    /// Non-deleted rows only.
    async fn list(&self, query: &ODataQuery) -> Result<Page<category::Model>, ServiceError>;
    /// Includes soft-deleted rows.
    async fn get(&self, id: Uuid) -> Result<Option<category::Model>, ServiceError>;
    async fn find_by_name(&self, name: &str) -> Result<Option<category::Model>, ServiceError>;
    async fn insert(&self, fields: CategoryFields) -> Result<category::Model, ServiceError>;
    async fn update(&self, id: Uuid, fields: CategoryFields) -> Result<category::Model, ServiceError>;
    async fn set_deleted(&self, id: Uuid, deleted: bool) -> Result<category::Model, ServiceError>;
    async fn count_active_products(&self, id: Uuid) -> Result<u64, ServiceError>;
}

pub struct SeaOrmCategoryRepository {
    pub db: DatabaseConnection,
}

impl SeaOrmCategoryRepository {
    async fn existing(&self, id: Uuid) -> Result<category::ActiveModel, ServiceError> {
        category::Entity::find_by_id(id)
            .one(&self.db)
            .await?
            .map(Into::into)
            .ok_or_else(|| ServiceError::not_found("category"))
    }
}

#[async_trait]
impl CategoryRepository for SeaOrmCategoryRepository {
    async fn list(&self, query: &ODataQuery) -> Result<Page<category::Model>, ServiceError> {
        let base = category::Entity::find().filter(category::Column::IsDeleted.eq(false));
        fetch_page(&self.db, base, query, &FIELDS).await
    }

    async fn get(&self, id: Uuid) -> Result<Option<category::Model>, ServiceError> {
        Ok(category::Entity::find_by_id(id).one(&self.db).await?)
    }

    async fn find_by_name(&self, name: &str) -> Result<Option<category::Model>, ServiceError> {
        Ok(category::Entity::find().filter(category::Column::Name.eq(name)).one(&self.db).await?)
    }

    async fn insert(&self, fields: CategoryFields) -> Result<category::Model, ServiceError> {
        let now = Utc::now().into();
        let am = category::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(fields.name),
            description: Set(fields.description),
            is_deleted: Set(false),
            deleted_at: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
        };
        Ok(am.insert(&self.db).await?)
    }

    async fn update(&self, id: Uuid, fields: CategoryFields) -> Result<category::Model, ServiceError> {
        let mut am = self.existing(id).await?;
        am.name = Set(fields.name);
        am.description = Set(fields.description);
        am.updated_at = Set(Utc::now().into());
        Ok(am.update(&self.db).await?)
    }

    async fn set_deleted(&self, id: Uuid, deleted: bool) -> Result<category::Model, ServiceError> {
        let mut am = self.existing(id).await?;
        let now = Utc::now();
        am.is_deleted = Set(deleted);
        am.deleted_at = Set(deleted.then(|| now.into()));
        am.updated_at = Set(now.into());
        Ok(am.update(&self.db).await?)
    }

    async fn count_active_products(&self, id: Uuid) -> Result<u64, ServiceError> {
        Ok(product::Entity::find()
            .filter(product::Column::CategoryId.eq(id))
            .filter(product::Column::IsDeleted.eq(false))
            .count(&self.db)
            .await?)
    }
}

/// In-memory repository for service tests and doc examples.
pub mod mock {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;

    #[derive(Default)]
    pub struct MockCategoryRepository {
        rows: Mutex<HashMap<Uuid, category::Model>>,
        product_refs: Mutex<HashMap<Uuid, u64>>,
    }

    impl MockCategoryRepository {
        /// Pretend `count` live products point at `id`.
        pub fn set_product_refs(&self, id: Uuid, count: u64) {
            self.product_refs.lock().unwrap().insert(id, count);
        }
    }

    #[async_trait]
    impl CategoryRepository for MockCategoryRepository {
        async fn list(&self, query: &ODataQuery) -> Result<Page<category::Model>, ServiceError> {
            let mut live: Vec<_> = self.rows.lock().unwrap().values().filter(|c| !c.is_deleted).cloned().collect();
            live.sort_by(|a, b| a.name.cmp(&b.name));
            let total = live.len() as u64;
            let items = live.into_iter().skip(query.skip as usize).take(query.top as usize).collect();
            Ok(Page::new(items, total, query.top, query.skip))
        }

        async fn get(&self, id: Uuid) -> Result<Option<category::Model>, ServiceError> {
            Ok(self.rows.lock().unwrap().get(&id).cloned())
        }

        async fn find_by_name(&self, name: &str) -> Result<Option<category::Model>, ServiceError> {
            Ok(self.rows.lock().unwrap().values().find(|c| c.name == name).cloned())
        }

        async fn insert(&self, fields: CategoryFields) -> Result<category::Model, ServiceError> {
            let now = Utc::now().into();
            let row = category::Model {
                id: Uuid::new_v4(),
                name: fields.name,
                description: fields.description,
                is_deleted: false,
                deleted_at: None,
                created_at: now,
                updated_at: now,
            };
            self.rows.lock().unwrap().insert(row.id, row.clone());
            Ok(row)
        }

        async fn update(&self, id: Uuid, fields: CategoryFields) -> Result<category::Model, ServiceError> {
            let mut rows = self.rows.lock().unwrap();
            let row = rows.get_mut(&id).ok_or_else(|| ServiceError::not_found("category"))?;
            row.name = fields.name;
            row.description = fields.description;
            row.updated_at = Utc::now().into();
            Ok(row.clone())
        }

        async fn set_deleted(&self, id: Uuid, deleted: bool) -> Result<category::Model, ServiceError> {
            let mut rows = self.rows.lock().unwrap();
            let row = rows.get_mut(&id).ok_or_else(|| ServiceError::not_found("category"))?;
            let now = Utc::now();
            row.is_deleted = deleted;
            row.deleted_at = deleted.then(|| now.into());
            row.updated_at = now.into();
            Ok(row.clone())
        }

        async fn count_active_products(&self, id: Uuid) -> Result<u64, ServiceError> {
            Ok(self.product_refs.lock().unwrap().get(&id).copied().unwrap_or(0))
        }
    }
}
