use async_trait::async_trait;
use chrono::Utc;
use models::{product, tax};
use once_cell::sync::Lazy;
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter, Set};
use uuid::Uuid;

use super::domain::TaxFields;
use crate::errors::ServiceError;
use crate::odata::translate::fetch_page;
use crate::odata::{FieldKind, FieldMap, ODataQuery};
use crate::pagination::Page;

pub static FIELDS: Lazy<FieldMap<tax::Entity>> = Lazy::new(|| {
    FieldMap::new()
        .insert("id", tax::Column::Id, FieldKind::Uuid)
        .insert("code", tax::Column::Code, FieldKind::String)
        .insert("name", tax::Column::Name, FieldKind::String)
        .insert("rate", tax::Column::Rate, FieldKind::Decimal)
        .insert("description", tax::Column::Description, FieldKind::String)
        .insert("is_deleted", tax::Column::IsDeleted, FieldKind::Bool)
        .insert("deleted_at", tax::Column::DeletedAt, FieldKind::DateTime)
        .insert("created_at", tax::Column::CreatedAt, FieldKind::DateTime)
        .insert("updated_at", tax::Column::UpdatedAt, FieldKind::DateTime)
});

#[async_trait]
pub trait TaxRepository: Send + Sync {
    async fn list(&self, query: &ODataQuery) -> Result<Page<tax::Model>, ServiceError>;
    async fn get(&self, id: Uuid) -> Result<Option<tax::Model>, ServiceError>;
    async fn find_by_code(&self, code: &str) -> Result<Option<tax::Model>, ServiceError>;
    async fn insert(&self, fields: TaxFields) -> Result<tax::Model, ServiceError>;
    async fn update(&self, id: Uuid, fields: TaxFields) -> Result<tax::Model, ServiceError>;
    async fn set_deleted(&self, id: Uuid, deleted: bool) -> Result<tax::Model, ServiceError>;
    async fn count_active_products(&self, id: Uuid) -> Result<u64, ServiceError>;
}

pub struct SeaOrmTaxRepository {
    pub db: DatabaseConnection,
}

impl SeaOrmTaxRepository {
    async fn existing(&self, id: Uuid) -> Result<tax::ActiveModel, ServiceError> {
        tax::Entity::find_by_id(id)
            .one(&self.db)
            .await?
            .map(Into::into)
            .ok_or_else(|| ServiceError::not_found("tax"))
    }
}

#[async_trait]
impl TaxRepository for SeaOrmTaxRepository {
    async fn list(&self, query: &ODataQuery) -> Result<Page<tax::Model>, ServiceError> {
        let base = tax::Entity::find().filter(tax::Column::IsDeleted.eq(false));
        fetch_page(&self.db, base, query, &FIELDS).await
    }

    async fn get(&self, id: Uuid) -> Result<Option<tax::Model>, ServiceError> {
        Ok(tax::Entity::find_by_id(id).one(&self.db).await?)
    }

    async fn find_by_code(&self, code: &str) -> Result<Option<tax::Model>, ServiceError> {
        Ok(tax::Entity::find().filter(tax::Column::Code.eq(code)).one(&self.db).await?)
    }

    async fn insert(&self, fields: TaxFields) -> Result<tax::Model, ServiceError> {
        let now = Utc::now().into();
        let am = tax::ActiveModel {
            id: Set(Uuid::new_v4()),
            code: Set(fields.code),
            name: Set(fields.name),
            rate: Set(fields.rate),
            description: Set(fields.description),
            is_deleted: Set(false),
            deleted_at: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
        };
        Ok(am.insert(&self.db).await?)
    }

    async fn update(&self, id: Uuid, fields: TaxFields) -> Result<tax::Model, ServiceError> {
        let mut am = self.existing(id).await?;
        am.code = Set(fields.code);
        am.name = Set(fields.name);
        am.rate = Set(fields.rate);
        am.description = Set(fields.description);
        am.updated_at = Set(Utc::now().into());
        Ok(am.update(&self.db).await?)
    }

    async fn set_deleted(&self, id: Uuid, deleted: bool) -> Result<tax::Model, ServiceError> {
        let mut am = self.existing(id).await?;
        let now = Utc::now();
        am.is_deleted = Set(deleted);
        am.deleted_at = Set(deleted.then(|| now.into()));
        am.updated_at = Set(now.into());
        Ok(am.update(&self.db).await?)
    }

    async fn count_active_products(&self, id: Uuid) -> Result<u64, ServiceError> {
        Ok(product::Entity::find()
            .filter(product::Column::TaxId.eq(id))
            .filter(product::Column::IsDeleted.eq(false))
            .count(&self.db)
            .await?)
    }
}

pub mod mock {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;

    #[derive(Default)]
    pub struct MockTaxRepository {
        rows: Mutex<HashMap<Uuid, tax::Model>>,
        product_refs: Mutex<HashMap<Uuid, u64>>,
    }

    impl MockTaxRepository {
        pub fn set_product_refs(&self, id: Uuid, count: u64) {
            self.product_refs.lock().unwrap().insert(id, count);
        }
    }

    #[async_trait]
    impl TaxRepository for MockTaxRepository {
        async fn list(&self, query: &ODataQuery) -> Result<Page<tax::Model>, ServiceError> {
            let mut live: Vec<_> = self.rows.lock().unwrap().values().filter(|t| !t.is_deleted).cloned().collect();
            live.sort_by(|a, b| a.code.cmp(&b.code));
            let total = live.len() as u64;
            let items = live.into_iter().skip(query.skip as usize).take(query.top as usize).collect();
            Ok(Page::new(items, total, query.top, query.skip))
        }

        async fn get(&self, id: Uuid) -> Result<Option<tax::Model>, ServiceError> {
            Ok(self.rows.lock().unwrap().get(&id).cloned())
        }

        async fn find_by_code(&self, code: &str) -> Result<Option<tax::Model>, ServiceError> {
            Ok(self.rows.lock().unwrap().values().find(|t| t.code == code).cloned())
        }

        async fn insert(&self, fields: TaxFields) -> Result<tax::Model, ServiceError> {
            let now = Utc::now().into();
            let row = tax::Model {
                id: Uuid::new_v4(),
                code: fields.code,
                name: fields.name,
                rate: fields.rate,
                description: fields.description,
                is_deleted: false,
                deleted_at: None,
                created_at: now,
                updated_at: now,
            };
            self.rows.lock().unwrap().insert(row.id, row.clone());
            Ok(row)
        }

        async fn update(&self, id: Uuid, fields: TaxFields) -> Result<tax::Model, ServiceError> {
            let mut rows = self.rows.lock().unwrap();
            let row = rows.get_mut(&id).ok_or_else(|| ServiceError::not_found("tax"))?;
            row.code = fields.code;
            row.name = fields.name;
            row.rate = fields.rate;
            row.description = fields.description;
            row.updated_at = Utc::now().into();
            Ok(row.clone())
        }

        async fn set_deleted(&self, id: Uuid, deleted: bool) -> Result<tax::Model, ServiceError> {
            let mut rows = self.rows.lock().unwrap();
            let row = rows.get_mut(&id).ok_or_else(|| ServiceError::not_found("tax"))?;
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
