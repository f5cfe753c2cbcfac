use async_trait::async_trait;
use chrono::Utc;
use models::company::{self, CompanyFields};
use models::product;
use once_cell::sync::Lazy;
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter, Set};
use uuid::Uuid;

use crate::errors::ServiceError;
use crate::odata::translate::fetch_page;
use crate::odata::{FieldKind, FieldMap, ODataQuery};
use crate::pagination::Page;

pub static FIELDS: Lazy<FieldMap<company::Entity>> = Lazy::new(|| {
    FieldMap::new()
        .insert("id", company::Column::Id, FieldKind::Uuid)
        .insert("name", company::Column::Name, FieldKind::String)
        .insert("trade_name", company::Column::TradeName, FieldKind::String)
        .insert("document", company::Column::Document, FieldKind::String)
        .insert("email", company::Column::Email, FieldKind::String)
        .insert("phone", company::Column::Phone, FieldKind::String)
        .insert("is_deleted", company::Column::IsDeleted, FieldKind::Bool)
        .insert("deleted_at", company::Column::DeletedAt, FieldKind::DateTime)
        .insert("created_at", company::Column::CreatedAt, FieldKind::DateTime)
        .insert("updated_at", company::Column::UpdatedAt, FieldKind::DateTime)
});

#[async_trait]
pub trait CompanyRepository: Send + Sync {
    async fn list(&self, query: &ODataQuery) -> Result<Page<company::Model>, ServiceError>;
    async fn get(&self, id: Uuid) -> Result<Option<company::Model>, ServiceError>;
    /// `document` is CNPJ digits.
    async fn find_by_document(&self, document: &str) -> Result<Option<company::Model>, ServiceError>;
    async fn insert(&self, fields: CompanyFields) -> Result<company::Model, ServiceError>;
    async fn update(&self, id: Uuid, fields: CompanyFields) -> Result<company::Model, ServiceError>;
    async fn set_deleted(&self, id: Uuid, deleted: bool) -> Result<company::Model, ServiceError>;
    async fn count_active_products(&self, id: Uuid) -> Result<u64, ServiceError>;
}

pub struct SeaOrmCompanyRepository {
    pub db: DatabaseConnection,
}

impl SeaOrmCompanyRepository {
    async fn existing(&self, id: Uuid) -> Result<company::ActiveModel, ServiceError> {
        company::Entity::find_by_id(id)
            .one(&self.db)
            .await?
            .map(Into::into)
            .ok_or_else(|| ServiceError::not_found("company"))
    }
}

#[async_trait]
impl CompanyRepository for SeaOrmCompanyRepository {
    async fn list(&self, query: &ODataQuery) -> Result<Page<company::Model>, ServiceError> {
        let base = company::Entity::find().filter(company::Column::IsDeleted.eq(false));
        fetch_page(&self.db, base, query, &FIELDS).await
    }

    async fn get(&self, id: Uuid) -> Result<Option<company::Model>, ServiceError> {
        Ok(company::Entity::find_by_id(id).one(&self.db).await?)
    }

    async fn find_by_document(&self, document: &str) -> Result<Option<company::Model>, ServiceError> {
        Ok(company::Entity::find().filter(company::Column::Document.eq(document)).one(&self.db).await?)
    }

    async fn insert(&self, fields: CompanyFields) -> Result<company::Model, ServiceError> {
        let now = Utc::now().into();
        let am = company::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(fields.name),
            trade_name: Set(fields.trade_name),
            document: Set(fields.document),
            email: Set(fields.email),
            phone: Set(fields.phone),
            is_deleted: Set(false),
            deleted_at: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
        };
        Ok(am.insert(&self.db).await?)
    }

    async fn update(&self, id: Uuid, fields: CompanyFields) -> Result<company::Model, ServiceError> {
        let mut am = self.existing(id).await?;
        am.name = Set(fields.name);
        am.trade_name = Set(fields.trade_name);
        am.document = Set(fields.document);
        am.email = Set(fields.email);
        am.phone = Set(fields.phone);
        am.updated_at = Set(Utc::now().into());
        Ok(am.update(&self.db).await?)
    }

    async fn set_deleted(&self, id: Uuid, deleted: bool) -> Result<company::Model, ServiceError> {
        let mut am = self.existing(id).await?;
        let now = Utc::now();
        am.is_deleted = Set(deleted);
        am.deleted_at = Set(deleted.then(|| now.into()));
        am.updated_at = Set(now.into());
        Ok(am.update(&self.db).await?)
    }

    async fn count_active_products(&self, id: Uuid) -> Result<u64, ServiceError> {
        Ok(product::Entity::find()
            .filter(product::Column::CompanyId.eq(id))
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
    pub struct MockCompanyRepository {
        rows: Mutex<HashMap<Uuid, company::Model>>,
        product_refs: Mutex<HashMap<Uuid, u64>>,
    }

    impl MockCompanyRepository {
        pub fn set_product_refs(&self, id: Uuid, count: u64) {
            self.product_refs.lock().unwrap().insert(id, count);
        }
    }

    #[async_trait]
    impl CompanyRepository for MockCompanyRepository {
        async fn list(&self, query: &ODataQuery) -> Result<Page<company::Model>, ServiceError> {
            let mut live: Vec<_> = self.rows.lock().unwrap().values().filter(|c| !c.is_deleted).cloned().collect();
            live.sort_by(|a, b| a.name.cmp(&b.name));
            let total = live.len() as u64;
            let items = live.into_iter().skip(query.skip as usize).take(query.top as usize).collect();
            Ok(Page::new(items, total, query.top, query.skip))
        }

        async fn get(&self, id: Uuid) -> Result<Option<company::Model>, ServiceError> {
            Ok(self.rows.lock().unwrap().get(&id).cloned())
        }

        async fn find_by_document(&self, document: &str) -> Result<Option<company::Model>, ServiceError> {
            Ok(self.rows.lock().unwrap().values().find(|c| c.document == document).cloned())
        }

        async fn insert(&self, fields: CompanyFields) -> Result<company::Model, ServiceError> {
            let now = Utc::now().into();
            let row = company::Model {
                id: Uuid::new_v4(),
                name: fields.name,
                trade_name: fields.trade_name,
                document: fields.document,
                email: fields.email,
                phone: fields.phone,
                is_deleted: false,
                deleted_at: None,
                created_at: now,
                updated_at: now,
            };
            self.rows.lock().unwrap().insert(row.id, row.clone());
            Ok(row)
        }

        async fn update(&self, id: Uuid, fields: CompanyFields) -> Result<company::Model, ServiceError> {
            let mut rows = self.rows.lock().unwrap();
            let row = rows.get_mut(&id).ok_or_else(|| ServiceError::not_found("company"))?;
            row.name = fields.name;
            row.trade_name = fields.trade_name;
            row.document = fields.document;
            row.email = fields.email;
            row.phone = fields.phone;
            row.updated_at = Utc::now().into();
            Ok(row.clone())
        }

        async fn set_deleted(&self, id: Uuid, deleted: bool) -> Result<company::Model, ServiceError> {
            let mut rows = self.rows.lock().unwrap();
            let row = rows.get_mut(&id).ok_or_else(|| ServiceError::not_found("company"))?;
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
