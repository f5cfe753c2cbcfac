use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use models::product::{self, StockOp};
use models::{category, company, tax};
use once_cell::sync::Lazy;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QuerySelect, Set, TransactionTrait,
};
use serde_json::Value;
use uuid::Uuid;

use super::domain::{ProductFields, ProductRefs};
use crate::errors::ServiceError;
use crate::odata::translate::fetch_page;
use crate::odata::{FieldKind, FieldMap, ODataQuery};
use crate::pagination::Page;
use crate::refs::RefState;

pub static FIELDS: Lazy<FieldMap<product::Entity>> = Lazy::new(|| {
    FieldMap::new()
        .insert("id", product::Column::Id, FieldKind::Uuid)
        .insert("sku", product::Column::Sku, FieldKind::String)
        .insert("name", product::Column::Name, FieldKind::String)
        .insert("description", product::Column::Description, FieldKind::String)
        .insert("price", product::Column::Price, FieldKind::Decimal)
        .insert("stock", product::Column::Stock, FieldKind::Integer)
        .insert("reserved_stock", product::Column::ReservedStock, FieldKind::Integer)
        .insert("is_active", product::Column::IsActive, FieldKind::Bool)
        .insert("category_id", product::Column::CategoryId, FieldKind::Uuid)
        .insert("company_id", product::Column::CompanyId, FieldKind::Uuid)
        .insert("tax_id", product::Column::TaxId, FieldKind::Uuid)
        .insert("is_deleted", product::Column::IsDeleted, FieldKind::Bool)
        .insert("deleted_at", product::Column::DeletedAt, FieldKind::DateTime)
        .insert("created_at", product::Column::CreatedAt, FieldKind::DateTime)
        .insert("updated_at", product::Column::UpdatedAt, FieldKind::DateTime)
});

#[async_trait]
pub trait ProductRepository: Send + Sync {
    async fn list(&self, query: &ODataQuery) -> Result<Page<product::Model>, ServiceError>;
    async fn get(&self, id: Uuid) -> Result<Option<product::Model>, ServiceError>;
    /// `sku` is already upper-cased.
    async fn find_by_sku(&self, sku: &str) -> Result<Option<product::Model>, ServiceError>;
    async fn references(
        &self,
        category_id: Uuid,
        company_id: Uuid,
        tax_id: Option<Uuid>,
    ) -> Result<ProductRefs, ServiceError>;
    async fn insert(&self, fields: ProductFields, stock: i32) -> Result<product::Model, ServiceError>;
    async fn update(&self, id: Uuid, fields: ProductFields) -> Result<product::Model, ServiceError>;
    async fn set_deleted(&self, id: Uuid, deleted: bool) -> Result<product::Model, ServiceError>;
    /// Apply `op` under a row lock; fails without writing when the result would be invalid.
    async fn apply_stock(&self, id: Uuid, op: StockOp) -> Result<product::Model, ServiceError>;
    /// Related row JSON per product id for one navigation property.
    async fn expand(&self, items: &[product::Model], nav: &str) -> Result<HashMap<Uuid, Value>, ServiceError>;
}

pub struct SeaOrmProductRepository {
    pub db: DatabaseConnection,
}

impl SeaOrmProductRepository {
    async fn existing(&self, id: Uuid) -> Result<product::ActiveModel, ServiceError> {
        product::Entity::find_by_id(id)
            .one(&self.db)
            .await?
            .map(Into::into)
            .ok_or_else(|| ServiceError::not_found("product"))
    }
}

/// Map each owner id to the JSON of the related row it points at.
fn link<M: serde::Serialize>(
    owners: impl Iterator<Item = (Uuid, Option<Uuid>)>,
    related: Vec<M>,
    id_of: impl Fn(&M) -> Uuid,
) -> HashMap<Uuid, Value> {
    let by_id: HashMap<Uuid, Value> = related
        .into_iter()
        .filter_map(|m| serde_json::to_value(&m).ok().map(|v| (id_of(&m), v)))
        .collect();
    owners
        .filter_map(|(owner, target)| target.and_then(|t| by_id.get(&t)).map(|v| (owner, v.clone())))
        .collect()
}

#[async_trait]
impl ProductRepository for SeaOrmProductRepository {
    async fn list(&self, query: &ODataQuery) -> Result<Page<product::Model>, ServiceError> {
        let base = product::Entity::find().filter(product::Column::IsDeleted.eq(false));
        fetch_page(&self.db, base, query, &FIELDS).await
    }

    async fn get(&self, id: Uuid) -> Result<Option<product::Model>, ServiceError> {
        Ok(product::Entity::find_by_id(id).one(&self.db).await?)
    }

    async fn find_by_sku(&self, sku: &str) -> Result<Option<product::Model>, ServiceError> {
        Ok(product::Entity::find().filter(product::Column::Sku.eq(sku)).one(&self.db).await?)
    }

    async fn references(
        &self,
        category_id: Uuid,
        company_id: Uuid,
        tax_id: Option<Uuid>,
    ) -> Result<ProductRefs, ServiceError> {
        let category = category::Entity::find_by_id(category_id).one(&self.db).await?;
        let company = company::Entity::find_by_id(company_id).one(&self.db).await?;
        let tax = match tax_id {
            Some(id) => Some(RefState::of(tax::Entity::find_by_id(id).one(&self.db).await?.map(|t| t.is_deleted))),
            None => None,
        };
        Ok(ProductRefs {
            category: RefState::of(category.map(|c| c.is_deleted)),
            company: RefState::of(company.map(|c| c.is_deleted)),
            tax,
        })
    }

    async fn insert(&self, fields: ProductFields, stock: i32) -> Result<product::Model, ServiceError> {
        let now = Utc::now().into();
        let am = product::ActiveModel {
            id: Set(Uuid::new_v4()),
            sku: Set(fields.sku),
            name: Set(fields.name),
            description: Set(fields.description),
            price: Set(fields.price),
            stock: Set(stock),
            reserved_stock: Set(0),
            is_active: Set(fields.is_active),
            category_id: Set(fields.category_id),
            company_id: Set(fields.company_id),
            tax_id: Set(fields.tax_id),
            is_deleted: Set(false),
            deleted_at: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
        };
        Ok(am.insert(&self.db).await?)
    }

    async fn update(&self, id: Uuid, fields: ProductFields) -> Result<product::Model, ServiceError> {
        let mut am = self.existing(id).await?;
        am.sku = Set(fields.sku);
        am.name = Set(fields.name);
        am.description = Set(fields.description);
        am.price = Set(fields.price);
        am.is_active = Set(fields.is_active);
        am.category_id = Set(fields.category_id);
        am.company_id = Set(fields.company_id);
        am.tax_id = Set(fields.tax_id);
        am.updated_at = Set(Utc::now().into());
        Ok(am.update(&self.db).await?)
    }

    async fn set_deleted(&self, id: Uuid, deleted: bool) -> Result<product::Model, ServiceError> {
        let mut am = self.existing(id).await?;
        let now = Utc::now();
        am.is_deleted = Set(deleted);
        am.deleted_at = Set(deleted.then(|| now.into()));
        am.updated_at = Set(now.into());
        Ok(am.update(&self.db).await?)
    }

    async fn apply_stock(&self, id: Uuid, op: StockOp) -> Result<product::Model, ServiceError> {
        let txn = self.db.begin().await?;
        let found = product::Entity::find_by_id(id)
            .lock_exclusive()
            .one(&txn)
            .await?
            .filter(|p| !p.is_deleted)
            .ok_or_else(|| ServiceError::not_found("product"))?;
        let next = found.stock_state().apply(op)?;
        let mut am: product::ActiveModel = found.into();
        am.stock = Set(next.on_hand);
        am.reserved_stock = Set(next.reserved);
        am.updated_at = Set(Utc::now().into());
        let updated = am.update(&txn).await?;
        txn.commit().await?;
        Ok(updated)
    }

    async fn expand(&self, items: &[product::Model], nav: &str) -> Result<HashMap<Uuid, Value>, ServiceError> {
        let owners = || items.iter();
        Ok(match nav {
            "category" => {
                let ids: Vec<Uuid> = owners().map(|p| p.category_id).collect();
                let rows = category::Entity::find().filter(category::Column::Id.is_in(ids)).all(&self.db).await?;
                link(owners().map(|p| (p.id, Some(p.category_id))), rows, |c| c.id)
            }
            "company" => {
                let ids: Vec<Uuid> = owners().map(|p| p.company_id).collect();
                let rows = company::Entity::find().filter(company::Column::Id.is_in(ids)).all(&self.db).await?;
                link(owners().map(|p| (p.id, Some(p.company_id))), rows, |c| c.id)
            }
            "tax" => {
                let ids: Vec<Uuid> = owners().filter_map(|p| p.tax_id).collect();
                let rows = tax::Entity::find().filter(tax::Column::Id.is_in(ids)).all(&self.db).await?;
                link(owners().map(|p| (p.id, p.tax_id)), rows, |t| t.id)
            }
            other => return Err(crate::odata::ODataError::UnknownNavigation(other.to_string()).into()),
        })
    }
}

pub mod mock {
    use super::*;
    use std::sync::Mutex;

    /// Products plus the liveness of the rows they may reference.
    #[derive(Default)]
    pub struct MockProductRepository {
        rows: Mutex<HashMap<Uuid, product::Model>>,
        refs: Mutex<HashMap<Uuid, RefState>>,
    }

    impl MockProductRepository {
        /// Register a category, company or tax id as live or deleted.
        pub fn set_ref(&self, id: Uuid, state: RefState) {
            self.refs.lock().unwrap().insert(id, state);
        }

        fn ref_state(&self, id: Uuid) -> RefState {
            self.refs.lock().unwrap().get(&id).copied().unwrap_or(RefState::Missing)
        }
    }

    #[async_trait]
    impl ProductRepository for MockProductRepository {
        async fn list(&self, query: &ODataQuery) -> Result<Page<product::Model>, ServiceError> {
            let mut live: Vec<_> = self.rows.lock().unwrap().values().filter(|p| !p.is_deleted).cloned().collect();
            live.sort_by(|a, b| a.sku.cmp(&b.sku));
            let total = live.len() as u64;
            let items = live.into_iter().skip(query.skip as usize).take(query.top as usize).collect();
            Ok(Page::new(items, total, query.top, query.skip))
        }

        async fn get(&self, id: Uuid) -> Result<Option<product::Model>, ServiceError> {
            Ok(self.rows.lock().unwrap().get(&id).cloned())
        }

        async fn find_by_sku(&self, sku: &str) -> Result<Option<product::Model>, ServiceError> {
            Ok(self.rows.lock().unwrap().values().find(|p| p.sku == sku).cloned())
        }

        async fn references(
            &self,
            category_id: Uuid,
            company_id: Uuid,
            tax_id: Option<Uuid>,
        ) -> Result<ProductRefs, ServiceError> {
            Ok(ProductRefs {
                category: self.ref_state(category_id),
                company: self.ref_state(company_id),
                tax: tax_id.map(|t| self.ref_state(t)),
            })
        }

        async fn insert(&self, fields: ProductFields, stock: i32) -> Result<product::Model, ServiceError> {
            let now = Utc::now().into();
            let row = product::Model {
                id: Uuid::new_v4(),
                sku: fields.sku,
                name: fields.name,
                description: fields.description,
                price: fields.price,
                stock,
                reserved_stock: 0,
                is_active: fields.is_active,
                category_id: fields.category_id,
                company_id: fields.company_id,
                tax_id: fields.tax_id,
                is_deleted: false,
                deleted_at: None,
                created_at: now,
                updated_at: now,
            };
            self.rows.lock().unwrap().insert(row.id, row.clone());
            Ok(row)
        }

        async fn update(&self, id: Uuid, fields: ProductFields) -> Result<product::Model, ServiceError> {
            let mut rows = self.rows.lock().unwrap();
            let row = rows.get_mut(&id).ok_or_else(|| ServiceError::not_found("product"))?;
            row.sku = fields.sku;
            row.name = fields.name;
            row.description = fields.description;
            row.price = fields.price;
            row.is_active = fields.is_active;
            row.category_id = fields.category_id;
            row.company_id = fields.company_id;
            row.tax_id = fields.tax_id;
            row.updated_at = Utc::now().into();
            Ok(row.clone())
        }

        async fn set_deleted(&self, id: Uuid, deleted: bool) -> Result<product::Model, ServiceError> {
            let mut rows = self.rows.lock().unwrap();
            let row = rows.get_mut(&id).ok_or_else(|| ServiceError::not_found("product"))?;
            let now = Utc::now();
            row.is_deleted = deleted;
            row.deleted_at = deleted.then(|| now.into());
            row.updated_at = now.into();
            Ok(row.clone())
        }

        async fn apply_stock(&self, id: Uuid, op: StockOp) -> Result<product::Model, ServiceError> {
            let mut rows = self.rows.lock().unwrap();
            let row = rows
                .get_mut(&id)
                .filter(|p| !p.is_deleted)
                .ok_or_else(|| ServiceError::not_found("product"))?;
            let next = row.stock_state().apply(op)?;
            row.stock = next.on_hand;
            row.reserved_stock = next.reserved;
            Ok(row.clone())
        }

        async fn expand(&self, items: &[product::Model], nav: &str) -> Result<HashMap<Uuid, Value>, ServiceError> {
            let target = |p: &product::Model| match nav {
                "category" => Some(p.category_id),
                "company" => Some(p.company_id),
                _ => p.tax_id,
            };
            Ok(items
                .iter()
                .filter_map(|p| target(p).map(|t| (p.id, serde_json::json!({ "id": t }))))
                .collect())
        }
    }
}
