use std::sync::Arc;

use models::product::{self, StockOp};
use tracing::{info, instrument};
use uuid::Uuid;

use super::domain::{NewProduct, ProductFields, UpdateProduct};
use super::repository::{ProductRepository, FIELDS};
use crate::errors::ServiceError;
use crate::metrics::STOCK_OPERATIONS;
use crate::odata::cache::CachedPage;
use crate::odata::shape::{shape_page, Expansion};
use crate::odata::{EntitySet, ODataQuery, QueryCache};

pub struct ProductService<R: ProductRepository> {
    repo: Arc<R>,
    cache: Arc<QueryCache>,
}

impl<R: ProductRepository> ProductService<R> {
    pub fn new(repo: Arc<R>, cache: Arc<QueryCache>) -> Self { Self { repo, cache } }

    pub async fn list(&self, query: &ODataQuery, user: Uuid) -> Result<CachedPage, ServiceError> {
        query.validate_for(EntitySet::Products, |f| FIELDS.contains(f))?;
        self.cache
            .get_or_load(EntitySet::Products, query, user, || async {
                let page = self.repo.list(query).await?;
                let mut expansions: Vec<Expansion> = Vec::with_capacity(query.expand.len());
                for nav in &query.expand {
                    expansions.push((nav.clone(), self.repo.expand(&page.items, nav).await?));
                }
                Ok(shape_page(page, |p| p.id, &expansions, query.select.as_deref()))
            })
            .await
    }

    pub async fn get(&self, id: Uuid) -> Result<product::Model, ServiceError> {
        match self.repo.get(id).await? {
            Some(p) if !p.is_deleted => Ok(p),
            _ => Err(ServiceError::not_found("product")),
        }
    }

    async fn check_fields(&self, fields: &ProductFields, owner: Option<Uuid>) -> Result<(), ServiceError> {
        if let Some(other) = self.repo.find_by_sku(&fields.sku).await? {
            if Some(other.id) != owner {
                return Err(ServiceError::Conflict(format!("sku {} already exists", fields.sku)));
            }
        }
        self.repo
            .references(fields.category_id, fields.company_id, fields.tax_id)
            .await?
            .require_live()
    }

    #[instrument(skip(self, input), fields(sku = %input.sku))]
    pub async fn create(&self, input: NewProduct) -> Result<product::Model, ServiceError> {
        let (fields, stock) = input.validate()?;
        self.check_fields(&fields, None).await?;
        let created = self.repo.insert(fields, stock).await?;
        self.cache.invalidate(EntitySet::Products);
        info!(product_id = %created.id, sku = %created.sku, "product_created");
        Ok(created)
    }

    #[instrument(skip(self, input))]
    pub async fn update(&self, id: Uuid, input: UpdateProduct) -> Result<product::Model, ServiceError> {
        let current = self.get(id).await?;
        let fields = input.merge(&current)?;
        self.check_fields(&fields, Some(id)).await?;
        let updated = self.repo.update(id, fields).await?;
        self.cache.invalidate(EntitySet::Products);
        info!(product_id = %id, "product_updated");
        Ok(updated)
    }

    #[instrument(skip(self))]
    pub async fn delete(&self, id: Uuid) -> Result<(), ServiceError> {
        let current = self.get(id).await?;
        if current.reserved_stock > 0 {
            return Err(ServiceError::Conflict(format!(
                "product has {} reserved unit(s)",
                current.reserved_stock
            )));
        }
        self.repo.set_deleted(id, true).await?;
        self.cache.invalidate(EntitySet::Products);
        info!(product_id = %id, "product_deleted");
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn restore(&self, id: Uuid) -> Result<product::Model, ServiceError> {
        let current = self.repo.get(id).await?.ok_or_else(|| ServiceError::not_found("product"))?;
        if !current.is_deleted {
            return Err(ServiceError::Conflict("product is not deleted".into()));
        }
        self.repo
            .references(current.category_id, current.company_id, current.tax_id)
            .await?
            .require_live()?;
        let restored = self.repo.set_deleted(id, false).await?;
        self.cache.invalidate(EntitySet::Products);
        info!(product_id = %id, "product_restored");
        Ok(restored)
    }

    pub async fn adjust_stock(&self, id: Uuid, delta: i32) -> Result<product::Model, ServiceError> {
        self.stock(id, StockOp::Adjust(delta)).await
    }

    pub async fn reserve(&self, id: Uuid, quantity: i32) -> Result<product::Model, ServiceError> {
        let current = self.get(id).await?;
        if !current.is_active {
            return Err(ServiceError::InvalidState("product is inactive".into()));
        }
        self.stock(id, StockOp::Reserve(quantity)).await
    }

    pub async fn release(&self, id: Uuid, quantity: i32) -> Result<product::Model, ServiceError> {
        self.stock(id, StockOp::Release(quantity)).await
    }

    #[instrument(skip(self, op), fields(op = op.name()))]
    async fn stock(&self, id: Uuid, op: StockOp) -> Result<product::Model, ServiceError> {
        let updated = self.repo.apply_stock(id, op).await?;
        STOCK_OPERATIONS.with_label_values(&[op.name()]).inc();
        self.cache.invalidate(EntitySet::Products);
        info!(product_id = %id, stock = updated.stock, reserved = updated.reserved_stock, "product_stock_changed");
        Ok(updated)
    }
}
