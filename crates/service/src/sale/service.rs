use std::sync::Arc;

use models::sale::{self, SaleStatus};
use models::sale_item;
use tracing::{info, instrument};
use uuid::Uuid;

use super::domain::{CancelInput, NewSaleInput, SaleDetail};
use super::repository::{SaleRepository, FIELDS};
use crate::errors::ServiceError;
use crate::metrics::{SALE_TRANSITIONS, STOCK_OPERATIONS};
use crate::odata::cache::CachedPage;
use crate::odata::shape::{shape_page, Expansion};
use crate::odata::{EntitySet, ODataQuery, QueryCache};

pub struct SaleService<R: SaleRepository> {
    repo: Arc<R>,
    cache: Arc<QueryCache>,
}

impl<R: SaleRepository> SaleService<R> {
    pub fn new(repo: Arc<R>, cache: Arc<QueryCache>) -> Self { Self { repo, cache } }

    pub async fn list(&self, query: &ODataQuery, user: Uuid) -> Result<CachedPage, ServiceError> {
        query.validate_for(EntitySet::Sales, |f| FIELDS.contains(f))?;
        self.cache
            .get_or_load(EntitySet::Sales, query, user, || async {
                let page = self.repo.list(query).await?;
                let mut expansions: Vec<Expansion> = Vec::with_capacity(query.expand.len());
                for nav in &query.expand {
                    expansions.push((nav.clone(), self.repo.expand(&page.items, nav).await?));
                }
                Ok(shape_page(page, |s| s.id, &expansions, query.select.as_deref()))
            })
            .await
    }

    async fn live(&self, id: Uuid) -> Result<sale::Model, ServiceError> {
        match self.repo.get(id).await? {
            Some(s) if !s.is_deleted => Ok(s),
            _ => Err(ServiceError::not_found("sale")),
        }
    }

    pub async fn get(&self, id: Uuid) -> Result<SaleDetail, ServiceError> {
        let sale = self.live(id).await?;
        let items = self.repo.items(id).await?;
        Ok(SaleDetail { sale, items })
    }

    pub async fn items(&self, id: Uuid) -> Result<Vec<sale_item::Model>, ServiceError> {
        self.live(id).await?;
        self.repo.items(id).await
    }

    /// Create a pending sale for `created_by`, reserving stock for every item.
    #[instrument(skip(self, input), fields(company_id = %input.company_id, items = input.items.len()))]
    pub async fn create(&self, input: NewSaleInput, created_by: Uuid) -> Result<SaleDetail, ServiceError> {
        let new = input.validate(created_by)?;
        self.repo.company_state(new.company_id).await?.require("company")?;
        let detail = self.repo.insert(new).await?;
        STOCK_OPERATIONS.with_label_values(&["reserve"]).inc_by(detail.items.len() as u64);
        SALE_TRANSITIONS.with_label_values(&[SaleStatus::Pending.as_str()]).inc();
        self.cache.invalidate(EntitySet::Sales);
        info!(sale_id = %detail.sale.id, total = %detail.sale.total, "sale_created");
        Ok(detail)
    }

    pub async fn confirm(&self, id: Uuid) -> Result<SaleDetail, ServiceError> {
        self.transition(id, SaleStatus::Confirmed, None).await
    }

    pub async fn complete(&self, id: Uuid) -> Result<SaleDetail, ServiceError> {
        self.transition(id, SaleStatus::Completed, None).await
    }

    pub async fn cancel(&self, id: Uuid, input: CancelInput) -> Result<SaleDetail, ServiceError> {
        let reason = sale::validate_cancel_reason(input.reason.as_deref())?;
        self.transition(id, SaleStatus::Cancelled, reason).await
    }

    #[instrument(skip(self, next, reason), fields(to = %next))]
    async fn transition(&self, id: Uuid, next: SaleStatus, reason: Option<String>) -> Result<SaleDetail, ServiceError> {
        let detail = self.repo.transition(id, next, reason).await?;
        SALE_TRANSITIONS.with_label_values(&[next.as_str()]).inc();
        if let Some(op) = next.stock_effect(1) {
            STOCK_OPERATIONS.with_label_values(&[op.name()]).inc_by(detail.items.len() as u64);
        }
        self.cache.invalidate(EntitySet::Sales);
        info!(sale_id = %id, status = %next, "sale_transitioned");
        Ok(detail)
    }

    /// Only finished sales can be deleted; open ones still hold reservations.
    #[instrument(skip(self))]
    pub async fn delete(&self, id: Uuid) -> Result<(), ServiceError> {
        let current = self.live(id).await?;
        if !current.status.is_terminal() {
            return Err(ServiceError::InvalidState(format!(
                "only completed or cancelled sales can be deleted, sale is {}",
                current.status
            )));
        }
        self.repo.set_deleted(id, true).await?;
        self.cache.invalidate(EntitySet::Sales);
        info!(sale_id = %id, "sale_deleted");
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn restore(&self, id: Uuid) -> Result<sale::Model, ServiceError> {
        let current = self.repo.get(id).await?.ok_or_else(|| ServiceError::not_found("sale"))?;
        if !current.is_deleted {
            return Err(ServiceError::Conflict("sale is not deleted".into()));
        }
        let restored = self.repo.set_deleted(id, false).await?;
        self.cache.invalidate(EntitySet::Sales);
        info!(sale_id = %id, "sale_restored");
        Ok(restored)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::refs::RefState;
    use crate::sale::domain::SaleLineInput;
    use crate::sale::repository::mock::MockSaleRepository;
    use configs::{CacheConfig, ODataConfig};
    use models::product;
    use rust_decimal::Decimal;
    use std::str::FromStr;

    struct Fixture {
        svc: SaleService<MockSaleRepository>,
        repo: Arc<MockSaleRepository>,
        company: Uuid,
        mug: Uuid,
        pen: Uuid,
    }

    fn product(price: &str, stock: i32, tax_id: Option<Uuid>) -> product::Model {
        let now = chrono::Utc::now().into();
        product::Model {
            id: Uuid::new_v4(),
            sku: format!("SKU-{stock}"),
            name: "Item".into(),
            description: None,
            price: Decimal::from_str(price).unwrap(),
            stock,
            reserved_stock: 0,
            is_active: true,
            category_id: Uuid::nil(),
            company_id: Uuid::nil(),
            tax_id,
            is_deleted: false,
            deleted_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    fn fixture() -> Fixture {
        let repo = Arc::new(MockSaleRepository::default());
        let company = Uuid::new_v4();
        repo.set_company(company, RefState::Active);
        let tax = Uuid::new_v4();
        repo.set_rate(tax, Decimal::from_str("18").unwrap());
        let mug = product("19.90", 10, Some(tax));
        let pen = product("2.50", 5, None);
        let (mug_id, pen_id) = (mug.id, pen.id);
        repo.put_product(mug);
        repo.put_product(pen);
        let svc = SaleService::new(repo.clone(), Arc::new(QueryCache::new(&CacheConfig::default())));
        Fixture { svc, repo, company, mug: mug_id, pen: pen_id }
    }

    fn order(f: &Fixture, lines: &[(Uuid, i32)]) -> NewSaleInput {
        NewSaleInput {
            company_id: f.company,
            customer_name: "Maria Silva".into(),
            customer_document: "529.982.247-25".into(),
            notes: None,
            items: lines.iter().map(|&(product_id, quantity)| SaleLineInput { product_id, quantity }).collect(),
        }
    }

    #[tokio::test]
    async fn create_prices_items_and_reserves_stock() {
        let f = fixture();
        let d = f.svc.create(order(&f, &[(f.mug, 3), (f.pen, 2)]), Uuid::new_v4()).await.unwrap();
        assert_eq!(d.sale.status, SaleStatus::Pending);
        // 3 * 19.90 = 59.70, tax 18% = 10.746 -> 10.75; 2 * 2.50 = 5.00
        assert_eq!(d.sale.subtotal, Decimal::from_str("64.70").unwrap());
        assert_eq!(d.sale.tax_total, Decimal::from_str("10.75").unwrap());
        assert_eq!(d.sale.total, Decimal::from_str("75.45").unwrap());
        assert_eq!(d.items.len(), 2);
        assert_eq!(f.repo.product(f.mug).unwrap().reserved_stock, 3);
        assert_eq!(f.repo.product(f.pen).unwrap().reserved_stock, 2);
    }

    #[tokio::test]
    async fn create_is_all_or_nothing() {
        let f = fixture();
        let res = f.svc.create(order(&f, &[(f.mug, 3), (f.pen, 6)]), Uuid::new_v4()).await;
        assert!(matches!(res, Err(ServiceError::InvalidState(_))));
        assert_eq!(f.repo.product(f.mug).unwrap().reserved_stock, 0);
    }

    #[tokio::test]
    async fn create_requires_live_company() {
        let f = fixture();
        let deleted = Uuid::new_v4();
        f.repo.set_company(deleted, RefState::Deleted);
        let input = NewSaleInput { company_id: deleted, ..order(&f, &[(f.mug, 1)]) };
        assert!(matches!(f.svc.create(input, Uuid::new_v4()).await, Err(ServiceError::Validation(_))));
        let input = NewSaleInput { company_id: Uuid::new_v4(), ..order(&f, &[(f.mug, 1)]) };
        assert!(matches!(f.svc.create(input, Uuid::new_v4()).await, Err(ServiceError::Validation(_))));
    }

    #[tokio::test]
    async fn complete_commits_reservations() {
        let f = fixture();
        let d = f.svc.create(order(&f, &[(f.mug, 4)]), Uuid::new_v4()).await.unwrap();
        assert!(matches!(f.svc.complete(d.sale.id).await, Err(ServiceError::InvalidState(_))));
        let c = f.svc.confirm(d.sale.id).await.unwrap();
        assert!(c.sale.confirmed_at.is_some());
        let done = f.svc.complete(d.sale.id).await.unwrap();
        assert_eq!(done.sale.status, SaleStatus::Completed);
        let mug = f.repo.product(f.mug).unwrap();
        assert_eq!((mug.stock, mug.reserved_stock), (6, 0));
        assert!(matches!(f.svc.cancel(d.sale.id, CancelInput::default()).await, Err(ServiceError::InvalidState(_))));
    }

    #[tokio::test]
    async fn cancel_releases_reservations_and_records_reason() {
        let f = fixture();
        let d = f.svc.create(order(&f, &[(f.pen, 5)]), Uuid::new_v4()).await.unwrap();
        let c = f
            .svc
            .cancel(d.sale.id, CancelInput { reason: Some("customer gave up".into()) })
            .await
            .unwrap();
        assert_eq!(c.sale.cancel_reason.as_deref(), Some("customer gave up"));
        assert!(c.sale.cancelled_at.is_some());
        let pen = f.repo.product(f.pen).unwrap();
        assert_eq!((pen.stock, pen.reserved_stock), (5, 0));
    }

    #[tokio::test]
    async fn only_finished_sales_can_be_deleted() {
        let f = fixture();
        let d = f.svc.create(order(&f, &[(f.pen, 1)]), Uuid::new_v4()).await.unwrap();
        assert!(matches!(f.svc.delete(d.sale.id).await, Err(ServiceError::InvalidState(_))));
        f.svc.cancel(d.sale.id, CancelInput::default()).await.unwrap();
        f.svc.delete(d.sale.id).await.unwrap();
        assert!(matches!(f.svc.get(d.sale.id).await, Err(ServiceError::NotFound(_))));
        assert!(matches!(f.svc.confirm(d.sale.id).await, Err(ServiceError::NotFound(_))));
        f.svc.restore(d.sale.id).await.unwrap();
        assert_eq!(f.svc.items(d.sale.id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn list_can_expand_items() {
        let f = fixture();
        f.svc.create(order(&f, &[(f.mug, 1), (f.pen, 1)]), Uuid::new_v4()).await.unwrap();
        let q = ODataQuery::parse([("$expand", "items")], &ODataConfig::default()).unwrap();
        let page = f.svc.list(&q, Uuid::new_v4()).await.unwrap();
        assert_eq!(page.total, 1);
        assert_eq!(page.items[0]["items"].as_array().map(Vec::len), Some(2));
    }
}
