use std::sync::Arc;

use models::tax;
use tracing::{info, instrument};
use uuid::Uuid;

use super::domain::{NewTax, UpdateTax};
use super::repository::{TaxRepository, FIELDS};
use crate::errors::ServiceError;
use crate::odata::cache::CachedPage;
use crate::odata::shape::shape_page;
use crate::odata::{EntitySet, ODataQuery, QueryCache};

pub struct TaxService<R: TaxRepository> {
    repo: Arc<R>,
    cache: Arc<QueryCache>,
}

impl<R: TaxRepository> TaxService<R> {
    pub fn new(repo: Arc<R>, cache: Arc<QueryCache>) -> Self { Self { repo, cache } }

    pub async fn list(&self, query: &ODataQuery, user: Uuid) -> Result<CachedPage, ServiceError> {
        query.validate_for(EntitySet::Taxes, |f| FIELDS.contains(f))?;
        self.cache
            .get_or_load(EntitySet::Taxes, query, user, || async {
                let page = self.repo.list(query).await?;
                Ok(shape_page(page, |t| t.id, &[], query.select.as_deref()))
            })
            .await
    }

    pub async fn get(&self, id: Uuid) -> Result<tax::Model, ServiceError> {
        match self.repo.get(id).await? {
            Some(t) if !t.is_deleted => Ok(t),
            _ => Err(ServiceError::not_found("tax")),
        }
    }

    async fn ensure_code_free(&self, code: &str, owner: Option<Uuid>) -> Result<(), ServiceError> {
        match self.repo.find_by_code(code).await? {
            Some(other) if Some(other.id) != owner => Err(ServiceError::Conflict(format!("tax {code} already exists"))),
            _ => Ok(()),
        }
    }

    #[instrument(skip(self, input), fields(code = %input.code))]
    pub async fn create(&self, input: NewTax) -> Result<tax::Model, ServiceError> {
        let fields = input.validate()?;
        self.ensure_code_free(&fields.code, None).await?;
        let created = self.repo.insert(fields).await?;
        self.cache.invalidate(EntitySet::Taxes);
        info!(tax_id = %created.id, code = %created.code, "tax_created");
        Ok(created)
    }

    /// Rate changes apply to future sales only; existing items keep their snapshot.
    #[instrument(skip(self, input))]
    pub async fn update(&self, id: Uuid, input: UpdateTax) -> Result<tax::Model, ServiceError> {
        let current = self.get(id).await?;
        let fields = input.merge(&current)?;
        self.ensure_code_free(&fields.code, Some(id)).await?;
        let updated = self.repo.update(id, fields).await?;
        self.cache.invalidate(EntitySet::Taxes);
        info!(tax_id = %id, "tax_updated");
        Ok(updated)
    }

    #[instrument(skip(self))]
    pub async fn delete(&self, id: Uuid) -> Result<(), ServiceError> {
        self.get(id).await?;
        let refs = self.repo.count_active_products(id).await?;
        if refs > 0 {
            return Err(ServiceError::Conflict(format!("tax is applied to {refs} product(s)")));
        }
        self.repo.set_deleted(id, true).await?;
        self.cache.invalidate(EntitySet::Taxes);
        info!(tax_id = %id, "tax_deleted");
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn restore(&self, id: Uuid) -> Result<tax::Model, ServiceError> {
        let current = self.repo.get(id).await?.ok_or_else(|| ServiceError::not_found("tax"))?;
        if !current.is_deleted {
            return Err(ServiceError::Conflict("tax is not deleted".into()));
        }
        let restored = self.repo.set_deleted(id, false).await?;
        self.cache.invalidate(EntitySet::Taxes);
        info!(tax_id = %id, "tax_restored");
        Ok(restored)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tax::repository::mock::MockTaxRepository;
    use configs::{CacheConfig, ODataConfig};
    use rust_decimal::Decimal;
    use std::str::FromStr;

    fn svc() -> (TaxService<MockTaxRepository>, Arc<MockTaxRepository>) {
        let repo = Arc::new(MockTaxRepository::default());
        (TaxService::new(repo.clone(), Arc::new(QueryCache::new(&CacheConfig::default()))), repo)
    }

    fn icms() -> NewTax {
        NewTax { code: "icms".into(), name: "ICMS".into(), rate: Decimal::from_str("18.00").unwrap(), description: None }
    }

    #[tokio::test]
    async fn code_is_stored_upper_case_and_unique() {
        let (svc, _) = svc();
        let t = svc.create(icms()).await.unwrap();
        assert_eq!(t.code, "ICMS");
        assert!(matches!(svc.create(icms()).await, Err(ServiceError::Conflict(_))));
    }

    #[tokio::test]
    async fn rate_out_of_range_is_rejected_on_update() {
        let (svc, _) = svc();
        let t = svc.create(icms()).await.unwrap();
        let res = svc.update(t.id, UpdateTax { rate: Some(Decimal::from(101)), ..Default::default() }).await;
        assert!(matches!(res, Err(ServiceError::Validation(_))));
        let u = svc.update(t.id, UpdateTax { rate: Some(Decimal::from_str("7.5").unwrap()), ..Default::default() }).await.unwrap();
        assert_eq!(u.rate, Decimal::from_str("7.5").unwrap());
        assert_eq!(u.code, "ICMS");
    }

    #[tokio::test]
    async fn delete_conflicts_while_applied() {
        let (svc, repo) = svc();
        let t = svc.create(icms()).await.unwrap();
        repo.set_product_refs(t.id, 3);
        assert!(matches!(svc.delete(t.id).await, Err(ServiceError::Conflict(_))));
    }

    #[tokio::test]
    async fn list_pages_and_projects() {
        let (svc, _) = svc();
        for code in ["A1", "B2", "C3"] {
            svc.create(NewTax { code: code.into(), ..icms() }).await.unwrap();
        }
        let q = ODataQuery::parse([("$top", "2"), ("$skip", "2"), ("$select", "code")], &ODataConfig::default()).unwrap();
        let page = svc.list(&q, Uuid::new_v4()).await.unwrap();
        assert_eq!(page.total, 3);
        assert!(!page.has_next);
        assert_eq!(page.items.len(), 1);
        assert_eq!(page.items[0]["code"], "C3");
        assert!(page.items[0].get("rate").is_none());
        assert!(page.items[0].get("id").is_some());
    }
}
