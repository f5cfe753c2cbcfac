use std::sync::Arc;

use models::company;
use tracing::{info, instrument};
use uuid::Uuid;

use super::domain::{NewCompany, UpdateCompany};
use super::repository::{CompanyRepository, FIELDS};
use crate::errors::ServiceError;
use crate::odata::cache::CachedPage;
use crate::odata::shape::shape_page;
use crate::odata::{EntitySet, ODataQuery, QueryCache};

pub struct CompanyService<R: CompanyRepository> {
    repo: Arc<R>,
    cache: Arc<QueryCache>,
}

impl<R: CompanyRepository> CompanyService<R> {
    pub fn new(repo: Arc<R>, cache: Arc<QueryCache>) -> Self { Self { repo, cache } }

    pub async fn list(&self, query: &ODataQuery, user: Uuid) -> Result<CachedPage, ServiceError> {
        query.validate_for(EntitySet::Companies, |f| FIELDS.contains(f))?;
        self.cache
            .get_or_load(EntitySet::Companies, query, user, || async {
                let page = self.repo.list(query).await?;
                Ok(shape_page(page, |c| c.id, &[], query.select.as_deref()))
            })
            .await
    }

    pub async fn get(&self, id: Uuid) -> Result<company::Model, ServiceError> {
        match self.repo.get(id).await? {
            Some(c) if !c.is_deleted => Ok(c),
            _ => Err(ServiceError::not_found("company")),
        }
    }

    async fn ensure_document_free(&self, document: &str, owner: Option<Uuid>) -> Result<(), ServiceError> {
        match self.repo.find_by_document(document).await? {
            Some(other) if Some(other.id) != owner => {
                Err(ServiceError::Conflict(format!("a company with document {document} already exists")))
            }
            _ => Ok(()),
        }
    }

    #[instrument(skip(self, input), fields(name = %input.name))]
    pub async fn create(&self, input: NewCompany) -> Result<company::Model, ServiceError> {
        let fields = input.validate()?;
        self.ensure_document_free(&fields.document, None).await?;
        let created = self.repo.insert(fields).await?;
        self.cache.invalidate(EntitySet::Companies);
        info!(company_id = %created.id, "company_created");
        Ok(created)
    }

    #[instrument(skip(self, input))]
    pub async fn update(&self, id: Uuid, input: UpdateCompany) -> Result<company::Model, ServiceError> {
        let current = self.get(id).await?;
        let fields = input.merge(&current)?;
        self.ensure_document_free(&fields.document, Some(id)).await?;
        let updated = self.repo.update(id, fields).await?;
        self.cache.invalidate(EntitySet::Companies);
        info!(company_id = %id, "company_updated");
        Ok(updated)
    }

    #[instrument(skip(self))]
    pub async fn delete(&self, id: Uuid) -> Result<(), ServiceError> {
        self.get(id).await?;
        let refs = self.repo.count_active_products(id).await?;
        if refs > 0 {
            return Err(ServiceError::Conflict(format!("company owns {refs} product(s)")));
        }
        self.repo.set_deleted(id, true).await?;
        self.cache.invalidate(EntitySet::Companies);
        info!(company_id = %id, "company_deleted");
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn restore(&self, id: Uuid) -> Result<company::Model, ServiceError> {
        let current = self.repo.get(id).await?.ok_or_else(|| ServiceError::not_found("company"))?;
        if !current.is_deleted {
            return Err(ServiceError::Conflict("company is not deleted".into()));
        }
        let restored = self.repo.set_deleted(id, false).await?;
        self.cache.invalidate(EntitySet::Companies);
        info!(company_id = %id, "company_restored");
        Ok(restored)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::company::repository::mock::MockCompanyRepository;
    use configs::CacheConfig;

    fn svc() -> (CompanyService<MockCompanyRepository>, Arc<MockCompanyRepository>) {
        let repo = Arc::new(MockCompanyRepository::default());
        (CompanyService::new(repo.clone(), Arc::new(QueryCache::new(&CacheConfig::default()))), repo)
    }

    fn acme() -> NewCompany {
        NewCompany {
            name: "ACME Ltda".into(),
            trade_name: None,
            document: "11.222.333/0001-81".into(),
            email: Some("Sales@Acme.com".into()),
            phone: None,
        }
    }

    #[tokio::test]
    async fn create_normalizes_and_blocks_duplicate_document() {
        let (svc, _) = svc();
        let c = svc.create(acme()).await.unwrap();
        assert_eq!(c.document, "11222333000181");
        assert_eq!(c.email.as_deref(), Some("sales@acme.com"));
        let dup = NewCompany { name: "Other".into(), document: "11222333000181".into(), ..acme() };
        assert!(matches!(svc.create(dup).await, Err(ServiceError::Conflict(_))));
    }

    #[tokio::test]
    async fn invalid_cnpj_is_a_validation_error() {
        let (svc, _) = svc();
        let bad = NewCompany { document: "11.222.333/0001-82".into(), ..acme() };
        assert!(matches!(svc.create(bad).await, Err(ServiceError::Validation(_))));
    }

    #[tokio::test]
    async fn update_same_document_is_not_a_conflict() {
        let (svc, _) = svc();
        let c = svc.create(acme()).await.unwrap();
        let u = svc
            .update(c.id, UpdateCompany { document: Some("11222333000181".into()), phone: Some("+55 11 3333-4444".into()), ..Default::default() })
            .await
            .unwrap();
        assert_eq!(u.phone.as_deref(), Some("551133334444"));
        assert_eq!(u.email.as_deref(), Some("sales@acme.com"));
    }

    #[tokio::test]
    async fn delete_blocked_by_products_then_allowed() {
        let (svc, repo) = svc();
        let c = svc.create(acme()).await.unwrap();
        repo.set_product_refs(c.id, 1);
        assert!(matches!(svc.delete(c.id).await, Err(ServiceError::Conflict(_))));
        repo.set_product_refs(c.id, 0);
        svc.delete(c.id).await.unwrap();
        assert!(matches!(svc.get(c.id).await, Err(ServiceError::NotFound(_))));
        svc.restore(c.id).await.unwrap();
        assert!(svc.get(c.id).await.is_ok());
    }
}
