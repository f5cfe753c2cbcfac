use std::sync::Arc;

use models::category;
use tracing::{info, instrument};
use uuid::Uuid;

use super::domain::{NewCategory, UpdateCategory};
use super::repository::{CategoryRepository, FIELDS};
use crate::errors::ServiceError;
use crate::odata::cache::CachedPage;
use crate::odata::shape::shape_page;
use crate::odata::{EntitySet, ODataQuery, QueryCache};

pub struct CategoryService<R: CategoryRepository> {
    repo: Arc<R>,
    cache: Arc<QueryCache>,
}

impl<R: CategoryRepository> CategoryService<R> {
    pub fn new(repo: Arc<R>, cache: Arc<QueryCache>) -> Self { Self { repo, cache } }

    pub async fn list(&self, query: &ODataQuery, user: Uuid) -> Result<CachedPage, ServiceError> {
        query.validate_for(EntitySet::Categories, |f| FIELDS.contains(f))?;
        self.cache
            .get_or_load(EntitySet::Categories, query, user, || async {
                let page = self.repo.list(query).await?;
                Ok(shape_page(page, |c| c.id, &[], query.select.as_deref()))
            })
            .await
    }

    pub async fn get(&self, id: Uuid) -> Result<category::Model, ServiceError> {
        match self.repo.get(id).await? {
            Some(c) if !c.is_deleted => Ok(c),
            _ => Err(ServiceError::not_found("category")),
        }
    }

    #[instrument(skip(self, input), fields(name = %input.name))]
    pub async fn create(&self, input: NewCategory) -> Result<category::Model, ServiceError> {
        let fields = input.validate()?;
        if self.repo.find_by_name(&fields.name).await?.is_some() {
            return Err(ServiceError::Conflict(format!("category {} already exists", fields.name)));
        }
        let created = self.repo.insert(fields).await?;
        self.cache.invalidate(EntitySet::Categories);
        info!(category_id = %created.id, "category_created");
        Ok(created)
    }

    #[instrument(skip(self, input))]
    pub async fn update(&self, id: Uuid, input: UpdateCategory) -> Result<category::Model, ServiceError> {
        let current = self.get(id).await?;
        let fields = input.merge(&current)?;
        if let Some(other) = self.repo.find_by_name(&fields.name).await? {
            if other.id != id {
                return Err(ServiceError::Conflict(format!("category {} already exists", fields.name)));
            }
        }
        let updated = self.repo.update(id, fields).await?;
        self.cache.invalidate(EntitySet::Categories);
        info!(category_id = %id, "category_updated");
        Ok(updated)
    }

    #[instrument(skip(self))]
    pub async fn delete(&self, id: Uuid) -> Result<(), ServiceError> {
        self.get(id).await?;
        let refs = self.repo.count_active_products(id).await?;
        if refs > 0 {
            return Err(ServiceError::Conflict(format!("category is used by {refs} product(s)")));
        }
        self.repo.set_deleted(id, true).await?;
        self.cache.invalidate(EntitySet::Categories);
        info!(category_id = %id, "category_deleted");
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn restore(&self, id: Uuid) -> Result<category::Model, ServiceError> {
        let current = self.repo.get(id).await?.ok_or_else(|| ServiceError::not_found("category"))?;
        if !current.is_deleted {
            return Err(ServiceError::Conflict("category is not deleted".into()));
        }
        let restored = self.repo.set_deleted(id, false).await?;
        self.cache.invalidate(EntitySet::Categories);
        info!(category_id = %id, "category_restored");
        Ok(restored)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::category::repository::mock::MockCategoryRepository;
    use configs::{CacheConfig, ODataConfig};

    fn svc() -> (CategoryService<MockCategoryRepository>, Arc<MockCategoryRepository>) {
        let repo = Arc::new(MockCategoryRepository::default());
        let cache = Arc::new(QueryCache::new(&CacheConfig::default()));
        (CategoryService::new(repo.clone(), cache), repo)
    }

    fn new(name: &str) -> NewCategory { NewCategory { name: name.into(), description: None } }

    #[tokio::test]
    async fn create_trims_and_rejects_duplicates() {
        let (svc, _) = svc();
        let c = svc.create(new("  Drinks ")).await.unwrap();
        assert_eq!(c.name, "Drinks");
        assert!(matches!(svc.create(new("Drinks")).await, Err(ServiceError::Conflict(_))));
        assert!(matches!(svc.create(new("D")).await, Err(ServiceError::Validation(_))));
    }

    #[tokio::test]
    async fn update_keeps_unset_fields_and_blank_clears() {
        let (svc, _) = svc();
        let c = svc
            .create(NewCategory { name: "Drinks".into(), description: Some("Cold".into()) })
            .await
            .unwrap();
        let u = svc.update(c.id, UpdateCategory { name: Some("Beverages".into()), description: None }).await.unwrap();
        assert_eq!(u.description.as_deref(), Some("Cold"));
        let u = svc.update(c.id, UpdateCategory { name: None, description: Some("  ".into()) }).await.unwrap();
        assert_eq!(u.name, "Beverages");
        assert_eq!(u.description, None);
    }

    #[tokio::test]
    async fn update_to_another_categories_name_conflicts() {
        let (svc, _) = svc();
        svc.create(new("Drinks")).await.unwrap();
        let food = svc.create(new("Food")).await.unwrap();
        let res = svc.update(food.id, UpdateCategory { name: Some("Drinks".into()), description: None }).await;
        assert!(matches!(res, Err(ServiceError::Conflict(_))));
    }

    #[tokio::test]
    async fn soft_delete_lifecycle() {
        let (svc, _) = svc();
        let c = svc.create(new("Drinks")).await.unwrap();
        assert!(matches!(svc.restore(c.id).await, Err(ServiceError::Conflict(_))));
        svc.delete(c.id).await.unwrap();
        assert!(matches!(svc.get(c.id).await, Err(ServiceError::NotFound(_))));
        assert!(matches!(svc.delete(c.id).await, Err(ServiceError::NotFound(_))));
        let r = svc.restore(c.id).await.unwrap();
        assert!(!r.is_deleted);
        assert!(r.deleted_at.is_none());
    }

    #[tokio::test]
    async fn delete_conflicts_while_products_refer_to_it() {
        let (svc, repo) = svc();
        let c = svc.create(new("Drinks")).await.unwrap();
        repo.set_product_refs(c.id, 2);
        assert!(matches!(svc.delete(c.id).await, Err(ServiceError::Conflict(_))));
    }

    #[tokio::test]
    async fn list_is_cached_until_a_write() {
        let (svc, _) = svc();
        let user = Uuid::new_v4();
        let q = ODataQuery::with_defaults(&ODataConfig::default());
        svc.create(new("Drinks")).await.unwrap();
        assert_eq!(svc.list(&q, user).await.unwrap().total, 1);
        svc.create(new("Food")).await.unwrap();
        let page = svc.list(&q, user).await.unwrap();
        assert_eq!(page.total, 2);
        assert_eq!(page.items[0]["name"], "Drinks");
    }

    #[tokio::test]
    async fn list_rejects_unknown_select_field() {
        let (svc, _) = svc();
        let q = ODataQuery::parse([("$select", "price")], &ODataConfig::default()).unwrap();
        assert!(matches!(svc.list(&q, Uuid::new_v4()).await, Err(ServiceError::Query(_))));
    }
}
