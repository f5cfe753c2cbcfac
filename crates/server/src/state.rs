use std::sync::Arc;

use configs::{AppConfig, ODataConfig};
use sea_orm::DatabaseConnection;
use service::auth::repo::SeaOrmAuthRepository;
use service::auth::{AuthConfig, AuthService};
use service::category::{repository::SeaOrmCategoryRepository, CategoryService};
use service::company::{repository::SeaOrmCompanyRepository, CompanyService};
use service::odata::QueryCache;
use service::product::{repository::SeaOrmProductRepository, ProductService};
use service::sale::{repository::SeaOrmSaleRepository, SaleService};
use service::tax::{repository::SeaOrmTaxRepository, TaxService};

/// Shared application state handed to every handler.
#[derive(Clone)]
pub struct ServerState {
    pub auth: Arc<AuthService<SeaOrmAuthRepository>>,
    pub categories: Arc<CategoryService<SeaOrmCategoryRepository>>,
    pub companies: Arc<CompanyService<SeaOrmCompanyRepository>>,
    pub taxes: Arc<TaxService<SeaOrmTaxRepository>>,
    pub products: Arc<ProductService<SeaOrmProductRepository>>,
    pub sales: Arc<SaleService<SeaOrmSaleRepository>>,
    pub odata: ODataConfig,
}

impl ServerState {
    pub fn new(db: DatabaseConnection, cfg: &AppConfig) -> Self {
        let cache = Arc::new(QueryCache::new(&cfg.cache));
        let auth = AuthService::new(
            Arc::new(SeaOrmAuthRepository { db: db.clone() }),
            AuthConfig::from_settings(&cfg.auth),
        );
        Self {
            auth: Arc::new(auth),
            categories: Arc::new(CategoryService::new(
                Arc::new(SeaOrmCategoryRepository { db: db.clone() }),
                cache.clone(),
            )),
            companies: Arc::new(CompanyService::new(
                Arc::new(SeaOrmCompanyRepository { db: db.clone() }),
                cache.clone(),
            )),
            taxes: Arc::new(TaxService::new(Arc::new(SeaOrmTaxRepository { db: db.clone() }), cache.clone())),
            products: Arc::new(ProductService::new(
                Arc::new(SeaOrmProductRepository { db: db.clone() }),
                cache.clone(),
            )),
            sales: Arc::new(SaleService::new(Arc::new(SeaOrmSaleRepository { db: db.clone() }), cache.clone())),
            odata: cfg.odata,
        }
    }
}
