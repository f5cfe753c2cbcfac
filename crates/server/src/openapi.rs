use serde::Deserialize;
use utoipa::{IntoParams, OpenApi, ToSchema};
use uuid::Uuid;

#[derive(ToSchema)]
pub struct HealthResponse { pub status: String, pub version: String }

#[derive(ToSchema)]
pub struct RegisterRequest { pub email: String, pub name: String, pub password: String }

#[derive(ToSchema)]
pub struct LoginRequest { pub email: String, pub password: String }

#[derive(ToSchema)]
pub struct ChangeRoleDoc {
    /// admin, manager, seller or viewer
    pub role: String,
}

#[derive(ToSchema)]
pub struct CategoryDoc { pub name: String, pub description: Option<String> }

#[derive(ToSchema)]
pub struct CompanyDoc {
    pub name: String,
    pub trade_name: Option<String>,
    /// CNPJ, formatted or bare digits
    pub document: String,
    pub email: Option<String>,
    pub phone: Option<String>,
}

#[derive(ToSchema)]
pub struct TaxDoc {
    pub code: String,
    pub name: String,
    /// Percentage between 0 and 100, up to 4 decimals
    #[schema(example = "18.0000")]
    pub rate: String,
    pub description: Option<String>,
}

#[derive(ToSchema)]
pub struct ProductDoc {
    pub sku: String,
    pub name: String,
    pub description: Option<String>,
    #[schema(example = "19.90")]
    pub price: String,
    pub stock: Option<i32>,
    pub is_active: Option<bool>,
    pub category_id: Uuid,
    pub company_id: Uuid,
    pub tax_id: Option<Uuid>,
}

#[derive(ToSchema)]
pub struct StockAdjustmentDoc { pub delta: i32 }

#[derive(ToSchema)]
pub struct StockQuantityDoc { pub quantity: i32 }

#[derive(ToSchema)]
pub struct SaleLineDoc { pub product_id: Uuid, pub quantity: i32 }

#[derive(ToSchema)]
pub struct SaleDoc {
    pub company_id: Uuid,
    pub customer_name: String,
    /// CPF or CNPJ
    pub customer_document: String,
    pub notes: Option<String>,
    pub items: Vec<SaleLineDoc>,
}

#[derive(ToSchema)]
pub struct CancelDoc { pub reason: Option<String> }

/// OData-subset list options.
#[allow(dead_code)]
#[derive(Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ODataParams {
    /// e.g. `price gt 10 and contains(name,'mug')`
    #[serde(rename = "$filter")]
    pub filter: Option<String>,
    /// e.g. `price desc,name`
    #[serde(rename = "$orderby")]
    pub orderby: Option<String>,
    #[serde(rename = "$top")]
    pub top: Option<u64>,
    #[serde(rename = "$skip")]
    pub skip: Option<u64>,
    #[serde(rename = "$select")]
    pub select: Option<String>,
    #[serde(rename = "$expand")]
    pub expand: Option<String>,
    #[serde(rename = "$count")]
    pub count: Option<bool>,
}

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::routes::health,
        crate::routes::auth::register,
        crate::routes::auth::login,
        crate::routes::auth::logout,
        crate::routes::auth::me,
        crate::routes::categories::list,
        crate::routes::categories::get,
        crate::routes::categories::create,
        crate::routes::categories::update,
        crate::routes::categories::delete,
        crate::routes::categories::restore,
        crate::routes::companies::list,
        crate::routes::companies::get,
        crate::routes::companies::create,
        crate::routes::companies::update,
        crate::routes::companies::delete,
        crate::routes::companies::restore,
        crate::routes::taxes::list,
        crate::routes::taxes::get,
        crate::routes::taxes::create,
        crate::routes::taxes::update,
        crate::routes::taxes::delete,
        crate::routes::taxes::restore,
        crate::routes::products::list,
        crate::routes::products::get,
        crate::routes::products::create,
        crate::routes::products::update,
        crate::routes::products::delete,
        crate::routes::products::restore,
        crate::routes::products::adjust_stock,
        crate::routes::products::reserve,
        crate::routes::products::release,
        crate::routes::sales::list,
        crate::routes::sales::get,
        crate::routes::sales::items,
        crate::routes::sales::create,
        crate::routes::sales::confirm,
        crate::routes::sales::complete,
        crate::routes::sales::cancel,
        crate::routes::sales::delete,
        crate::routes::sales::restore,
        crate::routes::users::list,
        crate::routes::users::change_role,
        crate::routes::odata::collection,
    ),
    components(
        schemas(
            HealthResponse,
            RegisterRequest,
            LoginRequest,
            ChangeRoleDoc,
            CategoryDoc,
            CompanyDoc,
            TaxDoc,
            ProductDoc,
            StockAdjustmentDoc,
            StockQuantityDoc,
            SaleLineDoc,
            SaleDoc,
            CancelDoc,
        )
    ),
    tags(
        (name = "health"),
        (name = "auth"),
        (name = "categories"),
        (name = "companies"),
        (name = "taxes"),
        (name = "products"),
        (name = "sales"),
        (name = "users"),
        (name = "odata")
    )
)]
pub struct ApiDoc;
