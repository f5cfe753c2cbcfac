use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use models::sale::{self, SaleStatus};
use models::sale_item::{self, Totals};
use models::{company, product, tax};
use once_cell::sync::Lazy;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect, Set, TransactionTrait,
};
use serde_json::Value;
use uuid::Uuid;

use super::domain::{plan_lines, plan_stock_effects, NewSale, SaleDetail};
use crate::errors::ServiceError;
use crate::odata::translate::fetch_page;
use crate::odata::{FieldKind, FieldMap, ODataError, ODataQuery};
use crate::pagination::Page;
use crate::refs::RefState;

pub static FIELDS: Lazy<FieldMap<sale::Entity>> = Lazy::new(|| {
    FieldMap::new()
        .insert("id", sale::Column::Id, FieldKind::Uuid)
        .insert("company_id", sale::Column::CompanyId, FieldKind::Uuid)
        .insert("customer_name", sale::Column::CustomerName, FieldKind::String)
        .insert("customer_document", sale::Column::CustomerDocument, FieldKind::String)
        .insert("status", sale::Column::Status, FieldKind::String)
        .insert("subtotal", sale::Column::Subtotal, FieldKind::Decimal)
        .insert("tax_total", sale::Column::TaxTotal, FieldKind::Decimal)
        .insert("total", sale::Column::Total, FieldKind::Decimal)
        .insert("notes", sale::Column::Notes, FieldKind::String)
        .insert("cancel_reason", sale::Column::CancelReason, FieldKind::String)
        .insert("created_by", sale::Column::CreatedBy, FieldKind::Uuid)
        .insert("confirmed_at", sale::Column::ConfirmedAt, FieldKind::DateTime)
        .insert("completed_at", sale::Column::CompletedAt, FieldKind::DateTime)
        .insert("cancelled_at", sale::Column::CancelledAt, FieldKind::DateTime)
        .insert("is_deleted", sale::Column::IsDeleted, FieldKind::Bool)
        .insert("deleted_at", sale::Column::DeletedAt, FieldKind::DateTime)
        .insert("created_at", sale::Column::CreatedAt, FieldKind::DateTime)
        .insert("updated_at", sale::Column::UpdatedAt, FieldKind::DateTime)
});

#[async_trait]
pub trait SaleRepository: Send + Sync {
    async fn list(&self, query: &ODataQuery) -> Result<Page<sale::Model>, ServiceError>;
    async fn get(&self, id: Uuid) -> Result<Option<sale::Model>, ServiceError>;
    async fn items(&self, sale_id: Uuid) -> Result<Vec<sale_item::Model>, ServiceError>;
    async fn company_state(&self, company_id: Uuid) -> Result<RefState, ServiceError>;
    /// Atomically reserve stock for every line and persist the sale with its items.
    async fn insert(&self, sale: NewSale) -> Result<SaleDetail, ServiceError>;
    /// Atomically move the sale to `next`, applying the status' stock effect to every item.
    async fn transition(&self, id: Uuid, next: SaleStatus, reason: Option<String>) -> Result<SaleDetail, ServiceError>;
    async fn set_deleted(&self, id: Uuid, deleted: bool) -> Result<sale::Model, ServiceError>;
    async fn expand(&self, items: &[sale::Model], nav: &str) -> Result<HashMap<Uuid, Value>, ServiceError>;
}

pub struct SeaOrmSaleRepository {
    pub db: DatabaseConnection,
}

/// Lock `ids` in ascending order so concurrent sales cannot deadlock on the same products.
async fn lock_products<C: ConnectionTrait>(txn: &C, mut ids: Vec<Uuid>) -> Result<HashMap<Uuid, product::Model>, ServiceError> {
    ids.sort();
    ids.dedup();
    Ok(product::Entity::find()
        .filter(product::Column::Id.is_in(ids))
        .order_by_asc(product::Column::Id)
        .lock_exclusive()
        .all(txn)
        .await?
        .into_iter()
        .map(|p| (p.id, p))
        .collect())
}

async fn store_stock<C: ConnectionTrait>(
    txn: &C,
    products: &HashMap<Uuid, product::Model>,
    id: Uuid,
    stock: product::Stock,
) -> Result<(), ServiceError> {
    let Some(p) = products.get(&id) else { return Ok(()) };
    let mut am: product::ActiveModel = p.clone().into();
    am.stock = Set(stock.on_hand);
    am.reserved_stock = Set(stock.reserved);
    am.updated_at = Set(Utc::now().into());
    am.update(txn).await?;
    Ok(())
}

#[async_trait]
impl SaleRepository for SeaOrmSaleRepository {
    async fn list(&self, query: &ODataQuery) -> Result<Page<sale::Model>, ServiceError> {
        let base = sale::Entity::find().filter(sale::Column::IsDeleted.eq(false));
        fetch_page(&self.db, base, query, &FIELDS).await
    }

    async fn get(&self, id: Uuid) -> Result<Option<sale::Model>, ServiceError> {
        Ok(sale::Entity::find_by_id(id).one(&self.db).await?)
    }

    async fn items(&self, sale_id: Uuid) -> Result<Vec<sale_item::Model>, ServiceError> {
        Ok(sale_item::Entity::find()
            .filter(sale_item::Column::SaleId.eq(sale_id))
            .order_by_asc(sale_item::Column::Id)
            .all(&self.db)
            .await?)
    }

    async fn company_state(&self, company_id: Uuid) -> Result<RefState, ServiceError> {
        let found = company::Entity::find_by_id(company_id).one(&self.db).await?;
        Ok(RefState::of(found.map(|c| c.is_deleted)))
    }

    async fn insert(&self, new: NewSale) -> Result<SaleDetail, ServiceError> {
        let txn = self.db.begin().await?;
        let products = lock_products(&txn, new.lines.iter().map(|(id, _)| *id).collect()).await?;
        let tax_ids: Vec<Uuid> = products.values().filter_map(|p| p.tax_id).collect();
        let rates: HashMap<Uuid, Decimal> = tax::Entity::find()
            .filter(tax::Column::Id.is_in(tax_ids))
            .all(&txn)
            .await?
            .into_iter()
            .map(|t| (t.id, t.rate))
            .collect();
        let plan = plan_lines(&new.lines, &products, &rates)?;
        let totals = Totals::of(plan.iter().map(|l| &l.pricing))?;
        for line in &plan {
            store_stock(&txn, &products, line.product_id, line.stock).await?;
        }

        let now = Utc::now().into();
        let sale_id = Uuid::new_v4();
        let created = sale::ActiveModel {
            id: Set(sale_id),
            company_id: Set(new.company_id),
            customer_name: Set(new.customer_name),
            customer_document: Set(new.customer_document),
            status: Set(SaleStatus::Pending),
            subtotal: Set(totals.subtotal),
            tax_total: Set(totals.tax_total),
            total: Set(totals.total),
            notes: Set(new.notes),
            cancel_reason: Set(None),
            created_by: Set(new.created_by),
            confirmed_at: Set(None),
            completed_at: Set(None),
            cancelled_at: Set(None),
            is_deleted: Set(false),
            deleted_at: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&txn)
        .await?;

        let mut items = Vec::with_capacity(plan.len());
        for line in &plan {
            let p = &line.pricing;
            let item = sale_item::ActiveModel {
                id: Set(Uuid::new_v4()),
                sale_id: Set(sale_id),
                product_id: Set(line.product_id),
                quantity: Set(p.quantity),
                unit_price: Set(p.unit_price),
                tax_rate: Set(p.tax_rate),
                subtotal: Set(p.subtotal),
                tax_amount: Set(p.tax_amount),
                total: Set(p.total),
            }
            .insert(&txn)
            .await?;
            items.push(item);
        }
        txn.commit().await?;
        Ok(SaleDetail { sale: created, items })
    }

    async fn transition(&self, id: Uuid, next: SaleStatus, reason: Option<String>) -> Result<SaleDetail, ServiceError> {
        let txn = self.db.begin().await?;
        let current = sale::Entity::find_by_id(id)
            .lock_exclusive()
            .one(&txn)
            .await?
            .filter(|s| !s.is_deleted)
            .ok_or_else(|| ServiceError::not_found("sale"))?;
        let status = current.status.transition(next)?;
        let items = sale_item::Entity::find()
            .filter(sale_item::Column::SaleId.eq(id))
            .order_by_asc(sale_item::Column::Id)
            .all(&txn)
            .await?;
        if status.stock_effect(1).is_some() {
            let products = lock_products(&txn, items.iter().map(|i| i.product_id).collect()).await?;
            for (product_id, stock) in plan_stock_effects(status, &items, &products)? {
                store_stock(&txn, &products, product_id, stock).await?;
            }
        }

        let now = Utc::now();
        let mut am: sale::ActiveModel = current.into();
        am.status = Set(status);
        match status {
            SaleStatus::Confirmed => am.confirmed_at = Set(Some(now.into())),
            SaleStatus::Completed => am.completed_at = Set(Some(now.into())),
            SaleStatus::Cancelled => {
                am.cancelled_at = Set(Some(now.into()));
                am.cancel_reason = Set(reason);
            }
            SaleStatus::Pending => {}
        }
        am.updated_at = Set(now.into());
        let sale = am.update(&txn).await?;
        txn.commit().await?;
        Ok(SaleDetail { sale, items })
    }

    async fn set_deleted(&self, id: Uuid, deleted: bool) -> Result<sale::Model, ServiceError> {
        let mut am: sale::ActiveModel = sale::Entity::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or_else(|| ServiceError::not_found("sale"))?
            .into();
        let now = Utc::now();
        am.is_deleted = Set(deleted);
        am.deleted_at = Set(deleted.then(|| now.into()));
        am.updated_at = Set(now.into());
        Ok(am.update(&self.db).await?)
    }

    async fn expand(&self, sales: &[sale::Model], nav: &str) -> Result<HashMap<Uuid, Value>, ServiceError> {
        match nav {
            "company" => {
                let ids: Vec<Uuid> = sales.iter().map(|s| s.company_id).collect();
                let companies: HashMap<Uuid, Value> = company::Entity::find()
                    .filter(company::Column::Id.is_in(ids))
                    .all(&self.db)
                    .await?
                    .into_iter()
                    .filter_map(|c| serde_json::to_value(&c).ok().map(|v| (c.id, v)))
                    .collect();
                Ok(sales
                    .iter()
                    .filter_map(|s| companies.get(&s.company_id).map(|c| (s.id, c.clone())))
                    .collect())
            }
            "items" => {
                let ids: Vec<Uuid> = sales.iter().map(|s| s.id).collect();
                let rows = sale_item::Entity::find()
                    .filter(sale_item::Column::SaleId.is_in(ids))
                    .order_by_asc(sale_item::Column::Id)
                    .all(&self.db)
                    .await?;
                Ok(group_items(sales, rows))
            }
            other => Err(ODataError::UnknownNavigation(other.to_string()).into()),
        }
    }
}

/// Item arrays per sale; sales without rows get an empty array.
fn group_items(sales: &[sale::Model], rows: Vec<sale_item::Model>) -> HashMap<Uuid, Value> {
    let mut grouped: HashMap<Uuid, Vec<Value>> = sales.iter().map(|s| (s.id, Vec::new())).collect();
    for row in rows {
        if let (Some(list), Ok(v)) = (grouped.get_mut(&row.sale_id), serde_json::to_value(&row)) {
            list.push(v);
        }
    }
    grouped.into_iter().map(|(id, list)| (id, Value::Array(list))).collect()
}

pub mod mock {
    use super::*;
    use std::sync::Mutex;

    /// Sales plus the companies, products and tax rates they draw on.
    #[derive(Default)]
    pub struct MockSaleRepository {
        companies: Mutex<HashMap<Uuid, RefState>>,
        products: Mutex<HashMap<Uuid, product::Model>>,
        rates: Mutex<HashMap<Uuid, Decimal>>,
        sales: Mutex<HashMap<Uuid, sale::Model>>,
        items: Mutex<Vec<sale_item::Model>>,
    }

    impl MockSaleRepository {
        pub fn set_company(&self, id: Uuid, state: RefState) {
            self.companies.lock().unwrap().insert(id, state);
        }

        pub fn put_product(&self, product: product::Model) {
            self.products.lock().unwrap().insert(product.id, product);
        }

        pub fn product(&self, id: Uuid) -> Option<product::Model> {
            self.products.lock().unwrap().get(&id).cloned()
        }

        pub fn set_rate(&self, tax_id: Uuid, rate: Decimal) {
            self.rates.lock().unwrap().insert(tax_id, rate);
        }

        fn items_of(&self, sale_id: Uuid) -> Vec<sale_item::Model> {
            self.items.lock().unwrap().iter().filter(|i| i.sale_id == sale_id).cloned().collect()
        }

        fn store(&self, updates: Vec<(Uuid, product::Stock)>) {
            let mut products = self.products.lock().unwrap();
            for (id, stock) in updates {
                if let Some(p) = products.get_mut(&id) {
                    p.stock = stock.on_hand;
                    p.reserved_stock = stock.reserved;
                }
            }
        }
    }

    #[async_trait]
    impl SaleRepository for MockSaleRepository {
        async fn list(&self, query: &ODataQuery) -> Result<Page<sale::Model>, ServiceError> {
            let mut live: Vec<_> = self.sales.lock().unwrap().values().filter(|s| !s.is_deleted).cloned().collect();
            live.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(a.id.cmp(&b.id)));
            let total = live.len() as u64;
            let items = live.into_iter().skip(query.skip as usize).take(query.top as usize).collect();
            Ok(Page::new(items, total, query.top, query.skip))
        }

        async fn get(&self, id: Uuid) -> Result<Option<sale::Model>, ServiceError> {
            Ok(self.sales.lock().unwrap().get(&id).cloned())
        }

        async fn items(&self, sale_id: Uuid) -> Result<Vec<sale_item::Model>, ServiceError> {
            Ok(self.items_of(sale_id))
        }

        async fn company_state(&self, company_id: Uuid) -> Result<RefState, ServiceError> {
            Ok(self.companies.lock().unwrap().get(&company_id).copied().unwrap_or(RefState::Missing))
        }

        async fn insert(&self, new: NewSale) -> Result<SaleDetail, ServiceError> {
            let plan = {
                let products = self.products.lock().unwrap();
                let rates = self.rates.lock().unwrap();
                plan_lines(&new.lines, &products, &rates)?
            };
            let totals = Totals::of(plan.iter().map(|l| &l.pricing))?;
            self.store(plan.iter().map(|l| (l.product_id, l.stock)).collect());
            let now = Utc::now().into();
            let sale = sale::Model {
                id: Uuid::new_v4(),
                company_id: new.company_id,
                customer_name: new.customer_name,
                customer_document: new.customer_document,
                status: SaleStatus::Pending,
                subtotal: totals.subtotal,
                tax_total: totals.tax_total,
                total: totals.total,
                notes: new.notes,
                cancel_reason: None,
                created_by: new.created_by,
                confirmed_at: None,
                completed_at: None,
                cancelled_at: None,
                is_deleted: false,
                deleted_at: None,
                created_at: now,
                updated_at: now,
            };
            let items: Vec<sale_item::Model> = plan
                .iter()
                .map(|l| sale_item::Model {
                    id: Uuid::new_v4(),
                    sale_id: sale.id,
                    product_id: l.product_id,
                    quantity: l.pricing.quantity,
                    unit_price: l.pricing.unit_price,
                    tax_rate: l.pricing.tax_rate,
                    subtotal: l.pricing.subtotal,
                    tax_amount: l.pricing.tax_amount,
                    total: l.pricing.total,
                })
                .collect();
            self.sales.lock().unwrap().insert(sale.id, sale.clone());
            self.items.lock().unwrap().extend(items.iter().cloned());
            Ok(SaleDetail { sale, items })
        }

        async fn transition(&self, id: Uuid, next: SaleStatus, reason: Option<String>) -> Result<SaleDetail, ServiceError> {
            let current = self
                .sales
                .lock()
                .unwrap()
                .get(&id)
                .filter(|s| !s.is_deleted)
                .cloned()
                .ok_or_else(|| ServiceError::not_found("sale"))?;
            let status = current.status.transition(next)?;
            let items = self.items_of(id);
            let updates = {
                let products = self.products.lock().unwrap();
                plan_stock_effects(status, &items, &products)?
            };
            self.store(updates);
            let now = Utc::now();
            let mut sale = current;
            sale.status = status;
            match status {
                SaleStatus::Confirmed => sale.confirmed_at = Some(now.into()),
                SaleStatus::Completed => sale.completed_at = Some(now.into()),
                SaleStatus::Cancelled => {
                    sale.cancelled_at = Some(now.into());
                    sale.cancel_reason = reason;
                }
                SaleStatus::Pending => {}
            }
            sale.updated_at = now.into();
            self.sales.lock().unwrap().insert(id, sale.clone());
            Ok(SaleDetail { sale, items })
        }

        async fn set_deleted(&self, id: Uuid, deleted: bool) -> Result<sale::Model, ServiceError> {
            let mut sales = self.sales.lock().unwrap();
            let sale = sales.get_mut(&id).ok_or_else(|| ServiceError::not_found("sale"))?;
            let now = Utc::now();
            sale.is_deleted = deleted;
            sale.deleted_at = deleted.then(|| now.into());
            sale.updated_at = now.into();
            Ok(sale.clone())
        }

        async fn expand(&self, sales: &[sale::Model], nav: &str) -> Result<HashMap<Uuid, Value>, ServiceError> {
            match nav {
                "items" => Ok(group_items(sales, self.items.lock().unwrap().clone())),
                _ => Ok(sales.iter().map(|s| (s.id, serde_json::json!({ "id": s.company_id }))).collect()),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    fn sale(id: Uuid) -> sale::Model {
        let now = Utc::now().into();
        sale::Model {
            id,
            company_id: Uuid::nil(),
            customer_name: "Maria".into(),
            customer_document: "52998224725".into(),
            status: SaleStatus::Pending,
            subtotal: Decimal::ZERO,
            tax_total: Decimal::ZERO,
            total: Decimal::ZERO,
            notes: None,
            cancel_reason: None,
            created_by: Uuid::nil(),
            confirmed_at: None,
            completed_at: None,
            cancelled_at: None,
            is_deleted: false,
            deleted_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn grouping_gives_every_sale_an_array() {
        let (a, b) = (Uuid::new_v4(), Uuid::new_v4());
        let item = sale_item::Model {
            id: Uuid::new_v4(),
            sale_id: a,
            product_id: Uuid::new_v4(),
            quantity: 1,
            unit_price: Decimal::ONE,
            tax_rate: Decimal::ZERO,
            subtotal: Decimal::ONE,
            tax_amount: Decimal::ZERO,
            total: Decimal::ONE,
        };
        let grouped = group_items(&[sale(a), sale(b)], vec![item]);
        assert_eq!(grouped[&a].as_array().map(Vec::len), Some(1));
        assert_eq!(grouped[&b], Value::Array(vec![]));
    }
}
