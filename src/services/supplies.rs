use rust_decimal::Decimal;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, IntoSimpleExpr, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Set,
};
use std::sync::Arc;
use tracing::{info, instrument};

use super::sort_order;
use crate::{
    db::{contains_ci, DbPool},
    entities::{
        suppliers::{self, Entity as Suppliers},
        supplies::{self, Entity as Supplies},
    },
    errors::ServiceError,
    tenant::TenantId,
};

#[derive(Debug, Clone)]
pub struct CreateSupply {
    pub description: String,
    pub kind: Option<String>,
    pub supplier_id: Option<i64>,
    pub supplier_code: Option<String>,
    pub internal_code: Option<String>,
    pub cost_price: Option<Decimal>,
    pub suggested_price: Option<Decimal>,
    pub min_stock: Option<i32>,
    pub current_stock: Option<i32>,
    pub active: bool,
}

/// Allow-listed partial update; absent fields are left untouched.
#[derive(Debug, Clone, Default)]
pub struct SupplyPatch {
    pub description: Option<String>,
    pub kind: Option<String>,
    pub supplier_id: Option<i64>,
    pub supplier_code: Option<String>,
    pub internal_code: Option<String>,
    pub cost_price: Option<Decimal>,
    pub suggested_price: Option<Decimal>,
    pub min_stock: Option<i32>,
    pub current_stock: Option<i32>,
    pub active: Option<bool>,
}

#[derive(Debug, Clone, Default)]
pub struct SupplyListFilter {
    pub supplier_id: Option<i64>,
    pub active: Option<bool>,
    pub search: Option<String>,
    pub low_stock: bool,
}

#[derive(Debug, Clone, Default)]
pub struct SupplySearch {
    pub q: Option<String>,
    pub active: Option<bool>,
    pub supplier_id: Option<i64>,
    pub kind: Option<String>,
    pub order_by: String,
    pub order_dir: String,
    pub limit: u64,
    pub offset: u64,
}

/// Service for managing supplies and their stock metadata. Stock mutations
/// themselves belong to the purchase and lab-order workflows.
#[derive(Clone)]
pub struct SupplyService {
    db: Arc<DbPool>,
}

impl SupplyService {
    pub fn new(db: Arc<DbPool>) -> Self {
        Self { db }
    }

    async fn supplier_in_tenant(
        &self,
        tenant: &TenantId,
        supplier_id: i64,
    ) -> Result<(), ServiceError> {
        Suppliers::find()
            .filter(suppliers::Column::Id.eq(supplier_id))
            .filter(suppliers::Column::TenantId.eq(tenant.as_str()))
            .one(self.db.as_ref())
            .await?
            .map(|_| ())
            .ok_or_else(|| {
                ServiceError::ValidationError(
                    "The referenced supplier does not exist in this tenant".to_string(),
                )
            })
    }

    #[instrument(skip(self, input))]
    pub async fn create(
        &self,
        tenant: &TenantId,
        input: CreateSupply,
    ) -> Result<supplies::Model, ServiceError> {
        if let Some(supplier_id) = input.supplier_id {
            self.supplier_in_tenant(tenant, supplier_id).await?;
        }

        let model = supplies::ActiveModel {
            tenant_id: Set(tenant.as_str().to_string()),
            description: Set(input.description),
            kind: Set(input.kind),
            supplier_id: Set(input.supplier_id),
            supplier_code: Set(input.supplier_code),
            internal_code: Set(input.internal_code),
            cost_price: Set(input.cost_price),
            suggested_price: Set(input.suggested_price),
            min_stock: Set(input.min_stock),
            current_stock: Set(input.current_stock),
            active: Set(input.active),
            ..Default::default()
        };

        let supply = model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| ServiceError::from_db_err(e, "supply internal code within this tenant"))?;

        info!(supply_id = supply.id, "Supply created");
        Ok(supply)
    }

    #[instrument(skip(self))]
    pub async fn get(&self, tenant: &TenantId, id: i64) -> Result<supplies::Model, ServiceError> {
        Supplies::find()
            .filter(supplies::Column::Id.eq(id))
            .filter(supplies::Column::TenantId.eq(tenant.as_str()))
            .one(self.db.as_ref())
            .await?
            .ok_or_else(|| ServiceError::NotFound("Supply not found".to_string()))
    }

    #[instrument(skip(self, filter))]
    pub async fn list(
        &self,
        tenant: &TenantId,
        filter: SupplyListFilter,
    ) -> Result<Vec<supplies::Model>, ServiceError> {
        let mut query = Supplies::find().filter(supplies::Column::TenantId.eq(tenant.as_str()));

        if let Some(supplier_id) = filter.supplier_id {
            self.supplier_in_tenant(tenant, supplier_id).await?;
            query = query.filter(supplies::Column::SupplierId.eq(supplier_id));
        }
        if let Some(active) = filter.active {
            query = query.filter(supplies::Column::Active.eq(active));
        }
        if let Some(search) = filter
            .search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
        {
            query = query.filter(
                Condition::any()
                    .add(contains_ci(supplies::Column::Description, search))
                    .add(contains_ci(supplies::Column::InternalCode, search)),
            );
        }
        if filter.low_stock {
            query = query
                .filter(supplies::Column::MinStock.is_not_null())
                .filter(supplies::Column::CurrentStock.is_not_null())
                .filter(
                    Expr::expr(supplies::Column::CurrentStock.into_simple_expr())
                        .lte(supplies::Column::MinStock.into_simple_expr()),
                );
        }

        Ok(query
            .order_by_asc(supplies::Column::Description)
            .all(self.db.as_ref())
            .await?)
    }

    /// Active supplies for picker widgets, optionally limited to one supplier.
    #[instrument(skip(self))]
    pub async fn select(
        &self,
        tenant: &TenantId,
        supplier_id: Option<i64>,
        q: Option<String>,
        limit: u64,
    ) -> Result<Vec<supplies::Model>, ServiceError> {
        let mut query = Supplies::find()
            .filter(supplies::Column::TenantId.eq(tenant.as_str()))
            .filter(supplies::Column::Active.eq(true));

        if let Some(supplier_id) = supplier_id {
            self.supplier_in_tenant(tenant, supplier_id).await?;
            query = query.filter(supplies::Column::SupplierId.eq(supplier_id));
        }
        if let Some(q) = q.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            query = query.filter(
                Condition::any()
                    .add(contains_ci(supplies::Column::Description, q))
                    .add(contains_ci(supplies::Column::InternalCode, q))
                    .add(contains_ci(supplies::Column::SupplierCode, q)),
            );
        }

        Ok(query
            .order_by_asc(supplies::Column::Description)
            .limit(limit)
            .all(self.db.as_ref())
            .await?)
    }

    #[instrument(skip(self, params))]
    pub async fn search(
        &self,
        tenant: &TenantId,
        params: SupplySearch,
    ) -> Result<(Vec<supplies::Model>, u64), ServiceError> {
        let mut query = Supplies::find().filter(supplies::Column::TenantId.eq(tenant.as_str()));

        if let Some(active) = params.active {
            query = query.filter(supplies::Column::Active.eq(active));
        }
        if let Some(supplier_id) = params.supplier_id {
            self.supplier_in_tenant(tenant, supplier_id).await?;
            query = query.filter(supplies::Column::SupplierId.eq(supplier_id));
        }
        if let Some(kind) = params.kind.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            query = query.filter(contains_ci(supplies::Column::Kind, kind));
        }
        if let Some(q) = params.q.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            query = query.filter(
                Condition::any()
                    .add(contains_ci(supplies::Column::Description, q))
                    .add(contains_ci(supplies::Column::Kind, q))
                    .add(contains_ci(supplies::Column::SupplierCode, q))
                    .add(contains_ci(supplies::Column::InternalCode, q)),
            );
        }

        let order = sort_order(&params.order_dir);
        let sort_column = match params.order_by.as_str() {
            "description" => supplies::Column::Description,
            "kind" => supplies::Column::Kind,
            "current_stock" => supplies::Column::CurrentStock,
            "min_stock" => supplies::Column::MinStock,
            "cost_price" => supplies::Column::CostPrice,
            "suggested_price" => supplies::Column::SuggestedPrice,
            "id" => supplies::Column::Id,
            "supplier_id" => supplies::Column::SupplierId,
            other => {
                return Err(ServiceError::ValidationError(format!(
                    "Invalid order_by '{}'. Allowed: description, kind, current_stock, min_stock, cost_price, suggested_price, id, supplier_id",
                    other
                )))
            }
        };

        let total = query.clone().count(self.db.as_ref()).await?;
        let items = query
            .order_by(sort_column, order)
            .order_by_desc(supplies::Column::Id)
            .offset(params.offset)
            .limit(params.limit)
            .all(self.db.as_ref())
            .await?;

        Ok((items, total))
    }

    #[instrument(skip(self, patch))]
    pub async fn patch(
        &self,
        tenant: &TenantId,
        id: i64,
        patch: SupplyPatch,
    ) -> Result<supplies::Model, ServiceError> {
        let supply = self.get(tenant, id).await?;

        if let Some(supplier_id) = patch.supplier_id {
            self.supplier_in_tenant(tenant, supplier_id).await?;
        }

        let mut model: supplies::ActiveModel = supply.into();
        if let Some(description) = patch.description {
            model.description = Set(description);
        }
        if let Some(kind) = patch.kind {
            model.kind = Set(Some(kind));
        }
        if let Some(supplier_id) = patch.supplier_id {
            model.supplier_id = Set(Some(supplier_id));
        }
        if let Some(supplier_code) = patch.supplier_code {
            model.supplier_code = Set(Some(supplier_code));
        }
        if let Some(internal_code) = patch.internal_code {
            model.internal_code = Set(Some(internal_code));
        }
        if let Some(cost_price) = patch.cost_price {
            model.cost_price = Set(Some(cost_price));
        }
        if let Some(suggested_price) = patch.suggested_price {
            model.suggested_price = Set(Some(suggested_price));
        }
        if let Some(min_stock) = patch.min_stock {
            model.min_stock = Set(Some(min_stock));
        }
        if let Some(current_stock) = patch.current_stock {
            if current_stock < 0 {
                return Err(ServiceError::ValidationError(
                    "current_stock cannot be negative".to_string(),
                ));
            }
            model.current_stock = Set(Some(current_stock));
        }
        if let Some(active) = patch.active {
            model.active = Set(active);
        }

        model
            .update(self.db.as_ref())
            .await
            .map_err(|e| ServiceError::from_db_err(e, "supply internal code within this tenant"))
    }

    #[instrument(skip(self))]
    pub async fn deactivate(&self, tenant: &TenantId, id: i64) -> Result<(), ServiceError> {
        let supply = self.get(tenant, id).await?;

        let mut model: supplies::ActiveModel = supply.into();
        model.active = Set(false);
        model.update(self.db.as_ref()).await?;

        info!(supply_id = id, "Supply deactivated");
        Ok(())
    }
}
