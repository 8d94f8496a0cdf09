use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Set,
};
use std::sync::Arc;
use tracing::{info, instrument};

use super::sort_order;
use crate::{
    db::{contains_ci, DbPool},
    entities::suppliers::{self, Entity as Suppliers},
    errors::ServiceError,
    tenant::TenantId,
};

#[derive(Debug, Clone)]
pub struct CreateSupplier {
    pub name: String,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
    pub active: bool,
}

#[derive(Debug, Clone)]
pub struct UpdateSupplier {
    pub name: String,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
    pub active: bool,
}

#[derive(Debug, Clone, Default)]
pub struct SupplierSearch {
    pub q: Option<String>,
    pub active: Option<bool>,
    pub order_by: String,
    pub order_dir: String,
    pub limit: u64,
    pub offset: u64,
}

/// Service for managing suppliers
#[derive(Clone)]
pub struct SupplierService {
    db: Arc<DbPool>,
}

impl SupplierService {
    pub fn new(db: Arc<DbPool>) -> Self {
        Self { db }
    }

    #[instrument(skip(self, input))]
    pub async fn create(
        &self,
        tenant: &TenantId,
        input: CreateSupplier,
    ) -> Result<suppliers::Model, ServiceError> {
        let model = suppliers::ActiveModel {
            tenant_id: Set(tenant.as_str().to_string()),
            name: Set(input.name),
            phone: Set(input.phone),
            email: Set(input.email),
            address: Set(input.address),
            active: Set(input.active),
            ..Default::default()
        };

        let supplier = model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| ServiceError::from_db_err(e, "supplier name within this tenant"))?;

        info!(supplier_id = supplier.id, "Supplier created");
        Ok(supplier)
    }

    #[instrument(skip(self))]
    pub async fn get(&self, tenant: &TenantId, id: i64) -> Result<suppliers::Model, ServiceError> {
        Suppliers::find()
            .filter(suppliers::Column::Id.eq(id))
            .filter(suppliers::Column::TenantId.eq(tenant.as_str()))
            .one(self.db.as_ref())
            .await?
            .ok_or_else(|| ServiceError::NotFound("Supplier not found".to_string()))
    }

    #[instrument(skip(self))]
    pub async fn list(
        &self,
        tenant: &TenantId,
        active: Option<bool>,
        name: Option<String>,
    ) -> Result<Vec<suppliers::Model>, ServiceError> {
        let mut query =
            Suppliers::find().filter(suppliers::Column::TenantId.eq(tenant.as_str()));

        if let Some(active) = active {
            query = query.filter(suppliers::Column::Active.eq(active));
        }
        if let Some(name) = name.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            query = query.filter(contains_ci(suppliers::Column::Name, name));
        }

        Ok(query
            .order_by_asc(suppliers::Column::Name)
            .all(self.db.as_ref())
            .await?)
    }

    /// Active suppliers for picker widgets: id + name only.
    #[instrument(skip(self))]
    pub async fn select(
        &self,
        tenant: &TenantId,
        q: Option<String>,
        limit: u64,
    ) -> Result<Vec<suppliers::Model>, ServiceError> {
        let mut query = Suppliers::find()
            .filter(suppliers::Column::TenantId.eq(tenant.as_str()))
            .filter(suppliers::Column::Active.eq(true));

        if let Some(q) = q.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            query = query.filter(contains_ci(suppliers::Column::Name, q));
        }

        Ok(query
            .order_by_asc(suppliers::Column::Name)
            .limit(limit)
            .all(self.db.as_ref())
            .await?)
    }

    #[instrument(skip(self, params))]
    pub async fn search(
        &self,
        tenant: &TenantId,
        params: SupplierSearch,
    ) -> Result<(Vec<suppliers::Model>, u64), ServiceError> {
        let mut query =
            Suppliers::find().filter(suppliers::Column::TenantId.eq(tenant.as_str()));

        if let Some(q) = params.q.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            query = query.filter(
                Condition::any()
                    .add(contains_ci(suppliers::Column::Name, q))
                    .add(contains_ci(suppliers::Column::Email, q))
                    .add(contains_ci(suppliers::Column::Phone, q))
                    .add(contains_ci(suppliers::Column::Address, q)),
            );
        }
        if let Some(active) = params.active {
            query = query.filter(suppliers::Column::Active.eq(active));
        }

        let order = sort_order(&params.order_dir);
        let sort_column = match params.order_by.as_str() {
            "id" => suppliers::Column::Id,
            "name" => suppliers::Column::Name,
            "email" => suppliers::Column::Email,
            "phone" => suppliers::Column::Phone,
            other => {
                return Err(ServiceError::ValidationError(format!(
                    "Invalid order_by '{}'. Allowed: id, name, email, phone",
                    other
                )))
            }
        };

        let total = query.clone().count(self.db.as_ref()).await?;
        let items = query
            .order_by(sort_column, order)
            .order_by_desc(suppliers::Column::Id)
            .offset(params.offset)
            .limit(params.limit)
            .all(self.db.as_ref())
            .await?;

        Ok((items, total))
    }

    /// Full update in the shape of the create payload.
    #[instrument(skip(self, input))]
    pub async fn update(
        &self,
        tenant: &TenantId,
        id: i64,
        input: UpdateSupplier,
    ) -> Result<suppliers::Model, ServiceError> {
        let supplier = self.get(tenant, id).await?;

        let mut model: suppliers::ActiveModel = supplier.into();
        model.name = Set(input.name);
        model.phone = Set(input.phone);
        model.email = Set(input.email);
        model.address = Set(input.address);
        model.active = Set(input.active);

        model
            .update(self.db.as_ref())
            .await
            .map_err(|e| ServiceError::from_db_err(e, "supplier name within this tenant"))
    }

    /// Suppliers are never hard-deleted; supplies and orders keep
    /// referencing them by id.
    #[instrument(skip(self))]
    pub async fn deactivate(&self, tenant: &TenantId, id: i64) -> Result<(), ServiceError> {
        let supplier = self.get(tenant, id).await?;

        let mut model: suppliers::ActiveModel = supplier.into();
        model.active = Set(false);
        model.update(self.db.as_ref()).await?;

        info!(supplier_id = id, "Supplier deactivated");
        Ok(())
    }
}
