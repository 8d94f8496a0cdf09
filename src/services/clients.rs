use chrono::{NaiveDate, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Set,
};
use std::sync::Arc;
use tracing::{info, instrument};

use super::sort_order;
use crate::{
    db::{contains_ci, DbPool},
    entities::clients::{self, Entity as Clients},
    errors::ServiceError,
    tenant::TenantId,
};

#[derive(Debug, Clone)]
pub struct CreateClient {
    pub first_name: String,
    pub last_name: String,
    pub national_id: i64,
    pub birth_date: Option<NaiveDate>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
    pub notes: Option<String>,
    pub active: bool,
}

/// Allow-listed partial update; absent fields are left untouched.
#[derive(Debug, Clone, Default)]
pub struct ClientPatch {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub national_id: Option<i64>,
    pub birth_date: Option<NaiveDate>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
    pub notes: Option<String>,
    pub active: Option<bool>,
}

#[derive(Debug, Clone, Default)]
pub struct ClientListFilter {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub national_id: Option<i64>,
    pub active: Option<bool>,
    pub registered_from: Option<NaiveDate>,
    pub registered_to: Option<NaiveDate>,
    pub offset: u64,
    pub limit: u64,
}

#[derive(Debug, Clone, Default)]
pub struct ClientSearch {
    pub q: Option<String>,
    pub national_id: Option<i64>,
    pub active: Option<bool>,
    pub registered_from: Option<NaiveDate>,
    pub registered_to: Option<NaiveDate>,
    pub order_by: String,
    pub order_dir: String,
    pub limit: u64,
    pub offset: u64,
}

/// Service for managing clients
#[derive(Clone)]
pub struct ClientService {
    db: Arc<DbPool>,
}

impl ClientService {
    pub fn new(db: Arc<DbPool>) -> Self {
        Self { db }
    }

    async fn national_id_taken(
        &self,
        tenant: &TenantId,
        national_id: i64,
    ) -> Result<bool, ServiceError> {
        let existing = Clients::find()
            .filter(clients::Column::TenantId.eq(tenant.as_str()))
            .filter(clients::Column::NationalId.eq(national_id))
            .one(self.db.as_ref())
            .await?;
        Ok(existing.is_some())
    }

    #[instrument(skip(self, input))]
    pub async fn create(
        &self,
        tenant: &TenantId,
        input: CreateClient,
    ) -> Result<clients::Model, ServiceError> {
        if self.national_id_taken(tenant, input.national_id).await? {
            return Err(ServiceError::Conflict(format!(
                "A client with national id {} already exists in this tenant",
                input.national_id
            )));
        }

        let model = clients::ActiveModel {
            tenant_id: Set(tenant.as_str().to_string()),
            first_name: Set(input.first_name),
            last_name: Set(input.last_name),
            national_id: Set(input.national_id),
            birth_date: Set(input.birth_date),
            phone: Set(input.phone),
            email: Set(input.email),
            address: Set(input.address),
            notes: Set(input.notes),
            registered_on: Set(Some(Utc::now().date_naive())),
            active: Set(input.active),
            ..Default::default()
        };

        let client = model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| ServiceError::from_db_err(e, "client national id within this tenant"))?;

        info!(client_id = client.id, "Client created");
        Ok(client)
    }

    #[instrument(skip(self))]
    pub async fn get(&self, tenant: &TenantId, id: i64) -> Result<clients::Model, ServiceError> {
        Clients::find()
            .filter(clients::Column::Id.eq(id))
            .filter(clients::Column::TenantId.eq(tenant.as_str()))
            .one(self.db.as_ref())
            .await?
            .ok_or_else(|| ServiceError::NotFound("Client not found".to_string()))
    }

    #[instrument(skip(self, filter))]
    pub async fn list(
        &self,
        tenant: &TenantId,
        filter: ClientListFilter,
    ) -> Result<Vec<clients::Model>, ServiceError> {
        let mut query = Clients::find().filter(clients::Column::TenantId.eq(tenant.as_str()));

        if let Some(first) = filter
            .first_name
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
        {
            query = query.filter(contains_ci(clients::Column::FirstName, first));
        }
        if let Some(last) = filter
            .last_name
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
        {
            query = query.filter(contains_ci(clients::Column::LastName, last));
        }
        if let Some(national_id) = filter.national_id {
            query = query.filter(clients::Column::NationalId.eq(national_id));
        }
        if let Some(active) = filter.active {
            query = query.filter(clients::Column::Active.eq(active));
        }
        if let Some(from) = filter.registered_from {
            query = query.filter(clients::Column::RegisteredOn.gte(from));
        }
        if let Some(to) = filter.registered_to {
            query = query.filter(clients::Column::RegisteredOn.lte(to));
        }

        Ok(query
            .order_by_asc(clients::Column::LastName)
            .order_by_asc(clients::Column::FirstName)
            .order_by_desc(clients::Column::Id)
            .offset(filter.offset)
            .limit(filter.limit)
            .all(self.db.as_ref())
            .await?)
    }

    /// Active clients for picker widgets.
    #[instrument(skip(self))]
    pub async fn select(
        &self,
        tenant: &TenantId,
        q: Option<String>,
        limit: u64,
    ) -> Result<Vec<clients::Model>, ServiceError> {
        let mut query = Clients::find()
            .filter(clients::Column::TenantId.eq(tenant.as_str()))
            .filter(clients::Column::Active.eq(true));

        if let Some(q) = q.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            query = query.filter(
                Condition::any()
                    .add(contains_ci(clients::Column::FirstName, q))
                    .add(contains_ci(clients::Column::LastName, q)),
            );
        }

        Ok(query
            .order_by_asc(clients::Column::LastName)
            .order_by_asc(clients::Column::FirstName)
            .limit(limit)
            .all(self.db.as_ref())
            .await?)
    }

    #[instrument(skip(self, params))]
    pub async fn search(
        &self,
        tenant: &TenantId,
        params: ClientSearch,
    ) -> Result<(Vec<clients::Model>, u64), ServiceError> {
        let mut query = Clients::find().filter(clients::Column::TenantId.eq(tenant.as_str()));

        if let Some(q) = params.q.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            query = query.filter(
                Condition::any()
                    .add(contains_ci(clients::Column::FirstName, q))
                    .add(contains_ci(clients::Column::LastName, q)),
            );
        }
        if let Some(national_id) = params.national_id {
            query = query.filter(clients::Column::NationalId.eq(national_id));
        }
        if let Some(active) = params.active {
            query = query.filter(clients::Column::Active.eq(active));
        }
        if let Some(from) = params.registered_from {
            query = query.filter(clients::Column::RegisteredOn.gte(from));
        }
        if let Some(to) = params.registered_to {
            query = query.filter(clients::Column::RegisteredOn.lte(to));
        }

        let order = sort_order(&params.order_dir);
        let sort_column = match params.order_by.to_lowercase().as_str() {
            "first_name" => clients::Column::FirstName,
            "last_name" => clients::Column::LastName,
            "national_id" => clients::Column::NationalId,
            "registered_on" => clients::Column::RegisteredOn,
            "id" => clients::Column::Id,
            other => {
                return Err(ServiceError::ValidationError(format!(
                    "Invalid order_by '{}'. Allowed: first_name, last_name, national_id, registered_on, id",
                    other
                )))
            }
        };

        let total = query.clone().count(self.db.as_ref()).await?;
        let items = query
            .order_by(sort_column, order)
            .order_by_asc(clients::Column::LastName)
            .order_by_asc(clients::Column::FirstName)
            .order_by_desc(clients::Column::Id)
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
        patch: ClientPatch,
    ) -> Result<clients::Model, ServiceError> {
        let client = self.get(tenant, id).await?;

        if let Some(national_id) = patch.national_id {
            if national_id != client.national_id && self.national_id_taken(tenant, national_id).await? {
                return Err(ServiceError::Conflict(format!(
                    "A client with national id {} already exists in this tenant",
                    national_id
                )));
            }
        }

        let mut model: clients::ActiveModel = client.into();
        if let Some(first_name) = patch.first_name {
            model.first_name = Set(first_name);
        }
        if let Some(last_name) = patch.last_name {
            model.last_name = Set(last_name);
        }
        if let Some(national_id) = patch.national_id {
            model.national_id = Set(national_id);
        }
        if let Some(birth_date) = patch.birth_date {
            model.birth_date = Set(Some(birth_date));
        }
        if let Some(phone) = patch.phone {
            model.phone = Set(Some(phone));
        }
        if let Some(email) = patch.email {
            model.email = Set(Some(email));
        }
        if let Some(address) = patch.address {
            model.address = Set(Some(address));
        }
        if let Some(notes) = patch.notes {
            model.notes = Set(Some(notes));
        }
        if let Some(active) = patch.active {
            model.active = Set(active);
        }

        Ok(model.update(self.db.as_ref()).await?)
    }

    /// Clients are never hard-deleted; prescriptions keep referencing them.
    #[instrument(skip(self))]
    pub async fn deactivate(&self, tenant: &TenantId, id: i64) -> Result<(), ServiceError> {
        let client = self.get(tenant, id).await?;

        let mut model: clients::ActiveModel = client.into();
        model.active = Set(false);
        model.update(self.db.as_ref()).await?;

        info!(client_id = id, "Client deactivated");
        Ok(())
    }
}
