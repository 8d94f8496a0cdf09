use chrono::NaiveDate;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, JoinType, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, RelationTrait, Set,
};
use std::sync::Arc;
use strum::VariantNames;
use tracing::{info, instrument};

use super::sort_order;
use crate::{
    db::{contains_ci, DbPool},
    entities::{
        clients::{self, Entity as Clients},
        prescriptions::{self, Entity as Prescriptions, PrescriptionStatus},
    },
    errors::ServiceError,
    tenant::TenantId,
};

#[derive(Debug, Clone)]
pub struct CreatePrescription {
    pub client_id: i64,
    pub issued_on: NaiveDate,
    pub professional: Option<String>,
    pub lens_type: Option<String>,
    pub od_sphere: Option<f64>,
    pub od_cylinder: Option<f64>,
    pub od_axis: Option<i32>,
    pub os_sphere: Option<f64>,
    pub os_cylinder: Option<f64>,
    pub os_axis: Option<i32>,
    pub addition: Option<f64>,
    pub pupillary_distance: Option<f64>,
    pub notes: Option<String>,
    pub status: Option<String>,
    pub recorded_on: Option<NaiveDate>,
}

/// Allow-listed partial update; absent fields are left untouched.
#[derive(Debug, Clone, Default)]
pub struct PrescriptionPatch {
    pub client_id: Option<i64>,
    pub professional: Option<String>,
    pub lens_type: Option<String>,
    pub od_sphere: Option<f64>,
    pub od_cylinder: Option<f64>,
    pub od_axis: Option<i32>,
    pub os_sphere: Option<f64>,
    pub os_cylinder: Option<f64>,
    pub os_axis: Option<i32>,
    pub addition: Option<f64>,
    pub pupillary_distance: Option<f64>,
    pub notes: Option<String>,
    pub status: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct PrescriptionSearch {
    pub q: Option<String>,
    pub client_id: Option<i64>,
    pub national_id: Option<i64>,
    pub client_active: Option<bool>,
    pub status: Option<String>,
    pub lens_type: Option<String>,
    pub professional: Option<String>,
    pub issued_from: Option<NaiveDate>,
    pub issued_to: Option<NaiveDate>,
    pub order_by: String,
    pub order_dir: String,
    pub limit: u64,
    pub offset: u64,
}

fn validate_status(raw: &str) -> Result<PrescriptionStatus, ServiceError> {
    PrescriptionStatus::parse_normalized(raw).ok_or_else(|| {
        ServiceError::InvalidStatus(format!(
            "'{}' is not a valid prescription status. Allowed: {}",
            raw.trim(),
            PrescriptionStatus::VARIANTS.join(", ")
        ))
    })
}

/// Service for managing prescriptions
#[derive(Clone)]
pub struct PrescriptionService {
    db: Arc<DbPool>,
}

impl PrescriptionService {
    pub fn new(db: Arc<DbPool>) -> Self {
        Self { db }
    }

    async fn active_client_in_tenant(
        &self,
        tenant: &TenantId,
        client_id: i64,
    ) -> Result<(), ServiceError> {
        Clients::find()
            .filter(clients::Column::Id.eq(client_id))
            .filter(clients::Column::TenantId.eq(tenant.as_str()))
            .filter(clients::Column::Active.eq(true))
            .one(self.db.as_ref())
            .await?
            .map(|_| ())
            .ok_or_else(|| {
                ServiceError::ValidationError(
                    "Client not found, inactive or outside this tenant".to_string(),
                )
            })
    }

    #[instrument(skip(self, input))]
    pub async fn create(
        &self,
        tenant: &TenantId,
        input: CreatePrescription,
    ) -> Result<prescriptions::Model, ServiceError> {
        self.active_client_in_tenant(tenant, input.client_id).await?;

        let status = match input.status.as_deref() {
            Some(raw) => validate_status(raw)?,
            None => PrescriptionStatus::Active,
        };

        let model = prescriptions::ActiveModel {
            tenant_id: Set(tenant.as_str().to_string()),
            client_id: Set(input.client_id),
            issued_on: Set(input.issued_on),
            professional: Set(input.professional),
            lens_type: Set(input.lens_type),
            od_sphere: Set(input.od_sphere),
            od_cylinder: Set(input.od_cylinder),
            od_axis: Set(input.od_axis),
            os_sphere: Set(input.os_sphere),
            os_cylinder: Set(input.os_cylinder),
            os_axis: Set(input.os_axis),
            addition: Set(input.addition),
            pupillary_distance: Set(input.pupillary_distance),
            notes: Set(input.notes),
            status: Set(Some(status.to_string())),
            recorded_on: Set(input.recorded_on),
            ..Default::default()
        };

        let prescription = model.insert(self.db.as_ref()).await?;
        info!(prescription_id = prescription.id, "Prescription created");
        Ok(prescription)
    }

    #[instrument(skip(self))]
    pub async fn get(
        &self,
        tenant: &TenantId,
        id: i64,
    ) -> Result<prescriptions::Model, ServiceError> {
        Prescriptions::find()
            .filter(prescriptions::Column::Id.eq(id))
            .filter(prescriptions::Column::TenantId.eq(tenant.as_str()))
            .one(self.db.as_ref())
            .await?
            .ok_or_else(|| ServiceError::NotFound("Prescription not found".to_string()))
    }

    #[instrument(skip(self))]
    pub async fn list(&self, tenant: &TenantId) -> Result<Vec<prescriptions::Model>, ServiceError> {
        Ok(Prescriptions::find()
            .filter(prescriptions::Column::TenantId.eq(tenant.as_str()))
            .order_by_desc(prescriptions::Column::Id)
            .all(self.db.as_ref())
            .await?)
    }

    #[instrument(skip(self, params))]
    pub async fn search(
        &self,
        tenant: &TenantId,
        params: PrescriptionSearch,
    ) -> Result<(Vec<prescriptions::Model>, u64), ServiceError> {
        // Joined to clients for name/national-id filters; both sides stay
        // tenant-filtered so a foreign client can never leak through.
        let mut query = Prescriptions::find()
            .join(JoinType::InnerJoin, prescriptions::Relation::Client.def())
            .filter(prescriptions::Column::TenantId.eq(tenant.as_str()))
            .filter(clients::Column::TenantId.eq(tenant.as_str()));

        if let Some(client_id) = params.client_id {
            query = query.filter(prescriptions::Column::ClientId.eq(client_id));
        }
        if let Some(national_id) = params.national_id {
            query = query.filter(clients::Column::NationalId.eq(national_id));
        }
        if let Some(client_active) = params.client_active {
            query = query.filter(clients::Column::Active.eq(client_active));
        }
        if let Some(status) = params
            .status
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
        {
            query = query.filter(contains_ci(prescriptions::Column::Status, status));
        }
        if let Some(lens_type) = params
            .lens_type
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
        {
            query = query.filter(contains_ci(prescriptions::Column::LensType, lens_type));
        }
        if let Some(professional) = params
            .professional
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
        {
            query = query.filter(contains_ci(prescriptions::Column::Professional, professional));
        }
        if let Some(from) = params.issued_from {
            query = query.filter(prescriptions::Column::IssuedOn.gte(from));
        }
        if let Some(to) = params.issued_to {
            query = query.filter(prescriptions::Column::IssuedOn.lte(to));
        }
        if let Some(q) = params.q.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            query = query.filter(
                Condition::any()
                    .add(contains_ci(clients::Column::FirstName, q))
                    .add(contains_ci(clients::Column::LastName, q))
                    .add(contains_ci(prescriptions::Column::Professional, q))
                    .add(contains_ci(prescriptions::Column::LensType, q))
                    .add(contains_ci(prescriptions::Column::Status, q))
                    .add(contains_ci(prescriptions::Column::Notes, q)),
            );
        }

        let order = sort_order(&params.order_dir);
        let items_query = match params.order_by.as_str() {
            "id" => query.clone().order_by(prescriptions::Column::Id, order),
            "issued_on" => query.clone().order_by(prescriptions::Column::IssuedOn, order),
            "status" => query.clone().order_by(prescriptions::Column::Status, order),
            "lens_type" => query.clone().order_by(prescriptions::Column::LensType, order),
            "professional" => query
                .clone()
                .order_by(prescriptions::Column::Professional, order),
            "client_last_name" => query.clone().order_by(clients::Column::LastName, order),
            "client_first_name" => query.clone().order_by(clients::Column::FirstName, order),
            "national_id" => query.clone().order_by(clients::Column::NationalId, order),
            other => {
                return Err(ServiceError::ValidationError(format!(
                    "Invalid order_by '{}'. Allowed: id, issued_on, status, lens_type, professional, client_last_name, client_first_name, national_id",
                    other
                )))
            }
        };

        let total = query.count(self.db.as_ref()).await?;
        let items = items_query
            .order_by_desc(prescriptions::Column::Id)
            .offset(params.offset)
            .limit(params.limit)
            .all(self.db.as_ref())
            .await?;

        Ok((items, total))
    }

    /// Dedicated status transition; the status is validated against the
    /// fixed set before it is written.
    #[instrument(skip(self))]
    pub async fn update_status(
        &self,
        tenant: &TenantId,
        id: i64,
        status: &str,
        notes: Option<String>,
    ) -> Result<prescriptions::Model, ServiceError> {
        let prescription = self.get(tenant, id).await?;
        let status = validate_status(status)?;

        let mut model: prescriptions::ActiveModel = prescription.into();
        model.status = Set(Some(status.to_string()));
        if let Some(notes) = notes {
            model.notes = Set(Some(notes));
        }

        let updated = model.update(self.db.as_ref()).await?;
        info!(prescription_id = id, status = %status, "Prescription status updated");
        Ok(updated)
    }

    #[instrument(skip(self, patch))]
    pub async fn patch(
        &self,
        tenant: &TenantId,
        id: i64,
        patch: PrescriptionPatch,
    ) -> Result<prescriptions::Model, ServiceError> {
        let prescription = self.get(tenant, id).await?;

        if let Some(client_id) = patch.client_id {
            self.active_client_in_tenant(tenant, client_id).await?;
        }
        let status = match patch.status.as_deref() {
            Some(raw) => Some(validate_status(raw)?),
            None => None,
        };

        let mut model: prescriptions::ActiveModel = prescription.into();
        if let Some(client_id) = patch.client_id {
            model.client_id = Set(client_id);
        }
        if let Some(professional) = patch.professional {
            model.professional = Set(Some(professional));
        }
        if let Some(lens_type) = patch.lens_type {
            model.lens_type = Set(Some(lens_type));
        }
        if let Some(od_sphere) = patch.od_sphere {
            model.od_sphere = Set(Some(od_sphere));
        }
        if let Some(od_cylinder) = patch.od_cylinder {
            model.od_cylinder = Set(Some(od_cylinder));
        }
        if let Some(od_axis) = patch.od_axis {
            model.od_axis = Set(Some(od_axis));
        }
        if let Some(os_sphere) = patch.os_sphere {
            model.os_sphere = Set(Some(os_sphere));
        }
        if let Some(os_cylinder) = patch.os_cylinder {
            model.os_cylinder = Set(Some(os_cylinder));
        }
        if let Some(os_axis) = patch.os_axis {
            model.os_axis = Set(Some(os_axis));
        }
        if let Some(addition) = patch.addition {
            model.addition = Set(Some(addition));
        }
        if let Some(pupillary_distance) = patch.pupillary_distance {
            model.pupillary_distance = Set(Some(pupillary_distance));
        }
        if let Some(notes) = patch.notes {
            model.notes = Set(Some(notes));
        }
        if let Some(status) = status {
            model.status = Set(Some(status.to_string()));
        }

        Ok(model.update(self.db.as_ref()).await?)
    }
}
