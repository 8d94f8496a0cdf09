use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Set, TransactionTrait,
};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use strum::VariantNames;
use tracing::{info, instrument};

use super::{sort_order, unwrap_txn_err};
use crate::{
    db::{contains_ci, DbPool},
    entities::{
        lab_order_lines::{self, Entity as LabOrderLines},
        lab_orders::{self, Entity as LabOrders, LabOrderStatus},
        prescriptions::{self, Entity as Prescriptions},
        suppliers::{self, Entity as Suppliers},
        supplies::{self, Entity as Supplies},
    },
    errors::ServiceError,
    tenant::TenantId,
};

#[derive(Debug, Clone)]
pub struct LabOrderLineInput {
    pub supply_id: i64,
    pub quantity: i32,
    pub unit_price: Decimal,
    pub notes: Option<String>,
}

#[derive(Debug, Clone)]
pub struct CreateLabOrder {
    pub prescription_id: i64,
    pub supplier_id: i64,
    pub sent_on: Option<NaiveDate>,
    pub expected_on: Option<NaiveDate>,
    pub received_on: Option<NaiveDate>,
    pub status: Option<String>,
    pub lab_order_number: Option<String>,
    pub notes: Option<String>,
    pub lines: Vec<LabOrderLineInput>,
}

#[derive(Debug, Clone)]
pub struct LabOrderCreated {
    pub id: i64,
    pub prescription_id: i64,
    pub supplier_id: i64,
    pub status: String,
    pub line_count: usize,
}

#[derive(Debug, Clone)]
pub struct ReceiveLabOrder {
    pub received_on: Option<NaiveDate>,
    pub status: Option<String>,
    pub lab_order_number: Option<String>,
    pub notes: Option<String>,
    pub deduct_stock: bool,
}

#[derive(Debug, Clone)]
pub struct LabOrderReceipt {
    pub id: i64,
    pub received_on: NaiveDate,
    pub status: String,
    pub stock_deducted: bool,
}

/// Allow-listed header merge. A status inside the patch follows the same
/// terminal guard as the dedicated status endpoint.
#[derive(Debug, Clone, Default)]
pub struct LabOrderPatch {
    pub status: Option<String>,
    pub lab_order_number: Option<String>,
    pub expected_on: Option<NaiveDate>,
    pub notes: Option<String>,
}

impl LabOrderPatch {
    fn is_empty(&self) -> bool {
        self.status.is_none()
            && self.lab_order_number.is_none()
            && self.expected_on.is_none()
            && self.notes.is_none()
    }
}

#[derive(Debug, Clone, Default)]
pub struct LabOrderSearch {
    pub q: Option<String>,
    pub supplier_id: Option<i64>,
    pub prescription_id: Option<i64>,
    pub status: Option<String>,
    pub sent_from: Option<NaiveDate>,
    pub sent_to: Option<NaiveDate>,
    pub order_by: String,
    pub order_dir: String,
    pub limit: u64,
    pub offset: u64,
}

#[derive(Debug, Clone)]
pub struct LabOrderLineDetail {
    pub line: lab_order_lines::Model,
    pub supply_description: Option<String>,
}

#[derive(Debug, Clone)]
pub struct LabOrderDetail {
    pub order: lab_orders::Model,
    pub supplier: Option<suppliers::Model>,
    pub prescription: Option<prescriptions::Model>,
    pub lines: Vec<LabOrderLineDetail>,
}

fn validate_status(raw: &str) -> Result<LabOrderStatus, ServiceError> {
    LabOrderStatus::parse_normalized(raw).ok_or_else(|| {
        ServiceError::InvalidStatus(format!(
            "'{}' is not a valid lab order status. Allowed: {}",
            raw.trim(),
            LabOrderStatus::VARIANTS.join(", ")
        ))
    })
}

/// Lab orders consume stock only at receipt; receipt happens exactly once
/// and RECEIVED is a terminal status.
#[derive(Clone)]
pub struct LabOrderService {
    db: Arc<DbPool>,
}

impl LabOrderService {
    pub fn new(db: Arc<DbPool>) -> Self {
        Self { db }
    }

    fn validate_lines(lines: &[LabOrderLineInput]) -> Result<(), ServiceError> {
        if lines.is_empty() {
            return Err(ServiceError::ValidationError(
                "A lab order must contain at least one line".to_string(),
            ));
        }
        let mut seen = HashSet::new();
        for line in lines {
            if line.quantity <= 0 {
                return Err(ServiceError::ValidationError(format!(
                    "Quantity for supply id {} must be greater than zero",
                    line.supply_id
                )));
            }
            if line.unit_price <= Decimal::ZERO {
                return Err(ServiceError::ValidationError(format!(
                    "Unit price for supply id {} must be greater than zero",
                    line.supply_id
                )));
            }
            if !seen.insert(line.supply_id) {
                return Err(ServiceError::ValidationError(format!(
                    "Supply id {} appears in more than one line",
                    line.supply_id
                )));
            }
        }
        Ok(())
    }

    /// Persists the header and its lines atomically. No stock moves here.
    #[instrument(skip(self, input))]
    pub async fn create(
        &self,
        tenant: &TenantId,
        input: CreateLabOrder,
    ) -> Result<LabOrderCreated, ServiceError> {
        Self::validate_lines(&input.lines)?;

        let status = match input.status.as_deref() {
            Some(raw) => validate_status(raw)?,
            None => LabOrderStatus::Sent,
        };

        let tenant = tenant.as_str().to_string();
        let created = self
            .db
            .transaction::<_, LabOrderCreated, ServiceError>(move |txn| {
                Box::pin(async move {
                    Prescriptions::find()
                        .filter(prescriptions::Column::Id.eq(input.prescription_id))
                        .filter(prescriptions::Column::TenantId.eq(tenant.as_str()))
                        .one(txn)
                        .await?
                        .ok_or_else(|| {
                            ServiceError::ValidationError(
                                "The prescription does not exist in this tenant".to_string(),
                            )
                        })?;

                    Suppliers::find()
                        .filter(suppliers::Column::Id.eq(input.supplier_id))
                        .filter(suppliers::Column::TenantId.eq(tenant.as_str()))
                        .filter(suppliers::Column::Active.eq(true))
                        .one(txn)
                        .await?
                        .ok_or_else(|| {
                            ServiceError::ValidationError(
                                "Supplier not found, inactive or outside this tenant".to_string(),
                            )
                        })?;

                    for line in &input.lines {
                        Supplies::find()
                            .filter(supplies::Column::Id.eq(line.supply_id))
                            .filter(supplies::Column::TenantId.eq(tenant.as_str()))
                            .filter(supplies::Column::Active.eq(true))
                            .one(txn)
                            .await?
                            .ok_or_else(|| {
                                ServiceError::ValidationError(format!(
                                    "Supply id {} does not exist, is inactive or is outside this tenant",
                                    line.supply_id
                                ))
                            })?;
                    }

                    let header = lab_orders::ActiveModel {
                        tenant_id: Set(tenant.clone()),
                        prescription_id: Set(input.prescription_id),
                        supplier_id: Set(input.supplier_id),
                        sent_on: Set(input.sent_on),
                        expected_on: Set(input.expected_on),
                        received_on: Set(input.received_on),
                        status: Set(Some(status.to_string())),
                        lab_order_number: Set(input.lab_order_number.clone()),
                        notes: Set(input.notes.clone()),
                        ..Default::default()
                    }
                    .insert(txn)
                    .await
                    .map_err(|e| {
                        ServiceError::from_db_err(e, "lab order number within this tenant")
                    })?;

                    for line in &input.lines {
                        lab_order_lines::ActiveModel {
                            tenant_id: Set(tenant.clone()),
                            lab_order_id: Set(header.id),
                            supply_id: Set(line.supply_id),
                            quantity: Set(line.quantity),
                            unit_price: Set(line.unit_price),
                            notes: Set(line.notes.clone()),
                            ..Default::default()
                        }
                        .insert(txn)
                        .await?;
                    }

                    Ok(LabOrderCreated {
                        id: header.id,
                        prescription_id: input.prescription_id,
                        supplier_id: input.supplier_id,
                        status: status.to_string(),
                        line_count: input.lines.len(),
                    })
                })
            })
            .await
            .map_err(unwrap_txn_err)?;

        info!(
            lab_order_id = created.id,
            lines = created.line_count,
            "Lab order created"
        );
        Ok(created)
    }

    #[instrument(skip(self))]
    pub async fn get(&self, tenant: &TenantId, id: i64) -> Result<lab_orders::Model, ServiceError> {
        LabOrders::find()
            .filter(lab_orders::Column::Id.eq(id))
            .filter(lab_orders::Column::TenantId.eq(tenant.as_str()))
            .one(self.db.as_ref())
            .await?
            .ok_or_else(|| ServiceError::NotFound("Lab order not found".to_string()))
    }

    #[instrument(skip(self))]
    pub async fn get_with_lines(
        &self,
        tenant: &TenantId,
        id: i64,
    ) -> Result<LabOrderDetail, ServiceError> {
        let order = self.get(tenant, id).await?;

        let supplier = Suppliers::find()
            .filter(suppliers::Column::Id.eq(order.supplier_id))
            .filter(suppliers::Column::TenantId.eq(tenant.as_str()))
            .one(self.db.as_ref())
            .await?;

        let prescription = Prescriptions::find()
            .filter(prescriptions::Column::Id.eq(order.prescription_id))
            .filter(prescriptions::Column::TenantId.eq(tenant.as_str()))
            .one(self.db.as_ref())
            .await?;

        let lines = LabOrderLines::find()
            .filter(lab_order_lines::Column::LabOrderId.eq(order.id))
            .filter(lab_order_lines::Column::TenantId.eq(tenant.as_str()))
            .all(self.db.as_ref())
            .await?;

        let supply_ids: Vec<i64> = lines.iter().map(|line| line.supply_id).collect();
        let descriptions: HashMap<i64, String> = Supplies::find()
            .filter(supplies::Column::Id.is_in(supply_ids))
            .filter(supplies::Column::TenantId.eq(tenant.as_str()))
            .all(self.db.as_ref())
            .await?
            .into_iter()
            .map(|supply| (supply.id, supply.description))
            .collect();

        let lines = lines
            .into_iter()
            .map(|line| {
                let supply_description = descriptions.get(&line.supply_id).cloned();
                LabOrderLineDetail {
                    line,
                    supply_description,
                }
            })
            .collect();

        Ok(LabOrderDetail {
            order,
            supplier,
            prescription,
            lines,
        })
    }

    /// All orders of the tenant, newest first, with their lines.
    #[instrument(skip(self))]
    pub async fn list(
        &self,
        tenant: &TenantId,
    ) -> Result<Vec<(lab_orders::Model, Vec<lab_order_lines::Model>)>, ServiceError> {
        Ok(LabOrders::find()
            .filter(lab_orders::Column::TenantId.eq(tenant.as_str()))
            .order_by_desc(lab_orders::Column::Id)
            .find_with_related(LabOrderLines)
            .all(self.db.as_ref())
            .await?)
    }

    #[instrument(skip(self, params))]
    pub async fn search(
        &self,
        tenant: &TenantId,
        params: LabOrderSearch,
    ) -> Result<(Vec<lab_orders::Model>, u64), ServiceError> {
        let mut query = LabOrders::find().filter(lab_orders::Column::TenantId.eq(tenant.as_str()));

        if let Some(supplier_id) = params.supplier_id {
            Suppliers::find()
                .filter(suppliers::Column::Id.eq(supplier_id))
                .filter(suppliers::Column::TenantId.eq(tenant.as_str()))
                .one(self.db.as_ref())
                .await?
                .ok_or_else(|| {
                    ServiceError::ValidationError(
                        "The referenced supplier does not exist in this tenant".to_string(),
                    )
                })?;
            query = query.filter(lab_orders::Column::SupplierId.eq(supplier_id));
        }
        if let Some(prescription_id) = params.prescription_id {
            Prescriptions::find()
                .filter(prescriptions::Column::Id.eq(prescription_id))
                .filter(prescriptions::Column::TenantId.eq(tenant.as_str()))
                .one(self.db.as_ref())
                .await?
                .ok_or_else(|| {
                    ServiceError::ValidationError(
                        "The prescription does not exist in this tenant".to_string(),
                    )
                })?;
            query = query.filter(lab_orders::Column::PrescriptionId.eq(prescription_id));
        }
        if let Some(status) = params
            .status
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
        {
            query = query.filter(contains_ci(lab_orders::Column::Status, status));
        }
        if let Some(from) = params.sent_from {
            query = query.filter(lab_orders::Column::SentOn.gte(from));
        }
        if let Some(to) = params.sent_to {
            query = query.filter(lab_orders::Column::SentOn.lte(to));
        }
        if let Some(q) = params.q.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            query = query.filter(
                Condition::any()
                    .add(contains_ci(lab_orders::Column::Status, q))
                    .add(contains_ci(lab_orders::Column::LabOrderNumber, q))
                    .add(contains_ci(lab_orders::Column::Notes, q)),
            );
        }

        let order = sort_order(&params.order_dir);
        let sort_column = match params.order_by.as_str() {
            "id" => lab_orders::Column::Id,
            "sent_on" => lab_orders::Column::SentOn,
            "expected_on" => lab_orders::Column::ExpectedOn,
            "received_on" => lab_orders::Column::ReceivedOn,
            "status" => lab_orders::Column::Status,
            "lab_order_number" => lab_orders::Column::LabOrderNumber,
            "supplier_id" => lab_orders::Column::SupplierId,
            "prescription_id" => lab_orders::Column::PrescriptionId,
            other => {
                return Err(ServiceError::ValidationError(format!(
                    "Invalid order_by '{}'. Allowed: id, sent_on, expected_on, received_on, status, lab_order_number, supplier_id, prescription_id",
                    other
                )))
            }
        };

        let total = query.clone().count(self.db.as_ref()).await?;
        let items = query
            .order_by(sort_column, order)
            .order_by_desc(lab_orders::Column::Id)
            .offset(params.offset)
            .limit(params.limit)
            .all(self.db.as_ref())
            .await?;

        Ok((items, total))
    }

    /// Dedicated status transition with the RECEIVED terminal guard.
    #[instrument(skip(self))]
    pub async fn update_status(
        &self,
        tenant: &TenantId,
        id: i64,
        new_status: &str,
    ) -> Result<lab_orders::Model, ServiceError> {
        let order = self.get(tenant, id).await?;
        let new_status = validate_status(new_status)?;

        if order.is_received() && new_status != LabOrderStatus::Received {
            return Err(ServiceError::Conflict(
                "Cannot change the status of an already received lab order".to_string(),
            ));
        }

        let mut model: lab_orders::ActiveModel = order.into();
        model.status = Set(Some(new_status.to_string()));

        let updated = model.update(self.db.as_ref()).await?;
        info!(lab_order_id = id, status = %new_status, "Lab order status updated");
        Ok(updated)
    }

    /// Marks the order received exactly once and, unless told otherwise,
    /// deducts stock for every line in the same transaction. The supply of
    /// each line is re-validated against the tenant; an insufficient balance
    /// anywhere rejects the whole receipt.
    #[instrument(skip(self, input))]
    pub async fn receive(
        &self,
        tenant: &TenantId,
        id: i64,
        input: ReceiveLabOrder,
    ) -> Result<LabOrderReceipt, ServiceError> {
        let status = match input.status.as_deref() {
            Some(raw) => validate_status(raw)?,
            None => LabOrderStatus::Received,
        };

        let tenant = tenant.as_str().to_string();
        let receipt = self
            .db
            .transaction::<_, LabOrderReceipt, ServiceError>(move |txn| {
                Box::pin(async move {
                    let order = LabOrders::find()
                        .filter(lab_orders::Column::Id.eq(id))
                        .filter(lab_orders::Column::TenantId.eq(tenant.as_str()))
                        .one(txn)
                        .await?
                        .ok_or_else(|| {
                            ServiceError::NotFound("Lab order not found".to_string())
                        })?;

                    if order.received_on.is_some() {
                        return Err(ServiceError::Conflict(
                            "Lab order has already been received".to_string(),
                        ));
                    }

                    let received_on = input.received_on.unwrap_or_else(|| Utc::now().date_naive());

                    if input.deduct_stock {
                        let lines = LabOrderLines::find()
                            .filter(lab_order_lines::Column::LabOrderId.eq(order.id))
                            .filter(lab_order_lines::Column::TenantId.eq(tenant.as_str()))
                            .all(txn)
                            .await?;

                        // Check every line before deducting anything.
                        let mut deductions = Vec::with_capacity(lines.len());
                        for line in &lines {
                            let supply = Supplies::find()
                                .filter(supplies::Column::Id.eq(line.supply_id))
                                .filter(supplies::Column::TenantId.eq(tenant.as_str()))
                                .one(txn)
                                .await?
                                .ok_or_else(|| {
                                    ServiceError::ValidationError(format!(
                                        "Supply id {} does not belong to this tenant",
                                        line.supply_id
                                    ))
                                })?;

                            let current = supply.current_stock.unwrap_or(0);
                            if current < line.quantity {
                                return Err(ServiceError::InsufficientStock(format!(
                                    "supply id={} ({}): stock={}, required={}",
                                    supply.id, supply.description, current, line.quantity
                                )));
                            }
                            deductions.push((supply, current - line.quantity));
                        }

                        for (supply, new_stock) in deductions {
                            let mut supply_model: supplies::ActiveModel = supply.into();
                            supply_model.current_stock = Set(Some(new_stock));
                            supply_model.update(txn).await?;
                        }
                    }

                    let mut model: lab_orders::ActiveModel = order.into();
                    model.received_on = Set(Some(received_on));
                    model.status = Set(Some(status.to_string()));
                    if let Some(lab_order_number) = input.lab_order_number {
                        model.lab_order_number = Set(Some(lab_order_number));
                    }
                    if let Some(notes) = input.notes {
                        model.notes = Set(Some(notes));
                    }
                    model.update(txn).await?;

                    Ok(LabOrderReceipt {
                        id,
                        received_on,
                        status: status.to_string(),
                        stock_deducted: input.deduct_stock,
                    })
                })
            })
            .await
            .map_err(unwrap_txn_err)?;

        info!(
            lab_order_id = receipt.id,
            stock_deducted = receipt.stock_deducted,
            "Lab order received"
        );
        Ok(receipt)
    }

    #[instrument(skip(self, patch))]
    pub async fn patch(
        &self,
        tenant: &TenantId,
        id: i64,
        patch: LabOrderPatch,
    ) -> Result<lab_orders::Model, ServiceError> {
        if patch.is_empty() {
            return Err(ServiceError::ValidationError(
                "No fields to update".to_string(),
            ));
        }

        let order = self.get(tenant, id).await?;

        let status = match patch.status.as_deref() {
            Some(raw) => {
                let status = validate_status(raw)?;
                if order.is_received() && status != LabOrderStatus::Received {
                    return Err(ServiceError::Conflict(
                        "Cannot change the status of an already received lab order".to_string(),
                    ));
                }
                Some(status)
            }
            None => None,
        };

        let mut model: lab_orders::ActiveModel = order.into();
        if let Some(status) = status {
            model.status = Set(Some(status.to_string()));
        }
        if let Some(lab_order_number) = patch.lab_order_number {
            model.lab_order_number = Set(Some(lab_order_number));
        }
        if let Some(expected_on) = patch.expected_on {
            model.expected_on = Set(Some(expected_on));
        }
        if let Some(notes) = patch.notes {
            model.notes = Set(Some(notes));
        }

        Ok(model.update(self.db.as_ref()).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn line(supply_id: i64, quantity: i32) -> LabOrderLineInput {
        LabOrderLineInput {
            supply_id,
            quantity,
            unit_price: dec!(10),
            notes: None,
        }
    }

    #[test]
    fn rejects_empty_line_list() {
        assert!(LabOrderService::validate_lines(&[]).is_err());
    }

    #[test]
    fn rejects_duplicate_supply_lines() {
        assert!(LabOrderService::validate_lines(&[line(3, 1), line(3, 2)]).is_err());
        assert!(LabOrderService::validate_lines(&[line(3, 1), line(4, 2)]).is_ok());
    }

    #[test]
    fn invalid_status_is_rejected_with_allowed_list() {
        let err = validate_status("SHIPPED").unwrap_err();
        match err {
            ServiceError::InvalidStatus(msg) => {
                assert!(msg.contains("SHIPPED"));
                assert!(msg.contains("RECEIVED"));
            }
            other => panic!("expected InvalidStatus, got {other:?}"),
        }
    }

    #[test]
    fn status_input_is_normalized_before_validation() {
        assert_eq!(
            validate_status("  received ").unwrap(),
            LabOrderStatus::Received
        );
    }
}
