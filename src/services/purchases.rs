use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Set, TransactionTrait,
};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::{info, instrument};

use super::{sort_order, unwrap_txn_err};
use crate::{
    db::{contains_ci, DbPool},
    entities::{
        purchase_lines::{self, Entity as PurchaseLines},
        purchases::{self, Entity as Purchases},
        suppliers::{self, Entity as Suppliers},
        supplies::{self, Entity as Supplies},
    },
    errors::ServiceError,
    tenant::TenantId,
};

#[derive(Debug, Clone)]
pub struct PurchaseLineInput {
    pub supply_id: i64,
    pub quantity: i32,
    pub unit_price: Decimal,
}

#[derive(Debug, Clone)]
pub struct CreatePurchase {
    pub supplier_id: i64,
    pub purchase_date: NaiveDate,
    pub voucher_kind: Option<String>,
    pub voucher_number: Option<String>,
    pub notes: Option<String>,
    pub lines: Vec<PurchaseLineInput>,
}

#[derive(Debug, Clone)]
pub struct PurchaseCreated {
    pub id: i64,
    pub total_amount: Decimal,
    pub line_count: usize,
}

/// Allow-listed header merge; line edits are not supported post-creation.
#[derive(Debug, Clone, Default)]
pub struct PurchaseHeaderPatch {
    pub purchase_date: Option<NaiveDate>,
    pub voucher_kind: Option<String>,
    pub voucher_number: Option<String>,
    pub notes: Option<String>,
}

impl PurchaseHeaderPatch {
    fn is_empty(&self) -> bool {
        self.purchase_date.is_none()
            && self.voucher_kind.is_none()
            && self.voucher_number.is_none()
            && self.notes.is_none()
    }
}

#[derive(Debug, Clone, Default)]
pub struct PurchaseSearch {
    pub q: Option<String>,
    pub supplier_id: Option<i64>,
    pub voided: Option<bool>,
    pub date_from: Option<NaiveDate>,
    pub date_to: Option<NaiveDate>,
    pub order_by: String,
    pub order_dir: String,
    pub limit: u64,
    pub offset: u64,
}

#[derive(Debug, Clone)]
pub struct PurchaseLineDetail {
    pub line: purchase_lines::Model,
    pub supply_description: Option<String>,
}

#[derive(Debug, Clone)]
pub struct PurchaseDetail {
    pub purchase: purchases::Model,
    pub lines: Vec<PurchaseLineDetail>,
}

/// The authoritative writer of stock increases and reversals. Creation and
/// void both run as one transaction so no partial stock change is ever
/// observable.
#[derive(Clone)]
pub struct PurchaseService {
    db: Arc<DbPool>,
}

impl PurchaseService {
    pub fn new(db: Arc<DbPool>) -> Self {
        Self { db }
    }

    fn validate_lines(lines: &[PurchaseLineInput]) -> Result<(), ServiceError> {
        if lines.is_empty() {
            return Err(ServiceError::ValidationError(
                "A purchase must contain at least one line".to_string(),
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

    /// Creates the header and its lines, increments each supply's stock by
    /// the purchased quantity and seeds unset cost prices, all atomically.
    /// The total is recomputed server-side, never trusted from the caller.
    #[instrument(skip(self, input))]
    pub async fn create(
        &self,
        tenant: &TenantId,
        input: CreatePurchase,
    ) -> Result<PurchaseCreated, ServiceError> {
        Self::validate_lines(&input.lines)?;

        let tenant = tenant.as_str().to_string();
        let created = self
            .db
            .transaction::<_, PurchaseCreated, ServiceError>(move |txn| {
                Box::pin(async move {
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

                    // Resolve every supply before touching anything.
                    let mut resolved = Vec::with_capacity(input.lines.len());
                    for line in &input.lines {
                        let supply = Supplies::find()
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
                        resolved.push(supply);
                    }

                    let total_amount: Decimal = input
                        .lines
                        .iter()
                        .map(|line| Decimal::from(line.quantity) * line.unit_price)
                        .sum();

                    let header = purchases::ActiveModel {
                        tenant_id: Set(tenant.clone()),
                        supplier_id: Set(input.supplier_id),
                        purchase_date: Set(input.purchase_date),
                        voucher_kind: Set(input.voucher_kind.clone()),
                        voucher_number: Set(input.voucher_number.clone()),
                        notes: Set(input.notes.clone()),
                        total_amount: Set(total_amount),
                        voided: Set(false),
                        ..Default::default()
                    }
                    .insert(txn)
                    .await?;

                    for (line, supply) in input.lines.iter().zip(resolved) {
                        let subtotal = Decimal::from(line.quantity) * line.unit_price;
                        purchase_lines::ActiveModel {
                            tenant_id: Set(tenant.clone()),
                            purchase_id: Set(header.id),
                            supply_id: Set(line.supply_id),
                            quantity: Set(line.quantity),
                            unit_price: Set(line.unit_price),
                            subtotal: Set(subtotal),
                            ..Default::default()
                        }
                        .insert(txn)
                        .await?;

                        let new_stock = supply.current_stock.unwrap_or(0) + line.quantity;
                        let seed_cost = supply.cost_price.is_none();
                        let mut supply_model: supplies::ActiveModel = supply.into();
                        supply_model.current_stock = Set(Some(new_stock));
                        if seed_cost {
                            supply_model.cost_price = Set(Some(line.unit_price));
                        }
                        supply_model.update(txn).await?;
                    }

                    Ok(PurchaseCreated {
                        id: header.id,
                        total_amount,
                        line_count: input.lines.len(),
                    })
                })
            })
            .await
            .map_err(unwrap_txn_err)?;

        info!(
            purchase_id = created.id,
            total = %created.total_amount,
            lines = created.line_count,
            "Purchase created"
        );
        Ok(created)
    }

    /// Reverses every line's stock effect and marks the header voided.
    /// If any supply would end up negative the whole void is rejected;
    /// a voided purchase can never affect stock again.
    #[instrument(skip(self))]
    pub async fn void(
        &self,
        tenant: &TenantId,
        id: i64,
        reason: Option<String>,
    ) -> Result<purchases::Model, ServiceError> {
        let tenant = tenant.as_str().to_string();
        let voided = self
            .db
            .transaction::<_, purchases::Model, ServiceError>(move |txn| {
                Box::pin(async move {
                    let purchase = Purchases::find()
                        .filter(purchases::Column::Id.eq(id))
                        .filter(purchases::Column::TenantId.eq(tenant.as_str()))
                        .one(txn)
                        .await?
                        .ok_or_else(|| {
                            ServiceError::NotFound("Purchase not found".to_string())
                        })?;

                    if purchase.voided {
                        return Err(ServiceError::Conflict(
                            "Purchase is already voided".to_string(),
                        ));
                    }

                    let lines = PurchaseLines::find()
                        .filter(purchase_lines::Column::PurchaseId.eq(purchase.id))
                        .filter(purchase_lines::Column::TenantId.eq(tenant.as_str()))
                        .all(txn)
                        .await?;

                    if lines.is_empty() {
                        return Err(ServiceError::ValidationError(
                            "The purchase has no lines to void".to_string(),
                        ));
                    }

                    // Check every reversal before applying any of them.
                    let mut reversals = Vec::with_capacity(lines.len());
                    for line in &lines {
                        let supply = Supplies::find()
                            .filter(supplies::Column::Id.eq(line.supply_id))
                            .filter(supplies::Column::TenantId.eq(tenant.as_str()))
                            .one(txn)
                            .await?
                            .ok_or_else(|| {
                                ServiceError::ValidationError(format!(
                                    "Supply id {} no longer exists in this tenant to revert stock",
                                    line.supply_id
                                ))
                            })?;

                        let new_stock = supply.current_stock.unwrap_or(0) - line.quantity;
                        if new_stock < 0 {
                            return Err(ServiceError::Conflict(format!(
                                "Cannot void: supply id {} would end up with negative stock",
                                supply.id
                            )));
                        }
                        reversals.push((supply, new_stock));
                    }

                    for (supply, new_stock) in reversals {
                        let mut supply_model: supplies::ActiveModel = supply.into();
                        supply_model.current_stock = Set(Some(new_stock));
                        supply_model.update(txn).await?;
                    }

                    let mut header: purchases::ActiveModel = purchase.into();
                    header.voided = Set(true);
                    header.void_reason = Set(reason);
                    header.voided_at = Set(Some(Utc::now()));
                    Ok(header.update(txn).await?)
                })
            })
            .await
            .map_err(unwrap_txn_err)?;

        info!(purchase_id = id, "Purchase voided");
        Ok(voided)
    }

    #[instrument(skip(self))]
    pub async fn get(&self, tenant: &TenantId, id: i64) -> Result<purchases::Model, ServiceError> {
        Purchases::find()
            .filter(purchases::Column::Id.eq(id))
            .filter(purchases::Column::TenantId.eq(tenant.as_str()))
            .one(self.db.as_ref())
            .await?
            .ok_or_else(|| ServiceError::NotFound("Purchase not found".to_string()))
    }

    #[instrument(skip(self))]
    pub async fn get_with_lines(
        &self,
        tenant: &TenantId,
        id: i64,
    ) -> Result<PurchaseDetail, ServiceError> {
        let purchase = self.get(tenant, id).await?;

        let lines = PurchaseLines::find()
            .filter(purchase_lines::Column::PurchaseId.eq(purchase.id))
            .filter(purchase_lines::Column::TenantId.eq(tenant.as_str()))
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
                PurchaseLineDetail {
                    line,
                    supply_description,
                }
            })
            .collect();

        Ok(PurchaseDetail { purchase, lines })
    }

    #[instrument(skip(self))]
    pub async fn list(
        &self,
        tenant: &TenantId,
        include_voided: bool,
    ) -> Result<Vec<purchases::Model>, ServiceError> {
        let mut query = Purchases::find().filter(purchases::Column::TenantId.eq(tenant.as_str()));
        if !include_voided {
            query = query.filter(purchases::Column::Voided.eq(false));
        }

        Ok(query
            .order_by_desc(purchases::Column::PurchaseDate)
            .order_by_desc(purchases::Column::Id)
            .all(self.db.as_ref())
            .await?)
    }

    #[instrument(skip(self, params))]
    pub async fn search(
        &self,
        tenant: &TenantId,
        params: PurchaseSearch,
    ) -> Result<(Vec<purchases::Model>, u64), ServiceError> {
        let mut query = Purchases::find().filter(purchases::Column::TenantId.eq(tenant.as_str()));

        if let Some(q) = params.q.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            query = query.filter(
                Condition::any()
                    .add(contains_ci(purchases::Column::VoucherKind, q))
                    .add(contains_ci(purchases::Column::VoucherNumber, q))
                    .add(contains_ci(purchases::Column::Notes, q)),
            );
        }
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
            query = query.filter(purchases::Column::SupplierId.eq(supplier_id));
        }
        if let Some(voided) = params.voided {
            query = query.filter(purchases::Column::Voided.eq(voided));
        }
        if let Some(from) = params.date_from {
            query = query.filter(purchases::Column::PurchaseDate.gte(from));
        }
        if let Some(to) = params.date_to {
            query = query.filter(purchases::Column::PurchaseDate.lte(to));
        }

        let order = sort_order(&params.order_dir);
        let sort_column = match params.order_by.as_str() {
            "purchase_date" => purchases::Column::PurchaseDate,
            "total_amount" => purchases::Column::TotalAmount,
            "id" => purchases::Column::Id,
            other => {
                return Err(ServiceError::ValidationError(format!(
                    "Invalid order_by '{}'. Allowed: purchase_date, total_amount, id",
                    other
                )))
            }
        };

        let total = query.clone().count(self.db.as_ref()).await?;
        let items = query
            .order_by(sort_column, order)
            .order_by_desc(purchases::Column::Id)
            .offset(params.offset)
            .limit(params.limit)
            .all(self.db.as_ref())
            .await?;

        Ok((items, total))
    }

    /// Header fields stay editable only while the purchase is not voided.
    #[instrument(skip(self, patch))]
    pub async fn patch_header(
        &self,
        tenant: &TenantId,
        id: i64,
        patch: PurchaseHeaderPatch,
    ) -> Result<purchases::Model, ServiceError> {
        if patch.is_empty() {
            return Err(ServiceError::ValidationError(
                "No fields to update".to_string(),
            ));
        }

        let purchase = self.get(tenant, id).await?;
        if purchase.voided {
            return Err(ServiceError::Conflict(
                "Cannot modify a voided purchase".to_string(),
            ));
        }

        let mut model: purchases::ActiveModel = purchase.into();
        if let Some(purchase_date) = patch.purchase_date {
            model.purchase_date = Set(purchase_date);
        }
        if let Some(voucher_kind) = patch.voucher_kind {
            model.voucher_kind = Set(Some(voucher_kind));
        }
        if let Some(voucher_number) = patch.voucher_number {
            model.voucher_number = Set(Some(voucher_number));
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

    fn line(supply_id: i64, quantity: i32, unit_price: Decimal) -> PurchaseLineInput {
        PurchaseLineInput {
            supply_id,
            quantity,
            unit_price,
        }
    }

    #[test]
    fn rejects_empty_line_list() {
        assert!(PurchaseService::validate_lines(&[]).is_err());
    }

    #[test]
    fn rejects_non_positive_quantity_and_price() {
        assert!(PurchaseService::validate_lines(&[line(1, 0, dec!(5))]).is_err());
        assert!(PurchaseService::validate_lines(&[line(1, -3, dec!(5))]).is_err());
        assert!(PurchaseService::validate_lines(&[line(1, 2, dec!(0))]).is_err());
    }

    #[test]
    fn rejects_duplicate_supply_lines() {
        let lines = vec![line(7, 1, dec!(2)), line(7, 4, dec!(3))];
        assert!(PurchaseService::validate_lines(&lines).is_err());
    }

    #[test]
    fn accepts_distinct_positive_lines() {
        let lines = vec![line(1, 2, dec!(10)), line(2, 1, dec!(4.5))];
        assert!(PurchaseService::validate_lines(&lines).is_ok());
    }
}
