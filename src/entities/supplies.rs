use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "supplies")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    #[serde(skip_serializing)]
    pub tenant_id: String,
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
    pub legacy_id: Option<String>,
}

impl Model {
    /// A supply runs low only when both thresholds are tracked.
    pub fn is_low_stock(&self) -> bool {
        match (self.min_stock, self.current_stock) {
            (Some(min), Some(current)) => current <= min,
            _ => false,
        }
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::suppliers::Entity",
        from = "Column::SupplierId",
        to = "super::suppliers::Column::Id"
    )]
    Supplier,
    #[sea_orm(has_many = "super::purchase_lines::Entity")]
    PurchaseLines,
    #[sea_orm(has_many = "super::lab_order_lines::Entity")]
    LabOrderLines,
}

impl Related<super::suppliers::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Supplier.def()
    }
}

impl Related<super::purchase_lines::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::PurchaseLines.def()
    }
}

impl Related<super::lab_order_lines::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::LabOrderLines.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

#[cfg(test)]
mod tests {
    use super::*;

    fn supply(min_stock: Option<i32>, current_stock: Option<i32>) -> Model {
        Model {
            id: 1,
            tenant_id: "t".into(),
            description: "lens blank".into(),
            kind: None,
            supplier_id: None,
            supplier_code: None,
            internal_code: None,
            cost_price: None,
            suggested_price: None,
            min_stock,
            current_stock,
            active: true,
            legacy_id: None,
        }
    }

    #[test]
    fn low_stock_requires_both_thresholds() {
        assert!(!supply(None, Some(0)).is_low_stock());
        assert!(!supply(Some(5), None).is_low_stock());
        assert!(!supply(None, None).is_low_stock());
    }

    #[test]
    fn low_stock_at_or_below_minimum() {
        assert!(supply(Some(5), Some(5)).is_low_stock());
        assert!(supply(Some(5), Some(0)).is_low_stock());
        assert!(!supply(Some(5), Some(6)).is_low_stock());
    }
}
