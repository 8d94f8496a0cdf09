use chrono::NaiveDate;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Lifecycle of a lab order. Stored as text; parsed leniently
/// (trimmed, uppercased) and validated strictly. `Received` is terminal:
/// the only transition out of it is the no-op back to itself.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
    strum::VariantNames,
)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum LabOrderStatus {
    Pending,
    Sent,
    InProcess,
    Received,
    Cancelled,
}

impl LabOrderStatus {
    /// Normalizes free-form input before matching it against the fixed set.
    pub fn parse_normalized(raw: &str) -> Option<Self> {
        raw.trim().to_ascii_uppercase().parse().ok()
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "lab_orders")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    #[serde(skip_serializing)]
    pub tenant_id: String,
    pub prescription_id: i64,
    pub supplier_id: i64,
    pub sent_on: Option<NaiveDate>,
    pub expected_on: Option<NaiveDate>,
    pub received_on: Option<NaiveDate>,
    pub status: Option<String>,
    pub lab_order_number: Option<String>,
    pub notes: Option<String>,
    pub legacy_id: Option<String>,
}

impl Model {
    pub fn is_received(&self) -> bool {
        self.status.as_deref() == Some("RECEIVED")
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::prescriptions::Entity",
        from = "Column::PrescriptionId",
        to = "super::prescriptions::Column::Id"
    )]
    Prescription,
    #[sea_orm(
        belongs_to = "super::suppliers::Entity",
        from = "Column::SupplierId",
        to = "super::suppliers::Column::Id"
    )]
    Supplier,
    #[sea_orm(has_many = "super::lab_order_lines::Entity")]
    LabOrderLines,
}

impl Related<super::prescriptions::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Prescription.def()
    }
}

impl Related<super::suppliers::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Supplier.def()
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

    #[test]
    fn status_parses_normalized_input() {
        assert_eq!(
            LabOrderStatus::parse_normalized(" sent "),
            Some(LabOrderStatus::Sent)
        );
        assert_eq!(
            LabOrderStatus::parse_normalized("in_process"),
            Some(LabOrderStatus::InProcess)
        );
        assert_eq!(LabOrderStatus::parse_normalized("SHIPPED"), None);
        assert_eq!(LabOrderStatus::parse_normalized(""), None);
    }

    #[test]
    fn status_displays_wire_format() {
        assert_eq!(LabOrderStatus::InProcess.to_string(), "IN_PROCESS");
        assert_eq!(LabOrderStatus::Received.to_string(), "RECEIVED");
    }
}
