use chrono::NaiveDate;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Lifecycle of a prescription. Stored as text; parsed leniently
/// (trimmed, uppercased) and validated strictly.
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
pub enum PrescriptionStatus {
    Active,
    InLab,
    Closed,
    Cancelled,
}

impl PrescriptionStatus {
    /// Normalizes free-form input before matching it against the fixed set.
    pub fn parse_normalized(raw: &str) -> Option<Self> {
        raw.trim().to_ascii_uppercase().parse().ok()
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "prescriptions")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    #[serde(skip_serializing)]
    pub tenant_id: String,
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
    pub legacy_id: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::clients::Entity",
        from = "Column::ClientId",
        to = "super::clients::Column::Id"
    )]
    Client,
    #[sea_orm(has_many = "super::lab_orders::Entity")]
    LabOrders,
}

impl Related<super::clients::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Client.def()
    }
}

impl Related<super::lab_orders::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::LabOrders.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_parses_normalized_input() {
        assert_eq!(
            PrescriptionStatus::parse_normalized("  active "),
            Some(PrescriptionStatus::Active)
        );
        assert_eq!(
            PrescriptionStatus::parse_normalized("in_lab"),
            Some(PrescriptionStatus::InLab)
        );
        assert_eq!(PrescriptionStatus::parse_normalized("OPEN"), None);
    }

    #[test]
    fn status_round_trips_through_display() {
        assert_eq!(PrescriptionStatus::InLab.to_string(), "IN_LAB");
        assert_eq!(
            PrescriptionStatus::parse_normalized(&PrescriptionStatus::Closed.to_string()),
            Some(PrescriptionStatus::Closed)
        );
    }
}
