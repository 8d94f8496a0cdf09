use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "lab_order_lines")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    #[serde(skip_serializing)]
    pub tenant_id: String,
    pub lab_order_id: i64,
    pub supply_id: i64,
    pub quantity: i32,
    pub unit_price: Decimal,
    pub notes: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::lab_orders::Entity",
        from = "Column::LabOrderId",
        to = "super::lab_orders::Column::Id"
    )]
    LabOrder,
    #[sea_orm(
        belongs_to = "super::supplies::Entity",
        from = "Column::SupplyId",
        to = "super::supplies::Column::Id"
    )]
    Supply,
}

impl Related<super::lab_orders::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::LabOrder.def()
    }
}

impl Related<super::supplies::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Supply.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
