use sea_orm_migration::prelude::*;

use super::m20240301_000003_create_supplies_table::Supplies;
use super::m20240301_000007_create_lab_orders_table::LabOrders;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(LabOrderLines::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(LabOrderLines::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(LabOrderLines::TenantId)
                            .string_len(36)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(LabOrderLines::LabOrderId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(LabOrderLines::SupplyId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(LabOrderLines::Quantity)
                            .integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(LabOrderLines::UnitPrice)
                            .decimal()
                            .not_null(),
                    )
                    .col(ColumnDef::new(LabOrderLines::Notes).text().null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_lab_order_lines_order")
                            .from(LabOrderLines::Table, LabOrderLines::LabOrderId)
                            .to(LabOrders::Table, LabOrders::Id),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_lab_order_lines_supply")
                            .from(LabOrderLines::Table, LabOrderLines::SupplyId)
                            .to(Supplies::Table, Supplies::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("uq_lab_order_lines_tenant_order_supply")
                    .table(LabOrderLines::Table)
                    .col(LabOrderLines::TenantId)
                    .col(LabOrderLines::LabOrderId)
                    .col(LabOrderLines::SupplyId)
                    .unique()
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(LabOrderLines::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum LabOrderLines {
    Table,
    Id,
    TenantId,
    LabOrderId,
    SupplyId,
    Quantity,
    UnitPrice,
    Notes,
}
