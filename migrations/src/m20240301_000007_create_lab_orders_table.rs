use sea_orm_migration::prelude::*;

use super::m20240301_000002_create_suppliers_table::Suppliers;
use super::m20240301_000004_create_prescriptions_table::Prescriptions;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(LabOrders::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(LabOrders::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(LabOrders::TenantId)
                            .string_len(36)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(LabOrders::PrescriptionId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(LabOrders::SupplierId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(LabOrders::SentOn).date().null())
                    .col(ColumnDef::new(LabOrders::ExpectedOn).date().null())
                    .col(ColumnDef::new(LabOrders::ReceivedOn).date().null())
                    .col(ColumnDef::new(LabOrders::Status).text().null())
                    .col(ColumnDef::new(LabOrders::LabOrderNumber).text().null())
                    .col(ColumnDef::new(LabOrders::Notes).text().null())
                    .col(ColumnDef::new(LabOrders::LegacyId).text().null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_lab_orders_prescription")
                            .from(LabOrders::Table, LabOrders::PrescriptionId)
                            .to(Prescriptions::Table, Prescriptions::Id),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_lab_orders_supplier")
                            .from(LabOrders::Table, LabOrders::SupplierId)
                            .to(Suppliers::Table, Suppliers::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("uq_lab_orders_tenant_number")
                    .table(LabOrders::Table)
                    .col(LabOrders::TenantId)
                    .col(LabOrders::LabOrderNumber)
                    .unique()
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(LabOrders::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum LabOrders {
    Table,
    Id,
    TenantId,
    PrescriptionId,
    SupplierId,
    SentOn,
    ExpectedOn,
    ReceivedOn,
    Status,
    LabOrderNumber,
    Notes,
    LegacyId,
}
