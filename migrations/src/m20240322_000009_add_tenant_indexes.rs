use sea_orm_migration::prelude::*;

use super::m20240301_000001_create_clients_table::Clients;
use super::m20240301_000004_create_prescriptions_table::Prescriptions;
use super::m20240301_000005_create_purchases_table::Purchases;
use super::m20240301_000007_create_lab_orders_table::LabOrders;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Tenant-scoped listings always filter by tenant_id and usually
        // order by a date; cover the hot paths.
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("ix_clients_tenant")
                    .table(Clients::Table)
                    .col(Clients::TenantId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("ix_prescriptions_tenant_client")
                    .table(Prescriptions::Table)
                    .col(Prescriptions::TenantId)
                    .col(Prescriptions::ClientId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("ix_purchases_tenant_date")
                    .table(Purchases::Table)
                    .col(Purchases::TenantId)
                    .col(Purchases::PurchaseDate)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("ix_lab_orders_tenant_sent")
                    .table(LabOrders::Table)
                    .col(LabOrders::TenantId)
                    .col(LabOrders::SentOn)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(Index::drop().name("ix_clients_tenant").to_owned())
            .await?;
        manager
            .drop_index(
                Index::drop()
                    .name("ix_prescriptions_tenant_client")
                    .to_owned(),
            )
            .await?;
        manager
            .drop_index(Index::drop().name("ix_purchases_tenant_date").to_owned())
            .await?;
        manager
            .drop_index(Index::drop().name("ix_lab_orders_tenant_sent").to_owned())
            .await
    }
}
