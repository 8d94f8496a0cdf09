use sea_orm_migration::prelude::*;

use super::m20240301_000003_create_supplies_table::Supplies;
use super::m20240301_000005_create_purchases_table::Purchases;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(PurchaseLines::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(PurchaseLines::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(PurchaseLines::TenantId)
                            .string_len(36)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(PurchaseLines::PurchaseId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(PurchaseLines::SupplyId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(PurchaseLines::Quantity).integer().not_null())
                    .col(
                        ColumnDef::new(PurchaseLines::UnitPrice)
                            .decimal()
                            .not_null(),
                    )
                    .col(ColumnDef::new(PurchaseLines::Subtotal).decimal().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_purchase_lines_purchase")
                            .from(PurchaseLines::Table, PurchaseLines::PurchaseId)
                            .to(Purchases::Table, Purchases::Id),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_purchase_lines_supply")
                            .from(PurchaseLines::Table, PurchaseLines::SupplyId)
                            .to(Supplies::Table, Supplies::Id),
                    )
                    .to_owned(),
            )
            .await?;

        // One line per supply within a purchase
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("uq_purchase_lines_tenant_purchase_supply")
                    .table(PurchaseLines::Table)
                    .col(PurchaseLines::TenantId)
                    .col(PurchaseLines::PurchaseId)
                    .col(PurchaseLines::SupplyId)
                    .unique()
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(PurchaseLines::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum PurchaseLines {
    Table,
    Id,
    TenantId,
    PurchaseId,
    SupplyId,
    Quantity,
    UnitPrice,
    Subtotal,
}
