use sea_orm_migration::prelude::*;

use super::m20240301_000002_create_suppliers_table::Suppliers;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Purchases::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Purchases::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(Purchases::TenantId)
                            .string_len(36)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Purchases::SupplierId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Purchases::PurchaseDate).date().not_null())
                    .col(ColumnDef::new(Purchases::VoucherKind).text().null())
                    .col(ColumnDef::new(Purchases::VoucherNumber).text().null())
                    .col(ColumnDef::new(Purchases::Notes).text().null())
                    .col(
                        ColumnDef::new(Purchases::TotalAmount)
                            .decimal()
                            .not_null()
                            .default(0.0),
                    )
                    .col(
                        ColumnDef::new(Purchases::Voided)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(ColumnDef::new(Purchases::VoidReason).text().null())
                    .col(
                        ColumnDef::new(Purchases::VoidedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_purchases_supplier")
                            .from(Purchases::Table, Purchases::SupplierId)
                            .to(Suppliers::Table, Suppliers::Id),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Purchases::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum Purchases {
    Table,
    Id,
    TenantId,
    SupplierId,
    PurchaseDate,
    VoucherKind,
    VoucherNumber,
    Notes,
    TotalAmount,
    Voided,
    VoidReason,
    VoidedAt,
}
