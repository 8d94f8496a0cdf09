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
                    .table(Supplies::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Supplies::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(Supplies::TenantId)
                            .string_len(36)
                            .not_null(),
                    )
                    .col(ColumnDef::new(Supplies::Description).text().not_null())
                    .col(ColumnDef::new(Supplies::Kind).text().null())
                    .col(ColumnDef::new(Supplies::SupplierId).big_integer().null())
                    .col(ColumnDef::new(Supplies::SupplierCode).text().null())
                    .col(ColumnDef::new(Supplies::InternalCode).text().null())
                    .col(ColumnDef::new(Supplies::CostPrice).decimal().null())
                    .col(ColumnDef::new(Supplies::SuggestedPrice).decimal().null())
                    .col(ColumnDef::new(Supplies::MinStock).integer().null())
                    .col(ColumnDef::new(Supplies::CurrentStock).integer().null())
                    .col(
                        ColumnDef::new(Supplies::Active)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(ColumnDef::new(Supplies::LegacyId).text().null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_supplies_supplier")
                            .from(Supplies::Table, Supplies::SupplierId)
                            .to(Suppliers::Table, Suppliers::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("uq_supplies_tenant_internal_code")
                    .table(Supplies::Table)
                    .col(Supplies::TenantId)
                    .col(Supplies::InternalCode)
                    .unique()
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Supplies::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum Supplies {
    Table,
    Id,
    TenantId,
    Description,
    Kind,
    SupplierId,
    SupplierCode,
    InternalCode,
    CostPrice,
    SuggestedPrice,
    MinStock,
    CurrentStock,
    Active,
    LegacyId,
}
