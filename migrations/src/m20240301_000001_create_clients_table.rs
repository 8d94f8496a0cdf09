use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Clients::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Clients::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(Clients::TenantId)
                            .string_len(36)
                            .not_null(),
                    )
                    .col(ColumnDef::new(Clients::FirstName).text().not_null())
                    .col(ColumnDef::new(Clients::LastName).text().not_null())
                    .col(ColumnDef::new(Clients::NationalId).big_integer().not_null())
                    .col(ColumnDef::new(Clients::BirthDate).date().null())
                    .col(ColumnDef::new(Clients::Phone).string_len(20).null())
                    .col(ColumnDef::new(Clients::Email).text().null())
                    .col(ColumnDef::new(Clients::Address).text().null())
                    .col(ColumnDef::new(Clients::Notes).text().null())
                    .col(ColumnDef::new(Clients::RegisteredOn).date().null())
                    .col(
                        ColumnDef::new(Clients::Active)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(ColumnDef::new(Clients::LegacyId).text().null())
                    .to_owned(),
            )
            .await?;

        // One national id per person within a tenant
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("uq_clients_tenant_national_id")
                    .table(Clients::Table)
                    .col(Clients::TenantId)
                    .col(Clients::NationalId)
                    .unique()
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Clients::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum Clients {
    Table,
    Id,
    TenantId,
    FirstName,
    LastName,
    NationalId,
    BirthDate,
    Phone,
    Email,
    Address,
    Notes,
    RegisteredOn,
    Active,
    LegacyId,
}
