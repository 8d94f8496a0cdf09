use sea_orm_migration::prelude::*;

use super::m20240301_000001_create_clients_table::Clients;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Prescriptions::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Prescriptions::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(Prescriptions::TenantId)
                            .string_len(36)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Prescriptions::ClientId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Prescriptions::IssuedOn).date().not_null())
                    .col(ColumnDef::new(Prescriptions::Professional).text().null())
                    .col(ColumnDef::new(Prescriptions::LensType).text().null())
                    .col(ColumnDef::new(Prescriptions::OdSphere).double().null())
                    .col(ColumnDef::new(Prescriptions::OdCylinder).double().null())
                    .col(ColumnDef::new(Prescriptions::OdAxis).integer().null())
                    .col(ColumnDef::new(Prescriptions::OsSphere).double().null())
                    .col(ColumnDef::new(Prescriptions::OsCylinder).double().null())
                    .col(ColumnDef::new(Prescriptions::OsAxis).integer().null())
                    .col(ColumnDef::new(Prescriptions::Addition).double().null())
                    .col(
                        ColumnDef::new(Prescriptions::PupillaryDistance)
                            .double()
                            .null(),
                    )
                    .col(ColumnDef::new(Prescriptions::Notes).text().null())
                    .col(ColumnDef::new(Prescriptions::Status).text().null())
                    .col(ColumnDef::new(Prescriptions::RecordedOn).date().null())
                    .col(ColumnDef::new(Prescriptions::LegacyId).text().null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_prescriptions_client")
                            .from(Prescriptions::Table, Prescriptions::ClientId)
                            .to(Clients::Table, Clients::Id),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Prescriptions::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum Prescriptions {
    Table,
    Id,
    TenantId,
    ClientId,
    IssuedOn,
    Professional,
    LensType,
    OdSphere,
    OdCylinder,
    OdAxis,
    OsSphere,
    OsCylinder,
    OsAxis,
    Addition,
    PupillaryDistance,
    Notes,
    Status,
    RecordedOn,
    LegacyId,
}
