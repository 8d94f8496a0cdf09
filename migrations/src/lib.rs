pub use sea_orm_migration::prelude::*;

mod m20240301_000001_create_clients_table;
mod m20240301_000002_create_suppliers_table;
mod m20240301_000003_create_supplies_table;
mod m20240301_000004_create_prescriptions_table;
mod m20240301_000005_create_purchases_table;
mod m20240301_000006_create_purchase_lines_table;
mod m20240301_000007_create_lab_orders_table;
mod m20240301_000008_create_lab_order_lines_table;
mod m20240322_000009_add_tenant_indexes;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20240301_000001_create_clients_table::Migration),
            Box::new(m20240301_000002_create_suppliers_table::Migration),
            Box::new(m20240301_000003_create_supplies_table::Migration),
            Box::new(m20240301_000004_create_prescriptions_table::Migration),
            Box::new(m20240301_000005_create_purchases_table::Migration),
            Box::new(m20240301_000006_create_purchase_lines_table::Migration),
            Box::new(m20240301_000007_create_lab_orders_table::Migration),
            Box::new(m20240301_000008_create_lab_order_lines_table::Migration),
            Box::new(m20240322_000009_add_tenant_indexes::Migration),
        ]
    }
}
