pub mod clients;
pub mod common;
pub mod health;
pub mod lab_orders;
pub mod prescriptions;
pub mod purchases;
pub mod suppliers;
pub mod supplies;

use std::sync::Arc;

use crate::db::DbPool;
use crate::services::{
    clients::ClientService, lab_orders::LabOrderService, prescriptions::PrescriptionService,
    purchases::PurchaseService, suppliers::SupplierService, supplies::SupplyService,
};

// Re-export AppState so handler modules can import it as crate::handlers::AppState
pub use crate::AppState;

/// Services layer that encapsulates business logic used by HTTP handlers
#[derive(Clone)]
pub struct AppServices {
    pub clients: ClientService,
    pub suppliers: SupplierService,
    pub supplies: SupplyService,
    pub prescriptions: PrescriptionService,
    pub purchases: PurchaseService,
    pub lab_orders: LabOrderService,
}

impl AppServices {
    pub fn new(db: Arc<DbPool>) -> Self {
        Self {
            clients: ClientService::new(db.clone()),
            suppliers: SupplierService::new(db.clone()),
            supplies: SupplyService::new(db.clone()),
            prescriptions: PrescriptionService::new(db.clone()),
            purchases: PurchaseService::new(db.clone()),
            lab_orders: LabOrderService::new(db),
        }
    }
}
