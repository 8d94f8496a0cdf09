pub mod clients;
pub mod lab_orders;
pub mod prescriptions;
pub mod purchases;
pub mod suppliers;
pub mod supplies;

use sea_orm::{Order, TransactionError};

use crate::errors::ServiceError;

/// Unwraps the two-level transaction error into a plain `ServiceError`.
pub(crate) fn unwrap_txn_err(err: TransactionError<ServiceError>) -> ServiceError {
    match err {
        TransactionError::Connection(db_err) => ServiceError::DatabaseError(db_err),
        TransactionError::Transaction(service_err) => service_err,
    }
}

/// "asc" selects ascending order; anything else falls back to descending.
pub(crate) fn sort_order(dir: &str) -> Order {
    if dir.eq_ignore_ascii_case("asc") {
        Order::Asc
    } else {
        Order::Desc
    }
}
