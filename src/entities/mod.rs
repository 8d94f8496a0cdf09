pub mod clients;
pub mod lab_order_lines;
pub mod lab_orders;
pub mod prescriptions;
pub mod purchase_lines;
pub mod purchases;
pub mod suppliers;
pub mod supplies;
