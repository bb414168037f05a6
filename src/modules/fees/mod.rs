// Fee schedule and payment ledger

pub mod models;
pub mod repositories;

pub use models::{FeeItem, FeePayment};
pub use repositories::FeeRepository;
