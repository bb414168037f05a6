//! Arrears ledger service
//!
//! Carries unpaid school fee balances from one academic year to the next and
//! settles them against payments, per school.

pub mod config;
pub mod core;
pub mod middleware;
pub mod modules;

// Re-export commonly used types
pub use crate::core::{AcademicYear, AppError, Result, SchoolContext};
pub use modules::arrears;
pub use modules::configure;
