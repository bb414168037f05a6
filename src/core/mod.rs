pub mod academic_year;
pub mod context;
pub mod error;
pub mod money;

pub use academic_year::AcademicYear;
pub use context::SchoolContext;
pub use error::{AppError, Result};
