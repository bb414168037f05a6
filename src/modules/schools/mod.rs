pub mod models;
pub mod repositories;

pub use models::School;
pub use repositories::SchoolRepository;
