pub mod models;
pub mod repositories;

pub use models::Student;
pub use repositories::StudentRepository;
