mod school;

pub use school::School;
