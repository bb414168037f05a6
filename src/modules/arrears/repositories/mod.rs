mod arrear_repository;

pub use arrear_repository::ArrearRepository;
