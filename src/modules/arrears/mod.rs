// Arrears ledger: recalculation, settlement and queries

pub mod controllers;
pub mod models;
pub mod repositories;
pub mod services;

pub use models::{Arrear, ArrearStatus, Receipt};
pub use repositories::ArrearRepository;
pub use services::{ArrearsService, BalanceCalculator, LedgerWriter, SettlementCalculator};
