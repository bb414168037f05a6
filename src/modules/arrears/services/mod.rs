pub mod arrears_service;
pub mod balance_calculator;
pub mod ledger_writer;
pub mod settlement_calculator;

pub use arrears_service::{ArrearsService, RecalculateArrears, SettleArrear, SettlementOutcome};
pub use balance_calculator::{BalanceCalculator, BalanceReport, StudentBalance};
pub use ledger_writer::{LedgerWriter, RecalculationSummary};
pub use settlement_calculator::{SettlementCalculator, SettlementInput, SettlementPlan};
