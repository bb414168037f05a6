mod arrear;
mod receipt;

pub use arrear::{Arrear, ArrearFilter, ArrearStatus, LedgerSummary, StatusTotal};
pub use receipt::Receipt;
