mod fee_item;
mod fee_payment;

pub use fee_item::FeeItem;
pub use fee_payment::{generate_payment_display_id, FeePayment};
