// Model modules
pub mod bundles;
pub mod common;
pub mod payments;
pub mod withdrawals;
