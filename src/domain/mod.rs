pub mod ledger;
pub mod summary;
pub mod transaction;
