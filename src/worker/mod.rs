pub mod handlers;
pub mod processor;
pub mod store;
