pub mod report_transport;
pub mod token_source;
pub mod transaction_store;
