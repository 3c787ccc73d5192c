pub mod aggregator;
pub mod classifier;
pub mod column_schema;
pub mod report_parser;
pub mod tabular_parser;
