pub mod report_assembler;
pub mod revenue_sync;
pub mod substitute_report;
