pub mod catalog_sync;
pub mod report_totals;
