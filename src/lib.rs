pub mod alerts;
pub mod fetch;
pub mod instruments;
pub mod notify;
pub mod output;
pub mod report;
pub mod sheet;
pub mod tsv;
