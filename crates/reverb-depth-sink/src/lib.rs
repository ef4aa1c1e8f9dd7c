//! Report output for the reverb-depth batch: a CSV file mirroring the QA
//! team's spreadsheet format plus a console table.

pub mod report;

pub use report::{ReportError, ResultSink, render_console_table};
