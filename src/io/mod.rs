//! I/O module
//!
//! Handles CSV operation input and balance output.
//!
//! # Components
//!
//! - `csv_format` - CSV format handling (record conversion, output serialization)
//! - `reader` - Streaming CSV reader with iterator interface

pub mod csv_format;
pub mod reader;

pub use csv_format::{convert_csv_record, write_balances_csv, OperationCsvRecord};
pub use reader::OperationReader;
