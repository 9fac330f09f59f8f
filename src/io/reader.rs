//! Streaming CSV reader with iterator interface
//!
//! Yields one `Result<Operation, String>` per CSV row. Delegates format
//! concerns to the csv_format module.
//!
//! ```no_run
//! use cashier_bank::io::OperationReader;
//! use std::path::Path;
//!
//! let reader = OperationReader::new(Path::new("operations.csv")).unwrap();
//! for result in reader {
//!     match result {
//!         Ok(operation) => println!("Submitting {:?}", operation),
//!         Err(e) => eprintln!("Skipping row: {}", e),
//!     }
//! }
//! ```
//!
//! # Error Handling
//!
//! - Fatal errors (file not found) are returned from `new()`
//! - Individual row errors are yielded as `Err` and iteration continues
//! - Line numbers (counting the header as line 1) are included in row errors

use crate::io::csv_format::{convert_csv_record, OperationCsvRecord};
use crate::types::Operation;
use csv::{ReaderBuilder, Trim};
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// CSV reader over operation rows
#[derive(Debug)]
pub struct OperationReader<R = File> {
    reader: csv::Reader<R>,
    line_num: usize,
}

impl OperationReader<File> {
    /// Open a CSV file for streaming iteration
    pub fn new(path: &Path) -> Result<Self, String> {
        let file = File::open(path)
            .map_err(|e| format!("Failed to open file '{}': {}", path.display(), e))?;
        Ok(Self::from_reader(file))
    }
}

impl<R: Read> OperationReader<R> {
    /// Wrap any byte source
    ///
    /// Fields are trimmed and rows may omit trailing optional columns.
    pub fn from_reader(source: R) -> Self {
        let reader = ReaderBuilder::new()
            .trim(Trim::All)
            .flexible(true)
            .buffer_capacity(8 * 1024)
            .from_reader(source);

        Self {
            reader,
            line_num: 1,
        }
    }
}

impl<R: Read> Iterator for OperationReader<R> {
    type Item = Result<Operation, String>;

    fn next(&mut self) -> Option<Self::Item> {
        let mut deserializer = self.reader.deserialize::<OperationCsvRecord>();
        let row = deserializer.next()?;
        self.line_num += 1;

        Some(match row {
            Ok(csv_record) => {
                convert_csv_record(csv_record).map_err(|e| format!("Line {}: {}", self.line_num, e))
            }
            Err(e) => Err(format!("Line {}: CSV parse error: {}", self.line_num, e)),
        })
    }
}
