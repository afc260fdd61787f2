//! Data-quality triage for tabular files.
//!
//! Two labelers each return a copy of the input table with boolean
//! indicator columns appended:
//!
//! * [`duplicates`] adds `duplicate`, true where a target column repeats a
//!   value from an earlier row (trimmed, case-insensitive).
//! * [`keywords`] adds one column per keyword, true where any search column
//!   contains that keyword (literal, case-insensitive).
//!
//! Inputs are a [`Table`] the caller holds or a path to a `.csv`, `.xls`,
//! `.xlsx`, `.ods`, `.json` or `.parquet` file.
//!
//! ```no_run
//! let table = rusty_labels::duplicates("contacts.csv", &["email", "phone"])?;
//! let table = rusty_labels::keywords(table, &["notes"], &["refund", "urgent"])?;
//! println!("{table}");
//! # Ok::<(), rusty_labels::LabelError>(())
//! ```

pub mod data;
pub mod error;
pub mod label;

pub use data::loader::{load_data, load_with, LoadOptions, Source};
pub use data::model::{Column, Table, Value};
pub use error::{LabelError, Result};
pub use label::duplicates::label_duplicates;
pub use label::keywords::label_keywords;
pub use label::{CollisionPolicy, LabelOptions};

/// Flag rows repeating an earlier value in any of `target_columns`.
pub fn duplicates<'a, S: AsRef<str>>(
    data: impl Into<Source<'a>>,
    target_columns: &[S],
) -> Result<Table> {
    label_duplicates(data, target_columns, &LabelOptions::default())
}

/// Add one indicator column per keyword found in any of `search_columns`.
pub fn keywords<'a, S: AsRef<str>, K: AsRef<str>>(
    data: impl Into<Source<'a>>,
    search_columns: &[S],
    keywords: &[K],
) -> Result<Table> {
    label_keywords(data, search_columns, keywords, &LabelOptions::default())
}
