//! Labelers: add boolean indicator columns to a loaded table.
//!
//! ```text
//!   Source ──► loader ──► Table ──┬──► duplicates ──► Table + `duplicate`
//!                                 └──► keywords   ──► Table + one column per keyword
//! ```
//!
//! Both labelers validate every named column up front and compute their
//! indicators from the input table before writing anything.

use serde::{Deserialize, Serialize};

use crate::data::loader::LoadOptions;
use crate::data::model::Table;
use crate::error::{LabelError, Result};

pub mod duplicates;
pub mod keywords;

/// What to do when an indicator column is named like an existing column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CollisionPolicy {
    /// Replace the existing column in place, keeping its position.
    #[default]
    Overwrite,
    /// Fail with [`LabelError::ColumnExists`].
    Reject,
}

/// Settings shared by both labelers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LabelOptions {
    pub load: LoadOptions,
    pub on_collision: CollisionPolicy,
    /// Name of the column written by the duplicate labeler.
    pub duplicate_column: String,
}

impl Default for LabelOptions {
    fn default() -> Self {
        Self {
            load: LoadOptions::default(),
            on_collision: CollisionPolicy::Overwrite,
            duplicate_column: "duplicate".to_string(),
        }
    }
}

/// Fail on the first name that is not a column of `table`.
pub(crate) fn check_columns<S: AsRef<str>>(table: &Table, names: &[S]) -> Result<()> {
    for name in names {
        table.column(name.as_ref())?;
    }
    Ok(())
}

pub(crate) fn check_collision(table: &Table, name: &str, policy: CollisionPolicy) -> Result<()> {
    if policy == CollisionPolicy::Reject && table.has_column(name) {
        return Err(LabelError::ColumnExists(name.to_string()));
    }
    Ok(())
}
