use log::{debug, info};

use super::{check_collision, check_columns, LabelOptions};
use crate::data::loader::{load_with, Source};
use crate::data::model::{Column, Table, Value};
use crate::error::{LabelError, Result};

/// Add one boolean column per keyword, named after the keyword.
///
/// A row is true for a keyword when any search column contains it as a
/// literal, case-insensitive substring. Missing cells never match.
/// Repeating a keyword recomputes the same column.
pub fn label_keywords<'a, S: AsRef<str>, K: AsRef<str>>(
    source: impl Into<Source<'a>>,
    search_columns: &[S],
    keywords: &[K],
    options: &LabelOptions,
) -> Result<Table> {
    let mut table = load_with(source, &options.load)?;
    check_columns(&table, search_columns)?;
    for keyword in keywords {
        check_collision(&table, keyword.as_ref(), options.on_collision)?;
    }

    let haystacks = search_columns
        .iter()
        .map(|name| lowered_text(table.column(name.as_ref())?))
        .collect::<Result<Vec<_>>>()?;

    let indicators: Vec<Column> = keywords
        .iter()
        .map(|keyword| {
            let keyword = keyword.as_ref();
            let flags = keyword_flags(&haystacks, table.height(), keyword);
            debug!(
                "keyword {keyword:?}: {} matching rows",
                flags.iter().filter(|f| **f).count()
            );
            Column::new(keyword, flags)
        })
        .collect();

    info!(
        "searched {} columns for {} keywords",
        search_columns.len(),
        keywords.len()
    );
    for column in indicators {
        table.set_column(column)?;
    }
    Ok(table)
}

/// Lowercased text of a searchable column, `None` for cells that can't match.
///
/// A column with values present but none of them text cannot be searched.
fn lowered_text(column: &Column) -> Result<Vec<Option<String>>> {
    let has_values = column.values.iter().any(|v| !v.is_missing());
    let has_text = column.values.iter().any(|v| matches!(v, Value::Text(_)));
    if has_values && !has_text {
        return Err(LabelError::UnsupportedColumnType {
            column: column.name.clone(),
        });
    }
    Ok(column
        .values
        .iter()
        .map(|v| v.as_text().map(str::to_lowercase))
        .collect())
}

/// OR across columns: a row matches when any haystack cell contains the
/// keyword.
fn keyword_flags(haystacks: &[Vec<Option<String>>], height: usize, keyword: &str) -> Vec<bool> {
    let needle = keyword.to_lowercase();
    (0..height)
        .map(|row| {
            haystacks
                .iter()
                .any(|cells| cells[row].as_deref().is_some_and(|text| text.contains(&needle)))
        })
        .collect()
}
