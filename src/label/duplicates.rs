use std::collections::HashSet;

use log::{debug, info};

use super::{check_collision, check_columns, LabelOptions};
use crate::data::loader::{load_with, Source};
use crate::data::model::{Column, Table, Value};
use crate::error::Result;

/// Add the duplicate indicator column.
///
/// A row is flagged when its value in any target column repeats a value
/// seen in an earlier row of that same column, comparing trimmed,
/// lowercased text. Missing cells are never flagged and never count as a
/// first occurrence.
pub fn label_duplicates<'a, S: AsRef<str>>(
    source: impl Into<Source<'a>>,
    target_columns: &[S],
    options: &LabelOptions,
) -> Result<Table> {
    let mut table = load_with(source, &options.load)?;
    check_columns(&table, target_columns)?;
    check_collision(&table, &options.duplicate_column, options.on_collision)?;

    let mut flags = vec![false; table.height()];
    for name in target_columns {
        let name = name.as_ref();
        let column_flags = duplicate_flags(&table.column(name)?.values);
        debug!(
            "column {name:?}: {} repeated values",
            column_flags.iter().filter(|f| **f).count()
        );
        for (flag, repeated) in flags.iter_mut().zip(column_flags) {
            *flag |= repeated;
        }
    }

    info!(
        "flagged {} of {} rows as duplicate",
        flags.iter().filter(|f| **f).count(),
        flags.len()
    );
    table.set_column(Column::new(options.duplicate_column.clone(), flags))?;
    Ok(table)
}

/// Per-row flags for one column: true for every non-first occurrence of a
/// normalized value.
pub fn duplicate_flags(values: &[Value]) -> Vec<bool> {
    let mut seen = HashSet::new();
    values
        .iter()
        .map(|v| match v.to_text() {
            Some(text) => !seen.insert(normalize(&text)),
            None => false,
        })
        .collect()
}

/// Trim surrounding whitespace and lowercase.
pub fn normalize(text: &str) -> String {
    text.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::LabelError;
    use crate::label::CollisionPolicy;

    fn texts(raw: &[Option<&str>]) -> Vec<Value> {
        raw.iter().map(|v| Value::from(*v)).collect()
    }

    fn flags_of(table: &Table) -> Vec<bool> {
        table
            .column("duplicate")
            .unwrap()
            .values
            .iter()
            .map(|v| matches!(v, Value::Bool(true)))
            .collect()
    }

    #[test]
    fn test_first_occurrence_is_not_flagged() {
        let values = texts(&[Some("Apple"), Some(" apple "), Some("APPLE"), Some("pear")]);
        assert_eq!(duplicate_flags(&values), [false, true, true, false]);
    }

    #[test]
    fn test_missing_values_are_exempt() {
        let values = texts(&[None, Some("a"), None, Some("a"), None]);
        assert_eq!(duplicate_flags(&values), [false, false, false, true, false]);
    }

    #[test]
    fn test_numbers_compare_as_text() {
        let values = vec![Value::Integer(1), Value::from("1"), Value::from(" 1 ")];
        assert_eq!(duplicate_flags(&values), [false, true, true]);

        let values = vec![Value::Bool(true), Value::from("true")];
        assert_eq!(duplicate_flags(&values), [false, true]);

        let values = vec![
            Value::Float(1e-5),
            Value::from("1E-05"),
            Value::Float(1e16),
            Value::from("1e+16"),
        ];
        assert_eq!(duplicate_flags(&values), [false, true, false, true]);
    }

    #[test]
    fn test_flags_are_or_across_columns() {
        let table = Table::new(vec![
            Column::new("name", texts(&[Some("a"), Some("b"), Some("c"), Some("A")])),
            Column::new("email", texts(&[Some("x@"), Some("x@"), None, None])),
        ])
        .unwrap();

        let labeled = label_duplicates(&table, &["name", "email"], &LabelOptions::default()).unwrap();
        assert_eq!(flags_of(&labeled), [false, true, false, true]);
        assert_eq!(
            labeled.column_names().collect::<Vec<_>>(),
            ["name", "email", "duplicate"]
        );
        assert!(!table.has_column("duplicate"));
    }

    #[test]
    fn test_no_targets_leaves_all_false() {
        let table = Table::new(vec![Column::new("name", ["a", "a"])]).unwrap();
        let labeled = label_duplicates(&table, &[] as &[&str], &LabelOptions::default()).unwrap();
        assert_eq!(flags_of(&labeled), [false, false]);
    }

    #[test]
    fn test_existing_indicator_is_read_then_replaced() {
        let table = Table::new(vec![
            Column::new("duplicate", ["x", "x"]),
            Column::new("id", [1_i64, 2]),
        ])
        .unwrap();

        let labeled =
            label_duplicates(&table, &["duplicate"], &LabelOptions::default()).unwrap();
        assert_eq!(labeled.column_names().collect::<Vec<_>>(), ["duplicate", "id"]);
        assert_eq!(flags_of(&labeled), [false, true]);

        let options = LabelOptions {
            on_collision: CollisionPolicy::Reject,
            ..LabelOptions::default()
        };
        let err = label_duplicates(&table, &["id"], &options).unwrap_err();
        assert!(matches!(err, LabelError::ColumnExists(name) if name == "duplicate"));
    }

    #[test]
    fn test_custom_indicator_name() {
        let table = Table::new(vec![Column::new("name", ["a", "A"])]).unwrap();
        let options = LabelOptions {
            duplicate_column: "is_dup".to_string(),
            ..LabelOptions::default()
        };
        let labeled = label_duplicates(&table, &["name"], &options).unwrap();
        assert_eq!(labeled.get(1, "is_dup"), Some(&Value::Bool(true)));
    }

    #[test]
    fn test_unknown_target_column() {
        let table = Table::new(vec![Column::new("name", ["a"])]).unwrap();
        let err = label_duplicates(&table, &["name", "mail"], &LabelOptions::default()).unwrap_err();
        assert!(matches!(err, LabelError::ColumnNotFound(name) if name == "mail"));
    }
}
