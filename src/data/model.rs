use std::borrow::Cow;
use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{LabelError, Result};

// ---------------------------------------------------------------------------
// Value – a single cell
// ---------------------------------------------------------------------------

/// A dynamically-typed cell value mirroring the common dataframe dtypes.
///
/// Serialized untagged, so a row round-trips through JSON as plain scalars
/// with `null` for [`Value::Missing`].
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Text(String),
    Integer(i64),
    Float(f64),
    Bool(bool),
    #[default]
    Missing,
}

impl Value {
    /// Missing cells, including floating-point NaN.
    pub fn is_missing(&self) -> bool {
        match self {
            Value::Missing => true,
            Value::Float(v) => v.is_nan(),
            _ => false,
        }
    }

    /// The string payload of a text cell.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Coerce the cell to text for comparison.
    ///
    /// Integers print plainly, integral floats keep one decimal (`1.0`), very
    /// small or large floats use exponent form (`1e-05`) and booleans print
    /// as `True` / `False`. Missing cells have no text.
    pub fn to_text(&self) -> Option<Cow<'_, str>> {
        if self.is_missing() {
            return None;
        }
        match self {
            Value::Text(s) => Some(Cow::Borrowed(s)),
            Value::Integer(i) => Some(Cow::Owned(i.to_string())),
            Value::Float(v) => Some(Cow::Owned(format_float(*v))),
            Value::Bool(true) => Some(Cow::Borrowed("True")),
            Value::Bool(false) => Some(Cow::Borrowed("False")),
            Value::Missing => None,
        }
    }
}

/// Shortest round-trip digits, switching to exponent form (`1e-05`,
/// `1.5e+16`) below 1e-4 and from 1e16 up, as dataframe text casts do.
fn format_float(v: f64) -> String {
    if !v.is_finite() {
        return v.to_string();
    }
    let sci = format!("{v:e}");
    if let Some((mantissa, exp)) = sci.split_once('e') {
        if let Ok(exp) = exp.parse::<i32>() {
            if v != 0.0 && !(-4..16).contains(&exp) {
                let sign = if exp < 0 { '-' } else { '+' };
                return format!("{mantissa}e{sign}{:02}", exp.abs());
            }
        }
    }
    let plain = v.to_string();
    if plain.contains('.') {
        plain
    } else {
        format!("{plain}.0")
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Text(s) => write!(f, "{s}"),
            Value::Integer(i) => write!(f, "{i}"),
            Value::Float(v) => write!(f, "{v}"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Missing => write!(f, "<null>"),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Integer(i)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        if v.is_nan() {
            Value::Missing
        } else {
            Value::Float(v)
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Value::Missing, Into::into)
    }
}

// ---------------------------------------------------------------------------
// Column – a named sequence of cells
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Column {
    pub name: String,
    pub values: Vec<Value>,
}

impl Column {
    pub fn new<V: Into<Value>>(name: impl Into<String>, values: impl IntoIterator<Item = V>) -> Self {
        Column {
            name: name.into(),
            values: values.into_iter().map(Into::into).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Table – the complete loaded dataset
// ---------------------------------------------------------------------------

/// Ordered, named columns of equal length.
///
/// Column names are unique and row order is significant. Every column has
/// [`Table::height`] values.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(try_from = "Vec<Column>", into = "Vec<Column>")]
pub struct Table {
    columns: Vec<Column>,
}

impl Table {
    /// Build a table, checking names are unique and lengths agree.
    pub fn new(columns: Vec<Column>) -> Result<Self> {
        let mut seen = HashSet::new();
        for col in &columns {
            if !seen.insert(col.name.as_str()) {
                return Err(LabelError::DuplicateColumn(col.name.clone()));
            }
        }
        if let Some(first) = columns.first() {
            let expected = first.len();
            if let Some(bad) = columns.iter().find(|c| c.len() != expected) {
                return Err(LabelError::RaggedColumn {
                    column: bad.name.clone(),
                    expected,
                    found: bad.len(),
                });
            }
        }
        Ok(Table { columns })
    }

    /// Number of rows.
    pub fn height(&self) -> usize {
        self.columns.first().map_or(0, Column::len)
    }

    /// Number of columns.
    pub fn width(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.height() == 0
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn into_columns(self) -> Vec<Column> {
        self.columns
    }

    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|c| c.name.as_str())
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.columns.iter().any(|c| c.name == name)
    }

    /// Look up a column by name.
    pub fn column(&self, name: &str) -> Result<&Column> {
        self.columns
            .iter()
            .find(|c| c.name == name)
            .ok_or_else(|| LabelError::ColumnNotFound(name.to_string()))
    }

    /// The cell at `row` in column `name`, if both exist.
    pub fn get(&self, row: usize, name: &str) -> Option<&Value> {
        self.column(name).ok()?.values.get(row)
    }

    /// One row as `(column name, value)` pairs in column order.
    pub fn row(&self, row: usize) -> Option<Vec<(&str, &Value)>> {
        if row >= self.height() {
            return None;
        }
        Some(
            self.columns
                .iter()
                .map(|c| (c.name.as_str(), &c.values[row]))
                .collect(),
        )
    }

    /// Replace the column of the same name in place, or append it.
    pub fn set_column(&mut self, column: Column) -> Result<()> {
        if !self.columns.is_empty() && column.len() != self.height() {
            let found = column.len();
            return Err(LabelError::RaggedColumn {
                column: column.name,
                expected: self.height(),
                found,
            });
        }
        match self.columns.iter_mut().find(|c| c.name == column.name) {
            Some(existing) => *existing = column,
            None => self.columns.push(column),
        }
        Ok(())
    }
}

impl TryFrom<Vec<Column>> for Table {
    type Error = LabelError;

    fn try_from(columns: Vec<Column>) -> Result<Self> {
        Table::new(columns)
    }
}

impl From<Table> for Vec<Column> {
    fn from(table: Table) -> Self {
        table.columns
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Table {
        Table::new(vec![
            Column::new("name", ["Alice", "Bob"]),
            Column::new("age", [Some(30_i64), None]),
        ])
        .unwrap()
    }

    #[test]
    fn test_text_coercion() {
        assert_eq!(Value::from(1_i64).to_text().unwrap(), "1");
        assert_eq!(Value::from(1.0).to_text().unwrap(), "1.0");
        assert_eq!(Value::from(2.5).to_text().unwrap(), "2.5");
        assert_eq!(Value::from(-0.0).to_text().unwrap(), "-0.0");
        assert_eq!(Value::from(true).to_text().unwrap(), "True");
        assert_eq!(Value::from(" x ").to_text().unwrap(), " x ");
        assert!(Value::Missing.to_text().is_none());
        assert!(Value::Float(f64::NAN).to_text().is_none());
    }

    #[test]
    fn test_float_text_switches_to_exponent() {
        let text = |v: f64| Value::from(v).to_text().unwrap().into_owned();
        assert_eq!(text(0.0001), "0.0001");
        assert_eq!(text(1e-5), "1e-05");
        assert_eq!(text(-2.5e-7), "-2.5e-07");
        assert_eq!(text(1e15), "1000000000000000.0");
        assert_eq!(text(1e16), "1e+16");
        assert_eq!(text(1.5e16), "1.5e+16");
        assert_eq!(text(123.25), "123.25");
        assert_eq!(text(f64::INFINITY), "inf");
    }

    #[test]
    fn test_set_column_length_mismatch_names_column() {
        let mut table = sample();
        let err = table.set_column(Column::new("flag", [true, false, true])).unwrap_err();
        assert!(matches!(
            err,
            LabelError::RaggedColumn { column, expected: 2, found: 3 } if column == "flag"
        ));
        assert_eq!(table.width(), 2);
    }

    #[test]
    fn test_nan_is_missing() {
        assert_eq!(Value::from(f64::NAN), Value::Missing);
        assert!(Value::Float(f64::NAN).is_missing());
        assert!(!Value::Float(0.0).is_missing());
    }

    #[test]
    fn test_table_shape() {
        let table = sample();
        assert_eq!(table.height(), 2);
        assert_eq!(table.width(), 2);
        assert_eq!(table.column_names().collect::<Vec<_>>(), ["name", "age"]);
        assert_eq!(table.get(1, "age"), Some(&Value::Missing));
        assert_eq!(table.get(0, "nope"), None);

        let row = table.row(0).unwrap();
        assert_eq!(row, vec![("name", &Value::from("Alice")), ("age", &Value::Integer(30))]);
        assert!(table.row(2).is_none());
    }

    #[test]
    fn test_rejects_duplicate_and_ragged_columns() {
        let dup = Table::new(vec![Column::new("a", [1_i64]), Column::new("a", [2_i64])]);
        assert!(matches!(dup, Err(LabelError::DuplicateColumn(name)) if name == "a"));

        let ragged = Table::new(vec![Column::new("a", [1_i64]), Column::new("b", [1_i64, 2])]);
        assert!(matches!(
            ragged,
            Err(LabelError::RaggedColumn { expected: 1, found: 2, .. })
        ));
    }

    #[test]
    fn test_set_column_replaces_in_place() {
        let mut table = sample();
        table.set_column(Column::new("name", [false, true])).unwrap();
        table.set_column(Column::new("flag", [true, true])).unwrap();

        assert_eq!(table.column_names().collect::<Vec<_>>(), ["name", "age", "flag"]);
        assert_eq!(table.get(1, "name"), Some(&Value::Bool(true)));

        let err = table.set_column(Column::new("short", [true])).unwrap_err();
        assert!(matches!(err, LabelError::RaggedColumn { .. }));
    }

    #[test]
    fn test_missing_column() {
        let err = sample().column("salary").unwrap_err();
        assert!(matches!(err, LabelError::ColumnNotFound(name) if name == "salary"));
    }

    #[test]
    fn test_serde_records() {
        let table = sample();
        let json = serde_json::to_string(&table).unwrap();
        assert_eq!(
            json,
            r#"[{"name":"name","values":["Alice","Bob"]},{"name":"age","values":[30,null]}]"#
        );
        let back: Table = serde_json::from_str(&json).unwrap();
        assert_eq!(back, table);

        let bad = r#"[{"name":"a","values":[1]},{"name":"a","values":[2]}]"#;
        assert!(serde_json::from_str::<Table>(bad).is_err());
    }
}
