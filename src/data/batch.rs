use std::fmt;
use std::sync::Arc;

use arrow::array::{Array, ArrayRef, AsArray, BooleanArray, Float64Array, Int64Array, StringArray};
use arrow::datatypes::{
    DataType, Field, Float32Type, Float64Type, Int16Type, Int32Type, Int64Type, Int8Type, Schema,
    UInt16Type, UInt32Type, UInt64Type, UInt8Type,
};
use arrow::record_batch::{RecordBatch, RecordBatchOptions};
use arrow::util::display::array_value_to_string;
use arrow::util::pretty::pretty_format_batches;
use log::debug;

use super::model::{Column, Table, Value};
use crate::error::Result;

// ---------------------------------------------------------------------------
// Arrow → Table
// ---------------------------------------------------------------------------

impl Table {
    /// Concatenate record batches sharing one schema into a table.
    pub fn from_record_batches(batches: &[RecordBatch]) -> Result<Table> {
        let Some(first) = batches.first() else {
            return Ok(Table::default());
        };
        let schema = first.schema();
        let total_rows = batches.iter().map(RecordBatch::num_rows).sum();
        let mut columns: Vec<Column> = schema
            .fields()
            .iter()
            .map(|f| Column {
                name: f.name().clone(),
                values: Vec::with_capacity(total_rows),
            })
            .collect();

        for batch in batches {
            for (col, array) in columns.iter_mut().zip(batch.columns()) {
                for row in 0..batch.num_rows() {
                    col.values.push(extract_value(array, row)?);
                }
            }
        }
        Table::new(columns)
    }

    /// Convert to a single arrow record batch.
    ///
    /// Each column becomes Int64, Float64 or Boolean when all of its present
    /// values have that type, and Utf8 otherwise.
    pub fn to_record_batch(&self) -> Result<RecordBatch> {
        let mut fields = Vec::with_capacity(self.width());
        let mut arrays: Vec<ArrayRef> = Vec::with_capacity(self.width());
        for col in self.columns() {
            let array = column_to_array(col);
            fields.push(Field::new(col.name.clone(), array.data_type().clone(), true));
            arrays.push(array);
        }
        let options = RecordBatchOptions::new().with_row_count(Some(self.height()));
        let batch =
            RecordBatch::try_new_with_options(Arc::new(Schema::new(fields)), arrays, &options)?;
        Ok(batch)
    }

    /// Render as an ASCII grid.
    pub fn to_pretty_string(&self) -> Result<String> {
        let batch = self.to_record_batch()?;
        Ok(pretty_format_batches(&[batch])?.to_string())
    }
}

/// Extract a single cell from an Arrow column at a given row.
fn extract_value(col: &ArrayRef, row: usize) -> Result<Value> {
    if col.is_null(row) {
        return Ok(Value::Missing);
    }
    let value = match col.data_type() {
        DataType::Utf8 => Value::Text(col.as_string::<i32>().value(row).to_string()),
        DataType::LargeUtf8 => Value::Text(col.as_string::<i64>().value(row).to_string()),
        DataType::Int8 => Value::Integer(col.as_primitive::<Int8Type>().value(row).into()),
        DataType::Int16 => Value::Integer(col.as_primitive::<Int16Type>().value(row).into()),
        DataType::Int32 => Value::Integer(col.as_primitive::<Int32Type>().value(row).into()),
        DataType::Int64 => Value::Integer(col.as_primitive::<Int64Type>().value(row)),
        DataType::UInt8 => Value::Integer(col.as_primitive::<UInt8Type>().value(row).into()),
        DataType::UInt16 => Value::Integer(col.as_primitive::<UInt16Type>().value(row).into()),
        DataType::UInt32 => Value::Integer(col.as_primitive::<UInt32Type>().value(row).into()),
        DataType::UInt64 => {
            let v = col.as_primitive::<UInt64Type>().value(row);
            i64::try_from(v).map_or(Value::Float(v as f64), Value::Integer)
        }
        DataType::Float32 => Value::from(f64::from(col.as_primitive::<Float32Type>().value(row))),
        DataType::Float64 => Value::from(col.as_primitive::<Float64Type>().value(row)),
        DataType::Boolean => Value::Bool(col.as_boolean().value(row)),
        _ => Value::Text(array_value_to_string(col, row)?),
    };
    Ok(value)
}

// ---------------------------------------------------------------------------
// Table → Arrow
// ---------------------------------------------------------------------------

fn column_to_array(col: &Column) -> ArrayRef {
    let present = || col.values.iter().filter(|v| !v.is_missing());

    let all_int = present().all(|v| matches!(v, Value::Integer(_)));
    let all_numeric = present().all(|v| matches!(v, Value::Integer(_) | Value::Float(_)));
    let all_bool = present().all(|v| matches!(v, Value::Bool(_)));
    let any_present = present().next().is_some();

    if any_present && all_int {
        let values: Vec<Option<i64>> = col
            .values
            .iter()
            .map(|v| match v {
                Value::Integer(i) => Some(*i),
                _ => None,
            })
            .collect();
        Arc::new(Int64Array::from(values))
    } else if any_present && all_numeric {
        let values: Vec<Option<f64>> = col
            .values
            .iter()
            .map(|v| match v {
                Value::Integer(i) => Some(*i as f64),
                Value::Float(f) if !f.is_nan() => Some(*f),
                _ => None,
            })
            .collect();
        Arc::new(Float64Array::from(values))
    } else if any_present && all_bool {
        let values: Vec<Option<bool>> = col
            .values
            .iter()
            .map(|v| match v {
                Value::Bool(b) => Some(*b),
                _ => None,
            })
            .collect();
        Arc::new(BooleanArray::from(values))
    } else {
        let values: Vec<Option<String>> = col
            .values
            .iter()
            .map(|v| v.to_text().map(|s| s.into_owned()))
            .collect();
        Arc::new(StringArray::from(values))
    }
}

/// Pretty-printed as an ASCII grid.
impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let grid = self.to_pretty_string().map_err(|e| {
            debug!("cannot render table: {e}");
            fmt::Error
        })?;
        f.write_str(&grid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mixed() -> Table {
        Table::new(vec![
            Column::new("id", [Some(1_i64), None, Some(3)]),
            Column::new("score", [0.5, 1.5, f64::NAN]),
            Column::new("ok", [true, false, true]),
            Column::new("note", [Value::from("a"), Value::Integer(2), Value::Missing]),
        ])
        .unwrap()
    }

    #[test]
    fn test_column_types() {
        let batch = mixed().to_record_batch().unwrap();
        let types: Vec<_> = batch
            .schema()
            .fields()
            .iter()
            .map(|f| f.data_type().clone())
            .collect();
        assert_eq!(
            types,
            [DataType::Int64, DataType::Float64, DataType::Boolean, DataType::Utf8]
        );
        assert_eq!(batch.num_rows(), 3);
    }

    #[test]
    fn test_batches_back_to_table() {
        let table = mixed();
        let batch = table.to_record_batch().unwrap();
        let back = Table::from_record_batches(&[batch.clone(), batch]).unwrap();

        assert_eq!(back.height(), 6);
        assert_eq!(back.get(4, "id"), Some(&Value::Missing));
        assert_eq!(back.get(5, "score"), Some(&Value::Missing));
        // mixed columns come back as text
        assert_eq!(back.get(1, "note"), Some(&Value::from("2")));
    }

    #[test]
    fn test_empty_table_batch() {
        let batch = Table::default().to_record_batch().unwrap();
        assert_eq!(batch.num_columns(), 0);
        assert_eq!(Table::from_record_batches(&[]).unwrap(), Table::default());
    }

    #[test]
    fn test_display_grid() {
        let table = mixed();
        let shown = table.to_string();
        assert!(shown.contains("| id"));
        assert!(shown.contains("note"));
        assert_eq!(shown, table.to_pretty_string().unwrap());
    }
}
