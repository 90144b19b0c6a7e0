use crate::db::GatewayError;
use arrow::array::Array;
use arrow::datatypes::{DataType, Schema};
use arrow::record_batch::RecordBatch;
use arrow::util::display::{ArrayFormatter, FormatOptions};
use serde::Serialize;
use serde_json::Value;

/// Ordered rows under named columns, in the order the database returned them.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Table {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Value>>,
}

impl Table {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn from_batches(schema: &Schema, batches: &[RecordBatch]) -> Result<Self, GatewayError> {
        let columns = schema
            .fields()
            .iter()
            .map(|field| field.name().clone())
            .collect::<Vec<String>>();

        let mut rows = Vec::with_capacity(batches.iter().map(|b| b.num_rows()).sum());
        let options = FormatOptions::default();

        for batch in batches {
            let formatters = batch
                .columns()
                .iter()
                .map(|array| ArrayFormatter::try_new(array.as_ref(), &options))
                .collect::<Result<Vec<_>, _>>()?;

            for row in 0..batch.num_rows() {
                let cells = batch
                    .columns()
                    .iter()
                    .zip(&formatters)
                    .map(|(array, formatter)| cell_value(array.as_ref(), formatter, row))
                    .collect();
                rows.push(cells);
            }
        }

        Ok(Self { columns, rows })
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Value of `column` in row `row`, looked up by name.
    pub fn get(&self, row: usize, column: &str) -> Option<&Value> {
        let index = self.columns.iter().position(|c| c == column)?;
        self.rows.get(row)?.get(index)
    }

    /// Cells rendered for display; NULL renders as `NULL`.
    pub fn display_rows(&self) -> Vec<Vec<String>> {
        self.rows
            .iter()
            .map(|row| row.iter().map(|cell| display_cell(cell, "NULL")).collect())
            .collect()
    }

    pub fn render_text(&self) -> String {
        let display = self.display_rows();
        let mut widths: Vec<usize> = self.columns.iter().map(|c| c.chars().count()).collect();
        for row in &display {
            for (width, cell) in widths.iter_mut().zip(row) {
                *width = (*width).max(cell.chars().count());
            }
        }

        let border = format!(
            "+{}+",
            widths
                .iter()
                .map(|w| "-".repeat(w + 2))
                .collect::<Vec<_>>()
                .join("+")
        );
        let line = |cells: &[String]| {
            let padded = cells
                .iter()
                .zip(&widths)
                .map(|(cell, width)| format!(" {:<width$} ", cell, width = *width))
                .collect::<Vec<_>>()
                .join("|");
            format!("|{}|", padded)
        };

        let mut out = String::new();
        if !self.columns.is_empty() {
            out.push_str(&border);
            out.push('\n');
            out.push_str(&line(&self.columns));
            out.push('\n');
            out.push_str(&border);
            out.push('\n');
            for row in &display {
                out.push_str(&line(row));
                out.push('\n');
            }
            out.push_str(&border);
            out.push('\n');
        }

        let count = self.row_count();
        out.push_str(&format!("({} row{})", count, if count == 1 { "" } else { "s" }));
        out
    }

    pub fn to_csv(&self) -> Result<Vec<u8>, csv::Error> {
        let mut writer = csv::Writer::from_writer(Vec::new());
        writer.write_record(&self.columns)?;
        for row in &self.rows {
            writer.write_record(row.iter().map(|cell| display_cell(cell, "")))?;
        }
        writer
            .into_inner()
            .map_err(|e| csv::Error::from(e.into_error()))
    }
}

fn cell_value(array: &dyn Array, formatter: &ArrayFormatter, row: usize) -> Value {
    if array.is_null(row) {
        return Value::Null;
    }

    let text = formatter.value(row).to_string();
    match array.data_type() {
        DataType::Boolean => text.parse::<bool>().map(Value::Bool).unwrap_or(Value::String(text)),
        data_type if data_type.is_numeric() => match text.parse::<serde_json::Number>() {
            Ok(number) => Value::Number(number),
            Err(_) => Value::String(text),
        },
        _ => Value::String(text),
    }
}

fn display_cell(cell: &Value, null: &str) -> String {
    match cell {
        Value::Null => null.to_string(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Result of running one statement, distinguishing "no rows" from "failed".
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum QueryOutcome {
    Rows(Table),
    EmptyResult { columns: Vec<String> },
    QueryError { message: String },
}

impl QueryOutcome {
    pub fn from_table(table: Table) -> Self {
        if table.is_empty() {
            QueryOutcome::EmptyResult {
                columns: table.columns,
            }
        } else {
            QueryOutcome::Rows(table)
        }
    }

    /// Tabular view of the outcome; a failed query yields a table with no rows and no columns.
    pub fn table(&self) -> Table {
        match self {
            QueryOutcome::Rows(table) => table.clone(),
            QueryOutcome::EmptyResult { columns } => Table {
                columns: columns.clone(),
                rows: Vec::new(),
            },
            QueryOutcome::QueryError { .. } => Table::empty(),
        }
    }

    pub fn error_message(&self) -> Option<&str> {
        match self {
            QueryOutcome::QueryError { message } => Some(message),
            _ => None,
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, QueryOutcome::QueryError { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrow::array::{BooleanArray, Float64Array, Int32Array, StringArray};
    use arrow::datatypes::Field;
    use serde_json::json;
    use std::sync::Arc;

    fn sample_batch() -> (Arc<Schema>, RecordBatch) {
        let schema = Arc::new(Schema::new(vec![
            Field::new("Player Names", DataType::Utf8, true),
            Field::new("Goals", DataType::Int32, true),
            Field::new("xG", DataType::Float64, true),
            Field::new("Starter", DataType::Boolean, true),
        ]));
        let batch = RecordBatch::try_new(
            schema.clone(),
            vec![
                Arc::new(StringArray::from(vec![Some("Erling Haaland"), None])),
                Arc::new(Int32Array::from(vec![Some(36), Some(7)])),
                Arc::new(Float64Array::from(vec![Some(28.5), None])),
                Arc::new(BooleanArray::from(vec![Some(true), Some(false)])),
            ],
        )
        .unwrap();
        (schema, batch)
    }

    #[test]
    fn test_from_batches_keeps_column_order_and_types() {
        let (schema, batch) = sample_batch();
        let table = Table::from_batches(&schema, &[batch]).unwrap();

        assert_eq!(table.columns, vec!["Player Names", "Goals", "xG", "Starter"]);
        assert_eq!(table.rows[0], vec![json!("Erling Haaland"), json!(36), json!(28.5), json!(true)]);
        assert_eq!(table.rows[1], vec![Value::Null, json!(7), Value::Null, json!(false)]);
        assert_eq!(table.get(0, "Goals"), Some(&json!(36)));
        assert_eq!(table.get(5, "Goals"), None);
        assert_eq!(table.get(0, "Club"), None);
    }

    #[test]
    fn test_render_text() {
        let table = Table {
            columns: vec!["Player Names".into(), "Goals".into()],
            rows: vec![vec![json!("Harry Kane"), json!(36)], vec![Value::Null, json!(5)]],
        };

        let expected = "\
+--------------+-------+
| Player Names | Goals |
+--------------+-------+
| Harry Kane   | 36    |
| NULL         | 5     |
+--------------+-------+
(2 rows)";
        assert_eq!(table.render_text(), expected);
    }

    #[test]
    fn test_render_text_of_empty_table() {
        assert_eq!(Table::empty().render_text(), "(0 rows)");
    }

    #[test]
    fn test_to_csv() {
        let table = Table {
            columns: vec!["Club".into(), "Goals".into()],
            rows: vec![vec![json!("Bayern, Munich"), json!(36)], vec![json!("Inter"), Value::Null]],
        };

        let csv = String::from_utf8(table.to_csv().unwrap()).unwrap();
        assert_eq!(csv, "Club,Goals\n\"Bayern, Munich\",36\nInter,\n");
    }

    #[test]
    fn test_outcome_variants() {
        let empty = QueryOutcome::from_table(Table {
            columns: vec!["Country".into()],
            rows: vec![],
        });
        assert_eq!(empty, QueryOutcome::EmptyResult { columns: vec!["Country".into()] });
        assert_eq!(empty.table().columns, vec!["Country"]);

        let failed = QueryOutcome::QueryError { message: "syntax error".into() };
        assert!(failed.is_error());
        assert_eq!(failed.table(), Table::empty());
        assert_eq!(failed.error_message(), Some("syntax error"));
    }

    #[test]
    fn test_outcome_serialization_is_tagged() {
        let outcome = QueryOutcome::QueryError { message: "boom".into() };
        assert_eq!(
            serde_json::to_value(&outcome).unwrap(),
            json!({"status": "query_error", "message": "boom"})
        );

        let rows = QueryOutcome::Rows(Table {
            columns: vec!["Year".into()],
            rows: vec![vec![json!(2023)]],
        });
        assert_eq!(
            serde_json::to_value(&rows).unwrap(),
            json!({"status": "rows", "columns": ["Year"], "rows": [[2023]]})
        );
    }
}
