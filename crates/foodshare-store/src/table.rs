//! Column-oriented result of an ad-hoc query.

use rusqlite::types::ValueRef;
use rusqlite::Rows;
use serde::Serialize;
use serde_json::Value;

/// Column names plus rows of JSON-compatible cells.
///
/// SQLite values map as: NULL to `null`, INTEGER and REAL to numbers, TEXT
/// to strings and BLOB to a lowercase hex string.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct QueryTable {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Value>>,
}

impl QueryTable {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Every row rendered as display strings (NULL shows as blank).
    pub fn text_rows(&self) -> Vec<Vec<String>> {
        self.rows
            .iter()
            .map(|row| row.iter().map(display_cell).collect())
            .collect()
    }

    /// Drain `rows` into a table with the given column names.
    pub(crate) fn read(columns: Vec<String>, mut rows: Rows<'_>) -> rusqlite::Result<Self> {
        let mut out = Vec::new();
        while let Some(row) = rows.next()? {
            let mut cells = Vec::with_capacity(columns.len());
            for i in 0..columns.len() {
                cells.push(json_cell(row.get_ref(i)?));
            }
            out.push(cells);
        }
        Ok(Self { columns, rows: out })
    }
}

fn json_cell(value: ValueRef<'_>) -> Value {
    match value {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(i) => Value::from(i),
        ValueRef::Real(f) => serde_json::Number::from_f64(f)
            .map(Value::Number)
            .unwrap_or(Value::Null),
        ValueRef::Text(bytes) => Value::String(String::from_utf8_lossy(bytes).into_owned()),
        ValueRef::Blob(bytes) => Value::String(bytes.iter().map(|b| format!("{b:02x}")).collect()),
    }
}

fn display_cell(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rusqlite::Connection;

    fn run(conn: &Connection, sql: &str) -> QueryTable {
        let mut stmt = conn.prepare(sql).unwrap();
        let columns = stmt.column_names().into_iter().map(String::from).collect();
        let rows = stmt.query([]).unwrap();
        QueryTable::read(columns, rows).unwrap()
    }

    #[test]
    fn test_cell_mapping() {
        let conn = Connection::open_in_memory().unwrap();
        let table = run(&conn, "SELECT NULL AS n, 42 AS i, 2.5 AS r, 'Chennai' AS t, x'0aff' AS b");

        assert_eq!(table.columns, vec!["n", "i", "r", "t", "b"]);
        assert_eq!(
            table.rows[0],
            vec![
                Value::Null,
                Value::from(42),
                Value::from(2.5),
                Value::from("Chennai"),
                Value::from("0aff"),
            ]
        );
    }

    #[test]
    fn test_text_rows() {
        let conn = Connection::open_in_memory().unwrap();
        let table = run(&conn, "SELECT NULL AS a, 7 AS b, 'x' AS c");
        assert_eq!(table.text_rows(), vec![vec!["", "7", "x"]]);
    }

    #[test]
    fn test_empty_result_keeps_columns() {
        let conn = Connection::open_in_memory().unwrap();
        let table = run(&conn, "SELECT 1 AS one WHERE 0");
        assert!(table.is_empty());
        assert_eq!(table.columns, vec!["one"]);
    }

    #[test]
    fn test_serializes_as_columns_and_rows() {
        let table = QueryTable {
            columns: vec!["City".to_string()],
            rows: vec![vec![Value::from("Pune")]],
        };
        let json = serde_json::to_value(&table).unwrap();
        assert_eq!(json, serde_json::json!({"columns": ["City"], "rows": [["Pune"]]}));
    }
}
