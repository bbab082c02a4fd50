//! 表格数据与 CSV 编码

use santoku_errors::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Column-oriented header plus row values, as returned by warehouse queries or built by callers.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Table {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Value>>,
}

impl Table {
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    pub fn push_row(&mut self, row: Vec<Value>) -> AppResult<()> {
        if row.len() != self.columns.len() {
            return Err(AppError::validation(format!(
                "Row has {} values but the table has {} columns.",
                row.len(),
                self.columns.len()
            )));
        }
        self.rows.push(row);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Encode as CSV with a header line. With `include_index`, an unnamed leading column holds
    /// the zero-based row number.
    pub fn to_csv_bytes(&self, include_index: bool) -> AppResult<Vec<u8>> {
        let mut writer = csv::Writer::from_writer(Vec::new());

        let mut header: Vec<&str> = Vec::with_capacity(self.columns.len() + 1);
        if include_index {
            header.push("");
        }
        header.extend(self.columns.iter().map(String::as_str));
        writer.write_record(&header).map_err(csv_error)?;

        for (index, row) in self.rows.iter().enumerate() {
            let mut record: Vec<String> = Vec::with_capacity(row.len() + 1);
            if include_index {
                record.push(index.to_string());
            }
            record.extend(row.iter().map(render_cell));
            writer.write_record(&record).map_err(csv_error)?;
        }

        writer
            .into_inner()
            .map_err(|e| AppError::internal(format!("Failed to flush CSV buffer: {}", e)))
    }
}

fn render_cell(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn csv_error(err: csv::Error) -> AppError {
    AppError::internal(format!("Failed to encode CSV: {}", err))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> Table {
        let mut table = Table::new(vec!["name".to_string(), "count".to_string()]);
        table.push_row(vec![json!("alpha"), json!(1)]).unwrap();
        table.push_row(vec![json!("beta, gamma"), Value::Null]).unwrap();
        table
    }

    #[test]
    fn test_csv_without_index() {
        let csv = String::from_utf8(sample().to_csv_bytes(false).unwrap()).unwrap();
        assert_eq!(csv, "name,count\nalpha,1\n\"beta, gamma\",\n");
    }

    #[test]
    fn test_csv_with_index() {
        let csv = String::from_utf8(sample().to_csv_bytes(true).unwrap()).unwrap();
        assert_eq!(csv, ",name,count\n0,alpha,1\n1,\"beta, gamma\",\n");
    }

    #[test]
    fn test_row_length_is_checked() {
        let mut table = Table::new(vec!["a".to_string()]);
        let err = table.push_row(vec![json!(1), json!(2)]).unwrap_err();
        assert_eq!(err.kind(), santoku_errors::ErrorKind::Validation);
        assert!(table.is_empty());
    }
}
