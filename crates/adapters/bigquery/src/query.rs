//! Query results

use santoku_common::Table;
use serde::Deserialize;
use serde_json::Value;

/// Rows of a finished query job, gathered across every result page.
///
/// Cell values are kept as the API returns them: scalars arrive as strings, `NULL` as `null`.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryResult {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Value>>,
    pub total_rows: u64,
    pub job_complete: bool,
}

impl QueryResult {
    pub fn to_table(&self) -> Table {
        Table {
            columns: self.columns.clone(),
            rows: self.rows.clone(),
        }
    }

    /// Append a later page of the same job.
    pub(crate) fn extend(&mut self, page: QueryResult) {
        if self.columns.is_empty() {
            self.columns = page.columns;
        }
        self.rows.extend(page.rows);
        self.total_rows = self.total_rows.max(page.total_rows);
        self.job_complete = page.job_complete;
    }
}

/// Job a query runs as; later pages are read from it.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct JobReference {
    pub(crate) project_id: String,
    pub(crate) job_id: String,
    pub(crate) location: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct QueryResponse {
    #[serde(default)]
    job_complete: bool,
    pub(crate) job_reference: Option<JobReference>,
    pub(crate) page_token: Option<String>,
    schema: Option<TableSchema>,
    #[serde(default)]
    rows: Vec<TableRow>,
    total_rows: Option<String>,
}

impl QueryResponse {
    /// Whether another `getQueryResults` call is needed.
    pub(crate) fn has_more(&self) -> bool {
        !self.job_complete || self.page_token.is_some()
    }
}

#[derive(Deserialize)]
struct TableSchema {
    #[serde(default)]
    fields: Vec<FieldSchema>,
}

#[derive(Deserialize)]
struct FieldSchema {
    name: String,
}

#[derive(Deserialize)]
struct TableRow {
    #[serde(default)]
    f: Vec<TableCell>,
}

#[derive(Deserialize)]
struct TableCell {
    #[serde(default)]
    v: Value,
}

impl From<QueryResponse> for QueryResult {
    fn from(response: QueryResponse) -> Self {
        let columns = response
            .schema
            .map(|schema| schema.fields.into_iter().map(|f| f.name).collect())
            .unwrap_or_default();
        let rows: Vec<Vec<Value>> = response
            .rows
            .into_iter()
            .map(|row| row.f.into_iter().map(|cell| cell.v).collect())
            .collect();
        let total_rows = response
            .total_rows
            .and_then(|n| n.parse().ok())
            .unwrap_or(rows.len() as u64);

        Self {
            columns,
            rows,
            total_rows,
            job_complete: response.job_complete,
        }
    }
}
