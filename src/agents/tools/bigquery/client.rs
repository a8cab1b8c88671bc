//! Minimal BigQuery v2 REST client.
//!
//! Only the calls the toolset needs: dataset/table metadata, dry runs, and
//! synchronous queries.

use crate::auth::{AuthError, TokenProvider};
use crate::config::DEFAULT_BIGQUERY_URL;
use crate::infra::google_api::{resource_url, ApiError, ResourceUrlError};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

/// Per-request server-side wait for `jobs.query` / `getQueryResults`.
const QUERY_TIMEOUT_MS: u64 = 10_000;

/// Upper bound on `getQueryResults` polls for one query.
const MAX_RESULT_POLLS: usize = 30;

#[derive(Debug, Error)]
pub enum BigQueryError {
    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error("bigquery request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("bigquery returned {status}: {message}")]
    Api { status: String, message: String },

    #[error(transparent)]
    InvalidResource(#[from] ResourceUrlError),

    #[error("query job {0} did not complete")]
    Incomplete(String),
}

impl From<ApiError> for BigQueryError {
    fn from(err: ApiError) -> Self {
        BigQueryError::Api {
            status: err.status,
            message: err.message,
        }
    }
}

// ============================================================================
// Response Types
// ============================================================================

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TableFieldSchema {
    pub name: String,
    #[serde(rename = "type", default)]
    pub field_type: String,
    #[serde(default)]
    pub mode: Option<String>,
    #[serde(default)]
    pub fields: Vec<TableFieldSchema>,
}

#[derive(Debug, Default, Deserialize)]
struct TableSchema {
    #[serde(default)]
    fields: Vec<TableFieldSchema>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct JobReference {
    job_id: String,
    #[serde(default)]
    location: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct QueryResponse {
    #[serde(default)]
    schema: Option<TableSchema>,
    #[serde(default)]
    rows: Vec<Value>,
    #[serde(default)]
    job_complete: bool,
    #[serde(default)]
    total_rows: Option<String>,
    #[serde(default)]
    job_reference: Option<JobReference>,
}

/// Outcome of a dry run.
#[derive(Debug, Clone, Default)]
pub struct DryRun {
    /// `SELECT`, `INSERT`, `CREATE_TABLE`, `SCRIPT`, ...
    pub statement_type: Option<String>,
    pub total_bytes_processed: Option<u64>,
}

/// Rows of a completed query, converted to JSON objects keyed by column.
#[derive(Debug, Clone, Default)]
pub struct QueryRows {
    pub rows: Vec<Value>,
    pub total_rows: Option<u64>,
}

// ============================================================================
// Client
// ============================================================================

pub struct BigQueryClient {
    tokens: Arc<dyn TokenProvider>,
    base_url: String,
    client: Client,
}

impl BigQueryClient {
    pub fn new(tokens: Arc<dyn TokenProvider>) -> Self {
        Self {
            tokens,
            base_url: DEFAULT_BIGQUERY_URL.to_string(),
            client: Client::new(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    async fn send(&self, request: reqwest::RequestBuilder) -> Result<Value, BigQueryError> {
        let token = self.tokens.access_token().await?;
        let resp = request
            .header("Authorization", token.header_value())
            .send()
            .await?;

        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let body = resp.text().await.unwrap_or_default();
            return Err(ApiError::from_body(status, &body).into());
        }

        Ok(resp.json().await?)
    }

    async fn get(&self, path: &[&str], query: &[(&str, String)]) -> Result<Value, BigQueryError> {
        let url = resource_url(&self.base_url, path)?;
        debug!("GET {}", url);
        self.send(self.client.get(url).query(query)).await
    }

    async fn post(&self, path: &[&str], body: &Value) -> Result<Value, BigQueryError> {
        let url = resource_url(&self.base_url, path)?;
        debug!("POST {}", url);
        self.send(self.client.post(url).json(body)).await
    }

    /// Follow `nextPageToken` and collect `{list_key}[].{ref_key}.{id_key}`.
    async fn list_ids(
        &self,
        path: &[&str],
        list_key: &str,
        ref_key: &str,
        id_key: &str,
    ) -> Result<Vec<String>, BigQueryError> {
        let mut ids = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let mut query = Vec::new();
            if let Some(token) = page_token.take() {
                query.push(("pageToken", token));
            }
            let page = self.get(path, &query).await?;

            if let Some(items) = page.get(list_key).and_then(|v| v.as_array()) {
                ids.extend(items.iter().filter_map(|item| {
                    item.get(ref_key)
                        .and_then(|r| r.get(id_key))
                        .and_then(|v| v.as_str())
                        .map(String::from)
                }));
            }

            match page.get("nextPageToken").and_then(|v| v.as_str()) {
                Some(next) if !next.is_empty() => page_token = Some(next.to_string()),
                _ => break,
            }
        }

        Ok(ids)
    }

    pub async fn list_dataset_ids(&self, project: &str) -> Result<Vec<String>, BigQueryError> {
        self.list_ids(
            &["projects", project, "datasets"],
            "datasets",
            "datasetReference",
            "datasetId",
        )
        .await
    }

    pub async fn get_dataset(&self, project: &str, dataset: &str) -> Result<Value, BigQueryError> {
        self.get(&["projects", project, "datasets", dataset], &[])
            .await
    }

    pub async fn list_table_ids(
        &self,
        project: &str,
        dataset: &str,
    ) -> Result<Vec<String>, BigQueryError> {
        self.list_ids(
            &["projects", project, "datasets", dataset, "tables"],
            "tables",
            "tableReference",
            "tableId",
        )
        .await
    }

    pub async fn get_table(
        &self,
        project: &str,
        dataset: &str,
        table: &str,
    ) -> Result<Value, BigQueryError> {
        self.get(
            &["projects", project, "datasets", dataset, "tables", table],
            &[],
        )
        .await
    }

    /// Validate a statement without running it.
    pub async fn dry_run(&self, project: &str, sql: &str) -> Result<DryRun, BigQueryError> {
        let body = json!({
            "configuration": {
                "dryRun": true,
                "query": { "query": sql, "useLegacySql": false }
            }
        });
        let job = self.post(&["projects", project, "jobs"], &body).await?;
        let stats = job.pointer("/statistics/query");

        Ok(DryRun {
            statement_type: stats
                .and_then(|s| s.get("statementType"))
                .and_then(|v| v.as_str())
                .map(String::from),
            total_bytes_processed: job
                .pointer("/statistics/totalBytesProcessed")
                .and_then(|v| v.as_str())
                .and_then(|s| s.parse().ok()),
        })
    }

    /// Run a query and return at most `max_rows` rows.
    pub async fn query(
        &self,
        project: &str,
        sql: &str,
        max_rows: u32,
    ) -> Result<QueryRows, BigQueryError> {
        let body = json!({
            "query": sql,
            "useLegacySql": false,
            "maxResults": max_rows,
            "timeoutMs": QUERY_TIMEOUT_MS,
        });
        let value = self.post(&["projects", project, "queries"], &body).await?;
        let mut resp: QueryResponse = serde_json::from_value(value).map_err(|e| BigQueryError::Api {
            status: "INVALID_RESPONSE".to_string(),
            message: e.to_string(),
        })?;

        let mut polls = 0;
        while !resp.job_complete {
            let job = resp.job_reference.take().unwrap_or_default();
            if polls >= MAX_RESULT_POLLS || job.job_id.is_empty() {
                return Err(BigQueryError::Incomplete(job.job_id));
            }
            polls += 1;

            let mut query = vec![
                ("maxResults", max_rows.to_string()),
                ("timeoutMs", QUERY_TIMEOUT_MS.to_string()),
            ];
            if let Some(location) = &job.location {
                query.push(("location", location.clone()));
            }
            let value = self
                .get(&["projects", project, "queries", job.job_id.as_str()], &query)
                .await?;
            resp = serde_json::from_value(value).map_err(|e| BigQueryError::Api {
                status: "INVALID_RESPONSE".to_string(),
                message: e.to_string(),
            })?;
            if resp.job_reference.is_none() {
                resp.job_reference = Some(job);
            }
        }

        let fields = resp.schema.map(|s| s.fields).unwrap_or_default();
        let rows = resp
            .rows
            .iter()
            .take(max_rows as usize)
            .map(|row| convert_record(row, &fields))
            .collect();

        Ok(QueryRows {
            rows,
            total_rows: resp.total_rows.and_then(|t| t.parse().ok()),
        })
    }
}

// ============================================================================
// Row Conversion
// ============================================================================

/// Convert a `{"f": [{"v": ...}]}` record into an object keyed by field name.
fn convert_record(record: &Value, fields: &[TableFieldSchema]) -> Value {
    let cells = record.get("f").and_then(|f| f.as_array());
    let mut obj = Map::new();
    for (idx, field) in fields.iter().enumerate() {
        let cell = cells
            .and_then(|c| c.get(idx))
            .and_then(|c| c.get("v"))
            .unwrap_or(&Value::Null);
        obj.insert(field.name.clone(), convert_field(cell, field));
    }
    Value::Object(obj)
}

fn convert_field(value: &Value, field: &TableFieldSchema) -> Value {
    if field.mode.as_deref() == Some("REPEATED") {
        let items = value.as_array().map(Vec::as_slice).unwrap_or_default();
        return Value::Array(
            items
                .iter()
                .map(|item| convert_scalar(item.get("v").unwrap_or(&Value::Null), field))
                .collect(),
        );
    }
    convert_scalar(value, field)
}

fn convert_scalar(value: &Value, field: &TableFieldSchema) -> Value {
    if value.is_null() {
        return Value::Null;
    }
    match field.field_type.as_str() {
        "RECORD" | "STRUCT" => convert_record(value, &field.fields),
        "INTEGER" | "INT64" => value
            .as_str()
            .and_then(|s| s.parse::<i64>().ok())
            .map(Value::from)
            .unwrap_or_else(|| value.clone()),
        "FLOAT" | "FLOAT64" => value
            .as_str()
            .and_then(|s| s.parse::<f64>().ok())
            .and_then(serde_json::Number::from_f64)
            .map(Value::Number)
            .unwrap_or_else(|| value.clone()),
        "BOOLEAN" | "BOOL" => match value.as_str() {
            Some("true") => Value::Bool(true),
            Some("false") => Value::Bool(false),
            _ => value.clone(),
        },
        _ => value.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn field(name: &str, ty: &str, mode: Option<&str>) -> TableFieldSchema {
        TableFieldSchema {
            name: name.to_string(),
            field_type: ty.to_string(),
            mode: mode.map(String::from),
            fields: vec![],
        }
    }

    #[test]
    fn converts_typed_scalars() {
        let fields = vec![
            field("id", "INTEGER", None),
            field("score", "FLOAT", None),
            field("active", "BOOLEAN", None),
            field("name", "STRING", None),
            field("missing", "STRING", Some("NULLABLE")),
        ];
        let row = json!({ "f": [
            { "v": "42" }, { "v": "1.5" }, { "v": "true" }, { "v": "ada" }, { "v": null }
        ]});

        assert_eq!(
            convert_record(&row, &fields),
            json!({ "id": 42, "score": 1.5, "active": true, "name": "ada", "missing": null })
        );
    }

    #[test]
    fn converts_nested_and_repeated_fields() {
        let mut address = field("address", "RECORD", None);
        address.fields = vec![field("city", "STRING", None), field("zip", "INTEGER", None)];
        let fields = vec![field("tags", "STRING", Some("REPEATED")), address];

        let row = json!({ "f": [
            { "v": [ { "v": "a" }, { "v": "b" } ] },
            { "v": { "f": [ { "v": "Oslo" }, { "v": "150" } ] } }
        ]});

        assert_eq!(
            convert_record(&row, &fields),
            json!({ "tags": ["a", "b"], "address": { "city": "Oslo", "zip": 150 } })
        );
    }

    #[test]
    fn large_int64_that_overflows_stays_a_string() {
        let fields = vec![field("big", "INT64", None)];
        let row = json!({ "f": [ { "v": "99999999999999999999" } ] });
        assert_eq!(convert_record(&row, &fields), json!({ "big": "99999999999999999999" }));
    }
}
