//! BigQuery toolset behaviour against a mock BigQuery endpoint.

mod common;

use common::*;
use porygon_agent::agents::tools::bigquery::{
    bigquery_toolset_from_config, get_bigquery_toolset, BigQueryClient, BigQueryToolConfig,
    BigQueryToolset, WriteMode,
};
use porygon_agent::agents::tools::{AgentTool, ToolContext, Toolset};
use porygon_agent::auth::{ServiceAccountCredentials, StaticTokenProvider, BIGQUERY_SCOPES};
use porygon_agent::config::BigQueryConfig;
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use std::sync::Arc;
use wiremock::matchers::{body_partial_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn toolset(server: &MockServer, write_mode: WriteMode) -> BigQueryToolset {
    let client = BigQueryClient::new(Arc::new(StaticTokenProvider::new("ya29.bq")))
        .with_base_url(server.uri());
    BigQueryToolset::with_client(
        client,
        Some("porygon-pipelines".to_string()),
        BigQueryToolConfig::new(write_mode).with_max_query_result_rows(2),
    )
}

fn tool(toolset: &BigQueryToolset, name: &str) -> Arc<dyn AgentTool> {
    toolset
        .tools()
        .into_iter()
        .find(|t| t.info().name == name)
        .unwrap()
}

async fn mount_dry_run(server: &MockServer, statement_type: &str) {
    Mock::given(method("POST"))
        .and(path("/projects/porygon-pipelines/jobs"))
        .and(body_partial_json(json!({ "configuration": { "dryRun": true } })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "statistics": {
                "totalBytesProcessed": "1024",
                "query": { "statementType": statement_type }
            }
        })))
        .mount(server)
        .await;
}

fn query_response() -> Value {
    json!({
        "jobComplete": true,
        "totalRows": "3",
        "schema": { "fields": [
            { "name": "name", "type": "STRING", "mode": "NULLABLE" },
            { "name": "total", "type": "INTEGER", "mode": "NULLABLE" }
        ]},
        "rows": [
            { "f": [ { "v": "alpha" }, { "v": "10" } ] },
            { "f": [ { "v": "beta" }, { "v": "7" } ] }
        ]
    })
}

#[test]
fn factory_always_blocks_writes() {
    let credentials = Arc::new(
        ServiceAccountCredentials::from_json(&key_json("http://unused/token"), &BIGQUERY_SCOPES)
            .unwrap(),
    );

    let toolset = get_bigquery_toolset(credentials.clone());
    assert_eq!(toolset.write_mode(), WriteMode::Blocked);
    assert_eq!(toolset.default_project(), Some("porygon-pipelines"));

    let config = BigQueryConfig {
        max_query_result_rows: 500,
        default_project: Some("analytics".to_string()),
        ..BigQueryConfig::default()
    };
    let toolset = bigquery_toolset_from_config(credentials, &config);
    assert_eq!(toolset.write_mode(), WriteMode::Blocked);
    assert_eq!(toolset.tool_config().max_query_result_rows, 500);
    assert_eq!(toolset.default_project(), Some("analytics"));
}

#[tokio::test]
async fn blocked_mode_refuses_mutations_without_running_them() {
    let server = MockServer::start().await;
    mount_dry_run(&server, "DELETE").await;
    Mock::given(method("POST"))
        .and(path("/projects/porygon-pipelines/queries"))
        .respond_with(ResponseTemplate::new(200).set_body_json(query_response()))
        .expect(0)
        .mount(&server)
        .await;

    let toolset = toolset(&server, WriteMode::Blocked);
    let result = tool(&toolset, "bigquery.execute_sql")
        .execute(
            json!({ "query": "DELETE FROM sales.orders WHERE TRUE" }),
            &ToolContext::new("root_agent"),
        )
        .await
        .unwrap();

    assert!(result.is_error);
    assert_eq!(
        result.to_response(),
        json!({
            "status": "ERROR",
            "errorDetails": "Read-only mode only supports SELECT statements."
        })
    );
}

#[tokio::test]
async fn blocked_mode_refuses_scripts() {
    let server = MockServer::start().await;
    mount_dry_run(&server, "SCRIPT").await;

    let toolset = toolset(&server, WriteMode::Blocked);
    let result = tool(&toolset, "bigquery.execute_sql")
        .execute(
            json!({ "query": "SELECT 1; DROP TABLE sales.orders" }),
            &ToolContext::new("root_agent"),
        )
        .await
        .unwrap();
    assert!(result.is_error);
}

#[tokio::test]
async fn blocked_mode_runs_selects() {
    let server = MockServer::start().await;
    mount_dry_run(&server, "SELECT").await;
    Mock::given(method("POST"))
        .and(path("/projects/porygon-pipelines/queries"))
        .and(header("Authorization", "Bearer ya29.bq"))
        .and(body_partial_json(json!({ "useLegacySql": false, "maxResults": 2 })))
        .respond_with(ResponseTemplate::new(200).set_body_json(query_response()))
        .expect(1)
        .mount(&server)
        .await;

    let toolset = toolset(&server, WriteMode::Blocked);
    let result = tool(&toolset, "bigquery.execute_sql")
        .execute(
            json!({ "query": "SELECT name, total FROM sales.summary" }),
            &ToolContext::new("root_agent"),
        )
        .await
        .unwrap();

    assert!(!result.is_error);
    assert_eq!(
        result.to_response(),
        json!({
            "status": "SUCCESS",
            "rows": [
                { "name": "alpha", "total": 10 },
                { "name": "beta", "total": 7 }
            ],
            "resultIsLikelyTruncated": true
        })
    );
}

#[tokio::test]
async fn allowed_mode_skips_dry_run() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/projects/porygon-pipelines/jobs"))
        .respond_with(ResponseTemplate::new(500))
        .expect(0)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/projects/porygon-pipelines/queries"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "jobComplete": true,
            "schema": { "fields": [] },
            "totalRows": "0"
        })))
        .mount(&server)
        .await;

    let toolset = toolset(&server, WriteMode::Allowed);
    let result = tool(&toolset, "bigquery.execute_sql")
        .execute(
            json!({ "query": "INSERT INTO t VALUES (1)" }),
            &ToolContext::new("root_agent"),
        )
        .await
        .unwrap();
    assert_eq!(result.to_response(), json!({ "status": "SUCCESS", "rows": [] }));
}

#[tokio::test]
async fn incomplete_job_is_polled_until_done() {
    let server = MockServer::start().await;
    mount_dry_run(&server, "SELECT").await;
    Mock::given(method("POST"))
        .and(path("/projects/porygon-pipelines/queries"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "jobComplete": false,
            "jobReference": { "projectId": "porygon-pipelines", "jobId": "job_123", "location": "EU" }
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/projects/porygon-pipelines/queries/job_123"))
        .and(query_param("location", "EU"))
        .respond_with(ResponseTemplate::new(200).set_body_json(query_response()))
        .expect(1)
        .mount(&server)
        .await;

    let toolset = toolset(&server, WriteMode::Blocked);
    let result = tool(&toolset, "bigquery.execute_sql")
        .execute(json!({ "query": "SELECT 1" }), &ToolContext::new("root_agent"))
        .await
        .unwrap();
    assert!(!result.is_error);
}

#[tokio::test]
async fn lists_datasets_across_pages() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/projects/porygon-pipelines/datasets"))
        .and(query_param("pageToken", "p2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "datasets": [ { "datasetReference": { "datasetId": "marts" } } ]
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/projects/porygon-pipelines/datasets"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "datasets": [ { "datasetReference": { "datasetId": "raw" } } ],
            "nextPageToken": "p2"
        })))
        .mount(&server)
        .await;

    let toolset = toolset(&server, WriteMode::Blocked);
    let result = tool(&toolset, "bigquery.list_dataset_ids")
        .execute(json!({}), &ToolContext::new("root_agent"))
        .await
        .unwrap();
    assert_eq!(result.json, Some(json!(["raw", "marts"])));
}

#[tokio::test]
async fn table_info_not_found_is_tool_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/projects/other/datasets/sales/tables/missing"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "error": { "code": 404, "message": "Not found: Table other:sales.missing", "status": "NOT_FOUND" }
        })))
        .mount(&server)
        .await;

    let toolset = toolset(&server, WriteMode::Blocked);
    let result = tool(&toolset, "bigquery.get_table_info")
        .execute(
            json!({ "projectId": "other", "datasetId": "sales", "tableId": "missing" }),
            &ToolContext::new("root_agent"),
        )
        .await
        .unwrap();
    assert!(result.is_error);
    assert!(result.text.unwrap().contains("NOT_FOUND"));
}

#[tokio::test]
async fn missing_required_parameter_is_an_error() {
    let server = MockServer::start().await;
    let toolset = toolset(&server, WriteMode::Blocked);
    let err = tool(&toolset, "bigquery.list_table_ids")
        .execute(json!({}), &ToolContext::new("root_agent"))
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "Missing required parameter: datasetId");
}

#[tokio::test]
async fn ids_are_confined_to_their_own_path_segment() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/projects/porygon-pipelines/datasets/sales/tables/orders"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "porygon-pipelines:sales.orders",
            "kind": "bigquery#table"
        })))
        .expect(0)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/projects/porygon-pipelines/other-project/datasets/secret"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "kind": "bigquery#dataset" })))
        .expect(0)
        .mount(&server)
        .await;

    let toolset = toolset(&server, WriteMode::Blocked);
    let dataset_info = tool(&toolset, "bigquery.get_dataset_info");
    for dataset in ["sales/tables/orders", "x/../../other-project/datasets/secret"] {
        let result = dataset_info
            .execute(json!({ "datasetId": dataset }), &ToolContext::new("root_agent"))
            .await
            .unwrap();
        assert!(result.is_error, "{dataset} reached another resource");
    }
}

#[tokio::test]
async fn dot_segment_ids_are_refused_before_any_request() {
    let server = MockServer::start().await;
    let toolset = toolset(&server, WriteMode::Blocked);

    let result = tool(&toolset, "bigquery.get_table_info")
        .execute(
            json!({ "datasetId": "..", "tableId": "orders" }),
            &ToolContext::new("root_agent"),
        )
        .await
        .unwrap();

    assert!(result.is_error);
    assert_eq!(result.text.as_deref(), Some("invalid resource id '..'"));
    assert!(server.received_requests().await.unwrap().is_empty());
}
