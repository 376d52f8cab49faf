//! Integration tests for the records API routes.

mod common;

use common::MemoryConnector;
use http::{Method, StatusCode};
use sampleapp_records::db::statements::{SELECT_ALL_SQL, SELECT_BY_ID_SQL, UPDATE_FLAGS_SQL};
use sampleapp_records::error::ErrorKind;
use sampleapp_records::handlers::{ApiRequest, CONTENT_TYPE_TEXT, RecordsApi};
use sampleapp_records::models::QueryParam;

const EXAMPLE_UPDATE: &str = "id=1&job0001_flag=true&job0002_flag=false&job0003_flag=true&job0004_flag=true&job0005_flag=false";

fn post(query: &str) -> ApiRequest {
    ApiRequest::new(Method::POST, "/records").with_query_string(Some(query))
}

fn get(path: &str) -> ApiRequest {
    ApiRequest::new(Method::GET, path)
}

#[tokio::test]
async fn test_update_example_sets_flags() {
    let connector = MemoryConnector::seeded();
    let api = RecordsApi::new(connector.clone());

    let response = api.handle(&post(EXAMPLE_UPDATE)).await;

    assert_eq!(response.status_code, StatusCode::OK);
    let body: serde_json::Value = serde_json::from_str(&response.body).unwrap();
    assert_eq!(body["rows_affected"], 1);
    assert_eq!(connector.rows()[0].flags(), [true, false, true, true, false]);
}

#[tokio::test]
async fn test_update_issues_exactly_one_positional_statement() {
    let connector = MemoryConnector::seeded();
    let api = RecordsApi::new(connector.clone());

    api.handle(&post(EXAMPLE_UPDATE)).await;

    let statements = connector.statements();
    assert_eq!(statements.len(), 1);
    assert_eq!(statements[0].sql, UPDATE_FLAGS_SQL);
    assert_eq!(
        statements[0].params,
        vec![
            QueryParam::Bool(true),
            QueryParam::Bool(false),
            QueryParam::Bool(true),
            QueryParam::Bool(true),
            QueryParam::Bool(false),
            QueryParam::Int(1),
        ]
    );
    assert_eq!(connector.connects(), 1);
    assert_eq!(connector.closes(), 1);
}

#[tokio::test]
async fn test_update_values_never_reach_sql_text() {
    let connector = MemoryConnector::seeded();
    let api = RecordsApi::new(connector.clone());

    api.handle(&post(
        "id=7&job0001_flag=false&job0002_flag=false&job0003_flag=false&job0004_flag=false&job0005_flag=true",
    ))
    .await;

    let statements = connector.statements();
    assert_eq!(statements.len(), 1);
    assert!(!statements[0].sql.contains('7'));
    assert_eq!(statements[0].params[5], QueryParam::Int(7));
}

#[tokio::test]
async fn test_update_missing_parameters_is_400_without_connecting() {
    let connector = MemoryConnector::seeded();
    let api = RecordsApi::new(connector.clone());

    let response = api.handle(&post("id=1")).await;

    assert_eq!(response.status_code, StatusCode::BAD_REQUEST);
    assert!(response.body.contains("Missing required query parameters"));
    assert_eq!(response.header("Content-Type"), Some(CONTENT_TYPE_TEXT));
    assert_eq!(connector.connects(), 0);
    assert!(connector.statements().is_empty());
}

#[tokio::test]
async fn test_update_without_any_parameters() {
    let connector = MemoryConnector::seeded();
    let api = RecordsApi::new(connector.clone());

    let response = api.handle(&ApiRequest::new(Method::POST, "/records")).await;

    assert_eq!(response.status_code, StatusCode::BAD_REQUEST);
    assert!(response.body.contains("id"));
    assert_eq!(connector.connects(), 0);
}

#[tokio::test]
async fn test_update_rejects_non_literal_flags() {
    for bad in ["1", "yes", "TRUE", "tru"] {
        let connector = MemoryConnector::seeded();
        let api = RecordsApi::new(connector.clone());
        let query = EXAMPLE_UPDATE.replace("job0002_flag=false", &format!("job0002_flag={}", bad));

        let response = api.handle(&post(&query)).await;

        assert_eq!(response.status_code, StatusCode::BAD_REQUEST, "accepted {:?}", bad);
        assert!(response.body.contains("job0002_flag"));
        assert_eq!(connector.connects(), 0);
    }
}

#[tokio::test]
async fn test_update_rejects_non_integer_id() {
    let connector = MemoryConnector::seeded();
    let api = RecordsApi::new(connector.clone());
    let query = EXAMPLE_UPDATE.replace("id=1", "id=one");

    let response = api.handle(&post(&query)).await;

    assert_eq!(response.status_code, StatusCode::BAD_REQUEST);
    assert_eq!(connector.connects(), 0);
}

#[tokio::test]
async fn test_update_unknown_id_affects_nothing() {
    let connector = MemoryConnector::seeded();
    let api = RecordsApi::new(connector.clone());
    let query = EXAMPLE_UPDATE.replace("id=1", "id=404");

    let response = api.handle(&post(&query)).await;

    assert_eq!(response.status_code, StatusCode::OK);
    let body: serde_json::Value = serde_json::from_str(&response.body).unwrap();
    assert_eq!(body["rows_affected"], 0);
}

#[tokio::test]
async fn test_update_credential_failure_is_400() {
    let connector = MemoryConnector::failing(ErrorKind::Credential, "AccessDenied");
    let api = RecordsApi::new(connector);

    let response = api.handle(&post(EXAMPLE_UPDATE)).await;

    assert_eq!(response.status_code, StatusCode::BAD_REQUEST);
    let body: serde_json::Value = serde_json::from_str(&response.body).unwrap();
    assert_eq!(body["kind"], "credential");
    assert!(body["error"].as_str().unwrap().contains("AccessDenied"));
}

#[tokio::test]
async fn test_update_query_failure_is_500() {
    // No table: the UPDATE itself fails
    let connector = MemoryConnector::new();
    let api = RecordsApi::new(connector);

    let response = api.handle(&post(EXAMPLE_UPDATE)).await;

    assert_eq!(response.status_code, StatusCode::INTERNAL_SERVER_ERROR);
    let body: serde_json::Value = serde_json::from_str(&response.body).unwrap();
    assert_eq!(body["kind"], "query");
}

#[tokio::test]
async fn test_list_returns_json_array() {
    let connector = MemoryConnector::seeded();
    let api = RecordsApi::new(connector.clone());

    let response = api.handle(&get("/records")).await;

    assert_eq!(response.status_code, StatusCode::OK);
    let body: serde_json::Value = serde_json::from_str(&response.body).unwrap();
    let rows = body.as_array().unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["id"], 1);
    assert_eq!(rows[0]["job0001_flag"], false);

    let statements = connector.statements();
    assert_eq!(statements.len(), 1);
    assert_eq!(statements[0].sql, SELECT_ALL_SQL);
}

#[tokio::test]
async fn test_list_failures_are_500() {
    for connector in [
        MemoryConnector::failing(ErrorKind::Credential, "secret not found"),
        MemoryConnector::new(),
    ] {
        let api = RecordsApi::new(connector);
        let response = api.handle(&get("/records")).await;
        assert_eq!(response.status_code, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(serde_json::from_str::<serde_json::Value>(&response.body).is_ok());
    }
}

#[tokio::test]
async fn test_get_existing_record_returns_object() {
    let connector = MemoryConnector::seeded();
    let api = RecordsApi::new(connector.clone());

    let response = api.handle(&get("/records/1")).await;

    assert_eq!(response.status_code, StatusCode::OK);
    let body: serde_json::Value = serde_json::from_str(&response.body).unwrap();
    assert!(body.is_object());
    assert_eq!(body["name"], "sampleapp");

    let statements = connector.statements();
    assert_eq!(statements[0].sql, SELECT_BY_ID_SQL);
    assert_eq!(statements[0].params, vec![QueryParam::Int(1)]);
}

#[tokio::test]
async fn test_get_missing_record_returns_empty_string() {
    let connector = MemoryConnector::seeded();
    let api = RecordsApi::new(connector);

    let response = api.handle(&get("/records/99")).await;

    assert_eq!(response.status_code, StatusCode::OK);
    assert_eq!(response.body, "\"\"");
}

#[tokio::test]
async fn test_get_invalid_id_is_400() {
    let connector = MemoryConnector::seeded();
    let api = RecordsApi::new(connector.clone());

    let response = api.handle(&get("/records/abc")).await;

    assert_eq!(response.status_code, StatusCode::BAD_REQUEST);
    assert_eq!(connector.connects(), 0);
}

#[tokio::test]
async fn test_preflight_and_unknown_routes_skip_database() {
    let connector = MemoryConnector::seeded();
    let api = RecordsApi::new(connector.clone());

    let preflight = api.handle(&ApiRequest::new(Method::OPTIONS, "/records")).await;
    assert_eq!(preflight.status_code, StatusCode::OK);
    assert_eq!(preflight.header("Access-Control-Allow-Methods"), Some("OPTIONS,POST,GET"));

    let missing = api.handle(&get("/nope")).await;
    assert_eq!(missing.status_code, StatusCode::NOT_FOUND);

    let wrong_method = api.handle(&ApiRequest::new(Method::PUT, "/records")).await;
    assert_eq!(wrong_method.status_code, StatusCode::METHOD_NOT_ALLOWED);

    assert_eq!(connector.connects(), 0);
}

#[tokio::test]
async fn test_each_request_opens_and_closes_its_own_connection() {
    let connector = MemoryConnector::seeded();
    let api = RecordsApi::new(connector.clone());

    api.handle(&get("/records")).await;
    api.handle(&get("/records/1")).await;
    api.handle(&post(EXAMPLE_UPDATE)).await;

    assert_eq!(connector.connects(), 3);
    assert_eq!(connector.closes(), 3);
}
