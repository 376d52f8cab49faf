//! Request handling shared by every runtime surface.
//!
//! Transports translate their native request into an [`ApiRequest`], call
//! [`RecordsApi::handle`], and translate the [`ApiResponse`] back. Errors are
//! mapped to a status code here and nowhere else.

pub mod lifecycle;
pub mod records;
pub mod validate;

pub use lifecycle::{LifecycleEvent, LifecycleResponse, RequestType, handle_lifecycle_event};

use crate::db::Connector;
use crate::error::{AppError, AppResult, ErrorKind};
use http::{Method, StatusCode};
use serde::Serialize;
use std::collections::HashMap;
use tracing::{info, warn};

pub const CONTENT_TYPE_JSON: &str = "application/json";
pub const CONTENT_TYPE_TEXT: &str = "text/plain; charset=utf-8";

/// CORS headers attached to every response.
pub const CORS_HEADERS: [(&str, &str); 3] = [
    ("Access-Control-Allow-Origin", "*"),
    ("Access-Control-Allow-Methods", "OPTIONS,POST,GET"),
    ("Access-Control-Allow-Headers", "Content-Type"),
];

/// Transport-neutral request.
#[derive(Debug, Clone)]
pub struct ApiRequest {
    pub method: Method,
    pub path: String,
    /// First value of each query-string parameter
    pub query: HashMap<String, String>,
}

impl ApiRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: HashMap::new(),
        }
    }

    pub fn with_query<K, V>(mut self, pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        for (key, value) in pairs {
            self.query.entry(key.into()).or_insert_with(|| value.into());
        }
        self
    }

    /// Build from a raw `a=1&b=2` query string.
    pub fn with_query_string(self, query: Option<&str>) -> Self {
        match query {
            Some(query) => {
                let pairs: Vec<(String, String)> = url::form_urlencoded::parse(query.as_bytes())
                    .into_owned()
                    .collect();
                self.with_query(pairs)
            }
            None => self,
        }
    }
}

/// Response envelope: `{statusCode, headers, body}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiResponse {
    #[serde(serialize_with = "serialize_status")]
    pub status_code: StatusCode,
    pub headers: HashMap<String, String>,
    pub body: String,
}

fn serialize_status<S: serde::Serializer>(status: &StatusCode, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_u16(status.as_u16())
}

impl ApiResponse {
    fn new(status_code: StatusCode, content_type: &str, body: String) -> Self {
        let mut headers: HashMap<String, String> = CORS_HEADERS
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        headers.insert("Content-Type".to_string(), content_type.to_string());
        Self {
            status_code,
            headers,
            body,
        }
    }

    pub fn json(status_code: StatusCode, body: String) -> Self {
        Self::new(status_code, CONTENT_TYPE_JSON, body)
    }

    pub fn text(status_code: StatusCode, body: impl Into<String>) -> Self {
        Self::new(status_code, CONTENT_TYPE_TEXT, body.into())
    }

    /// Map an error to the route's status; validation errors stay plain text.
    pub fn from_error(route: &Route, err: &AppError) -> Self {
        let status = route.failure_status(err);
        match err.kind() {
            ErrorKind::Validation => Self::text(status, err.to_string()),
            kind => {
                let body = serde_json::json!({
                    "error": err.to_string(),
                    "kind": kind,
                });
                Self::json(status, body.to_string())
            }
        }
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).map(String::as_str)
    }
}

/// Resolved route for a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    ListRecords,
    /// Raw id path segment; parsed by the handler
    GetRecord(String),
    UpdateFlags,
    Preflight,
    MethodNotAllowed,
    NotFound,
}

impl Route {
    /// Route on the trailing `records[/{id}]` segments so stage prefixes pass.
    pub fn resolve(method: &Method, path: &str) -> Self {
        let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
        let collection = segments.last() == Some(&"records");
        let item = segments.len() >= 2 && segments[segments.len() - 2] == "records";

        if *method == Method::OPTIONS && (collection || item) {
            return Self::Preflight;
        }
        if collection {
            return match *method {
                Method::GET => Self::ListRecords,
                Method::POST => Self::UpdateFlags,
                _ => Self::MethodNotAllowed,
            };
        }
        if item {
            return match *method {
                Method::GET => Self::GetRecord(segments[segments.len() - 1].to_string()),
                _ => Self::MethodNotAllowed,
            };
        }
        Self::NotFound
    }

    /// Status code for a failure on this route.
    ///
    /// Reads report credential and query failures as 500. The update route
    /// reports credential failures as 400 alongside validation errors.
    pub fn failure_status(&self, err: &AppError) -> StatusCode {
        match (self, err.kind()) {
            (_, ErrorKind::Validation) => StatusCode::BAD_REQUEST,
            (Route::UpdateFlags, ErrorKind::Credential) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::ListRecords => "list_records",
            Self::GetRecord(_) => "get_record",
            Self::UpdateFlags => "update_flags",
            Self::Preflight => "preflight",
            Self::MethodNotAllowed => "method_not_allowed",
            Self::NotFound => "not_found",
        }
    }
}

/// Records API over any connector.
#[derive(Debug, Clone)]
pub struct RecordsApi<C> {
    connector: C,
}

impl<C: Connector> RecordsApi<C> {
    pub fn new(connector: C) -> Self {
        Self { connector }
    }

    pub fn connector(&self) -> &C {
        &self.connector
    }

    /// Handle one request. Never fails; every error becomes a response.
    pub async fn handle(&self, request: &ApiRequest) -> ApiResponse {
        let route = Route::resolve(&request.method, &request.path);
        info!(
            method = %request.method,
            path = %request.path,
            route = route.name(),
            "Handling request"
        );

        let result = self.dispatch(&route, request).await;
        match result {
            Ok(response) => response,
            Err(err) => {
                warn!(
                    route = route.name(),
                    kind = %err.kind(),
                    sql_state = err.sql_state().unwrap_or("-"),
                    error = %err,
                    "Request failed"
                );
                ApiResponse::from_error(&route, &err)
            }
        }
    }

    async fn dispatch(&self, route: &Route, request: &ApiRequest) -> AppResult<ApiResponse> {
        match route {
            Route::ListRecords => {
                let rows = records::list_records(&self.connector).await?;
                Ok(ApiResponse::json(StatusCode::OK, json_body(&rows)?))
            }
            Route::GetRecord(raw_id) => {
                let id = validate::parse_record_id(raw_id)?;
                let body = match records::get_record(&self.connector, id).await? {
                    Some(row) => json_body(&row)?,
                    None => json_body(&"")?,
                };
                Ok(ApiResponse::json(StatusCode::OK, body))
            }
            Route::UpdateFlags => {
                let update = validate::parse_flag_update(&request.query)?;
                let outcome = records::update_flags(&self.connector, &update).await?;
                Ok(ApiResponse::json(StatusCode::OK, json_body(&outcome)?))
            }
            Route::Preflight => Ok(ApiResponse::text(StatusCode::OK, "")),
            Route::MethodNotAllowed => Ok(ApiResponse::text(
                StatusCode::METHOD_NOT_ALLOWED,
                "Method not allowed",
            )),
            Route::NotFound => Ok(ApiResponse::text(StatusCode::NOT_FOUND, "Not found")),
        }
    }
}

fn json_body<T: Serialize + ?Sized>(value: &T) -> AppResult<String> {
    serde_json::to_string(value)
        .map_err(|e| AppError::query(format!("Failed to serialize response: {}", e), None))
}
