//! Infrastructure lifecycle hook.
//!
//! The provisioning system sends a custom-resource event on stack create,
//! update, and delete. Create and update bootstrap the table; delete does
//! nothing. The hook always answers `SUCCESS`: a bootstrap failure is logged
//! and reported in `Reason`, never raised, so the stack operation is not left
//! waiting on a failed signal.

use crate::db::Connector;
use crate::handlers::records::bootstrap_table;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{error, info};

/// Physical id reported when the event does not carry one yet.
pub const DEFAULT_PHYSICAL_RESOURCE_ID: &str = "sampleapp-table-bootstrap";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RequestType {
    Create,
    Update,
    Delete,
}

impl RequestType {
    pub fn runs_bootstrap(&self) -> bool {
        matches!(self, Self::Create | Self::Update)
    }
}

/// Custom-resource request as delivered by the provisioning system.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct LifecycleEvent {
    pub request_type: RequestType,
    /// Pre-signed URL the response must be PUT to, when the hook reports directly
    #[serde(rename = "ResponseURL", default)]
    pub response_url: Option<String>,
    #[serde(default)]
    pub stack_id: String,
    #[serde(default)]
    pub request_id: String,
    #[serde(default)]
    pub logical_resource_id: String,
    #[serde(default)]
    pub physical_resource_id: Option<String>,
    #[serde(default)]
    pub resource_type: Option<String>,
    #[serde(default)]
    pub resource_properties: Value,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ResponseStatus {
    Success,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct LifecycleData {
    pub bootstrapped: bool,
}

/// Response reported back to the provisioning system.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct LifecycleResponse {
    pub status: ResponseStatus,
    pub reason: String,
    pub physical_resource_id: String,
    pub stack_id: String,
    pub request_id: String,
    pub logical_resource_id: String,
    pub data: LifecycleData,
}

impl LifecycleResponse {
    /// Answer a payload that is not a recognizable lifecycle event, echoing
    /// whatever identifiers it carries.
    pub fn unrecognized(payload: &Value, reason: impl std::fmt::Display) -> Self {
        let field = |name: &str| {
            payload
                .get(name)
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string()
        };
        let physical_resource_id = Some(field("PhysicalResourceId"))
            .filter(|id| !id.is_empty())
            .unwrap_or_else(|| DEFAULT_PHYSICAL_RESOURCE_ID.to_string());

        Self {
            status: ResponseStatus::Success,
            reason: format!("Unrecognized lifecycle event: {}", reason),
            physical_resource_id,
            stack_id: field("StackId"),
            request_id: field("RequestId"),
            logical_resource_id: field("LogicalResourceId"),
            data: LifecycleData {
                bootstrapped: false,
            },
        }
    }
}

/// Handle one lifecycle event; always yields a `SUCCESS` response.
pub async fn handle_lifecycle_event<C: Connector>(
    connector: &C,
    event: &LifecycleEvent,
) -> LifecycleResponse {
    info!(
        request_type = ?event.request_type,
        logical_resource_id = %event.logical_resource_id,
        request_id = %event.request_id,
        "Received lifecycle event"
    );

    let (bootstrapped, reason) = if event.request_type.runs_bootstrap() {
        match bootstrap_table(connector).await {
            Ok(()) => (true, "Table bootstrapped".to_string()),
            Err(e) => {
                error!(error = %e, kind = %e.kind(), "Bootstrap failed; reporting success anyway");
                (false, format!("Bootstrap skipped after error: {}", e))
            }
        }
    } else {
        (false, "Nothing to do on delete".to_string())
    };

    LifecycleResponse {
        status: ResponseStatus::Success,
        reason,
        physical_resource_id: event
            .physical_resource_id
            .clone()
            .filter(|id| !id.is_empty())
            .unwrap_or_else(|| DEFAULT_PHYSICAL_RESOURCE_ID.to_string()),
        stack_id: event.stack_id.clone(),
        request_id: event.request_id.clone(),
        logical_resource_id: event.logical_resource_id.clone(),
        data: LifecycleData { bootstrapped },
    }
}
