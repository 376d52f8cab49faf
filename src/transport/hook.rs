//! Lambda transport for infrastructure lifecycle events.
//!
//! The hook returns its response to the runtime and, when the event carries a
//! pre-signed `ResponseURL`, also uploads it there. A failed upload is logged;
//! the runtime still receives the success response. Payloads are taken as raw
//! JSON so that one which does not parse is still answered.

use crate::db::Connector;
use crate::handlers::{LifecycleEvent, LifecycleResponse, handle_lifecycle_event};
use serde::Deserialize;
use serde_json::Value;
use crate::transport::{BoxError, Transport};
use lambda_runtime::{LambdaEvent, service_fn};
use reqwest::header::CONTENT_TYPE;
use std::sync::Arc;
use tracing::{error, info};

pub struct HookTransport<C> {
    connector: Arc<C>,
    client: reqwest::Client,
}

impl<C: Connector + 'static> HookTransport<C> {
    pub fn new(connector: C) -> Self {
        Self {
            connector: Arc::new(connector),
            client: reqwest::Client::new(),
        }
    }
}

impl<C: Connector + 'static> Transport for HookTransport<C> {
    async fn run(self) -> Result<(), BoxError> {
        info!("Starting lifecycle hook on the Lambda runtime");
        let connector = self.connector;
        let client = self.client;
        lambda_runtime::run(service_fn(move |event: LambdaEvent<Value>| {
            let connector = connector.clone();
            let client = client.clone();
            async move {
                let response = handle_hook_payload(connector.as_ref(), &client, &event.payload).await;
                Ok::<LifecycleResponse, BoxError>(response)
            }
        }))
        .await
    }

    fn name(&self) -> &'static str {
        "hook"
    }
}

/// Handle a raw lifecycle payload.
///
/// A payload that is not a valid lifecycle event never touches the database,
/// but is still reported to its `ResponseURL` so the stack is not left waiting.
pub async fn handle_hook_payload<C: Connector>(
    connector: &C,
    client: &reqwest::Client,
    payload: &Value,
) -> LifecycleResponse {
    match LifecycleEvent::deserialize(payload) {
        Ok(event) => handle_hook_event(connector, client, &event).await,
        Err(e) => {
            error!(error = %e, "Unrecognized lifecycle event; reporting success without bootstrapping");
            let response = LifecycleResponse::unrecognized(payload, &e);
            let url = payload.get("ResponseURL").and_then(Value::as_str);
            if let Some(url) = url.filter(|url| !url.is_empty()) {
                send_response(client, url, &response).await;
            }
            response
        }
    }
}

/// Handle one lifecycle event and report it to the response URL, if any.
pub async fn handle_hook_event<C: Connector>(
    connector: &C,
    client: &reqwest::Client,
    event: &LifecycleEvent,
) -> LifecycleResponse {
    let response = handle_lifecycle_event(connector, event).await;
    if let Some(url) = event.response_url.as_deref().filter(|url| !url.is_empty()) {
        send_response(client, url, &response).await;
    }
    response
}

async fn send_response(client: &reqwest::Client, url: &str, response: &LifecycleResponse) {
    let body = match serde_json::to_vec(response) {
        Ok(body) => body,
        Err(e) => {
            error!(error = %e, "Failed to serialize lifecycle response");
            return;
        }
    };

    // Pre-signed S3 URLs are signed without a content type.
    let result = client
        .put(url)
        .header(CONTENT_TYPE, "")
        .body(body)
        .send()
        .await
        .and_then(|r| r.error_for_status());

    match result {
        Ok(r) => info!(status = %r.status(), "Reported lifecycle response"),
        Err(e) => error!(error = %e, "Failed to report lifecycle response"),
    }
}
