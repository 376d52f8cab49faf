//! Lambda transport for API Gateway proxy events.

use crate::db::Connector;
use crate::handlers::{ApiRequest, ApiResponse, RecordsApi};
use crate::transport::{BoxError, Transport};
use lambda_http::{Body, Request, RequestExt, Response, service_fn};
use std::sync::Arc;
use tracing::info;

/// Serves the records routes as an API Gateway proxy integration.
pub struct LambdaTransport<C> {
    api: Arc<RecordsApi<C>>,
}

impl<C: Connector + 'static> LambdaTransport<C> {
    pub fn new(api: RecordsApi<C>) -> Self {
        Self { api: Arc::new(api) }
    }
}

impl<C: Connector + 'static> Transport for LambdaTransport<C> {
    async fn run(self) -> Result<(), BoxError> {
        info!("Starting records handler on the Lambda runtime");
        let api = self.api;
        lambda_http::run(service_fn(move |request: Request| {
            let api = api.clone();
            async move { handle_lambda_request(&api, request).await }
        }))
        .await
    }

    fn name(&self) -> &'static str {
        "lambda"
    }
}

/// Handle one proxy event.
pub async fn handle_lambda_request<C: Connector>(
    api: &RecordsApi<C>,
    request: Request,
) -> Result<Response<Body>, BoxError> {
    let api_request = to_api_request(&request);
    let response = api.handle(&api_request).await;
    into_lambda_response(response)
}

fn to_api_request(request: &Request) -> ApiRequest {
    let params = request.query_string_parameters();
    let pairs: Vec<(String, String)> = params
        .iter()
        .map(|(name, value)| (name.to_string(), value.to_string()))
        .collect();
    ApiRequest::new(request.method().clone(), request.uri().path()).with_query(pairs)
}

fn into_lambda_response(response: ApiResponse) -> Result<Response<Body>, BoxError> {
    let mut builder = Response::builder().status(response.status_code);
    for (name, value) in &response.headers {
        builder = builder.header(name.as_str(), value.as_str());
    }
    let body = if response.body.is_empty() {
        Body::Empty
    } else {
        Body::Text(response.body)
    };
    Ok(builder.body(body)?)
}
