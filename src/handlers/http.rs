use std::collections::HashMap;

use axum::{
    extract::{Query, State},
    http::{HeaderName, HeaderValue, Method, StatusCode, Uri},
    response::{IntoResponse, Response},
};
use serde_json::{json, Value};
use tracing::warn;

use crate::{models::ApiGatewayResponse, AppState};

/// Local stand-in for API Gateway: turns a plain HTTP request into a proxy event,
/// runs it through the dispatcher and replays the envelope as an HTTP response.
pub async fn proxy(
    State(state): State<AppState>,
    method: Method,
    uri: Uri,
    body: String,
) -> Response {
    let event = proxy_event(&method, &uri, body);
    let envelope = super::dispatch(state.store.as_ref(), event).await;
    into_http(envelope)
}

fn proxy_event(method: &Method, uri: &Uri, body: String) -> Value {
    let query = uri.query().map(|_| {
        Query::<HashMap<String, String>>::try_from_uri(uri)
            .map(|Query(params)| params)
            .unwrap_or_default()
    });

    json!({
        "httpMethod": method.as_str(),
        "path": uri.path(),
        "queryStringParameters": query,
        "body": (!body.is_empty()).then_some(body),
    })
}

fn into_http(envelope: ApiGatewayResponse) -> Response {
    let status = StatusCode::from_u16(envelope.status_code).unwrap_or(StatusCode::BAD_REQUEST);
    let mut response = (status, envelope.body).into_response();

    for (name, value) in &envelope.headers {
        match (
            HeaderName::try_from(name.as_str()),
            HeaderValue::try_from(value.as_str()),
        ) {
            (Ok(name), Ok(value)) => {
                response.headers_mut().insert(name, value);
            }
            _ => warn!(header = %name, "Dropping header that is not valid HTTP"),
        }
    }

    response
}
