use crate::config::Config;
use crate::mcp::*;
use crate::tools::ToolSet;
use axum::body::{to_bytes, Body};
use axum::extract::{Request as HttpRequest, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response as HttpResponse};
use axum::routing::get;
use axum::Router;
use log::{debug, error, info};
use serde::Serialize;
use serde_json::Value;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use uuid::Uuid;

pub const HEALTH_TEXT: &str = "OK - github-mcp";
const MAX_BODY_BYTES: usize = 4 * 1024 * 1024;

#[derive(Clone)]
pub struct AppState {
    config: Arc<Config>,
}

pub fn router(config: Config) -> Router {
    let state = AppState {
        config: Arc::new(config),
    };
    Router::new()
        .route("/", get(health))
        .route(
            "/mcp",
            axum::routing::post(handle_mcp)
                .get(method_not_allowed)
                .delete(method_not_allowed),
        )
        .with_state(state)
}

/// Bind and serve until ctrl-c.
pub async fn serve(config: Config) -> anyhow::Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    info!(
        "Starting github-mcp HTTP server on {} (api={}); protocol={}",
        addr, config.api_url, PROTOCOL_VERSION
    );
    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, router(config))
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    info!("github-mcp stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("failed to listen for shutdown signal: {}", e);
    }
}

async fn health() -> &'static str {
    HEALTH_TEXT
}

async fn method_not_allowed() -> HttpResponse {
    json_response(
        StatusCode::METHOD_NOT_ALLOWED,
        &rpc_error(None, SERVER_ERROR, "Method not allowed."),
    )
}

fn json_response<T: Serialize>(status: StatusCode, resp: &T) -> HttpResponse {
    match serde_json::to_vec(resp) {
        Ok(body) => (status, [(header::CONTENT_TYPE, "application/json")], body).into_response(),
        Err(e) => {
            error!("failed to encode response: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

/// One protocol session per HTTP request; dropped when the request completes.
async fn handle_mcp(State(state): State<AppState>, req: HttpRequest<Body>) -> HttpResponse {
    let session = Uuid::new_v4();
    let bytes = match to_bytes(req.into_body(), MAX_BODY_BYTES).await {
        Ok(b) => b,
        Err(e) => {
            error!("session {}: failed to read request body: {}", session, e);
            return json_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                &rpc_error(None, INTERNAL_ERROR, "Internal server error"),
            );
        }
    };

    let raw: Value = match serde_json::from_slice(&bytes) {
        Ok(v) => v,
        Err(e) => {
            return json_response(
                StatusCode::BAD_REQUEST,
                &rpc_error(None, PARSE_ERROR, &format!("Parse error: {}", e)),
            );
        }
    };

    let tools = match ToolSet::new(&state.config) {
        Ok(t) => t,
        Err(e) => {
            error!("session {}: failed to build GitHub client: {}", session, e);
            return json_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                &rpc_error(None, INTERNAL_ERROR, "Internal server error"),
            );
        }
    };

    let resp = match raw {
        Value::Array(items) if items.is_empty() => json_response(
            StatusCode::BAD_REQUEST,
            &rpc_error(None, INVALID_REQUEST, "Invalid request: empty batch"),
        ),
        Value::Array(items) => {
            debug!("session {}: batch of {}", session, items.len());
            let mut replies = Vec::new();
            for item in items {
                match classify(item) {
                    Incoming::Call(req) if req.is_notification() => {
                        debug!("session {}: notification {}", session, req.method);
                    }
                    Incoming::Call(req) => replies.push(dispatch(&tools, req).await),
                    Incoming::Reply => {}
                    Incoming::Invalid(err) => replies.push(err),
                }
            }
            if replies.is_empty() {
                StatusCode::ACCEPTED.into_response()
            } else {
                json_response(StatusCode::OK, &replies)
            }
        }
        single => match classify(single) {
            Incoming::Call(req) if req.is_notification() => {
                debug!("session {}: notification {}", session, req.method);
                StatusCode::ACCEPTED.into_response()
            }
            Incoming::Call(req) => {
                debug!("session {}: method={}", session, req.method);
                json_response(StatusCode::OK, &dispatch(&tools, req).await)
            }
            Incoming::Reply => StatusCode::ACCEPTED.into_response(),
            Incoming::Invalid(err) => json_response(StatusCode::BAD_REQUEST, &err),
        },
    };
    debug!("session {}: closed", session);
    resp
}

/// A single JSON-RPC message posted by the client.
enum Incoming {
    Call(Request),
    /// A response to a server-initiated request; nothing to answer.
    Reply,
    Invalid(Response),
}

fn classify(msg: Value) -> Incoming {
    let Some(obj) = msg.as_object() else {
        return Incoming::Invalid(rpc_error(
            None,
            INVALID_REQUEST,
            "Invalid request: expected a JSON-RPC object",
        ));
    };
    if !obj.contains_key("method") {
        if obj.contains_key("result") || obj.contains_key("error") {
            return Incoming::Reply;
        }
        let id = obj.get("id").cloned().and_then(|v| serde_json::from_value(v).ok());
        return Incoming::Invalid(rpc_error(
            id,
            INVALID_REQUEST,
            "Invalid request: missing method",
        ));
    }
    let req: Request = match serde_json::from_value(msg) {
        Ok(r) => r,
        Err(e) => {
            return Incoming::Invalid(rpc_error(
                None,
                INVALID_REQUEST,
                &format!("Invalid request: {}", e),
            ))
        }
    };
    if req.jsonrpc != "2.0" {
        return Incoming::Invalid(rpc_error(
            req.id,
            INVALID_REQUEST,
            "Invalid request: jsonrpc must be \"2.0\"",
        ));
    }
    Incoming::Call(req)
}

pub async fn dispatch(tools: &ToolSet, req: Request) -> Response {
    match req.method.as_str() {
        "initialize" => rpc_ok(req.id, initialize_result()),
        "ping" => rpc_ok(req.id, serde_json::json!({})),
        "tools/list" => rpc_ok(req.id, serde_json::json!({ "tools": tools.descriptors() })),
        "tools/call" => handle_tools_call(tools, req.id, req.params).await,
        other => rpc_error(req.id, METHOD_NOT_FOUND, &format!("Method not found: {}", other)),
    }
}

async fn handle_tools_call(tools: &ToolSet, id: Option<Id>, params: Value) -> Response {
    let call: ToolCallParams = match serde_json::from_value(params) {
        Ok(c) => c,
        Err(e) => return rpc_error(id, INVALID_PARAMS, &format!("Invalid params: {}", e)),
    };
    match tools.call(&call.name, call.arguments).await {
        None => rpc_error(id, METHOD_NOT_FOUND, &format!("Tool not found: {}", call.name)),
        Some(Ok(text)) => rpc_ok(id, mcp_wrap(text, false)),
        Some(Err(e)) if e.is_invalid_params() => rpc_error(id, INVALID_PARAMS, &e.to_string()),
        Some(Err(e)) => {
            debug!("tool {} failed: {}", call.name, e);
            rpc_ok(id, mcp_wrap(e.to_string(), true))
        }
    }
}
