use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const PROTOCOL_VERSION: &str = "2025-03-26";
pub const SERVER_NAME: &str = "github-mcp";

// JSON-RPC 2.0 error codes used by the endpoint.
pub const PARSE_ERROR: i64 = -32700;
pub const INVALID_REQUEST: i64 = -32600;
pub const METHOD_NOT_FOUND: i64 = -32601;
pub const INVALID_PARAMS: i64 = -32602;
pub const INTERNAL_ERROR: i64 = -32603;
pub const SERVER_ERROR: i64 = -32000;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Id {
    Str(String),
    Num(i64),
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Request {
    pub jsonrpc: String,
    pub method: String,
    #[serde(default)]
    pub params: Value,
    #[serde(default)]
    pub id: Option<Id>,
}

impl Request {
    /// Requests without an id are notifications and get no response body.
    pub fn is_notification(&self) -> bool {
        self.id.is_none()
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Response {
    pub jsonrpc: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<RpcError>,
    pub id: Option<Id>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RpcError {
    pub code: i64,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

pub fn rpc_error(id: Option<Id>, code: i64, message: &str) -> Response {
    Response {
        jsonrpc: "2.0".into(),
        result: None,
        error: Some(RpcError {
            code,
            message: message.into(),
            data: None,
        }),
        id,
    }
}

pub fn rpc_ok(id: Option<Id>, result: Value) -> Response {
    Response {
        jsonrpc: "2.0".into(),
        result: Some(result),
        error: None,
        id,
    }
}

#[derive(Debug, Deserialize)]
pub struct ToolCallParams {
    pub name: String,
    #[serde(default)]
    pub arguments: Value,
}

// Build an MCP tools/call result: a single text block, plus isError only when set.
pub fn mcp_wrap(text: String, is_error: bool) -> Value {
    let mut obj = serde_json::json!({
        "content": [{ "type": "text", "text": text }],
    });
    if is_error {
        if let Some(map) = obj.as_object_mut() {
            map.insert("isError".to_string(), Value::Bool(true));
        }
    }
    obj
}

pub fn initialize_result() -> Value {
    serde_json::json!({
        "protocolVersion": PROTOCOL_VERSION,
        "capabilities": { "tools": { "listChanged": false } },
        "serverInfo": {
            "name": SERVER_NAME,
            "version": env!("CARGO_PKG_VERSION"),
        }
    })
}
