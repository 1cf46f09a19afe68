//! Stateless MCP server exposing read-only GitHub pull-request tools over HTTP.

pub mod config;
pub mod error;
pub mod http;
pub mod mcp;
pub mod pagination;
pub mod pr_url;
pub mod server;
pub mod tools;
