//! Tests for MCP protocol handling

use serde_json::{json, Value};

use crate::browser::BrowserConfig;
use crate::server::protocol::{ContentItem, JsonRpcRequest, JsonRpcResponse, McpServer, ToolCallResult, ToolOutput};
use crate::server::ServerConfig;

fn create_test_server() -> McpServer {
    let config = ServerConfig {
        browser: BrowserConfig::default(),
        ..Default::default()
    };
    McpServer::new(config)
}

fn create_request(method: &str, params: Value) -> JsonRpcRequest {
    JsonRpcRequest {
        jsonrpc: "2.0".to_string(),
        id: Some(json!(1)),
        method: method.to_string(),
        params,
    }
}

#[tokio::test]
async fn test_initialize() {
    let mut server = create_test_server();
    let request = create_request("initialize", json!({}));

    let result = server.handle_request(&request).await.unwrap();

    assert!(result.get("protocolVersion").is_some());
    assert!(result.get("capabilities").is_some());
    assert!(result.get("serverInfo").is_some());

    let server_info = &result["serverInfo"];
    assert_eq!(server_info["name"], "browser-stream");
}

#[tokio::test]
async fn test_initialized_notification() {
    let mut server = create_test_server();

    let init_request = create_request("initialize", json!({}));
    server.handle_request(&init_request).await.unwrap();

    let request = JsonRpcRequest {
        jsonrpc: "2.0".to_string(),
        id: None,
        method: "initialized".to_string(),
        params: json!({}),
    };

    let result = server.handle_request(&request).await.unwrap();
    assert_eq!(result, Value::Null);
}

#[tokio::test]
async fn test_tools_list_returns_the_seven_tool_surface() {
    let mut server = create_test_server();

    let init_request = create_request("initialize", json!({}));
    server.handle_request(&init_request).await.unwrap();

    let request = create_request("tools/list", json!({}));
    let result = server.handle_request(&request).await.unwrap();

    let tools = result["tools"].as_array().unwrap();
    assert_eq!(tools.len(), 7);

    let tool_names: Vec<&str> = tools.iter().filter_map(|t| t["name"].as_str()).collect();
    for name in [
        "browser_navigate",
        "browser_snapshot",
        "browser_click",
        "browser_fill",
        "browser_press_key",
        "browser_scroll",
        "browser_wait_for",
    ] {
        assert!(tool_names.contains(&name), "missing tool {name}");
    }
}

#[tokio::test]
async fn test_tools_call_unknown_tool() {
    let mut server = create_test_server();

    let init_request = create_request("initialize", json!({}));
    server.handle_request(&init_request).await.unwrap();

    let request = create_request(
        "tools/call",
        json!({
            "name": "unknown_tool",
            "arguments": {}
        }),
    );

    let result = server.handle_request(&request).await;
    assert!(result.is_err());

    let err = result.unwrap_err();
    assert_eq!(err.error_code(), -32601);
}

#[tokio::test]
async fn test_tools_call_invalid_arguments_reports_error_in_envelope() {
    let mut server = create_test_server();

    let init_request = create_request("initialize", json!({}));
    server.handle_request(&init_request).await.unwrap();

    let request = create_request(
        "tools/call",
        json!({
            "name": "browser_click",
            "arguments": {}
        }),
    );

    let result = server.handle_request(&request).await.unwrap();
    assert_eq!(result["isError"], true);
}

#[tokio::test]
async fn test_unknown_method() {
    let mut server = create_test_server();
    let request = create_request("unknown/method", json!({}));

    let result = server.handle_request(&request).await;
    assert!(result.is_err());

    let err = result.unwrap_err();
    assert_eq!(err.error_code(), -32601);
}

#[tokio::test]
async fn test_json_rpc_response_success() {
    let response = JsonRpcResponse::success(json!(1), json!({"result": "ok"}));

    assert_eq!(response.jsonrpc, "2.0");
    assert_eq!(response.id, json!(1));
    assert!(response.result.is_some());
    assert!(response.error.is_none());
}

#[tokio::test]
async fn test_json_rpc_response_error() {
    let response = JsonRpcResponse::error(json!(1), -32600, "Invalid Request".to_string());

    assert_eq!(response.jsonrpc, "2.0");
    assert_eq!(response.id, json!(1));
    assert!(response.result.is_none());
    assert!(response.error.is_some());

    let error = response.error.unwrap();
    assert_eq!(error.code, -32600);
    assert_eq!(error.message, "Invalid Request");
}

#[tokio::test]
async fn test_server_is_initialized() {
    let mut server = create_test_server();
    assert!(!server.is_initialized());

    let request = create_request("initialize", json!({}));
    server.handle_request(&request).await.unwrap();

    assert!(server.is_initialized());
}

// =============================================================================
// ContentItem serialization tests
// =============================================================================

#[test]
fn test_content_item_text_serialization() {
    let item = ContentItem::text("Hello, world!");
    let json = serde_json::to_value(&item).unwrap();

    assert_eq!(json["type"], "text");
    assert_eq!(json["text"], "Hello, world!");
    assert!(json.get("data").is_none());
    assert!(json.get("mimeType").is_none());
}

#[test]
fn test_content_item_text_with_special_characters() {
    let item = ContentItem::text("Hello \"world\"\nNew line\tTab");
    let json = serde_json::to_value(&item).unwrap();

    assert_eq!(json["type"], "text");
    assert_eq!(json["text"], "Hello \"world\"\nNew line\tTab");
}

#[test]
fn test_tool_output_text_helper() {
    let output = ToolOutput::text("Simple response");
    assert_eq!(output.content.len(), 1);

    if let ContentItem::Text { text } = &output.content[0] {
        assert_eq!(text, "Simple response");
    } else {
        panic!("Expected Text content item");
    }
}

#[test]
fn test_tool_call_result_serialization_success() {
    let result = ToolCallResult {
        content: vec![ContentItem::text("Operation completed")],
        is_error: false,
    };
    let json = serde_json::to_value(&result).unwrap();

    assert!(json.get("isError").is_none());
    let content = json["content"].as_array().unwrap();
    assert_eq!(content.len(), 1);
    assert_eq!(content[0]["text"], "Operation completed");
}

#[test]
fn test_tool_call_result_serialization_error() {
    let result = ToolCallResult {
        content: vec![ContentItem::text("Error: something went wrong")],
        is_error: true,
    };
    let json = serde_json::to_value(&result).unwrap();

    assert_eq!(json["isError"], true);
    let content = json["content"].as_array().unwrap();
    assert_eq!(content.len(), 1);
}
