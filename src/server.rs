//! Line-delimited JSON-RPC stdio binding for the feedback tool.
//!
//! One request per line in, one response per line out; notifications get no
//! reply. Stdout is the wire, so all diagnostics go to stderr via tracing.
//! The binding stays deliberately thin: everything interesting happens in
//! [`crate::bridge`].

use crate::bridge::run_feedback_session;
use crate::command::CommandRunner;
use crate::config::ConfigStore;
use crate::envelope::{FeedbackRequest, FeedbackResponse};
use crate::surface::FeedbackSurface;
use crate::textutil::first_line;
use base64::engine::general_purpose::STANDARD as B64;
use base64::Engine;
use serde_json::{json, Value};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

/// Wire name of the single exposed tool.
pub const TOOL_NAME: &str = "interactive_feedback";

/// MCP protocol revision answered to `initialize`.
const PROTOCOL_VERSION: &str = "2024-11-05";

const PARSE_ERROR: i64 = -32700;
const METHOD_NOT_FOUND: i64 = -32601;
const INVALID_PARAMS: i64 = -32602;
const TOOL_ERROR: i64 = -32000;

/// Stdio tool server wiring the bridge to a surface and runner.
pub struct ToolServer {
    store: ConfigStore,
    surface: Arc<dyn FeedbackSurface>,
    runner: Arc<dyn CommandRunner>,
    timeout: Duration,
}

impl ToolServer {
    pub fn new(
        store: ConfigStore,
        surface: Arc<dyn FeedbackSurface>,
        runner: Arc<dyn CommandRunner>,
        timeout: Duration,
    ) -> Self {
        Self {
            store,
            surface,
            runner,
            timeout,
        }
    }

    /// Serve requests from stdin until it closes.
    pub async fn serve_stdio(&self) -> std::io::Result<()> {
        tracing::info!("holdup tool server listening on stdio");
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        let mut stdout = tokio::io::stdout();
        while let Some(line) = lines.next_line().await? {
            if line.trim().is_empty() {
                continue;
            }
            if let Some(response) = self.handle_line(&line).await {
                stdout.write_all(response.as_bytes()).await?;
                stdout.write_all(b"\n").await?;
                stdout.flush().await?;
            }
        }
        tracing::info!("stdin closed; tool server shutting down");
        Ok(())
    }

    /// Handle one wire line; returns the serialized response, if any.
    pub async fn handle_line(&self, line: &str) -> Option<String> {
        let request: Value = match serde_json::from_str(line) {
            Ok(value) => value,
            Err(e) => {
                return Some(
                    error_response(Value::Null, PARSE_ERROR, &format!("parse error: {e}"))
                        .to_string(),
                );
            }
        };
        self.handle_request(request).await.map(|v| v.to_string())
    }

    /// Dispatch one parsed JSON-RPC request.
    pub async fn handle_request(&self, request: Value) -> Option<Value> {
        let method = request.get("method").and_then(Value::as_str)?.to_string();
        let id = request.get("id").cloned().filter(|id| !id.is_null());
        match method.as_str() {
            "initialize" => id.map(|id| result_response(id, initialize_result())),
            "notifications/initialized" => None,
            "tools/list" => id.map(|id| result_response(id, tools_list_result())),
            "tools/call" => {
                // A call without an id is a notification; nothing to answer.
                let id = id?;
                Some(match self.handle_tool_call(request.get("params")).await {
                    Ok(result) => result_response(id, result),
                    Err((code, message)) => error_response(id, code, &message),
                })
            }
            other => {
                id.map(|id| error_response(id, METHOD_NOT_FOUND, &format!("unknown method `{other}`")))
            }
        }
    }

    async fn handle_tool_call(&self, params: Option<&Value>) -> Result<Value, (i64, String)> {
        let params = params.ok_or((INVALID_PARAMS, "missing params".to_string()))?;
        let name = params
            .get("name")
            .and_then(Value::as_str)
            .ok_or((INVALID_PARAMS, "missing tool name".to_string()))?;
        if name != TOOL_NAME {
            return Err((INVALID_PARAMS, format!("unknown tool `{name}`")));
        }
        let arguments = params.get("arguments").cloned().unwrap_or_else(|| json!({}));
        let argument = |key: &str| {
            first_line(arguments.get(key).and_then(Value::as_str).unwrap_or_default()).to_string()
        };

        let request = FeedbackRequest {
            task_id: argument("task_id"),
            project_directory: PathBuf::from(argument("project_directory")),
            summary: argument("summary"),
            command: None,
            timeout: self.timeout,
        };
        let response = run_feedback_session(
            request,
            &self.store,
            self.surface.as_ref(),
            Some(Arc::clone(&self.runner)),
        )
        .await
        .map_err(|e| (TOOL_ERROR, e.to_string()))?;
        Ok(tool_call_result(&response))
    }
}

// ---------------------------------------------------------------------------
// Wire shapes
// ---------------------------------------------------------------------------

fn initialize_result() -> Value {
    json!({
        "protocolVersion": PROTOCOL_VERSION,
        "capabilities": { "tools": {} },
        "serverInfo": {
            "name": "holdup",
            "version": crate::build_info::VERSION,
        }
    })
}

fn tools_list_result() -> Value {
    json!({
        "tools": [{
            "name": TOOL_NAME,
            "description": "Pause and ask the human operator for feedback on the work so far. \
                 Opens a feedback prompt and returns the reply; call it again at every \
                 checkpoint to keep the dialogue going.",
            "inputSchema": {
                "type": "object",
                "properties": {
                    "project_directory": {
                        "type": "string",
                        "description": "Full path to the project directory being worked on"
                    },
                    "summary": {
                        "type": "string",
                        "description": "One-line summary of changes made, or a question for the user"
                    },
                    "task_id": {
                        "type": "string",
                        "description": "Identifier distinguishing this task from others"
                    }
                },
                "required": ["project_directory", "summary", "task_id"]
            }
        }]
    })
}

/// Shape the resolved response as MCP content blocks plus the raw envelope.
fn tool_call_result(response: &FeedbackResponse) -> Value {
    let text = response.interactive_feedback.trim();
    let lead = if !text.is_empty() {
        text.to_string()
    } else if !response.images.is_empty() {
        "User provided images.".to_string()
    } else {
        "User did not provide any feedback.".to_string()
    };
    let mut content = vec![json!({ "type": "text", "text": lead })];
    for image in &response.images {
        content.push(json!({
            "type": "image",
            "data": B64.encode(&image.data),
            "mimeType": image.format.mime_type(),
        }));
    }
    json!({
        "content": content,
        "structuredContent": response,
    })
}

fn result_response(id: Value, result: Value) -> Value {
    json!({ "jsonrpc": "2.0", "id": id, "result": result })
}

fn error_response(id: Value, code: i64, message: &str) -> Value {
    json!({
        "jsonrpc": "2.0",
        "id": id,
        "error": { "code": code, "message": message }
    })
}
