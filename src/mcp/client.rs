//! MCP discovery client using rmcp
//!
//! Connects to a server, lists its tools and disconnects. Discovery never keeps
//! a session open; the catalog only needs the tool definitions.

use async_trait::async_trait;

use super::{McpError, McpResult, McpServerConfig, McpToolDefinition};
use crate::source::ToolProvider;

#[cfg(feature = "mcp")]
use rmcp::{
    RoleClient,
    service::{RunningService, ServiceError, ServiceExt},
    transport::{ConfigureCommandExt, TokioChildProcess},
};
#[cfg(feature = "mcp")]
use tokio::process::Command;

#[cfg(feature = "mcp")]
type McpRunningService = RunningService<RoleClient, ()>;

/// Convert rmcp ServiceError into our McpError, preserving JSON-RPC error codes.
#[cfg(feature = "mcp")]
fn map_service_error(e: ServiceError, context: &str) -> McpError {
    match e {
        ServiceError::McpError(err_data) => McpError::JsonRpc {
            code: err_data.code.0,
            message: err_data.message.to_string(),
        },
        _ => McpError::Protocol {
            message: format!("{}: {}", context, e),
        },
    }
}

/// Short-lived discovery session: connect, list, close.
pub struct McpClient {
    name: String,
    config: McpServerConfig,
    #[cfg(feature = "mcp")]
    service: Option<McpRunningService>,
}

impl McpClient {
    pub fn new(name: impl Into<String>, config: McpServerConfig) -> Self {
        Self {
            name: name.into(),
            config,
            #[cfg(feature = "mcp")]
            service: None,
        }
    }

    #[cfg(feature = "mcp")]
    pub async fn connect(&mut self) -> McpResult<()> {
        let McpServerConfig::Stdio {
            command,
            args,
            env,
            cwd,
        } = self.config.clone();
        self.connect_stdio(command, args, env, cwd).await
    }

    #[cfg(not(feature = "mcp"))]
    pub async fn connect(&mut self) -> McpResult<()> {
        let McpServerConfig::Stdio { command, .. } = &self.config;
        Err(McpError::Protocol {
            message: format!(
                "MCP feature not enabled; cannot launch '{}' for server '{}'",
                command, self.name
            ),
        })
    }

    #[cfg(feature = "mcp")]
    async fn connect_stdio(
        &mut self,
        command: String,
        args: Vec<String>,
        env: std::collections::HashMap<String, String>,
        cwd: Option<String>,
    ) -> McpResult<()> {
        use tokio::time::timeout;

        let transport = TokioChildProcess::new(Command::new(&command).configure(|cmd| {
            cmd.args(&args);
            for (key, value) in &env {
                cmd.env(key, value);
            }
            if let Some(dir) = &cwd {
                cmd.current_dir(dir);
            }
        }))
        .map_err(|e| McpError::ConnectionFailed {
            message: format!("Failed to create transport: {}", e),
        })?;

        let service: McpRunningService = timeout(super::MCP_CONNECT_TIMEOUT, ().serve(transport))
            .await
            .map_err(|_| McpError::ConnectionFailed {
                message: format!(
                    "Connection timed out after {:?}",
                    super::MCP_CONNECT_TIMEOUT
                ),
            })?
            .map_err(|e| McpError::ConnectionFailed {
                message: format!("Failed to connect: {}", e),
            })?;

        if let Some(info) = service.peer_info() {
            let protocol_version = info.protocol_version.to_string();
            if !super::SUPPORTED_PROTOCOL_VERSIONS.contains(&protocol_version.as_str()) {
                tracing::warn!(
                    server = %self.name,
                    server_version = %protocol_version,
                    supported = ?super::SUPPORTED_PROTOCOL_VERSIONS,
                    "MCP protocol version mismatch"
                );
            }
            tracing::debug!(
                server = %self.name,
                server_name = %info.server_info.name,
                server_version = %info.server_info.version,
                "Connected to MCP server"
            );
        }

        self.service = Some(service);
        Ok(())
    }

    #[cfg(feature = "mcp")]
    pub async fn list_tools(&self) -> McpResult<Vec<McpToolDefinition>> {
        let service = self
            .service
            .as_ref()
            .ok_or_else(|| McpError::ConnectionFailed {
                message: "Not connected".to_string(),
            })?;

        let tools_result = service
            .list_tools(Default::default())
            .await
            .map_err(|e| map_service_error(e, "Failed to list tools"))?;

        Ok(tools_result
            .tools
            .into_iter()
            .map(|t| McpToolDefinition {
                name: t.name.to_string(),
                description: t.description.map(|d| d.to_string()).unwrap_or_default(),
                input_schema: serde_json::Value::Object((*t.input_schema).clone()),
            })
            .collect())
    }

    #[cfg(not(feature = "mcp"))]
    pub async fn list_tools(&self) -> McpResult<Vec<McpToolDefinition>> {
        Err(McpError::Protocol {
            message: "MCP feature not enabled".to_string(),
        })
    }

    #[cfg(feature = "mcp")]
    pub async fn close(&mut self) -> McpResult<()> {
        if let Some(service) = self.service.take() {
            service.cancel().await.map_err(|e| McpError::Protocol {
                message: format!("Failed to cancel: {}", e),
            })?;
        }
        Ok(())
    }

    #[cfg(not(feature = "mcp"))]
    pub async fn close(&mut self) -> McpResult<()> {
        Ok(())
    }
}

/// Live tool source backed by a configured MCP server.
#[derive(Debug, Clone)]
pub struct McpToolProvider {
    name: String,
    config: McpServerConfig,
}

impl McpToolProvider {
    pub fn new(name: impl Into<String>, config: McpServerConfig) -> Self {
        Self {
            name: name.into(),
            config,
        }
    }
}

#[async_trait]
impl ToolProvider for McpToolProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn list_tools(&self) -> McpResult<Vec<McpToolDefinition>> {
        let mut client = McpClient::new(self.name.clone(), self.config.clone());
        client.connect().await?;
        let tools = client.list_tools().await;
        if let Err(e) = client.close().await {
            tracing::debug!(server = %self.name, error = %e, "Failed to close MCP discovery session");
        }
        tools
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn stdio(command: &str) -> McpServerConfig {
        McpServerConfig::Stdio {
            command: command.to_string(),
            args: vec![],
            env: HashMap::new(),
            cwd: None,
        }
    }

    #[tokio::test]
    async fn test_provider_reports_failure_for_unusable_server() {
        let provider = McpToolProvider::new(
            "missing",
            stdio("/nonexistent/definitely-not-an-mcp-server"),
        );
        assert_eq!(provider.name(), "missing");
        assert!(provider.list_tools().await.is_err());
    }
}
