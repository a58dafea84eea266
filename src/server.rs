//! Server module for the Winx application.
//!
//! This module defines the MCP service dispatcher (`WinxService`) and the
//! `start_winx_server` entrypoint that connects it to the stdio transport.
//! It handles the lifecycle of the server and all communication with the
//! client.

use std::sync::Arc;

use rmcp::{
    handler::server::router::tool::ToolRouter, handler::server::wrapper::Parameters, model::*,
    tool, tool_handler, tool_router, transport::stdio, ErrorData as McpError, ServiceExt,
};
use tokio::sync::Mutex;

use crate::errors::WinxError;
use crate::state::bash_state::BashState;
use crate::tools;
use crate::types::{BashCommand, ContextSave, FileWriteOrEdit, Initialize, ReadFiles, ReadImage};

fn to_mcp_error(e: WinxError) -> McpError {
    McpError::internal_error(e.to_string(), None)
}

/// Configuration for the server
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Whether to use a simulated environment for testing
    pub simulation_mode: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { simulation_mode: false }
    }
}

/// The MCP service dispatcher for Winx. Holds the session's shared
/// `BashState` and routes the six Winx tools through `rmcp`'s
/// `#[tool_router]` machinery.
#[derive(Clone)]
pub struct WinxService {
    tool_router: ToolRouter<Self>,
    bash_state: Arc<Mutex<Option<BashState>>>,
}

impl Default for WinxService {
    fn default() -> Self {
        Self::new()
    }
}

#[tool_router]
impl WinxService {
    pub fn new() -> Self {
        Self { tool_router: Self::tool_router(), bash_state: Arc::new(Mutex::new(None)) }
    }

    #[tool(
        name = "initialize",
        description = "Initializes a Winx session: sets the workspace root, resumes or starts a \
chat thread, and selects the operating mode (wcgw, architect, code_writer). Must be called \
before any other tool."
    )]
    async fn initialize(
        &self,
        Parameters(args): Parameters<Initialize>,
    ) -> Result<CallToolResult, McpError> {
        let text = tools::initialize::handle_tool_call(&self.bash_state, args)
            .await
            .map_err(to_mcp_error)?;
        Ok(CallToolResult::success(vec![Content::text(text)]))
    }

    #[tool(
        name = "bash_command",
        description = "Executes a command in the session's foreground shell, or a backgrounded \
one addressed by bg_command_id, and returns the terminal output accumulated since the last call. \
Also used for status_check, send_text, send_specials, and send_ascii against a running command."
    )]
    async fn bash_command(
        &self,
        Parameters(args): Parameters<BashCommand>,
    ) -> Result<CallToolResult, McpError> {
        let text = tools::bash_command::handle_tool_call(self.bash_state.clone(), args)
            .await
            .map_err(to_mcp_error)?;
        Ok(CallToolResult::success(vec![Content::text(text)]))
    }

    #[tool(
        name = "read_files",
        description = "Reads one or more files, optionally restricted to a line range, and \
records the ranges read in the session's whitelist so they can later be overwritten."
    )]
    async fn read_files(
        &self,
        Parameters(args): Parameters<ReadFiles>,
    ) -> Result<CallToolResult, McpError> {
        let text = tools::read_files::handle_tool_call(&self.bash_state, args)
            .await
            .map_err(to_mcp_error)?;
        Ok(CallToolResult::success(vec![Content::text(text)]))
    }

    #[tool(
        name = "file_write_or_edit",
        description = "Writes a new file, overwrites an existing one, or applies search/replace \
blocks to an existing file. Overwriting requires the file to have been read (mostly in full) \
first in this session."
    )]
    async fn file_write_or_edit(
        &self,
        Parameters(args): Parameters<FileWriteOrEdit>,
    ) -> Result<CallToolResult, McpError> {
        let text = tools::file_write_or_edit::handle_tool_call(&self.bash_state, args)
            .await
            .map_err(to_mcp_error)?;
        Ok(CallToolResult::success(vec![Content::text(text)]))
    }

    #[tool(
        name = "read_image",
        description = "Reads an image file from disk and returns it as inline base64 image \
content."
    )]
    async fn read_image(
        &self,
        Parameters(args): Parameters<ReadImage>,
    ) -> Result<CallToolResult, McpError> {
        let (mime_type, data) = tools::read_image::handle_tool_call(&self.bash_state, args)
            .await
            .map_err(to_mcp_error)?;
        Ok(CallToolResult::success(vec![Content::image(data, mime_type)]))
    }

    #[tool(
        name = "context_save",
        description = "Saves a summary of the current task's context and the session's bash \
state to disk, so the session can be resumed later by initializing with the same chat ID."
    )]
    async fn context_save(
        &self,
        Parameters(args): Parameters<ContextSave>,
    ) -> Result<CallToolResult, McpError> {
        let text = tools::context_save::handle_tool_call(&self.bash_state, args)
            .await
            .map_err(to_mcp_error)?;
        Ok(CallToolResult::success(vec![Content::text(text)]))
    }
}

#[tool_handler(router = self.tool_router)]
impl rmcp::ServerHandler for WinxService {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            instructions: Some(
                "Winx is a shell execution and file management service for code agents. Call \
initialize first with a workspace path, then use bash_command, read_files, file_write_or_edit, \
read_image, and context_save to work in that workspace."
                    .to_string(),
            ),
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            ..Default::default()
        }
    }
}

/// Runs the MCP server using the stdio transport.
///
/// Initializes the Winx service, connects it to the stdio transport, and
/// waits for the service to complete.
///
/// # Errors
///
/// Returns an error if the server fails to start or encounters an error
/// during operation.
pub async fn start_winx_server() -> crate::errors::Result<()> {
    let start_time = std::time::Instant::now();

    tracing::debug!("Initializing server...");
    let service = WinxService::new().serve(stdio()).await.map_err(|e| {
        WinxError::ShellInitializationError { message: format!("Failed to start MCP service: {}", e) }
    })?;

    let startup_duration = start_time.elapsed();
    tracing::info!("Server started and connected successfully in {:.2?}", startup_duration);

    let status_reporter = tokio::spawn(async {
        let mut interval = tokio::time::interval(std::time::Duration::from_secs(300));
        loop {
            interval.tick().await;
            tracing::debug!("Server is running (periodic status report)");
        }
    });

    match service.waiting().await {
        Ok(_) => {
            tracing::info!("Server completed normally");
            status_reporter.abort();
            Ok(())
        }
        Err(e) => {
            status_reporter.abort();
            Err(WinxError::ShellInitializationError { message: format!("Server error: {}", e) })
        }
    }
}

/// Runs the server with a custom configuration.
pub async fn run_server_with_config(config: ServerConfig) -> crate::errors::Result<()> {
    tracing::info!("Starting server with custom configuration: {:?}", config);

    if config.simulation_mode {
        tracing::warn!("Running in simulation mode - some features may be limited");
    }

    start_winx_server().await
}
