use super::recon_server::ReconServer;
use rmcp::{ServerHandler, model::*, tool_handler};

#[tool_handler]
impl ServerHandler for ReconServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::V_2025_03_26,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation {
                name: "Recon-MCP".to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
            },
            instructions: Some(
                "Reconciles manual and automatic parking entry logs for a location. Use compare_logs to fetch a deduplicated, ordered view and show_notices to review failed requests."
                    .to_string(),
            ),
        }
    }
}
