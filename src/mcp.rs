use anyhow::Result;
use rmcp::{
    handler::server::{router::tool::ToolRouter, wrapper::Parameters},
    model::{ServerCapabilities, ServerInfo},
    schemars, tool, tool_handler, tool_router, ServerHandler, ServiceExt,
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::batch::BatchSplitter;
use crate::commands::split::execute;
use crate::commands::toc::outline_listing;
use crate::error::BatchError;
use crate::pdf::PdfDocument;

// Request structs for tools

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct PathRequest {
    #[schemars(description = "Path to the PDF file")]
    pub path: String,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct PdfSplitOutlineRequest {
    #[schemars(description = "PDF files, or directories containing PDF files")]
    pub paths: Vec<String>,
    #[schemars(description = "Outline level to split at, 1 = top level (default: 1)")]
    #[serde(default = "default_depth")]
    pub depth: u32,
    #[schemars(description = "Path of the ZIP archive to write")]
    pub output: String,
}

fn default_depth() -> u32 {
    1
}

#[derive(Debug, Clone)]
pub struct PdfServer {
    tool_router: ToolRouter<Self>,
}

impl PdfServer {
    pub fn new() -> Self {
        Self {
            tool_router: Self::tool_router(),
        }
    }
}

impl Default for PdfServer {
    fn default() -> Self {
        Self::new()
    }
}

#[tool_router]
impl PdfServer {
    #[tool(description = "Get the outline (bookmarks) of a PDF with the depth and page of every entry, to pick a split depth")]
    fn pdf_toc(&self, Parameters(PathRequest { path }): Parameters<PathRequest>) -> String {
        let doc = match PdfDocument::open(&path) {
            Ok(d) => d,
            Err(e) => return format!("Error: {:#}", e),
        };

        match outline_listing(&doc) {
            Ok(Some(listing)) => {
                let result = TocResult {
                    path,
                    has_outline: true,
                    max_depth: listing.max_depth,
                    entries: listing
                        .rows
                        .into_iter()
                        .map(|row| TocEntryResult {
                            title: row.title,
                            depth: row.depth,
                            page: row.page,
                        })
                        .collect(),
                };
                serde_json::to_string_pretty(&result).unwrap_or_else(|e| format!("Error: {}", e))
            }
            Ok(None) => {
                let result = TocResult {
                    path,
                    has_outline: false,
                    max_depth: 0,
                    entries: Vec::new(),
                };
                serde_json::to_string_pretty(&result).unwrap_or_else(|e| format!("Error: {}", e))
            }
            Err(e) => format!("Error: {:#}", e),
        }
    }

    #[tool(description = "Split PDFs into one file per bookmark at the given outline depth and bundle them into a ZIP archive")]
    async fn pdf_split_outline(
        &self,
        Parameters(req): Parameters<PdfSplitOutlineRequest>,
    ) -> String {
        if req.depth == 0 {
            return format!("Error: {}", BatchError::InvalidDepth(req.depth));
        }

        let inputs: Vec<PathBuf> = req.paths.iter().map(PathBuf::from).collect();
        let output = req.output.clone();
        let depth = req.depth;

        // Splitting is blocking work
        let outcome = tokio::task::spawn_blocking(move || {
            let result = execute(&inputs, &BatchSplitter::new(depth), &output)?;
            let archive = (!result.is_empty()).then(|| output.clone());
            Ok::<_, anyhow::Error>(serde_json::to_string_pretty(&result.summary(archive))?)
        })
        .await;

        match outcome {
            Ok(Ok(json)) => json,
            Ok(Err(e)) => match e.downcast_ref::<BatchError>() {
                Some(batch) => format!("Error ({:?}): {}", batch.kind(), batch),
                None => format!("Error: {:#}", e),
            },
            Err(e) => format!("Error: split task failed: {}", e),
        }
    }
}

// Result types for MCP tools

#[derive(Debug, Serialize, Deserialize, schemars::JsonSchema)]
pub struct TocEntryResult {
    pub title: String,
    pub depth: u32,
    pub page: Option<usize>,
}

#[derive(Debug, Serialize, Deserialize, schemars::JsonSchema)]
pub struct TocResult {
    pub path: String,
    pub has_outline: bool,
    pub max_depth: u32,
    pub entries: Vec<TocEntryResult>,
}

#[tool_handler]
impl ServerHandler for PdfServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            instructions: Some(
                "PDF chapter splitting tools. Use pdf_toc to inspect the outline and see which \
                 depths exist, then pdf_split_outline to cut one or more PDFs at the bookmarks of \
                 that depth into a ZIP of chapter PDFs."
                    .to_string(),
            ),
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            ..Default::default()
        }
    }
}

pub async fn run_server() -> Result<()> {
    let server = PdfServer::new();

    // Serve using stdin/stdout as a tuple
    let service = server.serve((tokio::io::stdin(), tokio::io::stdout())).await?;

    service.waiting().await?;

    Ok(())
}
