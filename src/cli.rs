use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "tocsplit")]
#[command(about = "Split PDFs into chapters along their bookmarks, bundled as a ZIP")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run as MCP server
    Mcp,

    /// Print the outline with the depth of every entry
    Toc {
        /// PDF file to inspect
        path: PathBuf,
    },

    /// Split PDFs at the bookmarks of one outline level
    #[command(alias = "chapters")]
    Split {
        /// PDF files, or directories to search for PDF files
        #[arg(required = true)]
        inputs: Vec<PathBuf>,

        /// Outline level to split at (1 = top level)
        #[arg(short, long, default_value = "1", value_parser = clap::value_parser!(u32).range(1..))]
        depth: u32,

        /// ZIP file to write
        #[arg(short, long)]
        output: PathBuf,

        /// Print the result as JSON instead of a summary
        #[arg(long)]
        json: bool,
    },
}
