// ABOUTME: Command line argument definitions and parsing using Clap
// ABOUTME: Defines the main CLI structure and subcommands for docflow

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "docflow")]
#[command(about = "A workflow engine for extracting structured data from documents")]
#[command(version)]
pub struct Args {
    #[command(subcommand)]
    pub command: Commands,

    #[arg(short, long, global = true, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(short, long, global = true, help = "Path to configuration file")]
    pub config: Option<PathBuf>,

    #[arg(long, global = true, help = "Disable colored output")]
    pub no_color: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Process a document through the extraction pipeline
    Process {
        #[arg(help = "Path to the document to process")]
        document: PathBuf,

        #[arg(short, long, help = "Extraction template identifier")]
        template: Option<String>,

        #[arg(long, help = "Maximum number of concurrent tasks")]
        max_concurrent: Option<usize>,

        #[arg(short, long, help = "Write the extraction result JSON to a file")]
        output: Option<PathBuf>,
    },

    /// Show the task plan for a document without executing it
    Plan {
        #[arg(help = "Path to the document to plan for")]
        document: PathBuf,

        #[arg(short, long, help = "Extraction template identifier")]
        template: Option<String>,
    },
}

impl Args {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
