use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "docsort")]
#[command(about = "Sorts loose PDF documents into per-system folders", long_about = None)]
pub struct Cli {
    /// Log at debug level regardless of TRACING_LEVEL
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Classify, recover and place every PDF in the source directory
    Process {
        /// Directory holding the source PDFs
        #[arg(short, long)]
        source: Option<String>,
        /// Root that receives the organized tree
        #[arg(short, long)]
        output: Option<String>,
        /// Plan and report without touching any file
        #[arg(long)]
        dry_run: bool,
        /// Move files instead of copying them
        #[arg(long = "move")]
        move_files: bool,
        /// Also build the flat alphabetical view
        #[arg(long)]
        alphabetical: bool,
    },
    /// Classify only and print per-system counts
    Classify {
        #[arg(short, long)]
        source: Option<String>,
    },
    /// Rebuild the alphabetical view from the organized tree
    Alphabetical {
        #[arg(short, long)]
        output: Option<String>,
        #[arg(long)]
        dry_run: bool,
    },
    /// Move nested PDFs up into their bucket folders
    Flatten {
        #[arg(short, long)]
        output: Option<String>,
        #[arg(long)]
        dry_run: bool,
    },
    /// Print the system catalog
    ListSystems,
    /// Print configuration values
    PrintConfig,
}
