//! TrimFit command-line tool
//!
//! # Usage
//!
//! ```bash
//! trimfit convert --input holiday.mov --start 1:05 --end 1:45
//! trimfit plan --input holiday.mov --start 1:05 --end 1:45 --json
//! trimfit inspect --input holiday.mov
//! ```

use anyhow::Result;
use clap::Parser;

use trimfit::cli::{self, Cli};

/// Main entry point for the TrimFit CLI application
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    cli::run(cli).await
}
