//! # Notion Test Cases CLI (`ntc`)
//!
//! Starts the HTTP API, or queries the same pipeline from the command line.
//!
//! | Command | Description |
//! |---------|-------------|
//! | `ntc serve` | Start the HTTP API |
//! | `ntc list` | List discovered test cases |
//! | `ntc blocks <key>` | Show a test case's blocks |
//! | `ntc block <id>` | Show one block as JSON |
//! | `ntc table <id>` | Show one table's rows as JSON |
//! | `ntc detailed` | Show every test case with its tables as JSON |
//!
//! Configuration is read from `--config` (optional) and the environment; see
//! [`notion_testcases::config`].

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use notion_testcases::client::NotionClient;
use notion_testcases::{blocks, config, logging, server, tables, testcases};

/// Re-project Notion pages into test cases and tables.
#[derive(Parser)]
#[command(name = "ntc", version, about)]
struct Cli {
    /// Optional TOML configuration file. Environment variables override it.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Debug-level logging (ignored when `RUST_LOG` is set).
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP API.
    Serve,

    /// List test cases found by search.
    List,

    /// Show the blocks of one test case.
    Blocks {
        /// Test case key, e.g. `01001` for `TC_01001`.
        key: String,

        /// Only blocks of this type. `table` is the only recognised filter.
        #[arg(long = "type")]
        kind: Option<String>,
    },

    /// Show a single block.
    Block {
        /// Block ID.
        id: String,
    },

    /// Show the rows of a table block.
    Table {
        /// Table block ID.
        id: String,
    },

    /// Show every test case together with its tables.
    Detailed,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init_logging(cli.verbose)?;

    let cfg = config::load_config(cli.config.as_deref())?;

    if let Commands::Serve = cli.command {
        return server::run_server(&cfg).await;
    }

    if cfg.notion.api_key.is_empty() {
        anyhow::bail!("NOTION_API_KEY environment variable is required");
    }
    let api = NotionClient::new(&cfg.notion)?;

    match cli.command {
        Commands::Serve => unreachable!(),
        Commands::List => testcases::run_list(&api, &cfg.catalog).await?,
        Commands::Blocks { key, kind } => {
            let tables_only = kind.as_deref() == Some("table");
            testcases::run_blocks(&api, &cfg.catalog, &key, tables_only).await?;
        }
        Commands::Block { id } => blocks::run_block(&api, &id).await?,
        Commands::Table { id } => tables::run_table(&api, &id).await?,
        Commands::Detailed => testcases::run_detailed(&api, &cfg.catalog).await?,
    }

    Ok(())
}
