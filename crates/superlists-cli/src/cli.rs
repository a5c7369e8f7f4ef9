use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

const LONG_VERSION: &str = concat!(env!("CARGO_PKG_VERSION"), " (", env!("GIT_COMMIT_HASH"), ")");

#[derive(Parser)]
#[command(name = "superlists")]
#[command(about = "Replay kanban board pages through the super lists reconciler", long_about = None)]
#[command(version, long_version = LONG_VERSION)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Build a page from a fixture, run a script against it and print the board snapshot
    Simulate(SimulateArgs),
    /// Print the stored view state of a board
    ViewState(BoardStoreArgs),
    /// Forget the stored view state of a board
    Clear(BoardStoreArgs),
    /// Generate shell completions
    Completions {
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

#[derive(Args)]
pub struct SimulateArgs {
    /// Board fixture (JSON) describing the initial page
    #[arg(long, value_name = "FILE")]
    pub page: PathBuf,
    /// JSON array of steps applied in order after setup
    #[arg(long, value_name = "FILE")]
    pub script: Option<PathBuf>,
    /// JSON file backing the key-value store; in-memory when omitted
    #[arg(long, value_name = "FILE", env = "SUPERLISTS_STORE")]
    pub store: Option<PathBuf>,
    /// TOML settings used when the store holds none
    #[arg(long, value_name = "FILE")]
    pub settings: Option<PathBuf>,
}

#[derive(Args)]
pub struct BoardStoreArgs {
    /// JSON file backing the key-value store
    #[arg(long, value_name = "FILE", env = "SUPERLISTS_STORE")]
    pub store: PathBuf,
    /// Board id as it appears in the page location
    #[arg(long)]
    pub board: String,
}
