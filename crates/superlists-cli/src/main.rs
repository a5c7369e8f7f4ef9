mod cli;
mod handlers;
mod output;
mod script;

use clap::{CommandFactory, Parser};
use cli::{Cli, Commands};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    if let Ok(log_path) = std::env::var("SUPERLISTS_DEBUG_LOG") {
        let log_file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&log_path)?;

        tracing_subscriber::fmt()
            .with_writer(log_file)
            .with_max_level(tracing::Level::DEBUG)
            .with_target(true)
            .with_thread_ids(true)
            .with_file(true)
            .with_line_number(true)
            .with_ansi(false)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_writer(std::io::stderr)
            .with_max_level(tracing::Level::WARN)
            .init();
    }

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Simulate(args) => handlers::simulate::handle(args).await,
        Commands::ViewState(args) => handlers::store::handle_view_state(args).await,
        Commands::Clear(args) => handlers::store::handle_clear(args).await,
        Commands::Completions { shell } => {
            clap_complete::generate(shell, &mut Cli::command(), "superlists", &mut std::io::stdout());
            Ok(())
        }
    };

    if let Err(e) = result {
        output::output_error(&format!("{:#}", e));
    }
    Ok(())
}
