// Entrypoint for the CLI application.
// - Keeps `main` small: parse arguments, set up logging and configuration,
//   build the API client and hand everything to `cli::run`.

use anyhow::{Context, Result};
use clap::Parser;
use datafiles_cli::api::ApiClient;
use datafiles_cli::cli::{run, Cli};
use datafiles_cli::config::Config;
use datafiles_cli::files::FileCommands;
use datafiles_cli::print::ConsolePrinter;
use datafiles_cli::verify::ThreadSleeper;
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    let cli = Cli::parse();

    // RUST_LOG wins over the -v count.
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(cli.log_level()));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let mut config = Config::load().context("Failed to load configuration")?;
    if let Some(url) = cli.api_url.clone() {
        config.api_url = url;
    }
    let policy = config.retry_policy()?;
    let api = ApiClient::new(&config).context("Failed to build HTTP client")?;
    tracing::debug!(api_url = api.base_url(), "using files API");

    let printer = ConsolePrinter { format: cli.output };
    let sleeper = ThreadSleeper;
    let files = FileCommands::new(&api, &sleeper, &printer, policy);
    run(cli.command, &files, &printer)
}
