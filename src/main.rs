use std::io::stdout;
use std::process::ExitCode;

use blockgaps::Config;
use blockgaps::chain::client::ApiClient;
use blockgaps::error::Error;
use blockgaps::helpers::args::{Args, Command};
use blockgaps::pipeline::{api_client, run_aggregate, run_fetch, run_reconcile};

use clap::Parser;
use crossterm::{
    execute,
    style::{Color, Print, ResetColor, SetForegroundColor},
};
use tracing_subscriber::EnvFilter;

/// Runs the requested stage(s) against the configured store. Fetch-level
/// failures are logged and skipped inside the stages; anything that reaches
/// this point (store I/O, degenerate statistics, bad configuration) ends the
/// run with a non-zero exit code.
fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .init();

    let args: Args = Args::parse();

    return match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            let _ = execute!(
                stdout(),
                SetForegroundColor(Color::Red),
                Print(format!("Error: {}\n", err)),
                ResetColor
            );
            ExitCode::FAILURE
        }
    };
}

fn run(args: &Args) -> Result<(), Error> {
    let config: Config = args.resolve_config()?;

    match &args.command {
        Command::Fetch => {
            let client: ApiClient = api_client(&config)?;
            run_fetch(&client, &config)?;
        }
        Command::Reconcile => {
            let client: ApiClient = api_client(&config)?;
            run_reconcile(&client, &config)?;
        }
        Command::Aggregate { json } => {
            run_aggregate(&config, json.as_deref())?;
        }
        Command::Run { json } => {
            let client: ApiClient = api_client(&config)?;
            run_fetch(&client, &config)?;
            run_reconcile(&client, &config)?;
            run_aggregate(&config, json.as_deref())?;
        }
    }
    return Ok(());
}
