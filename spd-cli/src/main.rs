//! SPD CLI - Command line tool for solar plants and their daily reports.

use clap::Parser;
use tokio::task::LocalSet;

#[derive(Parser)]
#[command(
    name = "spd-cli",
    version,
    about = "Solar plant dashboard toolkit"
)]
struct Cli {
    #[command(flatten)]
    backend: spd_cmd::BackendArgs,

    #[command(subcommand)]
    command: spd_cmd::Command,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    env_logger::init();
    let cli = Cli::parse();
    log::debug!("[SPD] backend args: {:?}", cli.backend);
    // Timers spawn local tasks.
    LocalSet::new().run_until(spd_cmd::run(cli.backend, cli.command)).await
}
