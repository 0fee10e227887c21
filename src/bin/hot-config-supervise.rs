//! Minimal process supervisor honouring the restart exit code.
//!
//! Runs the given command as a child. Exit code 42 means "restart
//! requested", so the child is started again; any other exit ends the
//! supervisor with the child's code.

use std::process::ExitCode;
use std::time::Duration;

use clap::Parser;
use tokio::process::Command;

use hot_config::lifecycle::{signals, RESTART_EXIT_CODE};
use hot_config::observability::logging;
use hot_config::settings::ObservabilityConfig;

#[derive(Parser)]
#[command(name = "hot-config-supervise")]
#[command(about = "Run a command, restarting it whenever it exits with 42", long_about = None)]
struct Cli {
    /// Delay before restarting the child, in milliseconds.
    #[arg(long, default_value_t = 250)]
    restart_delay_ms: u64,

    /// Command and arguments to supervise (after --).
    #[arg(last = true, required = true)]
    cmd: Vec<String>,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    logging::init_logging(&ObservabilityConfig::default());

    let (program, args) = match cli.cmd.split_first() {
        Some(split) => split,
        None => return ExitCode::FAILURE,
    };

    let mut restarts: u64 = 0;
    loop {
        let mut child = match Command::new(program).args(args).kill_on_drop(true).spawn() {
            Ok(child) => child,
            Err(e) => {
                tracing::error!(program = %program, error = %e, "Failed to spawn child");
                return ExitCode::FAILURE;
            }
        };
        tracing::info!(program = %program, pid = ?child.id(), restarts, "Child started");

        let status = tokio::select! {
            status = child.wait() => status,
            _ = signals::wait_for_termination() => {
                tracing::info!("Stopping child");
                if let Err(e) = child.kill().await {
                    tracing::error!(error = %e, "Failed to kill child");
                }
                return ExitCode::SUCCESS;
            }
        };

        let code = match status {
            Ok(status) => status.code(),
            Err(e) => {
                tracing::error!(error = %e, "Failed to wait for child");
                return ExitCode::FAILURE;
            }
        };

        match code {
            Some(RESTART_EXIT_CODE) => {
                restarts += 1;
                tracing::info!(restarts, "Child requested restart");
                tokio::time::sleep(Duration::from_millis(cli.restart_delay_ms)).await;
            }
            Some(code) => {
                tracing::info!(code, "Child exited");
                return ExitCode::from(u8::try_from(code).unwrap_or(1));
            }
            None => {
                tracing::warn!("Child terminated by signal");
                return ExitCode::FAILURE;
            }
        }
    }
}
