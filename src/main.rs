use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Instant;

use clap::Parser;
use tracing::{error, info, warn};

use maven_check_versions::cli::Cli;
use maven_check_versions::config::{Config, config_path};
use maven_check_versions::logging::{self, DEFAULT_LOG_FILE};
use maven_check_versions::process::{self, RunMode};
use maven_check_versions::version::error::CheckError;

enum Outcome {
    Completed,
    Failed,
    Interrupted,
}

async fn execute(cli: &Cli) -> Result<(), CheckError> {
    let config = Config::load(cli.overrides(), &config_path(cli.config_file.clone()))?;
    let mode = RunMode::select(cli.pom_file.clone(), cli.find_artifact.clone());

    process::run(&config, mode).await
}

async fn run(cli: &Cli) -> Outcome {
    tokio::select! {
        result = execute(cli) => match result {
            Ok(()) => Outcome::Completed,
            Err(e) => {
                if !e.already_logged() {
                    error!("{}", e);
                }
                Outcome::Failed
            }
        },
        _ = tokio::signal::ctrl_c() => Outcome::Interrupted,
    }
}

fn wait_for_enter() {
    print!("Press Enter to continue");
    let _ = std::io::stdout().flush();
    let _ = std::io::stdin().read_line(&mut String::new());
}

fn main() -> anyhow::Result<ExitCode> {
    let started = Instant::now();
    let cli = Cli::parse();

    let log_file = (!cli.logfile_off).then(|| {
        cli.log_file
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_LOG_FILE))
    });
    let _guard = logging::init(log_file.as_deref())?;

    let outcome = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?
        .block_on(run(&cli));

    let code = match outcome {
        Outcome::Completed => {
            info!(
                "Processing is completed, {:.2} sec.",
                started.elapsed().as_secs_f64()
            );
            ExitCode::SUCCESS
        }
        Outcome::Failed => ExitCode::FAILURE,
        Outcome::Interrupted => {
            warn!("Processing is interrupted");
            ExitCode::FAILURE
        }
    };

    if !cli.ci_mode {
        wait_for_enter();
    }

    Ok(code)
}
