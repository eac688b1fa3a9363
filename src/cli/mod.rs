use std::{io, path::PathBuf, time::Duration};

use anyhow::Result;
use clap::{CommandFactory, Parser};
use tracing::{debug, level_filters::LevelFilter};

use crate::{
    api::client::JamfClient,
    audit::report,
    config::{
        AuditConfig, UsageWindow, DEFAULT_APPLICATION, DEFAULT_TIMEOUT_SECONDS,
        DEFAULT_WINDOW_DAYS,
    },
    utils::{
        clock::{Clock, DefaultClock},
        dir::{create_application_default_path, ensure_dir},
        logging::{enable_logging, CLI_PREFIX},
        runtime::single_thread_runtime,
    },
};

#[derive(Parser, Debug)]
#[command(name = "whoused", version, long_about = None)]
#[command(
    about = "Finds which managed computers actually use an installed application",
    long_about = None
)]
pub struct Args {
    #[arg(
        default_value = DEFAULT_APPLICATION,
        help = "Application name as reported by inventory, e.g. \"Docker.app\""
    )]
    application: String,
    #[arg(
        long,
        env = "WHOUSED_API_URL",
        help = "Classic API root, e.g. https://example.jamfcloud.com/JSSResource/"
    )]
    url: String,
    #[arg(
        long,
        env = "WHOUSED_API_TOKEN",
        hide_env_values = true,
        help = "Bearer token used for every request"
    )]
    token: String,
    #[arg(long, default_value_t = DEFAULT_WINDOW_DAYS, help = "Number of days of usage to look at, ending today")]
    days: u32,
    #[arg(
        long,
        default_value_t = 1,
        help = "Maximum number of usage requests in flight. Output order doesn't depend on it"
    )]
    concurrency: usize,
    #[arg(
        long,
        default_value_t = DEFAULT_TIMEOUT_SECONDS,
        help = "Request timeout in seconds. 0 waits forever"
    )]
    timeout: u64,
    #[arg(long, help = "Enable logging to stderr")]
    log: bool,
    #[arg(
        long,
        help = "Application directory, logs are kept in its logs subdirectory. By default tries to save into $XDG_STATE_HOME or $HOME/.local/state"
    )]
    log_dir: Option<PathBuf>,
}

impl Args {
    pub fn to_config(&self) -> Result<AuditConfig> {
        let timeout = (self.timeout > 0).then(|| Duration::from_secs(self.timeout));
        let config = AuditConfig::new(
            &self.url,
            self.token.clone(),
            self.application.clone(),
            self.days,
        )
        .and_then(|config| config.with_concurrency(self.concurrency))
        .map_err(|e| {
            Args::command().error(clap::error::ErrorKind::ValueValidation, format!("{e}"))
        })?;
        Ok(config.with_timeout(timeout))
    }
}

pub fn run_cli() -> Result<()> {
    let args = Args::parse();

    let logging_level = if args.log {
        Some(LevelFilter::TRACE)
    } else {
        None
    };
    let log_dir = args
        .log_dir
        .clone()
        .map_or_else(create_application_default_path, ensure_dir)?;
    enable_logging(CLI_PREFIX, &log_dir, logging_level, args.log)?;

    let config = args.to_config()?;
    debug!("Running with {config:?}");

    run_report(config, &DefaultClock)
}

/// Builds the client and prints the report to stdout. Failures of the report itself are part of
/// the output, only setup failures are returned.
pub fn run_report(config: AuditConfig, clock: &impl Clock) -> Result<()> {
    let window = UsageWindow::from_clock(clock, config.window_days);
    let client = JamfClient::new(&config)?;

    single_thread_runtime()?.block_on(async move {
        let mut stdout = io::stdout().lock();
        report(&client, &config, &window, &mut stdout).await
    })?;
    Ok(())
}
