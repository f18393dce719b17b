pub mod dates;
pub mod input;
pub mod output;
pub mod session;
pub mod shutdown;

use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::Local;
use clap::Parser;
use dates::DateStyle;
use input::stdin_lines;
use session::Session;
use shutdown::detect_shutdown;
use tokio_util::sync::CancellationToken;
use tracing::{info, level_filters::LevelFilter};

use crate::{
    tracker::{collection::ActivitySet, Tracker, TrackerConfig},
    utils::{
        dir::{create_application_default_path, ensure_dir},
        logging::{enable_logging, SESSION_PREFIX},
        time::format_duration,
    },
};

#[derive(Parser, Debug)]
#[command(name = "daytally", version, long_about = None)]
#[command(about = "Tracks typed activities and breaks your time down by type and by day. Type `help` once started", long_about = None)]
pub struct Args {
    #[arg(
        long,
        value_delimiter = ',',
        help = "Recognized activity types, in color order. Defaults to reading,writing,coding,exercise,resting,socializing"
    )]
    catalog: Option<Vec<String>>,
    #[arg(long, help = "Print replies as json")]
    json: bool,
    #[arg(long, default_value_t = DateStyle::Uk, help = "Style of dates used during parsing. For Uk it's day/month/year. For Us it's month/day/year")]
    date_style: DateStyle,
    #[arg(long, help = "Mirror logs to stderr")]
    log: bool,
    #[arg(long = "log-filter", help = "Log level. Falls back to RUST_LOG, then info")]
    log_level: Option<LevelFilter>,
    #[arg(
        long = "log-dir",
        help = "Log directory. By default logs go to $XDG_STATE_HOME/daytally or $HOME/.local/state/daytally"
    )]
    log_dir: Option<PathBuf>,
}

impl Args {
    fn tracker_config(&self) -> TrackerConfig {
        match &self.catalog {
            Some(catalog) => TrackerConfig {
                catalog: catalog.clone(),
            },
            None => TrackerConfig::default(),
        }
    }
}

pub async fn run_cli() -> Result<()> {
    let args = Args::parse();

    let log_dir = match &args.log_dir {
        Some(dir) => ensure_dir(dir.clone())?,
        None => create_application_default_path()?.join("logs"),
    };
    enable_logging(SESSION_PREFIX, &log_dir, args.log_level, args.log)?;

    let tracker = Tracker::new(args.tracker_config()).context("Invalid tracker configuration")?;
    info!("Session started with catalog {:?}", tracker.catalog());

    let shutdown_token = CancellationToken::new();
    tokio::spawn(detect_shutdown(shutdown_token.clone()));

    let session = Session::new(tracker, Local, args.date_style, args.json);
    let tracker = session
        .run(
            stdin_lines()?,
            &mut std::io::stdout(),
            shutdown_token.clone(),
        )
        .await?;
    shutdown_token.cancel();

    let history = tracker.history();
    info!(
        "Session ended with {} activities, {} in total",
        history.len(),
        format_duration(history.total_duration())
    );
    Ok(())
}
