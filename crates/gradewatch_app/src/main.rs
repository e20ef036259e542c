mod adapters;
mod config;
mod logging;

use std::env;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use anyhow::Context;
use gradewatch_engine::{LogSink, RetryPolicy, Scheduler, SchedulerConfig};
use gradewatch_store::GradeStore;
use portal_logging::watch_info;

fn main() -> anyhow::Result<()> {
    let settings_path = env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("gradewatch.json"));
    let settings = config::load_settings(&settings_path)
        .with_context(|| format!("loading settings from {}", settings_path.display()))?;

    logging::initialize(settings.log);
    watch_info!("Booting up.");

    let accounts = config::load_accounts(&settings.accounts_path)
        .with_context(|| format!("loading accounts from {}", settings.accounts_path.display()))?;
    watch_info!("Loaded {} accounts.", accounts.len());

    let store = GradeStore::open(&settings.database_path).with_context(|| {
        format!(
            "opening grade store at {}",
            settings.database_path.display()
        )
    })?;
    let store = Arc::new(Mutex::new(store));

    let connector = Arc::new(adapters::CommandConnector::new(
        settings.driver_cmd.clone(),
        settings.portal_url.clone(),
    ));
    let oracle = Arc::new(adapters::CommandOracle::new(settings.ocr_cmd.clone()));

    let scheduler = Scheduler::new(
        accounts,
        connector,
        oracle,
        store,
        Arc::new(LogSink),
        SchedulerConfig {
            interval: settings.poll_interval,
            retry: RetryPolicy::default(),
        },
    )
    .context("constructing the scheduler")?;

    scheduler.start();
    scheduler.join();
    Ok(())
}
