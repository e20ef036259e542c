use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Condvar, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use gradewatch_core::{remaining_wait, Account};
use gradewatch_store::GradeStore;
use portal_logging::{watch_error, watch_info};
use thiserror::Error;

use crate::notify::NotificationSink;
use crate::port::{CaptchaOracle, PortalConnector};
use crate::session::{RetryPolicy, SessionError, SessionRunner};

#[derive(Debug, Error)]
pub enum SchedulerError {
    #[error("failed to spawn worker thread: {0}")]
    Spawn(#[from] std::io::Error),
}

#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    /// Poll interval, measured from cycle start.
    pub interval: Duration,
    pub retry: RetryPolicy,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(300),
            retry: RetryPolicy::default(),
        }
    }
}

/// Runs one independent polling worker per account.
///
/// Constructed explicitly by the process entry point and passed around by
/// handle; there is no hidden global instance. Workers scrape fully in
/// parallel; only the store write is serialized, under a single mutex held
/// just for the upsert.
pub struct Scheduler {
    workers: Vec<Worker>,
    gate: Arc<StartGate>,
    shutdown: Arc<AtomicBool>,
}

struct Worker {
    label: String,
    handle: thread::JoinHandle<()>,
}

impl Scheduler {
    /// Creates all workers without starting any of them. Every thread parks
    /// on the start gate until `start` opens it, so a partially constructed
    /// account list can never begin polling.
    pub fn new(
        accounts: Vec<Account>,
        connector: Arc<dyn PortalConnector>,
        oracle: Arc<dyn CaptchaOracle>,
        store: Arc<Mutex<GradeStore>>,
        sink: Arc<dyn NotificationSink>,
        config: SchedulerConfig,
    ) -> Result<Self, SchedulerError> {
        let gate = Arc::new(StartGate::new());
        let shutdown = Arc::new(AtomicBool::new(false));

        let mut workers = Vec::with_capacity(accounts.len());
        for account in accounts {
            let spawned = spawn_worker(
                account,
                connector.clone(),
                oracle.clone(),
                store.clone(),
                sink.clone(),
                config.clone(),
                gate.clone(),
                shutdown.clone(),
            );
            match spawned {
                Ok(worker) => workers.push(worker),
                Err(err) => {
                    // Release the already-parked threads so they can see
                    // the shutdown flag and exit.
                    shutdown.store(true, Ordering::Relaxed);
                    gate.open();
                    for worker in workers {
                        let _ = worker.handle.join();
                    }
                    return Err(err);
                }
            }
        }

        Ok(Self {
            workers,
            gate,
            shutdown,
        })
    }

    pub fn worker_count(&self) -> usize {
        self.workers.len()
    }

    /// Opens the start gate; all workers begin their first cycle.
    pub fn start(&self) {
        watch_info!("Starting {} account workers.", self.workers.len());
        self.gate.open();
    }

    /// Signals every worker to stop after its current cycle.
    pub fn request_shutdown(&self) {
        self.shutdown.store(true, Ordering::Relaxed);
    }

    /// Waits for all workers to finish. Blocks indefinitely unless a
    /// shutdown was requested.
    pub fn join(self) {
        for worker in self.workers {
            if worker.handle.join().is_err() {
                watch_error!("Worker for \"{}\" panicked.", worker.label);
            }
        }
    }

    /// Convenience: request shutdown and wait for the workers to drain.
    pub fn shutdown(self) {
        self.request_shutdown();
        self.join();
    }
}

#[allow(clippy::too_many_arguments)]
fn spawn_worker(
    account: Account,
    connector: Arc<dyn PortalConnector>,
    oracle: Arc<dyn CaptchaOracle>,
    store: Arc<Mutex<GradeStore>>,
    sink: Arc<dyn NotificationSink>,
    config: SchedulerConfig,
    gate: Arc<StartGate>,
    shutdown: Arc<AtomicBool>,
) -> Result<Worker, SchedulerError> {
    let label = account.label.clone();
    let handle = thread::Builder::new()
        .name(account.label.clone())
        .spawn(move || {
            gate.wait();
            if shutdown.load(Ordering::Relaxed) {
                return;
            }
            portal_logging::set_account_label(&account.label);
            watch_info!("Worker for \"{}\" starting.", account.label);

            let mut runner = SessionRunner::new(connector, oracle, config.retry.clone());
            while !shutdown.load(Ordering::Relaxed) {
                run_cycle(&mut runner, &account, &store, &sink, &shutdown, config.interval);
            }
            watch_info!("Worker for \"{}\" stopped.", account.label);
        })?;

    Ok(Worker { label, handle })
}

fn run_cycle(
    runner: &mut SessionRunner,
    account: &Account,
    store: &Mutex<GradeStore>,
    sink: &Arc<dyn NotificationSink>,
    shutdown: &AtomicBool,
    interval: Duration,
) {
    let cycle_start = Instant::now();

    match runner.run(account, shutdown) {
        Ok(results) => {
            // Serialize only the write; scrapes stay parallel.
            let upserted = {
                let mut store = store.lock().expect("lock grade store");
                store.upsert(&account.label, &results)
            };
            match upserted {
                Ok(changes) if !changes.is_empty() => sink.notify(&changes),
                Ok(_) => {}
                Err(err) => {
                    watch_error!("Store update failed for \"{}\": {}", account.label, err);
                }
            }
        }
        Err(SessionError::Cancelled) => return,
        Err(err) => {
            // The worker survives a failed cycle and keeps its cadence.
            watch_error!("Scrape failed for \"{}\": {}", account.label, err);
        }
    }

    let elapsed = cycle_start.elapsed();
    watch_info!(
        "Completed cycle for \"{}\" in {:.2?}; next in {:.2?}.",
        account.label,
        elapsed,
        remaining_wait(interval, elapsed)
    );
    wait_for_next_cycle(interval, cycle_start, shutdown);
}

/// Sleeps out the rest of the interval in short slices so a shutdown
/// request is honored promptly.
fn wait_for_next_cycle(interval: Duration, cycle_start: Instant, shutdown: &AtomicBool) {
    while !shutdown.load(Ordering::Relaxed) {
        let remaining = remaining_wait(interval, cycle_start.elapsed());
        if remaining.is_zero() {
            return;
        }
        thread::sleep(remaining.min(Duration::from_secs(1)));
    }
}

/// One-shot barrier: workers wait until the owner opens it.
struct StartGate {
    opened: Mutex<bool>,
    cond: Condvar,
}

impl StartGate {
    fn new() -> Self {
        Self {
            opened: Mutex::new(false),
            cond: Condvar::new(),
        }
    }

    fn open(&self) {
        let mut opened = self.opened.lock().expect("lock start gate");
        *opened = true;
        self.cond.notify_all();
    }

    fn wait(&self) {
        let mut opened = self.opened.lock().expect("lock start gate");
        while !*opened {
            opened = self.cond.wait(opened).expect("wait on start gate");
        }
    }
}
