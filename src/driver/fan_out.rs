use std::sync::mpsc::{self, RecvTimeoutError};
use std::thread;
use std::time::{Duration, Instant};

use log::{debug, error, info, warn};

use crate::device::Device;
use crate::driver::driver_config::DriverConfig;
use crate::driver::report::{DriverReport, WorkerReport};
use crate::errors::{EvalError, Result};
use crate::eval::eval_stats::EvalStats;
use crate::eval::runner::run_evaluation;
use crate::network::builder::{build_private_network, build_shared_network};
use crate::params::{ParameterStore, SharedParameters};

/// Work handed to one worker thread.
type Job = Box<dyn FnOnce() -> Result<Vec<EvalStats>> + Send + 'static>;

// ---------------------------------------------------------------------------
// Public entry points
// ---------------------------------------------------------------------------

/// Allocates one parameter store, freezes it and evaluates it from
/// `config.thread_count` threads, each of which builds its own network
/// over the shared store.
///
/// Returns only after every worker has finished.
pub fn eval_multi_threads_with_new_network(config: &DriverConfig, device: Device) -> Result<DriverReport> {
    let shared = ParameterStore::new(&config.network, device, config.param_seed)?.freeze();
    eval_with_shared_parameters(&shared, config, device)
}

/// Fans out over an already published store.
pub fn eval_with_shared_parameters(
    shared: &SharedParameters,
    config: &DriverConfig,
    device: Device,
) -> Result<DriverReport> {
    check_thread_count(config)?;

    let jobs: Vec<Job> = (0..config.thread_count)
        .map(|_| {
            let shared = shared.clone();
            let spec = config.network.clone();
            let eval = config.eval.clone();
            Box::new(move || {
                let network = build_shared_network(&spec, &shared)?;
                run_evaluation(&network, &eval, device)
            }) as Job
        })
        .collect();

    join_all(jobs, config.join_timeout())
}

/// Builds one network with its own parameters on the calling thread and
/// gives every worker a structural clone of it. The clones have their own
/// variables but read the same parameter storage, which is frozen before
/// the first clone is made.
pub fn eval_multi_threads_with_clone(config: &DriverConfig, device: Device) -> Result<DriverReport> {
    check_thread_count(config)?;

    let network = build_private_network(&config.network, device, config.param_seed)?;
    debug!(
        "cloning '{}' for {} workers: {} arguments, {} outputs",
        network.function().name(),
        config.thread_count,
        network.function().arguments().len(),
        network.function().outputs().len()
    );

    network.freeze();

    let jobs = (0..config.thread_count)
        .map(|_| {
            let clone = network.clone_shared()?;
            let eval = config.eval.clone();
            Ok(Box::new(move || run_evaluation(&clone, &eval, device)) as Job)
        })
        .collect::<Result<Vec<Job>>>()?;

    join_all(jobs, config.join_timeout())
}

// ---------------------------------------------------------------------------
// Private helpers
// ---------------------------------------------------------------------------

fn check_thread_count(config: &DriverConfig) -> Result<()> {
    if config.thread_count == 0 {
        return Err(EvalError::InvalidThreadCount);
    }
    Ok(())
}

/// Reports a worker's completion when dropped, so a thread that unwinds
/// from a panic still signals the driver.
struct DoneSignal {
    thread: usize,
    tx: mpsc::Sender<usize>,
}

impl Drop for DoneSignal {
    fn drop(&mut self) {
        // The driver may have stopped listening after a timeout.
        let _ = self.tx.send(self.thread);
    }
}

type WorkerHandle = thread::JoinHandle<Result<Vec<EvalStats>>>;

/// Joins one finished worker, keeping its stats or turning its outcome
/// into the matching error.
fn settle(th: usize, handle: WorkerHandle, workers: &mut Vec<WorkerReport>) -> Option<EvalError> {
    let outcome = handle.join();
    info!("thread {th} joined.");
    match outcome {
        Ok(Ok(stats)) => {
            workers.push(WorkerReport { thread: th, stats });
            None
        }
        Ok(Err(e)) => {
            error!("thread {th} failed: {e}");
            Some(EvalError::WorkerFailed { thread: th, source: Box::new(e) })
        }
        Err(_) => {
            error!("thread {th} panicked");
            Some(EvalError::WorkerPanicked { thread: th })
        }
    }
}

/// Spawns one named thread per job and joins all of them in spawn order.
///
/// With a timeout, completion is first awaited on a channel. If the
/// deadline passes, the threads that already finished are joined and the
/// rest are left detached: a finished worker's failure is returned if
/// there is one, `JoinTimeout` otherwise. Without a deadline the first
/// worker failure (by thread index) is reported once every worker has
/// been joined.
fn join_all(jobs: Vec<Job>, timeout: Option<Duration>) -> Result<DriverReport> {
    let t_start = Instant::now();
    let (done_tx, done_rx) = mpsc::channel::<usize>();

    let mut handles: Vec<WorkerHandle> = Vec::with_capacity(jobs.len());
    let mut spawn_error = None;
    for (th, job) in jobs.into_iter().enumerate() {
        let signal = DoneSignal { thread: th, tx: done_tx.clone() };
        let spawned = thread::Builder::new().name(format!("eval-{th}")).spawn(move || {
            let _signal = signal;
            job()
        });
        match spawned {
            Ok(handle) => {
                debug!("thread {th} started");
                handles.push(handle);
            }
            Err(e) => {
                spawn_error = Some(EvalError::Io(e));
                break;
            }
        }
    }
    drop(done_tx);

    if let (Some(timeout), None) = (timeout, &spawn_error) {
        let deadline = t_start + timeout;
        let mut finished = vec![false; handles.len()];
        let mut remaining = handles.len();
        while remaining > 0 {
            match done_rx.recv_timeout(deadline.saturating_duration_since(Instant::now())) {
                Ok(th) => {
                    finished[th] = true;
                    remaining -= 1;
                }
                Err(RecvTimeoutError::Disconnected) => break,
                Err(RecvTimeoutError::Timeout) => {
                    warn!("{remaining} worker thread(s) still running after {timeout:?}, leaving them detached");
                    let mut workers = Vec::new();
                    let mut first_error = None;
                    for (th, handle) in handles.into_iter().enumerate() {
                        if !finished[th] {
                            continue;
                        }
                        let failure = settle(th, handle, &mut workers);
                        if first_error.is_none() {
                            first_error = failure;
                        }
                    }
                    return Err(first_error.unwrap_or(EvalError::JoinTimeout {
                        pending: remaining,
                        timeout_ms: timeout.as_millis() as u64,
                    }));
                }
            }
        }
    }

    let mut workers = Vec::with_capacity(handles.len());
    let mut first_error = spawn_error;
    for (th, handle) in handles.into_iter().enumerate() {
        let failure = settle(th, handle, &mut workers);
        if first_error.is_none() {
            first_error = failure;
        }
    }

    if let Some(e) = first_error {
        return Err(e);
    }
    Ok(DriverReport {
        workers,
        elapsed_ms: t_start.elapsed().as_millis() as u64,
    })
}
