//! Evaluates one feed-forward classifier from several threads at once.
//!
//! Usage:
//!   shared-eval [new|clone] [device] [threads] [config.json]
//!
//! - `new`  : one frozen parameter store, every thread builds its own network over it
//! - `clone`: one network built up front, every thread gets a structural clone of it
//!
//! `device` is `cpu`, `gpu` or `gpu:N` (default `cpu`), `threads` defaults
//! to 4. Without a config file the 937 → 6 x 2048 → 9304 reference network
//! is used.
use std::process::ExitCode;

use log::{error, info};
use shared_eval::{
    eval_multi_threads_with_clone, eval_multi_threads_with_new_network, Device, DriverConfig, DriverReport,
    EvalError, Result,
};

enum Mode {
    NewNetwork,
    Clone,
}

fn parse_args(args: &[String]) -> Result<(Mode, Device, DriverConfig)> {
    let mode = match args.first().map(String::as_str) {
        None | Some("new") => Mode::NewNetwork,
        Some("clone") => Mode::Clone,
        Some(other) => {
            return Err(EvalError::InvalidSpec {
                message: format!("unknown mode '{other}', expected 'new' or 'clone'"),
            })
        }
    };
    let device = match args.get(1) {
        Some(s) => s.parse::<Device>()?,
        None => Device::Cpu,
    };
    let mut config = match args.get(3) {
        Some(path) => DriverConfig::load_json(path)?,
        None => DriverConfig::default(),
    };
    if let Some(threads) = args.get(2) {
        config.thread_count = threads.parse::<usize>().map_err(|_| EvalError::InvalidThreadCount)?;
    }
    Ok((mode, device, config))
}

fn print_report(report: &DriverReport) {
    for worker in &report.workers {
        let last = worker.stats.last();
        println!(
            "thread {}: {} evaluations, last loss = {:.4}, last error = {:.3}",
            worker.thread,
            worker.stats.len(),
            last.map_or(0.0, |s| s.mean_loss),
            last.map_or(0.0, |s| s.error_rate),
        );
    }
    println!(
        "{} forward passes across {} threads in {} ms (mean loss {:.4})",
        report.total_evaluations(),
        report.workers.len(),
        report.elapsed_ms,
        report.mean_loss()
    );
}

fn run() -> Result<()> {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let (mode, device, config) = parse_args(&args)?;

    let spec = &config.network;
    info!(
        "{} threads on {}: {} -> {} x {} -> {}",
        config.thread_count, device, spec.input_dim, spec.hidden_layers, spec.hidden_dim, spec.num_classes
    );

    let report = match mode {
        Mode::NewNetwork => eval_multi_threads_with_new_network(&config, device)?,
        Mode::Clone => eval_multi_threads_with_clone(&config, device)?,
    };
    print_report(&report);
    Ok(())
}

fn main() -> ExitCode {
    if let Err(e) = stderrlog::new().module("shared_eval").verbosity(2usize).init() {
        eprintln!("could not initialize logging: {e}");
    }

    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn defaults_without_arguments() {
        let (mode, device, config) = parse_args(&[]).unwrap();
        assert!(matches!(mode, Mode::NewNetwork));
        assert_eq!(device, Device::Cpu);
        assert_eq!(config, DriverConfig::default());
    }

    #[test]
    fn mode_device_and_threads() {
        let (mode, device, config) = parse_args(&args(&["clone", "gpu:1", "8"])).unwrap();
        assert!(matches!(mode, Mode::Clone));
        assert_eq!(device, Device::Gpu(1));
        assert_eq!(config.thread_count, 8);
    }

    #[test]
    fn bad_arguments_are_rejected() {
        assert!(matches!(parse_args(&args(&["train"])), Err(EvalError::InvalidSpec { .. })));
        assert!(matches!(parse_args(&args(&["new", "tpu"])), Err(EvalError::InvalidDevice(_))));
        assert!(matches!(parse_args(&args(&["new", "cpu", "four"])), Err(EvalError::InvalidThreadCount)));
        assert!(matches!(
            parse_args(&args(&["new", "cpu", "2", "/nonexistent/shared-eval.json"])),
            Err(EvalError::Io(_))
        ));
    }

    #[test]
    fn thread_argument_overrides_the_config_file() {
        let path = std::env::temp_dir().join(format!("shared-eval-cli-{}.json", std::process::id()));
        let mut file_config = DriverConfig::default();
        file_config.thread_count = 2;
        file_config.save_json(path.to_str().unwrap()).unwrap();

        let (_, _, config) = parse_args(&args(&["new", "cpu", "6", path.to_str().unwrap()])).unwrap();
        assert_eq!(config.thread_count, 6);
        let _ = std::fs::remove_file(path);
    }
}
