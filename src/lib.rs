//! Biased random fuzzer for x86 instruction decoders.
//!
//! Candidates are biased towards long prefix runs followed by multi-byte
//! escape sequences (0F, 0F38, 0F3A, 3dnow, VEX, EVEX, XOP), the places where
//! decoders keep their rarely exercised states. The fuzzer does not check decode
//! results, it only looks for process faults, and reports the input and mode
//! that were active when one happens.
pub mod config;
pub mod crash;
pub mod decoder;
pub mod fuzzer;
pub mod gen;
pub mod stats;
pub mod util;

use crate::{config::Config, fuzzer::Fuzzer};
use std::{io, os::raw::c_int};
use thiserror::Error;

pub type RngType = rand::rngs::SmallRng;

#[derive(Debug, Error)]
pub enum Error {
    #[error("config: {0}")]
    Config(String),
    #[error("failed to install crash handler for {signal:?}: {source}")]
    FaultHandler {
        signal: nix::sys::signal::Signal,
        source: nix::Error,
    },
    #[error("failed to register stop handler for signal {signal}: {source}")]
    StopHandler { signal: c_int, source: io::Error },
    #[error("io: {0}")]
    Io(#[from] io::Error),
}

/// Outcome of a run that was not cut short by a crash.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Summary {
    pub passed: u64,
    pub stopped: bool,
}

pub fn boot(config: Config) -> Result<Summary, Error> {
    config.check()?;
    crash::install_fault_handler()?;
    util::setup_signal_handler()?;

    log::info!(
        "seed: {}, iterations: {}, backend: {}",
        config.seed,
        config.iterations,
        config.backend
    );
    let iterations = config.iterations;
    let mut fuzzer = Fuzzer::new(config);
    let stdout = io::stdout();
    let mut out = stdout.lock();
    let passed = fuzzer.fuzz_loop(&mut out)?;
    fuzzer.stats.report();

    let summary = Summary {
        passed,
        stopped: passed < iterations,
    };
    if summary.stopped {
        log::warn!("stopped early, {}/{} tests passed", passed, iterations);
    } else {
        log::info!("All done, {} tests passed", passed);
    }
    Ok(summary)
}
