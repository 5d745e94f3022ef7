//! Fuzz loop: select a decoder, generate, record, decode.
use crate::{
    config::Config,
    crash::record_snapshot,
    decoder::{DecodeStatus, DecoderConfig, DecoderSet},
    gen::{gen_instruction, InstrBuf},
    stats::{report_progress, Stats},
    util::stop_soon,
    RngType,
};
use rand::prelude::*;
use std::io::{self, Write};

/// One generated test case.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Case {
    pub config: DecoderConfig,
    pub buf: InstrBuf,
}

pub struct Fuzzer {
    pub rng: RngType,
    pub decoders: DecoderSet,
    pub stats: Stats,
    pub config: Config,
}

impl Fuzzer {
    pub fn new(config: Config) -> Self {
        Self {
            rng: RngType::seed_from_u64(config.seed),
            decoders: DecoderSet::new(config.backend),
            stats: Stats::new(),
            config,
        }
    }

    /// Select a decoder config and generate a candidate for it.
    pub fn next_case(&mut self) -> Case {
        let config = DecoderConfig::from_selector(self.rng.gen());
        let buf = gen_instruction(&mut self.rng, config.is_64bit());
        Case { config, buf }
    }

    /// Run one iteration. The decode status carries no meaning for the
    /// fuzzer, only a crash does.
    pub fn fuzz_one(&mut self) -> DecodeStatus {
        let case = self.next_case();
        let decoder = self.decoders.get_mut(case.config);
        record_snapshot(&case.buf, decoder.machine_mode());
        let status = decoder.decode(&case.buf);
        self.stats.inc_exec(case.config);
        status
    }

    /// Run `config.iterations` iterations, printing breadcrumbs to `out`.
    /// Returns the number of passed tests, less than requested only if a stop
    /// was requested.
    pub fn fuzz_loop<W: Write>(&mut self, out: &mut W) -> io::Result<u64> {
        let interval = self.config.progress_interval;
        for i in 0..self.config.iterations {
            if stop_soon() {
                log::info!("stop requested after {} tests", i);
                return Ok(i);
            }
            self.fuzz_one();
            report_progress(out, i + 1, interval)?;
        }
        Ok(self.config.iterations)
    }
}
