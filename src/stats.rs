use crate::decoder::DecoderConfig;
use std::io::{self, Write};

/// Dots between two counters.
pub const DOTS_PER_COUNTER: u64 = 10;

#[derive(Debug, Default, Clone)]
pub struct Stats {
    exec_total: u64,
    exec_per_config: [u64; 4],
}

impl Stats {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn inc_exec(&mut self, config: DecoderConfig) {
        self.exec_total += 1;
        self.exec_per_config[config.index()] += 1;
    }

    pub fn exec_total(&self) -> u64 {
        self.exec_total
    }

    pub fn exec_of(&self, config: DecoderConfig) -> u64 {
        self.exec_per_config[config.index()]
    }

    pub fn report(&self) {
        log::info!(
            "exec: {}, {}/{}/{}/{}: {}/{}/{}/{}",
            self.exec_total,
            DecoderConfig::X86_16,
            DecoderConfig::X86_32,
            DecoderConfig::X64Intel,
            DecoderConfig::X64Amd,
            self.exec_per_config[0],
            self.exec_per_config[1],
            self.exec_per_config[2],
            self.exec_per_config[3],
        );
    }
}

/// Breadcrumbs for passed tests: one dot per `interval` tests, plus a
/// counter in millions every 10 dots.
pub fn report_progress<W: Write>(out: &mut W, passed: u64, interval: u64) -> io::Result<()> {
    if passed % interval != 0 {
        return Ok(());
    }
    write!(out, ".")?;
    match interval.checked_mul(DOTS_PER_COUNTER) {
        Some(n) if passed % n == 0 => {
            writeln!(out, "[ {:4}M tests passed ]", passed / 1_000_000)?
        }
        _ => {}
    }
    out.flush()
}
