//! Decoders that fault on purpose, used to check the crash report path end to end.
use super::{DecodeStatus, Decoder, DecoderConfig, MachineMode};
use nix::sys::signal::{raise, Signal};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fault {
    Abort,
    Segv,
    Bus,
}

pub struct CrashDecoder {
    mode: MachineMode,
    fault: Fault,
}

impl CrashDecoder {
    pub fn new(config: DecoderConfig, fault: Fault) -> Self {
        Self {
            mode: config.machine_mode(),
            fault,
        }
    }
}

impl Decoder for CrashDecoder {
    fn machine_mode(&self) -> MachineMode {
        self.mode
    }

    fn decode(&mut self, _buf: &[u8]) -> DecodeStatus {
        log::debug!("crash stub: raising {:?} in {}", self.fault, self.mode.name());
        let sig = match self.fault {
            Fault::Abort => std::process::abort(),
            Fault::Segv => Signal::SIGSEGV,
            Fault::Bus => Signal::SIGBUS,
        };
        let _ = raise(sig);
        // only reached if the signal was ignored.
        std::process::abort()
    }
}
