use crate::Error;
use signal_hook::{consts::TERM_SIGNALS, low_level};
use std::sync::atomic::{AtomicBool, Ordering};

static STOP_SOON: AtomicBool = AtomicBool::new(false);

pub fn stop_soon() -> bool {
    STOP_SOON.load(Ordering::Relaxed)
}

pub fn stop_req() {
    STOP_SOON.store(true, Ordering::Relaxed)
}

/// Request a clean stop of the fuzz loop on SIGINT, SIGQUIT and SIGTERM.
pub fn setup_signal_handler() -> Result<(), Error> {
    for &signal in TERM_SIGNALS {
        // SAFETY: `stop_req` only stores to an atomic.
        unsafe { low_level::register(signal, stop_req) }
            .map_err(|source| Error::StopHandler { signal, source })?;
        log::debug!(
            "stop on {}",
            low_level::signal_name(signal).unwrap_or("unknown")
        );
    }
    Ok(())
}
