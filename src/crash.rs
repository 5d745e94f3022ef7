//! Crash diagnostics.
//!
//! Before every decode the driver records the first bytes of the candidate and
//! the decoder's machine mode. If the decoder brings the process down with
//! SIGABRT, SIGSEGV or SIGBUS, the handler prints that record and exits, so the
//! faulting input can be fed to the decoder again without a debugger.
//!
//! The handler runs at an arbitrary point, possibly in the middle of the
//! decoder, so it only reads the atomics below, formats into a stack buffer
//! and leaves through `write(2)` and `_exit(2)`. No allocation, no locks.
use crate::{decoder::MachineMode, Error};
use nix::{
    libc,
    sys::signal::{sigaction, SaFlags, SigAction, SigHandler, SigSet, Signal},
    unistd::write,
};
use std::{
    fmt::{self, Write},
    os::raw::c_int,
    sync::atomic::{AtomicBool, AtomicU8, Ordering},
};

/// Number of recorded input bytes.
pub const SNAPSHOT_LEN: usize = 16;

/// Signals routed to the crash handler.
pub const FATAL_SIGNALS: [Signal; 3] = [Signal::SIGABRT, Signal::SIGSEGV, Signal::SIGBUS];

// Mode id recorded before the first decode, displays as "(n/a)".
const NO_MODE: u8 = u8::MAX;

static SNAPSHOT: SnapshotCell = SnapshotCell::new();
static INSTALLED: AtomicBool = AtomicBool::new(false);

/// Plain copy of the recorded state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Snapshot {
    pub bytes: [u8; SNAPSHOT_LEN],
    pub mode_id: u8,
}

impl Snapshot {
    pub fn mode_name(&self) -> &'static str {
        MachineMode::name_of(self.mode_id)
    }
}

/// Lock-free storage of the last submitted input.
///
/// There is exactly one writer (the fuzz loop), relaxed ordering is enough
/// because the reader is a signal handler running on the same thread.
pub struct SnapshotCell {
    bytes: [AtomicU8; SNAPSHOT_LEN],
    mode_id: AtomicU8,
}

#[allow(clippy::declare_interior_mutable_const)]
const ZERO: AtomicU8 = AtomicU8::new(0);

impl SnapshotCell {
    pub const fn new() -> Self {
        Self {
            bytes: [ZERO; SNAPSHOT_LEN],
            mode_id: AtomicU8::new(NO_MODE),
        }
    }

    /// Overwrite with the head of `input`, missing bytes are recorded as 0.
    pub fn record(&self, input: &[u8], mode: MachineMode) {
        for (i, slot) in self.bytes.iter().enumerate() {
            slot.store(input.get(i).copied().unwrap_or(0), Ordering::Relaxed);
        }
        self.mode_id.store(mode.id(), Ordering::Relaxed);
    }

    pub fn load(&self) -> Snapshot {
        let mut bytes = [0; SNAPSHOT_LEN];
        for (b, slot) in bytes.iter_mut().zip(self.bytes.iter()) {
            *b = slot.load(Ordering::Relaxed);
        }
        Snapshot {
            bytes,
            mode_id: self.mode_id.load(Ordering::Relaxed),
        }
    }
}

impl Default for SnapshotCell {
    fn default() -> Self {
        Self::new()
    }
}

/// Record the input about to be decoded, call right before each decode.
#[inline]
pub fn record_snapshot(input: &[u8], mode: MachineMode) {
    SNAPSHOT.record(input, mode)
}

/// Last recorded input.
pub fn last_snapshot() -> Snapshot {
    SNAPSHOT.load()
}

pub fn signal_str(sig: c_int) -> &'static str {
    match sig {
        libc::SIGABRT => "SIGABRT",
        libc::SIGSEGV => "SIGSEGV",
        libc::SIGBUS => "SIGBUS",
        _ => "n/a",
    }
}

/// Format the crash report of `snapshot` for signal `sig`.
pub fn write_report<W: Write>(w: &mut W, sig: c_int, snapshot: &Snapshot) -> fmt::Result {
    w.write_char('\n')?;
    writeln!(
        w,
        "Machine mode: {} ({})",
        snapshot.mode_id,
        snapshot.mode_name()
    )?;
    writeln!(w, "Opcode at time of {}:", signal_str(sig))?;
    for b in snapshot.bytes.iter() {
        write!(w, "{:02X} ", b)?;
    }
    w.write_char('\n')
}

/// Fixed size formatting target, extra output is dropped.
struct StackWriter {
    buf: [u8; 256],
    len: usize,
}

impl StackWriter {
    fn new() -> Self {
        Self {
            buf: [0; 256],
            len: 0,
        }
    }

    fn as_bytes(&self) -> &[u8] {
        &self.buf[..self.len]
    }
}

impl Write for StackWriter {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        let n = s.len().min(self.buf.len() - self.len);
        self.buf[self.len..self.len + n].copy_from_slice(&s.as_bytes()[..n]);
        self.len += n;
        if n < s.len() {
            Err(fmt::Error)
        } else {
            Ok(())
        }
    }
}

fn write_all(fd: c_int, mut data: &[u8]) {
    while !data.is_empty() {
        match write(fd, data) {
            Ok(0) => break,
            Ok(n) => data = &data[n..],
            Err(e) if e.as_errno() == Some(nix::errno::Errno::EINTR) => continue,
            Err(_) => break,
        }
    }
}

extern "C" fn handle_fatal_signal(sig: c_int) {
    let snapshot = SNAPSHOT.load();
    let mut out = StackWriter::new();
    let _ = write_report(&mut out, sig, &snapshot);
    write_all(libc::STDOUT_FILENO, out.as_bytes());
    unsafe { libc::_exit(libc::EXIT_FAILURE) }
}

/// Install the crash handler for `FATAL_SIGNALS`, must happen before the first
/// decode. Once every signal is covered, later calls do nothing; a failed
/// install can be retried.
pub fn install_fault_handler() -> Result<(), Error> {
    if INSTALLED.load(Ordering::SeqCst) {
        return Ok(());
    }
    let action = SigAction::new(
        SigHandler::Handler(handle_fatal_signal),
        SaFlags::empty(),
        SigSet::empty(),
    );
    for &signal in FATAL_SIGNALS.iter() {
        // SAFETY: the handler only touches atomics and async-signal-safe calls.
        unsafe { sigaction(signal, &action) }
            .map_err(|source| Error::FaultHandler { signal, source })?;
    }
    INSTALLED.store(true, Ordering::SeqCst);
    log::debug!("crash handler installed");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_and_load() {
        let cell = SnapshotCell::new();
        assert_eq!(cell.load().mode_name(), "(n/a)");
        let input: Vec<u8> = (0..64).collect();
        cell.record(&input, MachineMode::Long64);
        let snap = cell.load();
        assert_eq!(&snap.bytes[..], &input[..SNAPSHOT_LEN]);
        assert_eq!(snap.mode_id, 0);
        assert_eq!(snap.mode_name(), "long64");

        cell.record(&[0xAA, 0xBB], MachineMode::Legacy16);
        let snap = cell.load();
        assert_eq!(&snap.bytes[..3], &[0xAA, 0xBB, 0x00]);
        assert_eq!(snap.mode_name(), "protected16");
    }

    #[test]
    fn report_layout() {
        let snap = Snapshot {
            bytes: [
                0x66, 0x67, 0xC4, 0xE3, 0x78, 0x00, 0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07,
                0x08, 0x09, 0xFF,
            ],
            mode_id: MachineMode::Legacy32.id(),
        };
        let mut out = String::new();
        write_report(&mut out, libc::SIGSEGV, &snap).unwrap();
        assert_eq!(
            out,
            "\nMachine mode: 3 (protected32)\n\
             Opcode at time of SIGSEGV:\n\
             66 67 C4 E3 78 00 01 02 03 04 05 06 07 08 09 FF \n"
        );
    }

    #[test]
    fn unknown_signal() {
        let snap = Snapshot {
            bytes: [0; SNAPSHOT_LEN],
            mode_id: 42,
        };
        let mut out = String::new();
        write_report(&mut out, libc::SIGUSR1, &snap).unwrap();
        assert!(out.contains("Machine mode: 42 ((n/a))\n"));
        assert!(out.contains("Opcode at time of n/a:\n"));
        assert_eq!(signal_str(libc::SIGBUS), "SIGBUS");
        assert_eq!(signal_str(libc::SIGABRT), "SIGABRT");
    }

    #[test]
    fn stack_writer_fits_report() {
        let snap = Snapshot {
            bytes: [0xEE; SNAPSHOT_LEN],
            mode_id: NO_MODE,
        };
        let mut stack = StackWriter::new();
        let mut heap = String::new();
        write_report(&mut stack, libc::SIGABRT, &snap).unwrap();
        write_report(&mut heap, libc::SIGABRT, &snap).unwrap();
        assert_eq!(stack.as_bytes(), heap.as_bytes());
    }

    #[test]
    fn install_covers_every_fatal_signal() {
        install_fault_handler().unwrap();
        assert!(INSTALLED.load(Ordering::SeqCst));
        // a second call keeps the handlers in place.
        install_fault_handler().unwrap();
        let action = SigAction::new(
            SigHandler::Handler(handle_fatal_signal),
            SaFlags::empty(),
            SigSet::empty(),
        );
        for &signal in FATAL_SIGNALS.iter() {
            let old = unsafe { sigaction(signal, &action) }.unwrap();
            match old.handler() {
                SigHandler::Handler(f) => {
                    assert_eq!(f as usize, handle_fatal_signal as usize, "{:?}", signal)
                }
                _ => panic!("no crash handler for {:?}", signal),
            }
        }
    }

    #[test]
    fn stack_writer_truncates() {
        let mut w = StackWriter::new();
        let long = "x".repeat(300);
        assert!(w.write_str(&long).is_err());
        assert_eq!(w.as_bytes().len(), 256);
    }
}
