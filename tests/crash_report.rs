//! Drive the fuzzer binary with crashing decoders and check the crash report.
use decfuzz::{config::Config, decoder::Backend, fuzzer::Fuzzer};
use std::process::{Command, Output};

fn run(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_decfuzz"))
        .args(args)
        .output()
        .expect("failed to run decfuzz")
}

fn expected_report(seed: u64, signal: &str) -> String {
    let mut fuzzer = Fuzzer::new(Config {
        seed,
        backend: Backend::Iced,
        ..Default::default()
    });
    let case = fuzzer.next_case();
    let mode = case.config.machine_mode();
    let bytes: String = case.buf[..16]
        .iter()
        .map(|b| format!("{:02X} ", b))
        .collect();
    format!(
        "\nMachine mode: {} ({})\nOpcode at time of {}:\n{}\n",
        mode.id(),
        mode.name(),
        signal,
        bytes
    )
}

fn check_crash(seed: u64, backend: &str, signal: &str) {
    let seed_arg = seed.to_string();
    let out = run(&[&seed_arg, "-q", "-b", backend]);
    assert_eq!(out.status.code(), Some(1), "{:?}", out);
    let stdout = String::from_utf8_lossy(&out.stdout);
    assert_eq!(stdout, expected_report(seed, signal));
}

#[test]
fn abort_reports_first_case() {
    check_crash(42, "abort", "SIGABRT");
}

#[test]
fn segv_reports_first_case() {
    check_crash(42, "segv", "SIGSEGV");
    check_crash(7, "segv", "SIGSEGV");
}

#[test]
fn bus_reports_first_case() {
    check_crash(0, "bus", "SIGBUS");
}

#[test]
fn clean_run_exits_zero() {
    let out = run(&["42", "-q", "-n", "2000", "-p", "100"]);
    assert_eq!(out.status.code(), Some(0), "{:?}", out);
    assert_eq!(
        String::from_utf8_lossy(&out.stdout),
        "..........[    0M tests passed ]\n..........[    0M tests passed ]\n"
    );
}

#[test]
fn bad_config_exits_two() {
    let out = run(&["-n", "0"]);
    assert_eq!(out.status.code(), Some(2), "{:?}", out);
    assert!(out.stdout.is_empty());
}
