use decfuzz::{
    config::{Config, DEFAULT_ITERATIONS, DEFAULT_PROGRESS_INTERVAL},
    decoder::Backend,
};
use simplelog::{LevelFilter, WriteLogger};
use structopt::StructOpt;

#[derive(Debug, StructOpt)]
#[structopt(
    name = "decfuzz",
    about = "Biased random fuzzer for x86 instruction decoders."
)]
struct Settings {
    /// Random seed, runs with the same seed generate the same inputs.
    #[structopt(default_value = "0")]
    seed: u64,
    /// Number of tests to run.
    #[structopt(short = "n", long)]
    iterations: Option<u64>,
    /// Print one progress dot per this many tests.
    #[structopt(short = "p", long)]
    progress_interval: Option<u64>,
    /// Decoder to fuzz: iced, or abort/segv/bus to check the crash report.
    #[structopt(short = "b", long, default_value = "iced")]
    backend: Backend,
    /// Only log warnings and errors.
    #[structopt(short, long)]
    quiet: bool,
}

pub fn main() {
    let settings = Settings::from_args();
    let level = if settings.quiet {
        LevelFilter::Warn
    } else {
        LevelFilter::Info
    };
    if let Err(e) = WriteLogger::init(level, simplelog::Config::default(), std::io::stderr()) {
        eprintln!("failed to init logger: {}", e);
    }

    let config = Config {
        seed: settings.seed,
        iterations: settings.iterations.unwrap_or(DEFAULT_ITERATIONS),
        progress_interval: settings
            .progress_interval
            .unwrap_or(DEFAULT_PROGRESS_INTERVAL),
        backend: settings.backend,
    };

    if let Err(e) = decfuzz::boot(config) {
        log::error!("{}", e);
        std::process::exit(2);
    }
}
