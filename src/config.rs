use crate::{decoder::Backend, stats::DOTS_PER_COUNTER, Error};

pub const DEFAULT_SEED: u64 = 0;
pub const DEFAULT_ITERATIONS: u64 = 2_000_000_000;
pub const DEFAULT_PROGRESS_INTERVAL: u64 = 1_000_000;

#[derive(Debug, Clone)]
pub struct Config {
    /// Seed of the single rng stream.
    pub seed: u64,
    pub iterations: u64,
    /// Print a progress dot every `progress_interval` passed tests, a counter
    /// every 10 dots.
    pub progress_interval: u64,
    pub backend: Backend,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            seed: DEFAULT_SEED,
            iterations: DEFAULT_ITERATIONS,
            progress_interval: DEFAULT_PROGRESS_INTERVAL,
            backend: Backend::Iced,
        }
    }
}

impl Config {
    pub fn check(&self) -> Result<(), Error> {
        if self.iterations == 0 {
            return Err(Error::Config("iterations must be greater than 0".to_string()));
        }
        if self.progress_interval == 0 {
            return Err(Error::Config(
                "progress interval must be greater than 0".to_string(),
            ));
        }
        if self.progress_interval > u64::MAX / DOTS_PER_COUNTER {
            return Err(Error::Config(format!(
                "progress interval must be at most {}",
                u64::MAX / DOTS_PER_COUNTER
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_valid() {
        let config = Config::default();
        assert!(config.check().is_ok());
        assert_eq!(config.seed, 0);
        assert_eq!(config.iterations, 2_000_000_000);
        assert_eq!(config.backend, Backend::Iced);
    }

    #[test]
    fn reject_zero() {
        let config = Config {
            iterations: 0,
            ..Default::default()
        };
        assert!(matches!(config.check(), Err(Error::Config(_))));
        let config = Config {
            progress_interval: 0,
            ..Default::default()
        };
        let err = config.check().unwrap_err();
        assert!(err.to_string().contains("progress interval"));
    }

    #[test]
    fn reject_huge_progress_interval() {
        let config = Config {
            progress_interval: u64::MAX,
            ..Default::default()
        };
        let err = config.check().unwrap_err();
        assert!(err.to_string().contains("at most"));
        let config = Config {
            progress_interval: u64::MAX / 10,
            ..Default::default()
        };
        assert!(config.check().is_ok());
    }
}
