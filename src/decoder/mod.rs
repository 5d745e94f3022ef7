//! Decoder boundary.
//!
//! The fuzzer never looks into decoded instructions, it only needs the decode
//! call to return. Everything behind `Decoder` is the code under test.
use std::{fmt, str::FromStr};

pub mod iced;
pub mod stub;

/// Machine mode of a decoder. Discriminants are the numeric ids printed in
/// crash reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum MachineMode {
    Long64 = 0,
    Legacy32 = 3,
    Legacy16 = 4,
    Real16 = 5,
}

impl MachineMode {
    #[inline]
    pub fn id(self) -> u8 {
        self as u8
    }

    pub fn from_id(id: u8) -> Option<Self> {
        match id {
            0 => Some(MachineMode::Long64),
            3 => Some(MachineMode::Legacy32),
            4 => Some(MachineMode::Legacy16),
            5 => Some(MachineMode::Real16),
            _ => None,
        }
    }

    /// Display name of mode id `id`, `(n/a)` for unknown ids.
    pub fn name_of(id: u8) -> &'static str {
        Self::from_id(id).map(|m| m.name()).unwrap_or("(n/a)")
    }

    pub fn name(self) -> &'static str {
        match self {
            MachineMode::Long64 => "long64",
            MachineMode::Legacy32 => "protected32",
            MachineMode::Legacy16 => "protected16",
            MachineMode::Real16 => "real16",
        }
    }

    pub fn bitness(self) -> u32 {
        match self {
            MachineMode::Long64 => 64,
            MachineMode::Legacy32 => 32,
            MachineMode::Legacy16 | MachineMode::Real16 => 16,
        }
    }
}

impl fmt::Display for MachineMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.id(), self.name())
    }
}

/// Result of one decode call, both outcomes are fine for the fuzzer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeStatus {
    Decoded { len: usize },
    Invalid,
}

pub trait Decoder {
    fn machine_mode(&self) -> MachineMode;

    fn decode(&mut self, buf: &[u8]) -> DecodeStatus;
}

/// The four decoder configurations the fuzzer rotates through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecoderConfig {
    X86_16,
    X86_32,
    /// x86-64 with Intel branch behavior.
    X64Intel,
    /// x86-64 with AMD branch behavior.
    X64Amd,
}

impl DecoderConfig {
    pub const ALL: [DecoderConfig; 4] = [
        DecoderConfig::X86_16,
        DecoderConfig::X86_32,
        DecoderConfig::X64Intel,
        DecoderConfig::X64Amd,
    ];

    /// Pick a config from the low 2 bits of `r`.
    #[inline]
    pub fn from_selector(r: u32) -> Self {
        Self::ALL[(r & 3) as usize]
    }

    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn machine_mode(self) -> MachineMode {
        match self {
            DecoderConfig::X86_16 => MachineMode::Legacy16,
            DecoderConfig::X86_32 => MachineMode::Legacy32,
            DecoderConfig::X64Intel | DecoderConfig::X64Amd => MachineMode::Long64,
        }
    }

    #[inline]
    pub fn is_64bit(self) -> bool {
        self.machine_mode() == MachineMode::Long64
    }

    pub fn amd_branches(self) -> bool {
        self == DecoderConfig::X64Amd
    }
}

impl fmt::Display for DecoderConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DecoderConfig::X86_16 => "x86-16",
            DecoderConfig::X86_32 => "x86-32",
            DecoderConfig::X64Intel => "x86-64-intel",
            DecoderConfig::X64Amd => "x86-64-amd",
        };
        f.write_str(name)
    }
}

/// Decoder implementation to fuzz.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backend {
    Iced,
    /// Crash stubs, fault on the first decode call.
    Abort,
    Segv,
    Bus,
}

impl Backend {
    pub fn names() -> &'static [&'static str] {
        &["iced", "abort", "segv", "bus"]
    }
}

impl FromStr for Backend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "iced" => Ok(Backend::Iced),
            "abort" => Ok(Backend::Abort),
            "segv" => Ok(Backend::Segv),
            "bus" => Ok(Backend::Bus),
            _ => Err(format!(
                "unknown backend '{}', expected one of: {}",
                s,
                Self::names().join(", ")
            )),
        }
    }
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(Self::names()[*self as usize])
    }
}

/// One decoder per `DecoderConfig`, built once at startup.
pub struct DecoderSet {
    decoders: Vec<Box<dyn Decoder>>,
}

impl DecoderSet {
    pub fn new(backend: Backend) -> Self {
        let decoders = DecoderConfig::ALL
            .iter()
            .map(|&config| -> Box<dyn Decoder> {
                match backend {
                    Backend::Iced => Box::new(iced::IcedDecoder::new(config)),
                    Backend::Abort => Box::new(stub::CrashDecoder::new(config, stub::Fault::Abort)),
                    Backend::Segv => Box::new(stub::CrashDecoder::new(config, stub::Fault::Segv)),
                    Backend::Bus => Box::new(stub::CrashDecoder::new(config, stub::Fault::Bus)),
                }
            })
            .collect();
        Self { decoders }
    }

    #[inline]
    pub fn get_mut(&mut self, config: DecoderConfig) -> &mut dyn Decoder {
        self.decoders[config.index()].as_mut()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mode_names() {
        assert_eq!(MachineMode::name_of(0), "long64");
        assert_eq!(MachineMode::name_of(3), "protected32");
        assert_eq!(MachineMode::name_of(4), "protected16");
        assert_eq!(MachineMode::name_of(5), "real16");
        assert_eq!(MachineMode::name_of(1), "(n/a)");
        assert_eq!(MachineMode::Legacy16.to_string(), "4 (protected16)");
    }

    #[test]
    fn selector_uses_low_bits() {
        assert_eq!(DecoderConfig::from_selector(0), DecoderConfig::X86_16);
        assert_eq!(DecoderConfig::from_selector(5), DecoderConfig::X86_32);
        assert_eq!(DecoderConfig::from_selector(0xFFFF_FFFE), DecoderConfig::X64Intel);
        assert_eq!(DecoderConfig::from_selector(7), DecoderConfig::X64Amd);
        let long: Vec<_> = DecoderConfig::ALL.iter().filter(|c| c.is_64bit()).collect();
        assert_eq!(long, [&DecoderConfig::X64Intel, &DecoderConfig::X64Amd]);
    }

    #[test]
    fn backend_from_str() {
        for name in Backend::names() {
            let b: Backend = name.parse().unwrap();
            assert_eq!(b.to_string(), *name);
        }
        assert!("zydis".parse::<Backend>().is_err());
    }

    #[test]
    fn decoder_set_modes() {
        let mut set = DecoderSet::new(Backend::Iced);
        for &config in DecoderConfig::ALL.iter() {
            assert_eq!(set.get_mut(config).machine_mode(), config.machine_mode());
        }
    }
}
