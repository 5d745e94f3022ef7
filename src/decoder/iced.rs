//! `iced-x86` backed decoder.
use super::{DecodeStatus, Decoder, DecoderConfig, MachineMode};
use iced_x86::{DecoderOptions, Instruction};

pub struct IcedDecoder {
    mode: MachineMode,
    options: u32,
    instr: Instruction,
}

impl IcedDecoder {
    pub fn new(config: DecoderConfig) -> Self {
        // KNC enables MVEX decoding behind the 0x62 escape.
        let mut options = DecoderOptions::KNC;
        if config.amd_branches() {
            options |= DecoderOptions::AMD;
        }
        Self {
            mode: config.machine_mode(),
            options,
            instr: Instruction::default(),
        }
    }
}

impl Decoder for IcedDecoder {
    #[inline]
    fn machine_mode(&self) -> MachineMode {
        self.mode
    }

    fn decode(&mut self, buf: &[u8]) -> DecodeStatus {
        let mut decoder = iced_x86::Decoder::with_ip(self.mode.bitness(), buf, 0, self.options);
        decoder.decode_out(&mut self.instr);
        if self.instr.is_invalid() {
            DecodeStatus::Invalid
        } else {
            DecodeStatus::Decoded {
                len: self.instr.len(),
            }
        }
    }
}
