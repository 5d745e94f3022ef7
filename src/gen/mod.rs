//! Instruction bytes generation.
//!
//! A generated candidate is a 3-part sequence: a run of 0 to 15 legacy/REX
//! prefixes biased towards short runs, an escape sequence (none, 0F, 0F38, 0F3A,
//! 3dnow, VEX, EVEX or XOP) and uniform random filler up to 64 bytes.
use self::{
    escape::{gen_escape, EscapeKind},
    prefix::gen_prefixes,
};
use crate::RngType;
use rand::prelude::*;

// Prefix run generation.
pub mod prefix;
// Escape sequence selection and emission.
pub mod escape;

/// Size of every generated candidate.
pub const INSTR_BUF_LEN: usize = 64;
/// Upper bound of prefix run length.
pub const MAX_PREFIX_COUNT: usize = 15;

pub type InstrBuf = [u8; INSTR_BUF_LEN];

/// How a generated buffer decomposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GenTrace {
    pub prefix_count: usize,
    pub escape: EscapeKind,
    pub escape_len: usize,
}

impl GenTrace {
    /// Offset where uniform filler starts.
    #[inline]
    pub fn filler_offset(&self) -> usize {
        self.prefix_count + self.escape_len
    }
}

/// Generate 64 bytes of pseudo-random instruction content.
pub fn gen_instruction(rng: &mut RngType, is_64bit: bool) -> InstrBuf {
    gen_instruction_traced(rng, is_64bit).0
}

/// Same as `gen_instruction`, also returns the decomposition of the buffer.
pub fn gen_instruction_traced(rng: &mut RngType, is_64bit: bool) -> (InstrBuf, GenTrace) {
    let mut buf = [0; INSTR_BUF_LEN];

    let prefix_count = prefix_count(rng.gen_range(0..254));
    gen_prefixes(rng, &mut buf[..prefix_count], is_64bit);

    let (escape, escape_bytes) = gen_escape(rng);
    let escape_len = escape_bytes.len();
    buf[prefix_count..prefix_count + escape_len].copy_from_slice(&escape_bytes);

    let trace = GenTrace {
        prefix_count,
        escape,
        escape_len,
    };
    for b in buf[trace.filler_offset()..].iter_mut() {
        *b = rng.gen();
    }
    (buf, trace)
}

/// Map `r` in [0, 253] to a prefix count, biased towards smaller numbers.
#[inline]
pub fn prefix_count(r: u32) -> usize {
    debug_assert!(r < 254);
    ((r * r * r) >> 20) as usize
}
