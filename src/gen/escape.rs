//! Escape sequence selection.
//!
//! The escape kind is picked by a die roll in `[0, ESCAPE_BUCKETS)`, each kind
//! owns a fixed range of buckets in `ESCAPE_TABLE`. VEX, EVEX and XOP payloads
//! are biased: with 75% probability the opcode map is masked to avoid known
//! invalid maps, and with 25% probability vvvv is forced to 1111.
use crate::RngType;
use rand::Rng;
use std::{fmt, ops::Deref, ops::RangeInclusive};

pub const ESCAPE_BUCKETS: u32 = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EscapeKind {
    /// Regular instruction without escape.
    Plain,
    /// 0F 0F
    Amd3dNow,
    /// 0F 38
    Map0F38,
    /// 0F 3A
    Map0F3A,
    /// 0F
    Map0F,
    Evex,
    Vex3,
    Vex2,
    Xop,
}

/// Bucket ranges of each kind, must cover `[0, ESCAPE_BUCKETS)` without gaps.
pub const ESCAPE_TABLE: [(RangeInclusive<u32>, EscapeKind); 9] = [
    (0..=0, EscapeKind::Plain),
    (1..=1, EscapeKind::Amd3dNow),
    (2..=2, EscapeKind::Map0F38),
    (3..=3, EscapeKind::Map0F3A),
    (4..=4, EscapeKind::Map0F),
    (5..=10, EscapeKind::Evex),
    (11..=16, EscapeKind::Vex3),
    (17..=22, EscapeKind::Vex2),
    (23..=49, EscapeKind::Xop),
];

// Bits tested for the 75%/25% decisions.
const BIAS_BITS: u32 = 0x300;
const VVVV_BITS: u8 = 0x78;

impl EscapeKind {
    /// Number of emitted bytes.
    pub fn len(self) -> usize {
        use EscapeKind::*;
        match self {
            Plain => 0,
            Map0F => 1,
            Amd3dNow | Map0F38 | Map0F3A | Vex2 => 2,
            Evex | Vex3 | Xop => 3,
        }
    }

    pub fn is_empty(self) -> bool {
        self == EscapeKind::Plain
    }

    /// First emitted byte.
    pub fn lead_byte(self) -> Option<u8> {
        use EscapeKind::*;
        match self {
            Plain => None,
            Amd3dNow | Map0F38 | Map0F3A | Map0F => Some(0x0F),
            Evex => Some(0x62),
            Vex3 => Some(0xC4),
            Vex2 => Some(0xC5),
            Xop => Some(0x8F),
        }
    }

    /// Number of 32-bit random values consumed by the payload.
    pub fn draws(self) -> usize {
        use EscapeKind::*;
        match self {
            Vex2 => 1,
            Evex | Vex3 | Xop => 2,
            _ => 0,
        }
    }

    /// Encode the sequence from the payload values `rv1` and `rv2`; values
    /// a kind does not draw are ignored.
    pub fn encode(self, rv1: u32, rv2: u32) -> EscapeBytes {
        use EscapeKind::*;
        match self {
            Plain => EscapeBytes::new(&[]),
            Amd3dNow => EscapeBytes::new(&[0x0F, 0x0F]),
            Map0F38 => EscapeBytes::new(&[0x0F, 0x38]),
            Map0F3A => EscapeBytes::new(&[0x0F, 0x3A]),
            Map0F => EscapeBytes::new(&[0x0F]),
            Evex => EscapeBytes::new(&[0x62, map_byte(rv1, 0xF7), vvvv_byte(rv2)]),
            Vex3 => EscapeBytes::new(&[0xC4, map_byte(rv1, 0xE3), vvvv_byte(rv2)]),
            Vex2 => EscapeBytes::new(&[0xC5, vvvv_byte(rv1)]),
            // XOP map select bit is inverted compared to VEX.
            Xop => EscapeBytes::new(&[0x8F, map_byte(rv1, 0xE3) ^ 0x08, vvvv_byte(rv2)]),
        }
    }
}

impl fmt::Display for EscapeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use EscapeKind::*;
        let name = match self {
            Plain => "none",
            Amd3dNow => "3dnow",
            Map0F38 => "0F38",
            Map0F3A => "0F3A",
            Map0F => "0F",
            Evex => "EVEX",
            Vex3 => "VEX3",
            Vex2 => "VEX2",
            Xop => "XOP",
        };
        f.write_str(name)
    }
}

/// Whether a payload value takes the 75% branch.
#[inline]
pub fn biased(rv: u32) -> bool {
    rv & BIAS_BITS != 0
}

#[inline]
fn map_byte(rv: u32, mask: u8) -> u8 {
    let b = rv as u8;
    if biased(rv) {
        b & mask
    } else {
        b
    }
}

#[inline]
fn vvvv_byte(rv: u32) -> u8 {
    let b = rv as u8;
    if biased(rv) {
        b
    } else {
        b | VVVV_BITS
    }
}

/// Inline storage of at most 3 escape bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EscapeBytes {
    buf: [u8; 3],
    len: u8,
}

impl EscapeBytes {
    fn new(bytes: &[u8]) -> Self {
        let mut buf = [0; 3];
        buf[..bytes.len()].copy_from_slice(bytes);
        Self {
            buf,
            len: bytes.len() as u8,
        }
    }
}

impl Deref for EscapeBytes {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        &self.buf[..self.len as usize]
    }
}

/// Map a bucket in `[0, ESCAPE_BUCKETS)` to its kind.
pub fn escape_kind(bucket: u32) -> EscapeKind {
    ESCAPE_TABLE
        .iter()
        .find(|(r, _)| r.contains(&bucket))
        .map(|(_, k)| *k)
        .unwrap_or(EscapeKind::Xop)
}

/// Roll the escape kind, then draw its payload.
pub fn gen_escape(rng: &mut RngType) -> (EscapeKind, EscapeBytes) {
    let kind = escape_kind(rng.gen_range(0..ESCAPE_BUCKETS));
    let bytes = match kind.draws() {
        0 => kind.encode(0, 0),
        1 => kind.encode(rng.gen(), 0),
        _ => {
            let rv1 = rng.gen();
            let rv2 = rng.gen();
            kind.encode(rv1, rv2)
        }
    };
    (kind, bytes)
}
