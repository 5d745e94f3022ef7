//! Generate runs of x86 single-byte instruction prefixes.
use crate::RngType;
use rand::Rng;

/// Number of REX prefixes at the tail of `PREFIX_TABLE`.
pub const REX_PREFIX_COUNT: usize = 16;

/// Legal single-byte prefixes, duplicated entries bias the selection.
/// The last `REX_PREFIX_COUNT` entries must be REX.
pub const PREFIX_TABLE: [u8; 44] = [
    0x66, 0x67, 0xF2, 0xF3, //
    0x66, 0x67, 0xF2, 0xF3, //
    0x66, 0x67, 0xF2, 0xF3, //
    0x66, 0x67, 0xF2, 0xF3, //
    // segment overrides
    0x26, 0x2E, 0x36, 0x3E, //
    0x26, 0x2E, 0x36, 0x3E, //
    0x64, 0x65, 0x66, 0xF0, //
    // REX
    0x40, 0x41, 0x42, 0x43, //
    0x44, 0x45, 0x46, 0x47, //
    0x48, 0x49, 0x4A, 0x4B, //
    0x4C, 0x4D, 0x4E, 0x4F,
];

/// Prefixes eligible in the given mode, REX only exists in 64-bit mode.
#[inline]
pub fn prefix_table(is_64bit: bool) -> &'static [u8] {
    if is_64bit {
        &PREFIX_TABLE[..]
    } else {
        &PREFIX_TABLE[..PREFIX_TABLE.len() - REX_PREFIX_COUNT]
    }
}

/// Fill `dst` with prefixes drawn uniformly from the eligible table.
///
/// Redundant and repeated prefixes are expected, `dst.len()` should not
/// exceed 15.
pub fn gen_prefixes(rng: &mut RngType, dst: &mut [u8], is_64bit: bool) {
    let table = prefix_table(is_64bit);
    for b in dst.iter_mut() {
        *b = table[rng.gen_range(0..table.len() as u32) as usize];
    }
}
