//! Table-driven bit selection shared by every DES stage.
//!
//! Tables list 1-indexed bit positions counted from the most significant
//! bit of the input field, as printed in FIPS 46-3.

/// Select and reorder bits of a `input_len`-bit field.
///
/// Output bit `i` (counting from the most significant output bit) is input
/// bit `table[i]`. The output is `table.len()` bits wide, right-aligned.
pub fn permute(input: u64, table: &[u8], input_len: u32) -> u64 {
    debug_assert!(table.len() <= 64);
    table.iter().fold(0u64, |out, &pos| {
        debug_assert!(pos >= 1 && u32::from(pos) <= input_len);
        let bit = (input >> (input_len - u32::from(pos))) & 1;
        (out << 1) | bit
    })
}

/// Rotate a 28-bit half-key left by `bits`.
pub fn rotate_left_28(value: u32, bits: u32) -> u32 {
    const MASK: u32 = 0x0FFF_FFFF;
    let value = value & MASK;
    ((value << bits) | (value >> (28 - bits))) & MASK
}
