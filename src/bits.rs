//! Pack/unpack helpers for bit-packed table fields.
//!
//! Fields are described by a mask over the unshifted value and a shift; setters
//! only touch the masked bits of the backing value.

pub const fn high_nibble(byte: u8) -> u8 {
    byte >> 4
}

pub const fn low_nibble(byte: u8) -> u8 {
    byte & 0x0F
}

pub const fn unpack_nibbles(byte: u8) -> (u8, u8) {
    (high_nibble(byte), low_nibble(byte))
}

pub const fn pack_nibbles(high: u8, low: u8) -> u8 {
    ((high & 0x0F) << 4) | (low & 0x0F)
}

pub const fn with_high_nibble(byte: u8, value: u8) -> u8 {
    pack_nibbles(value, low_nibble(byte))
}

pub const fn with_low_nibble(byte: u8, value: u8) -> u8 {
    pack_nibbles(high_nibble(byte), value)
}

/// Extracts `(value >> shift) & mask`.
pub const fn get_field(value: u32, mask: u32, shift: u32) -> u32 {
    (value >> shift) & mask
}

/// Replaces the field at `mask << shift` with `field`, preserving every other bit.
pub const fn set_field(value: u32, mask: u32, shift: u32, field: u32) -> u32 {
    (value & !(mask << shift)) | ((field & mask) << shift)
}

pub const fn is_set(value: u32, bit: u32) -> bool {
    value & (1 << bit) != 0
}

pub const fn with_bit(value: u32, bit: u32, on: bool) -> u32 {
    set_field(value, 1, bit, on as u32)
}
