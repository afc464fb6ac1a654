//! Next-address computation for the microprogram sequencer.
//!
//! The sequencer is a pure function; it holds no state. Its only job is
//! to derive the low bit of the next microinstruction address from the
//! address control field and the flag state.

use crate::alu::Flags;

/// Computes the address of the next microinstruction.
///
/// Bits 4..1 of `next` always pass through unchanged; bit 0 is chosen by
/// the three-bit selector built from the address control field and bit 0
/// of `next`:
///
/// | MAC | N0 | result bit 0     |
/// |-----|----|------------------|
/// | 00  | x  | N0               |
/// | 01  | 0  | 1                |
/// | 01  | 1  | latched carry    |
/// | 10  | 0  | current carry    |
/// | 10  | 1  | current zero     |
/// | 11  | 0  | current negative |
/// | 11  | 1  | 0                |
///
/// `current` is the flag triple the ALU produced in this very microcycle,
/// whether or not it is being latched; `latched` is the flag register as
/// it stood before the cycle. The split lets a microprogram branch on a
/// carry computed many cycles earlier even when intervening operations
/// produced fresh carries that were never latched.
#[must_use]
pub const fn next_address(next: u8, address_control: u8, current: Flags, latched: Flags) -> u8 {
    let selector = (address_control & 0b11) << 1 | (next & 1);
    let low_bit = match selector {
        0b000 | 0b001 => next & 1,
        0b010 => 1,
        0b011 => latched.carry() as u8,
        0b100 => current.carry() as u8,
        0b101 => current.zero() as u8,
        0b110 => current.negative() as u8,
        _ => 0,
    };

    next & 0b1_1110 | low_bit
}
