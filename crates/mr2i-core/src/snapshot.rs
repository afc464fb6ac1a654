//! Canonical machine snapshots for save/restore and replay fixtures.
//!
//! A snapshot captures the complete machine state in a primitive-field
//! layout that is safe to serialize: microwords as raw integers, flags as
//! packed bits, RAM as a plain byte image. Decoding validates every
//! invariant before a [`Machine`](crate::machine::Machine) is rebuilt, so
//! an imported snapshot can never produce a machine the interpreter
//! could not have reached itself.

use thiserror::Error;

use crate::alu::Flags;
use crate::bus::{INPUT_PORTS, OUTPUT_PORTS, RAM_BYTES};
use crate::machine::{Machine, MICROPROGRAM_WORDS, REGISTER_COUNT};
use crate::microword::Microword;

/// Stable snapshot wire-version identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[repr(u16)]
pub enum SnapshotVersion {
    /// Initial schema revision.
    V1 = 1,
}

impl SnapshotVersion {
    /// Converts a wire value to a known snapshot version.
    #[must_use]
    pub const fn from_u16(version: u16) -> Option<Self> {
        match version {
            1 => Some(Self::V1),
            _ => None,
        }
    }
}

/// Validation failures when decoding a canonical snapshot payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error)]
pub enum SnapshotLayoutError {
    /// RAM payload did not contain exactly 252 bytes.
    #[error("invalid ram length: expected {expected} bytes, got {actual}")]
    InvalidRamLength {
        /// Required canonical RAM payload size.
        expected: usize,
        /// Provided RAM payload size.
        actual: usize,
    },
    /// A microprogram entry did not fit in 25 bits.
    #[error("microword {index} does not fit in 25 bits: {bits:#010X}")]
    InvalidMicroword {
        /// Microprogram address of the offending entry.
        index: usize,
        /// Raw value that failed validation.
        bits: u32,
    },
    /// The next-instruction pointer was outside the 5-bit range.
    #[error("next-instruction pointer out of range: {0}")]
    InvalidPointer(u8),
    /// The packed flag byte used bits above the defined three.
    #[error("invalid flag bits: {0:#04X}")]
    InvalidFlagBits(u8),
}

/// Canonical snapshot payload with explicit primitive field encoding.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct CanonicalStateLayout {
    /// Raw microprogram words in address order.
    pub microprogram: [u32; MICROPROGRAM_WORDS],
    /// RAM image in address order (252 bytes).
    pub ram: Box<[u8]>,
    /// General registers in index order.
    pub registers: [u8; REGISTER_COUNT],
    /// Input port latches in index order.
    pub input_ports: [u8; INPUT_PORTS],
    /// Output port latches in index order.
    pub output_ports: [u8; OUTPUT_PORTS],
    /// Packed flag register: carry bit 0, negative bit 1, zero bit 2.
    pub flags: u8,
    /// Next-instruction pointer (0..=31).
    pub pc: u8,
}

impl CanonicalStateLayout {
    /// Encodes a machine into the canonical snapshot layout.
    #[must_use]
    pub fn from_machine(machine: &Machine) -> Self {
        let mut microprogram = [0; MICROPROGRAM_WORDS];
        for (raw, word) in microprogram.iter_mut().zip(machine.microprogram()) {
            *raw = word.bits();
        }

        Self {
            microprogram,
            ram: machine.ram().to_vec().into_boxed_slice(),
            registers: *machine.registers(),
            input_ports: *machine.input_ports(),
            output_ports: *machine.output_ports(),
            flags: machine.flags().to_bits(),
            pc: machine.pc(),
        }
    }

    /// Decodes the canonical layout back into a machine.
    ///
    /// # Errors
    ///
    /// Returns [`SnapshotLayoutError`] when the payload violates a layout
    /// invariant (RAM length, microword width, pointer range, flag bits).
    pub fn try_into_machine(self) -> Result<Machine, SnapshotLayoutError> {
        if self.ram.len() != RAM_BYTES {
            return Err(SnapshotLayoutError::InvalidRamLength {
                expected: RAM_BYTES,
                actual: self.ram.len(),
            });
        }

        let mut microprogram = [Microword::ZERO; MICROPROGRAM_WORDS];
        for (index, (slot, raw)) in microprogram.iter_mut().zip(self.microprogram).enumerate() {
            *slot = Microword::new(raw)
                .ok_or(SnapshotLayoutError::InvalidMicroword { index, bits: raw })?;
        }

        if self.pc as usize >= MICROPROGRAM_WORDS {
            return Err(SnapshotLayoutError::InvalidPointer(self.pc));
        }

        let flags =
            Flags::from_bits(self.flags).ok_or(SnapshotLayoutError::InvalidFlagBits(self.flags))?;

        let mut ram = [0; RAM_BYTES];
        ram.copy_from_slice(&self.ram);

        Ok(Machine::from_parts(
            microprogram,
            ram,
            self.registers,
            self.input_ports,
            self.output_ports,
            flags,
            self.pc,
        ))
    }
}

/// Serializable full-state snapshot used for save/restore and replay.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct MachineSnapshot {
    /// Snapshot schema version.
    pub version: SnapshotVersion,
    /// Canonical, serialization-safe state payload.
    pub state: CanonicalStateLayout,
}

impl MachineSnapshot {
    /// Builds a canonical snapshot from a machine.
    #[must_use]
    pub fn from_machine(version: SnapshotVersion, machine: &Machine) -> Self {
        Self {
            version,
            state: CanonicalStateLayout::from_machine(machine),
        }
    }

    /// Converts this snapshot back into a machine.
    ///
    /// # Errors
    ///
    /// Returns [`SnapshotLayoutError`] when canonical payload validation
    /// fails.
    pub fn try_into_machine(self) -> Result<Machine, SnapshotLayoutError> {
        self.state.try_into_machine()
    }
}
