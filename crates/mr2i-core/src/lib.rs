//! Executable model of the *Minirechner 2i*, a pedagogical 8-bit
//! microcoded processor.
//!
//! A program is up to 32 microinstructions of 25 bits held in a writable
//! microprogram store. Executing one microinstruction routes operands
//! from the register file, RAM or the memory-mapped input ports through
//! the 8-bit ALU, optionally writes the result back to a register, RAM
//! or an output port, optionally latches the status flags, and derives
//! the address of the next microinstruction from the current word and
//! the flag state.
//!
//! The crate is single-threaded and synchronous: [`Machine::step`] runs
//! one microcycle to completion or to a fault, with no suspension
//! points. Sharing a machine across threads is the caller's
//! responsibility.
//!
//! ```
//! use mr2i_core::{Machine, Microword};
//!
//! let mut machine = Machine::new();
//! // R1 = 5
//! let word = Microword::new(0b00_00001_00_001_0101_01_01_0001_0).unwrap();
//! machine.load_microword(0, word)?;
//! machine.step()?;
//! assert_eq!(machine.read_register(1)?, 5);
//! assert_eq!(machine.pc(), 1);
//! # Ok::<(), mr2i_core::Fault>(())
//! ```

/// The 8-bit arithmetic/logic unit.
pub mod alu;
pub use alu::{AluOp, FlagKind, Flags, ALU_OP_COUNT};

/// The 8-bit bus address map between RAM and the memory-mapped ports.
pub mod bus;
pub use bus::{
    decode_read, decode_write, ReadTarget, WriteTarget, INPUT_PORTS, INPUT_PORT_BASE,
    OUTPUT_PORTS, OUTPUT_PORT_BASE, RAM_BYTES,
};

/// Fault taxonomy surfaced by the machine.
pub mod fault;
pub use fault::{BusFault, Fault, StateSpace};

/// Microprogram listing parser.
pub mod listing;
pub use listing::{read_program, ListingError};

/// The microinstruction interpreter and its architectural state.
pub mod machine;
pub use machine::{Machine, MICROPROGRAM_WORDS, REGISTER_COUNT};

/// The 25-bit microword and its field accessors.
pub mod microword;
pub use microword::{Microword, WritebackTarget, MICROWORD_BITS};

/// Next-address computation for the microprogram sequencer.
pub mod sequencer;
pub use sequencer::next_address;

/// Canonical machine snapshots for save/restore and replay fixtures.
pub mod snapshot;
pub use snapshot::{CanonicalStateLayout, MachineSnapshot, SnapshotLayoutError, SnapshotVersion};

#[cfg(test)]
use proptest as _;
#[cfg(test)]
use rstest as _;
