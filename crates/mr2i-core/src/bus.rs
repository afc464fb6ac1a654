//! The 8-bit bus address map.
//!
//! The bus shares one 8-bit address space between RAM and the
//! memory-mapped ports. Reads below 0xFC hit RAM and reads from
//! 0xFC-0xFF hit the input ports. Writes below 0xFC hit RAM, writes to
//! 0xFE-0xFF hit the output ports, and writes to 0xFC/0xFD are a bus
//! fault (the input ports are driven by the outside world only).

use crate::fault::BusFault;

/// Number of bytes of backing RAM (addresses 0x00-0xFB).
pub const RAM_BYTES: usize = 252;
/// First address decoded as an input port on bus reads.
pub const INPUT_PORT_BASE: u8 = 0xFC;
/// First address decoded as an output port on bus writes.
pub const OUTPUT_PORT_BASE: u8 = 0xFE;
/// Number of input ports.
pub const INPUT_PORTS: usize = 4;
/// Number of output ports.
pub const OUTPUT_PORTS: usize = 2;

// The port windows sit exactly on top of the end of the address space.
const _: () = {
    assert!(RAM_BYTES == INPUT_PORT_BASE as usize);
    assert!(RAM_BYTES + INPUT_PORTS == 256);
    assert!(OUTPUT_PORT_BASE as usize + OUTPUT_PORTS == 256);
};

/// Backing store selected by a bus read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReadTarget {
    /// RAM cell at the given index.
    Ram(usize),
    /// Input port at the given index.
    InputPort(usize),
}

/// Backing store selected by a bus write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WriteTarget {
    /// RAM cell at the given index.
    Ram(usize),
    /// Output port at the given index.
    OutputPort(usize),
}

/// Decodes a bus address for a read cycle. Total over all 256 addresses.
#[must_use]
pub const fn decode_read(addr: u8) -> ReadTarget {
    if addr < INPUT_PORT_BASE {
        ReadTarget::Ram(addr as usize)
    } else {
        ReadTarget::InputPort((addr - INPUT_PORT_BASE) as usize)
    }
}

/// Decodes a bus address for a write cycle.
///
/// # Errors
///
/// Returns [`BusFault::WriteToInputPort`] for the two addresses that are
/// readable input ports but not writable (0xFC and 0xFD).
pub const fn decode_write(addr: u8) -> Result<WriteTarget, BusFault> {
    if addr < INPUT_PORT_BASE {
        Ok(WriteTarget::Ram(addr as usize))
    } else if addr < OUTPUT_PORT_BASE {
        Err(BusFault::WriteToInputPort { addr })
    } else {
        Ok(WriteTarget::OutputPort((addr - OUTPUT_PORT_BASE) as usize))
    }
}
