use std::fmt;

use thiserror::Error;

/// State spaces addressed by the host-facing accessors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StateSpace {
    /// Microprogram store (32 words of 25 bits).
    Microprogram,
    /// Byte-addressable RAM (252 bytes).
    Ram,
    /// General register file (8 registers).
    Register,
    /// Memory-mapped input ports (4 bytes at 0xFC-0xFF).
    InputPort,
    /// Memory-mapped output ports (2 bytes at 0xFE-0xFF).
    OutputPort,
}

impl fmt::Display for StateSpace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Microprogram => "microprogram",
            Self::Ram => "ram",
            Self::Register => "register file",
            Self::InputPort => "input port",
            Self::OutputPort => "output port",
        };
        f.write_str(name)
    }
}

/// Bus discipline violations raised while executing a microcycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error)]
pub enum BusFault {
    /// The microword routes operand A from the bus while `BUS_EN` is clear.
    #[error("bus read attempted while the bus is disabled")]
    ReadWhileDisabled,
    /// The microword routes operand A from the bus while `BUS_WR` is set.
    #[error("bus read attempted while the bus is in write mode")]
    ReadInWriteMode,
    /// A bus write targets one of the input-port addresses.
    #[error("bus write to input port address {addr:#04X}")]
    WriteToInputPort {
        /// Offending bus address (0xFC or 0xFD).
        addr: u8,
    },
}

/// Runtime faults surfaced by the machine.
///
/// These are the only two error kinds the machine produces. Faults are
/// reported to the caller and never retried internally; a faulting
/// operation leaves the machine state untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error)]
pub enum Fault {
    /// An accessor was called with an index past its array bound.
    #[error("{space} index {index} out of range (capacity {capacity})")]
    IndexOutOfRange {
        /// State space the accessor addressed.
        space: StateSpace,
        /// Offending index.
        index: usize,
        /// Number of valid indices in the state space.
        capacity: usize,
    },
    /// A microcycle violated the bus discipline.
    #[error(transparent)]
    Bus(#[from] BusFault),
}

impl Fault {
    /// Returns the bus violation if this fault originated on the bus.
    #[must_use]
    pub const fn bus_fault(self) -> Option<BusFault> {
        match self {
            Self::Bus(fault) => Some(fault),
            Self::IndexOutOfRange { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{BusFault, Fault, StateSpace};

    #[test]
    fn index_fault_reports_space_index_and_capacity() {
        let fault = Fault::IndexOutOfRange {
            space: StateSpace::Ram,
            index: 300,
            capacity: 252,
        };
        assert_eq!(fault.to_string(), "ram index 300 out of range (capacity 252)");
        assert_eq!(fault.bus_fault(), None);
    }

    #[test]
    fn bus_fault_conversion_preserves_the_violation() {
        let fault = Fault::from(BusFault::WriteToInputPort { addr: 0xFD });
        assert_eq!(
            fault.bus_fault(),
            Some(BusFault::WriteToInputPort { addr: 0xFD })
        );
        assert_eq!(fault.to_string(), "bus write to input port address 0xFD");
    }

    #[test]
    fn read_violations_render_distinct_messages() {
        assert_eq!(
            BusFault::ReadWhileDisabled.to_string(),
            "bus read attempted while the bus is disabled"
        );
        assert_eq!(
            BusFault::ReadInWriteMode.to_string(),
            "bus read attempted while the bus is in write mode"
        );
    }
}
