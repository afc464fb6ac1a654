//! The microinstruction interpreter and its architectural state.
//!
//! [`Machine`] owns every state array outright: the microprogram store,
//! RAM, the register file, the port latches, the flag register and the
//! next-instruction pointer. One [`Machine::step`] call executes exactly
//! one microcycle. Faulting microcycles commit nothing: side effects are
//! accumulated first and applied only after every check has passed, so a
//! fault never leaves a partial write behind.

use crate::alu::{self, FlagKind, Flags};
use crate::bus::{
    decode_read, decode_write, ReadTarget, WriteTarget, INPUT_PORTS, OUTPUT_PORTS, RAM_BYTES,
};
use crate::fault::{BusFault, Fault, StateSpace};
use crate::microword::{Microword, WritebackTarget};
use crate::sequencer::next_address;

/// Number of microwords in the microprogram store.
pub const MICROPROGRAM_WORDS: usize = 32;
/// Number of general registers.
pub const REGISTER_COUNT: usize = 8;

/// The Minirechner 2i machine.
///
/// Construction zeroes all memories, clears the flag register and points
/// the next-instruction pointer at address 0. The general registers and
/// output ports change only by executing microinstructions; the outside
/// world drives the input ports and the microprogram store through the
/// accessors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Machine {
    microprogram: [Microword; MICROPROGRAM_WORDS],
    ram: [u8; RAM_BYTES],
    registers: [u8; REGISTER_COUNT],
    input_ports: [u8; INPUT_PORTS],
    output_ports: [u8; OUTPUT_PORTS],
    flags: Flags,
    pc: u8,
}

impl Default for Machine {
    fn default() -> Self {
        Self::new()
    }
}

impl Machine {
    /// Creates a machine with all state zeroed.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            microprogram: [Microword::ZERO; MICROPROGRAM_WORDS],
            ram: [0; RAM_BYTES],
            registers: [0; REGISTER_COUNT],
            input_ports: [0; INPUT_PORTS],
            output_ports: [0; OUTPUT_PORTS],
            flags: Flags::new(false, false, false),
            pc: 0,
        }
    }

    /// Stores a microword in the microprogram store.
    ///
    /// # Errors
    ///
    /// Fails with [`Fault::IndexOutOfRange`] for addresses past 31.
    pub fn load_microword(&mut self, addr: usize, word: Microword) -> Result<(), Fault> {
        let addr = guard(StateSpace::Microprogram, addr, MICROPROGRAM_WORDS)?;
        self.microprogram[addr] = word;
        Ok(())
    }

    /// Reads a microword back from the microprogram store.
    ///
    /// # Errors
    ///
    /// Fails with [`Fault::IndexOutOfRange`] for addresses past 31.
    pub fn read_microword(&self, addr: usize) -> Result<Microword, Fault> {
        let addr = guard(StateSpace::Microprogram, addr, MICROPROGRAM_WORDS)?;
        Ok(self.microprogram[addr])
    }

    /// Replaces the whole microprogram store and resets the pointer to 0.
    pub fn load_program(&mut self, program: &[Microword; MICROPROGRAM_WORDS]) {
        self.microprogram = *program;
        self.pc = 0;
    }

    /// Reads a RAM byte.
    ///
    /// # Errors
    ///
    /// Fails with [`Fault::IndexOutOfRange`] for addresses past 0xFB.
    pub fn read_ram(&self, addr: usize) -> Result<u8, Fault> {
        let addr = guard(StateSpace::Ram, addr, RAM_BYTES)?;
        Ok(self.ram[addr])
    }

    /// Writes a RAM byte.
    ///
    /// # Errors
    ///
    /// Fails with [`Fault::IndexOutOfRange`] for addresses past 0xFB.
    pub fn write_ram(&mut self, addr: usize, value: u8) -> Result<(), Fault> {
        let addr = guard(StateSpace::Ram, addr, RAM_BYTES)?;
        self.ram[addr] = value;
        Ok(())
    }

    /// Reads a general register. Registers are not externally writable.
    ///
    /// # Errors
    ///
    /// Fails with [`Fault::IndexOutOfRange`] for indices past 7.
    pub fn read_register(&self, index: usize) -> Result<u8, Fault> {
        let index = guard(StateSpace::Register, index, REGISTER_COUNT)?;
        Ok(self.registers[index])
    }

    /// Reads an input port.
    ///
    /// # Errors
    ///
    /// Fails with [`Fault::IndexOutOfRange`] for ports past 3.
    pub fn read_input(&self, port: usize) -> Result<u8, Fault> {
        let port = guard(StateSpace::InputPort, port, INPUT_PORTS)?;
        Ok(self.input_ports[port])
    }

    /// Drives an input port from the outside world.
    ///
    /// # Errors
    ///
    /// Fails with [`Fault::IndexOutOfRange`] for ports past 3.
    pub fn write_input(&mut self, port: usize, value: u8) -> Result<(), Fault> {
        let port = guard(StateSpace::InputPort, port, INPUT_PORTS)?;
        self.input_ports[port] = value;
        Ok(())
    }

    /// Reads an output port. Output ports are not externally writable.
    ///
    /// # Errors
    ///
    /// Fails with [`Fault::IndexOutOfRange`] for ports past 1.
    pub fn read_output(&self, port: usize) -> Result<u8, Fault> {
        let port = guard(StateSpace::OutputPort, port, OUTPUT_PORTS)?;
        Ok(self.output_ports[port])
    }

    /// Reads a single flag from the flag register.
    #[must_use]
    pub const fn read_flag(&self, kind: FlagKind) -> bool {
        self.flags.get(kind)
    }

    /// The full flag register.
    #[must_use]
    pub const fn flags(&self) -> Flags {
        self.flags
    }

    /// The 5-bit address of the next microinstruction.
    #[must_use]
    pub const fn pc(&self) -> u8 {
        self.pc
    }

    /// Executes the microinstruction at the current pointer.
    ///
    /// One call is one atomic microcycle: decode, operand routing, ALU,
    /// writebacks, optional flag latch, pointer update. On success the
    /// pointer has advanced exactly once.
    ///
    /// # Errors
    ///
    /// Fails with [`Fault::Bus`] when the microword reads from a disabled
    /// or write-mode bus, or writes to an input-port address. The machine
    /// is left exactly as it was, the pointer included.
    pub fn step(&mut self) -> Result<(), Fault> {
        let word = self.microprogram[self.pc as usize];
        let latched = self.flags;

        let a = self.operand_a(word)?;
        let b = self.operand_b(word);
        let (result, flags) = alu::calculate(word.alu_op(), a, b, latched.carry());

        let writeback = if word.writes_register() {
            Some(match word.writeback_target() {
                WritebackTarget::RegisterA => word.a_register(),
                WritebackTarget::RegisterB => word.b_register(),
            })
        } else {
            None
        };

        // The address register is sampled after the register writeback, so
        // a cycle that writes its own address register stores through the
        // fresh value.
        let store = if word.bus_enabled() && word.bus_writes() {
            let addr = if writeback == Some(word.a_register()) {
                result
            } else {
                self.registers[word.a_register()]
            };
            Some(decode_write(addr)?)
        } else {
            None
        };

        // Every check has passed: commit the microcycle.
        if let Some(index) = writeback {
            self.registers[index] = result;
        }
        match store {
            Some(WriteTarget::Ram(index)) => self.ram[index] = result,
            Some(WriteTarget::OutputPort(index)) => self.output_ports[index] = result,
            None => {}
        }
        if word.latches_flags() {
            self.flags = flags;
        }
        self.pc = next_address(word.next_field(), word.address_control(), flags, latched);

        Ok(())
    }

    fn operand_a(&self, word: Microword) -> Result<u8, Fault> {
        if !word.a_from_bus() {
            return Ok(self.registers[word.a_register()]);
        }
        if !word.bus_enabled() {
            return Err(BusFault::ReadWhileDisabled.into());
        }
        if word.bus_writes() {
            return Err(BusFault::ReadInWriteMode.into());
        }

        let value = match decode_read(self.registers[word.a_register()]) {
            ReadTarget::Ram(index) => self.ram[index],
            ReadTarget::InputPort(index) => self.input_ports[index],
        };
        Ok(value)
    }

    fn operand_b(&self, word: Microword) -> u8 {
        if word.b_from_constant() {
            word.constant()
        } else {
            self.registers[word.b_register()]
        }
    }

    pub(crate) fn microprogram(&self) -> &[Microword; MICROPROGRAM_WORDS] {
        &self.microprogram
    }

    pub(crate) fn ram(&self) -> &[u8; RAM_BYTES] {
        &self.ram
    }

    pub(crate) fn registers(&self) -> &[u8; REGISTER_COUNT] {
        &self.registers
    }

    pub(crate) fn input_ports(&self) -> &[u8; INPUT_PORTS] {
        &self.input_ports
    }

    pub(crate) fn output_ports(&self) -> &[u8; OUTPUT_PORTS] {
        &self.output_ports
    }

    pub(crate) const fn from_parts(
        microprogram: [Microword; MICROPROGRAM_WORDS],
        ram: [u8; RAM_BYTES],
        registers: [u8; REGISTER_COUNT],
        input_ports: [u8; INPUT_PORTS],
        output_ports: [u8; OUTPUT_PORTS],
        flags: Flags,
        pc: u8,
    ) -> Self {
        Self {
            microprogram,
            ram,
            registers,
            input_ports,
            output_ports,
            flags,
            pc,
        }
    }
}

fn guard(space: StateSpace, index: usize, capacity: usize) -> Result<usize, Fault> {
    if index < capacity {
        Ok(index)
    } else {
        Err(Fault::IndexOutOfRange {
            space,
            index,
            capacity,
        })
    }
}
