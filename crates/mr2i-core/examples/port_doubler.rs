//! Runs a five-word microprogram that reads input port FC, doubles the
//! value and writes the sum to output port FE.

use mr2i_core::{FlagKind, Fault, Machine, Microword};

const PROGRAM: [u32; 5] = [
    // R0 = 0xFC
    0b00_00001_00_000_1100_01_01_0001_0,
    // R1 = (R0)
    0b00_00010_01_000_0001_11_10_0000_0,
    // R1 = R1 + R1, latch flags
    0b00_00011_00_001_0001_11_00_0100_1,
    // R2 = 0xFE
    0b00_00100_00_010_1110_01_01_0001_0,
    // (R2) = R1
    0b00_00101_11_010_0001_00_00_0001_0,
];

fn main() -> Result<(), Fault> {
    let mut machine = Machine::new();
    for (addr, bits) in PROGRAM.iter().enumerate() {
        let word = Microword::new(*bits).expect("program word fits in 25 bits");
        machine.load_microword(addr, word)?;
    }

    machine.write_input(0, 7)?;
    for _ in 0..PROGRAM.len() {
        machine.step()?;
    }

    println!("input  FC: {:3}", machine.read_input(0)?);
    println!("output FE: {:3}", machine.read_output(0)?);
    println!(
        "flags: carry={} negative={} zero={}",
        u8::from(machine.read_flag(FlagKind::Carry)),
        u8::from(machine.read_flag(FlagKind::Negative)),
        u8::from(machine.read_flag(FlagKind::Zero)),
    );

    Ok(())
}
