#![no_main]

use libfuzzer_sys::fuzz_target;
use mr2i_core::{Machine, Microword, MICROPROGRAM_WORDS};

fuzz_target!(|data: &[u8]| {
    let mut machine = Machine::new();

    let mut chunks = data.chunks_exact(4);
    for (addr, chunk) in (&mut chunks).take(MICROPROGRAM_WORDS).enumerate() {
        let raw = u32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
        if let Some(word) = Microword::new(raw & 0x01FF_FFFF) {
            let _ = machine.load_microword(addr, word);
        }
    }

    for (port, byte) in chunks.remainder().iter().take(4).enumerate() {
        let _ = machine.write_input(port, *byte);
    }

    // Arbitrary programs must never panic, and a faulting cycle must not
    // move the next-instruction pointer.
    for _ in 0..64 {
        let pc = machine.pc();
        if machine.step().is_err() {
            assert_eq!(machine.pc(), pc);
            break;
        }
        assert!(machine.pc() < MICROPROGRAM_WORDS as u8);
    }
});
