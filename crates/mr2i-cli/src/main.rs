//! Interactive shell for the Minirechner 2i emulator.
//!
//! The shell drives the machine exclusively through its public
//! accessors: it loads microprogram listings, executes one microcycle
//! per empty input line, lets the operator drive the input ports and
//! renders the machine state after every change.

use std::env;
use std::ffi::OsString;
use std::fs::File;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

use mr2i_core::{
    listing, FlagKind, Machine, Microword, INPUT_PORTS, MICROPROGRAM_WORDS, RAM_BYTES,
    REGISTER_COUNT,
};
use regex::Regex;
#[cfg(test)]
use tempfile as _;

const HELP_TEXT: &str = "Usage: mr2i [<program.2i>] [--help]";
const COMMAND_HELP: &str = "\
Commands:
  <enter>          execute the next microinstruction
  FC = 00000111    drive an input port (FC-FF, binary value)
  ram              dump the ram contents
  load <path>      load a microprogram listing and reset the machine
  help             show this help
  quit             leave the shell";

#[derive(Debug, PartialEq, Eq)]
struct CliArgs {
    program: Option<PathBuf>,
}

#[derive(Debug)]
enum ParseResult {
    Args(CliArgs),
    Help,
}

fn parse_args(args: impl Iterator<Item = OsString>) -> Result<ParseResult, String> {
    let mut program: Option<PathBuf> = None;

    for arg in args {
        if arg == "--help" {
            return Ok(ParseResult::Help);
        }

        if arg.to_string_lossy().starts_with('-') {
            return Err(format!("unknown option: {}", arg.to_string_lossy()));
        }

        if program.is_some() {
            return Err(String::from("multiple program paths provided"));
        }
        program = Some(PathBuf::from(arg));
    }

    Ok(ParseResult::Args(CliArgs { program }))
}

fn main() {
    match parse_args(env::args_os().skip(1)) {
        Ok(ParseResult::Help) => {
            println!("{HELP_TEXT}");
            println!();
            println!("{COMMAND_HELP}");
        }
        Ok(ParseResult::Args(args)) => {
            if let Err(code) = run(&args) {
                std::process::exit(code);
            }
        }
        Err(error) => {
            eprintln!("error: {error}");
            eprintln!("{HELP_TEXT}");
            std::process::exit(1);
        }
    }
}

fn run(args: &CliArgs) -> Result<(), i32> {
    let mut machine = Machine::new();
    let mut loaded = false;

    if let Some(path) = &args.program {
        let program = load_listing(path).map_err(|error| {
            eprintln!("error: {error}");
            2
        })?;
        machine.load_program(&program);
        loaded = true;
    }

    println!("mr2i - Minirechner 2i emulator");
    println!("{}", render_status(&machine));

    let input_pattern =
        Regex::new(r"^(?P<port>F[C-F])\s*=\s*(?P<value>[01]{1,8})$").expect("port pattern is valid");

    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();
    loop {
        print!("> ");
        io::stdout().flush().ok();
        let Some(Ok(line)) = lines.next() else {
            break;
        };
        let line = line.trim();

        if line.is_empty() {
            if !loaded {
                println!("no microprogram loaded (use \"load <path>\")");
                continue;
            }
            match machine.step() {
                Ok(()) => println!("{}", render_status(&machine)),
                Err(fault) => println!("fault: {fault}"),
            }
        } else if let Some(rest) = line.strip_prefix("load ") {
            match load_listing(Path::new(rest.trim())) {
                Ok(program) => {
                    machine = reset_keeping_inputs(&machine);
                    machine.load_program(&program);
                    loaded = true;
                    println!("{}", render_status(&machine));
                }
                Err(error) => println!("error: {error}"),
            }
        } else if line == "ram" {
            println!("{}", render_ram(&machine));
        } else if line == "help" {
            println!("{COMMAND_HELP}");
        } else if line == "quit" || line == "exit" {
            break;
        } else if let Some(captures) = input_pattern.captures(line) {
            apply_input(&mut machine, &captures["port"], &captures["value"]);
            println!("{}", render_status(&machine));
        } else {
            println!("unknown input (\"help\" for help)");
        }
    }

    Ok(())
}

fn load_listing(path: &Path) -> Result<[Microword; MICROPROGRAM_WORDS], String> {
    let file =
        File::open(path).map_err(|error| format!("cannot open {}: {error}", path.display()))?;
    listing::read_program(file).map_err(|error| format!("cannot load {}: {error}", path.display()))
}

/// A program swap resets everything except the input ports, which stay
/// under the operator's control.
fn reset_keeping_inputs(machine: &Machine) -> Machine {
    let mut fresh = Machine::new();
    for port in 0..INPUT_PORTS {
        let value = machine.read_input(port).unwrap_or(0);
        let _ = fresh.write_input(port, value);
    }
    fresh
}

fn apply_input(machine: &mut Machine, port: &str, value: &str) {
    let index = match port {
        "FC" => 0,
        "FD" => 1,
        "FE" => 2,
        _ => 3,
    };
    if let Ok(value) = u8::from_str_radix(value, 2) {
        let _ = machine.write_input(index, value);
    }
}

fn render_status(machine: &Machine) -> String {
    let mut lines = Vec::new();

    for index in 0..REGISTER_COUNT {
        let mut line = format!("R{index}: {:08b}", machine.read_register(index).unwrap_or(0));
        if index < INPUT_PORTS {
            let name = ['C', 'D', 'E', 'F'][index];
            line.push_str(&format!(
                "   F{name} in:  {:08b}",
                machine.read_input(index).unwrap_or(0)
            ));
        }
        if index == 2 || index == 3 {
            let name = if index == 2 { 'E' } else { 'F' };
            line.push_str(&format!(
                "   F{name} out: {:08b}",
                machine.read_output(index - 2).unwrap_or(0)
            ));
        }
        lines.push(line);
    }

    lines.push(format!(
        "flags: C={} N={} Z={}",
        u8::from(machine.read_flag(FlagKind::Carry)),
        u8::from(machine.read_flag(FlagKind::Negative)),
        u8::from(machine.read_flag(FlagKind::Zero)),
    ));

    let pc = machine.pc();
    let word = machine
        .read_microword(pc as usize)
        .map_or(0, |word| word.bits());
    lines.push(format!("next:  {pc:05b} ({pc}): {word:025b}"));

    lines.join("\n")
}

fn render_ram(machine: &Machine) -> String {
    let mut lines = Vec::new();
    for row in (0..RAM_BYTES).step_by(16) {
        let mut line = format!("{row:02X}:");
        for addr in row..(row + 16).min(RAM_BYTES) {
            line.push_str(&format!(" {:02X}", machine.read_ram(addr).unwrap_or(0)));
        }
        lines.push(line);
    }
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use std::ffi::OsString;
    use std::path::PathBuf;

    use mr2i_core::{Machine, Microword};
    use regex::Regex;

    use super::{apply_input, parse_args, render_ram, render_status, CliArgs, ParseResult};

    #[test]
    fn parses_an_optional_program_path() {
        let result = parse_args([].into_iter()).expect("empty args should parse");
        let ParseResult::Args(args) = result else {
            panic!("expected parsed args");
        };
        assert_eq!(args, CliArgs { program: None });

        let result = parse_args([OsString::from("counter.2i")].into_iter())
            .expect("single path should parse");
        let ParseResult::Args(args) = result else {
            panic!("expected parsed args");
        };
        assert_eq!(
            args,
            CliArgs {
                program: Some(PathBuf::from("counter.2i")),
            }
        );
    }

    #[test]
    fn parses_help_and_rejects_unknown_flags() {
        let result =
            parse_args([OsString::from("--help")].into_iter()).expect("help should parse");
        assert!(matches!(result, ParseResult::Help));

        let error = parse_args([OsString::from("--unknown")].into_iter())
            .expect_err("unknown flag should fail parse");
        assert!(error.contains("unknown option"));

        let error = parse_args(
            [OsString::from("a.2i"), OsString::from("b.2i")].into_iter(),
        )
        .expect_err("two paths should fail parse");
        assert!(error.contains("multiple program paths"));
    }

    #[test]
    fn input_pattern_matches_the_port_syntax() {
        let pattern = Regex::new(r"^(?P<port>F[C-F])\s*=\s*(?P<value>[01]{1,8})$").unwrap();

        let captures = pattern.captures("FD = 1101").expect("port syntax should match");
        assert_eq!(&captures["port"], "FD");
        assert_eq!(&captures["value"], "1101");

        assert!(pattern.captures("FB = 1101").is_none());
        assert!(pattern.captures("FC = 2").is_none());
        assert!(pattern.captures("FC = 111111111").is_none());
    }

    #[test]
    fn applied_inputs_reach_the_machine_ports() {
        let mut machine = Machine::new();
        apply_input(&mut machine, "FC", "111");
        apply_input(&mut machine, "FF", "10000000");

        assert_eq!(machine.read_input(0).unwrap(), 0b111);
        assert_eq!(machine.read_input(3).unwrap(), 0b1000_0000);
    }

    #[test]
    fn status_renders_registers_ports_flags_and_pointer() {
        let mut machine = Machine::new();
        // R1 = 5, latch flags.
        machine
            .load_microword(
                0,
                Microword::new(0b00_00001_00_001_0101_01_01_0001_1).unwrap(),
            )
            .unwrap();
        machine.write_input(0, 0b111).unwrap();
        machine.step().unwrap();

        let status = render_status(&machine);
        assert!(status.contains("R1: 00000101"));
        assert!(status.contains("FC in:  00000111"));
        assert!(status.contains("FE out: 00000000"));
        assert!(status.contains("flags: C=0 N=0 Z=0"));
        assert!(status.contains("next:  00001 (1)"));
    }

    #[test]
    fn ram_dump_covers_all_252_bytes() {
        let mut machine = Machine::new();
        machine.write_ram(0x00, 0xAB).unwrap();
        machine.write_ram(0xFB, 0xCD).unwrap();

        let dump = render_ram(&machine);
        assert!(dump.starts_with("00: AB"));
        assert!(dump.contains("F0:"));
        assert!(dump.ends_with("CD"));
        assert_eq!(dump.lines().count(), 16);
    }
}
