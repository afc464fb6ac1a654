//! Microprogram listing parser.
//!
//! Listings are line-oriented text. Each non-empty line holds one
//! microword written as a binary string; every character other than `0`,
//! `1` and `:` is treated as formatting and ignored inside the word, so
//! programs can group the fields freely. `#` starts a comment that runs
//! to the end of the line. A line may carry an explicit address as five
//! binary digits followed by `:`; lines without one take the first free
//! slot.
//!
//! ```text
//! # Read a value from port FC into register 0
//!
//!        00,00001 00 000|1100 01 01,0001 0
//! 00001: 00,00001 01 000|0000 01 10,0000 0
//! ```

use std::io::{BufRead, BufReader, Read};

use regex::Regex;
use thiserror::Error;

use crate::machine::MICROPROGRAM_WORDS;
use crate::microword::Microword;

/// Errors raised while reading a microprogram listing.
#[derive(Debug, Error)]
pub enum ListingError {
    /// A word used more binary digits than fit in 25 bits.
    #[error("line {line}: word does not fit in 25 bits")]
    WordTooWide {
        /// 1-based listing line.
        line: usize,
    },
    /// A line contained `:` without a valid five-digit address prefix.
    #[error("line {line}: invalid explicit address")]
    InvalidAddress {
        /// 1-based listing line.
        line: usize,
    },
    /// Two words were placed at the same explicit address.
    #[error("line {line}: address {address} already holds a word")]
    DuplicateAddress {
        /// 1-based listing line.
        line: usize,
        /// Microprogram address both words claimed.
        address: usize,
    },
    /// More words than the 32 microprogram slots.
    #[error("line {line}: no free slot left for an unaddressed word")]
    ProgramTooLong {
        /// 1-based listing line.
        line: usize,
    },
    /// The underlying reader failed.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Reads a microprogram listing into the 32-word program array.
///
/// Slots without a word hold [`Microword::ZERO`].
///
/// # Errors
///
/// Returns [`ListingError`] for malformed words or addresses, address
/// collisions, overlong programs and I/O failures.
pub fn read_program<R: Read>(reader: R) -> Result<[Microword; MICROPROGRAM_WORDS], ListingError> {
    let slots = parse_slots(reader)?;
    Ok(slots.map(Option::unwrap_or_default))
}

fn parse_slots<R: Read>(
    reader: R,
) -> Result<[Option<Microword>; MICROPROGRAM_WORDS], ListingError> {
    let mut slots = [None; MICROPROGRAM_WORDS];
    let explicit_address =
        Regex::new(r"^(?P<addr>[01]{5})\s*:\s*(?P<word>.*)$").expect("address pattern is valid");

    let reader = BufReader::new(reader);
    for (index, line) in reader.lines().enumerate() {
        let line_number = index + 1;
        let raw = line?;

        // Strip comments and surrounding whitespace.
        let content = match raw.find('#') {
            Some(start) => raw[..start].trim(),
            None => raw.trim(),
        };
        if content.is_empty() {
            continue;
        }

        let (word_text, address) = if content.contains(':') {
            let captures = explicit_address
                .captures(content)
                .ok_or(ListingError::InvalidAddress { line: line_number })?;
            let address = collect_bits(&captures["addr"], line_number)? as usize;
            (captures.name("word").map_or("", |m| m.as_str()).to_owned(), Some(address))
        } else {
            (content.to_owned(), None)
        };

        let bits = collect_bits(&word_text, line_number)?;
        let word =
            Microword::new(bits).ok_or(ListingError::WordTooWide { line: line_number })?;

        if let Some(address) = address {
            if slots[address].is_some() {
                return Err(ListingError::DuplicateAddress {
                    line: line_number,
                    address,
                });
            }
            slots[address] = Some(word);
        } else {
            let free = slots
                .iter()
                .position(Option::is_none)
                .ok_or(ListingError::ProgramTooLong { line: line_number })?;
            slots[free] = Some(word);
        }
    }

    Ok(slots)
}

/// Folds the binary digits of `text` into an integer, skipping every
/// formatting character. Leading zeros are free; set bits above bit 24
/// make the word unrepresentable.
fn collect_bits(text: &str, line: usize) -> Result<u32, ListingError> {
    let mut value: u64 = 0;

    for digit in text.chars().filter_map(|c| match c {
        '0' => Some(0),
        '1' => Some(1),
        _ => None,
    }) {
        value = value << 1 | digit;
        if value > u64::from(u32::MAX) {
            return Err(ListingError::WordTooWide { line });
        }
    }

    u32::try_from(value).map_err(|_| ListingError::WordTooWide { line })
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::{read_program, ListingError};
    use crate::microword::Microword;

    #[test]
    fn parses_mixed_explicit_and_sequential_addresses() {
        let program = read_program(Cursor::new(
            "\
            # Simple program\n\
            \n\
            00000: 00 00001 000000000000000000 # first word\n\
          \n       00 00011 000000000000000000# second word\n\
            00011: 00 11111 000000000000000000\n\
            # the next word lands in the first free slot, 00010\
          \n       00 00000 000000000000000000\n\
            11111 : 00 00011 | 00 | 000 1111 01 | 01 0100 | 0\n\
        ",
        ))
        .unwrap();

        assert_eq!(
            program[0],
            Microword::new(0b00_00001_000000000000000000).unwrap()
        );
        assert_eq!(
            program[1],
            Microword::new(0b00_00011_000000000000000000).unwrap()
        );
        assert_eq!(
            program[2],
            Microword::new(0b00_00000_000000000000000000).unwrap()
        );
        assert_eq!(
            program[3],
            Microword::new(0b00_11111_000000000000000000).unwrap()
        );
        assert_eq!(
            program[31],
            Microword::new(0b00_00011_000001111010101000).unwrap()
        );
        assert_eq!(program[4], Microword::ZERO);
    }

    #[test]
    fn formatting_characters_inside_words_are_ignored() {
        let program = read_program(Cursor::new("00,00001 00 000|1100 01 01,0001 0\n")).unwrap();
        assert_eq!(
            program[0],
            Microword::new(0b00_00001_00_000_1100_01_01_0001_0).unwrap()
        );
    }

    #[test]
    fn rejects_malformed_explicit_addresses() {
        let error = read_program(Cursor::new("0 0 0 0 0: 00 00001 000000000000000000\n"))
            .unwrap_err();
        assert!(matches!(error, ListingError::InvalidAddress { line: 1 }));
    }

    #[test]
    fn rejects_duplicate_addresses() {
        let error = read_program(Cursor::new(
            "00001: 00 00001 000000000000000000\n\
             00001: 00 00010 000000000000000000\n",
        ))
        .unwrap_err();
        assert!(matches!(
            error,
            ListingError::DuplicateAddress {
                line: 2,
                address: 1,
            }
        ));
    }

    #[test]
    fn rejects_words_wider_than_25_bits() {
        let error = read_program(Cursor::new("10000000000000000000000000\n")).unwrap_err();
        assert!(matches!(error, ListingError::WordTooWide { line: 1 }));
    }

    #[test]
    fn accepts_leading_zeros_beyond_the_word_width() {
        let program =
            read_program(Cursor::new("0000000000000000000000000000001\n")).unwrap();
        assert_eq!(program[0], Microword::new(1).unwrap());
    }

    #[test]
    fn rejects_a_33rd_sequential_word() {
        let mut listing = String::new();
        for _ in 0..33 {
            listing.push_str("00 00000 000000000000000000\n");
        }
        let error = read_program(Cursor::new(listing)).unwrap_err();
        assert!(matches!(error, ListingError::ProgramTooLong { line: 33 }));
    }

    #[test]
    fn empty_listing_is_all_zero_words() {
        let program = read_program(Cursor::new("")).unwrap();
        assert!(program.iter().all(|word| *word == Microword::ZERO));
    }
}
