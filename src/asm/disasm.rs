//! Disassembler for Zedecim programs.
//!
//! Converts binary words back to assembler syntax. Output re-assembles to
//! the same words.

use crate::word::Word;
use crate::cpu::decode::{decode, Format, Instruction, Opcode};
use crate::cpu::exit::ExitCode;

/// Disassemble a single word to text.
pub fn disassemble_word(word: Word) -> String {
    match ExitCode::from_word(word) {
        Some(ExitCode::NoInstructions) => "halt".to_string(),
        Some(ExitCode::DivisionByZero) => ".word 0x1000".to_string(),
        Some(ExitCode::Custom(n)) => format!("exit {}", n),
        None => format_instruction(&decode(word)),
    }
}

/// Disassemble a slice of words, one line per address.
pub fn disassemble(words: &[Word]) -> String {
    let mut output = String::new();
    output.push_str("; Zedecim Disassembly\n");
    output.push_str("; -------------------\n\n");

    for (addr, word) in words.iter().enumerate() {
        let line = disassemble_word(*word);
        output.push_str(&format!("{:04X}: {:<20} ; {:04X}\n", addr, line, word));
    }

    output
}

/// Format a decoded instruction as assembly text.
pub fn format_instruction(instr: &Instruction) -> String {
    let Instruction { opcode, r1, r2, r3, immediate } = instr;
    match opcode.format() {
        Format::Register if *opcode == Opcode::Not && r3.index() == 0 => {
            format!("{} {}, {}", opcode, r1, r2)
        }
        Format::Register => format!("{} {}, {}, {}", opcode, r1, r2, r3),
        Format::Immediate => format!("{} {}, {}", opcode, r2, immediate),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::asm::assembler::assemble;
    use crate::cpu::decode::encode;
    use crate::cpu::registers::Reg;

    #[test]
    fn test_disassemble_sentinels() {
        assert_eq!(disassemble_word(Word::ZERO), "halt");
        assert_eq!(disassemble_word(Word::from_bits(0x4000)), "exit 4");
        assert_eq!(disassemble_word(Word::from_bits(0x1000)), ".word 0x1000");
    }

    #[test]
    fn test_disassemble_instructions() {
        let li = encode(&Instruction::immediate(Opcode::Li, Reg::X, -3));
        assert_eq!(disassemble_word(li), "li x, -3");

        let add = encode(&Instruction::register(
            Opcode::Add,
            Reg::new(1).unwrap(),
            Reg::new(2).unwrap(),
            Reg::new(14).unwrap(),
        ));
        assert_eq!(disassemble_word(add), "add r1, r2, r14");
    }

    #[test]
    fn test_disassembly_reassembles() {
        let source = "
            li r1, 10
            not r2, r1
            not r3, r1
            sh r4, r1, r3
            apceq x, -2
            piu r1, 0
            exit 9
            halt
        ";
        let words = assemble(source).unwrap();
        let text: Vec<String> = words.iter().map(|w| disassemble_word(*w)).collect();
        assert_eq!(assemble(&text.join("\n")).unwrap(), words);
    }

    #[test]
    fn test_listing_has_addresses() {
        let listing = disassemble(&[Word::from_bits(0x05FA), Word::ZERO]);
        assert!(listing.contains("0000: li x, 5"));
        assert!(listing.contains("; 05FA"));
        assert!(listing.contains("0001: halt"));
    }
}
