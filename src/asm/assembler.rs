//! Two-pass assembler for Zedecim programs.
//!
//! Syntax:
//! ```text
//! ; Comment
//! start:              ; Define a label
//!     li r1, 10       ; Load immediate
//!     add r3, r1, r2  ; r3 = r1 + r2
//!     comp x, r1, r0  ; x = sign(r1 - r0)
//!     apceq r0, start ; Jump to label while x == 0
//!     exit 3          ; Halt with custom exit code 0x3000
//!     halt            ; Halt (0x0000)
//!
//!     .org 0x40       ; Pad with zeros up to address 0x40
//!                     ; (a number, or a label defined above)
//!     .word 42        ; Define a data word
//! ```

use crate::word::Word;
use crate::cpu::decode::{encode, immediate_in_range, Format, Instruction, Opcode};
use crate::cpu::exit::ExitCode;
use crate::cpu::registers::Reg;
use std::collections::HashMap;
use thiserror::Error;

/// One past the highest address a word can hold.
const ADDRESS_LIMIT: usize = 1 << Word::BITS;

/// Assemble source code to a list of words, starting at address 0.
pub fn assemble(source: &str) -> Result<Vec<Word>, AssemblerError> {
    let mut asm = Assembler::new();
    asm.assemble(source)
}

/// One parsed source line that occupies memory or moves the origin.
#[derive(Debug)]
enum Statement<'a> {
    Instruction { opcode: Opcode, operands: Vec<&'a str> },
    Data(&'a str),
    Halt,
    Exit(&'a str),
    Org(usize),
}

/// The assembler state.
struct Assembler<'a> {
    /// Current address (origin).
    current_addr: usize,
    /// Symbol table (label -> address).
    symbols: HashMap<String, usize>,
    /// Statements collected in pass 1, with their source line.
    statements: Vec<(usize, Statement<'a>)>,
    /// Output words.
    output: Vec<Word>,
}

impl<'a> Assembler<'a> {
    fn new() -> Self {
        Self {
            current_addr: 0,
            symbols: HashMap::new(),
            statements: Vec::new(),
            output: Vec::new(),
        }
    }

    fn assemble(&mut self, source: &'a str) -> Result<Vec<Word>, AssemblerError> {
        // Pass 1: Collect labels and statements
        for (line_num, line) in source.lines().enumerate() {
            self.process_line(line, line_num + 1)?;
        }

        // Pass 2: Encode with every label known
        let statements = std::mem::take(&mut self.statements);
        for (line_num, statement) in &statements {
            self.emit_statement(statement, *line_num)?;
        }

        Ok(std::mem::take(&mut self.output))
    }

    fn process_line(&mut self, line: &'a str, line_num: usize) -> Result<(), AssemblerError> {
        // Remove comments
        let line = match line.find(';') {
            Some(idx) => &line[..idx],
            None => line,
        };
        let mut line = line.trim();

        // Check for label definition
        if let Some(colon_idx) = line.find(':') {
            let label = line[..colon_idx].trim();
            if !is_identifier(label) {
                return Err(AssemblerError::SyntaxError {
                    line: line_num,
                    message: format!("invalid label name {:?}", label),
                });
            }
            let key = label.to_uppercase();
            if self.symbols.contains_key(&key) {
                return Err(AssemblerError::DuplicateLabel { line: line_num, label: label.to_string() });
            }
            self.symbols.insert(key, self.current_addr);
            line = line[colon_idx + 1..].trim();
        }

        if line.is_empty() {
            return Ok(());
        }

        let statement = self.parse_statement(line, line_num)?;
        self.current_addr = match &statement {
            Statement::Org(target) => *target,
            _ => self.current_addr + 1,
        };
        self.statements.push((line_num, statement));

        Ok(())
    }

    fn parse_statement(&self, line: &'a str, line_num: usize) -> Result<Statement<'a>, AssemblerError> {
        let (mnemonic, rest) = match line.split_once(char::is_whitespace) {
            Some((mnemonic, rest)) => (mnemonic, rest.trim()),
            None => (line, ""),
        };
        let operands: Vec<&str> = if rest.is_empty() {
            Vec::new()
        } else {
            rest.split(',').map(str::trim).collect()
        };

        let single = |name: &str| -> Result<&'a str, AssemblerError> {
            match operands.as_slice() {
                [operand] if !operand.is_empty() => Ok(*operand),
                _ => Err(AssemblerError::SyntaxError {
                    line: line_num,
                    message: format!("{} takes exactly one operand", name),
                }),
            }
        };

        let statement = match mnemonic.to_lowercase().as_str() {
            // Directives
            ".org" | "org" => Statement::Org(self.parse_org(single("ORG")?, line_num)?),
            ".word" | "dat" | "data" => Statement::Data(single("DAT")?),
            "exit" => Statement::Exit(single("EXIT")?),
            "halt" | "hlt" => {
                if !operands.is_empty() {
                    return Err(AssemblerError::SyntaxError {
                        line: line_num,
                        message: "HALT takes no operands".into(),
                    });
                }
                Statement::Halt
            }

            // Instructions
            name => {
                let opcode = Opcode::from_mnemonic(name).ok_or_else(|| AssemblerError::UnknownMnemonic {
                    line: line_num,
                    mnemonic: mnemonic.to_string(),
                })?;
                Statement::Instruction { opcode, operands }
            }
        };

        Ok(statement)
    }

    /// Resolve an origin during pass 1, so labels must already be defined.
    fn parse_org(&self, target: &str, line_num: usize) -> Result<usize, AssemblerError> {
        if parse_number(target).is_none()
            && is_identifier(target)
            && !self.symbols.contains_key(&target.to_uppercase())
        {
            return Err(AssemblerError::SyntaxError {
                line: line_num,
                message: format!("ORG target {} must be a number or a label defined above", target),
            });
        }

        let value = self.parse_operand_value(target, line_num)?;
        let target = usize::try_from(value)
            .ok()
            .filter(|&target| target <= ADDRESS_LIMIT)
            .ok_or(AssemblerError::ValueOutOfRange { line: line_num, value })?;
        if target < self.current_addr {
            return Err(AssemblerError::SyntaxError {
                line: line_num,
                message: format!("ORG {} would move backwards from {}", target, self.current_addr),
            });
        }
        Ok(target)
    }

    fn emit_statement(&mut self, statement: &Statement<'a>, line_num: usize) -> Result<(), AssemblerError> {
        match statement {
            Statement::Org(target) => self.output.resize(*target, Word::ZERO),
            Statement::Data(value) => {
                let value = self.parse_operand_value(value, line_num)?;
                if !(i16::MIN as i64..=u16::MAX as i64).contains(&value) {
                    return Err(AssemblerError::ValueOutOfRange { line: line_num, value });
                }
                self.emit(Word::new(value));
            }
            Statement::Halt => self.emit(ExitCode::NoInstructions.to_word()),
            Statement::Exit(digit) => {
                let value = self.parse_operand_value(digit, line_num)?;
                let code = u8::try_from(value)
                    .ok()
                    .and_then(ExitCode::custom)
                    .ok_or(AssemblerError::ValueOutOfRange { line: line_num, value })?;
                self.emit(code.to_word());
            }
            Statement::Instruction { opcode, operands } => {
                let instr = self.parse_instruction(*opcode, operands, line_num)?;
                let word = encode(&instr);
                if ExitCode::from_word(word).is_some() {
                    return Err(AssemblerError::ReservedEncoding { line: line_num, word: word.to_bits() });
                }
                self.emit(word);
            }
        }
        Ok(())
    }

    fn parse_instruction(&self, opcode: Opcode, operands: &[&str], line_num: usize)
        -> Result<Instruction, AssemblerError>
    {
        let arity_error = |expected: &str| AssemblerError::SyntaxError {
            line: line_num,
            message: format!("{} expects {}", opcode.mnemonic().to_uppercase(), expected),
        };

        match opcode.format() {
            Format::Register => {
                let (r1, r2, r3) = match (opcode, operands) {
                    (Opcode::Not, [a, b]) => (*a, *b, "r0"),
                    (_, [a, b, c]) => (*a, *b, *c),
                    _ => return Err(arity_error("3 registers")),
                };
                Ok(Instruction::register(
                    opcode,
                    self.parse_register(r1, line_num)?,
                    self.parse_register(r2, line_num)?,
                    self.parse_register(r3, line_num)?,
                ))
            }
            Format::Immediate => {
                let [reg, value] = operands else {
                    return Err(arity_error("a register and an immediate"));
                };
                let reg = self.parse_register(reg, line_num)?;
                let value = self.parse_immediate(opcode, value, line_num)?;
                Ok(Instruction::immediate(opcode, reg, value))
            }
        }
    }

    fn parse_register(&self, name: &str, line_num: usize) -> Result<Reg, AssemblerError> {
        name.parse().map_err(|_| AssemblerError::UnknownRegister {
            line: line_num,
            name: name.to_string(),
        })
    }

    /// Immediates are literal numbers; `apceq` also takes a label, which
    /// becomes the distance from the current instruction.
    fn parse_immediate(&self, opcode: Opcode, operand: &str, line_num: usize) -> Result<i16, AssemblerError> {
        let value = match parse_number(operand) {
            Some(value) => value,
            None if opcode == Opcode::Apceq => {
                self.resolve_label(operand, line_num)? as i64 - self.output.len() as i64
            }
            None => {
                return Err(AssemblerError::SyntaxError {
                    line: line_num,
                    message: format!("invalid immediate {:?}", operand),
                })
            }
        };

        if !immediate_in_range(value) {
            return Err(AssemblerError::ValueOutOfRange { line: line_num, value });
        }
        Ok(value as i16)
    }

    fn parse_operand_value(&self, operand: &str, line_num: usize) -> Result<i64, AssemblerError> {
        match parse_number(operand) {
            Some(value) => Ok(value),
            None => self.resolve_label(operand, line_num).map(|addr| addr as i64),
        }
    }

    fn resolve_label(&self, label: &str, line_num: usize) -> Result<usize, AssemblerError> {
        if !is_identifier(label) {
            return Err(AssemblerError::SyntaxError {
                line: line_num,
                message: format!("invalid operand {:?}", label),
            });
        }
        self.symbols
            .get(&label.to_uppercase())
            .copied()
            .ok_or_else(|| AssemblerError::UndefinedLabel {
                line: line_num,
                label: label.to_string(),
            })
    }

    fn emit(&mut self, word: Word) {
        self.output.push(word);
    }
}

/// Parse a decimal, `0x` hex or `0b` binary literal with optional sign.
fn parse_number(text: &str) -> Option<i64> {
    let text = text.trim();
    let (negative, digits) = match text.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, text.strip_prefix('+').unwrap_or(text)),
    };

    let magnitude = if let Some(hex) = digits.strip_prefix("0x").or_else(|| digits.strip_prefix("0X")) {
        i64::from_str_radix(hex, 16).ok()?
    } else if let Some(bin) = digits.strip_prefix("0b").or_else(|| digits.strip_prefix("0B")) {
        i64::from_str_radix(bin, 2).ok()?
    } else if digits.starts_with(|c: char| c.is_ascii_digit()) {
        digits.parse::<i64>().ok()?
    } else {
        return None;
    };

    Some(if negative { -magnitude } else { magnitude })
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Errors that can occur during assembly.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AssemblerError {
    #[error("syntax error on line {line}: {message}")]
    SyntaxError { line: usize, message: String },

    #[error("unknown mnemonic on line {line}: {mnemonic}")]
    UnknownMnemonic { line: usize, mnemonic: String },

    #[error("unknown register on line {line}: {name}")]
    UnknownRegister { line: usize, name: String },

    #[error("undefined label on line {line}: {label}")]
    UndefinedLabel { line: usize, label: String },

    #[error("duplicate label on line {line}: {label}")]
    DuplicateLabel { line: usize, label: String },

    #[error("value out of range on line {line}: {value}")]
    ValueOutOfRange { line: usize, value: i64 },

    #[error("instruction on line {line} encodes to the halt sentinel 0x{word:04X}")]
    ReservedEncoding { line: usize, word: u16 },
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cpu::decode::decode;

    fn reg(index: u8) -> Reg {
        Reg::new(index).unwrap()
    }

    #[test]
    fn test_assemble_simple() {
        let source = r#"
            ; Simple test program
            li x, 5
            comp r1, r2, r3
            halt
        "#;

        let result = assemble(source).unwrap();
        assert_eq!(result, vec![
            Word::from_bits(0x05FA),
            Word::from_bits(0x3219),
            Word::ZERO,
        ]);
    }

    #[test]
    fn test_assemble_every_format() {
        let source = "
            NOT r1, r2
            sh r4, r5, r6
            piu r7, 0x2
            lwmc r3, -128
            swmc r3, 127
        ";

        let words = assemble(source).unwrap();
        assert_eq!(decode(words[0]), Instruction::register(Opcode::Not, reg(1), reg(2), reg(0)));
        assert_eq!(decode(words[1]), Instruction::register(Opcode::Sh, reg(4), reg(5), reg(6)));
        assert_eq!(decode(words[2]), Instruction::immediate(Opcode::Piu, reg(7), 2));
        assert_eq!(decode(words[3]), Instruction::immediate(Opcode::Lwmc, reg(3), -128));
        assert_eq!(decode(words[4]), Instruction::immediate(Opcode::Swmc, reg(3), 127));
    }

    #[test]
    fn test_assemble_with_labels() {
        let source = r#"
        start:
            li r1, 1
            apceq r0, end
            li r2, 2
        end: halt
            apceq r0, start
        "#;

        let result = assemble(source).unwrap();
        assert_eq!(result.len(), 5);
        assert_eq!(decode(result[1]), Instruction::immediate(Opcode::Apceq, reg(0), 2));
        assert_eq!(decode(result[4]), Instruction::immediate(Opcode::Apceq, reg(0), -4));
    }

    #[test]
    fn test_assemble_data_and_org() {
        let source = r#"
            dat 42
            .word -17
            .org 4
        value:
            .word 0xFFFF
            .word value
            exit 7
        "#;

        let result = assemble(source).unwrap();
        assert_eq!(result.len(), 7);
        assert_eq!(result[0], Word::new(42));
        assert_eq!(result[1], Word::new(-17));
        assert_eq!(result[2], Word::ZERO);
        assert_eq!(result[4], Word::new(-1));
        assert_eq!(result[5], Word::new(4));
        assert_eq!(result[6], Word::from_bits(0x7000));
    }

    #[test]
    fn test_org_is_bounded_by_the_address_space() {
        assert_eq!(
            assemble(".org 0x7FFFFFFFFFFFFFFF\nhalt").unwrap_err(),
            AssemblerError::ValueOutOfRange { line: 1, value: i64::MAX }
        );
        assert_eq!(
            assemble("halt\n.org 65537").unwrap_err(),
            AssemblerError::ValueOutOfRange { line: 2, value: 65_537 }
        );
        assert_eq!(
            assemble(".org -1").unwrap_err(),
            AssemblerError::ValueOutOfRange { line: 1, value: -1 }
        );
        assert_eq!(assemble(".org 0x10000").unwrap().len(), 0x10000);
    }

    #[test]
    fn test_org_takes_only_earlier_labels() {
        let err = assemble(".org end\nend: halt").unwrap_err();
        assert!(matches!(
            err,
            AssemblerError::SyntaxError { line: 1, ref message } if message.contains("defined above")
        ));

        let err = assemble("start: halt\n.org start\n").unwrap_err();
        assert!(matches!(err, AssemblerError::SyntaxError { line: 2, .. }));

        let words = assemble("halt\nhere:\n.org here\nexit 2").unwrap();
        assert_eq!(words, vec![Word::ZERO, Word::from_bits(0x2000)]);
    }

    #[test]
    fn test_reserved_encoding_rejected() {
        let err = assemble("and r0, r0, r3").unwrap_err();
        assert_eq!(err, AssemblerError::ReservedEncoding { line: 1, word: 0x3000 });

        assert!(assemble("and r0, r0, r10").is_ok());
        assert!(assemble("and r1, r0, r3").is_ok());
    }

    #[test]
    fn test_errors_carry_line_numbers() {
        assert!(matches!(
            assemble("li r1, 1\njmp r2").unwrap_err(),
            AssemblerError::UnknownMnemonic { line: 2, .. }
        ));
        assert!(matches!(
            assemble("add r1, r2, q9").unwrap_err(),
            AssemblerError::UnknownRegister { line: 1, .. }
        ));
        assert!(matches!(
            assemble("\n\napceq r0, nowhere").unwrap_err(),
            AssemblerError::UndefinedLabel { line: 3, .. }
        ));
        assert!(matches!(
            assemble("li r1, 128").unwrap_err(),
            AssemblerError::ValueOutOfRange { line: 1, value: 128 }
        ));
        assert!(matches!(
            assemble("a:\na: halt").unwrap_err(),
            AssemblerError::DuplicateLabel { line: 2, .. }
        ));
        assert!(matches!(
            assemble("add r1, r2").unwrap_err(),
            AssemblerError::SyntaxError { line: 1, .. }
        ));
        assert!(matches!(
            assemble("exit 1").unwrap_err(),
            AssemblerError::ValueOutOfRange { line: 1, value: 1 }
        ));
        assert!(matches!(
            assemble("halt\nhalt\n.org 1").unwrap_err(),
            AssemblerError::SyntaxError { line: 3, .. }
        ));
    }

    #[test]
    fn test_parse_number() {
        assert_eq!(parse_number("42"), Some(42));
        assert_eq!(parse_number("-0x10"), Some(-16));
        assert_eq!(parse_number("0b101"), Some(5));
        assert_eq!(parse_number("+7"), Some(7));
        assert_eq!(parse_number("loop"), None);
        assert_eq!(parse_number("0xZZ"), None);
    }
}
