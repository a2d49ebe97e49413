//! Assembler, disassembler and binary images for Zedecim programs.

pub mod assembler;
pub mod disasm;
pub mod image;

pub use assembler::{assemble, AssemblerError};
pub use disasm::{disassemble, disassemble_word};
pub use image::{read_image, write_image, ImageError};
