//! Run programs from files on a freshly built machine.
//!
//! Each run constructs its own [`Cpu`]; nothing carries over from one run to
//! the next.

use crate::asm::{assemble, AssemblerError};
use crate::asm::image::{read_image, words_to_bytes, write_image, ImageError};
use crate::config::MachineConfig;
use crate::cpu::{Cpu, CpuError, MemoryError, Peripheral, Snapshot, StdConsole};
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Outcome of one emulated run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunReport {
    /// Machine state at the end of the run.
    pub snapshot: Snapshot,
    /// False when the cycle limit stopped the machine before it halted.
    pub completed: bool,
}

impl RunReport {
    /// Summarize a finished (or interrupted) machine.
    pub fn from_cpu<P>(cpu: &Cpu<P>) -> Self {
        Self {
            snapshot: cpu.snapshot(),
            completed: cpu.is_halted(),
        }
    }
}

/// Builds and runs machines according to a [`MachineConfig`].
#[derive(Debug, Clone, Default)]
pub struct Emulator {
    config: MachineConfig,
}

impl Emulator {
    /// Create an emulator.
    pub fn new(config: MachineConfig) -> Self {
        Self { config }
    }

    /// The active configuration.
    pub fn config(&self) -> &MachineConfig {
        &self.config
    }

    /// Load `program` into a new machine and run it.
    ///
    /// The machine is returned whether it halted or hit the cycle limit.
    pub fn run_program<P: Peripheral>(&self, program: &[u8], piu: P) -> Result<Cpu<P>, EmulatorError> {
        let mut cpu = Cpu::new(self.config.memory_bytes, piu)?;
        cpu.load_program(program)?;

        match self.config.max_cycles {
            Some(limit) => {
                cpu.run_limited(limit)?;
                if cpu.is_running() {
                    log::warn!(
                        "stopped after {} cycles at {:04X} without halting",
                        cpu.cycles,
                        cpu.mem.program_counter.get()
                    );
                }
            }
            None => {
                cpu.run()?;
            }
        }

        Ok(cpu)
    }

    /// Run a binary image on the standard console.
    pub fn emulate_bin(&self, path: &Path, dump: Option<&Path>) -> Result<RunReport, EmulatorError> {
        self.emulate_bin_with(path, dump, StdConsole::stdio())
    }

    /// Run a binary image with the given peripheral.
    pub fn emulate_bin_with<P: Peripheral>(
        &self,
        path: &Path,
        dump: Option<&Path>,
        piu: P,
    ) -> Result<RunReport, EmulatorError> {
        let program = read_image(path)?;
        log::info!("running {} ({} bytes)", path.display(), program.len());
        let cpu = self.run_program(&program, piu)?;
        finish(&cpu, dump)
    }

    /// Assemble a source file, store the binary next to it and run it on
    /// the standard console.
    pub fn emulate_source(&self, path: &Path, dump: Option<&Path>) -> Result<RunReport, EmulatorError> {
        self.emulate_source_with(path, dump, StdConsole::stdio())
    }

    /// Like [`Emulator::emulate_source`], with the given peripheral.
    pub fn emulate_source_with<P: Peripheral>(
        &self,
        path: &Path,
        dump: Option<&Path>,
        piu: P,
    ) -> Result<RunReport, EmulatorError> {
        let binary = path.with_extension("bin");
        write_image(&binary, &assemble_file(path)?)?;
        self.emulate_bin_with(&binary, dump, piu)
    }

    /// Run a program file, assembling `.asm` sources in memory.
    ///
    /// Used by the command line, which wants the machine itself for
    /// rendering.
    pub fn run_file<P: Peripheral>(
        &self,
        path: &Path,
        dump: Option<&Path>,
        piu: P,
    ) -> Result<Cpu<P>, EmulatorError> {
        let program = load_program_file(path)?;
        let cpu = self.run_program(&program, piu)?;
        if let Some(dump) = dump {
            write_image(dump, cpu.mem.words())?;
        }
        Ok(cpu)
    }
}

/// Read a program as bytes: sources ending in `.asm` are assembled, anything
/// else is a binary image.
pub fn load_program_file(path: &Path) -> Result<Vec<u8>, EmulatorError> {
    if is_source(path) {
        Ok(words_to_bytes(&assemble_file(path)?))
    } else {
        Ok(read_image(path)?)
    }
}

/// Whether `path` names an assembler source file.
pub fn is_source(path: &Path) -> bool {
    path.extension().map_or(false, |ext| ext.eq_ignore_ascii_case("asm"))
}

fn assemble_file(path: &Path) -> Result<Vec<crate::word::Word>, EmulatorError> {
    let source = std::fs::read_to_string(path).map_err(|source| EmulatorError::Io {
        path: path.display().to_string(),
        source,
    })?;
    let words = assemble(&source)?;
    log::info!("assembled {} words from {}", words.len(), path.display());
    Ok(words)
}

fn finish<P>(cpu: &Cpu<P>, dump: Option<&Path>) -> Result<RunReport, EmulatorError> {
    if let Some(dump) = dump {
        write_image(dump, cpu.mem.words())?;
    }
    Ok(RunReport::from_cpu(cpu))
}

/// Errors from running a program end to end.
#[derive(Debug, Error)]
pub enum EmulatorError {
    #[error("cannot read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{0}")]
    Memory(#[from] MemoryError),

    #[error("{0}")]
    Cpu(#[from] CpuError),

    #[error("assembly error: {0}")]
    Assembler(#[from] AssemblerError),

    #[error("{0}")]
    Image(#[from] ImageError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cpu::{Console, ExitCode};
    use std::io::{Cursor, Empty};
    use std::path::PathBuf;

    fn quiet() -> Console<Empty, Vec<u8>> {
        Console::new(std::io::empty(), Vec::new())
    }

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("zedecim-{}-{}", std::process::id(), name))
    }

    #[test]
    fn test_run_program_halts() {
        let emulator = Emulator::default();
        // li x, 5 ; halt
        let cpu = emulator.run_program(&[0x05, 0xFA, 0x00, 0x00], quiet()).unwrap();
        assert_eq!(cpu.exit_code(), Some(ExitCode::NoInstructions));
        assert_eq!(cpu.snapshot().registers[15], 5);
        assert!(RunReport::from_cpu(&cpu).completed);
    }

    #[test]
    fn test_cycle_limit_interrupts_loop() {
        let emulator = Emulator::new(MachineConfig {
            max_cycles: Some(10),
            ..MachineConfig::default()
        });
        let program = words_to_bytes(&assemble("loop: apceq r0, loop").unwrap());

        let cpu = emulator.run_program(&program, quiet()).unwrap();
        let report = RunReport::from_cpu(&cpu);
        assert!(!report.completed);
        assert_eq!(report.snapshot.cycles, 10);
        assert_eq!(report.snapshot.exit_code, None);
    }

    #[test]
    fn test_invalid_memory_size() {
        let emulator = Emulator::new(MachineConfig {
            memory_bytes: 7,
            ..MachineConfig::default()
        });
        let err = emulator.run_program(&[], quiet()).unwrap_err();
        assert!(matches!(err, EmulatorError::Memory(MemoryError::InvalidSize(7))));
    }

    #[test]
    fn test_program_too_large() {
        let emulator = Emulator::new(MachineConfig {
            memory_bytes: 4,
            ..MachineConfig::default()
        });
        let err = emulator.run_program(&[1, 2, 3, 4, 5, 6], quiet()).unwrap_err();
        assert!(matches!(err, EmulatorError::Memory(MemoryError::Overflow { .. })));
    }

    #[test]
    fn test_runs_are_independent() {
        let emulator = Emulator::default();
        let program = words_to_bytes(&assemble("li r1, 1\nadd r2, r2, r1\nhalt").unwrap());

        let first = emulator.run_program(&program, quiet()).unwrap();
        let second = emulator.run_program(&program, quiet()).unwrap();
        assert_eq!(first.snapshot(), second.snapshot());
        assert_eq!(second.snapshot().registers[2], 1);
    }

    #[test]
    fn test_emulate_source_writes_binary_and_dump() {
        let source = temp_path("echo.asm");
        let dump = temp_path("echo.dump");
        std::fs::write(&source, "piu r1, 2\npiu r1, 0\nexit 2\n").unwrap();

        let piu = Console::new(Cursor::new(b"41\n".to_vec()), Vec::new());
        let emulator = Emulator::new(MachineConfig { memory_bytes: 16, ..MachineConfig::default() });
        let report = emulator.emulate_source_with(&source, Some(&dump), piu).unwrap();

        let binary = source.with_extension("bin");
        assert_eq!(read_image(&binary).unwrap().len(), 6);
        assert_eq!(read_image(&dump).unwrap().len(), 16);
        assert_eq!(report.snapshot.registers[1], 41);
        assert_eq!(report.snapshot.exit_code, Some(0x2000));
        assert!(report.completed);

        for path in [&source, &binary, &dump] {
            std::fs::remove_file(path).unwrap();
        }
    }

    #[test]
    fn test_run_file_assembles_sources() {
        let source = temp_path("div.asm");
        std::fs::write(&source, "li r1, 9\ndiv r2, r1, r0\n").unwrap();

        let cpu = Emulator::default().run_file(&source, None, quiet()).unwrap();
        assert_eq!(cpu.exit_code(), Some(ExitCode::DivisionByZero));
        assert!(!source.with_extension("bin").exists());

        std::fs::remove_file(&source).unwrap();
    }

    #[test]
    fn test_missing_source() {
        let err = Emulator::default()
            .run_file(Path::new("/nonexistent/prog.asm"), None, quiet())
            .unwrap_err();
        assert!(matches!(err, EmulatorError::Io { .. }));
    }

    #[test]
    fn test_report_serializes() {
        let cpu = Emulator::default().run_program(&[0x30, 0x00], quiet()).unwrap();
        let json = serde_json::to_string(&RunReport::from_cpu(&cpu)).unwrap();
        assert!(json.contains("\"exit_code\":12288"));
        assert!(json.contains("\"completed\":true"));
    }
}
