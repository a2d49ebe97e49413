//! Zedecim Emulator - CLI Entry Point
//!
//! Commands:
//! - `zedecim-emu run <program>` - Run a binary image or ASM file
//! - `zedecim-emu debug <program>` - Interactive debugger
//! - `zedecim-emu asm <source>` - Assemble to a binary image
//! - `zedecim-emu disasm <binary>` - Disassemble a binary image

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use zedecim::{Emulator, MachineConfig, Radix};

#[derive(Parser)]
#[command(name = "zedecim-emu")]
#[command(version)]
#[command(about = "An emulator of the Zedecim 16-bit virtual processor")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

/// Machine settings shared by `run` and `debug`.
#[derive(clap::Args)]
struct MachineArgs {
    /// JSON configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,
    /// Memory size in bytes (even, non-zero)
    #[arg(long)]
    memory_bytes: Option<usize>,
    /// Number base for the state report
    #[arg(short, long, value_enum)]
    base: Option<Radix>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a program until it halts
    Run {
        /// Path to the binary image or ASM file to execute
        program: PathBuf,
        #[command(flatten)]
        machine: MachineArgs,
        /// Stop after this many instructions
        #[arg(short, long)]
        max_cycles: Option<u64>,
        /// Write the final memory contents to this file
        #[arg(short, long)]
        dump: Option<PathBuf>,
        /// Print the final state as JSON
        #[arg(long)]
        json: bool,
    },
    /// Interactive debugger
    #[cfg(feature = "tui")]
    Debug {
        /// Path to the binary image or ASM file to debug
        program: PathBuf,
        #[command(flatten)]
        machine: MachineArgs,
    },
    /// Assemble source to a binary image
    Asm {
        /// Path to the source file
        source: PathBuf,
        /// Output image (defaults to the source with a `.bin` extension)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Disassemble a binary image to readable text
    Disasm {
        /// Path to the binary image
        binary: PathBuf,
    },
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Run { program, machine, max_cycles, dump, json }) => {
            let mut config = load_config(&machine);
            if max_cycles.is_some() {
                config.max_cycles = max_cycles;
            }
            run_program(&program, config, dump.as_deref(), json);
        }
        #[cfg(feature = "tui")]
        Some(Commands::Debug { program, machine }) => {
            debug_program(&program, load_config(&machine));
        }
        Some(Commands::Asm { source, output }) => {
            assemble_file(&source, output);
        }
        Some(Commands::Disasm { binary }) => {
            disassemble_file(&binary);
        }
        None => {
            println!("Zedecim Emulator v{}", env!("CARGO_PKG_VERSION"));
            println!("A 16-bit virtual processor emulator");
            println!();
            println!("Use --help for available commands");
        }
    }
}

/// Print an error and exit with status 1.
fn fail(context: &str, error: impl std::fmt::Display) -> ! {
    eprintln!("❌ {}: {}", context, error);
    std::process::exit(1);
}

/// File configuration, overridden by individual flags.
fn load_config(args: &MachineArgs) -> MachineConfig {
    let mut config = match &args.config {
        Some(path) => MachineConfig::load(path).unwrap_or_else(|e| fail("Failed to load config", e)),
        None => MachineConfig::default(),
    };
    if let Some(bytes) = args.memory_bytes {
        config.memory_bytes = bytes;
    }
    if let Some(base) = args.base {
        config.base = base;
    }
    config
}

fn run_program(path: &Path, config: MachineConfig, dump: Option<&Path>, json: bool) {
    use zedecim::cpu::StdConsole;
    use zedecim::RunReport;

    let base = config.base;
    let emulator = Emulator::new(config);
    let cpu = emulator
        .run_file(path, dump, StdConsole::stdio())
        .unwrap_or_else(|e| fail("Run failed", e));

    if json {
        let report = RunReport::from_cpu(&cpu);
        match serde_json::to_string_pretty(&report) {
            Ok(text) => println!("{}", text),
            Err(e) => fail("Failed to encode report", e),
        }
        return;
    }

    println!();
    println!("{}", cpu.render_state(base));
    println!("Cycles: {}", cpu.cycles);

    if cpu.is_running() {
        if let Some(limit) = emulator.config().max_cycles {
            println!();
            println!("⚠️  Reached max cycles limit ({}). Use --max-cycles to increase.", limit);
        }
    }
    if let Some(dump) = dump {
        println!("✓ Memory dumped to {}", dump.display());
    }
}

#[cfg(feature = "tui")]
fn debug_program(path: &Path, config: MachineConfig) {
    use zedecim::emulator::load_program_file;
    use zedecim::tui::{run_debugger, DebuggerApp};

    println!("🔍 Loading: {}", path.display());

    let program = load_program_file(path).unwrap_or_else(|e| fail("Failed to load program", e));
    let app = DebuggerApp::new(program, &config).unwrap_or_else(|e| fail("Failed to load program", e));

    if let Err(e) = run_debugger(app) {
        fail("Debugger error", e);
    }
}

fn assemble_file(source_path: &Path, output: Option<PathBuf>) {
    use zedecim::asm::{assemble, write_image};

    let out_path = output.unwrap_or_else(|| source_path.with_extension("bin"));

    println!("📝 Assembling: {} → {}", source_path.display(), out_path.display());

    let source = std::fs::read_to_string(source_path)
        .unwrap_or_else(|e| fail("Failed to read file", e));
    let words = assemble(&source).unwrap_or_else(|e| fail("Assembly error", e));

    println!("✓ Assembled {} words", words.len());

    if let Err(e) = write_image(&out_path, &words) {
        fail("Failed to save image", e);
    }

    println!("✓ Saved to {}", out_path.display());
}

fn disassemble_file(binary_path: &Path) {
    use zedecim::asm::{disassemble, read_image};
    use zedecim::asm::image::bytes_to_words;

    println!("📖 Disassembling: {}", binary_path.display());
    println!();

    let bytes = read_image(binary_path).unwrap_or_else(|e| fail("Failed to load image", e));
    println!("{}", disassemble(&bytes_to_words(&bytes)));
}
