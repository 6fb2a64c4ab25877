//! sap8 Emulator - CLI Entry Point
//!
//! Commands:
//! - `sap8-emu run <program>` - Run an image or ASM file
//! - `sap8-emu debug <program>` - Interactive debugger
//! - `sap8-emu asm <source>` - Assemble to an image file
//! - `sap8-emu disasm <image>` - Disassemble an image file
//! - `sap8-emu test` - Built-in self-test

use std::time::Duration;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;
use sap8::{assemble, load_image, save_image, Computer, Program};

#[derive(Parser)]
#[command(name = "sap8-emu")]
#[command(author = "Yigit")]
#[command(version = "0.1.0")]
#[command(about = "A microcoded 8-bit bus computer emulator")]
struct Cli {
    /// Log every microinstruction (overrides RUST_LOG)
    #[arg(short, long, global = true)]
    trace: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a program until it halts
    Run {
        /// Path to the image or ASM file to execute
        program: String,
        /// Memory size as a power of two (0-4)
        #[arg(long, default_value = "4")]
        pages: usize,
        /// Clock period in milliseconds (0 = as fast as possible)
        #[arg(long, default_value = "0")]
        period: u64,
        /// Maximum number of clock cycles to run
        #[arg(short, long, default_value = "10000")]
        max_cycles: u64,
        /// Print the final machine state as JSON
        #[arg(long)]
        json: bool,
    },
    /// Interactive debugger
    Debug {
        /// Path to the image or ASM file to debug
        program: String,
        /// Memory size as a power of two (0-4)
        #[arg(long, default_value = "4")]
        pages: usize,
    },
    /// Assemble source to an image file
    Asm {
        /// Path to the source file
        source: String,
        /// Output image file
        #[arg(short, long)]
        output: Option<String>,
    },
    /// Disassemble an image file to readable text
    Disasm {
        /// Path to the image file
        image: String,
    },
    /// Run the built-in self-test
    Test,
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.trace);

    match cli.command {
        Some(Commands::Run { program, pages, period, max_cycles, json }) => {
            run_program(&program, pages, Duration::from_millis(period), max_cycles, json);
        }
        Some(Commands::Debug { program, pages }) => {
            debug_program(&program, pages);
        }
        Some(Commands::Asm { source, output }) => {
            assemble_file(&source, output);
        }
        Some(Commands::Disasm { image }) => {
            disassemble_file(&image);
        }
        Some(Commands::Test) => {
            run_self_test();
        }
        None => {
            println!("sap8 Emulator v0.1.0");
            println!("A microcoded 8-bit bus computer emulator");
            println!();
            println!("Use --help for available commands");
        }
    }
}

fn init_logging(trace: bool) {
    let filter = if trace {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Load a program from an `.asm` source or an image file, exiting on failure.
fn load_program_file(path: &str) -> Program {
    if path.ends_with(".asm") {
        let source = match std::fs::read_to_string(path) {
            Ok(s) => s,
            Err(e) => {
                eprintln!("❌ Failed to read file: {}", e);
                std::process::exit(1);
            }
        };

        match assemble(&source) {
            Ok(program) => {
                println!("📝 Assembled {} bytes", program.instructions.len() + program.data.len());
                program
            }
            Err(e) => {
                eprintln!("❌ Assembly error: {}", e);
                std::process::exit(1);
            }
        }
    } else {
        match load_image(path) {
            Ok(program) => {
                println!("📂 Loaded {} bytes", program.instructions.len() + program.data.len());
                program
            }
            Err(e) => {
                eprintln!("❌ Failed to load image: {}", e);
                std::process::exit(1);
            }
        }
    }
}

fn build_computer(program: &Program, pages: usize) -> Computer {
    let mut computer = match Computer::new(pages) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("❌ Failed to build machine: {}", e);
            std::process::exit(1);
        }
    };
    if let Err(e) = computer.load_program(program) {
        eprintln!("❌ Failed to load program: {}", e);
        std::process::exit(1);
    }
    computer
}

fn run_program(path: &str, pages: usize, period: Duration, max_cycles: u64, json: bool) {
    println!("🔧 Running: {}", path);

    let program = load_program_file(path);
    let mut computer = build_computer(&program, pages);

    let result = computer.run_limited(period, Some(max_cycles));

    if json {
        match serde_json::to_string_pretty(&computer.snapshot()) {
            Ok(text) => println!("{}", text),
            Err(e) => eprintln!("❌ Failed to serialize snapshot: {}", e),
        }
    } else {
        print_summary(&computer, result.as_ref().ok().copied());
    }

    match result {
        Ok(cycles) if cycles >= max_cycles && !computer.is_halted() => {
            println!();
            println!("⚠️  Reached max cycles limit ({}). Use --max-cycles to increase.", max_cycles);
        }
        Ok(_) => {}
        Err(e) => {
            eprintln!("❌ Machine error at PC={}: {}", computer.pc(), e);
            std::process::exit(1);
        }
    }
}

fn print_summary(computer: &Computer, cycles: Option<u64>) {
    let flags = computer.flags();
    println!();
    println!("━━━ Result ━━━");
    if let Some(cycles) = cycles {
        println!("Cycles: {}", cycles);
    }
    println!("Clock:  {:?}", computer.clock.state());
    println!("A:      {} ({})", computer.a(), computer.a().to_u8());
    println!("B:      {} ({})", computer.b(), computer.b().to_u8());
    println!("O:      {} ({})", computer.output(), computer.output().to_u8());
    println!("PC:     {}", computer.pc());
    println!("Flags:  CARRY={} ZERO={}", flags.carry, flags.zero);
}

#[cfg(feature = "tui")]
fn debug_program(path: &str, pages: usize) {
    use sap8::tui::run_debugger;

    println!("🔍 Loading: {}", path);
    let program = load_program_file(path);
    let computer = build_computer(&program, pages);

    println!("🚀 Launching debugger...");
    println!();

    if let Err(e) = run_debugger(computer) {
        eprintln!("❌ Debugger error: {}", e);
        std::process::exit(1);
    }
}

#[cfg(not(feature = "tui"))]
fn debug_program(_path: &str, _pages: usize) {
    eprintln!("❌ The debugger needs the `tui` feature");
    std::process::exit(1);
}

fn assemble_file(source_path: &str, output: Option<String>) {
    let out_path = output.unwrap_or_else(|| source_path.replace(".asm", ".img"));

    println!("📝 Assembling: {} → {}", source_path, out_path);

    let source = match std::fs::read_to_string(source_path) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("❌ Failed to read file: {}", e);
            std::process::exit(1);
        }
    };

    let program = match assemble(&source) {
        Ok(program) => program,
        Err(e) => {
            eprintln!("❌ Assembly error: {}", e);
            std::process::exit(1);
        }
    };

    println!(
        "✓ Assembled {} sequential and {} addressed bytes",
        program.instructions.len(),
        program.data.len()
    );

    if let Err(e) = save_image(&out_path, &program) {
        eprintln!("❌ Failed to save image: {}", e);
        std::process::exit(1);
    }

    println!("✓ Saved to {}", out_path);
}

fn disassemble_file(image_path: &str) {
    use sap8::asm::disasm::disassemble_program;

    println!("📖 Disassembling: {}", image_path);
    println!();

    let program = match load_image(image_path) {
        Ok(p) => p,
        Err(e) => {
            eprintln!("❌ Failed to load image: {}", e);
            std::process::exit(1);
        }
    };

    println!("{}", disassemble_program(&program));
}

/// Assemble and run a program to completion on a full-size machine.
fn run_source(source: &str) -> Result<Computer, String> {
    let program = assemble(source).map_err(|e| e.to_string())?;
    let mut computer = Computer::default();
    computer.load_program(&program).map_err(|e| e.to_string())?;
    computer.run_limited(Duration::ZERO, Some(1000)).map_err(|e| e.to_string())?;
    if !computer.is_halted() {
        return Err("did not halt".into());
    }
    Ok(computer)
}

fn run_self_test() {
    use sap8::binary::arith;
    use sap8::Byte;

    println!("━━━ sap8 Emulator Self-Test ━━━");
    println!();

    let mut passed = 0;
    let mut failed = 0;

    let mut check = |name: &str, outcome: Result<(), String>| {
        print!("{}... ", name);
        match outcome {
            Ok(()) => {
                println!("✓");
                passed += 1;
            }
            Err(why) => {
                println!("✗ ({})", why);
                failed += 1;
            }
        }
    };

    check("Ripple adder matches u8 arithmetic", {
        let bad = (0..=255u8).step_by(7).flat_map(|a| (0..=255u8).step_by(11).map(move |b| (a, b))).find(|(a, b)| {
            let (sum, _) = arith::ripple_add(&Byte::from_u8(*a), &Byte::from_u8(*b), sap8::Bit::Zero);
            sum.to_u8() != a.wrapping_add(*b)
        });
        match bad {
            Some((a, b)) => Err(format!("{} + {}", a, b)),
            None => Ok(()),
        }
    });

    check("Counter wraps after 256 increments", {
        let mut value = Byte::from_u8(77);
        for _ in 0..256 {
            arith::ripple_increment(&mut value);
        }
        if value.to_u8() == 77 { Ok(()) } else { Err(format!("got {}", value.to_u8())) }
    });

    check("LDA then HLT", run_source("LDA X\nHLT\nORG 15\nX: DAT 5").and_then(|c| {
        if c.a().to_u8() == 5 { Ok(()) } else { Err(format!("A = {}", c.a().to_u8())) }
    }));

    check("ADDA 3 + 2", run_source("LDA X\nADDA Y\nHLT\nX: DAT 3\nY: DAT 2").and_then(|c| {
        let flags = c.flags();
        if c.a().to_u8() == 5 && !flags.carry.is_set() && !flags.zero.is_set() {
            Ok(())
        } else {
            Err(format!("A = {}", c.a().to_u8()))
        }
    }));

    check("SUBA 2 - 3", run_source("LDA X\nSUBA Y\nHLT\nX: DAT 2\nY: DAT 3").and_then(|c| {
        if c.a().to_u8() == 0xFF && !c.flags().carry.is_set() {
            Ok(())
        } else {
            Err(format!("A = {}", c.a().to_u8()))
        }
    }));

    check("JMPZ taken on zero", run_source(
        "LDA X\nSUBA X\nJMPZ T\nHLT\nT: LDO Y\nHLT\nX: DAT 3\nY: DAT 42",
    ).and_then(|c| {
        if c.output().to_u8() == 42 { Ok(()) } else { Err(format!("O = {}", c.output().to_u8())) }
    }));

    println!();
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!("Results: {} passed, {} failed", passed, failed);

    if failed == 0 {
        println!("✓ All tests passed!");
    } else {
        std::process::exit(1);
    }
}
