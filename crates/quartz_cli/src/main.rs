//! Quartz CLI — drives the text IR loader and the backends.
//!
//! `quartz verilog design.ir` emits structural Verilog, `quartz dot`
//! renders the value graph, `quartz stats` summarizes a design,
//! `quartz simplify` preprocesses a DIMACS CNF file, and `quartz sim`
//! runs a design for a number of clock cycles.

#![warn(missing_docs)]

use clap::{Parser, Subcommand};
use quartz_bits::BitString;
use quartz_ir::{Module, Value};
use quartz_proof::Cnf;
use quartz_sim::Simulation;
use std::error::Error;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process;

/// Quartz — synchronous circuit IR tools.
#[derive(Parser, Debug)]
#[command(name = "quartz", version, about = "Quartz hardware IR tools")]
struct Cli {
    /// The subcommand to run.
    #[command(subcommand)]
    command: Command,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
enum Command {
    /// Emit a text IR design as structural Verilog.
    Verilog {
        /// Input text IR file.
        input: PathBuf,

        /// Output file (stdout if omitted).
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Render a text IR design as a GraphViz digraph.
    Dot {
        /// Input text IR file.
        input: PathBuf,

        /// Output file (stdout if omitted).
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Print node, register, and memory counts of a design.
    Stats {
        /// Input text IR file.
        input: PathBuf,
    },
    /// Run unit propagation and pure-literal elimination on a DIMACS file.
    Simplify {
        /// Input DIMACS CNF file.
        input: PathBuf,

        /// Output file (stdout if omitted).
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Simulate a design with a toggling clock and zeroed data inputs.
    Sim {
        /// Input text IR file.
        input: PathBuf,

        /// Number of full clock cycles to run.
        #[arg(short, long, default_value_t = 16)]
        cycles: u64,

        /// Name of the clock input to toggle (defaults to the first
        /// one-bit input).
        #[arg(long)]
        clock: Option<String>,
    },
}

fn load_module(path: &Path) -> Result<Module, Box<dyn Error>> {
    let text = fs::read_to_string(path)?;
    let name = path
        .file_stem()
        .and_then(|stem| stem.to_str())
        .unwrap_or("top");
    Ok(quartz_textir::read_module_named(&text, name)?)
}

fn write_output(output: Option<&Path>, contents: &[u8]) -> Result<(), Box<dyn Error>> {
    match output {
        Some(path) => fs::write(path, contents)?,
        None => std::io::stdout().write_all(contents)?,
    }
    Ok(())
}

fn run(cli: Cli) -> Result<(), Box<dyn Error>> {
    match cli.command {
        Command::Verilog { input, output } => {
            let module = load_module(&input)?;
            let mut buffer = Vec::new();
            quartz_emit::write_verilog(&module, &mut buffer)?;
            write_output(output.as_deref(), &buffer)
        }
        Command::Dot { input, output } => {
            let module = load_module(&input)?;
            let mut buffer = Vec::new();
            quartz_emit::write_graphviz(&module, &mut buffer)?;
            write_output(output.as_deref(), &buffer)
        }
        Command::Stats { input } => {
            let module = load_module(&input)?;
            println!("module {}", module.name());
            println!("  values:   {}", module.len());
            println!("  inputs:   {}", module.inputs().len());
            println!("  outputs:  {}", module.outputs().len());
            println!("  regs:     {}", module.regs().len());
            println!("  memories: {}", module.memories().count());
            Ok(())
        }
        Command::Simplify { input, output } => {
            let text = fs::read_to_string(&input)?;
            let cnf = Cnf::parse_dimacs(&text)?;
            let simplified = cnf.simplify();
            eprintln!(
                "{} vars, {} clauses -> {} vars, {} clauses",
                cnf.var_count(),
                cnf.len(),
                simplified.var_count(),
                simplified.len()
            );
            let mut buffer = Vec::new();
            simplified.write_dimacs(&mut buffer)?;
            write_output(output.as_deref(), &buffer)
        }
        Command::Sim {
            input,
            cycles,
            clock,
        } => {
            let module = load_module(&input)?;
            let clock_index = module
                .inputs()
                .iter()
                .position(|&id| match module.value(id) {
                    Value::Input(node) => match &clock {
                        Some(name) => &node.name == name,
                        None => node.width == 1,
                    },
                    _ => false,
                })
                .ok_or("no suitable clock input found")?;
            let mut sim = Simulation::new(&module);
            for cycle in 0..cycles {
                for level in [false, true] {
                    let inputs: Vec<BitString> = module
                        .inputs()
                        .iter()
                        .enumerate()
                        .map(|(index, &id)| {
                            if index == clock_index {
                                BitString::from_bool(level)
                            } else {
                                BitString::new(module.width(id))
                            }
                        })
                        .collect();
                    sim.update(&inputs)?;
                }
                print!("cycle {cycle}:");
                for (output, value) in module.outputs().iter().zip(sim.outputs()) {
                    print!(" {}={}", output.name, value);
                }
                println!();
            }
            Ok(())
        }
    }
}

fn main() {
    let cli = Cli::parse();
    if let Err(error) = run(cli) {
        eprintln!("error: {error}");
        process::exit(1);
    }
}
