// Licensed under the Apache-2.0 license

use clap::{Parser, Subcommand};
use log::LevelFilter;
use simple_logger::SimpleLogger;
use std::path::PathBuf;

mod rdl_gen;

#[derive(Parser)]
#[command(name = "xtask", version, about = "Caliptra MCU register tooling")]
struct Xtask {
    #[command(subcommand)]
    xtask: Commands,

    /// Increase log output (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate register offset constants from an elaborated address map
    RdlGen {
        /// Tree description (.json or .hjson)
        #[arg(short, long, value_name = "FILE")]
        input: PathBuf,

        /// Output dialect; may be repeated (cc, py, sv, vhd). Defaults to all.
        #[arg(short, long = "dialect", value_parser = rdl_gen::parse_dialect)]
        dialects: Vec<mcu_registers_offsets::Dialect>,

        /// Directory the artifacts are written to
        #[arg(short, long, default_value = ".")]
        output_dir: PathBuf,

        /// Override the alignment unit of the description
        #[arg(long)]
        alignment: Option<u64>,

        /// Suffix to strip from the address map name; may be repeated
        #[arg(long = "strip-suffix")]
        strip_suffixes: Vec<String>,

        /// Prefix to strip from the address map name; may be repeated
        #[arg(long = "strip-prefix")]
        strip_prefixes: Vec<String>,

        /// Prefix array members with the array name in the HDL dialects
        #[arg(long)]
        qualify_array_members: bool,

        /// Additional register name to leave out; may be repeated
        #[arg(long = "exclude")]
        exclude_names: Vec<String>,
    },
}

fn main() {
    let cli = Xtask::parse();

    let level = match cli.verbose {
        0 => LevelFilter::Info,
        1 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    if let Err(err) = SimpleLogger::new().with_level(level).init() {
        eprintln!("Failed to initialize logger: {err}");
    }

    let result = match cli.xtask {
        Commands::RdlGen {
            input,
            dialects,
            output_dir,
            alignment,
            strip_suffixes,
            strip_prefixes,
            qualify_array_members,
            exclude_names,
        } => rdl_gen::generate(&rdl_gen::GenerateArgs {
            input,
            dialects,
            output_dir,
            alignment,
            strip_suffixes,
            strip_prefixes,
            qualify_array_members,
            exclude_names,
        }),
    };
    if let Err(err) = result {
        log::error!("{err:#}");
        std::process::exit(1);
    }
}
