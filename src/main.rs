// src/main.rs
// Command-line front end for ISF Reader

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use log::info;

use isf_reader::{parse_curve, read_with_companions, IsfFile, ReadOptions};

/// Read Tektronix ISF waveform files
#[derive(Parser)]
#[command(name = "isf_reader")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Verbosity level (-v for info, -vv for debug)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Display ISF file information
    Info {
        #[arg(value_name = "FILE")]
        input: PathBuf,
    },

    /// Convert one ISF file to Time,Value CSV
    Convert {
        #[arg(value_name = "FILE")]
        input: PathBuf,

        #[arg(value_name = "OUTPUT")]
        output: PathBuf,
    },

    /// Stack a file and its companion channels into one CSV
    Stack {
        #[arg(value_name = "FILE")]
        input: PathBuf,

        #[arg(value_name = "OUTPUT")]
        output: PathBuf,

        /// Only read the named file
        #[arg(long)]
        single: bool,

        /// Companion files share the name up to this separator
        #[arg(short, long, default_value = "_")]
        separator: String,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_level = match cli.verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level)).init();

    match cli.command {
        Commands::Info { input } => {
            let isf = parse_curve(&input)
                .with_context(|| format!("Failed to load ISF file '{}'", input.display()))?;
            print_file_info(&isf);
        }

        Commands::Convert { input, output } => {
            let isf = parse_curve(&input)
                .with_context(|| format!("Failed to load ISF file '{}'", input.display()))?;
            isf.write_csv(&output)
                .with_context(|| format!("Failed to write CSV file '{}'", output.display()))?;

            println!("Successfully converted {} to {}", input.display(), output.display());
            println!("Total samples written: {}", isf.data().len());
        }

        Commands::Stack {
            input,
            output,
            single,
            separator,
        } => {
            let options = ReadOptions {
                discover: !single,
                separator,
            };
            let stack = read_with_companions(&input, &options)
                .with_context(|| format!("Failed to stack '{}'", input.display()))?;
            info!("stacking {} channel(s)", stack.channels().len());

            stack
                .write_csv(&output)
                .with_context(|| format!("Failed to write CSV file '{}'", output.display()))?;

            let (rows, samples) = stack.shape();
            println!("Stacked {} rows x {} samples into {}", rows, samples, output.display());
            for source in stack.sources() {
                println!("  {}", source.display());
            }
        }
    }

    Ok(())
}

fn print_file_info(isf: &IsfFile) {
    let header = &isf.file_header;
    let x_unit = header.x_unit().unwrap_or("s");
    let y_unit = header.y_unit().unwrap_or("V");

    println!("ISF File Information");
    println!("====================");
    println!();
    println!("File: {}", isf.file_path);
    if let Some(id) = header.waveform_id() {
        println!("Waveform: {}", id);
    }
    println!();

    println!("Encoding:");
    println!("  Encoding: {}", header.encoding);
    println!("  Byte order: {}", header.byte_order);
    println!("  Format: {}", header.binary_format);
    println!("  Bytes per sample: {}", header.byte_width);
    println!("  Samples: {}", header.num_points);
    println!();

    println!("Amplitude Scaling:");
    println!("  YMULT: {} {}/count", header.y_mult, y_unit);
    println!("  YZERO: {} {}", header.y_zero, y_unit);

    let data = isf.data();
    if !data.is_empty() {
        let min = data.iter().fold(f64::INFINITY, |a, &b| a.min(b));
        let max = data.iter().fold(f64::NEG_INFINITY, |a, &b| a.max(b));
        println!("  Data range: {:.6e} {} to {:.6e} {}", min, y_unit, max, y_unit);
    }
    println!();

    println!("Time Scaling:");
    println!("  Sample interval: {:.3e} {}", header.x_incr, x_unit);
    println!("  Start: {:.6e} {}", header.x_zero, x_unit);
    println!(
        "  Record duration: {:.6e} {}",
        header.num_points as f64 * header.x_incr,
        x_unit
    );
    println!();

    println!("Data Layout:");
    println!("  Curve data offset: {} bytes", header.data_offset);
    println!("  Declared data length: {} bytes", header.curve.declared_len);
    println!();

    println!("Tags:");
    for (tag, value) in header.tags() {
        println!("  {} = {}", tag, value);
    }
}
