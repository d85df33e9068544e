//! ibom-centroid CLI - convert centroid files to InteractiveHtmlBom pcbdata JSON.

use anyhow::{Context, Result};
use clap::Parser;
use ibom_centroid::{CentroidCore, ConversionOptions, ConversionResult, DEFAULT_SCALE};
use std::fs;
use std::io::Write;
use std::path::PathBuf;
use std::process;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "ibom-centroid")]
#[command(about = "Convert a pick-and-place centroid file into InteractiveHtmlBom pcbdata", long_about = None)]
#[command(version)]
struct Cli {
    /// Input centroid file
    #[arg(short, long, value_name = "board.xy")]
    input: PathBuf,

    /// Output pcbdata file (stdout when omitted)
    #[arg(short, long, value_name = "pcbdata.json")]
    output: Option<PathBuf>,

    /// Board width, in mm
    #[arg(short = 'W', long, value_name = "MM", default_value_t = 0.0)]
    width: f64,

    /// Board height, in mm
    #[arg(short = 'H', long, value_name = "MM", default_value_t = 0.0)]
    height: f64,

    /// Millimeters per pixel of the board photos (default: 600 dpi)
    #[arg(short, long, value_name = "SCALE", default_value_t = DEFAULT_SCALE)]
    mpp: f64,

    /// Field delimiter
    #[arg(short, long, default_value_t = ',')]
    delimiter: char,

    /// Comment marker; lines whose first field starts with it are skipped
    #[arg(long, default_value_t = '#')]
    comment: char,

    /// Write single-line JSON instead of indented output
    #[arg(long)]
    compact: bool,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let exit_code = match run(&cli) {
        Ok(result) => {
            eprintln!(
                "{}: {} components ({} top, {} bottom), {} BOM groups",
                result.source,
                result.stats.components,
                result.stats.top,
                result.stats.bottom,
                result.stats.bom_groups
            );
            0
        }
        Err(e) => {
            eprintln!("Error: {:#}", e);
            1
        }
    };

    process::exit(exit_code);
}

fn init_logging(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run(cli: &Cli) -> Result<ConversionResult> {
    let options = ConversionOptions {
        width: cli.width,
        height: cli.height,
        scale: cli.mpp,
        delimiter: cli.delimiter,
        comment_marker: cli.comment,
        ..Default::default()
    };
    tracing::debug!("Conversion options: {:?}", options);

    let result = CentroidCore::convert_file(&cli.input, &options)
        .with_context(|| format!("failed to convert {}", cli.input.display()))?;

    let json = if cli.compact {
        serde_json::to_string(&result.pcbdata)?
    } else {
        serde_json::to_string_pretty(&result.pcbdata)?
    };

    match &cli.output {
        Some(path) => fs::write(path, json + "\n")
            .with_context(|| format!("failed to write {}", path.display()))?,
        None => {
            let mut stdout = std::io::stdout().lock();
            writeln!(stdout, "{}", json).context("failed to write to stdout")?;
        }
    }

    Ok(result)
}
