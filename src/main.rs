// SPDX-License-Identifier: GPL-3.0-only

use clap::{Parser, Subcommand};
use smartcam::FilterMode;
use std::path::PathBuf;

mod cli;

#[derive(Parser)]
#[command(name = "smartcam")]
#[command(about = "Smart camera with live text and barcode detection")]
#[command(version = smartcam::VERSION)]
#[command(subcommand_required = false)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run an interactive session on the virtual camera (default)
    Run {
        /// Stream this image instead of the test pattern
        #[arg(short, long)]
        image: Option<PathBuf>,

        /// Start with detection enabled
        #[arg(short, long)]
        detect: bool,

        /// Start with this filter (normal, grayscale, sepia)
        #[arg(short, long)]
        filter: Option<FilterMode>,
    },

    /// Detect text and barcodes in an image file
    Scan {
        /// Image to analyze
        image: PathBuf,
    },

    /// Apply a preview filter to an image file
    Filter {
        /// Input image
        input: PathBuf,

        /// Output image
        output: PathBuf,

        /// Filter to apply (normal, grayscale, sepia)
        #[arg(short, long, default_value = "grayscale")]
        mode: FilterMode,
    },

    /// Print the effective configuration
    Config,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    // Set RUST_LOG environment variable to control log level
    // Examples: RUST_LOG=debug, RUST_LOG=smartcam=debug, RUST_LOG=info
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_target(true)
        .with_level(true)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Run {
            image,
            detect,
            filter,
        }) => cli::run_session(image, detect, filter),
        Some(Commands::Scan { image }) => cli::scan_image(&image),
        Some(Commands::Filter {
            input,
            output,
            mode,
        }) => cli::filter_image(&input, &output, mode),
        Some(Commands::Config) => cli::print_config(),
        None => cli::run_session(None, false, None),
    }
}
