// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! # sparsekit
//!
//! Command-line interface for model cost analysis and dataset lookup.
//!
//! ## Usage
//! ```bash
//! # Analyze a model and write its report
//! sparsekit analyze --model ./models/resnet18.onnx --output resnet18.json
//!
//! # Inspect a model, or a previously written report
//! sparsekit inspect --model ./models/resnet18.onnx
//! sparsekit inspect --report resnet18.json
//!
//! # List registered datasets and whether they are available locally
//! sparsekit datasets --root ~/datasets
//! ```

mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "sparsekit",
    about = "Static FLOP, parameter and sparsity analysis for pruning",
    version,
    author
)]
struct Cli {
    /// Path to an analyzer TOML configuration file.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging (repeat for more: -v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze an ONNX model and write the JSON report.
    Analyze {
        /// Path to the ONNX model file.
        #[arg(short, long)]
        model: PathBuf,

        /// Report path (defaults to the model path with a `.json` extension).
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Print per-operator and per-node costs of a model or report.
    Inspect {
        /// Path to the ONNX model file.
        #[arg(short, long, conflicts_with = "report", required_unless_present = "report")]
        model: Option<PathBuf>,

        /// Path to a JSON report written by `analyze`.
        #[arg(short, long)]
        report: Option<PathBuf>,
    },

    /// List registered datasets and their local availability.
    Datasets {
        /// Directory holding extracted datasets.
        #[arg(short, long, default_value = "datasets")]
        root: PathBuf,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize tracing/logging based on verbosity.
    commands::init_tracing(cli.verbose);

    match cli.command {
        Commands::Analyze { model, output } => {
            let config = commands::load_config(cli.config.as_deref())?;
            commands::analyze::execute(config, model, output)
        }
        Commands::Inspect { model, report } => {
            let config = commands::load_config(cli.config.as_deref())?;
            commands::inspect::execute(config, model, report)
        }
        Commands::Datasets { root } => commands::datasets::execute(root),
    }
}
