// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Subcommand implementations and shared setup.

pub mod analyze;
pub mod datasets;
pub mod inspect;

use model_analyzer::AnalyzerConfig;
use std::path::Path;
use tracing_subscriber::EnvFilter;

/// Installs the global subscriber. `RUST_LOG` wins over `-v`.
pub fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(verbose > 1)
        .with_writer(std::io::stderr)
        .init();
}

/// Reads the analyzer config, or the defaults when no file is given.
pub fn load_config(path: Option<&Path>) -> anyhow::Result<AnalyzerConfig> {
    match path {
        Some(path) => {
            let config = AnalyzerConfig::from_file(path)?;
            tracing::info!("loaded config from {}", path.display());
            Ok(config)
        }
        None => Ok(AnalyzerConfig::default()),
    }
}

/// Truncates a string to `max_len` characters with ellipsis if needed.
pub fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let head: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{head}...")
    }
}

/// Formats a FLOP count with a metric suffix.
pub fn human_flops(flops: u64) -> String {
    const UNITS: [(u64, &str); 4] = [
        (1_000_000_000_000, "T"),
        (1_000_000_000, "G"),
        (1_000_000, "M"),
        (1_000, "K"),
    ];
    for (scale, unit) in UNITS {
        if flops >= scale {
            return format!("{:.2}{unit}", flops as f64 / scale as f64);
        }
    }
    flops.to_string()
}
