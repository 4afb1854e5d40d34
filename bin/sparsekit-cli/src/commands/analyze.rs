// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! `sparsekit analyze` command: analyze a model and persist the report.
//!
//! ```text
//! load (memory-mapped) → validate → analyze every node → write JSON
//! ```

use super::human_flops;
use model_analyzer::{AnalyzerConfig, ModelAnalyzer};
use model_ir::GraphLoader;
use std::path::PathBuf;

pub fn execute(
    config: AnalyzerConfig,
    model: PathBuf,
    output: Option<PathBuf>,
) -> anyhow::Result<()> {
    println!("╔══════════════════════════════════════════════════════╗");
    println!("║              sparsekit · Model Analyzer              ║");
    println!("╚══════════════════════════════════════════════════════╝");
    println!();

    let output = output.unwrap_or_else(|| model.with_extension("json"));

    // ── Load ───────────────────────────────────────────────────
    println!("  [1/3] Loading {}...", model.display());
    let graph = GraphLoader::load_with(&model, &config.load_options()).map_err(|e| {
        anyhow::anyhow!("failed to load model from '{}': {e}", model.display())
    })?;
    println!("        {}", graph.summary());
    println!();

    // ── Analyze ────────────────────────────────────────────────
    println!("  [2/3] Analyzing nodes...");
    let analyzer = ModelAnalyzer::new(config);
    let (report, warnings) = analyzer.analyze_with_warnings(&graph);
    println!("        {}", report.summary());
    if !warnings.is_empty() {
        println!("        {} warning(s):", warnings.len());
        for warning in &warnings {
            println!("         - {warning}");
        }
    }
    println!();

    // ── Persist ────────────────────────────────────────────────
    println!("  [3/3] Writing report...");
    report.persist(&output)?;
    println!("        {}", output.display());
    println!();

    println!("  Totals:");
    println!(
        "   FLOPs:            {} ({} nodes unknown)",
        human_flops(report.total_flops()),
        report.unknown_flops_nodes(),
    );
    println!("   Params:           {}", report.total_params());
    println!("   Prunable params:  {}", report.total_prunable_params());
    println!("   Sparsity:         {:.2}%", report.sparsity() * 100.0);
    println!();
    Ok(())
}
