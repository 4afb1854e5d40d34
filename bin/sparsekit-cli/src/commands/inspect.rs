// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! `sparsekit inspect` command: display per-operator and per-node costs.
//!
//! Works on a live model (analyzed on the spot) or on a persisted report;
//! both print the same tables.

use super::{human_flops, truncate};
use model_analyzer::{AnalyzerConfig, ModelAnalyzer, ModelRecord};
use std::path::PathBuf;

pub fn execute(
    config: AnalyzerConfig,
    model: Option<PathBuf>,
    report: Option<PathBuf>,
) -> anyhow::Result<()> {
    println!("╔══════════════════════════════════════════════════════╗");
    println!("║              sparsekit · Model Inspector             ║");
    println!("╚══════════════════════════════════════════════════════╝");
    println!();

    let (source, record) = match (model, report) {
        (Some(model), _) => {
            let record = ModelAnalyzer::new(config).analyze_file(&model).map_err(|e| {
                anyhow::anyhow!("failed to analyze '{}': {e}", model.display())
            })?;
            (model, record)
        }
        (None, Some(report)) => {
            let record = ModelRecord::load(&report)?;
            (report, record)
        }
        (None, None) => anyhow::bail!("either --model or --report is required"),
    };

    // ── Summary ────────────────────────────────────────────────
    println!("  Source:          {}", source.display());
    println!("  Nodes:           {}", record.len());
    println!(
        "  FLOPs:           {} ({} nodes unknown)",
        human_flops(record.total_flops()),
        record.unknown_flops_nodes(),
    );
    println!("  Params:          {}", record.total_params());
    println!(
        "  Prunable:        {} ({} zero, {:.2}% sparse)",
        record.total_prunable_params(),
        record.total_prunable_params_zeroed(),
        record.sparsity() * 100.0,
    );
    println!();

    // ── Per-Operator Breakdown ─────────────────────────────────
    println!(
        "  {:<22} {:>6} {:>12} {:>12} {:>12} {:>8}",
        "Op", "Count", "FLOPs", "Params", "Prunable", "Zero %",
    );
    println!("  {}", "-".repeat(78));
    for (op, totals) in record.op_breakdown() {
        let zero_pct = if totals.prunable_params == 0 {
            0.0
        } else {
            totals.prunable_params_zeroed as f64 / totals.prunable_params as f64 * 100.0
        };
        let flops = if totals.unknown_flops > 0 {
            format!("{}+?", human_flops(totals.flops))
        } else {
            human_flops(totals.flops)
        };
        println!(
            "  {:<22} {:>6} {:>12} {:>12} {:>12} {:>7.2}%",
            truncate(&op, 22),
            totals.count,
            flops,
            totals.params,
            totals.prunable_params,
            zero_pct,
        );
    }
    println!();

    // ── Per-Node Detail ────────────────────────────────────────
    println!(
        "  {:<4} {:<30} {:<18} {:>12} {:>10} {:>8}",
        "Idx", "Id", "Op", "FLOPs", "Params", "Sparse",
    );
    println!("  {}", "-".repeat(88));
    for (idx, node) in record.nodes().iter().enumerate() {
        let flops = match node.flops.known() {
            Some(flops) => human_flops(flops),
            None => "?".to_string(),
        };
        let sparse = if node.prunable {
            format!("{:.1}%", node.sparsity() * 100.0)
        } else {
            "-".to_string()
        };
        println!(
            "  {:<4} {:<30} {:<18} {:>12} {:>10} {:>8}",
            idx,
            truncate(&node.id_, 30),
            truncate(&node.op_type, 18),
            flops,
            node.params,
            sparse,
        );
    }
    println!();
    Ok(())
}
