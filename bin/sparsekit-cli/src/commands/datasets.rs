// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! `sparsekit datasets` command: list registered datasets.
//!
//! For the archived datasets every published size is checked under
//! `<root>/<key>/`; missing ones show the archive to fetch.

use datasets::{DatasetRegistry, DatasetSource, ImagenetteDataset, ImagenetteSize, ImagewoofDataset};
use std::path::PathBuf;

const SIZES: [ImagenetteSize; 3] = [ImagenetteSize::S160, ImagenetteSize::S320, ImagenetteSize::Full];

pub fn execute(root: PathBuf) -> anyhow::Result<()> {
    println!("╔══════════════════════════════════════════════════════╗");
    println!("║              sparsekit · Dataset Registry            ║");
    println!("╚══════════════════════════════════════════════════════╝");
    println!();

    let registry = DatasetRegistry::with_defaults();
    println!("  Root: {}", root.display());
    println!();

    for key in registry.keys() {
        let attrs = registry.attributes(key)?;
        println!("  {key}");
        if let Some(n) = attrs.num_classes {
            println!("   Classes:   {n}");
        }
        if let (Some(means), Some(stds)) = (attrs.transform_means, attrs.transform_stds) {
            println!("   Means:     {means:?}");
            println!("   Stds:      {stds:?}");
        }

        let sources: Vec<(ImagenetteSize, DatasetSource)> = match key {
            "imagenette" => SIZES.iter().map(|&s| (s, ImagenetteDataset::source(s))).collect(),
            "imagewoof" => SIZES.iter().map(|&s| (s, ImagewoofDataset::source(s))).collect(),
            _ => Vec::new(),
        };
        let dataset_root = root.join(key);
        for (size, source) in sources {
            match source.ensure_local(&dataset_root) {
                Ok(path) => println!("   {:<5}      available at {}", size, path.display()),
                Err(_) => println!("   {:<5}      missing, fetch {}", size, source.archive_url()),
            }
        }
        println!();
    }
    Ok(())
}
