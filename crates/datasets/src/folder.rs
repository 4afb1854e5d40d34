// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Image classification datasets laid out as directories.
//!
//! ```text
//! <root>/
//!   train/
//!     <class_a>/img0.jpg ...
//!     <class_b>/...
//!   val/
//!     <class_a>/...
//! ```
//!
//! Class indices follow the sorted class directory names; samples are
//! ordered by class, then by file name.

use crate::{Dataset, DatasetError};
use std::fs;
use std::path::{Path, PathBuf};

/// File extensions treated as images (compared case-insensitively).
pub const IMAGE_EXTENSIONS: &[&str] = &[
    "bmp", "jpeg", "jpg", "pgm", "png", "ppm", "tif", "tiff", "webp",
];

/// One labelled image on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sample {
    pub path: PathBuf,
    pub label: usize,
}

/// Which split of a dataset to read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Split {
    Train,
    Val,
}

impl Split {
    pub fn from_train(train: bool) -> Self {
        if train {
            Split::Train
        } else {
            Split::Val
        }
    }

    pub fn dir_name(self) -> &'static str {
        match self {
            Split::Train => "train",
            Split::Val => "val",
        }
    }
}

#[derive(Debug, Clone)]
pub struct ImageFolder {
    split_root: PathBuf,
    classes: Vec<String>,
    samples: Vec<Sample>,
    image_size: u32,
}

impl ImageFolder {
    /// Scans `<root>/<split>/` for class directories and their images.
    pub fn open(root: &Path, split: Split, image_size: u32) -> Result<Self, DatasetError> {
        let split_root = root.join(split.dir_name());
        if !split_root.is_dir() {
            return Err(DatasetError::Layout {
                path: root.to_path_buf(),
                detail: format!("missing '{}' directory", split.dir_name()),
            });
        }

        let mut classes = Vec::new();
        for entry in read_dir(&split_root)? {
            if entry.is_dir() {
                if let Some(name) = entry.file_name().and_then(|n| n.to_str()) {
                    classes.push(name.to_string());
                }
            }
        }
        classes.sort();
        if classes.is_empty() {
            return Err(DatasetError::Layout {
                path: split_root,
                detail: "no class directories".into(),
            });
        }

        let mut samples = Vec::new();
        for (label, class) in classes.iter().enumerate() {
            let mut images: Vec<PathBuf> = read_dir(&split_root.join(class))?
                .into_iter()
                .filter(|p| p.is_file() && is_image(p))
                .collect();
            images.sort();
            samples.extend(images.into_iter().map(|path| Sample { path, label }));
        }

        tracing::info!(
            "opened {}: {} images in {} classes",
            split_root.display(),
            samples.len(),
            classes.len()
        );

        Ok(Self {
            split_root,
            classes,
            samples,
            image_size,
        })
    }

    /// The split directory that was scanned.
    pub fn split_root(&self) -> &Path {
        &self.split_root
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Sample> {
        self.samples.get(index)
    }

    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    pub fn class_index(&self, name: &str) -> Option<usize> {
        self.classes.binary_search_by(|c| c.as_str().cmp(name)).ok()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Sample> {
        self.samples.iter()
    }

    pub fn image_size(&self) -> u32 {
        self.image_size
    }
}

impl<'a> IntoIterator for &'a ImageFolder {
    type Item = &'a Sample;
    type IntoIter = std::slice::Iter<'a, Sample>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl Dataset for ImageFolder {
    fn name(&self) -> &str {
        "imagefolder"
    }

    fn folder(&self) -> &ImageFolder {
        self
    }
}

fn is_image(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| IMAGE_EXTENSIONS.iter().any(|x| x.eq_ignore_ascii_case(e)))
        .unwrap_or(false)
}

fn read_dir(dir: &Path) -> Result<Vec<PathBuf>, DatasetError> {
    let io_err = |source| DatasetError::Io {
        path: dir.to_path_buf(),
        source,
    };
    fs::read_dir(dir)
        .map_err(io_err)?
        .map(|entry| entry.map(|e| e.path()).map_err(io_err))
        .collect()
}
