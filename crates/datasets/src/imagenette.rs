// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Imagenette and Imagewoof: the 10-class ImageNet subsets published by
//! fast.ai (<https://github.com/fastai/imagenette>).
//!
//! Both share archive naming and layout, so they are one type with a
//! variant marker:
//!
//! ```text
//! ImagenetteDataset = FastaiImages<Imagenette>   (key "imagenette")
//! ImagewoofDataset  = FastaiImages<Imagewoof>    (key "imagewoof")
//! ```

use crate::folder::{ImageFolder, Split};
use crate::source::DatasetSource;
use crate::{Dataset, DatasetError, DatasetOptions};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::marker::PhantomData;
use std::str::FromStr;

/// Per-channel RGB means of ImageNet.
pub const IMAGENET_RGB_MEANS: [f32; 3] = [0.485, 0.456, 0.406];
/// Per-channel RGB standard deviations of ImageNet.
pub const IMAGENET_RGB_STDS: [f32; 3] = [0.229, 0.224, 0.225];

const ARCHIVE_BASE: &str = "https://s3.amazonaws.com/fast-ai-imageclas";

// ── Size ───────────────────────────────────────────────────────

/// Published resolution of the archive (shortest image side).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImagenetteSize {
    S160,
    #[default]
    S320,
    Full,
}

impl ImagenetteSize {
    /// Default output image size for this archive.
    pub fn image_size(self) -> u32 {
        match self {
            ImagenetteSize::S160 => 160,
            ImagenetteSize::S320 => 320,
            ImagenetteSize::Full => 224,
        }
    }

    fn archive_suffix(self) -> &'static str {
        match self {
            ImagenetteSize::S160 => "-160",
            ImagenetteSize::S320 => "-320",
            ImagenetteSize::Full => "",
        }
    }
}

impl fmt::Display for ImagenetteSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(match self {
            ImagenetteSize::S160 => "s160",
            ImagenetteSize::S320 => "s320",
            ImagenetteSize::Full => "full",
        })
    }
}

impl FromStr for ImagenetteSize {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "s160" | "160" => Ok(ImagenetteSize::S160),
            "s320" | "320" => Ok(ImagenetteSize::S320),
            "full" => Ok(ImagenetteSize::Full),
            other => Err(format!("unknown imagenette size '{other}' (s160, s320, full)")),
        }
    }
}

// ── Variants ───────────────────────────────────────────────────

/// Marker trait for the fast.ai subset variants.
pub trait FastaiVariant: Send + Sync + fmt::Debug + 'static {
    /// Registry key.
    const KEY: &'static str;
    /// Archive stem, e.g. `imagenette2`.
    const STEM: &'static str;
}

/// Ten easily classified ImageNet classes.
#[derive(Debug, Clone, Copy)]
pub struct Imagenette;

/// Ten dog breeds; harder to classify.
#[derive(Debug, Clone, Copy)]
pub struct Imagewoof;

impl FastaiVariant for Imagenette {
    const KEY: &'static str = "imagenette";
    const STEM: &'static str = "imagenette2";
}

impl FastaiVariant for Imagewoof {
    const KEY: &'static str = "imagewoof";
    const STEM: &'static str = "imagewoof2";
}

/// Number of classes in either subset.
pub const NUM_CLASSES: usize = 10;

// ── Dataset ────────────────────────────────────────────────────

/// A locally extracted fast.ai subset: where it comes from plus its images.
#[derive(Debug, Clone)]
pub struct FastaiImages<V: FastaiVariant> {
    source: DatasetSource,
    folder: ImageFolder,
    size: ImagenetteSize,
    _variant: PhantomData<V>,
}

pub type ImagenetteDataset = FastaiImages<Imagenette>;
pub type ImagewoofDataset = FastaiImages<Imagewoof>;

impl<V: FastaiVariant> FastaiImages<V> {
    /// The archive for a given size.
    pub fn source(size: ImagenetteSize) -> DatasetSource {
        let name = format!("{}{}", V::STEM, size.archive_suffix());
        let url = format!("{ARCHIVE_BASE}/{name}.tgz");
        DatasetSource::new(name, url)
    }

    /// Locates the extracted archive under `options.root` and scans the
    /// requested split.
    pub fn open(options: &DatasetOptions) -> Result<Self, DatasetError> {
        let size = options.size;
        let source = Self::source(size);
        let extracted = source.ensure_local(&options.root)?;
        let image_size = options.image_size.unwrap_or_else(|| size.image_size());
        let folder = ImageFolder::open(&extracted, Split::from_train(options.train), image_size)?;

        if folder.classes().len() != NUM_CLASSES {
            tracing::warn!(
                "{} at {}: expected {} classes, found {}",
                V::KEY,
                extracted.display(),
                NUM_CLASSES,
                folder.classes().len()
            );
        }

        Ok(Self {
            source,
            folder,
            size,
            _variant: PhantomData,
        })
    }

    pub fn dataset_source(&self) -> &DatasetSource {
        &self.source
    }

    pub fn size(&self) -> ImagenetteSize {
        self.size
    }
}

impl<V: FastaiVariant> Dataset for FastaiImages<V> {
    fn name(&self) -> &str {
        V::KEY
    }

    fn folder(&self) -> &ImageFolder {
        &self.folder
    }
}
