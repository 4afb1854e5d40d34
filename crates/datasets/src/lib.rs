// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! # datasets
//!
//! Image classification datasets read from disk, looked up by key.
//!
//! - [`DatasetRegistry`]: key → factory, populated by explicit calls.
//! - [`DatasetSource`]: where an archived dataset is extracted locally.
//! - [`ImageFolder`]: `<root>/<split>/<class>/<image>` iteration.
//! - [`ImagenetteDataset`] / [`ImagewoofDataset`]: a source plus a folder.
//!
//! Downloading, decoding and augmenting images are left to the caller.

mod error;
pub mod folder;
pub mod imagenette;
mod registry;
mod source;

pub use error::DatasetError;
pub use folder::{ImageFolder, Sample, Split};
pub use imagenette::{ImagenetteDataset, ImagenetteSize, ImagewoofDataset};
pub use registry::{DatasetAttributes, DatasetOptions, DatasetRegistry, DEFAULT_IMAGE_SIZE};
pub use source::DatasetSource;

/// A classification dataset backed by an [`ImageFolder`].
pub trait Dataset: Send + Sync + std::fmt::Debug {
    /// Registry key of the dataset kind.
    fn name(&self) -> &str;

    fn folder(&self) -> &ImageFolder;

    fn len(&self) -> usize {
        self.folder().len()
    }

    fn is_empty(&self) -> bool {
        self.folder().is_empty()
    }

    fn get(&self, index: usize) -> Option<&Sample> {
        self.folder().get(index)
    }

    fn classes(&self) -> &[String] {
        self.folder().classes()
    }

    fn image_size(&self) -> u32 {
        self.folder().image_size()
    }
}
