// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Lookup of datasets by key.
//!
//! A [`DatasetRegistry`] is a plain value: callers build one, register the
//! datasets they want and pass it around. Nothing is registered implicitly.

use crate::folder::{ImageFolder, Split};
use crate::imagenette::{
    ImagenetteDataset, ImagenetteSize, ImagewoofDataset, IMAGENET_RGB_MEANS, IMAGENET_RGB_STDS,
    NUM_CLASSES,
};
use crate::{Dataset, DatasetError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

/// Image size used when neither the dataset nor the caller picks one.
pub const DEFAULT_IMAGE_SIZE: u32 = 224;

/// Arguments passed to a dataset factory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatasetOptions {
    /// Directory holding the dataset (or its extracted archive).
    pub root: PathBuf,
    /// Training split when true, validation split otherwise.
    pub train: bool,
    /// Archive resolution, for datasets published in several sizes.
    pub size: ImagenetteSize,
    /// Output image size; `None` picks the dataset's default.
    pub image_size: Option<u32>,
}

impl Default for DatasetOptions {
    fn default() -> Self {
        Self {
            root: PathBuf::from("datasets"),
            train: true,
            size: ImagenetteSize::default(),
            image_size: None,
        }
    }
}

/// Static facts about a registered dataset.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DatasetAttributes {
    pub num_classes: Option<usize>,
    pub transform_means: Option<[f32; 3]>,
    pub transform_stds: Option<[f32; 3]>,
}

impl DatasetAttributes {
    /// Attributes of an ImageNet-normalized classification dataset.
    pub fn imagenet_normalized(num_classes: usize) -> Self {
        Self {
            num_classes: Some(num_classes),
            transform_means: Some(IMAGENET_RGB_MEANS),
            transform_stds: Some(IMAGENET_RGB_STDS),
        }
    }
}

type Factory = dyn Fn(&DatasetOptions) -> Result<Box<dyn Dataset>, DatasetError> + Send + Sync;

#[derive(Clone)]
struct Entry {
    attributes: DatasetAttributes,
    factory: Arc<Factory>,
}

#[derive(Clone, Default)]
pub struct DatasetRegistry {
    entries: BTreeMap<String, Entry>,
}

impl DatasetRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry with `imagefolder`, `imagenette` and `imagewoof`.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        let imagenet = DatasetAttributes::imagenet_normalized(NUM_CLASSES);
        let registered = registry
            .register(&["imagefolder"], DatasetAttributes::default(), open_image_folder)
            .and_then(|_| registry.register(&["imagenette"], imagenet.clone(), open_imagenette))
            .and_then(|_| registry.register(&["imagewoof"], imagenet, open_imagewoof));
        if let Err(e) = registered {
            tracing::error!("default dataset registration failed: {e}");
        }
        registry
    }

    /// Registers `factory` under every key in `keys`.
    ///
    /// Fails without registering anything if any key is already taken.
    pub fn register<F>(
        &mut self,
        keys: &[&str],
        attributes: DatasetAttributes,
        factory: F,
    ) -> Result<(), DatasetError>
    where
        F: Fn(&DatasetOptions) -> Result<Box<dyn Dataset>, DatasetError> + Send + Sync + 'static,
    {
        if let Some(key) = keys.iter().find(|k| self.entries.contains_key(**k)) {
            return Err(DatasetError::DuplicateKey(key.to_string()));
        }
        let factory: Arc<Factory> = Arc::new(factory);
        for key in keys {
            tracing::debug!("registered dataset '{key}'");
            self.entries.insert(
                key.to_string(),
                Entry {
                    attributes: attributes.clone(),
                    factory: Arc::clone(&factory),
                },
            );
        }
        Ok(())
    }

    /// Builds the dataset registered under `key`.
    pub fn create(
        &self,
        key: &str,
        options: &DatasetOptions,
    ) -> Result<Box<dyn Dataset>, DatasetError> {
        let entry = self.entry(key)?;
        (entry.factory)(options)
    }

    pub fn attributes(&self, key: &str) -> Result<&DatasetAttributes, DatasetError> {
        Ok(&self.entry(key)?.attributes)
    }

    /// Registered keys in sorted order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    fn entry(&self, key: &str) -> Result<&Entry, DatasetError> {
        self.entries
            .get(key)
            .ok_or_else(|| DatasetError::UnknownKey(key.to_string()))
    }
}

fn open_image_folder(o: &DatasetOptions) -> Result<Box<dyn Dataset>, DatasetError> {
    let size = o.image_size.unwrap_or(DEFAULT_IMAGE_SIZE);
    Ok(Box::new(ImageFolder::open(&o.root, Split::from_train(o.train), size)?))
}

fn open_imagenette(o: &DatasetOptions) -> Result<Box<dyn Dataset>, DatasetError> {
    Ok(Box::new(ImagenetteDataset::open(o)?))
}

fn open_imagewoof(o: &DatasetOptions) -> Result<Box<dyn Dataset>, DatasetError> {
    Ok(Box::new(ImagewoofDataset::open(o)?))
}

impl fmt::Debug for DatasetRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DatasetRegistry")
            .field("keys", &self.keys().collect::<Vec<_>>())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::folder::tests::layout;

    #[test]
    fn test_default_keys() {
        let registry = DatasetRegistry::with_defaults();
        assert_eq!(
            registry.keys().collect::<Vec<_>>(),
            vec!["imagefolder", "imagenette", "imagewoof"]
        );
        let attrs = registry.attributes("imagenette").unwrap();
        assert_eq!(attrs.num_classes, Some(10));
        assert_eq!(attrs.transform_means, Some([0.485, 0.456, 0.406]));
        assert_eq!(attrs.transform_stds, Some([0.229, 0.224, 0.225]));
        assert_eq!(registry.attributes("imagefolder").unwrap().num_classes, None);
    }

    #[test]
    fn test_unknown_key() {
        let registry = DatasetRegistry::with_defaults();
        assert!(matches!(
            registry.create("cifar10", &DatasetOptions::default()),
            Err(DatasetError::UnknownKey(k)) if k == "cifar10"
        ));
        assert!(registry.attributes("cifar10").is_err());
    }

    #[test]
    fn test_register_aliases_and_duplicates() {
        let mut registry = DatasetRegistry::new();
        let folder = |o: &DatasetOptions| -> Result<Box<dyn Dataset>, DatasetError> {
            Ok(Box::new(ImageFolder::open(&o.root, Split::Train, 32)?))
        };
        registry
            .register(&["toy", "toy-v1"], DatasetAttributes::default(), folder)
            .unwrap();
        assert!(registry.contains("toy-v1"));

        let err = registry
            .register(&["other", "toy"], DatasetAttributes::default(), folder)
            .unwrap_err();
        assert!(matches!(err, DatasetError::DuplicateKey(k) if k == "toy"));
        assert!(!registry.contains("other"));
    }

    #[test]
    fn test_create_imagefolder() {
        let dir = tempfile::tempdir().unwrap();
        layout(
            dir.path(),
            &[("train", "cat", "1.png"), ("train", "dog", "2.png")],
        );
        let registry = DatasetRegistry::with_defaults();
        let options = DatasetOptions {
            root: dir.path().to_path_buf(),
            ..Default::default()
        };
        let ds = registry.create("imagefolder", &options).unwrap();
        assert_eq!(ds.name(), "imagefolder");
        assert_eq!(ds.len(), 2);
        assert_eq!(ds.classes(), ["cat", "dog"]);
        assert_eq!(ds.image_size(), DEFAULT_IMAGE_SIZE);
    }

    #[test]
    fn test_options_deserialize() {
        let options: DatasetOptions =
            serde_json::from_str(r#"{"root": "/data", "train": false, "size": "s160"}"#).unwrap();
        assert_eq!(options.root, PathBuf::from("/data"));
        assert!(!options.train);
        assert_eq!(options.size, ImagenetteSize::S160);
        assert_eq!(options.image_size, None);
    }
}
