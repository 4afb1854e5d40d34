// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Local resolution of archived datasets.
//!
//! A [`DatasetSource`] knows the archive a dataset ships as and the
//! directory name that archive extracts to. Fetching and unpacking are left
//! to the user; the source only locates the result.

use crate::DatasetError;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatasetSource {
    name: String,
    url: String,
}

impl DatasetSource {
    /// `name` is the directory the archive at `url` extracts to.
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn archive_url(&self) -> &str {
        &self.url
    }

    /// Where the extracted dataset is expected under `root`.
    pub fn extracted_dir(&self, root: &Path) -> PathBuf {
        root.join(&self.name)
    }

    /// Returns the extracted dataset directory under `root`.
    ///
    /// `root` itself is accepted when it already is an extracted dataset
    /// (holds `train/` and `val/`).
    pub fn ensure_local(&self, root: &Path) -> Result<PathBuf, DatasetError> {
        let extracted = self.extracted_dir(root);
        if extracted.is_dir() {
            tracing::debug!("dataset '{}' found at {}", self.name, extracted.display());
            return Ok(extracted);
        }
        if root.join("train").is_dir() && root.join("val").is_dir() {
            tracing::debug!("dataset '{}' found at {}", self.name, root.display());
            return Ok(root.to_path_buf());
        }

        tracing::debug!(
            "dataset '{}' is not available locally (expected {})",
            self.name,
            extracted.display()
        );
        Err(DatasetError::NotAvailable {
            path: extracted,
            url: self.url.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn source() -> DatasetSource {
        DatasetSource::new("toy2", "https://example.org/toy2.tgz")
    }

    #[test]
    fn test_extracted_dir_found() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("toy2")).unwrap();
        assert_eq!(source().ensure_local(dir.path()).unwrap(), dir.path().join("toy2"));
    }

    #[test]
    fn test_root_is_already_extracted() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("train")).unwrap();
        std::fs::create_dir(dir.path().join("val")).unwrap();
        assert_eq!(source().ensure_local(dir.path()).unwrap(), dir.path());
    }

    #[test]
    fn test_missing_reports_url() {
        let dir = tempfile::tempdir().unwrap();
        let err = source().ensure_local(dir.path()).unwrap_err();
        match &err {
            DatasetError::NotAvailable { path, url } => {
                assert_eq!(path, &dir.path().join("toy2"));
                assert_eq!(url, "https://example.org/toy2.tgz");
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(err.to_string().contains("toy2.tgz"));
    }
}
