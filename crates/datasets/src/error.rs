// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Error types for dataset lookup and loading.

use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum DatasetError {
    /// No dataset is registered under the key.
    #[error("unknown dataset '{0}'")]
    UnknownKey(String),

    /// A key was registered twice.
    #[error("dataset '{0}' is already registered")]
    DuplicateKey(String),

    /// The extracted dataset directory does not exist under the root.
    #[error("dataset not found at '{path}'; download and extract {url}")]
    NotAvailable { path: PathBuf, url: String },

    /// The directory exists but does not follow `<split>/<class>/<image>`.
    #[error("malformed dataset layout at '{path}': {detail}")]
    Layout { path: PathBuf, detail: String },

    #[error("failed to read '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
