// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Graph loading from ONNX files.
//!
//! The file is memory-mapped and decoded in one pass by `prost`; the mapping
//! is dropped before this function returns, so the file handle is released on
//! every exit path. Initializer buffers are owned by the decoded message and
//! moved into the graph without further copies.

use crate::graph::{LoadOptions, Validated};
use crate::proto::ModelProto;
use crate::{GraphLoadError, ModelGraph};
use std::path::Path;

/// Loads ONNX models into a validated [`ModelGraph`].
///
/// # Example
/// ```no_run
/// use model_ir::GraphLoader;
/// use std::path::Path;
///
/// let graph = GraphLoader::load(Path::new("./models/resnet18.onnx")).unwrap();
/// println!("{}", graph.summary());
/// ```
pub struct GraphLoader;

impl GraphLoader {
    /// Loads and validates a model file with default options.
    pub fn load(path: &Path) -> Result<ModelGraph<Validated>, GraphLoadError> {
        Self::load_with(path, &LoadOptions::default())
    }

    /// Loads and validates a model file.
    ///
    /// Steps:
    /// 1. Open and memory-map the file.
    /// 2. Decode the `ModelProto`.
    /// 3. Build the graph (initializers, shape table) and validate it.
    pub fn load_with(
        path: &Path,
        options: &LoadOptions,
    ) -> Result<ModelGraph<Validated>, GraphLoadError> {
        let io_err = |source| GraphLoadError::Io {
            path: path.to_path_buf(),
            source,
        };

        let model = {
            let file = std::fs::File::open(path).map_err(io_err)?;
            // SAFETY: the mapping is read-only and lives only for the decode
            // below; the decoded message owns copies of every buffer.
            let mmap = unsafe { memmap2::Mmap::map(&file) }.map_err(io_err)?;
            ModelProto::from_bytes(&mmap)?
        };

        tracing::info!(
            "loaded '{}' (producer '{}', ir_version {})",
            path.display(),
            model.producer_name,
            model.ir_version,
        );
        Self::from_proto(model, options)
    }

    /// Decodes and validates a model from in-memory protobuf bytes.
    pub fn from_bytes(
        bytes: &[u8],
        options: &LoadOptions,
    ) -> Result<ModelGraph<Validated>, GraphLoadError> {
        Self::from_proto(ModelProto::from_bytes(bytes)?, options)
    }

    /// Builds and validates a graph from an already decoded model.
    pub fn from_proto(
        model: ModelProto,
        options: &LoadOptions,
    ) -> Result<ModelGraph<Validated>, GraphLoadError> {
        ModelGraph::from_proto(model, options)?.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::proto::tensor_shape_proto::Dimension;
    use crate::proto::{GraphProto, NodeProto, TensorProto, ValueInfoProto};
    use prost::Message;
    use std::io::Write;

    fn relu_model() -> ModelProto {
        ModelProto {
            ir_version: 8,
            producer_name: "unit".into(),
            graph: Some(GraphProto {
                name: "relu".into(),
                node: vec![NodeProto {
                    input: vec!["x".into()],
                    output: vec!["y".into()],
                    op_type: "Relu".into(),
                    ..Default::default()
                }],
                input: vec![ValueInfoProto::tensor(
                    "x",
                    1,
                    vec![Dimension::fixed(1), Dimension::fixed(4)],
                )],
                ..Default::default()
            }),
            ..Default::default()
        }
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(&relu_model().encode_to_vec()).unwrap();

        let graph = GraphLoader::load(file.path()).unwrap();
        assert_eq!(graph.name, "relu");
        assert_eq!(graph.num_nodes(), 1);
        assert_eq!(graph.shape_of("y").map(|s| s.dims().to_vec()), Some(vec![1, 4]));
    }

    #[test]
    fn test_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let result = GraphLoader::load(&dir.path().join("absent.onnx"));
        assert!(matches!(result, Err(GraphLoadError::Io { .. })));
    }

    #[test]
    fn test_undecodable_bytes() {
        let result = GraphLoader::from_bytes(b"\xff\xff\xff\xff", &LoadOptions::default());
        assert!(matches!(result, Err(GraphLoadError::Decode(_))));
    }

    #[test]
    fn test_from_bytes_empty_message_has_no_graph() {
        let result = GraphLoader::from_bytes(&[], &LoadOptions::default());
        assert!(matches!(result, Err(GraphLoadError::MissingGraph)));
    }

    #[test]
    fn test_invalid_initializer_propagates() {
        let mut model = relu_model();
        if let Some(graph) = model.graph.as_mut() {
            graph.initializer.push(TensorProto {
                name: "bad".into(),
                dims: vec![-3],
                data_type: 1,
                ..Default::default()
            });
        }
        let result = GraphLoader::from_proto(model, &LoadOptions::default());
        assert!(matches!(result, Err(GraphLoadError::InvalidInitializer { .. })));
    }
}
