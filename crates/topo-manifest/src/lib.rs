//! # topo-manifest
//!
//! Declarative model manifests. A TOML manifest names the levels of a
//! model, the sheets at each level, and the projection families between
//! them; [`ManifestModel`] compiles it into a `topo_model::ModelDefinition`.
//!
//! Manifest values may carry placeholders resolved against the sheet or
//! projection being built (see [`template`]).

pub mod compile;
pub mod schema;
pub mod template;

pub use compile::ManifestModel;
pub use schema::{ArgManifest, LevelManifest, ModelManifest, ParameterSets, ProjectionManifest};
pub use template::{Scope, TemplateError};

use std::path::Path;
use thiserror::Error;
use topo_kernel::TopoError;

#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("failed to read file: {path}: {source}")]
    ReadFile {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid toml at {path}: {source}")]
    ParseToml {
        path: String,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid template at {at}: {source}")]
    Template {
        at: String,
        #[source]
        source: TemplateError,
    },

    #[error(transparent)]
    Kernel(#[from] TopoError),

    #[error("{0}")]
    Invalid(String),
}

impl ModelManifest {
    /// Parse manifest text. `origin` names the source in error messages.
    pub fn from_toml_str(text: &str, origin: &str) -> Result<Self, ManifestError> {
        toml::from_str(text).map_err(|source| ManifestError::ParseToml {
            path: origin.to_string(),
            source,
        })
    }

    pub fn load(path: &Path) -> Result<Self, ManifestError> {
        let text = std::fs::read_to_string(path).map_err(|source| ManifestError::ReadFile {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&text, &path.display().to_string())
    }
}

impl ManifestModel {
    /// Load and compile the manifest at `path`.
    pub fn from_path(path: &Path) -> Result<Self, ManifestError> {
        Self::compile(ModelManifest::load(path)?)
    }
}
