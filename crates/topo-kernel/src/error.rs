//! Error types for Topo kernel operations.

/// Errors raised while building or instantiating a topology.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TopoError {
    /// A sheet specification was built without a `level` property.
    #[error("sheet specification requires a `level` property")]
    MissingLevel,

    /// A level has sheets declared but no registered sheet rule.
    #[error("parameters for sheet level `{0}` not specified")]
    UnknownSheetLevel(String),

    /// Match conditions were requested for a level that has none.
    #[error("no match conditions defined for level `{0}`")]
    UnknownMatchLevel(String),

    /// A condition matched but no projection rule carries its name.
    #[error("no projection rule registered for match `{0}`")]
    UnknownProjectionRule(String),

    /// A projection's match name has no place in the connection order.
    #[error("projection `{projection}` has unranked match `{matchname}`")]
    UnrankedMatch {
        projection: String,
        matchname: String,
    },

    /// A model hook without a default was not implemented.
    #[error("model hook `{0}` must be implemented")]
    UnimplementedHook(&'static str),

    /// A kind name does not belong to the closed catalogue.
    #[error("unknown object type `{0}`")]
    UnknownObjectType(String),

    /// Any other malformed declaration.
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// `resolve()` was called before the object was registered.
    #[error("no object named `{0}` is registered in the runtime")]
    NotRegistered(String),

    /// Two specifications resolved to the same tree path.
    #[error("duplicate {tree} path `{path}`")]
    DuplicatePath { tree: &'static str, path: String },

    /// The runtime refused a registration or connection.
    #[error(transparent)]
    Runtime(#[from] RuntimeError),
}

/// Failures reported by a runtime registry.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RuntimeError {
    #[error("sheet `{0}` is not registered")]
    UnknownSheet(String),

    #[error("cannot register `{name}`: {reason}")]
    Rejected { name: String, reason: String },
}

/// Coarse classification of a [`TopoError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorClass {
    Configuration,
    Lookup,
    Construction,
    Runtime,
}

impl TopoError {
    pub fn class(&self) -> ErrorClass {
        match self {
            TopoError::MissingLevel
            | TopoError::UnknownSheetLevel(_)
            | TopoError::UnknownMatchLevel(_)
            | TopoError::UnknownProjectionRule(_)
            | TopoError::UnrankedMatch { .. }
            | TopoError::UnimplementedHook(_)
            | TopoError::UnknownObjectType(_)
            | TopoError::InvalidConfiguration(_) => ErrorClass::Configuration,
            TopoError::NotRegistered(_) => ErrorClass::Lookup,
            TopoError::DuplicatePath { .. } => ErrorClass::Construction,
            TopoError::Runtime(_) => ErrorClass::Runtime,
        }
    }
}
