//! The runtime registry contract.
//!
//! The kernel never simulates. It hands finished specifications to a
//! runtime through three operations and looks objects up by identity.

use crate::error::RuntimeError;
use crate::kind::{ObjectKind, ProjectionKind, SheetKind};
use crate::value::Parameters;
use serde::{Deserialize, Serialize};

/// Typed reference to an object living in a runtime.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Handle {
    pub name: String,
    pub kind: ObjectKind,
}

impl Handle {
    pub fn new(name: impl Into<String>, kind: impl Into<ObjectKind>) -> Self {
        Self {
            name: name.into(),
            kind: kind.into(),
        }
    }
}

/// A sheet ready to be registered: its type plus constructor parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SheetObject {
    pub kind: SheetKind,
    pub parameters: Parameters,
}

/// A simulation runtime's live-object namespace.
pub trait Runtime {
    /// Register a sheet under `name`.
    fn register(&mut self, name: &str, object: SheetObject) -> Result<Handle, RuntimeError>;

    /// Find a registered sheet or projection by name.
    ///
    /// Projections are named `dest.name`.
    fn lookup(&self, name: &str) -> Option<Handle>;

    /// Connect two registered sheets.
    fn connect(
        &mut self,
        src: &str,
        dest: &str,
        kind: ProjectionKind,
        parameters: &Parameters,
    ) -> Result<Handle, RuntimeError>;
}
