//! # topo-sim
//!
//! In-memory simulation registry.
//!
//! This crate provides a [`Simulation`] implementing the kernel's
//! [`Runtime`] contract: a single namespace of registered sheets and
//! connections, plus an append-only log of what was registered when.
//!
//! It performs no numerical simulation. It exists so models can be
//! instantiated, inspected and tested without an external engine.
//!
//! ## Data model
//!
//! ```text
//! register(name, sheet)        → objects[name] = Sheet
//! connect(src, dest, kind, p)  → objects["dest.name"] = Projection
//!                  ↓
//!             events (log)
//! ```

use indexmap::IndexMap;
use serde::Serialize;
use topo_kernel::{
    Handle, ObjectKind, Parameters, ProjectionKind, Runtime, RuntimeError, SheetObject,
    value_text,
};

/// A connection as stored in the registry.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Connection {
    pub src: String,
    pub dest: String,
    pub kind: ProjectionKind,
    pub parameters: Parameters,
}

/// One live object.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "object", rename_all = "snake_case")]
pub enum SimObject {
    Sheet(SheetObject),
    Projection(Connection),
}

impl SimObject {
    pub fn kind(&self) -> ObjectKind {
        match self {
            SimObject::Sheet(sheet) => ObjectKind::Sheet(sheet.kind),
            SimObject::Projection(conn) => ObjectKind::Projection(conn.kind),
        }
    }
}

/// Registry log entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum SimEvent {
    Registered { name: String, replaced: bool },
    Connected {
        name: String,
        src: String,
        dest: String,
        replaced: bool,
    },
}

impl SimEvent {
    pub fn name(&self) -> &str {
        match self {
            SimEvent::Registered { name, .. } | SimEvent::Connected { name, .. } => name,
        }
    }
}

/// Canonical in-memory runtime namespace.
#[derive(Debug, Clone, Default)]
pub struct Simulation {
    objects: IndexMap<String, SimObject>,
    events: Vec<SimEvent>,
}

impl Simulation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    pub fn object(&self, name: &str) -> Option<&SimObject> {
        self.objects.get(name)
    }

    /// Registered sheets in registration order.
    pub fn sheets(&self) -> impl Iterator<Item = (&str, &SheetObject)> {
        self.objects.iter().filter_map(|(name, obj)| match obj {
            SimObject::Sheet(sheet) => Some((name.as_str(), sheet)),
            SimObject::Projection(_) => None,
        })
    }

    /// Registered connections in registration order.
    pub fn projections(&self) -> impl Iterator<Item = (&str, &Connection)> {
        self.objects.iter().filter_map(|(name, obj)| match obj {
            SimObject::Projection(conn) => Some((name.as_str(), conn)),
            SimObject::Sheet(_) => None,
        })
    }

    /// Connections arriving at `dest`.
    pub fn projections_into<'a>(
        &'a self,
        dest: &'a str,
    ) -> impl Iterator<Item = (&'a str, &'a Connection)> {
        self.projections().filter(move |(_, conn)| conn.dest == dest)
    }

    pub fn events(&self) -> &[SimEvent] {
        &self.events
    }

    /// How many times `name` was registered or connected.
    pub fn registration_count(&self, name: &str) -> usize {
        self.events.iter().filter(|e| e.name() == name).count()
    }

    fn is_sheet(&self, name: &str) -> bool {
        matches!(self.objects.get(name), Some(SimObject::Sheet(_)))
    }
}

impl Runtime for Simulation {
    fn register(&mut self, name: &str, object: SheetObject) -> Result<Handle, RuntimeError> {
        if name.is_empty() {
            return Err(RuntimeError::Rejected {
                name: name.to_string(),
                reason: "sheet name must not be empty".to_string(),
            });
        }
        if matches!(self.objects.get(name), Some(SimObject::Projection(_))) {
            return Err(RuntimeError::Rejected {
                name: name.to_string(),
                reason: "name is taken by a projection".to_string(),
            });
        }
        let kind = object.kind;
        let replaced = self
            .objects
            .insert(name.to_string(), SimObject::Sheet(object))
            .is_some();
        if replaced {
            tracing::warn!(sheet = name, "replacing existing sheet");
        }
        self.events.push(SimEvent::Registered {
            name: name.to_string(),
            replaced,
        });
        Ok(Handle::new(name, kind))
    }

    fn lookup(&self, name: &str) -> Option<Handle> {
        self.objects.get(name).map(|obj| Handle {
            name: name.to_string(),
            kind: obj.kind(),
        })
    }

    fn connect(
        &mut self,
        src: &str,
        dest: &str,
        kind: ProjectionKind,
        parameters: &Parameters,
    ) -> Result<Handle, RuntimeError> {
        for endpoint in [src, dest] {
            if !self.is_sheet(endpoint) {
                return Err(RuntimeError::UnknownSheet(endpoint.to_string()));
            }
        }
        let projection = parameters
            .get("name")
            .map(value_text)
            .filter(|name| !name.is_empty())
            .ok_or_else(|| RuntimeError::Rejected {
                name: format!("{src}->{dest}"),
                reason: "projection requires a `name` parameter".to_string(),
            })?;
        let name = format!("{dest}.{projection}");
        let connection = Connection {
            src: src.to_string(),
            dest: dest.to_string(),
            kind,
            parameters: parameters.clone(),
        };
        let replaced = self
            .objects
            .insert(name.clone(), SimObject::Projection(connection))
            .is_some();
        if replaced {
            tracing::warn!(projection = %name, "replacing existing projection");
        }
        self.events.push(SimEvent::Connected {
            name: name.clone(),
            src: src.to_string(),
            dest: dest.to_string(),
            replaced,
        });
        Ok(Handle::new(name, kind))
    }
}
