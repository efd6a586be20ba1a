//! Sheet and projection specifications.
//!
//! A specification is a template for a runtime object: a kind, a parameter
//! map seeded from that kind's defaults, and a canonical identity under
//! which the finished object is registered.

use crate::error::TopoError;
use crate::kind::{ObjectType, ProjectionKind, SheetKind};
use crate::runtime::{Handle, Runtime, SheetObject};
use crate::value::{Parameters, Properties, value_text};
use serde_json::Value;
use std::fmt;

/// Keys a projection receives structurally rather than as free parameters.
const STRUCTURAL_KEYS: [&str; 2] = ["src", "dest"];

pub trait Specification: fmt::Display {
    fn parameters(&self) -> &Parameters;

    fn parameters_mut(&mut self) -> &mut Parameters;

    /// Merge `patch` into the parameters. Later values win; keys absent from
    /// the patch are left alone.
    fn update_parameters<I>(&mut self, patch: I)
    where
        I: IntoIterator<Item = (String, Value)>,
        Self: Sized,
    {
        self.parameters_mut().extend(patch);
    }

    /// Name under which the runtime knows this object.
    fn identity(&self) -> String {
        self.to_string()
    }

    /// Look up the live object registered under [`Specification::identity`].
    fn resolve<R>(&self, runtime: &R) -> Result<Handle, TopoError>
    where
        R: Runtime + ?Sized,
        Self: Sized,
    {
        let identity = self.identity();
        runtime
            .lookup(&identity)
            .ok_or(TopoError::NotRegistered(identity))
    }
}

/// Template for a sheet.
#[derive(Debug, Clone, PartialEq)]
pub struct SheetSpec {
    pub sheet_type: SheetKind,
    properties: Properties,
    level: String,
    parameters: Parameters,
}

impl SheetSpec {
    /// Build a spec from arbitrary properties. Only canonical keys are kept
    /// (see [`crate::value::PROPERTY_ORDER`]); `level` is mandatory.
    pub fn new(sheet_type: SheetKind, properties: Properties) -> Result<Self, TopoError> {
        let level = properties.level().ok_or(TopoError::MissingLevel)?;
        Ok(Self {
            sheet_type,
            properties: properties.canonicalize(),
            level,
            parameters: sheet_type.default_parameters(),
        })
    }

    pub fn level(&self) -> &str {
        &self.level
    }

    pub fn properties(&self) -> &Properties {
        &self.properties
    }

    /// Build the sheet and register it under this spec's identity.
    pub fn instantiate<R: Runtime + ?Sized>(&self, runtime: &mut R) -> Result<Handle, TopoError> {
        let object = SheetObject {
            kind: self.sheet_type,
            parameters: self.parameters.clone(),
        };
        Ok(runtime.register(&self.identity(), object)?)
    }

    pub fn describe(&self) -> String {
        format!("SheetSpec({}, {})", self.sheet_type, self.properties)
    }
}

impl Specification for SheetSpec {
    fn parameters(&self) -> &Parameters {
        &self.parameters
    }

    fn parameters_mut(&mut self) -> &mut Parameters {
        &mut self.parameters
    }
}

impl fmt::Display for SheetSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.properties.identity())
    }
}

/// Template for a projection between two sheets.
///
/// Endpoints are held by identity, not owned: the sheets live in the
/// model's sheet tree.
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectionSpec {
    pub projection_type: ProjectionKind,
    src: String,
    dest: String,
    parameters: Parameters,
    matchname: Option<String>,
}

impl ProjectionSpec {
    pub fn new(projection_type: ProjectionKind, src: &SheetSpec, dest: &SheetSpec) -> Self {
        let mut parameters = projection_type.default_parameters();
        parameters.retain(|key, _| !STRUCTURAL_KEYS.contains(&key.as_str()));
        Self {
            projection_type,
            src: src.identity(),
            dest: dest.identity(),
            parameters,
            matchname: None,
        }
    }

    pub fn src(&self) -> &str {
        &self.src
    }

    pub fn dest(&self) -> &str {
        &self.dest
    }

    /// Text of the `name` parameter.
    pub fn name(&self) -> String {
        self.parameters
            .get("name")
            .map(value_text)
            .unwrap_or_default()
    }

    /// Record which match condition produced this projection.
    pub fn tag(&mut self, matchname: impl Into<String>) {
        self.matchname = Some(matchname.into());
    }

    pub fn matchname(&self) -> Option<&str> {
        self.matchname.as_deref()
    }

    /// Connect `src` to `dest` in the runtime with the stored parameters.
    pub fn instantiate<R: Runtime + ?Sized>(&self, runtime: &mut R) -> Result<Handle, TopoError> {
        Ok(runtime.connect(&self.src, &self.dest, self.projection_type, &self.parameters)?)
    }

    pub fn describe(&self) -> String {
        format!(
            "ProjectionSpec({}, {}, {})",
            self.projection_type, self.src, self.dest
        )
    }
}

impl Specification for ProjectionSpec {
    fn parameters(&self) -> &Parameters {
        &self.parameters
    }

    fn parameters_mut(&mut self) -> &mut Parameters {
        &mut self.parameters
    }
}

impl fmt::Display for ProjectionSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.dest, self.name())
    }
}
