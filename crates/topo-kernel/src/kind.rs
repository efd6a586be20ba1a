//! Closed catalogue of sheet and projection types.
//!
//! Every object a model can build is one of these kinds. Each kind exposes
//! its type name and its default parameters; specifications start from
//! those defaults.

use crate::error::TopoError;
use crate::value::Parameters;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::fmt;
use std::str::FromStr;

/// Capability contract of a buildable type.
pub trait ObjectType {
    fn type_name(&self) -> &'static str;

    /// Parameter name → default value, in declaration order.
    fn default_parameters(&self) -> Parameters;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SheetKind {
    /// Presents input patterns; the usual retina/photoreceptor sheet.
    GeneratorSheet,
    /// Sheet with connection fields.
    CFSheet,
    /// CFSheet that settles over several steps per input presentation.
    SettlingCFSheet,
    /// SettlingCFSheet normalising afferent weights jointly.
    JointNormalizingCFSheet,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProjectionKind {
    CFProjection,
    SharedWeightCFProjection,
    OneToOneProjection,
}

impl SheetKind {
    pub const ALL: [SheetKind; 4] = [
        SheetKind::GeneratorSheet,
        SheetKind::CFSheet,
        SheetKind::SettlingCFSheet,
        SheetKind::JointNormalizingCFSheet,
    ];
}

impl ProjectionKind {
    pub const ALL: [ProjectionKind; 3] = [
        ProjectionKind::CFProjection,
        ProjectionKind::SharedWeightCFProjection,
        ProjectionKind::OneToOneProjection,
    ];
}

fn params(entries: &[(&str, Value)]) -> Parameters {
    entries
        .iter()
        .map(|(name, value)| (name.to_string(), value.clone()))
        .collect()
}

impl ObjectType for SheetKind {
    fn type_name(&self) -> &'static str {
        match self {
            SheetKind::GeneratorSheet => "GeneratorSheet",
            SheetKind::CFSheet => "CFSheet",
            SheetKind::SettlingCFSheet => "SettlingCFSheet",
            SheetKind::JointNormalizingCFSheet => "JointNormalizingCFSheet",
        }
    }

    fn default_parameters(&self) -> Parameters {
        let mut defaults = params(&[
            ("name", json!(self.type_name())),
            ("nominal_density", json!(10)),
            ("nominal_bounds", json!([-0.5, -0.5, 0.5, 0.5])),
            ("output_fns", json!([])),
        ]);
        match self {
            SheetKind::GeneratorSheet => {
                defaults.extend(params(&[
                    ("period", json!(1.0)),
                    ("phase", json!(0.05)),
                    ("input_generator", Value::Null),
                ]));
            }
            SheetKind::CFSheet => {
                defaults.insert("plastic".into(), json!(true));
            }
            SheetKind::SettlingCFSheet | SheetKind::JointNormalizingCFSheet => {
                defaults.extend(params(&[
                    ("plastic", json!(true)),
                    ("tsettle", json!(8)),
                    ("continuous_learning", json!(false)),
                ]));
            }
        }
        if *self == SheetKind::JointNormalizingCFSheet {
            defaults.insert("joint_norm_fn".into(), json!("compute_joint_norm_totals"));
        }
        defaults
    }
}

impl ObjectType for ProjectionKind {
    fn type_name(&self) -> &'static str {
        match self {
            ProjectionKind::CFProjection => "CFProjection",
            ProjectionKind::SharedWeightCFProjection => "SharedWeightCFProjection",
            ProjectionKind::OneToOneProjection => "OneToOneProjection",
        }
    }

    fn default_parameters(&self) -> Parameters {
        let mut defaults = params(&[
            ("name", json!(self.type_name())),
            ("src", Value::Null),
            ("dest", Value::Null),
            ("src_port", json!("Activity")),
            ("dest_port", json!("Activity")),
            ("delay", json!(0.05)),
            ("strength", json!(1.0)),
        ]);
        match self {
            ProjectionKind::CFProjection => {
                defaults.extend(params(&[
                    ("nominal_bounds_template", json!([-0.25, -0.25, 0.25, 0.25])),
                    ("weights_generator", json!("Constant")),
                    ("learning_rate", json!(0.0)),
                ]));
            }
            ProjectionKind::SharedWeightCFProjection => {
                defaults.extend(params(&[
                    ("nominal_bounds_template", json!([-0.25, -0.25, 0.25, 0.25])),
                    ("weights_generator", json!("Constant")),
                ]));
            }
            ProjectionKind::OneToOneProjection => {}
        }
        defaults
    }
}

/// Any buildable kind, tagged with its capability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "capability", content = "kind", rename_all = "snake_case")]
pub enum ObjectKind {
    Sheet(SheetKind),
    Projection(ProjectionKind),
}

impl ObjectKind {
    /// Every kind in the catalogue, sheets first.
    pub fn all() -> impl Iterator<Item = ObjectKind> {
        SheetKind::ALL
            .into_iter()
            .map(ObjectKind::Sheet)
            .chain(ProjectionKind::ALL.into_iter().map(ObjectKind::Projection))
    }

    pub fn is_sheet(&self) -> bool {
        matches!(self, ObjectKind::Sheet(_))
    }

    pub fn is_projection(&self) -> bool {
        matches!(self, ObjectKind::Projection(_))
    }
}

impl ObjectType for ObjectKind {
    fn type_name(&self) -> &'static str {
        match self {
            ObjectKind::Sheet(kind) => kind.type_name(),
            ObjectKind::Projection(kind) => kind.type_name(),
        }
    }

    fn default_parameters(&self) -> Parameters {
        match self {
            ObjectKind::Sheet(kind) => kind.default_parameters(),
            ObjectKind::Projection(kind) => kind.default_parameters(),
        }
    }
}

impl From<SheetKind> for ObjectKind {
    fn from(kind: SheetKind) -> Self {
        ObjectKind::Sheet(kind)
    }
}

impl From<ProjectionKind> for ObjectKind {
    fn from(kind: ProjectionKind) -> Self {
        ObjectKind::Projection(kind)
    }
}

impl FromStr for ObjectKind {
    type Err = TopoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ObjectKind::all()
            .find(|kind| kind.type_name() == s)
            .ok_or_else(|| TopoError::UnknownObjectType(s.to_string()))
    }
}

impl FromStr for SheetKind {
    type Err = TopoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.parse::<ObjectKind>()? {
            ObjectKind::Sheet(kind) => Ok(kind),
            ObjectKind::Projection(_) => Err(TopoError::InvalidConfiguration(format!(
                "`{s}` is a projection type, not a sheet type"
            ))),
        }
    }
}

impl FromStr for ProjectionKind {
    type Err = TopoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.parse::<ObjectKind>()? {
            ObjectKind::Projection(kind) => Ok(kind),
            ObjectKind::Sheet(_) => Err(TopoError::InvalidConfiguration(format!(
                "`{s}` is a sheet type, not a projection type"
            ))),
        }
    }
}

impl fmt::Display for SheetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.type_name())
    }
}

impl fmt::Display for ProjectionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.type_name())
    }
}

impl fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.type_name())
    }
}
