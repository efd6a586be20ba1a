//! Serialisable topology plan.
//!
//! A plan is everything instantiation would register, in the order it would
//! register it, plus a SHA-256 digest over that content. Two models with
//! the same digest instantiate identically.

use crate::model::{Model, ModelDefinition};
use serde::Serialize;
use sha2::{Digest, Sha256};
use topo_kernel::{
    Parameters, ProjectionKind, Properties, SheetKind, Specification, TopoError,
};

pub const TOPOLOGY_PLAN_KIND: &str = "topo.topology_plan.v1";
pub const TOPOLOGY_PLAN_SCHEMA: u32 = 1;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SheetPlan {
    pub identity: String,
    pub level: String,
    pub sheet_type: SheetKind,
    pub properties: Properties,
    pub parameters: Parameters,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectionPlan {
    pub identity: String,
    pub matchname: String,
    pub projection_type: ProjectionKind,
    pub src: String,
    pub dest: String,
    pub parameters: Parameters,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TopologyPlan {
    pub schema: u32,
    pub plan_kind: String,
    pub model: String,
    pub sheets: Vec<SheetPlan>,
    pub projections: Vec<ProjectionPlan>,
    pub digest: String,
}

impl TopologyPlan {
    /// One line per registration: sheet identities, then `src->projection`.
    pub fn render_lines(&self) -> Vec<String> {
        self.sheets
            .iter()
            .map(|sheet| sheet.identity.clone())
            .chain(
                self.projections
                    .iter()
                    .map(|proj| format!("{}->{}", proj.src, proj.identity)),
            )
            .collect()
    }
}

impl<D: ModelDefinition> Model<D> {
    /// Describe what [`Model::instantiate`] would register.
    pub fn plan(&self) -> Result<TopologyPlan, TopoError> {
        let sheets: Vec<SheetPlan> = self
            .sheets()
            .values()
            .map(|spec| SheetPlan {
                identity: spec.identity(),
                level: spec.level().to_string(),
                sheet_type: spec.sheet_type,
                properties: spec.properties().clone(),
                parameters: spec.parameters().clone(),
            })
            .collect();
        let projections: Vec<ProjectionPlan> = self
            .order_projections()?
            .into_iter()
            .map(|proj| ProjectionPlan {
                identity: proj.identity(),
                matchname: proj.matchname().unwrap_or_default().to_string(),
                projection_type: proj.projection_type,
                src: proj.src().to_string(),
                dest: proj.dest().to_string(),
                parameters: proj.parameters().clone(),
            })
            .collect();
        let digest = plan_digest(&sheets, &projections);
        Ok(TopologyPlan {
            schema: TOPOLOGY_PLAN_SCHEMA,
            plan_kind: TOPOLOGY_PLAN_KIND.to_string(),
            model: self.name().to_string(),
            sheets,
            projections,
            digest,
        })
    }
}

fn feed_parameters(hasher: &mut Sha256, parameters: &Parameters) {
    for (name, value) in parameters {
        hasher.update(name.as_bytes());
        hasher.update(b"=");
        hasher.update(value.to_string().as_bytes());
        hasher.update(b"\n");
    }
}

fn plan_digest(sheets: &[SheetPlan], projections: &[ProjectionPlan]) -> String {
    let mut hasher = Sha256::new();
    for sheet in sheets {
        hasher.update(format!("sheet:{}:{}\n", sheet.identity, sheet.sheet_type).as_bytes());
        feed_parameters(&mut hasher, &sheet.parameters);
    }
    for proj in projections {
        hasher.update(
            format!(
                "projection:{}:{}:{}:{}\n",
                proj.identity, proj.matchname, proj.projection_type, proj.src
            )
            .as_bytes(),
        );
        feed_parameters(&mut hasher, &proj.parameters);
    }
    format!("{:x}", hasher.finalize())
}
