//! # topo-model
//!
//! Two-phase model assembly on top of `topo-kernel`:
//! - `ModelDefinition` hooks a modeller implements
//! - `Model`: setup (specs) and instantiate (runtime registration)
//! - declarative sheet generators and stage selection
//! - global parameter overrides
//! - deterministic topology plans with a content digest
//!
//! ## Pipeline
//!
//! ```text
//! setup:        attributes → training_patterns → sheets → projections → analysis
//! instantiate:  sheets → projections (connection order)
//! ```

pub mod declare;
pub mod globals;
pub mod model;
pub mod plan;
pub mod stage;

pub use declare::{PropertyArgs, SheetDeclaration};
pub use globals::GlobalParams;
pub use model::{CollisionPolicy, InstantiationReport, Model, ModelDefinition, ModelOptions};
pub use plan::{
    ProjectionPlan, SheetPlan, TOPOLOGY_PLAN_KIND, TOPOLOGY_PLAN_SCHEMA, TopologyPlan,
};
pub use stage::{InstantiateStage, SetupStage, Stages};
