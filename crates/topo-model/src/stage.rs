//! Setup and instantiation stages.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use topo_kernel::TopoError;

/// Setup stages, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SetupStage {
    Attributes,
    TrainingPatterns,
    Sheets,
    Projections,
    Analysis,
}

impl SetupStage {
    pub const ALL: [SetupStage; 5] = [
        SetupStage::Attributes,
        SetupStage::TrainingPatterns,
        SetupStage::Sheets,
        SetupStage::Projections,
        SetupStage::Analysis,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SetupStage::Attributes => "attributes",
            SetupStage::TrainingPatterns => "training_patterns",
            SetupStage::Sheets => "sheets",
            SetupStage::Projections => "projections",
            SetupStage::Analysis => "analysis",
        }
    }
}

/// Instantiation stages: sheets always before projections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InstantiateStage {
    Sheets,
    Projections,
}

impl InstantiateStage {
    pub const ALL: [InstantiateStage; 2] = [InstantiateStage::Sheets, InstantiateStage::Projections];

    pub fn as_str(&self) -> &'static str {
        match self {
            InstantiateStage::Sheets => "sheets",
            InstantiateStage::Projections => "projections",
        }
    }
}

/// Which stages to run. Selected stages always run in their fixed order,
/// whatever order they were listed in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Stages<S> {
    All,
    Only(Vec<S>),
}

impl<S> Default for Stages<S> {
    fn default() -> Self {
        Stages::All
    }
}

impl<S: PartialEq> Stages<S> {
    pub fn only(stages: impl IntoIterator<Item = S>) -> Self {
        Stages::Only(stages.into_iter().collect())
    }

    pub fn contains(&self, stage: &S) -> bool {
        match self {
            Stages::All => true,
            Stages::Only(selected) => selected.contains(stage),
        }
    }
}

impl<S> From<Vec<S>> for Stages<S> {
    fn from(stages: Vec<S>) -> Self {
        Stages::Only(stages)
    }
}

impl FromStr for SetupStage {
    type Err = TopoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SetupStage::ALL
            .into_iter()
            .find(|stage| stage.as_str() == s)
            .ok_or_else(|| TopoError::InvalidConfiguration(format!("unknown setup stage `{s}`")))
    }
}

impl FromStr for InstantiateStage {
    type Err = TopoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        InstantiateStage::ALL
            .into_iter()
            .find(|stage| stage.as_str() == s)
            .ok_or_else(|| {
                TopoError::InvalidConfiguration(format!("unknown instantiate stage `{s}`"))
            })
    }
}

impl fmt::Display for SetupStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for InstantiateStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
