use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use topo_model::{CollisionPolicy, InstantiateStage, SetupStage};

#[derive(Parser)]
#[command(
    name = "topo",
    about = "Topo: assemble sheet/projection topologies from model manifests",
    version
)]
pub struct Cli {
    /// Log assembly progress to stderr (RUST_LOG takes precedence)
    #[arg(long, short, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run model setup and print the ordered topology plan
    Plan {
        /// Path to the model manifest (TOML)
        manifest: PathBuf,

        /// Setup stage to run (repeatable; default: all)
        #[arg(long = "stage", value_enum)]
        stages: Vec<SetupStageArg>,

        /// Parameter override `name=value` (repeatable; value parsed as JSON)
        #[arg(short = 'p', long = "param")]
        params: Vec<String>,

        /// What to do when two specifications share a path
        #[arg(long, value_enum, default_value = "reject")]
        collisions: CollisionArg,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Set the model up and register it with the in-memory simulation
    Instantiate {
        /// Path to the model manifest (TOML)
        manifest: PathBuf,

        /// Instantiation stage to run (repeatable; default: all)
        #[arg(long = "only", value_enum)]
        only: Vec<InstantiateStageArg>,

        /// Parameter override `name=value` (repeatable; value parsed as JSON)
        #[arg(short = 'p', long = "param")]
        params: Vec<String>,

        /// What to do when two specifications share a path
        #[arg(long, value_enum, default_value = "reject")]
        collisions: CollisionArg,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// List the sheet and projection types and their default parameters
    Kinds {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum SetupStageArg {
    #[value(name = "attributes")]
    Attributes,
    #[value(name = "training_patterns")]
    TrainingPatterns,
    #[value(name = "sheets")]
    Sheets,
    #[value(name = "projections")]
    Projections,
    #[value(name = "analysis")]
    Analysis,
}

impl From<SetupStageArg> for SetupStage {
    fn from(arg: SetupStageArg) -> Self {
        match arg {
            SetupStageArg::Attributes => SetupStage::Attributes,
            SetupStageArg::TrainingPatterns => SetupStage::TrainingPatterns,
            SetupStageArg::Sheets => SetupStage::Sheets,
            SetupStageArg::Projections => SetupStage::Projections,
            SetupStageArg::Analysis => SetupStage::Analysis,
        }
    }
}

#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum InstantiateStageArg {
    #[value(name = "sheets")]
    Sheets,
    #[value(name = "projections")]
    Projections,
}

impl From<InstantiateStageArg> for InstantiateStage {
    fn from(arg: InstantiateStageArg) -> Self {
        match arg {
            InstantiateStageArg::Sheets => InstantiateStage::Sheets,
            InstantiateStageArg::Projections => InstantiateStage::Projections,
        }
    }
}

#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum CollisionArg {
    #[value(name = "reject")]
    Reject,
    #[value(name = "overwrite")]
    Overwrite,
}

impl From<CollisionArg> for CollisionPolicy {
    fn from(arg: CollisionArg) -> Self {
        match arg {
            CollisionArg::Reject => CollisionPolicy::Reject,
            CollisionArg::Overwrite => CollisionPolicy::Overwrite,
        }
    }
}
