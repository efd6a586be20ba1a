use crate::cli::{CollisionArg, InstantiateStageArg};
use crate::support::{exit_with_error, load_model_or_exit, print_json_or_exit};
use serde_json::json;
use std::path::PathBuf;
use topo_kernel::ObjectType;
use topo_model::{InstantiateStage, ModelOptions, Stages};
use topo_sim::Simulation;
use tracing::info;

pub fn run(
    manifest: PathBuf,
    only: Vec<InstantiateStageArg>,
    params: Vec<String>,
    collisions: CollisionArg,
    json_output: bool,
) {
    let stages = if only.is_empty() {
        Stages::All
    } else {
        Stages::only(only.into_iter().map(InstantiateStage::from))
    };
    let options = ModelOptions {
        collisions: collisions.into(),
        ..ModelOptions::default()
    };
    let model = load_model_or_exit(&manifest, options, &params);

    let mut sim = Simulation::new();
    let report = model
        .instantiate(&stages, &mut sim)
        .unwrap_or_else(|e| exit_with_error(e));
    info!(
        sheets = report.sheets.len(),
        projections = report.projections.len(),
        objects = sim.len(),
        "instantiation finished"
    );

    if json_output {
        let payload = json!({
            "model": model.name(),
            "manifest": manifest.display().to_string(),
            "sheets": report.sheets,
            "projections": report.projections,
            "objectCount": sim.len(),
            "eventCount": sim.events().len(),
        });
        print_json_or_exit(&payload);
        return;
    }

    println!("topo instantiate {}", model.name());
    println!("  Manifest: {}", manifest.display());
    println!("  Sheets registered: {}", report.sheets.len());
    for handle in &report.sheets {
        println!("    {} [{}]", handle.name, handle.kind.type_name());
    }
    println!("  Projections connected: {}", report.projections.len());
    for handle in &report.projections {
        println!("    {} [{}]", handle.name, handle.kind.type_name());
    }
    println!("  Simulation objects: {}", sim.len());
}
