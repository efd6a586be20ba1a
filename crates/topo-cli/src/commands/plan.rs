use crate::cli::{CollisionArg, SetupStageArg};
use crate::support::{exit_with_error, load_model_or_exit, print_json_or_exit};
use std::path::PathBuf;
use topo_kernel::value_text;
use topo_model::{ModelOptions, SetupStage, Stages};

pub fn run(
    manifest: PathBuf,
    stages: Vec<SetupStageArg>,
    params: Vec<String>,
    collisions: CollisionArg,
    json_output: bool,
) {
    let setup = if stages.is_empty() {
        Stages::All
    } else {
        Stages::only(stages.into_iter().map(SetupStage::from))
    };
    let options = ModelOptions {
        setup,
        collisions: collisions.into(),
        ..ModelOptions::default()
    };
    let model = load_model_or_exit(&manifest, options, &params);
    let plan = model.plan().unwrap_or_else(|e| exit_with_error(e));

    if json_output {
        print_json_or_exit(&plan);
        return;
    }

    println!("topo plan {}", plan.model);
    println!("  Manifest: {}", manifest.display());
    println!("  Sheets: {}", plan.sheets.len());
    for sheet in &plan.sheets {
        println!(
            "    {} [{}] level={}",
            sheet.identity, sheet.sheet_type, sheet.level
        );
    }
    println!("  Projections: {}", plan.projections.len());
    for proj in &plan.projections {
        let strength = proj
            .parameters
            .get("strength")
            .map(value_text)
            .unwrap_or_else(|| "-".to_string());
        println!(
            "    {}: {}->{} [{}] strength={}",
            proj.matchname, proj.src, proj.identity, proj.projection_type, strength
        );
    }
    println!("  Digest: {}", plan.digest);
}
