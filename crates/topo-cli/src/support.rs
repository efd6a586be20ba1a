use serde::Serialize;
use std::fmt;
use std::path::Path;
use topo_manifest::ManifestModel;
use topo_model::{GlobalParams, Model, ModelOptions};
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt as log_fmt, prelude::*};

/// Diagnostics go to stderr; stdout carries command output only.
pub fn init_tracing(verbose: bool) {
    let fallback = if verbose { "info" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));
    tracing_subscriber::registry()
        .with(log_fmt::layer().with_writer(std::io::stderr).with_target(false))
        .with(filter)
        .init();
}

pub fn exit_with_error(err: impl fmt::Display) -> ! {
    eprintln!("error: {err}");
    std::process::exit(1);
}

pub fn globals_or_exit(assignments: &[String]) -> GlobalParams {
    let mut globals = GlobalParams::new();
    for assignment in assignments {
        let (name, value) =
            GlobalParams::parse_assignment(assignment).unwrap_or_else(|e| exit_with_error(e));
        globals.set(name, value);
    }
    globals
}

/// Compile the manifest and set the model up with `options`, applying
/// `-p` overrides through the global parameter store.
pub fn load_model_or_exit(
    manifest: &Path,
    options: ModelOptions,
    assignments: &[String],
) -> Model<ManifestModel> {
    let definition = ManifestModel::from_path(manifest).unwrap_or_else(|e| exit_with_error(e));
    let mut globals = globals_or_exit(assignments);
    let model = Model::registered(definition, options, &mut globals).unwrap_or_else(|e| {
        exit_with_error(format_args!("failed to set up {}: {e}", manifest.display()))
    });
    info!(
        manifest = %manifest.display(),
        model = model.name(),
        sheets = model.sheets().len(),
        projections = model.projections().len(),
        "manifest loaded"
    );
    model
}

pub fn print_json_or_exit<T: Serialize>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(text) => println!("{text}"),
        Err(e) => exit_with_error(format_args!("json serialization: {e}")),
    }
}
