//! Topo CLI: the `topo` command.

mod cli;
mod commands;
mod support;

use clap::Parser;
use cli::{Cli, Commands};

fn main() {
    let cli = Cli::parse();
    support::init_tracing(cli.verbose);

    match cli.command {
        Commands::Plan {
            manifest,
            stages,
            params,
            collisions,
            json,
        } => commands::plan::run(manifest, stages, params, collisions, json),

        Commands::Instantiate {
            manifest,
            only,
            params,
            collisions,
            json,
        } => commands::instantiate::run(manifest, only, params, collisions, json),

        Commands::Kinds { json } => commands::kinds::run(json),
    }
}
