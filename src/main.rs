use std::path::{Path, PathBuf};

use clap::Parser;
use itertools::Itertools;
use rayon::prelude::*;
use rootcause::prelude::*;
use serde::Serialize;
use tracing_subscriber::EnvFilter;

use kmdunpack::models::{KmdFile, ModelBlock};
use kmdunpack::{IResult, ImportResult, import_kmd};

/// Decode and inspect KMD model containers
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Print the decoded containers as JSON instead of a summary
    #[clap(long)]
    json: bool,

    /// Log decoder progress. `RUST_LOG` takes precedence when set.
    #[clap(short, long)]
    verbose: bool,

    /// .kmd files or glob patterns such as `assets/**/*.kmd`
    #[clap(required = true)]
    files: Vec<String>,
}

#[derive(Serialize)]
struct JsonOutput<'a> {
    path: String,
    result: ImportResult,
    code: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    container: Option<&'a KmdFile>,
}

fn expand_inputs(patterns: &[String]) -> Result<Vec<PathBuf>, Report> {
    let mut paths = Vec::new();
    for pattern in patterns {
        if !pattern.contains(['*', '?', '[']) {
            paths.push(PathBuf::from(pattern));
            continue;
        }

        let matches = glob::glob(pattern)
            .map_err(|e| rootcause::report!("Invalid glob pattern {pattern:?}: {e}"))?;
        let before = paths.len();
        for entry in matches {
            paths.push(entry.map_err(|e| rootcause::report!("Failed to expand {pattern:?}: {e}"))?);
        }
        if paths.len() == before {
            tracing::warn!("pattern {pattern:?} matched no files");
        }
    }
    Ok(paths)
}

fn print_block(index: usize, block: &ModelBlock) {
    let flags = block.data_type_flags.iter_names().map(|(name, _)| name).format("|");
    let render = match block.render_type.unknown() {
        Some(raw) => format!("{:?} (raw {raw})", block.effective_render_type()),
        None => format!("{:?}", block.effective_render_type()),
    };
    println!(
        "  [{index}] {} mesh={} path={} render={render} flags=[{flags}] vertices={} indices={}",
        block.node_name,
        block.mesh_name,
        block.node_path,
        block.vertex_count(),
        block.index_count(),
    );
    println!(
        "      position={:?} rotation={:?} size={:?}",
        block.position, block.rotation, block.size
    );
}

fn print_summary(path: &Path, outcome: &IResult<KmdFile>) {
    let result = ImportResult::from(outcome);
    println!("{}: {result}", path.display());

    let Ok(kmd) = outcome else {
        return;
    };

    let header = &kmd.header;
    println!(
        "  version {}, scale x{}, {} models (header claims {}), {} vertices, {} indices",
        header.version,
        header.scale_multiplier(),
        kmd.blocks.len(),
        header.model_count,
        kmd.total_vertices(),
        kmd.total_indices(),
    );
    for (index, block) in kmd.blocks.iter().enumerate() {
        print_block(index, block);
    }
}

fn main() -> Result<(), Report> {
    let args = Args::parse();

    let default_level = if args.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    let paths = expand_inputs(&args.files)?;
    if paths.is_empty() {
        bail!("No input files");
    }

    // Each file is an independent decode; results keep the input order.
    let outcomes: Vec<(PathBuf, IResult<KmdFile>)> = paths
        .into_par_iter()
        .map(|path| {
            let outcome = import_kmd(&path);
            (path, outcome)
        })
        .collect();

    if args.json {
        let output: Vec<JsonOutput<'_>> = outcomes
            .iter()
            .map(|(path, outcome)| {
                let result = ImportResult::from(outcome);
                JsonOutput {
                    path: path.display().to_string(),
                    result,
                    code: result.code(),
                    container: outcome.as_ref().ok(),
                }
            })
            .collect();
        let json = serde_json::to_string_pretty(&output)
            .map_err(|e| rootcause::report!("Failed to serialize output: {e}"))?;
        println!("{json}");
    } else {
        for (path, outcome) in &outcomes {
            print_summary(path, outcome);
        }
    }

    let failed = outcomes.iter().filter(|(_, outcome)| outcome.is_err()).count();
    if failed > 0 {
        bail!("{failed} of {} files failed to import", outcomes.len());
    }

    Ok(())
}
