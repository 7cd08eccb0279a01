use anyhow::Context;
use brickset::{Pipeline, render::PovRay, scene::BrickCsgWriter};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::cli::Args;

mod cli;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let mut renderer = PovRay::new(&args.renderer);
    if let Some(lib) = &args.library_path {
        renderer = renderer.with_library_path(lib);
    }

    let config = args.generator_config();
    let outdir = config.outdir.clone();
    let summary = Pipeline::new(config, renderer, BrickCsgWriter)
        .run()
        .with_context(|| format!("generating dataset in {}", outdir.display()))?;

    tracing::info!(
        classes = summary.classes,
        images = summary.images,
        seed = summary.seed,
        "done"
    );
    Ok(())
}
