use std::path::PathBuf;

use brickset::{GeneratorConfig, render::SceneRetention};
use clap::Parser;

/// Render a labelled image dataset of LDraw bricks with POV-Ray.
#[derive(Debug, Parser)]
#[command(version, about)]
pub struct Args {
    /// Output directory for the generated dataset. Must not exist.
    #[arg(long)]
    pub outdir: PathBuf,

    /// Passes over the lighting rigs per class (8 images per pass).
    #[arg(long = "images_per_part", alias = "images-per-part", default_value_t = 10)]
    pub images_per_part: u32,

    /// Number of catalog colours to combine with every part.
    #[arg(long, default_value_t = 10)]
    pub num_colors: usize,

    #[arg(long, default_value_t = brickset::render::IMAGE_WIDTH)]
    pub width: u32,

    #[arg(long, default_value_t = brickset::render::IMAGE_HEIGHT)]
    pub height: u32,

    /// Pose seed. Random when omitted.
    #[arg(long, env = "PIECEGEN_SEED")]
    pub seed: Option<u64>,

    /// Renderer executable.
    #[arg(long, env = "PIECEGEN_RENDERER", default_value = "povray")]
    pub renderer: PathBuf,

    /// Extra include directory handed to the renderer.
    #[arg(long)]
    pub library_path: Option<PathBuf>,

    /// Keep scene files after successful renders.
    #[arg(long)]
    pub keep_scenes: bool,

    /// Directory for scene files. Defaults to the system temp dir.
    #[arg(long)]
    pub scratch_dir: Option<PathBuf>,

    /// Skip checking that every output image decodes at the requested size.
    #[arg(long)]
    pub no_verify: bool,
}

impl Args {
    pub fn generator_config(&self) -> GeneratorConfig {
        GeneratorConfig {
            outdir: self.outdir.clone(),
            images_per_part: self.images_per_part,
            image_width: self.width,
            image_height: self.height,
            num_colors: self.num_colors,
            seed: self.seed,
            scene_retention: if self.keep_scenes {
                SceneRetention::Keep
            } else {
                SceneRetention::Delete
            },
            scratch_dir: self.scratch_dir.clone(),
            verify_images: !self.no_verify,
        }
    }
}
