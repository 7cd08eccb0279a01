use std::{
    fs, io,
    path::{Path, PathBuf},
};

use tracing::{debug, info};

use crate::{
    catalog::{BrickShape, Color},
    error::{DatasetError, DatasetResult},
    index::{DatasetIndex, FORMAT_VERSION, RunMetadata},
    label::{ClassEntry, enumerate_classes},
    lighting::LightingRig,
    pose::PoseSampler,
    render::{IMAGE_HEIGHT, IMAGE_WIDTH, RenderInvoker, Renderer, SceneRetention},
    scene::SceneWriter,
};

pub const IMAGES_DIR: &str = "images";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GeneratorConfig {
    /// Dataset root. Must not exist yet.
    pub outdir: PathBuf,
    /// Passes over the rig catalog per class.
    pub images_per_part: u32,
    pub image_width: u32,
    pub image_height: u32,
    /// How many colours of the catalog to use.
    pub num_colors: usize,
    /// Pose seed; drawn from the OS when unset.
    pub seed: Option<u64>,
    pub scene_retention: SceneRetention,
    /// Where scene files are written. Defaults to the system temp dir.
    pub scratch_dir: Option<PathBuf>,
    pub verify_images: bool,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            outdir: PathBuf::from("dataset"),
            images_per_part: 10,
            image_width: IMAGE_WIDTH,
            image_height: IMAGE_HEIGHT,
            num_colors: 10,
            seed: None,
            scene_retention: SceneRetention::Delete,
            scratch_dir: None,
            verify_images: false,
        }
    }
}

/// Where a run is. Per image the driver moves through `Composing`,
/// `Invoking` and `Recording`, then starts the next image.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Stage {
    NotStarted,
    Enumerating,
    /// Writing the scene file for the current image.
    Composing,
    /// Waiting on the renderer.
    Invoking,
    /// Appending the image and label rows.
    Recording,
    Finalizing,
    Done,
    Aborted,
}

/// Classes and images completed so far. Image indices are handed out only
/// for images that rendered.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Counters {
    pub classes: u32,
    pub images: u32,
}

impl Counters {
    fn next_image(&mut self) -> u32 {
        self.images += 1;
        self.images
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RunSummary {
    pub classes: u32,
    pub images: u32,
    pub seed: u64,
}

/// Drives a whole run: every class under every rig, `images_per_part` times.
pub struct Pipeline<R, S> {
    config: GeneratorConfig,
    invoker: RenderInvoker<R, S>,
    shapes: Vec<BrickShape>,
    colors: Vec<Color>,
    rigs: &'static [LightingRig],
    stage: Stage,
    counters: Counters,
}

impl<R: Renderer, S: SceneWriter> Pipeline<R, S> {
    pub fn new(config: GeneratorConfig, renderer: R, writer: S) -> Self {
        let mut invoker = RenderInvoker::new(renderer, writer)
            .size(config.image_width, config.image_height)
            .retention(config.scene_retention)
            .verify_images(config.verify_images);
        if let Some(dir) = &config.scratch_dir {
            invoker = invoker.scratch_dir(dir);
        }
        Self {
            shapes: BrickShape::catalog().to_vec(),
            colors: Color::first(config.num_colors).to_vec(),
            config,
            invoker,
            rigs: LightingRig::catalog(),
            stage: Stage::NotStarted,
            counters: Counters::default(),
        }
    }

    /// Replaces the built-in catalogs.
    pub fn with_catalogs(mut self, shapes: Vec<BrickShape>, colors: Vec<Color>) -> Self {
        self.shapes = shapes;
        self.colors = colors;
        self
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    pub fn counters(&self) -> Counters {
        self.counters
    }

    pub fn run(&mut self) -> DatasetResult<RunSummary> {
        let result = self.run_inner();
        if result.is_err() {
            self.stage = Stage::Aborted;
        }
        result
    }

    fn run_inner(&mut self) -> DatasetResult<RunSummary> {
        let outdir = self.config.outdir.clone();
        if outdir.exists() {
            return Err(DatasetError::OutputDirectoryExists { path: outdir });
        }

        self.stage = Stage::Enumerating;
        let classes = enumerate_classes(&self.shapes, &self.colors)?;

        create_outdir(&outdir)?;
        let mut index = DatasetIndex::create(&outdir)?;
        let mut sampler = match self.config.seed {
            Some(seed) => PoseSampler::new(seed),
            None => PoseSampler::from_entropy(),
        };
        info!(
            classes = classes.len(),
            images_per_class = self.images_per_class(),
            seed = sampler.seed(),
            outdir = %outdir.display(),
            "generating dataset"
        );

        for class in &classes {
            self.generate_class(class, &outdir, &mut index, &mut sampler)?;
            self.counters.classes += 1;
        }

        self.stage = Stage::Finalizing;
        let summary = RunSummary {
            classes: self.counters.classes,
            images: self.counters.images,
            seed: sampler.seed(),
        };
        index.finalize(&RunMetadata {
            version: FORMAT_VERSION.to_string(),
            seed: summary.seed,
            images_per_part: self.config.images_per_part,
            lighting_rigs: self.rigs.len(),
            image_size: [self.config.image_width, self.config.image_height],
            classes: summary.classes,
            images: summary.images,
        })?;

        self.stage = Stage::Done;
        info!(classes = summary.classes, images = summary.images, "dataset complete");
        Ok(summary)
    }

    fn images_per_class(&self) -> usize {
        self.config.images_per_part as usize * self.rigs.len()
    }

    fn generate_class(
        &mut self,
        class: &ClassEntry,
        outdir: &Path,
        index: &mut DatasetIndex,
        sampler: &mut PoseSampler,
    ) -> DatasetResult<()> {
        info!(class = class.index, name = %class.name, images = self.images_per_class(), "generating class");
        index.record_class(class.index, &class.name)?;

        let image_dir = outdir.join(IMAGES_DIR).join(&class.name);
        fs::create_dir_all(&image_dir).map_err(DatasetError::sink(&image_dir))?;

        let rigs = self.rigs;
        let mut local = 0usize;
        for _ in 0..self.config.images_per_part {
            for (rig_no, rig) in rigs.iter().enumerate() {
                self.stage = Stage::Composing;
                let piece = sampler.next_piece(class.label.shape, class.label.color);
                let image = image_dir.join(format!("image{local:05}.png"));
                let scene = self.invoker.compose(&piece, rig)?;

                self.stage = Stage::Invoking;
                self.invoker.invoke(scene, &image)?;

                self.stage = Stage::Recording;
                let image_index = self.counters.next_image();
                index.record_image(image_index, &image, class.index)?;
                debug!(image = image_index, rig = rig_no, path = %image.display(), "recorded image");
                local += 1;
            }
        }
        Ok(())
    }
}

/// Creates the dataset root, failing if it already exists. Missing parents
/// are created.
fn create_outdir(outdir: &Path) -> DatasetResult<()> {
    if let Some(parent) = outdir.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(DatasetError::sink(parent))?;
    }
    fs::create_dir(outdir).map_err(|e| match e.kind() {
        io::ErrorKind::AlreadyExists => DatasetError::OutputDirectoryExists {
            path: outdir.to_path_buf(),
        },
        _ => DatasetError::sink(outdir)(e),
    })
}
