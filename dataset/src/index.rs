//! The dataset manifest: three append-only tables plus run metadata.
//!
//! - `classes.txt`: `<class index> <class name>`
//! - `images.txt`: `<image index> <image path>`
//! - `image_class_labels.txt`: `<image index> <class index>`
//!
//! Rows are flushed as they are written, so a run that aborts leaves every
//! table holding a valid prefix of the full manifest.

use std::{
    fs::{self, File},
    io::{BufRead, BufReader, BufWriter, Write},
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};

use crate::error::{DatasetError, DatasetResult};

pub const CLASSES_FILE: &str = "classes.txt";
pub const IMAGES_FILE: &str = "images.txt";
pub const LABELS_FILE: &str = "image_class_labels.txt";
pub const METADATA_FILE: &str = "metadata.json";
pub const FORMAT_VERSION: &str = "1";

struct Table {
    path: PathBuf,
    writer: BufWriter<File>,
}

impl Table {
    fn create(dir: &Path, name: &str) -> DatasetResult<Self> {
        let path = dir.join(name);
        let file = File::create(&path).map_err(DatasetError::sink(&path))?;
        Ok(Self {
            path,
            writer: BufWriter::new(file),
        })
    }

    fn append(&mut self, index: u32, value: impl std::fmt::Display) -> DatasetResult<()> {
        writeln!(self.writer, "{index} {value}").map_err(DatasetError::sink(&self.path))
    }

    fn flush(&mut self) -> DatasetResult<()> {
        self.writer.flush().map_err(DatasetError::sink(&self.path))
    }

    fn close(self) -> DatasetResult<()> {
        let Self { path, writer } = self;
        let file = writer
            .into_inner()
            .map_err(|e| DatasetError::sink(&path)(e.into_error()))?;
        file.sync_all().map_err(DatasetError::sink(&path))
    }
}

/// Run summary written next to the tables when a run completes.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunMetadata {
    pub version: String,
    pub seed: u64,
    pub images_per_part: u32,
    pub lighting_rigs: usize,
    pub image_size: [u32; 2],
    pub classes: u32,
    pub images: u32,
}

/// Writer side of the manifest.
pub struct DatasetIndex {
    root: PathBuf,
    classes: Table,
    images: Table,
    labels: Table,
}

impl DatasetIndex {
    /// Creates the three tables in `root`, which must already exist.
    pub fn create(root: impl Into<PathBuf>) -> DatasetResult<Self> {
        let root = root.into();
        Ok(Self {
            classes: Table::create(&root, CLASSES_FILE)?,
            images: Table::create(&root, IMAGES_FILE)?,
            labels: Table::create(&root, LABELS_FILE)?,
            root,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn record_class(&mut self, index: u32, name: &str) -> DatasetResult<()> {
        self.classes.append(index, name)?;
        self.classes.flush()
    }

    /// Appends the image row and its label row, then flushes both so the
    /// tables never drift apart on disk.
    pub fn record_image(&mut self, index: u32, path: &Path, class_index: u32) -> DatasetResult<()> {
        self.images.append(index, path.display())?;
        self.labels.append(index, class_index)?;
        self.images.flush()?;
        self.labels.flush()
    }

    /// Flushes and syncs all tables and writes `metadata.json`.
    pub fn finalize(self, metadata: &RunMetadata) -> DatasetResult<()> {
        let Self { root, classes, images, labels } = self;
        classes.close()?;
        images.close()?;
        labels.close()?;

        let path = root.join(METADATA_FILE);
        let json = serde_json::to_string_pretty(metadata)
            .map_err(|e| DatasetError::sink(&path)(e.into()))?;
        fs::write(&path, json).map_err(DatasetError::sink(&path))
    }

    /// Reads the three tables back.
    pub fn load(root: impl AsRef<Path>) -> DatasetResult<Manifest> {
        let root = root.as_ref();
        Ok(Manifest {
            classes: read_table(root, CLASSES_FILE, |s| Some(s.to_string()))?,
            images: read_table(root, IMAGES_FILE, |s| Some(PathBuf::from(s)))?,
            labels: read_table(root, LABELS_FILE, |s| s.parse().ok())?,
        })
    }

    pub fn load_metadata(root: impl AsRef<Path>) -> DatasetResult<RunMetadata> {
        let path = root.as_ref().join(METADATA_FILE);
        let text = fs::read_to_string(&path).map_err(DatasetError::sink(&path))?;
        serde_json::from_str(&text).map_err(|_| DatasetError::MalformedManifest {
            file: METADATA_FILE,
            line: 1,
        })
    }
}

fn read_table<T>(
    root: &Path,
    file: &'static str,
    parse: impl Fn(&str) -> Option<T>,
) -> DatasetResult<Vec<(u32, T)>> {
    let path = root.join(file);
    let reader = BufReader::new(File::open(&path).map_err(DatasetError::sink(&path))?);
    let mut rows = Vec::new();
    for (n, line) in reader.lines().enumerate() {
        let line = line.map_err(DatasetError::sink(&path))?;
        let malformed = DatasetError::MalformedManifest { file, line: n + 1 };
        let Some((index, value)) = line.split_once(' ').filter(|(_, v)| !v.trim().is_empty()) else {
            return Err(malformed);
        };
        match (index.parse::<u32>(), parse(value)) {
            (Ok(index), Some(value)) => rows.push((index, value)),
            _ => return Err(malformed),
        }
    }
    Ok(rows)
}

/// In-memory copy of a manifest.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Manifest {
    pub classes: Vec<(u32, String)>,
    pub images: Vec<(u32, PathBuf)>,
    pub labels: Vec<(u32, u32)>,
}

impl Manifest {
    /// Checks that class indices run 1..=n, that images and labels pair up
    /// row by row with strictly increasing indices, and that every label names
    /// a known class.
    pub fn verify(&self) -> DatasetResult<()> {
        let fail = |reason: String| Err(DatasetError::InconsistentManifest { reason });

        for (expected, (index, name)) in (1u32..).zip(&self.classes) {
            if *index != expected {
                return fail(format!("class {name} has index {index}, expected {expected}"));
            }
        }
        if self.images.len() != self.labels.len() {
            return fail(format!(
                "{} image rows but {} label rows",
                self.images.len(),
                self.labels.len()
            ));
        }
        let class_count = self.classes.len() as u32;
        let mut last = 0u32;
        for ((image, _), (labelled, class)) in self.images.iter().zip(&self.labels) {
            if image != labelled {
                return fail(format!("image row {image} paired with label row {labelled}"));
            }
            if *image <= last {
                return fail(format!("image index {image} does not increase"));
            }
            if *class == 0 || *class > class_count {
                return fail(format!("image {image} labelled with unknown class {class}"));
            }
            last = *image;
        }
        Ok(())
    }

    /// Number of images labelled with `class`.
    pub fn images_in_class(&self, class: u32) -> usize {
        self.labels.iter().filter(|(_, c)| *c == class).count()
    }
}
