use std::{io, path::PathBuf};

use thiserror::Error;

pub type DatasetResult<T> = Result<T, DatasetError>;

#[derive(Debug, Error)]
pub enum DatasetError {
    #[error("{catalog} catalog is empty")]
    EmptyCatalog { catalog: &'static str },

    #[error("catalog identifier {name:?} cannot be used in a class name")]
    InvalidIdentifier { name: String },

    #[error("shape {part} has no brick geometry: {name:?} is not Brick<W>X<L> or Brick<W>X<L>X<H>")]
    UnsupportedShape { part: String, name: String },

    #[error("class {name} appears more than once in the label space")]
    DuplicateClass { name: String },

    #[error("output directory {} already exists", path.display())]
    OutputDirectoryExists { path: PathBuf },

    #[error("failed to start renderer {program}: {source}")]
    RendererSpawn {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("render of {} failed ({}): {output}", image.display(), exit_label(*code))]
    RenderFailure {
        image: PathBuf,
        code: Option<i32>,
        output: String,
    },

    #[error("failed to write {}: {source}", path.display())]
    SinkWrite {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("malformed row in {file} at line {line}")]
    MalformedManifest { file: &'static str, line: usize },

    #[error("inconsistent manifest: {reason}")]
    InconsistentManifest { reason: String },
}

impl DatasetError {
    pub(crate) fn sink(path: impl Into<PathBuf>) -> impl FnOnce(io::Error) -> Self {
        let path = path.into();
        move |source| Self::SinkWrite { path, source }
    }
}

fn exit_label(code: Option<i32>) -> String {
    match code {
        Some(c) => format!("exit code {c}"),
        None => "no exit code".to_string(),
    }
}
