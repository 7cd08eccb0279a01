pub mod catalog;
pub mod error;
pub mod index;
pub mod label;
pub mod lighting;
pub mod pipeline;
pub mod pose;
pub mod render;
pub mod scene;

pub use error::{DatasetError, DatasetResult};
pub use pipeline::{GeneratorConfig, Pipeline, RunSummary};
