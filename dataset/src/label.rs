//! Label space: the ordered cross product of shapes and colours.

use std::{collections::HashSet, fmt};

use crate::{
    catalog::{BrickShape, Color},
    error::{DatasetError, DatasetResult},
};

pub const CLASS_SEPARATOR: char = '-';

/// A (shape, colour) pair. Identity is `"{shape}-{colour}"`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ClassLabel {
    pub shape: BrickShape,
    pub color: Color,
}

impl ClassLabel {
    pub fn name(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for ClassLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}", self.shape.part, CLASS_SEPARATOR, self.color.name)
    }
}

/// A class together with its 1-based index.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClassEntry {
    pub index: u32,
    pub name: String,
    pub label: ClassLabel,
}

/// Builds every class in shape-major, colour-minor order with contiguous
/// 1-based indices.
pub fn enumerate_classes(shapes: &[BrickShape], colors: &[Color]) -> DatasetResult<Vec<ClassEntry>> {
    if shapes.is_empty() {
        return Err(DatasetError::EmptyCatalog { catalog: "shape" });
    }
    if colors.is_empty() {
        return Err(DatasetError::EmptyCatalog { catalog: "color" });
    }
    for id in shapes.iter().map(|s| s.part).chain(colors.iter().map(|c| c.name)) {
        check_identifier(id)?;
    }
    if let Some(shape) = shapes.iter().find(|s| s.parse_dimensions().is_none()) {
        return Err(DatasetError::UnsupportedShape {
            part: shape.part.to_string(),
            name: shape.name.to_string(),
        });
    }

    let mut seen = HashSet::with_capacity(shapes.len() * colors.len());
    let mut classes = Vec::with_capacity(shapes.len() * colors.len());
    for shape in shapes {
        for color in colors {
            let label = ClassLabel { shape: *shape, color: *color };
            let name = label.name();
            if !seen.insert(name.clone()) {
                return Err(DatasetError::DuplicateClass { name });
            }
            classes.push(ClassEntry {
                index: classes.len() as u32 + 1,
                name,
                label,
            });
        }
    }
    Ok(classes)
}

fn check_identifier(id: &str) -> DatasetResult<()> {
    if id.is_empty() || id.contains(CLASS_SEPARATOR) || id.chars().any(char::is_whitespace) {
        return Err(DatasetError::InvalidIdentifier { name: id.to_string() });
    }
    Ok(())
}
