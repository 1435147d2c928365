//! Export shapes observed on ES modules

use parking_lot::RwLock;
use rustc_hash::FxHashMap;

/// Whether an ES module declares a default export
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportShape {
    HasDefaultExport,
    LacksDefaultExport,
}

impl ExportShape {
    pub fn from_has_default(has_default_export: bool) -> Self {
        if has_default_export {
            Self::HasDefaultExport
        } else {
            Self::LacksDefaultExport
        }
    }
}

/// Records the export shape of each ES module seen during a build.
///
/// A module has at most one shape. Absence means "not observed", which is
/// different from lacking a default export.
#[derive(Debug, Default)]
pub struct ModuleKindTracker {
    shapes: RwLock<FxHashMap<String, ExportShape>>,
}

impl ModuleKindTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the shape of `id`. The first observation wins; returns `false`
    /// if a shape was already recorded.
    pub fn record(&self, id: &str, shape: ExportShape) -> bool {
        let mut shapes = self.shapes.write();
        if shapes.contains_key(id) {
            return false;
        }
        shapes.insert(id.to_string(), shape);
        true
    }

    pub fn shape(&self, id: &str) -> Option<ExportShape> {
        self.shapes.read().get(id).copied()
    }

    pub fn has_default_export(&self, id: &str) -> bool {
        self.shape(id) == Some(ExportShape::HasDefaultExport)
    }

    pub fn lacks_default_export(&self, id: &str) -> bool {
        self.shape(id) == Some(ExportShape::LacksDefaultExport)
    }

    pub fn len(&self) -> usize {
        self.shapes.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
